//! Playback simulation - simulated TV preview
//!
//! Walks a cursor through the item list, holding each item for its effective
//! duration and looping from the last item back to the first. It only reads
//! the list; the editor owns every mutation and tells the simulator when the
//! structure changed.
//!
//! The timer is a single owned deadline. Every transition replaces or clears
//! it, so a stop or skip can never leave an orphaned timer behind. Hosts
//! either await [`PlaybackSimulator::next_tick`] (async) or call
//! [`PlaybackSimulator::fire_if_due`] from their own frame clock.

use crate::{
    events::{AdvanceCause, PlaybackEvent, StopReason},
    items::ItemList,
};
use serde::{Deserialize, Serialize};
use signage_core::{PlaylistItem, FALLBACK_DURATION_SECS};
use tokio::time::{Duration, Instant};

/// Preview state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Timer idle; the cursor may still point at an item
    Stopped,
    /// Timer running
    Playing,
}

/// Cooperative playback preview
#[derive(Debug)]
pub struct PlaybackSimulator {
    state: PlaybackState,

    /// Previewed item; kept across stop so the pane keeps showing it
    current_index: Option<usize>,

    /// The one pending timer
    deadline: Option<Instant>,

    /// Structure revision of the list when playback started
    revision: u64,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl Default for PlaybackSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSimulator {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            current_index: None,
            deadline: None,
            revision: 0,
            pending_events: Vec::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Item under the cursor, if the cursor still points inside the list
    pub fn current_item<'a>(&self, list: &'a ItemList) -> Option<&'a PlaylistItem> {
        self.current_index.and_then(|i| list.item_at(i))
    }

    /// When the pending timer fires
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left on the current slot
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Start the preview.
    ///
    /// Resumes from the selected item, or the first one when nothing valid is
    /// selected. No-op on an empty list or when already playing.
    pub fn start(&mut self, list: &ItemList) -> bool {
        if self.is_playing() {
            return false;
        }
        if list.is_empty() {
            tracing::debug!("Preview start ignored: playlist is empty");
            return false;
        }

        let index = match self.current_index {
            Some(i) if i < list.len() => i,
            _ => 0,
        };

        self.current_index = Some(index);
        self.state = PlaybackState::Playing;
        self.revision = list.structure_revision();
        let slot_seconds = self.schedule(list, index);

        tracing::debug!(index, slot_seconds, "Preview started");
        self.pending_events.push(PlaybackEvent::Started {
            index,
            slot_seconds,
        });
        true
    }

    /// Stop the preview, keeping the cursor where it is
    pub fn stop(&mut self) -> bool {
        self.halt(StopReason::User)
    }

    /// Stop because the list changed (or the editor is closing)
    pub fn invalidate(&mut self, reason: StopReason) -> bool {
        self.halt(reason)
    }

    /// Timer elapsed: advance to the next item, wrapping around
    pub fn fire(&mut self, list: &ItemList) -> Option<usize> {
        if !self.is_playing() {
            return None;
        }
        if self.structure_changed(list) {
            return None;
        }

        let from = self.current_index.unwrap_or(0);
        let to = (from + 1) % list.len();
        self.current_index = Some(to);
        self.schedule(list, to);

        self.pending_events.push(PlaybackEvent::Advanced {
            from,
            to,
            cause: AdvanceCause::Timer,
        });
        Some(to)
    }

    /// Fire the timer if its deadline has passed
    pub fn fire_if_due(&mut self, list: &ItemList, now: Instant) -> Option<usize> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.fire(list),
            _ => None,
        }
    }

    /// Wait for the pending timer and fire it.
    ///
    /// Never resolves while stopped, so it can sit in a `tokio::select!`
    /// next to other event sources.
    pub async fn next_tick(&mut self, list: &ItemList) -> Option<usize> {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };
        tokio::time::sleep_until(deadline).await;
        self.fire(list)
    }

    /// Move the cursor forward; restarts the slot timer when playing
    pub fn skip_forward(&mut self, list: &ItemList) -> Option<usize> {
        self.skip(list, true)
    }

    /// Move the cursor backward; restarts the slot timer when playing
    pub fn skip_backward(&mut self, list: &ItemList) -> Option<usize> {
        self.skip(list, false)
    }

    /// Jump to a specific item (click on the timeline)
    pub fn select(&mut self, list: &ItemList, index: usize) -> Option<usize> {
        if index >= list.len() {
            return None;
        }
        if self.is_playing() {
            self.structure_changed(list);
        }
        let from = self.current_index;
        self.current_index = Some(index);
        self.announce_move(list, from, index);
        Some(index)
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn skip(&mut self, list: &ItemList, forward: bool) -> Option<usize> {
        if list.is_empty() {
            return None;
        }
        if self.is_playing() {
            // A stale revision stops playback; the skip then only selects
            self.structure_changed(list);
        }
        let len = list.len();
        let from = self.current_index.filter(|i| *i < len);
        let to = match (from, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };

        self.current_index = Some(to);
        self.announce_move(list, from, to);
        Some(to)
    }

    fn announce_move(&mut self, list: &ItemList, from: Option<usize>, to: usize) {
        if self.is_playing() {
            // Restart the slot rather than continue the stale countdown
            self.schedule(list, to);
            self.pending_events.push(PlaybackEvent::Advanced {
                from: from.unwrap_or(to),
                to,
                cause: AdvanceCause::Skip,
            });
        } else {
            self.pending_events.push(PlaybackEvent::Selected { index: to });
        }
    }

    /// Stops playback and returns true when the list is empty or its
    /// structure moved since `start`
    fn structure_changed(&mut self, list: &ItemList) -> bool {
        if list.is_empty() {
            self.halt(StopReason::EmptyList);
            return true;
        }
        if list.structure_revision() != self.revision {
            tracing::debug!(
                started = self.revision,
                now = list.structure_revision(),
                "Playlist structure changed under the preview"
            );
            self.halt(StopReason::StructuralChange);
            return true;
        }
        false
    }

    fn halt(&mut self, reason: StopReason) -> bool {
        self.deadline = None;
        if !self.is_playing() {
            return false;
        }
        self.state = PlaybackState::Stopped;
        tracing::debug!(index = ?self.current_index, ?reason, "Preview stopped");
        self.pending_events.push(PlaybackEvent::Stopped {
            index: self.current_index,
            reason,
        });
        true
    }

    fn schedule(&mut self, list: &ItemList, index: usize) -> u32 {
        let seconds = list
            .effective_duration_at(index)
            .unwrap_or(FALLBACK_DURATION_SECS);
        self.deadline = Some(Instant::now() + Duration::from_secs(u64::from(seconds)));
        seconds
    }
}
