//! Drag-reorder engine
//!
//! One state machine for both drag kinds (moving a timeline item, dropping a
//! catalog asset onto the timeline). Pointer input is reduced to
//! down/move/hover/release/cancel; each feeds a transition below. The engine
//! never touches the item list: a drop returns a [`DragOutcome`] that the
//! editor turns into `reorder` or `add`.
//!
//! ```text
//! Idle --down--> Pending --move past threshold--> Dragging --drop--> Idle
//!                   |                                 |
//!                   +--up (click)--> Idle             +--cancel--> Idle
//! ```

use signage_core::{AssetId, PlaylistItemId};

/// Default movement (in pixels) before a press becomes a drag
pub const DEFAULT_DRAG_THRESHOLD_PX: f32 = 4.0;

/// What is being dragged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// A timeline item, currently at `index`
    FromTimeline {
        item_id: PlaylistItemId,
        index: usize,
    },
    /// A catalog asset (no source index)
    FromLibrary { asset_id: AssetId },
}

/// Where the pointer is while dragging
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoverTarget<'a> {
    /// Over the timeline slots; `midpoints[i]` is the horizontal centre of
    /// slot `i`
    Slots { midpoints: &'a [f32], pointer_x: f32 },
    /// Over the end-of-timeline zone of a list with `len` items
    EndZone { len: usize },
    /// Not over anything that accepts a drop
    Outside,
}

/// An in-progress drag
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub source: DragSource,
    /// Insertion point under the pointer
    pub hover_index: Option<usize>,
}

impl DragSession {
    /// Whether dropping now would do something
    pub fn is_valid(&self) -> bool {
        self.hover_index.is_some()
    }
}

/// Result of finishing a drag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Move a timeline item; `to` is already adjusted for the removal of
    /// the source
    Reorder {
        item_id: PlaylistItemId,
        from: usize,
        to: usize,
    },
    /// Insert an asset at `at`
    Add { asset_id: AssetId, at: usize },
    /// Dropped back onto its own slot
    NoOp,
    /// No valid target, or explicitly cancelled
    Cancelled,
    /// The press never turned into a drag (a click)
    NotDragging,
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Pending { source: DragSource, origin: (f32, f32) },
    Dragging(DragSession),
}

/// Drag state machine
#[derive(Debug, Clone)]
pub struct DragEngine {
    state: DragState,
    threshold_px: f32,
}

impl Default for DragEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DRAG_THRESHOLD_PX)
    }
}

impl DragEngine {
    pub fn new(threshold_px: f32) -> Self {
        Self {
            state: DragState::Idle,
            threshold_px: threshold_px.max(0.0),
        }
    }

    /// Active drag, if any
    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    /// Pointer pressed on a timeline item or catalog asset
    pub fn pointer_down(&mut self, source: DragSource, x: f32, y: f32) {
        self.state = DragState::Pending {
            source,
            origin: (x, y),
        };
    }

    /// Pointer moved; returns true when this move started the drag
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        let DragState::Pending { source, origin } = &self.state else {
            return false;
        };
        let (dx, dy) = (x - origin.0, y - origin.1);
        if (dx * dx + dy * dy).sqrt() < self.threshold_px {
            return false;
        }

        let source = source.clone();
        tracing::trace!(source = ?source, "Drag started");
        self.state = DragState::Dragging(DragSession {
            source,
            hover_index: None,
        });
        true
    }

    /// Update the insertion point; returns true only when it changed
    pub fn hover(&mut self, target: HoverTarget<'_>) -> bool {
        let DragState::Dragging(session) = &mut self.state else {
            return false;
        };
        let next = match target {
            HoverTarget::Slots {
                midpoints,
                pointer_x,
            } => nearest_insertion_point(midpoints, pointer_x),
            HoverTarget::EndZone { len } => Some(len),
            HoverTarget::Outside => None,
        };
        if session.hover_index == next {
            return false;
        }
        session.hover_index = next;
        true
    }

    /// Pointer released
    pub fn release(&mut self) -> DragOutcome {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let session = match state {
            DragState::Dragging(session) => session,
            DragState::Pending { .. } | DragState::Idle => return DragOutcome::NotDragging,
        };
        let Some(hover) = session.hover_index else {
            return DragOutcome::Cancelled;
        };

        match session.source {
            DragSource::FromTimeline { item_id, index } => {
                let to = resolve_drop_index(index, hover);
                if to == index {
                    DragOutcome::NoOp
                } else {
                    DragOutcome::Reorder {
                        item_id,
                        from: index,
                        to,
                    }
                }
            }
            DragSource::FromLibrary { asset_id } => DragOutcome::Add { asset_id, at: hover },
        }
    }

    /// Escape pressed or the drag was otherwise abandoned
    pub fn cancel(&mut self) -> DragOutcome {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        if was_dragging {
            DragOutcome::Cancelled
        } else {
            DragOutcome::NotDragging
        }
    }

    /// Re-read the dragged item's ID and index after the list changed under
    /// a press or drag. `locate` maps the recorded ID to its current ID and
    /// index; `None` means the item is gone and the drag is dropped.
    ///
    /// Returns whether a press or drag is still active.
    pub fn rebase<F>(&mut self, locate: F) -> bool
    where
        F: FnOnce(&PlaylistItemId) -> Option<(PlaylistItemId, usize)>,
    {
        let source = match &mut self.state {
            DragState::Idle => return false,
            DragState::Pending { source, .. } => source,
            DragState::Dragging(session) => &mut session.source,
        };
        let DragSource::FromTimeline { item_id, index } = source else {
            return true;
        };

        if let Some((current_id, current_index)) = locate(&*item_id) {
            if *index != current_index {
                tracing::trace!(item = %current_id, from = *index, to = current_index, "Drag source moved");
            }
            *item_id = current_id;
            *index = current_index;
            return true;
        }

        tracing::debug!(item = %item_id, "Dragged item left the timeline");
        self.state = DragState::Idle;
        false
    }

    /// Where the single gap indicator is drawn
    pub fn indicator_index(&self) -> Option<usize> {
        self.session().and_then(|s| s.hover_index)
    }

    /// Whether the timeline slot at `index` is the dragged item (drawn dimmed)
    pub fn is_source_dimmed(&self, index: usize) -> bool {
        matches!(
            self.session(),
            Some(DragSession {
                source: DragSource::FromTimeline { index: source, .. },
                ..
            }) if *source == index
        )
    }
}

/// Index of the slot whose midpoint is closest to `pointer_x`.
///
/// Ties go to the lower index. Returns `None` for an empty slot list or a
/// non-finite coordinate.
pub fn nearest_insertion_point(midpoints: &[f32], pointer_x: f32) -> Option<usize> {
    if !pointer_x.is_finite() {
        return None;
    }
    let mut best: Option<(usize, f32)> = None;
    for (index, mid) in midpoints.iter().enumerate() {
        if !mid.is_finite() {
            continue;
        }
        let distance = (pointer_x - mid).abs();
        match best {
            // Strictly closer only, so an equal distance keeps the lower index
            Some((_, d)) if distance >= d => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// Final position of a timeline item dropped at `hover_index`.
///
/// Removing the source shifts everything after it one slot to the left, so a
/// hover index past the source lands one lower.
pub fn resolve_drop_index(source_index: usize, hover_index: usize) -> usize {
    if hover_index > source_index {
        hover_index - 1
    } else {
        hover_index
    }
}
