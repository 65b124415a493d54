//! Playback Events
//!
//! Event-based communication for UI synchronization during the preview.
//! Events are queued by the simulator and drained by the host:
//! - Start/stop of the preview
//! - Cursor moves (timer, skip, explicit selection)

use serde::{Deserialize, Serialize};

/// Why the preview stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Operator pressed stop
    User,
    /// Items were added or removed while playing
    StructuralChange,
    /// The list became empty
    EmptyList,
    /// The editor was closed
    Closed,
}

/// What moved the preview cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceCause {
    /// Slot timer elapsed
    Timer,
    /// Skip forward/backward
    Skip,
}

/// Events emitted by the playback simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Preview started at `index`
    Started {
        index: usize,
        /// Slot length of the first item, in seconds
        slot_seconds: u32,
    },

    /// Cursor moved while playing
    Advanced {
        from: usize,
        to: usize,
        cause: AdvanceCause,
    },

    /// Cursor moved while stopped (skip or click on an item)
    Selected {
        index: usize,
    },

    /// Preview stopped; the cursor stays on `index`
    Stopped {
        index: Option<usize>,
        reason: StopReason,
    },
}
