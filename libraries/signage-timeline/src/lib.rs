//! Signage Studio - Playlist Timeline
//!
//! Platform-agnostic timeline logic for the playlist editor.
//!
//! This crate provides:
//! - Ordered item list with dense 0-based positions
//! - Duration overrides resolved through one fallback chain
//! - Drag-reorder state machine (timeline moves and catalog drops)
//! - Simulated TV playback that loops through the items
//! - Per-list context-menu state
//!
//! # Architecture
//!
//! `signage-timeline` has no I/O:
//! - No dependency on the store (persistence lives in `signage-editor`)
//! - No dependency on any UI toolkit
//! - Pointer input is reduced to plain coordinates
//!
//! # Example: Editing
//!
//! ```rust
//! use signage_core::{AssetId, Playlist};
//! use signage_timeline::ItemList;
//!
//! let mut list = ItemList::new(Playlist::new("Lobby"));
//! list.add(AssetId::new("a"), None, None).unwrap();
//! let b = list.add(AssetId::new("b"), None, None).unwrap().item.id;
//!
//! list.reorder(&b, 0).unwrap();
//! assert_eq!(list.items()[0].asset_id.as_str(), "b");
//! ```
//!
//! # Example: Dragging
//!
//! ```rust
//! use signage_core::PlaylistItemId;
//! use signage_timeline::{DragEngine, DragOutcome, DragSource, HoverTarget};
//!
//! let mut drag = DragEngine::default();
//! drag.pointer_down(
//!     DragSource::FromTimeline { item_id: PlaylistItemId::new("i3"), index: 3 },
//!     0.0,
//!     0.0,
//! );
//! drag.pointer_move(20.0, 0.0);
//! drag.hover(HoverTarget::EndZone { len: 6 });
//!
//! assert_eq!(
//!     drag.release(),
//!     DragOutcome::Reorder { item_id: PlaylistItemId::new("i3"), from: 3, to: 5 }
//! );
//! ```

pub mod drag;
mod error;
pub mod events;
mod items;
mod menu;
mod playback;

// Public exports
pub use drag::{DragEngine, DragOutcome, DragSession, DragSource, HoverTarget};
pub use error::{Result, TimelineError};
pub use events::{AdvanceCause, PlaybackEvent, StopReason};
pub use items::{reorder_ids, DurationChange, Insertion, ItemList, Removal};
pub use menu::MenuState;
pub use playback::{PlaybackSimulator, PlaybackState};
