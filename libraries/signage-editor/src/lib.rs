//! Signage Studio - Playlist Editor
//!
//! Host-facing editor for one playlist timeline:
//! - Optimistic edits (add, remove, move, duration) on the local item list
//! - In-order persistence with coalesced duration writes, rollback of refused
//!   edits and a full reload when the saved state is uncertain
//! - Drag and drop between the catalog and the timeline
//! - A looping preview of the timeline
//!
//! # Example
//!
//! ```ignore
//! use signage_editor::{EditorConfig, PlaylistEditor, Stores};
//!
//! let config = EditorConfig::load(None)?;
//! let mut editor = PlaylistEditor::open(playlist_id, Stores::shared(store), &config).await?;
//!
//! editor.add_asset(asset_id, None).await?;
//! editor.play();
//!
//! // Host event loop
//! loop {
//!     tokio::select! {
//!         Some(index) = editor.next_tick() => show(index),
//!         _ = ui_tick.tick() => { editor.process_outcomes().await?; }
//!     }
//! }
//!
//! let closed = editor.close().await;
//! ```

pub mod config;
pub mod coordinator;
mod editor;
mod error;
pub mod logging;

pub use config::EditorConfig;
pub use coordinator::{Mutation, Outcome, PersistenceCoordinator, Seq};
pub use editor::{CloseSignal, Notice, NoticeKind, PlaylistEditor, Stores};
pub use error::{EditorError, Result};
