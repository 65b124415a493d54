//! Signage Studio Core
//!
//! Platform-agnostic domain types, traits, and error handling shared by the
//! playlist editor crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Playlist`, `PlaylistItem`, `MediaAsset`, `Folder`
//! - **Duration Resolution**: the single `effective_duration` fallback chain
//! - **Store Traits**: `MediaStore` and `PlaylistStore`, the narrow contract the
//!   editor needs from the backing data store
//! - **Error Handling**: Unified `Error` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use signage_core::{effective_duration, AssetId, PlaylistId, PlaylistItem};
//!
//! let item = PlaylistItem::new(PlaylistId::new("p1"), AssetId::new("a1"), 0);
//!
//! // No override, asset runs 8s, playlist default 10s
//! assert_eq!(effective_duration(item.override_duration_seconds, Some(8), Some(10)), 8);
//! ```

#![forbid(unsafe_code)]

pub mod duration;
pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use duration::{
    clamp_duration, effective_duration, FALLBACK_DURATION_SECS, MAX_DURATION_SECS,
    MIN_DURATION_SECS,
};
pub use error::{Error, Result};
pub use store::{MediaStore, PlaylistStore, PositionUpdate};
pub use types::{
    AssetFilter, AssetId, AssetPage, Folder, FolderId, MediaAsset, MediaType, PageRequest,
    Playlist, PlaylistId, PlaylistItem, PlaylistItemId, Transition,
};
