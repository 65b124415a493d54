/// Playlist domain types
use crate::types::{AssetId, PlaylistId, PlaylistItemId};
use serde::{Deserialize, Serialize};

/// Transition played between two items on the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Hard cut
    #[default]
    None,
    /// Cross-fade
    Fade,
    /// Slide in from the right
    Slide,
    /// Zoom in
    Zoom,
}

/// Playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Display name
    pub name: String,

    /// Default item duration in seconds (used when neither the item nor its
    /// asset provide one)
    #[serde(default)]
    pub default_duration_seconds: Option<u32>,

    /// Default transition between items
    #[serde(default)]
    pub default_transition: Transition,

    /// Shuffle flag (stored only; the preview plays in position order)
    #[serde(default)]
    pub shuffle: bool,
}

impl Playlist {
    /// Create a new playlist with a generated ID
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlaylistId::generate(),
            name: name.into(),
            default_duration_seconds: Some(crate::FALLBACK_DURATION_SECS),
            default_transition: Transition::None,
            shuffle: false,
        }
    }
}

/// An entry of a playlist
///
/// References its asset by id; the asset may be edited or deleted elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// Item identifier
    pub id: PlaylistItemId,

    /// Owning playlist
    pub playlist_id: PlaylistId,

    /// Referenced media asset
    pub asset_id: AssetId,

    /// Zero-based, dense position within the playlist
    pub position: u32,

    /// Explicit duration; `None` tracks the asset/playlist defaults live
    #[serde(default)]
    pub override_duration_seconds: Option<u32>,
}

impl PlaylistItem {
    /// Create a new item with a generated (provisional) ID
    pub fn new(playlist_id: PlaylistId, asset_id: AssetId, position: u32) -> Self {
        Self {
            id: PlaylistItemId::generate(),
            playlist_id,
            asset_id,
            position,
            override_duration_seconds: None,
        }
    }

    /// Builder-style override
    #[must_use]
    pub fn with_override(mut self, seconds: Option<u32>) -> Self {
        self.override_duration_seconds = seconds;
        self
    }
}
