//! Store traits
//!
//! The editor only needs a narrow contract from the backing data store. These
//! traits abstract it so the same editor runs against the remote REST store,
//! the in-memory store used in tests, or a mock.

use crate::error::Result;
use crate::types::{
    AssetFilter, AssetId, AssetPage, Folder, FolderId, MediaAsset, PageRequest, Playlist,
    PlaylistId, PlaylistItem, PlaylistItemId,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One entry of a batched position update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub item_id: PlaylistItemId,
    pub position: u32,
}

impl PositionUpdate {
    pub fn new(item_id: PlaylistItemId, position: u32) -> Self {
        Self { item_id, position }
    }
}

/// Media asset store
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// List one page of assets directly inside `folder_id` (`None` = root)
    async fn list_assets(
        &self,
        folder_id: Option<&FolderId>,
        filter: &AssetFilter,
        page: PageRequest,
    ) -> Result<AssetPage>;

    /// Get an asset by ID
    async fn get_asset(&self, id: &AssetId) -> Result<MediaAsset>;

    /// Get a folder by ID (used to walk breadcrumbs up to the root)
    async fn get_folder(&self, id: &FolderId) -> Result<Folder>;
}

/// Playlist store
///
/// Every write targets only the fields it changes; there is no full-record
/// update.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Get a playlist by ID
    async fn get_playlist(&self, id: &PlaylistId) -> Result<Playlist>;

    /// Get all items of a playlist, ordered by position
    async fn list_items(&self, playlist_id: &PlaylistId) -> Result<Vec<PlaylistItem>>;

    /// Insert a new item; returns the persisted record with its store ID
    async fn insert_item(
        &self,
        playlist_id: &PlaylistId,
        asset_id: &AssetId,
        position: u32,
        override_duration_seconds: Option<u32>,
    ) -> Result<PlaylistItem>;

    /// Delete an item
    async fn delete_item(&self, item_id: &PlaylistItemId) -> Result<()>;

    /// Update the positions of several items as one batch
    ///
    /// Fails with `Error::PartialBatch` when only some updates were applied.
    async fn update_item_positions(&self, updates: &[PositionUpdate]) -> Result<()>;

    /// Set or clear the duration override of one item
    async fn update_item_duration(
        &self,
        item_id: &PlaylistItemId,
        seconds: Option<u32>,
    ) -> Result<()>;
}
