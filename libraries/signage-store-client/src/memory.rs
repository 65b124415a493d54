//! In-process store
//!
//! Plain CRUD over in-memory maps, with hooks to inject failures and latency.
//! Used by tests and by the preview CLI's `--demo` mode.
//!
//! The store never renumbers on its own: inserts and deletes touch exactly
//! one record, and position changes arrive through
//! [`PlaylistStore::update_item_positions`].

use async_trait::async_trait;
use signage_core::{
    AssetFilter, AssetId, AssetPage, Error, Folder, FolderId, MediaAsset, MediaStore,
    PageRequest, Playlist, PlaylistId, PlaylistItem, PlaylistItemId, PlaylistStore,
    PositionUpdate, Result,
};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

/// Store operation, used to target injected failures and in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListAssets,
    GetAsset,
    GetFolder,
    GetPlaylist,
    ListItems,
    InsertItem,
    DeleteItem,
    UpdatePositions,
    UpdateDuration,
}

/// A write that reached the store, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Insert {
        asset_id: AssetId,
        position: u32,
    },
    Delete(PlaylistItemId),
    Positions(Vec<PositionUpdate>),
    Duration {
        item_id: PlaylistItemId,
        seconds: Option<u32>,
    },
}

#[derive(Debug, Default)]
struct State {
    playlists: HashMap<PlaylistId, Playlist>,
    items: Vec<PlaylistItem>,
    assets: Vec<MediaAsset>,
    folders: HashMap<FolderId, Folder>,
    failures: HashMap<StoreOp, VecDeque<Error>>,
    latency: HashMap<StoreOp, Duration>,
    writes: Vec<StoreCall>,
    next_id: u64,
}

/// In-memory [`MediaStore`] + [`PlaylistStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_playlist(&self, playlist: Playlist) {
        let mut state = self.state.lock().await;
        state.playlists.insert(playlist.id.clone(), playlist);
    }

    pub async fn add_asset(&self, asset: MediaAsset) {
        self.state.lock().await.assets.push(asset);
    }

    pub async fn add_folder(&self, folder: Folder) {
        let mut state = self.state.lock().await;
        state.folders.insert(folder.id.clone(), folder);
    }

    /// Seed an item record as-is (positions are not checked)
    pub async fn add_item(&self, item: PlaylistItem) {
        self.state.lock().await.items.push(item);
    }

    /// Delete an asset behind the editor's back
    pub async fn remove_asset(&self, id: &AssetId) {
        self.state.lock().await.assets.retain(|a| &a.id != id);
    }

    /// Delete an item behind the editor's back
    pub async fn remove_item_record(&self, id: &PlaylistItemId) {
        self.state.lock().await.items.retain(|i| &i.id != id);
    }

    /// Items of a playlist, ordered by position
    pub async fn items(&self, playlist_id: &PlaylistId) -> Vec<PlaylistItem> {
        let state = self.state.lock().await;
        sorted_items(&state, playlist_id)
    }

    /// Writes received so far
    pub async fn writes(&self) -> Vec<StoreCall> {
        self.state.lock().await.writes.clone()
    }

    /// Fail the next call of `op` with `error`.
    ///
    /// Queued failures are consumed in order. For writes, `Ambiguous` applies
    /// the write before failing (timeout after the server acted), and
    /// `PartialBatch { applied, .. }` applies the first `applied` updates.
    pub async fn fail_next(&self, op: StoreOp, error: Error) {
        let mut state = self.state.lock().await;
        state.failures.entry(op).or_default().push_back(error);
    }

    /// Delay every call of `op`
    pub async fn set_latency(&self, op: StoreOp, latency: Duration) {
        self.state.lock().await.latency.insert(op, latency);
    }

    /// Wait out the configured latency, then take the next injected failure
    async fn enter(&self, op: StoreOp) -> Option<Error> {
        let latency = self.state.lock().await.latency.get(&op).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state.lock().await;
        state.failures.get_mut(&op).and_then(VecDeque::pop_front)
    }
}

fn sorted_items(state: &State, playlist_id: &PlaylistId) -> Vec<PlaylistItem> {
    let mut items: Vec<PlaylistItem> = state
        .items
        .iter()
        .filter(|i| &i.playlist_id == playlist_id)
        .cloned()
        .collect();
    items.sort_by_key(|i| i.position);
    items
}

/// Whether an injected failure should still let the write through
fn applies_anyway(error: &Error) -> bool {
    matches!(error, Error::Ambiguous(_))
}

fn apply_positions(state: &mut State, updates: &[PositionUpdate]) -> Result<()> {
    if let Some(missing) = updates
        .iter()
        .find(|u| !state.items.iter().any(|i| i.id == u.item_id))
    {
        return Err(Error::not_found("playlist item", missing.item_id.as_str()));
    }
    for update in updates {
        if let Some(item) = state.items.iter_mut().find(|i| i.id == update.item_id) {
            item.position = update.position;
        }
    }
    Ok(())
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn list_assets(
        &self,
        folder_id: Option<&FolderId>,
        filter: &AssetFilter,
        page: PageRequest,
    ) -> Result<AssetPage> {
        if let Some(error) = self.enter(StoreOp::ListAssets).await {
            return Err(error);
        }
        let state = self.state.lock().await;
        if let Some(folder) = folder_id {
            if !state.folders.contains_key(folder) {
                return Err(Error::not_found("folder", folder.as_str()));
            }
        }

        let matching: Vec<&MediaAsset> = state
            .assets
            .iter()
            .filter(|a| a.folder_id.as_ref() == folder_id && filter.matches(a))
            .collect();
        let mut subfolders: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| f.parent_id.as_ref() == folder_id)
            .cloned()
            .collect();
        subfolders.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(AssetPage {
            total_count: matching.len(),
            items: matching
                .into_iter()
                .skip(page.offset())
                .take(page.page_size)
                .cloned()
                .collect(),
            subfolders,
        })
    }

    async fn get_asset(&self, id: &AssetId) -> Result<MediaAsset> {
        if let Some(error) = self.enter(StoreOp::GetAsset).await {
            return Err(error);
        }
        let state = self.state.lock().await;
        state
            .assets
            .iter()
            .find(|a| &a.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("asset", id.as_str()))
    }

    async fn get_folder(&self, id: &FolderId) -> Result<Folder> {
        if let Some(error) = self.enter(StoreOp::GetFolder).await {
            return Err(error);
        }
        let state = self.state.lock().await;
        state
            .folders
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("folder", id.as_str()))
    }
}

#[async_trait]
impl PlaylistStore for MemoryStore {
    async fn get_playlist(&self, id: &PlaylistId) -> Result<Playlist> {
        if let Some(error) = self.enter(StoreOp::GetPlaylist).await {
            return Err(error);
        }
        let state = self.state.lock().await;
        state
            .playlists
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("playlist", id.as_str()))
    }

    async fn list_items(&self, playlist_id: &PlaylistId) -> Result<Vec<PlaylistItem>> {
        if let Some(error) = self.enter(StoreOp::ListItems).await {
            return Err(error);
        }
        let state = self.state.lock().await;
        if !state.playlists.contains_key(playlist_id) {
            return Err(Error::not_found("playlist", playlist_id.as_str()));
        }
        Ok(sorted_items(&state, playlist_id))
    }

    async fn insert_item(
        &self,
        playlist_id: &PlaylistId,
        asset_id: &AssetId,
        position: u32,
        override_duration_seconds: Option<u32>,
    ) -> Result<PlaylistItem> {
        let failure = self.enter(StoreOp::InsertItem).await;
        let mut state = self.state.lock().await;
        if let Some(error) = failure.as_ref().filter(|e| !applies_anyway(e)) {
            return Err(error.clone());
        }
        if !state.playlists.contains_key(playlist_id) {
            return Err(Error::not_found("playlist", playlist_id.as_str()));
        }

        state.next_id += 1;
        let item = PlaylistItem {
            id: PlaylistItemId::new(format!("item-{}", state.next_id)),
            playlist_id: playlist_id.clone(),
            asset_id: asset_id.clone(),
            position,
            override_duration_seconds,
        };
        state.items.push(item.clone());
        state.writes.push(StoreCall::Insert {
            asset_id: asset_id.clone(),
            position,
        });

        match failure {
            Some(error) => Err(error),
            None => Ok(item),
        }
    }

    async fn delete_item(&self, item_id: &PlaylistItemId) -> Result<()> {
        let failure = self.enter(StoreOp::DeleteItem).await;
        let mut state = self.state.lock().await;
        if let Some(error) = failure.as_ref().filter(|e| !applies_anyway(e)) {
            return Err(error.clone());
        }
        let before = state.items.len();
        state.items.retain(|i| &i.id != item_id);
        if state.items.len() == before {
            return Err(Error::not_found("playlist item", item_id.as_str()));
        }
        state.writes.push(StoreCall::Delete(item_id.clone()));
        failure.map_or(Ok(()), Err)
    }

    async fn update_item_positions(&self, updates: &[PositionUpdate]) -> Result<()> {
        let failure = self.enter(StoreOp::UpdatePositions).await;
        let mut state = self.state.lock().await;
        match failure {
            Some(Error::PartialBatch { applied, failed }) => {
                let applied = applied.min(updates.len());
                apply_positions(&mut state, &updates[..applied])?;
                state.writes.push(StoreCall::Positions(updates[..applied].to_vec()));
                Err(Error::PartialBatch { applied, failed })
            }
            Some(error) if !applies_anyway(&error) => Err(error),
            failure => {
                apply_positions(&mut state, updates)?;
                state.writes.push(StoreCall::Positions(updates.to_vec()));
                failure.map_or(Ok(()), Err)
            }
        }
    }

    async fn update_item_duration(
        &self,
        item_id: &PlaylistItemId,
        seconds: Option<u32>,
    ) -> Result<()> {
        let failure = self.enter(StoreOp::UpdateDuration).await;
        let mut state = self.state.lock().await;
        if let Some(error) = failure.as_ref().filter(|e| !applies_anyway(e)) {
            return Err(error.clone());
        }
        let item = state
            .items
            .iter_mut()
            .find(|i| &i.id == item_id)
            .ok_or_else(|| Error::not_found("playlist item", item_id.as_str()))?;
        item.override_duration_seconds = seconds;
        state.writes.push(StoreCall::Duration {
            item_id: item_id.clone(),
            seconds,
        });
        failure.map_or(Ok(()), Err)
    }
}
