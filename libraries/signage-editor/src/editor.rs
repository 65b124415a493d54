//! Playlist editor
//!
//! Wires the item list, drag engine, preview, catalog and persistence worker
//! together behind one host-facing type. Every edit lands in the local list
//! first and is queued for the store afterwards; [`PlaylistEditor::process_outcomes`]
//! folds store results back in (provisional IDs, rollbacks, stale items,
//! resyncs).

use crate::config::EditorConfig;
use crate::coordinator::{Mutation, Outcome, PersistenceCoordinator, Seq};
use crate::error::{EditorError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use signage_catalog::{CatalogIndex, ScrollUpdate};
use signage_core::{
    AssetId, FolderId, MediaAsset, MediaStore, MediaType, Playlist, PlaylistId, PlaylistItem,
    PlaylistItemId, PlaylistStore,
};
use signage_timeline::{
    DragEngine, DragOutcome, DragSource, DurationChange, HoverTarget, ItemList, MenuState,
    PlaybackEvent, PlaybackSimulator, StopReason, TimelineError,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The two stores the editor talks to
#[derive(Clone)]
pub struct Stores {
    pub playlists: Arc<dyn PlaylistStore>,
    pub media: Arc<dyn MediaStore>,
}

impl Stores {
    pub fn new(playlists: Arc<dyn PlaylistStore>, media: Arc<dyn MediaStore>) -> Self {
        Self { playlists, media }
    }

    /// One backend serving both traits
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: PlaylistStore + MediaStore + 'static,
    {
        Self {
            playlists: store.clone(),
            media: store,
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    /// The store refused an edit; it was undone locally
    Rejected,
    /// An edit could not be saved; it was undone locally
    SaveFailed,
    /// An item was removed because it no longer exists
    Removed,
    /// Local state was replaced with the store's
    Resynced,
}

/// Dismissible message for the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Returned by [`PlaylistEditor::close`] once pending writes are done
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseSignal {
    pub playlist_id: PlaylistId,
    /// Notices still open at close, including failures of the final writes
    pub notices: Vec<Notice>,
}

/// Timeline editor for one playlist
#[derive(Debug)]
pub struct PlaylistEditor {
    stores: Stores,
    list: ItemList,
    drag: DragEngine,
    playback: PlaybackSimulator,
    catalog: CatalogIndex,
    coordinator: PersistenceCoordinator,

    notices: Vec<Notice>,
    next_notice: u64,

    timeline_menu: MenuState<PlaylistItemId>,
    catalog_menu: MenuState<AssetId>,

    /// Abandons catalog fetches when the editor is left
    cancel: CancellationToken,

    /// Latest structural mutation; only that one can be undone in place
    last_structural: Option<Seq>,
    /// Latest duration write per item
    duration_seqs: HashMap<PlaylistItemId, Seq>,
    /// Provisional ID -> store ID, for outcomes that still name the former
    aliases: HashMap<PlaylistItemId, PlaylistItemId>,

    /// Set when a local invariant check failed; the next
    /// `process_outcomes` reloads
    resync_reason: Option<String>,
}

impl PlaylistEditor {
    /// Load a playlist and start its persistence worker.
    ///
    /// Items whose asset no longer exists are kept as stale placeholders. A
    /// failing catalog load does not fail the editor; it shows up as the
    /// catalog's `last_error`.
    pub async fn open(playlist_id: PlaylistId, stores: Stores, config: &EditorConfig) -> Result<Self> {
        let playlist = stores.playlists.get_playlist(&playlist_id).await?;
        let items = stores.playlists.list_items(&playlist_id).await?;
        let assets = fetch_assets(stores.media.as_ref(), &items, &HashSet::new()).await?;

        let mut list = ItemList::from_store(playlist, items, assets);
        let fixes = list.normalize_positions();

        let coordinator = PersistenceCoordinator::spawn(
            stores.playlists.clone(),
            playlist_id.clone(),
            config.editor.coalesce_window(),
        );
        let catalog = CatalogIndex::new(stores.media.clone(), config.catalog.settings());

        let mut editor = Self {
            stores,
            list,
            drag: DragEngine::new(config.editor.drag_threshold_px),
            playback: PlaybackSimulator::new(),
            catalog,
            coordinator,
            notices: Vec::new(),
            next_notice: 1,
            timeline_menu: MenuState::new(),
            catalog_menu: MenuState::new(),
            cancel: CancellationToken::new(),
            last_structural: None,
            duration_seqs: HashMap::new(),
            aliases: HashMap::new(),
            resync_reason: None,
        };

        if !fixes.is_empty() {
            editor.persist_renumber(fixes)?;
        }

        if let Err(e) = abandonable(&editor.cancel, editor.catalog.load()).await {
            tracing::warn!(error = %e, "Catalog failed to load");
        }

        tracing::info!(
            playlist = %playlist_id,
            items = editor.list.len(),
            total_seconds = editor.list.total_duration(),
            "Playlist opened"
        );
        Ok(editor)
    }

    // ===== State =====

    pub fn playlist(&self) -> &Playlist {
        self.list.playlist()
    }

    pub fn items(&self) -> &[PlaylistItem] {
        self.list.items()
    }

    pub fn list(&self) -> &ItemList {
        &self.list
    }

    pub fn asset(&self, asset_id: &AssetId) -> Option<&MediaAsset> {
        self.list.asset(asset_id)
    }

    /// Header indicator: true while any write is pending
    pub fn saving(&self) -> bool {
        self.coordinator.saving()
    }

    /// Wait until every write queued so far reached the store (held duration
    /// writes included). Outcomes are left for `process_outcomes`.
    pub async fn flush(&self) -> Result<()> {
        self.coordinator.flush().await
    }

    /// Sum of effective durations, in seconds
    pub fn total_duration(&self) -> u32 {
        self.list.total_duration()
    }

    /// How many timeline items use `asset_id` (catalog annotation)
    pub fn usage_count(&self, asset_id: &AssetId) -> usize {
        signage_catalog::usage_count(asset_id, self.list.items())
    }

    // ===== Edits =====

    /// Insert an asset at `at` (end when `None`); returns the provisional ID.
    ///
    /// The asset is taken from the loaded catalog pages when possible and
    /// fetched otherwise.
    pub async fn add_asset(&mut self, asset_id: AssetId, at: Option<usize>) -> Result<PlaylistItemId> {
        if self.list.asset(&asset_id).is_none() && self.catalog.find_asset(&asset_id).is_none() {
            let asset = self.stores.media.get_asset(&asset_id).await.map_err(|e| {
                if e.is_not_found() {
                    EditorError::Timeline(TimelineError::InvalidAsset(asset_id.clone()))
                } else {
                    EditorError::Store(e)
                }
            })?;
            self.list.upsert_asset(asset);
        }
        self.insert_known(asset_id, at)
    }

    /// Delete an item
    pub fn remove_item(&mut self, item_id: &PlaylistItemId) -> Result<()> {
        self.close_menus();
        let removal = self.checked(|list| list.remove(item_id))?;
        self.playback.invalidate(StopReason::StructuralChange);

        let seq = self.coordinator.submit(Mutation::Delete {
            item: removal.item,
            index: removal.index,
            shifted: removal.shifted,
        })?;
        self.last_structural = Some(seq);
        self.duration_seqs.remove(item_id);
        Ok(())
    }

    /// Move an item to `new_position` (arrow buttons, or a resolved drop).
    /// Returns false when it was already there.
    pub fn move_item(&mut self, item_id: &PlaylistItemId, new_position: usize) -> Result<bool> {
        self.close_menus();
        let from = self
            .list
            .index_of(item_id)
            .ok_or_else(|| TimelineError::ItemNotFound(item_id.clone()))?;
        let changes = self.checked(|list| list.reorder(item_id, new_position))?;
        if changes.is_empty() {
            return Ok(false);
        }
        let to = self.list.index_of(item_id).unwrap_or(from);

        let seq = self.coordinator.submit(Mutation::Reorder {
            item_id: item_id.clone(),
            from,
            to,
            changes,
        })?;
        self.last_structural = Some(seq);
        Ok(true)
    }

    /// Set (`Some`) or clear (`None`) an item's duration override.
    ///
    /// Applied locally at once; the store write is coalesced.
    pub fn set_duration(
        &mut self,
        item_id: &PlaylistItemId,
        seconds: Option<u32>,
    ) -> Result<DurationChange> {
        let change = self.list.set_duration(item_id, seconds)?;
        if change.previous == change.value {
            return Ok(change);
        }

        let seq = self.coordinator.submit(Mutation::SetDuration {
            item_id: item_id.clone(),
            previous: change.previous,
            value: change.value,
        })?;
        self.duration_seqs.insert(item_id.clone(), seq);
        Ok(change)
    }

    // ===== Drag =====

    pub fn drag(&self) -> &DragEngine {
        &self.drag
    }

    /// Pointer pressed on a timeline item
    pub fn begin_timeline_drag(&mut self, item_id: &PlaylistItemId, x: f32, y: f32) -> Result<()> {
        self.close_menus();
        let index = self
            .list
            .index_of(item_id)
            .ok_or_else(|| TimelineError::ItemNotFound(item_id.clone()))?;
        self.drag.pointer_down(
            DragSource::FromTimeline {
                item_id: item_id.clone(),
                index,
            },
            x,
            y,
        );
        Ok(())
    }

    /// Pointer pressed on a catalog asset
    pub fn begin_library_drag(&mut self, asset_id: AssetId, x: f32, y: f32) {
        self.close_menus();
        self.drag
            .pointer_down(DragSource::FromLibrary { asset_id }, x, y);
    }

    pub fn drag_move(&mut self, x: f32, y: f32) -> bool {
        self.drag.pointer_move(x, y)
    }

    /// Returns true only when the insertion point changed
    pub fn drag_hover(&mut self, target: HoverTarget<'_>) -> bool {
        self.drag.hover(target)
    }

    /// Pointer released: apply the drop. A drop that cannot be applied is
    /// reported as `Cancelled` and changes nothing.
    pub fn drag_drop(&mut self) -> DragOutcome {
        if self.drag.is_dragging() && !self.rebase_drag() {
            return DragOutcome::Cancelled;
        }
        let outcome = self.drag.release();
        let applied = match &outcome {
            DragOutcome::Reorder { item_id, to, .. } => {
                self.move_item(item_id, *to).map(|_| ())
            }
            DragOutcome::Add { asset_id, at } => {
                self.insert_known(asset_id.clone(), Some(*at)).map(|_| ())
            }
            _ => Ok(()),
        };

        match applied {
            Ok(()) => outcome,
            Err(e) => {
                tracing::debug!(error = %e, "Drop discarded");
                DragOutcome::Cancelled
            }
        }
    }

    pub fn drag_cancel(&mut self) -> DragOutcome {
        self.drag.cancel()
    }

    // ===== Preview =====

    pub fn playback(&self) -> &PlaybackSimulator {
        &self.playback
    }

    pub fn play(&mut self) -> bool {
        self.playback.start(&self.list)
    }

    pub fn stop(&mut self) -> bool {
        self.playback.stop()
    }

    pub fn skip_forward(&mut self) -> Option<usize> {
        self.playback.skip_forward(&self.list)
    }

    pub fn skip_backward(&mut self) -> Option<usize> {
        self.playback.skip_backward(&self.list)
    }

    /// Click on a timeline item
    pub fn select(&mut self, index: usize) -> Option<usize> {
        self.close_menus();
        self.playback.select(&self.list, index)
    }

    /// Wait for the preview timer; pending forever while stopped
    pub async fn next_tick(&mut self) -> Option<usize> {
        self.playback.next_tick(&self.list).await
    }

    pub fn fire_if_due(&mut self, now: Instant) -> Option<usize> {
        self.playback.fire_if_due(&self.list, now)
    }

    pub fn playback_events(&mut self) -> Vec<PlaybackEvent> {
        self.playback.drain_events()
    }

    // ===== Catalog =====

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    /// Token that abandons in-flight catalog fetches when cancelled
    pub fn fetch_cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn navigate(&mut self, folder: Option<FolderId>) -> Result<()> {
        self.close_menus();
        abandonable(&self.cancel, self.catalog.navigate(folder)).await
    }

    /// Scroll the catalog and fetch whatever the new window is missing
    pub async fn scroll_catalog(&mut self, offset: f32) -> Result<ScrollUpdate> {
        let update = self.catalog.on_scroll(offset);
        if !update.missing_pages.is_empty() {
            abandonable(&self.cancel, self.catalog.ensure_loaded()).await?;
        }
        Ok(update)
    }

    pub async fn search(&mut self, term: Option<String>) -> Result<()> {
        abandonable(&self.cancel, self.catalog.set_search(term)).await
    }

    pub async fn set_type_filter(&mut self, media_type: Option<MediaType>) -> Result<()> {
        abandonable(&self.cancel, self.catalog.set_media_type(media_type)).await
    }

    pub async fn set_my_designs(&mut self, my_designs: bool) -> Result<()> {
        abandonable(&self.cancel, self.catalog.set_my_designs(my_designs)).await
    }

    pub async fn retry_catalog(&mut self) -> Result<()> {
        abandonable(&self.cancel, self.catalog.retry()).await
    }

    pub fn dismiss_catalog_error(&mut self) {
        self.catalog.dismiss_error();
    }

    // ===== Menus =====

    pub fn timeline_menu(&self) -> &MenuState<PlaylistItemId> {
        &self.timeline_menu
    }

    pub fn catalog_menu(&self) -> &MenuState<AssetId> {
        &self.catalog_menu
    }

    /// Open the item's menu (closing the catalog's), or close it if open
    pub fn toggle_timeline_menu(&mut self, item_id: &PlaylistItemId) {
        self.catalog_menu.close();
        self.timeline_menu.toggle(item_id);
    }

    pub fn toggle_catalog_menu(&mut self, asset_id: &AssetId) {
        self.timeline_menu.close();
        self.catalog_menu.toggle(asset_id);
    }

    /// Any interaction outside an open menu
    pub fn close_menus(&mut self) {
        self.timeline_menu.close();
        self.catalog_menu.close();
    }

    // ===== Notices =====

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        self.notices.len() != before
    }

    // ===== Reconciliation =====

    /// Fold store results into local state. Returns how many outcomes were
    /// handled. Ends with a reload when any of them left the local state
    /// untrustworthy.
    ///
    /// A drag in progress follows its item to the new index; it is dropped
    /// when the item is gone.
    pub async fn process_outcomes(&mut self) -> Result<usize> {
        let mut handled = 0;
        let mut resync = self.resync_reason.take();

        while let Some(outcome) = self.coordinator.try_next_outcome() {
            handled += 1;
            match outcome {
                Outcome::Inserted {
                    provisional_id,
                    item,
                } => self.adopt_store_id(provisional_id, item.id),

                Outcome::Rejected {
                    seq,
                    mutation,
                    error,
                } => {
                    self.notify(
                        NoticeKind::Rejected,
                        format!("Could not {}: {}", describe(&mutation), error),
                    );
                    if !self.roll_back(seq, &mutation) {
                        resync.get_or_insert_with(|| format!("cannot undo {}", mutation.kind()));
                    }
                }

                Outcome::Failed {
                    seq,
                    mutation,
                    error,
                } => {
                    self.notify(
                        NoticeKind::SaveFailed,
                        format!("Could not save {}: {}", describe(&mutation), error),
                    );
                    if !self.roll_back(seq, &mutation) {
                        resync.get_or_insert_with(|| format!("cannot undo {}", mutation.kind()));
                    }
                }

                Outcome::Stale { item_id, .. } => {
                    if let Err(e) = self.drop_stale(&item_id) {
                        resync.get_or_insert_with(|| e.to_string());
                    }
                }

                Outcome::ResyncRequired { reason, .. } => {
                    resync.get_or_insert(reason);
                }
            }
        }

        if handled > 0 {
            self.rebase_drag();
        }

        if let Some(reason) = resync {
            tracing::warn!(%reason, "Reloading playlist from the store");
            self.reload().await?;
            self.notify(
                NoticeKind::Resynced,
                "The playlist was reloaded to match the saved version".to_string(),
            );
        }
        Ok(handled)
    }

    /// Replace local state with the store's item list.
    ///
    /// Waits for queued writes first so the fetch reflects them.
    pub async fn reload(&mut self) -> Result<()> {
        self.coordinator.flush().await?;

        let playlist_id = self.list.playlist().id.clone();
        let items = self.stores.playlists.list_items(&playlist_id).await?;
        let known: HashSet<AssetId> = self
            .list
            .items()
            .iter()
            .map(|i| i.asset_id.clone())
            .filter(|id| self.list.asset(id).is_some())
            .collect();
        for asset in fetch_assets(self.stores.media.as_ref(), &items, &known).await? {
            self.list.upsert_asset(asset);
        }

        let fixes = self.list.replace_all(items);
        self.playback.invalidate(StopReason::StructuralChange);
        self.drag.cancel();
        self.close_menus();
        self.last_structural = None;
        self.duration_seqs.clear();
        self.aliases.clear();

        // Whatever these describe is already reflected by the fetch
        while let Some(outcome) = self.coordinator.try_next_outcome() {
            if let Outcome::Rejected { mutation, error, .. } | Outcome::Failed { mutation, error, .. } =
                outcome
            {
                self.notify(
                    NoticeKind::SaveFailed,
                    format!("Could not save {}: {}", describe(&mutation), error),
                );
            }
        }

        if !fixes.is_empty() {
            self.persist_renumber(fixes)?;
        }

        tracing::info!(playlist = %playlist_id, items = self.list.len(), "Playlist reloaded");
        Ok(())
    }

    /// Leave the editor: stop the preview, abandon catalog fetches and wait
    /// for pending writes to finish.
    pub async fn close(mut self) -> CloseSignal {
        self.cancel.cancel();
        self.playback.invalidate(StopReason::Closed);
        self.drag.cancel();
        self.close_menus();

        self.coordinator.shutdown().await;
        while let Some(outcome) = self.coordinator.try_next_outcome() {
            match outcome {
                Outcome::Rejected { mutation, error, .. } | Outcome::Failed { mutation, error, .. } => {
                    self.notify(
                        NoticeKind::SaveFailed,
                        format!("Could not save {}: {}", describe(&mutation), error),
                    );
                }
                Outcome::ResyncRequired { reason, .. } => {
                    self.notify(
                        NoticeKind::SaveFailed,
                        format!("Saved state is uncertain: {}", reason),
                    );
                }
                Outcome::Inserted { .. } | Outcome::Stale { .. } => {}
            }
        }

        let playlist_id = self.list.playlist().id.clone();
        tracing::info!(playlist = %playlist_id, "Playlist editor closed");
        CloseSignal {
            playlist_id,
            notices: self.notices,
        }
    }

    // ===== Internals =====

    /// Insert an asset whose record is already cached (list or catalog)
    fn insert_known(&mut self, asset_id: AssetId, at: Option<usize>) -> Result<PlaylistItemId> {
        self.close_menus();
        if self.list.asset(&asset_id).is_none() {
            let asset = self
                .catalog
                .find_asset(&asset_id)
                .cloned()
                .ok_or_else(|| TimelineError::InvalidAsset(asset_id.clone()))?;
            self.list.upsert_asset(asset);
        }

        let insertion = self.checked(|list| list.add(asset_id.clone(), at, None))?;
        self.playback.invalidate(StopReason::StructuralChange);

        let provisional_id = insertion.item.id.clone();
        let seq = self.coordinator.submit(Mutation::Insert {
            provisional_id: provisional_id.clone(),
            asset_id,
            position: insertion.index as u32,
            override_seconds: insertion.item.override_duration_seconds,
            shifted: insertion.shifted,
        })?;
        self.last_structural = Some(seq);
        Ok(provisional_id)
    }

    /// Run a list mutation; an invariant failure schedules a reload
    fn checked<T>(
        &mut self,
        op: impl FnOnce(&mut ItemList) -> signage_timeline::Result<T>,
    ) -> Result<T> {
        op(&mut self.list).map_err(|e| {
            if let TimelineError::InvariantViolation(msg) = &e {
                self.resync_reason = Some(msg.clone());
            }
            EditorError::Timeline(e)
        })
    }

    /// Point the drag source at the dragged item's current ID and index
    fn rebase_drag(&mut self) -> bool {
        let list = &self.list;
        let aliases = &self.aliases;
        self.drag.rebase(|id| {
            let id = aliases.get(id).cloned().unwrap_or_else(|| id.clone());
            list.index_of(&id).map(|index| (id, index))
        })
    }

    fn persist_renumber(&mut self, changes: Vec<signage_core::PositionUpdate>) -> Result<()> {
        let seq = self.coordinator.submit(Mutation::Renumber { changes })?;
        self.last_structural = Some(seq);
        Ok(())
    }

    fn local_id(&self, id: &PlaylistItemId) -> PlaylistItemId {
        self.aliases.get(id).cloned().unwrap_or_else(|| id.clone())
    }

    fn adopt_store_id(&mut self, provisional_id: PlaylistItemId, persisted: PlaylistItemId) {
        if self.list.replace_item_id(&provisional_id, persisted.clone()) {
            if let Some(seq) = self.duration_seqs.remove(&provisional_id) {
                self.duration_seqs.insert(persisted.clone(), seq);
            }
            if self.timeline_menu.is_open(&provisional_id) {
                self.timeline_menu.close();
            }
        }
        self.aliases.insert(provisional_id, persisted);
    }

    /// Apply the local inverse of a failed write. Returns false when later
    /// edits make the inverse unsafe.
    fn roll_back(&mut self, seq: Seq, mutation: &Mutation) -> bool {
        if !mutation.is_structural() {
            let Mutation::SetDuration {
                item_id, previous, ..
            } = mutation
            else {
                return false;
            };
            let id = self.local_id(item_id);
            if self.duration_seqs.get(&id) == Some(&seq) {
                self.duration_seqs.remove(&id);
                self.list.restore_duration(&id, *previous);
            }
            // A newer write for the item carries its own outcome
            return true;
        }

        if self.last_structural != Some(seq) {
            return false;
        }
        self.last_structural = None;

        let undone = match mutation {
            Mutation::Insert { provisional_id, .. } => {
                let id = self.local_id(provisional_id);
                self.duration_seqs.remove(&id);
                self.list.remove(&id).is_ok()
            }
            Mutation::Delete { item, index, .. } => {
                let mut item = item.clone();
                item.id = self.local_id(&item.id);
                self.list.insert_existing(item, *index).is_ok()
            }
            Mutation::Reorder { item_id, from, .. } => {
                let id = self.local_id(item_id);
                self.list.reorder(&id, *from).is_ok()
            }
            Mutation::Renumber { .. } | Mutation::SetDuration { .. } => false,
        };

        if undone {
            tracing::debug!(seq, kind = mutation.kind(), "Edit rolled back");
            if matches!(mutation, Mutation::Insert { .. } | Mutation::Delete { .. }) {
                self.playback.invalidate(StopReason::StructuralChange);
            }
        }
        undone
    }

    fn drop_stale(&mut self, item_id: &PlaylistItemId) -> Result<()> {
        let id = self.local_id(item_id);
        let Some(removal) = self.list.remove_stale(&id)? else {
            return Ok(());
        };
        self.playback.invalidate(StopReason::StructuralChange);
        self.duration_seqs.remove(&id);
        if self.timeline_menu.is_open(&id) {
            self.timeline_menu.close();
        }

        let name = self
            .list
            .asset(&removal.item.asset_id)
            .map(|a| a.name.clone())
            .unwrap_or_else(|| removal.item.asset_id.to_string());
        self.notify(
            NoticeKind::Removed,
            format!("\"{}\" was removed elsewhere and is no longer in this playlist", name),
        );

        if removal.shifted.is_empty() {
            self.last_structural = None;
        } else {
            self.persist_renumber(removal.shifted)?;
        }
        Ok(())
    }

    fn notify(&mut self, kind: NoticeKind, message: String) {
        let id = self.next_notice;
        self.next_notice += 1;
        self.notices.push(Notice {
            id,
            kind,
            message,
            at: Utc::now(),
        });
    }
}

/// Race a catalog request against the editor's cancellation token
async fn abandonable<T>(
    cancel: &CancellationToken,
    request: impl Future<Output = signage_catalog::Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EditorError::Cancelled),
        result = request => Ok(result?),
    }
}

/// Fetch the assets referenced by `items` that are not in `known`.
/// Missing assets are skipped; their items become stale.
async fn fetch_assets(
    media: &dyn MediaStore,
    items: &[PlaylistItem],
    known: &HashSet<AssetId>,
) -> Result<Vec<MediaAsset>> {
    let mut seen = HashSet::new();
    let mut assets = Vec::new();
    for item in items {
        if known.contains(&item.asset_id) || !seen.insert(item.asset_id.clone()) {
            continue;
        }
        match media.get_asset(&item.asset_id).await {
            Ok(asset) => assets.push(asset),
            Err(e) if e.is_not_found() => {
                tracing::warn!(item = %item.id, asset = %item.asset_id, "Item references a deleted asset");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(assets)
}

fn describe(mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::Insert { .. } => "add the item",
        Mutation::Delete { .. } => "remove the item",
        Mutation::Reorder { .. } => "move the item",
        Mutation::SetDuration { .. } => "change the duration",
        Mutation::Renumber { .. } => "update positions",
    }
}
