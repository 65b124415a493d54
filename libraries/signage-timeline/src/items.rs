//! Ordered item list
//!
//! The canonical in-memory playlist: items sorted by position, plus a cache
//! of the assets they reference so effective durations can be resolved
//! without I/O.
//!
//! ```text
//! position:  0        1        2        3
//!          [ A:8s ] [ B:10s ] [ A:3s* ] [ C:?  ]
//!                              * override
//!                                        ? stale (asset deleted)
//! ```
//!
//! Every mutation renumbers the affected items in one step and reports the
//! position changes so they can be persisted as a single batch.

use crate::error::{Result, TimelineError};
use signage_core::{
    clamp_duration, effective_duration, AssetId, MediaAsset, Playlist, PlaylistItem,
    PlaylistItemId, PositionUpdate,
};
use std::collections::{HashMap, HashSet};

/// Result of an `add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// The new item (provisional ID)
    pub item: PlaylistItem,
    /// Index it was inserted at
    pub index: usize,
    /// Other items whose position moved
    pub shifted: Vec<PositionUpdate>,
}

/// Result of a `remove`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The removed item, with the position it had
    pub item: PlaylistItem,
    /// Index it was removed from
    pub index: usize,
    /// Other items whose position moved
    pub shifted: Vec<PositionUpdate>,
}

/// Result of a `set_duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationChange {
    pub previous: Option<u32>,
    pub value: Option<u32>,
}

/// Compute a new order for a single-item move.
///
/// Pure function of (current order, item, target position): the same result
/// whether the move came from a drag or an arrow button. `new_position` is
/// clamped to the last index. Returns `None` if the item is not in `order`.
pub fn reorder_ids(
    order: &[PlaylistItemId],
    item_id: &PlaylistItemId,
    new_position: usize,
) -> Option<Vec<PlaylistItemId>> {
    let from = order.iter().position(|id| id == item_id)?;
    let mut next = order.to_vec();
    let moved = next.remove(from);
    let to = new_position.min(next.len());
    next.insert(to, moved);
    Some(next)
}

/// Ordered list of playlist items
#[derive(Debug, Clone)]
pub struct ItemList {
    playlist: Playlist,

    /// Sorted by position; `items[i].position == i`
    items: Vec<PlaylistItem>,

    /// Assets referenced by items; a missing entry marks a stale reference
    assets: HashMap<AssetId, MediaAsset>,

    /// Bumped whenever items are added or removed (not on reorder/duration)
    structure_revision: u64,
}

impl ItemList {
    /// Create an empty list for a playlist
    pub fn new(playlist: Playlist) -> Self {
        Self {
            playlist,
            items: Vec::new(),
            assets: HashMap::new(),
            structure_revision: 0,
        }
    }

    /// Build a list from store records.
    ///
    /// Items are sorted by position. Gaps or duplicates coming from the store
    /// are not fixed here; call [`ItemList::normalize_positions`] and persist
    /// the result.
    pub fn from_store(
        playlist: Playlist,
        mut items: Vec<PlaylistItem>,
        assets: impl IntoIterator<Item = MediaAsset>,
    ) -> Self {
        items.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Self {
            playlist,
            items,
            assets: assets.into_iter().map(|a| (a.id.clone(), a)).collect(),
            structure_revision: 0,
        }
    }

    /// Renumber positions to `0..N` keeping the current order.
    ///
    /// Returns the updates needed to bring the store in line (empty when the
    /// positions were already dense).
    pub fn normalize_positions(&mut self) -> Vec<PositionUpdate> {
        let changes = self.renumber();
        if !changes.is_empty() {
            tracing::warn!(
                playlist = %self.playlist.id,
                fixed = changes.len(),
                "Store returned non-contiguous positions, renumbered"
            );
        }
        changes
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn items(&self) -> &[PlaylistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current ID order
    pub fn order(&self) -> Vec<PlaylistItemId> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }

    pub fn get(&self, item_id: &PlaylistItemId) -> Option<&PlaylistItem> {
        self.items.iter().find(|i| &i.id == item_id)
    }

    pub fn index_of(&self, item_id: &PlaylistItemId) -> Option<usize> {
        self.items.iter().position(|i| &i.id == item_id)
    }

    pub fn item_at(&self, index: usize) -> Option<&PlaylistItem> {
        self.items.get(index)
    }

    /// Cached asset for an ID
    pub fn asset(&self, asset_id: &AssetId) -> Option<&MediaAsset> {
        self.assets.get(asset_id)
    }

    /// Add or refresh a cached asset
    pub fn upsert_asset(&mut self, asset: MediaAsset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    /// Forget an asset (deleted elsewhere); items referencing it become stale
    pub fn forget_asset(&mut self, asset_id: &AssetId) {
        self.assets.remove(asset_id);
    }

    /// Whether the item's asset is missing (rendered as a placeholder)
    pub fn is_stale(&self, item_id: &PlaylistItemId) -> bool {
        self.get(item_id)
            .map(|item| !self.assets.contains_key(&item.asset_id))
            .unwrap_or(false)
    }

    /// Number of items referencing `asset_id`
    pub fn usage_count(&self, asset_id: &AssetId) -> usize {
        self.items.iter().filter(|i| &i.asset_id == asset_id).count()
    }

    /// Bumped on add/remove/replace; used to detect structural changes
    pub fn structure_revision(&self) -> u64 {
        self.structure_revision
    }

    /// Effective duration of one item, in seconds
    pub fn effective_duration(&self, item: &PlaylistItem) -> u32 {
        let asset_seconds = self
            .assets
            .get(&item.asset_id)
            .and_then(|a| a.duration_seconds);
        effective_duration(
            item.override_duration_seconds,
            asset_seconds,
            self.playlist.default_duration_seconds,
        )
    }

    /// Effective duration of the item at `index`
    pub fn effective_duration_at(&self, index: usize) -> Option<u32> {
        self.items.get(index).map(|item| self.effective_duration(item))
    }

    /// Effective durations in position order
    pub fn durations(&self) -> Vec<u32> {
        self.items
            .iter()
            .map(|item| self.effective_duration(item))
            .collect()
    }

    /// Sum of effective durations, in seconds
    pub fn total_duration(&self) -> u32 {
        self.items
            .iter()
            .map(|item| self.effective_duration(item))
            .sum()
    }

    /// Insert a new item referencing `asset_id`.
    ///
    /// `at` defaults to the end and is clamped to `len`. An explicit override
    /// is clamped to the accepted range; without one the item tracks the
    /// asset/playlist defaults.
    pub fn add(
        &mut self,
        asset_id: AssetId,
        at: Option<usize>,
        override_seconds: Option<u32>,
    ) -> Result<Insertion> {
        if asset_id.is_empty() {
            return Err(TimelineError::InvalidAsset(asset_id));
        }

        let index = at.unwrap_or(self.items.len()).min(self.items.len());
        let item = PlaylistItem::new(self.playlist.id.clone(), asset_id, index as u32)
            .with_override(override_seconds.map(clamp_duration));

        self.items.insert(index, item.clone());
        let shifted = self.renumber();
        self.structure_revision += 1;
        self.verify()?;

        tracing::debug!(item = %item.id, asset = %item.asset_id, index, "Item added");

        Ok(Insertion {
            item,
            index,
            shifted,
        })
    }

    /// Re-insert an existing item at `index` (undo of a rejected remove)
    pub fn insert_existing(
        &mut self,
        mut item: PlaylistItem,
        index: usize,
    ) -> Result<Vec<PositionUpdate>> {
        let index = index.min(self.items.len());
        item.position = index as u32;
        self.items.insert(index, item);
        let shifted = self.renumber();
        self.structure_revision += 1;
        self.verify()?;
        Ok(shifted)
    }

    /// Delete an item and close the gap
    pub fn remove(&mut self, item_id: &PlaylistItemId) -> Result<Removal> {
        let index = self
            .index_of(item_id)
            .ok_or_else(|| TimelineError::ItemNotFound(item_id.clone()))?;

        let item = self.items.remove(index);
        let shifted = self.renumber();
        self.structure_revision += 1;
        self.verify()?;

        tracing::debug!(item = %item.id, index, "Item removed");

        Ok(Removal {
            item,
            index,
            shifted,
        })
    }

    /// Set (`Some`, clamped to `[1, 3600]`) or clear (`None`) an override
    pub fn set_duration(
        &mut self,
        item_id: &PlaylistItemId,
        seconds: Option<u32>,
    ) -> Result<DurationChange> {
        if self.is_stale(item_id) {
            return Err(TimelineError::StaleReference(item_id.clone()));
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| &i.id == item_id)
            .ok_or_else(|| TimelineError::ItemNotFound(item_id.clone()))?;

        let previous = item.override_duration_seconds;
        let value = seconds.map(clamp_duration);
        item.override_duration_seconds = value;

        Ok(DurationChange { previous, value })
    }

    /// Restore an override without validation (undo path; stale items too)
    pub fn restore_duration(&mut self, item_id: &PlaylistItemId, seconds: Option<u32>) -> bool {
        match self.items.iter_mut().find(|i| &i.id == item_id) {
            Some(item) => {
                item.override_duration_seconds = seconds;
                true
            }
            None => false,
        }
    }

    /// Move one item to `new_position`, shifting everything in between.
    ///
    /// Returns every position that changed, the moved item included. Moving an
    /// item onto its own position returns an empty list and changes nothing.
    pub fn reorder(
        &mut self,
        item_id: &PlaylistItemId,
        new_position: usize,
    ) -> Result<Vec<PositionUpdate>> {
        if self.items.is_empty() {
            return Err(TimelineError::ItemNotFound(item_id.clone()));
        }
        let from = self
            .index_of(item_id)
            .ok_or_else(|| TimelineError::ItemNotFound(item_id.clone()))?;
        let to = new_position.min(self.items.len() - 1);
        if from == to {
            return Ok(Vec::new());
        }

        let moved = self.items.remove(from);
        self.items.insert(to, moved);
        let changes = self.renumber();
        self.verify()?;

        tracing::debug!(item = %item_id, from, to, "Item reordered");

        Ok(changes)
    }

    /// Swap a provisional ID for the one assigned by the store
    pub fn replace_item_id(&mut self, provisional: &PlaylistItemId, persisted: PlaylistItemId) -> bool {
        match self.items.iter_mut().find(|i| &i.id == provisional) {
            Some(item) => {
                item.id = persisted;
                true
            }
            None => false,
        }
    }

    /// Drop an item whose record no longer exists in the store
    pub fn remove_stale(&mut self, item_id: &PlaylistItemId) -> Result<Option<Removal>> {
        let Some(index) = self.index_of(item_id) else {
            return Ok(None);
        };
        let item = self.items.remove(index);
        let shifted = self.renumber();
        self.structure_revision += 1;
        self.verify()?;

        tracing::debug!(item = %item.id, index, "Stale item dropped");

        Ok(Some(Removal {
            item,
            index,
            shifted,
        }))
    }

    /// Replace all items with the store's canonical state
    pub fn replace_all(&mut self, mut items: Vec<PlaylistItem>) -> Vec<PositionUpdate> {
        items.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        self.items = items;
        self.structure_revision += 1;
        self.normalize_positions()
    }

    /// Check that positions are exactly `0..N`, unique and in order, and that
    /// every item references an asset.
    pub fn check_invariants(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for (index, item) in self.items.iter().enumerate() {
            if item.position as usize != index {
                return Err(TimelineError::InvariantViolation(format!(
                    "item {} at index {} has position {}",
                    item.id, index, item.position
                )));
            }
            if !seen.insert(&item.id) {
                return Err(TimelineError::InvariantViolation(format!(
                    "item {} appears twice",
                    item.id
                )));
            }
            if item.asset_id.is_empty() {
                return Err(TimelineError::InvariantViolation(format!(
                    "item {} has no asset",
                    item.id
                )));
            }
        }
        Ok(())
    }

    /// Loud in debug builds, an error in release builds
    fn verify(&self) -> Result<()> {
        let result = self.check_invariants();
        debug_assert!(result.is_ok(), "item list invariant broken: {result:?}");
        if let Err(err) = &result {
            tracing::error!(playlist = %self.playlist.id, error = %err, "Item list invariant broken");
        }
        result
    }

    /// Set `position = index` for every item; returns what changed
    fn renumber(&mut self) -> Vec<PositionUpdate> {
        let mut changes = Vec::new();
        for (index, item) in self.items.iter_mut().enumerate() {
            let position = index as u32;
            if item.position != position {
                item.position = position;
                changes.push(PositionUpdate::new(item.id.clone(), position));
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signage_core::{MediaType, PlaylistId};

    fn playlist() -> Playlist {
        Playlist {
            id: PlaylistId::new("p1"),
            name: "Lobby".into(),
            default_duration_seconds: Some(10),
            default_transition: Default::default(),
            shuffle: false,
        }
    }

    fn asset(id: &str, duration: Option<u32>) -> MediaAsset {
        let mut asset = MediaAsset::new(id, MediaType::Video, format!("https://cdn/{}", id));
        asset.id = AssetId::new(id);
        asset.duration_seconds = duration;
        asset
    }

    fn list_with(assets: &[(&str, Option<u32>)]) -> ItemList {
        let mut list = ItemList::new(playlist());
        for (id, duration) in assets {
            list.upsert_asset(asset(id, *duration));
            list.add(AssetId::new(*id), None, None).unwrap();
        }
        list
    }

    fn asset_order(list: &ItemList) -> Vec<&str> {
        list.items().iter().map(|i| i.asset_id.as_str()).collect()
    }

    #[test]
    fn create_empty_list() {
        let list = ItemList::new(playlist());
        assert!(list.is_empty());
        assert_eq!(list.total_duration(), 0);
        assert!(list.check_invariants().is_ok());
    }

    #[test]
    fn add_appends_by_default() {
        let list = list_with(&[("a", None), ("b", None)]);
        assert_eq!(asset_order(&list), vec!["a", "b"]);
        assert_eq!(list.items()[1].position, 1);
    }

    #[test]
    fn add_at_position_shifts_followers() {
        let mut list = list_with(&[("a", None), ("b", None)]);
        let insertion = list.add(AssetId::new("c"), Some(0), None).unwrap();

        assert_eq!(insertion.index, 0);
        assert_eq!(asset_order(&list), vec!["c", "a", "b"]);
        assert_eq!(insertion.shifted.len(), 2);
        assert!(list.check_invariants().is_ok());
    }

    #[test]
    fn add_past_end_is_clamped() {
        let mut list = list_with(&[("a", None)]);
        let insertion = list.add(AssetId::new("b"), Some(99), None).unwrap();
        assert_eq!(insertion.index, 1);
        assert!(insertion.shifted.is_empty());
    }

    #[test]
    fn add_rejects_blank_asset() {
        let mut list = ItemList::new(playlist());
        assert!(matches!(
            list.add(AssetId::new(""), None, None),
            Err(TimelineError::InvalidAsset(_))
        ));
    }

    #[test]
    fn explicit_override_is_clamped() {
        let mut list = ItemList::new(playlist());
        let insertion = list.add(AssetId::new("a"), None, Some(7200)).unwrap();
        assert_eq!(insertion.item.override_duration_seconds, Some(3600));
    }

    #[test]
    fn same_asset_can_be_added_twice() {
        let list = list_with(&[("a", None), ("a", None), ("b", None)]);
        assert_eq!(list.usage_count(&AssetId::new("a")), 2);
        assert_eq!(list.usage_count(&AssetId::new("b")), 1);
        assert_eq!(list.usage_count(&AssetId::new("zzz")), 0);
    }

    #[test]
    fn remove_closes_gap() {
        let mut list = list_with(&[("a", None), ("b", None), ("c", None)]);
        let id = list.items()[0].id.clone();

        let removal = list.remove(&id).unwrap();
        assert_eq!(removal.index, 0);
        assert_eq!(removal.shifted.len(), 2);
        assert_eq!(asset_order(&list), vec!["b", "c"]);
        assert!(list.check_invariants().is_ok());
    }

    #[test]
    fn remove_unknown_item_fails() {
        let mut list = list_with(&[("a", None)]);
        assert!(matches!(
            list.remove(&PlaylistItemId::new("nope")),
            Err(TimelineError::ItemNotFound(_))
        ));
    }

    #[test]
    fn reorder_forward_and_back() {
        let mut list = list_with(&[("a", None), ("b", None), ("c", None), ("d", None)]);
        let a = list.items()[0].id.clone();

        let changes = list.reorder(&a, 2).unwrap();
        assert_eq!(asset_order(&list), vec!["b", "c", "a", "d"]);
        assert_eq!(changes.len(), 3);

        list.reorder(&a, 0).unwrap();
        assert_eq!(asset_order(&list), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn reorder_to_own_position_is_noop() {
        let mut list = list_with(&[("a", None), ("b", None), ("c", None)]);
        let before = list.items().to_vec();
        let b = list.items()[1].id.clone();

        let changes = list.reorder(&b, 1).unwrap();
        assert!(changes.is_empty());
        assert_eq!(list.items(), before.as_slice());
    }

    #[test]
    fn reorder_past_end_moves_to_last() {
        let mut list = list_with(&[("a", None), ("b", None), ("c", None)]);
        let a = list.items()[0].id.clone();
        list.reorder(&a, 10).unwrap();
        assert_eq!(asset_order(&list), vec!["b", "c", "a"]);
    }

    #[test]
    fn reorder_ids_is_pure() {
        let order: Vec<PlaylistItemId> = ["x", "y", "z"].iter().map(|s| PlaylistItemId::new(*s)).collect();
        let moved = reorder_ids(&order, &PlaylistItemId::new("z"), 0).unwrap();
        assert_eq!(
            moved,
            vec![
                PlaylistItemId::new("z"),
                PlaylistItemId::new("x"),
                PlaylistItemId::new("y")
            ]
        );
        assert_eq!(order.len(), 3);
        assert!(reorder_ids(&order, &PlaylistItemId::new("w"), 0).is_none());
    }

    #[test]
    fn set_duration_clamps_and_clears() {
        let mut list = list_with(&[("a", Some(8))]);
        let id = list.items()[0].id.clone();

        let change = list.set_duration(&id, Some(0)).unwrap();
        assert_eq!(change.previous, None);
        assert_eq!(change.value, Some(1));

        list.set_duration(&id, Some(5000)).unwrap();
        assert_eq!(list.effective_duration_at(0), Some(3600));

        let change = list.set_duration(&id, None).unwrap();
        assert_eq!(change.previous, Some(3600));
        assert_eq!(list.effective_duration_at(0), Some(8));
    }

    #[test]
    fn stale_items_are_removable_but_not_editable() {
        let mut list = ItemList::new(playlist());
        let insertion = list.add(AssetId::new("gone"), None, None).unwrap();
        let id = insertion.item.id;

        assert!(list.is_stale(&id));
        assert!(matches!(
            list.set_duration(&id, Some(5)),
            Err(TimelineError::StaleReference(_))
        ));
        assert!(list.remove(&id).is_ok());
    }

    #[test]
    fn remove_stale_closes_the_gap() {
        let mut list = list_with(&[("a", None), ("b", None), ("c", None)]);
        let b = list.items()[1].id.clone();

        let removal = list.remove_stale(&b).unwrap().unwrap();
        assert_eq!(removal.index, 1);
        assert_eq!(asset_order(&list), vec!["a", "c"]);
        assert_eq!(list.check_invariants(), Ok(()));
        assert!(list.remove_stale(&b).unwrap().is_none());
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "item list invariant broken"))]
    fn remove_stale_reports_a_broken_list() {
        let p = playlist();
        let mut items = Vec::new();
        for (n, asset) in ["a", "b", "c"].into_iter().enumerate() {
            let mut item = PlaylistItem::new(p.id.clone(), AssetId::new(asset), n as u32);
            item.id = PlaylistItemId::new(if n == 0 { "gone" } else { "dup" });
            items.push(item);
        }
        let mut list = ItemList::from_store(p, items, Vec::new());

        let result = list.remove_stale(&PlaylistItemId::new("gone"));
        assert!(matches!(result, Err(TimelineError::InvariantViolation(_))));
    }

    #[test]
    fn total_duration_uses_fallback_chain() {
        // 8 (asset) + 10 (playlist default) + 4 (override)
        let mut list = list_with(&[("video", Some(8)), ("image", None), ("clip", Some(30))]);
        let clip = list.items()[2].id.clone();
        list.set_duration(&clip, Some(4)).unwrap();

        assert_eq!(list.durations(), vec![8, 10, 4]);
        assert_eq!(list.total_duration(), 22);
    }

    #[test]
    fn structure_revision_tracks_add_and_remove_only() {
        let mut list = list_with(&[("a", None), ("b", None)]);
        let rev = list.structure_revision();

        let a = list.items()[0].id.clone();
        list.reorder(&a, 1).unwrap();
        list.set_duration(&a, Some(3)).unwrap();
        assert_eq!(list.structure_revision(), rev);

        list.remove(&a).unwrap();
        assert_eq!(list.structure_revision(), rev + 1);
    }

    #[test]
    fn from_store_sorts_and_normalize_fixes_gaps() {
        let p = playlist();
        let mut first = PlaylistItem::new(p.id.clone(), AssetId::new("a"), 4);
        first.id = PlaylistItemId::new("i1");
        let mut second = PlaylistItem::new(p.id.clone(), AssetId::new("b"), 1);
        second.id = PlaylistItemId::new("i2");

        let mut list = ItemList::from_store(p, vec![first, second], Vec::new());
        assert_eq!(list.items()[0].id.as_str(), "i2");
        assert!(list.check_invariants().is_err());

        let fixes = list.normalize_positions();
        assert_eq!(
            fixes,
            vec![
                PositionUpdate::new(PlaylistItemId::new("i2"), 0),
                PositionUpdate::new(PlaylistItemId::new("i1"), 1)
            ]
        );
        assert!(list.check_invariants().is_ok());
    }

    #[test]
    fn replace_item_id_keeps_position() {
        let mut list = list_with(&[("a", None), ("b", None)]);
        let provisional = list.items()[1].id.clone();

        assert!(list.replace_item_id(&provisional, PlaylistItemId::new("server-9")));
        assert_eq!(list.items()[1].id.as_str(), "server-9");
        assert_eq!(list.items()[1].position, 1);
        assert!(!list.replace_item_id(&provisional, PlaylistItemId::new("again")));
    }

    #[test]
    fn insert_existing_restores_removed_item() {
        let mut list = list_with(&[("a", None), ("b", None), ("c", None)]);
        let b = list.items()[1].id.clone();
        let removal = list.remove(&b).unwrap();

        list.insert_existing(removal.item, removal.index).unwrap();
        assert_eq!(asset_order(&list), vec!["a", "b", "c"]);
        assert_eq!(list.items()[1].id, b);
    }
}
