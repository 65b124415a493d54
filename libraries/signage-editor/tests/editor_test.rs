//! Editor against the in-memory store
//!
//! Every test follows the host loop: edit locally, let the writes land
//! (`flush`), then fold the results back in (`process_outcomes`).

use signage_core::{
    AssetId, Error, MediaAsset, MediaType, Playlist, PlaylistId, PlaylistItem, PlaylistItemId,
    PositionUpdate,
};
use signage_editor::{EditorConfig, EditorError, NoticeKind, PlaylistEditor, Stores};
use signage_store_client::{MemoryStore, StoreCall, StoreOp};
use signage_timeline::{DragOutcome, HoverTarget, PlaybackEvent, StopReason, TimelineError};
use std::sync::Arc;
use std::time::Duration;

// ===== Test Helpers =====

struct Fixture {
    store: Arc<MemoryStore>,
    playlist_id: PlaylistId,
    assets: Vec<MediaAsset>,
}

fn sid(n: usize) -> PlaylistItemId {
    PlaylistItemId::new(format!("s{}", n))
}

/// One video per duration, placed at positions 0..N with IDs s0, s1, ...
async fn fixture(durations: &[u32]) -> Fixture {
    let positions: Vec<u32> = (0..durations.len() as u32).collect();
    fixture_at(durations, &positions).await
}

async fn fixture_at(durations: &[u32], positions: &[u32]) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let playlist = Playlist::new("Lobby");
    let playlist_id = playlist.id.clone();
    store.add_playlist(playlist).await;

    let mut assets = Vec::new();
    for (n, (secs, position)) in durations.iter().zip(positions).enumerate() {
        let mut asset = MediaAsset::new(
            format!("clip-{}", n),
            MediaType::Video,
            format!("https://cdn.example/clip-{}.mp4", n),
        );
        asset.duration_seconds = Some(*secs);
        let mut item = PlaylistItem::new(playlist_id.clone(), asset.id.clone(), *position);
        item.id = sid(n);
        store.add_asset(asset.clone()).await;
        store.add_item(item).await;
        assets.push(asset);
    }

    Fixture {
        store,
        playlist_id,
        assets,
    }
}

fn config() -> EditorConfig {
    let mut config = EditorConfig::default();
    config.editor.coalesce_window_ms = 0;
    config
}

async fn open(fixture: &Fixture) -> PlaylistEditor {
    open_with(fixture, &config()).await
}

async fn open_with(fixture: &Fixture, config: &EditorConfig) -> PlaylistEditor {
    PlaylistEditor::open(
        fixture.playlist_id.clone(),
        Stores::shared(fixture.store.clone()),
        config,
    )
    .await
    .unwrap()
}

/// Let queued writes land, then reconcile
async fn settle(editor: &mut PlaylistEditor) {
    editor.flush().await.unwrap();
    editor.process_outcomes().await.unwrap();
}

fn order(editor: &PlaylistEditor) -> Vec<String> {
    editor
        .items()
        .iter()
        .map(|i| i.id.as_str().to_string())
        .collect()
}

async fn store_order(fixture: &Fixture) -> Vec<String> {
    fixture
        .store
        .items(&fixture.playlist_id)
        .await
        .iter()
        .map(|i| i.id.as_str().to_string())
        .collect()
}

fn notice_kinds(editor: &PlaylistEditor) -> Vec<NoticeKind> {
    editor.notices().iter().map(|n| n.kind).collect()
}

// ===== Opening =====

#[tokio::test]
async fn open_loads_items_and_catalog() {
    let fixture = fixture(&[5, 10, 15]).await;
    let editor = open(&fixture).await;

    assert_eq!(order(&editor), vec!["s0", "s1", "s2"]);
    assert_eq!(editor.total_duration(), 30);
    assert!(!editor.saving());
    assert_eq!(editor.catalog().total_count(), 3);
    assert_eq!(editor.usage_count(&fixture.assets[1].id), 1);
    assert!(fixture.store.writes().await.is_empty());
}

#[tokio::test]
async fn open_repairs_position_gaps_in_the_store() {
    let fixture = fixture_at(&[5, 5, 5], &[0, 2, 5]).await;
    let editor = open(&fixture).await;

    let positions: Vec<u32> = editor.items().iter().map(|i| i.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    editor.flush().await.unwrap();
    assert_eq!(
        fixture.store.writes().await,
        vec![StoreCall::Positions(vec![
            PositionUpdate::new(sid(1), 1),
            PositionUpdate::new(sid(2), 2),
        ])]
    );
}

#[tokio::test]
async fn deleted_asset_leaves_a_stale_placeholder() {
    let fixture = fixture(&[5, 10]).await;
    fixture.store.remove_asset(&fixture.assets[1].id).await;
    let mut editor = open(&fixture).await;

    assert_eq!(order(&editor), vec!["s0", "s1"]);
    assert!(editor.list().is_stale(&sid(1)));

    let err = editor.set_duration(&sid(1), Some(30)).unwrap_err();
    assert!(matches!(
        err,
        EditorError::Timeline(TimelineError::StaleReference(_))
    ));

    // A stale item can still be removed
    editor.remove_item(&sid(1)).unwrap();
    settle(&mut editor).await;
    assert_eq!(store_order(&fixture).await, vec!["s0"]);
}

#[tokio::test]
async fn open_unknown_playlist_fails() {
    let fixture = fixture(&[]).await;
    let result = PlaylistEditor::open(
        PlaylistId::new("missing"),
        Stores::shared(fixture.store.clone()),
        &config(),
    )
    .await;
    assert!(matches!(result, Err(EditorError::Store(e)) if e.is_not_found()));
}

// ===== Optimistic edits =====

#[tokio::test]
async fn added_item_takes_the_store_id() {
    let fixture = fixture(&[5, 10, 15]).await;
    let mut editor = open(&fixture).await;

    let provisional = editor
        .add_asset(fixture.assets[0].id.clone(), Some(1))
        .await
        .unwrap();
    assert_eq!(editor.items()[1].id, provisional);
    assert_eq!(editor.total_duration(), 35);
    assert!(editor.saving());

    settle(&mut editor).await;
    assert!(!editor.saving());
    assert_eq!(order(&editor), vec!["s0", "item-1", "s1", "s2"]);
    assert_eq!(store_order(&fixture).await, order(&editor));
    assert_eq!(editor.usage_count(&fixture.assets[0].id), 2);
}

#[tokio::test]
async fn edits_on_a_provisional_item_reach_the_store_record() {
    let fixture = fixture(&[5]).await;
    let mut editor = open(&fixture).await;

    let provisional = editor
        .add_asset(fixture.assets[0].id.clone(), None)
        .await
        .unwrap();
    editor.set_duration(&provisional, Some(42)).unwrap();
    settle(&mut editor).await;

    let saved = fixture.store.items(&fixture.playlist_id).await;
    assert_eq!(saved[1].id.as_str(), "item-1");
    assert_eq!(saved[1].override_duration_seconds, Some(42));
    assert_eq!(editor.items()[1].override_duration_seconds, Some(42));
}

#[tokio::test]
async fn move_item_persists_one_batch() {
    let fixture = fixture(&[5, 5, 5, 5]).await;
    let mut editor = open(&fixture).await;

    assert!(editor.move_item(&sid(3), 0).unwrap());
    assert!(!editor.move_item(&sid(3), 0).unwrap());
    settle(&mut editor).await;

    assert_eq!(order(&editor), vec!["s3", "s0", "s1", "s2"]);
    assert_eq!(store_order(&fixture).await, order(&editor));
    let batches = fixture
        .store
        .writes()
        .await
        .into_iter()
        .filter(|w| matches!(w, StoreCall::Positions(_)))
        .count();
    assert_eq!(batches, 1);
}

#[tokio::test]
async fn removing_an_item_renumbers_the_rest() {
    let fixture = fixture(&[5, 10, 15]).await;
    let mut editor = open(&fixture).await;

    editor.remove_item(&sid(0)).unwrap();
    assert_eq!(editor.total_duration(), 25);
    settle(&mut editor).await;

    let saved = fixture.store.items(&fixture.playlist_id).await;
    let positions: Vec<(String, u32)> = saved
        .iter()
        .map(|i| (i.id.as_str().to_string(), i.position))
        .collect();
    assert_eq!(positions, vec![("s1".into(), 0), ("s2".into(), 1)]);
}

// ===== Failures =====

#[tokio::test]
async fn rejected_insert_is_rolled_back() {
    let fixture = fixture(&[5, 10, 15]).await;
    fixture
        .store
        .fail_next(StoreOp::InsertItem, Error::rejected("playlist is full"))
        .await;
    let mut editor = open(&fixture).await;

    editor
        .add_asset(fixture.assets[2].id.clone(), Some(0))
        .await
        .unwrap();
    assert_eq!(editor.items().len(), 4);

    settle(&mut editor).await;
    assert_eq!(order(&editor), vec!["s0", "s1", "s2"]);
    assert_eq!(notice_kinds(&editor), vec![NoticeKind::Rejected]);
    assert!(fixture.store.writes().await.is_empty());
}

#[tokio::test]
async fn failed_delete_restores_the_item() {
    let fixture = fixture(&[5, 10, 15]).await;
    fixture
        .store
        .fail_next(StoreOp::DeleteItem, Error::transient("connection reset"))
        .await;
    let mut editor = open(&fixture).await;

    editor.remove_item(&sid(1)).unwrap();
    assert_eq!(order(&editor), vec!["s0", "s2"]);

    settle(&mut editor).await;
    assert_eq!(order(&editor), vec!["s0", "s1", "s2"]);
    assert_eq!(editor.list().check_invariants(), Ok(()));
    assert_eq!(notice_kinds(&editor), vec![NoticeKind::SaveFailed]);
    assert!(fixture.store.writes().await.is_empty());
}

#[tokio::test]
async fn rejected_duration_restores_the_previous_value() {
    let fixture = fixture(&[5, 10]).await;
    fixture
        .store
        .fail_next(StoreOp::UpdateDuration, Error::rejected("out of range"))
        .await;
    let mut editor = open(&fixture).await;

    editor.set_duration(&sid(0), Some(42)).unwrap();
    assert_eq!(editor.total_duration(), 52);

    settle(&mut editor).await;
    assert_eq!(editor.items()[0].override_duration_seconds, None);
    assert_eq!(editor.total_duration(), 15);
    assert_eq!(notice_kinds(&editor), vec![NoticeKind::Rejected]);
}

#[tokio::test]
async fn partial_batch_reloads_from_the_store() {
    let fixture = fixture(&[5, 5, 5, 5]).await;
    fixture
        .store
        .fail_next(
            StoreOp::UpdatePositions,
            Error::PartialBatch {
                applied: 1,
                failed: 3,
            },
        )
        .await;
    let mut editor = open(&fixture).await;

    editor.move_item(&sid(3), 0).unwrap();
    assert_eq!(order(&editor), vec!["s3", "s0", "s1", "s2"]);

    settle(&mut editor).await;

    // Store had s3 -> 0 only: s0 and s3 share position 0
    assert_eq!(order(&editor), vec!["s0", "s3", "s1", "s2"]);
    assert_eq!(editor.list().check_invariants(), Ok(()));
    assert!(notice_kinds(&editor).contains(&NoticeKind::Resynced));

    // The repair is persisted
    editor.flush().await.unwrap();
    assert_eq!(store_order(&fixture).await, order(&editor));
    let positions: Vec<u32> = fixture
        .store
        .items(&fixture.playlist_id)
        .await
        .iter()
        .map(|i| i.position)
        .collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn ambiguous_insert_reloads_instead_of_guessing() {
    let fixture = fixture(&[5, 10, 15]).await;
    fixture
        .store
        .fail_next(StoreOp::InsertItem, Error::Ambiguous("timed out".into()))
        .await;
    let mut editor = open(&fixture).await;

    let provisional = editor
        .add_asset(fixture.assets[0].id.clone(), None)
        .await
        .unwrap();
    settle(&mut editor).await;

    // The insert did land; the reload picks it up under its store ID
    assert_eq!(order(&editor), vec!["s0", "s1", "s2", "item-1"]);
    assert!(editor.list().get(&provisional).is_none());
    assert!(notice_kinds(&editor).contains(&NoticeKind::Resynced));
}

#[tokio::test]
async fn item_deleted_elsewhere_is_dropped_locally() {
    let fixture = fixture(&[5, 10, 15]).await;
    let mut editor = open(&fixture).await;
    fixture.store.remove_item_record(&sid(1)).await;

    editor.set_duration(&sid(1), Some(20)).unwrap();
    settle(&mut editor).await;

    assert_eq!(order(&editor), vec!["s0", "s2"]);
    assert_eq!(notice_kinds(&editor), vec![NoticeKind::Removed]);

    editor.flush().await.unwrap();
    let saved = fixture.store.items(&fixture.playlist_id).await;
    assert_eq!(saved[1].id, sid(2));
    assert_eq!(saved[1].position, 1);
}

#[tokio::test]
async fn notices_can_be_dismissed() {
    let fixture = fixture(&[5]).await;
    fixture
        .store
        .fail_next(StoreOp::UpdateDuration, Error::transient("offline"))
        .await;
    let mut editor = open(&fixture).await;

    editor.set_duration(&sid(0), Some(8)).unwrap();
    settle(&mut editor).await;

    let id = editor.notices()[0].id;
    assert!(editor.dismiss_notice(id));
    assert!(!editor.dismiss_notice(id));
    assert!(editor.notices().is_empty());
}

// ===== Coalescing and saving state =====

#[tokio::test(start_paused = true)]
async fn rapid_duration_edits_write_once() {
    let fixture = fixture(&[5, 10]).await;
    let mut config = config();
    config.editor.coalesce_window_ms = 400;
    let mut editor = open_with(&fixture, &config).await;

    for seconds in [6, 7, 8, 9] {
        editor.set_duration(&sid(0), Some(seconds)).unwrap();
        assert_eq!(editor.items()[0].override_duration_seconds, Some(seconds));
    }
    assert!(editor.saving());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!editor.saving());
    assert_eq!(
        fixture.store.writes().await,
        vec![StoreCall::Duration {
            item_id: sid(0),
            seconds: Some(9)
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn saving_is_true_until_the_write_lands() {
    let fixture = fixture(&[5, 10]).await;
    fixture
        .store
        .set_latency(StoreOp::DeleteItem, Duration::from_secs(2))
        .await;
    let mut editor = open(&fixture).await;

    editor.remove_item(&sid(0)).unwrap();
    assert!(editor.saving());

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(editor.saving());

    editor.flush().await.unwrap();
    assert!(!editor.saving());
}

#[tokio::test(start_paused = true)]
async fn close_waits_for_pending_writes() {
    let fixture = fixture(&[5, 10, 15]).await;
    fixture
        .store
        .set_latency(StoreOp::DeleteItem, Duration::from_secs(2))
        .await;
    let mut editor = open(&fixture).await;

    editor.remove_item(&sid(2)).unwrap();
    let closed = editor.close().await;

    assert_eq!(closed.playlist_id, fixture.playlist_id);
    assert!(closed.notices.is_empty());
    assert_eq!(store_order(&fixture).await, vec!["s0", "s1"]);
}

// ===== Preview =====

#[tokio::test(start_paused = true)]
async fn adding_while_playing_stops_the_preview() {
    let fixture = fixture(&[5, 10]).await;
    let mut editor = open(&fixture).await;

    assert!(editor.play());
    assert_eq!(editor.next_tick().await, Some(1));
    editor
        .add_asset(fixture.assets[0].id.clone(), Some(0))
        .await
        .unwrap();

    assert!(!editor.playback().is_playing());
    assert_eq!(editor.playback().deadline(), None);
    let events = editor.playback_events();
    assert_eq!(
        events.last(),
        Some(&PlaybackEvent::Stopped {
            index: Some(1),
            reason: StopReason::StructuralChange
        })
    );
}

#[tokio::test(start_paused = true)]
async fn removing_an_earlier_item_stops_the_preview() {
    let fixture = fixture(&[5, 10, 15]).await;
    let mut editor = open(&fixture).await;

    assert!(editor.play());
    assert_eq!(editor.next_tick().await, Some(1));
    editor.remove_item(&sid(0)).unwrap();

    assert!(!editor.playback().is_playing());
    assert_eq!(editor.playback().deadline(), None);
    assert_eq!(
        editor.playback_events().last(),
        Some(&PlaybackEvent::Stopped {
            index: Some(1),
            reason: StopReason::StructuralChange
        })
    );

    settle(&mut editor).await;
    assert_eq!(store_order(&fixture).await, vec!["s1", "s2"]);
}

#[tokio::test(start_paused = true)]
async fn reorder_keeps_the_preview_running() {
    let fixture = fixture(&[5, 10, 15]).await;
    let mut editor = open(&fixture).await;

    editor.play();
    editor.move_item(&sid(2), 0).unwrap();
    assert!(editor.playback().is_playing());
    assert_eq!(editor.next_tick().await, Some(1));
}

// ===== Drag and drop =====

#[tokio::test]
async fn dropping_a_catalog_asset_inserts_it() {
    let fixture = fixture(&[5, 10, 15]).await;
    let mut editor = open(&fixture).await;
    let asset_id = fixture.assets[2].id.clone();

    editor.begin_library_drag(asset_id.clone(), 0.0, 0.0);
    assert!(editor.drag_move(0.0, 12.0));
    assert!(editor.drag_hover(HoverTarget::Slots {
        midpoints: &[50.0, 150.0, 250.0],
        pointer_x: 140.0,
    }));
    assert!(!editor.drag_hover(HoverTarget::Slots {
        midpoints: &[50.0, 150.0, 250.0],
        pointer_x: 160.0,
    }));
    assert_eq!(editor.drag().indicator_index(), Some(1));

    assert_eq!(
        editor.drag_drop(),
        DragOutcome::Add {
            asset_id: asset_id.clone(),
            at: 1
        }
    );
    assert_eq!(editor.items()[1].asset_id, asset_id);
    settle(&mut editor).await;
    assert_eq!(store_order(&fixture).await, order(&editor));
}

#[tokio::test]
async fn dragging_to_the_end_zone_moves_to_last() {
    let fixture = fixture(&[5, 10, 15]).await;
    let mut editor = open(&fixture).await;

    editor.begin_timeline_drag(&sid(0), 10.0, 10.0).unwrap();
    editor.drag_move(40.0, 10.0);
    assert!(editor.drag().is_source_dimmed(0));
    editor.drag_hover(HoverTarget::EndZone { len: 3 });

    assert_eq!(
        editor.drag_drop(),
        DragOutcome::Reorder {
            item_id: sid(0),
            from: 0,
            to: 2
        }
    );
    assert_eq!(order(&editor), vec!["s1", "s2", "s0"]);
    assert!(editor.drag().is_idle());
}

#[tokio::test]
async fn drag_follows_its_item_through_a_rollback() {
    let fixture = fixture(&[5, 10, 15, 20]).await;
    fixture
        .store
        .fail_next(StoreOp::DeleteItem, Error::transient("connection reset"))
        .await;
    let mut editor = open(&fixture).await;

    editor.remove_item(&sid(0)).unwrap();
    editor.begin_timeline_drag(&sid(2), 150.0, 10.0).unwrap();
    assert!(editor.drag_move(180.0, 10.0));
    assert!(editor.drag().is_source_dimmed(1));

    // The failed delete puts s0 back in front of the dragged item
    settle(&mut editor).await;
    assert_eq!(order(&editor), vec!["s0", "s1", "s2", "s3"]);
    assert!(editor.drag().is_source_dimmed(2));
    assert!(!editor.drag().is_source_dimmed(1));

    editor.drag_hover(HoverTarget::Slots {
        midpoints: &[50.0, 150.0, 250.0, 350.0],
        pointer_x: 150.0,
    });
    assert_eq!(
        editor.drag_drop(),
        DragOutcome::Reorder {
            item_id: sid(2),
            from: 2,
            to: 1
        }
    );
    assert_eq!(order(&editor), vec!["s0", "s2", "s1", "s3"]);

    settle(&mut editor).await;
    assert_eq!(store_order(&fixture).await, order(&editor));
}

#[tokio::test]
async fn dimmed_slot_tracks_the_item_after_an_insert_is_undone() {
    let fixture = fixture(&[5, 10, 15]).await;
    fixture
        .store
        .fail_next(StoreOp::InsertItem, Error::rejected("playlist is full"))
        .await;
    let mut editor = open(&fixture).await;

    editor
        .add_asset(fixture.assets[1].id.clone(), Some(0))
        .await
        .unwrap();
    editor.begin_timeline_drag(&sid(0), 150.0, 10.0).unwrap();
    editor.drag_move(180.0, 10.0);
    assert!(editor.drag().is_source_dimmed(1));

    settle(&mut editor).await;
    assert!(editor.drag().is_source_dimmed(0));
    assert!(!editor.drag().is_source_dimmed(1));

    editor.drag_hover(HoverTarget::EndZone { len: 3 });
    assert_eq!(
        editor.drag_drop(),
        DragOutcome::Reorder {
            item_id: sid(0),
            from: 0,
            to: 2
        }
    );
    assert_eq!(order(&editor), vec!["s1", "s2", "s0"]);
}

#[tokio::test]
async fn dragging_an_item_whose_insert_is_undone_ends_the_drag() {
    let fixture = fixture(&[5, 10]).await;
    fixture
        .store
        .fail_next(StoreOp::InsertItem, Error::rejected("playlist is full"))
        .await;
    let mut editor = open(&fixture).await;

    let provisional = editor
        .add_asset(fixture.assets[0].id.clone(), None)
        .await
        .unwrap();
    editor.begin_timeline_drag(&provisional, 250.0, 10.0).unwrap();
    editor.drag_move(200.0, 10.0);
    assert!(editor.drag().is_dragging());

    settle(&mut editor).await;
    assert!(editor.drag().is_idle());
    assert_eq!(order(&editor), vec!["s0", "s1"]);
}

#[tokio::test]
async fn dropping_an_unknown_asset_is_silently_cancelled() {
    let fixture = fixture(&[5]).await;
    let mut editor = open(&fixture).await;

    editor.begin_library_drag(AssetId::new("not-in-catalog"), 0.0, 0.0);
    editor.drag_move(20.0, 0.0);
    editor.drag_hover(HoverTarget::EndZone { len: 1 });

    assert_eq!(editor.drag_drop(), DragOutcome::Cancelled);
    assert_eq!(order(&editor), vec!["s0"]);
    assert!(!editor.saving());
}

// ===== Catalog and menus =====

#[tokio::test(start_paused = true)]
async fn leaving_the_editor_abandons_catalog_fetches() {
    let fixture = fixture(&[5, 10]).await;
    let mut editor = open(&fixture).await;
    fixture
        .store
        .set_latency(StoreOp::ListAssets, Duration::from_secs(30))
        .await;

    let token = editor.fetch_cancellation();
    let (result, ()) = tokio::join!(editor.set_type_filter(Some(MediaType::Image)), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    assert!(matches!(result, Err(EditorError::Cancelled)));
    assert_eq!(editor.catalog().total_count(), 2);
}

#[tokio::test]
async fn one_menu_open_at_a_time() {
    let fixture = fixture(&[5, 10]).await;
    let mut editor = open(&fixture).await;
    let asset_id = fixture.assets[0].id.clone();

    editor.toggle_timeline_menu(&sid(0));
    assert!(editor.timeline_menu().is_open(&sid(0)));

    editor.toggle_timeline_menu(&sid(1));
    assert!(!editor.timeline_menu().is_open(&sid(0)));
    assert!(editor.timeline_menu().is_open(&sid(1)));

    editor.toggle_catalog_menu(&asset_id);
    assert!(editor.catalog_menu().is_open(&asset_id));
    assert_eq!(editor.timeline_menu().open_key(), None);

    editor.select(0);
    assert_eq!(editor.catalog_menu().open_key(), None);
}
