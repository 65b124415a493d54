//! Property-based tests for the item list
//!
//! Uses proptest to verify that positions stay dense and unique across random
//! edit sequences.

use proptest::prelude::*;
use signage_core::{AssetId, Playlist, PlaylistId};
use signage_timeline::{reorder_ids, ItemList};
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Op {
    Add { asset: u8, at: Option<usize> },
    Remove { index: usize },
    Reorder { index: usize, to: usize },
    SetDuration { index: usize, seconds: Option<u32> },
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6, proptest::option::of(0usize..20)).prop_map(|(asset, at)| Op::Add { asset, at }),
        (0usize..20).prop_map(|index| Op::Remove { index }),
        (0usize..20, 0usize..25).prop_map(|(index, to)| Op::Reorder { index, to }),
        (0usize..20, proptest::option::of(0u32..10_000))
            .prop_map(|(index, seconds)| Op::SetDuration { index, seconds }),
    ]
}

fn empty_list() -> ItemList {
    ItemList::new(Playlist {
        id: PlaylistId::new("prop"),
        name: "Property".into(),
        default_duration_seconds: Some(10),
        default_transition: Default::default(),
        shuffle: false,
    })
}

fn apply(list: &mut ItemList, op: &Op) {
    match op {
        Op::Add { asset, at } => {
            list.add(AssetId::new(format!("asset-{}", asset)), *at, None)
                .unwrap();
        }
        Op::Remove { index } => {
            if let Some(id) = list.item_at(*index).map(|i| i.id.clone()) {
                list.remove(&id).unwrap();
            }
        }
        Op::Reorder { index, to } => {
            if let Some(id) = list.item_at(*index).map(|i| i.id.clone()) {
                list.reorder(&id, *to).unwrap();
            }
        }
        Op::SetDuration { index, seconds } => {
            if let Some(id) = list.item_at(*index).map(|i| i.id.clone()) {
                // Assets are never cached here, so every item is stale
                assert!(list.set_duration(&id, *seconds).is_err());
            }
        }
    }
}

proptest! {
    /// Property: positions are exactly 0..N after any edit sequence
    #[test]
    fn positions_stay_contiguous(ops in prop::collection::vec(arbitrary_op(), 1..60)) {
        let mut list = empty_list();
        for op in &ops {
            apply(&mut list, op);
            prop_assert!(list.check_invariants().is_ok());
        }

        let positions: Vec<u32> = list.items().iter().map(|i| i.position).collect();
        let expected: Vec<u32> = (0..list.len() as u32).collect();
        prop_assert_eq!(positions, expected);

        let ids: HashSet<_> = list.items().iter().map(|i| i.id.clone()).collect();
        prop_assert_eq!(ids.len(), list.len());
    }

    /// Property: ItemList::reorder and reorder_ids agree on the new order
    #[test]
    fn reorder_matches_pure_function(
        count in 1usize..15,
        index in 0usize..15,
        to in 0usize..20,
    ) {
        let mut list = empty_list();
        for n in 0..count {
            list.add(AssetId::new(format!("a{}", n)), None, None).unwrap();
        }
        let index = index % count;
        let id = list.items()[index].id.clone();

        let expected = reorder_ids(&list.order(), &id, to).unwrap();
        list.reorder(&id, to).unwrap();

        prop_assert_eq!(list.order(), expected);
    }

    /// Property: reordering onto the current position reports no changes
    #[test]
    fn reorder_in_place_is_noop(count in 1usize..15, index in 0usize..15) {
        let mut list = empty_list();
        for n in 0..count {
            list.add(AssetId::new(format!("a{}", n)), None, None).unwrap();
        }
        let index = index % count;
        let before = list.items().to_vec();
        let id = before[index].id.clone();

        let changes = list.reorder(&id, index).unwrap();
        prop_assert!(changes.is_empty());
        prop_assert_eq!(list.items(), before.as_slice());
    }
}

#[test]
fn add_reorder_remove_scenario() {
    let mut list = empty_list();
    let a = list.add(AssetId::new("A"), None, None).unwrap().item.id;
    let b = list.add(AssetId::new("B"), None, None).unwrap().item.id;

    let changes = list.reorder(&b, 0).unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(list.order(), vec![b.clone(), a.clone()]);

    let removal = list.remove(&b).unwrap();
    assert_eq!(removal.index, 0);
    assert_eq!(list.order(), vec![a]);
    assert_eq!(list.items()[0].position, 0);
}
