#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::block::{BlockKind, Extra, Size, create_block};
use crate::consts::MIN_BLOCK_SIZE;

// =============================================================
// Helpers
// =============================================================

fn block(id: &str, kind: BlockKind, x: f64, y: f64) -> Block {
    let mut b = create_block(kind, Position::new(x, y));
    b.id = BlockId::from(id);
    b
}

fn section(id: &str, x: f64, y: f64, children: Vec<Block>) -> Block {
    let mut b = block(id, BlockKind::Section, x, y);
    if let BlockBody::Section { children: slot, .. } = &mut b.body {
        *slot = children.into_iter().map(Arc::new).collect();
    }
    b
}

fn id(s: &str) -> BlockId {
    BlockId::from(s)
}

fn top_ids(scene: &Scene) -> Vec<&str> {
    scene.blocks().iter().map(|b| b.id.as_str()).collect()
}

/// a, s(c1, c2), b
fn nested_scene() -> Scene {
    Scene::from_blocks(vec![
        block("a", BlockKind::Rectangle, 0.0, 0.0),
        section(
            "s",
            100.0,
            200.0,
            vec![block("c1", BlockKind::Text, 10.0, 20.0), block("c2", BlockKind::Image, 30.0, 40.0)],
        ),
        block("b", BlockKind::Text, 50.0, 50.0),
    ])
}

// =============================================================
// Queries
// =============================================================

#[test]
fn empty_scene() {
    let scene = Scene::new();
    assert!(scene.is_empty());
    assert_eq!(scene.len(), 0);
    assert_eq!(scene.total_len(), 0);
    assert!(scene.find(&id("x")).is_none());
}

#[test]
fn lengths_and_preorder_ids() {
    let scene = nested_scene();
    assert_eq!(scene.len(), 3);
    assert_eq!(scene.iter().count(), 3);
    assert_eq!(scene.total_len(), 5);
    assert_eq!(scene.ids(), vec![id("a"), id("s"), id("c1"), id("c2"), id("b")]);
}

#[test]
fn find_reaches_nested_children() {
    let scene = nested_scene();
    assert_eq!(scene.find(&id("c2")).map(|b| b.kind()), Some(BlockKind::Image));
    assert!(scene.contains(&id("c1")));
    assert!(!scene.contains(&id("zzz")));
}

#[test]
fn absolute_position_composes_parent_offsets() {
    let scene = nested_scene();
    assert_eq!(scene.absolute_position(&id("a")), Some(Position::new(0.0, 0.0)));
    assert_eq!(scene.absolute_position(&id("s")), Some(Position::new(100.0, 200.0)));
    assert_eq!(scene.absolute_position(&id("c1")), Some(Position::new(110.0, 220.0)));
    assert_eq!(scene.absolute_position(&id("c2")), Some(Position::new(130.0, 240.0)));
    assert_eq!(scene.absolute_position(&id("nope")), None);
}

#[test]
fn absolute_position_deeply_nested() {
    let inner = section("inner", 5.0, 5.0, vec![block("leaf", BlockKind::Text, 1.0, 2.0)]);
    let scene = Scene::from_blocks(vec![section("outer", 100.0, 100.0, vec![inner])]);
    assert_eq!(scene.absolute_position(&id("leaf")), Some(Position::new(106.0, 107.0)));
}

#[test]
fn serializes_as_block_array() {
    let scene = Scene::from_blocks(vec![block("a", BlockKind::Rectangle, 1.0, 2.0)]);
    let value = serde_json::to_value(&scene).unwrap();
    assert!(value.is_array());
    assert_eq!(value[0]["id"], "a");
    assert_eq!(value[0]["type"], "rectangle");
}

// =============================================================
// Duplicate ids on load
// =============================================================

#[test]
fn from_blocks_rekeys_duplicate_ids() {
    let scene = Scene::from_blocks(vec![
        block("dup", BlockKind::Text, 0.0, 0.0),
        block("dup", BlockKind::Image, 0.0, 0.0),
        section("s", 0.0, 0.0, vec![block("dup", BlockKind::Rectangle, 0.0, 0.0)]),
    ]);
    let ids = scene.ids();
    assert_eq!(ids.len(), 4);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), 4);
    assert_eq!(scene.blocks()[0].id, id("dup"));
    assert_eq!(scene.blocks()[1].kind(), BlockKind::Image);
}

#[test]
fn from_blocks_keeps_unique_ids() {
    let scene = nested_scene();
    assert_eq!(top_ids(&scene), vec!["a", "s", "b"]);
}

// =============================================================
// insert / update / move_to
// =============================================================

#[test]
fn insert_appends_on_top() {
    let scene = nested_scene().insert(block("new", BlockKind::Text, 0.0, 0.0));
    assert_eq!(top_ids(&scene), vec!["a", "s", "b", "new"]);
}

#[test]
fn update_merges_and_preserves_other_identities() {
    let before = nested_scene();
    let after = before.update(&id("b"), &BlockPatch::size(Size::new(5.0, 300.0)));

    let b = after.find(&id("b")).unwrap();
    assert_eq!(b.size, Size::new(MIN_BLOCK_SIZE, 300.0));
    assert!(Arc::ptr_eq(&before.blocks()[0], &after.blocks()[0]));
    assert!(Arc::ptr_eq(&before.blocks()[1], &after.blocks()[1]));
    assert!(!Arc::ptr_eq(&before.blocks()[2], &after.blocks()[2]));
}

#[test]
fn nested_update_path_copies_ancestors_only() {
    let before = nested_scene();
    let after = before.update(&id("c1"), &BlockPatch::rotation(30.0));

    assert_eq!(after.find(&id("c1")).unwrap().rotation(), 30.0);
    assert!(Arc::ptr_eq(&before.blocks()[0], &after.blocks()[0]));
    assert!(!Arc::ptr_eq(&before.blocks()[1], &after.blocks()[1]));
    assert!(Arc::ptr_eq(&before.blocks()[2], &after.blocks()[2]));
    let (old_s, new_s) = (&before.blocks()[1], &after.blocks()[1]);
    assert!(Arc::ptr_eq(&old_s.children()[1], &new_s.children()[1]));
    assert_eq!(before.find(&id("c1")).unwrap().rotation(), 0.0);
}

#[test]
fn update_unknown_id_is_noop() {
    let before = nested_scene();
    let after = before.update(&id("ghost"), &BlockPatch::rotation(10.0));
    assert_eq!(before, after);
    assert!(before.try_update(&id("ghost"), &BlockPatch::rotation(10.0)).is_none());
}

#[test]
fn rejected_patch_leaves_scene_unchanged() {
    let before = nested_scene();
    let mut styles = Extra::new();
    styles.insert("fontSize".into(), json!("enormous"));
    assert!(before.try_update(&id("b"), &BlockPatch::styles(styles.clone())).is_none());
    assert_eq!(before.update(&id("b"), &BlockPatch::styles(styles)), before);
}

#[test]
fn update_children_rekeys_colliding_ids() {
    let before = nested_scene();
    let patch = BlockPatch { children: Some(vec![Arc::new(block("a", BlockKind::Text, 0.0, 0.0))]), ..BlockPatch::default() };
    let after = before.update(&id("s"), &patch);
    assert_eq!(after.total_len(), 4);
    let unique: HashSet<_> = after.ids().into_iter().collect();
    assert_eq!(unique.len(), 4);
}

#[test]
fn update_children_keeps_later_sibling_id() {
    let before = nested_scene();
    let patch = BlockPatch { children: Some(vec![Arc::new(block("b", BlockKind::Rectangle, 0.0, 0.0))]), ..BlockPatch::default() };
    let after = before.update(&id("s"), &patch);

    let top_b = after.find(&id("b")).unwrap();
    assert_eq!(top_b.kind(), BlockKind::Text);
    assert!(Arc::ptr_eq(top_b, &before.blocks()[2]));
    let child = &after.find(&id("s")).unwrap().children()[0];
    assert_ne!(child.id, id("b"));
    assert_eq!(child.kind(), BlockKind::Rectangle);
}

#[test]
fn update_children_may_reuse_replaced_child_ids() {
    let patch = BlockPatch { children: Some(vec![Arc::new(block("c1", BlockKind::Rectangle, 0.0, 0.0))]), ..BlockPatch::default() };
    let after = nested_scene().update(&id("s"), &patch);
    assert_eq!(after.find(&id("c1")).unwrap().kind(), BlockKind::Rectangle);
    assert!(after.find(&id("c2")).is_none());
}

#[test]
fn update_children_rekeys_duplicates_within_patch() {
    let patch = BlockPatch {
        children: Some(vec![
            Arc::new(block("n", BlockKind::Text, 0.0, 0.0)),
            Arc::new(block("n", BlockKind::Image, 0.0, 0.0)),
        ]),
        ..BlockPatch::default()
    };
    let after = nested_scene().update(&id("s"), &patch);
    let unique: HashSet<_> = after.ids().into_iter().collect();
    assert_eq!(unique.len(), after.total_len());
    assert_eq!(after.find(&id("n")).unwrap().kind(), BlockKind::Text);
}

#[test]
fn move_to_replaces_position_wholesale() {
    let scene = nested_scene().move_to(&id("c2"), Position::new(-5.0, 7.5));
    assert_eq!(scene.find(&id("c2")).unwrap().position, Position::new(-5.0, 7.5));
    assert_eq!(scene.absolute_position(&id("c2")), Some(Position::new(95.0, 207.5)));
}

// =============================================================
// reorder
// =============================================================

#[test]
fn reorder_front_and_back() {
    let scene = nested_scene();
    assert_eq!(top_ids(&scene.reorder(&id("a"), Layer::Front)), vec!["s", "b", "a"]);
    assert_eq!(top_ids(&scene.reorder(&id("b"), Layer::Back)), vec!["b", "a", "s"]);
}

#[test]
fn reorder_stays_within_sibling_list() {
    let scene = nested_scene().reorder(&id("c2"), Layer::Back);
    assert_eq!(top_ids(&scene), vec!["a", "s", "b"]);
    let s = scene.find(&id("s")).unwrap();
    let child_ids: Vec<&str> = s.children().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(child_ids, vec!["c2", "c1"]);
}

#[test]
fn reorder_unknown_is_noop() {
    let scene = nested_scene();
    assert_eq!(scene.reorder(&id("ghost"), Layer::Front), scene);
}

#[test]
fn layer_serde_lowercase() {
    assert_eq!(serde_json::to_value(Layer::Front).unwrap(), json!("front"));
    assert_eq!(serde_json::from_value::<Layer>(json!("back")).unwrap(), Layer::Back);
}

// =============================================================
// remove
// =============================================================

#[test]
fn remove_top_level() {
    let scene = nested_scene().remove(&id("a"));
    assert_eq!(top_ids(&scene), vec!["s", "b"]);
}

#[test]
fn remove_section_drops_subtree() {
    let scene = nested_scene().remove(&id("s"));
    assert_eq!(scene.total_len(), 2);
    assert!(!scene.contains(&id("c1")));
}

#[test]
fn remove_nested_child() {
    let scene = nested_scene().remove(&id("c1"));
    assert_eq!(scene.total_len(), 4);
    assert!(scene.contains(&id("c2")));
}

#[test]
fn remove_unknown_is_noop() {
    let scene = nested_scene();
    assert_eq!(scene.remove(&id("ghost")), scene);
}

// =============================================================
// duplicate
// =============================================================

#[test]
fn duplicate_offsets_and_appends_to_same_list() {
    let (scene, copy_id) = nested_scene().duplicate(&id("a"), 20.0, 20.0).unwrap();
    assert_eq!(scene.len(), 4);
    let copy = scene.blocks().last().unwrap();
    assert_eq!(copy.id, copy_id);
    assert_ne!(copy_id, id("a"));
    assert_eq!(copy.position, Position::new(20.0, 20.0));
    assert_eq!(copy.kind(), BlockKind::Rectangle);
}

#[test]
fn duplicate_nested_child_stays_in_section() {
    let (scene, copy_id) = nested_scene().duplicate(&id("c1"), 20.0, 20.0).unwrap();
    assert_eq!(scene.len(), 3);
    let s = scene.find(&id("s")).unwrap();
    assert_eq!(s.children().len(), 3);
    assert_eq!(s.children()[2].id, copy_id);
    assert_eq!(s.children()[2].position, Position::new(30.0, 40.0));
}

#[test]
fn duplicate_section_rekeys_subtree() {
    let (scene, _) = nested_scene().duplicate(&id("s"), 20.0, 20.0).unwrap();
    assert_eq!(scene.total_len(), 8);
    let ids = scene.ids();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn duplicate_unknown_is_none() {
    assert!(nested_scene().duplicate(&id("ghost"), 20.0, 20.0).is_none());
}
