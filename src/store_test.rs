use super::*;

fn seeded_store() -> SceneStore {
    let mut store = SceneStore::new();
    store.declare(
        FRAGMENT_GEOMETRY,
        serde_json::json!({
            "bounding_box": {
                "type": "BoxWidget",
                "min": {"x": -1.0, "y": -1.0, "z": -1.0},
                "max": {"x": 1.0, "y": 1.0, "z": 1.0},
                "interactive": false
            }
        }),
    );
    store
}

#[test]
fn declared_fragment_starts_clean() {
    let store = seeded_store();
    assert!(!store.is_dirty(FRAGMENT_GEOMETRY));
}

#[test]
fn get_unknown_fragment_reads_as_empty_map() {
    let store = SceneStore::new();
    assert_eq!(store.get("nope"), serde_json::json!({}));
}

#[test]
fn set_path_overwrites_leaf_and_marks_dirty() {
    let mut store = seeded_store();
    store
        .set_path(FRAGMENT_GEOMETRY, "bounding_box/min/x", serde_json::json!(-2.0))
        .expect("set_path");

    let geometry = store.get(FRAGMENT_GEOMETRY);
    assert_eq!(geometry["bounding_box"]["min"]["x"], serde_json::json!(-2.0));
    assert!(store.is_dirty(FRAGMENT_GEOMETRY));
}

#[test]
fn set_path_creates_intermediate_objects() {
    let mut store = SceneStore::new();
    store
        .set_path(FRAGMENT_GEOMETRY, "clip/editor/origin/x", serde_json::json!(0.5))
        .expect("set_path");
    assert_eq!(
        store.get_path(FRAGMENT_GEOMETRY, "clip/editor/origin/x"),
        Some(&serde_json::json!(0.5))
    );
}

#[test]
fn numeric_segments_index_arrays_and_pad_with_nulls() {
    let mut store = SceneStore::new();
    store.set_path("colors", "tables/2/name", serde_json::json!("viridis")).expect("set_path");

    let colors = store.get("colors");
    assert_eq!(colors["tables"][0], Value::Null);
    assert_eq!(colors["tables"][1], Value::Null);
    assert_eq!(colors["tables"][2]["name"], serde_json::json!("viridis"));
}

#[test]
fn set_path_replaces_existing_array_element() {
    let mut store = SceneStore::new();
    store.declare("colors", serde_json::json!({"origin": [1.0, 2.0, 3.0]}));
    store.set_path("colors", "origin/1", serde_json::json!(9.0)).expect("set_path");
    assert_eq!(store.get("colors")["origin"], serde_json::json!([1.0, 9.0, 3.0]));
}

#[test]
fn set_path_conflict_on_scalar_leaves_fragment_unmodified() {
    let mut store = seeded_store();
    let before = store.get(FRAGMENT_GEOMETRY);

    let err = store
        .set_path(FRAGMENT_GEOMETRY, "bounding_box/type/deep/leaf", serde_json::json!(1))
        .expect_err("type is a scalar");
    assert!(matches!(err, StoreError::PathConflict { .. }));

    assert_eq!(store.get(FRAGMENT_GEOMETRY), before);
    assert!(!store.is_dirty(FRAGMENT_GEOMETRY));
}

#[test]
fn set_path_conflict_on_non_numeric_array_segment() {
    let mut store = SceneStore::new();
    store.declare("colors", serde_json::json!({"origin": [0.0, 0.0]}));
    let err = store
        .set_path("colors", "origin/x", serde_json::json!(1.0))
        .expect_err("arrays take numeric segments");
    assert!(matches!(err, StoreError::PathConflict { .. }));
    assert_eq!(store.get("colors")["origin"], serde_json::json!([0.0, 0.0]));
}

#[test]
fn null_nodes_are_treated_as_absent() {
    let mut store = SceneStore::new();
    store.declare("camera", serde_json::json!({"position": null}));
    store.set_path("camera", "position/z", serde_json::json!(10.0)).expect("set_path");
    assert_eq!(store.get("camera")["position"]["z"], serde_json::json!(10.0));
}

#[test]
fn flush_clean_fragment_returns_none() {
    let mut store = seeded_store();
    assert!(store.flush(FRAGMENT_GEOMETRY).is_none());
}

#[test]
fn flush_after_set_path_returns_full_value_once() {
    let mut store = seeded_store();
    store
        .set_path(FRAGMENT_GEOMETRY, "bounding_box/max/x", serde_json::json!(0.5))
        .expect("set_path");

    let pushed = store.flush(FRAGMENT_GEOMETRY).expect("dirty fragment flushes");
    assert_eq!(pushed["bounding_box"]["max"]["x"], serde_json::json!(0.5));

    // Second immediate flush yields nothing.
    assert!(store.flush(FRAGMENT_GEOMETRY).is_none());
}

#[test]
fn mark_dirty_makes_bulk_mutations_flushable() {
    let mut store = seeded_store();
    store.mark_dirty(FRAGMENT_GEOMETRY);
    assert!(store.flush(FRAGMENT_GEOMETRY).is_some());
}

#[test]
fn replace_marks_dirty() {
    let mut store = SceneStore::new();
    store.replace("camera", serde_json::json!({"roll": 0}));
    assert!(store.is_dirty("camera"));
    assert_eq!(store.flush("camera"), Some(serde_json::json!({"roll": 0})));
}

#[test]
fn force_flush_ignores_dirty_flag_and_clears_it() {
    let mut store = seeded_store();
    assert!(!store.is_dirty(FRAGMENT_GEOMETRY));

    let value = store.force_flush(FRAGMENT_GEOMETRY).expect("declared fragment");
    assert_eq!(value, store.get(FRAGMENT_GEOMETRY));

    store.mark_dirty(FRAGMENT_GEOMETRY);
    store.force_flush(FRAGMENT_GEOMETRY);
    assert!(!store.is_dirty(FRAGMENT_GEOMETRY));
}

#[test]
fn force_flush_unknown_fragment_returns_none() {
    let mut store = SceneStore::new();
    assert!(store.force_flush("nope").is_none());
}

#[test]
fn flush_dirty_drains_every_dirty_fragment() {
    let mut store = seeded_store();
    store.declare("camera", serde_json::json!({"roll": 0}));
    store.mark_dirty("camera");
    store.mark_dirty(FRAGMENT_GEOMETRY);

    let flushed = store.flush_dirty();
    let names: Vec<&str> = flushed.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["camera", "geometry"]);
    assert!(store.flush_dirty().is_empty());
}

#[test]
fn merge_path_overlays_object_fields() {
    let mut store = SceneStore::new();
    store.declare(
        FRAGMENT_GEOMETRY,
        serde_json::json!({
            "clip": {
                "origin": {"x": 0.0, "y": 0.0, "z": 0.0},
                "normal": {"x": 1.0, "y": 0.0, "z": 0.0},
                "editor": {"origin": {"x": 0.3}}
            }
        }),
    );

    let editor = store.get_path(FRAGMENT_GEOMETRY, "clip/editor").cloned().expect("editor");
    store.merge_path(FRAGMENT_GEOMETRY, "clip", &editor).expect("merge");

    let clip = store.get(FRAGMENT_GEOMETRY)["clip"].clone();
    // Edited field applied, untouched fields kept.
    assert_eq!(clip["origin"]["x"], serde_json::json!(0.3));
    assert_eq!(clip["origin"]["y"], serde_json::json!(0.0));
    assert_eq!(clip["normal"]["x"], serde_json::json!(1.0));
    assert!(store.is_dirty(FRAGMENT_GEOMETRY));
}

#[test]
fn merge_path_extends_arrays_position_wise() {
    let mut store = SceneStore::new();
    store.declare("colors", serde_json::json!({"table": [1.0, 2.0]}));
    store
        .merge_path("colors", "table", &serde_json::json!([9.0, 2.0, 3.0]))
        .expect("merge");
    assert_eq!(store.get("colors")["table"], serde_json::json!([9.0, 2.0, 3.0]));
}

#[test]
fn get_path_reads_nested_and_indexed_values() {
    let mut store = SceneStore::new();
    store.declare("colors", serde_json::json!({"maps": [{"name": "cool"}]}));
    assert_eq!(store.get_path("colors", "maps/0/name"), Some(&serde_json::json!("cool")));
    assert_eq!(store.get_path("colors", "maps/1/name"), None);
    assert_eq!(store.get_path("colors", "maps/zero"), None);
}
