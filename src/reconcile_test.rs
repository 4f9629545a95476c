use super::*;
use crate::config::SceneTemplate;
use crate::router::Route;
use crate::store::FRAGMENT_GEOMETRY;
use crate::transport::Outbound;
use wire::EventKind;

fn editor_template() -> SceneTemplate {
    SceneTemplate::new().with_geometry(serde_json::json!({
        "clip": {
            "origin": {"x": 0.0, "y": 0.0, "z": 0.0},
            "editor": {"origin": {"x": 0.0, "y": 0.0, "z": 0.0}}
        }
    }))
}

fn tracked_edit(value: f64) -> String {
    serde_json::json!({
        "object": "clip",
        "event": "modified",
        "info": {"property": "origin/x", "value": value}
    })
    .to_string()
}

const QUIET: Duration = Duration::from_secs(3600);

#[test]
fn apply_interval_defaults_to_half_a_second() {
    // SAFETY: test-local mutation; nothing else reads this key concurrently.
    unsafe { std::env::remove_var(APPLY_INTERVAL_ENV) };
    assert_eq!(apply_interval_from_env(), Duration::from_millis(DEFAULT_APPLY_INTERVAL_MS));
}

#[tokio::test]
async fn applied_count_never_exceeds_change_count() {
    let (scene, _rx) = Scene::open_with_interval("view", &editor_template(), QUIET);
    scene
        .register_route(
            "clip",
            EventKind::Modified,
            Route::EditorField {
                fragment: FRAGMENT_GEOMETRY.to_owned(),
                object_path: "clip".to_owned(),
                tracked: true,
            },
        )
        .await;
    scene
        .add_apply_rule(ApplyRule {
            fragment: FRAGMENT_GEOMETRY.to_owned(),
            editor_path: "clip/editor".to_owned(),
            target_paths: vec!["clip".to_owned()],
        })
        .await;

    for value in [0.1, 0.2] {
        scene.handle_event(&tracked_edit(value)).await;
    }

    assert!(scene.apply_pending().await);
    assert!(!scene.apply_pending().await);
    assert!(!scene.apply_pending().await);

    let (changes, applied) = scene.counters().await;
    assert_eq!((changes, applied), (2, 2));
    scene.close().await;
}

#[tokio::test]
async fn absent_editor_path_applies_nothing() {
    let (scene, mut rx) = Scene::open_with_interval("view", &editor_template(), QUIET);
    scene.flush_all().await;
    while rx.try_recv().is_ok() {}

    scene
        .register_route(
            "clip",
            EventKind::Modified,
            Route::EditorField {
                fragment: FRAGMENT_GEOMETRY.to_owned(),
                object_path: "clip".to_owned(),
                tracked: true,
            },
        )
        .await;
    // Rule points at a sub-tree that does not exist.
    scene
        .add_apply_rule(ApplyRule {
            fragment: FRAGMENT_GEOMETRY.to_owned(),
            editor_path: "clip/missing_editor".to_owned(),
            target_paths: vec!["clip".to_owned()],
        })
        .await;

    scene.handle_event(&tracked_edit(0.5)).await;
    assert!(scene.apply_pending().await);

    // Counters reconcile but no fragment was touched, so no push leaves.
    assert_eq!(scene.counters().await, (1, 1));
    assert!(rx.try_recv().is_err());
    scene.close().await;
}

#[tokio::test]
async fn conflicting_target_still_commits_the_fragment() {
    let (scene, mut rx) = Scene::open_with_interval("view", &editor_template(), QUIET);
    scene.flush_all().await;
    while rx.try_recv().is_ok() {}

    scene
        .register_route(
            "clip",
            EventKind::Modified,
            Route::EditorField {
                fragment: FRAGMENT_GEOMETRY.to_owned(),
                object_path: "clip".to_owned(),
                tracked: true,
            },
        )
        .await;
    scene
        .add_apply_rule(ApplyRule {
            fragment: FRAGMENT_GEOMETRY.to_owned(),
            editor_path: "clip/editor".to_owned(),
            // First target conflicts (crosses a scalar), second is fine.
            target_paths: vec!["clip/origin/x/deep".to_owned(), "clip".to_owned()],
        })
        .await;

    scene.handle_event(&tracked_edit(0.5)).await;
    assert!(scene.apply_pending().await);

    let mut pushes = 0;
    while let Ok(message) = rx.try_recv() {
        if let Outbound::Push(push) = message {
            assert_eq!(push.fragment, FRAGMENT_GEOMETRY);
            assert_eq!(push.value["clip"]["origin"]["x"], serde_json::json!(0.5));
            pushes += 1;
        }
    }
    assert_eq!(pushes, 1);
    scene.close().await;
}

#[tokio::test]
async fn loop_applies_on_its_own_once_per_batch() {
    let (scene, mut rx) = Scene::open_with_interval("view", &editor_template(), Duration::from_millis(20));
    scene.flush_all().await;
    while rx.try_recv().is_ok() {}

    scene
        .register_route(
            "clip",
            EventKind::Modified,
            Route::EditorField {
                fragment: FRAGMENT_GEOMETRY.to_owned(),
                object_path: "clip".to_owned(),
                tracked: true,
            },
        )
        .await;
    scene
        .add_apply_rule(ApplyRule {
            fragment: FRAGMENT_GEOMETRY.to_owned(),
            editor_path: "clip/editor".to_owned(),
            target_paths: vec!["clip".to_owned()],
        })
        .await;

    scene.handle_event(&tracked_edit(0.7)).await;
    tokio::time::sleep(Duration::from_millis(120)).await;

    let mut pushes = 0;
    while let Ok(message) = rx.try_recv() {
        if matches!(&message, Outbound::Push(push) if push.fragment == FRAGMENT_GEOMETRY) {
            pushes += 1;
        }
    }
    assert_eq!(pushes, 1);
    assert_eq!(scene.counters().await, (1, 1));
    scene.close().await;
}
