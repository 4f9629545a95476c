//! In-process replay of the clip-filter scenario: one scene instance, its
//! mount handshake, a burst of widget drags, and the reconciled commit,
//! with the outbound traffic printed instead of crossing a real socket.

use std::time::Duration;

use scenelink::{ApplyRule, FRAGMENT_GEOMETRY, MountFile, Outbound, Route, Scene, SceneTemplate};
use tracing::info;
use wire::EventKind;

const SCENE_DESCRIPTOR: &str = r"
path_prefix: /data/
geometry:
  bounding_box:
    type: BoxWidget
    min: {x: -0.026, y: -0.026, z: -0.026}
    max: {x: 0.026, y: 0.026, z: 0.026}
    color: '0xFFFFFF'
    edge_color: '0xFF0000'
    opacity: 0.7
    representation: surface_with_edges
    visible: true
    interactive: false
  unstructured_grid:
    type: VTUFile
    path: data.vtu
    geometry:
      clip:
        origin: {x: 0.0, y: 0.0, z: 0.0}
        normal: {x: 1.0, y: 0.0, z: 0.0}
        editor:
          origin: {x: 0.0, y: 0.0, z: 0.0}
          normal: {x: 1.0, y: 0.0, z: 0.0}
      clip2:
        origin: {x: 0.0, y: 0.0, z: 0.0}
        normal: {x: -1.0, y: 0.0, z: 0.0}
";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let template = SceneTemplate::from_yaml(SCENE_DESCRIPTOR).expect("scene descriptor parses");
    let (scene, mut rx) = Scene::open_with_interval("demo", &template, Duration::from_millis(500));

    // Stand-in for the websocket layer: print what the client would get.
    let printer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            match message {
                Outbound::Push(push) => info!(fragment = %push.fragment, "push {}", wire::encode_push(&push)),
                Outbound::Command(command) => info!("command {}", wire::encode_command(&command)),
            }
        }
    });

    scene
        .register_route(
            "unstructured_grid/geometry/clip",
            EventKind::Modified,
            Route::EditorField {
                fragment: FRAGMENT_GEOMETRY.to_owned(),
                object_path: "unstructured_grid/geometry/clip".to_owned(),
                tracked: true,
            },
        )
        .await;
    scene
        .register_route(
            "bounding_box",
            EventKind::Clicked,
            Route::ToggleInteractive { fragment: FRAGMENT_GEOMETRY.to_owned() },
        )
        .await;
    scene
        .add_apply_rule(ApplyRule {
            fragment: FRAGMENT_GEOMETRY.to_owned(),
            editor_path: "unstructured_grid/geometry/clip/editor".to_owned(),
            target_paths: vec![
                "unstructured_grid/geometry/clip".to_owned(),
                "unstructured_grid/geometry/clip2".to_owned(),
            ],
        })
        .await;

    // Initial state push, then the filesystem handshake.
    scene.flush_all().await;
    scene.mount(&[MountFile::new("data.vtu", "<VTKFile type=\"UnstructuredGrid\"/>")]);

    // Widget activation plus three drag frames inside one apply window.
    let click = serde_json::json!({"object": "bounding_box", "event": "clicked"}).to_string();
    scene.handle_event(&click).await;
    scene.flush_all().await;

    for value in [0.010, 0.018, 0.026] {
        let drag = serde_json::json!({
            "object": "unstructured_grid/geometry/clip",
            "event": "modified",
            "info": {"property": "origin/x", "value": value}
        })
        .to_string();
        scene.handle_event(&drag).await;
    }

    // Let the reconciliation loop fold the burst into one commit.
    tokio::time::sleep(Duration::from_millis(700)).await;

    let applied = scene.value_at(FRAGMENT_GEOMETRY, "unstructured_grid/geometry/clip/origin/x").await;
    let (changes, applied_count) = scene.counters().await;
    info!(?applied, changes, applied_count, "clip origin committed");

    scene.close().await;
    drop(scene);
    let _ = printer.await;
}
