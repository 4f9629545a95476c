use super::*;
use crate::transport::outbound_channel;

fn next_command(rx: &mut mpsc::Receiver<Outbound>) -> Command {
    match rx.try_recv().expect("message queued") {
        Outbound::Command(command) => command,
        Outbound::Push(push) => panic!("expected command, got push for {}", push.fragment),
    }
}

#[tokio::test]
async fn scene_commands_carry_the_instance_name() {
    let (tx, mut rx) = outbound_channel();
    let remote = RemoteScene::new("view_1", tx);

    remote.scene().reset_camera();

    let command = next_command(&mut rx);
    assert_eq!(command.instance, "view_1");
    assert_eq!(command.call, Call::Scene(SceneCall::ResetCamera));
}

#[tokio::test]
async fn scene_namespace_methods_map_to_typed_calls() {
    let (tx, mut rx) = outbound_channel();
    let remote = RemoteScene::new("view", tx);

    remote.scene().update();
    remote.scene().render();
    remote.scene().set_path_prefix("/data/");
    remote.scene().update_camera(serde_json::json!({"roll": 0}));
    remote.scene().update_geometry(serde_json::json!({"bounding_box": {}}));

    assert_eq!(next_command(&mut rx).call, Call::Scene(SceneCall::Update));
    assert_eq!(next_command(&mut rx).call, Call::Scene(SceneCall::Render));
    assert_eq!(
        next_command(&mut rx).call,
        Call::Scene(SceneCall::SetPathPrefix("/data/".to_owned()))
    );
    assert_eq!(
        next_command(&mut rx).call,
        Call::Scene(SceneCall::UpdateCamera(serde_json::json!({"roll": 0})))
    );
    assert_eq!(
        next_command(&mut rx).call,
        Call::Scene(SceneCall::UpdateGeometry(serde_json::json!({"bounding_box": {}})))
    );
}

#[tokio::test]
async fn fs_namespace_methods_map_to_typed_calls() {
    let (tx, mut rx) = outbound_channel();
    let remote = RemoteScene::new("view", tx);

    remote.fs().mkdir("/data");
    remote.fs().write_file("/data/cube.stl", "solid cube");

    assert_eq!(next_command(&mut rx).call, Call::Fs(FsCall::Mkdir("/data".to_owned())));
    assert_eq!(
        next_command(&mut rx).call,
        Call::Fs(FsCall::WriteFile { path: "/data/cube.stl".to_owned(), contents: "solid cube".to_owned() })
    );
}

#[tokio::test]
async fn commands_are_fire_and_forget_on_a_dead_transport() {
    let (tx, rx) = outbound_channel();
    drop(rx);

    let remote = RemoteScene::new("view", tx);
    // No panic, no error surfaced.
    remote.scene().update();
    remote.fs().mkdir("/data");
}
