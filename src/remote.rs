//! Remote invocation proxy — typed one-shot commands for a scene instance.
//!
//! DESIGN
//! ======
//! Remote commands have no durable state representation; they bypass the
//! fragment store and go straight to the transport. Every method is
//! enumerated at compile time (`wire::SceneCall` / `wire::FsCall`), so a
//! renamed or removed client method shows up as a type error here instead
//! of a silent no-op. Sends never block and never surface client-side
//! failures.

use serde_json::Value;
use tokio::sync::mpsc;
use wire::{Call, Command, FsCall, SceneCall};

use crate::transport::{Outbound, send_or_drop};

/// Client-identifying handle for issuing remote commands at one scene
/// instance.
#[derive(Clone, Debug)]
pub struct RemoteScene {
    instance: String,
    tx: mpsc::Sender<Outbound>,
}

impl RemoteScene {
    pub(crate) fn new(instance: impl Into<String>, tx: mpsc::Sender<Outbound>) -> Self {
        Self { instance: instance.into(), tx }
    }

    /// Name of the target scene instance.
    #[must_use]
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Commands in the `scene` namespace.
    #[must_use]
    pub fn scene(&self) -> SceneExec<'_> {
        SceneExec { remote: self }
    }

    /// Commands in the `fs` namespace (virtual-filesystem bridge).
    #[must_use]
    pub fn fs(&self) -> FsExec<'_> {
        FsExec { remote: self }
    }

    fn send(&self, call: Call) {
        let command = Command { instance: self.instance.clone(), call };
        send_or_drop(&self.tx, Outbound::Command(command));
    }
}

/// `scene` namespace surface.
#[derive(Clone, Copy, Debug)]
pub struct SceneExec<'a> {
    remote: &'a RemoteScene,
}

impl SceneExec<'_> {
    /// Re-read every synced fragment and rebuild the scene.
    pub fn update(&self) {
        self.remote.send(Call::Scene(SceneCall::Update));
    }

    /// Frame the camera around the visible geometry.
    pub fn reset_camera(&self) {
        self.remote.send(Call::Scene(SceneCall::ResetCamera));
    }

    /// Render one frame now.
    pub fn render(&self) {
        self.remote.send(Call::Scene(SceneCall::Render));
    }

    /// Set the virtual-filesystem prefix for file-backed objects.
    pub fn set_path_prefix(&self, prefix: impl Into<String>) {
        self.remote.send(Call::Scene(SceneCall::SetPathPrefix(prefix.into())));
    }

    /// Replace the camera parameters wholesale.
    pub fn update_camera(&self, camera: Value) {
        self.remote.send(Call::Scene(SceneCall::UpdateCamera(camera)));
    }

    /// Replace the geometry object map wholesale.
    pub fn update_geometry(&self, geometry: Value) {
        self.remote.send(Call::Scene(SceneCall::UpdateGeometry(geometry)));
    }
}

/// `fs` namespace surface.
#[derive(Clone, Copy, Debug)]
pub struct FsExec<'a> {
    remote: &'a RemoteScene,
}

impl FsExec<'_> {
    /// Create a directory in the client's virtual filesystem.
    pub fn mkdir(&self, path: impl Into<String>) {
        self.remote.send(Call::Fs(FsCall::Mkdir(path.into())));
    }

    /// Write a file into the client's virtual filesystem.
    pub fn write_file(&self, path: impl Into<String>, contents: impl Into<String>) {
        self.remote
            .send(Call::Fs(FsCall::WriteFile { path: path.into(), contents: contents.into() }));
    }
}

#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;
