//! Scene instance — one client rendering surface and its state namespace.
//!
//! DESIGN
//! ======
//! `Scene` is a cloneable handle over Arc-wrapped state, injected wherever
//! the embedding needs it. All mutations go through one `RwLock` write
//! guard, so the router, application logic, and the reconciliation loop
//! never interleave a partial path traversal (single-writer discipline).
//! Pushes and remote commands leave through a bounded channel and never
//! block on the client.
//!
//! LIFECYCLE
//! =========
//! 1. `open` → template fragments cloned into the store (dirty: the
//!    initial values owe a push), reconcile loop spawned
//! 2. Transport drains the outbound receiver; client events arrive at
//!    `handle_event`
//! 3. `mount` performs the initial filesystem handshake
//! 4. `close` → reconcile loop signalled and awaited, no dangling task

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wire::{EventKind, StatePush};

use crate::config::SceneTemplate;
use crate::reconcile::{self, ApplyRule};
use crate::remote::RemoteScene;
use crate::router::{Dispatch, EventRouter, Route};
use crate::store::{FRAGMENT_CAMERA, FRAGMENT_COLORS, FRAGMENT_GEOMETRY, SceneStore, StoreError};
use crate::transport::{Outbound, outbound_channel, send_or_drop};

// =============================================================================
// TYPES
// =============================================================================

/// A data file the client needs in its virtual filesystem before the first
/// `scene.update` can resolve file-backed geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountFile {
    /// Path relative to the scene's path prefix.
    pub path: String,
    /// File contents.
    pub contents: String,
}

impl MountFile {
    #[must_use]
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self { path: path.into(), contents: contents.into() }
    }
}

/// Mutable state of one instance, guarded by the instance lock.
#[derive(Debug)]
struct SceneInner {
    store: SceneStore,
    router: EventRouter,
    rules: Vec<ApplyRule>,
    change_count: u64,
    applied_count: u64,
}

#[derive(Debug)]
struct Lifecycle {
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Cloneable handle to one scene instance.
#[derive(Clone, Debug)]
pub struct Scene {
    name: String,
    path_prefix: String,
    inner: Arc<RwLock<SceneInner>>,
    tx: mpsc::Sender<Outbound>,
    lifecycle: Arc<Lifecycle>,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

impl Scene {
    /// Open a scene instance from a template and spawn its reconciliation
    /// loop (interval from `SCENE_APPLY_INTERVAL_MS`, default 500 ms).
    /// Returns the handle plus the outbound receiver for the transport
    /// layer to drain.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn open(name: impl Into<String>, template: &SceneTemplate) -> (Self, mpsc::Receiver<Outbound>) {
        Self::open_with_interval(name, template, reconcile::apply_interval_from_env())
    }

    /// `open` with an explicit reconciliation interval.
    #[must_use]
    pub fn open_with_interval(
        name: impl Into<String>,
        template: &SceneTemplate,
        interval: Duration,
    ) -> (Self, mpsc::Receiver<Outbound>) {
        let (tx, rx) = outbound_channel();

        let mut store = SceneStore::new();
        store.declare(FRAGMENT_CAMERA, template.camera.clone());
        store.declare(FRAGMENT_GEOMETRY, template.geometry.clone());
        store.declare(FRAGMENT_COLORS, template.colors.clone());
        // Initial values owe a push; the embedding's first flush delivers them.
        for fragment in [FRAGMENT_CAMERA, FRAGMENT_GEOMETRY, FRAGMENT_COLORS] {
            store.mark_dirty(fragment);
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let scene = Self {
            name: name.into(),
            path_prefix: template.path_prefix.clone(),
            inner: Arc::new(RwLock::new(SceneInner {
                store,
                router: EventRouter::new(),
                rules: Vec::new(),
                change_count: 0,
                applied_count: 0,
            })),
            tx,
            lifecycle: Arc::new(Lifecycle { shutdown, task: Mutex::new(None) }),
        };

        let task = reconcile::spawn_reconcile_task(scene.clone(), interval, shutdown_rx);
        if let Ok(mut guard) = scene.lifecycle.task.lock() {
            *guard = Some(task);
        }

        info!(instance = %scene.name, "scene: instance opened");
        (scene, rx)
    }

    /// Stop the reconciliation loop and wait for it to finish. Safe to call
    /// more than once.
    pub async fn close(&self) {
        let _ = self.lifecycle.shutdown.send(true);
        let task = match self.lifecycle.task.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(task) = task {
            let _ = task.await;
        }
        info!(instance = %self.name, "scene: instance closed");
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path_prefix(&self) -> &str {
        &self.path_prefix
    }

    /// Remote command proxy targeting this instance.
    #[must_use]
    pub fn remote(&self) -> RemoteScene {
        RemoteScene::new(self.name.clone(), self.tx.clone())
    }
}

// =============================================================================
// EVENTS & ROUTES
// =============================================================================

impl Scene {
    /// Route one raw client payload into the store. Tracked edits bump the
    /// reconciliation change counter.
    pub async fn handle_event(&self, raw: &str) -> Dispatch {
        let mut inner = self.inner.write().await;
        let dispatch = {
            let SceneInner { store, router, .. } = &mut *inner;
            router.handle(store, raw)
        };
        if matches!(dispatch, Dispatch::Applied { tracked: true }) {
            inner.change_count += 1;
        }
        dispatch
    }

    /// [`Scene::handle_event`] for payloads delivered as bytes.
    pub async fn handle_event_bytes(&self, raw: &[u8]) -> Dispatch {
        let mut inner = self.inner.write().await;
        let dispatch = {
            let SceneInner { store, router, .. } = &mut *inner;
            router.handle_bytes(store, raw)
        };
        if matches!(dispatch, Dispatch::Applied { tracked: true }) {
            inner.change_count += 1;
        }
        dispatch
    }

    pub async fn register_route(&self, object: impl Into<String>, kind: EventKind, route: Route) {
        self.inner.write().await.router.register(object, kind, route);
    }

    pub async fn add_apply_rule(&self, rule: ApplyRule) {
        self.inner.write().await.rules.push(rule);
    }
}

// =============================================================================
// STATE ACCESS
// =============================================================================

impl Scene {
    /// Current value of a fragment (unknown fragments read as an empty map).
    pub async fn get(&self, fragment: &str) -> Value {
        self.inner.read().await.store.get(fragment)
    }

    /// Value at a slash-delimited path inside a fragment.
    pub async fn value_at(&self, fragment: &str, path: &str) -> Option<Value> {
        self.inner.read().await.store.get_path(fragment, path).cloned()
    }

    /// Tracked leaf write; marks the fragment dirty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PathConflict`] when the path crosses a scalar;
    /// the fragment is left unmodified.
    pub async fn set_path(&self, fragment: &str, path: &str, value: Value) -> Result<(), StoreError> {
        self.inner.write().await.store.set_path(fragment, path, value)
    }

    /// Bulk fragment replacement; marks it dirty.
    pub async fn replace(&self, fragment: impl Into<String>, value: Value) {
        self.inner.write().await.store.replace(fragment, value);
    }

    /// Explicit dirty marking for mutations done outside `set_path`.
    pub async fn mark_dirty(&self, fragment: &str) {
        self.inner.write().await.store.mark_dirty(fragment);
    }

    /// `(change_count, applied_count)` of the reconciliation counters.
    pub async fn counters(&self) -> (u64, u64) {
        let inner = self.inner.read().await;
        (inner.change_count, inner.applied_count)
    }
}

// =============================================================================
// PUSH
// =============================================================================

impl Scene {
    /// Push the fragment if dirty. Returns whether a push left the engine.
    pub async fn flush(&self, fragment: &str) -> bool {
        let flushed = self.inner.write().await.store.flush(fragment);
        match flushed {
            Some(value) => {
                send_or_drop(&self.tx, Outbound::Push(StatePush { fragment: fragment.to_owned(), value }));
                true
            }
            None => false,
        }
    }

    /// Push every dirty fragment. Returns how many pushes left the engine.
    pub async fn flush_all(&self) -> usize {
        let flushed = self.inner.write().await.store.flush_dirty();
        let count = flushed.len();
        for (fragment, value) in flushed {
            send_or_drop(&self.tx, Outbound::Push(StatePush { fragment, value }));
        }
        count
    }

    /// Push the fragment's current value regardless of the dirty flag.
    pub async fn force_push(&self, fragment: &str) -> bool {
        let flushed = self.inner.write().await.store.force_flush(fragment);
        match flushed {
            Some(value) => {
                send_or_drop(&self.tx, Outbound::Push(StatePush { fragment: fragment.to_owned(), value }));
                true
            }
            None => false,
        }
    }
}

// =============================================================================
// RECONCILIATION
// =============================================================================

impl Scene {
    /// Commit pending editor values if any tracked edits arrived since the
    /// last apply. Called by the reconciliation loop on every tick.
    pub(crate) async fn apply_pending(&self) -> bool {
        let pushes = {
            let mut inner = self.inner.write().await;
            if inner.change_count <= inner.applied_count {
                return false;
            }
            inner.applied_count = inner.change_count;
            run_apply(&mut inner)
        };
        for push in pushes {
            send_or_drop(&self.tx, Outbound::Push(push));
        }
        true
    }

    /// Commit editor values right now, whether or not the counters show
    /// pending edits. The interactive-apply UI path.
    pub async fn apply_now(&self) {
        let pushes = {
            let mut inner = self.inner.write().await;
            inner.applied_count = inner.change_count;
            run_apply(&mut inner)
        };
        for push in pushes {
            send_or_drop(&self.tx, Outbound::Push(push));
        }
    }
}

/// Copy every rule's editor sub-tree onto its targets, then force-flush
/// each affected fragment exactly once.
fn run_apply(inner: &mut SceneInner) -> Vec<StatePush> {
    let SceneInner { store, rules, .. } = inner;

    let mut affected: Vec<String> = Vec::new();
    for rule in rules.iter() {
        let Some(editor) = store.get_path(&rule.fragment, &rule.editor_path).cloned() else {
            debug!(fragment = %rule.fragment, editor = %rule.editor_path, "reconcile: editor path absent");
            continue;
        };
        for target in &rule.target_paths {
            if let Err(e) = store.merge_path(&rule.fragment, target, &editor) {
                warn!(error = %e, fragment = %rule.fragment, %target, "reconcile: apply skipped for target");
            }
        }
        if !affected.contains(&rule.fragment) {
            affected.push(rule.fragment.clone());
        }
    }

    affected
        .into_iter()
        .filter_map(|fragment| store.force_flush(&fragment).map(|value| StatePush { fragment, value }))
        .collect()
}

// =============================================================================
// MOUNT
// =============================================================================

impl Scene {
    /// Initial mount handshake: place the scene's data files in the
    /// client's virtual filesystem, configure the path prefix, then ask
    /// for a first build and camera reset. File-backed geometry resolves
    /// only after this completes on the client.
    pub fn mount(&self, files: &[MountFile]) {
        let remote = self.remote();

        let dir = self.path_prefix.trim_end_matches('/');
        if !dir.is_empty() {
            remote.fs().mkdir(dir);
        }
        for file in files {
            remote.fs().write_file(format!("{}{}", self.path_prefix, file.path), file.contents.clone());
        }

        let scene = remote.scene();
        scene.set_path_prefix(self.path_prefix.as_str());
        scene.update();
        scene.reset_camera();
    }
}

#[cfg(test)]
#[path = "scene_test.rs"]
mod tests;
