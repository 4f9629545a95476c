//! Reconciliation loop — batches rapid client edits into authoritative
//! commits.
//!
//! DESIGN
//! ======
//! A background task wakes on a fixed interval and compares two counters:
//! `change_count` (bumped once per tracked edit) and `applied_count`
//! (bumped once per apply). When edits are pending it copies each `editor`
//! sub-tree onto its applied targets and force-pushes the owning fragment,
//! so downstream consumers see the committed value exactly once per batch
//! no matter how many drag frames arrived in between.
//!
//! LIFECYCLE
//! =========
//! The task runs for the lifetime of the owning scene instance and exits
//! when the instance's shutdown channel flips. `Scene::close` awaits the
//! returned handle, so teardown leaves no dangling periodic task.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::env_parse;
use crate::scene::Scene;

/// Default apply interval in milliseconds.
pub const DEFAULT_APPLY_INTERVAL_MS: u64 = 500;

/// Environment override for the apply interval.
pub const APPLY_INTERVAL_ENV: &str = "SCENE_APPLY_INTERVAL_MS";

/// One editor-to-applied copy relation inside a fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct ApplyRule {
    /// Fragment holding both the editor and the applied values.
    pub fragment: String,
    /// Path of the `editor` sub-tree (source).
    pub editor_path: String,
    /// Paths receiving a copy of the editor values.
    pub target_paths: Vec<String>,
}

/// Apply interval, honoring the environment override.
#[must_use]
pub fn apply_interval_from_env() -> Duration {
    Duration::from_millis(env_parse(APPLY_INTERVAL_ENV, DEFAULT_APPLY_INTERVAL_MS))
}

/// Spawn the background reconciliation task for a scene instance. Returns
/// a handle for shutdown.
pub(crate) fn spawn_reconcile_task(
    scene: Scene,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
    info!(instance = %scene.name(), interval_ms, "reconcile: loop configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    scene.apply_pending().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!(instance = %scene.name(), "reconcile: loop stopped");
    })
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
