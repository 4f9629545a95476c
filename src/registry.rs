//! Scene registry — independent instances addressed by name.
//!
//! DESIGN
//! ======
//! Multi-view embeddings hold several rendering surfaces at once. Each
//! instance has its own store, dispatch table, and reconciliation loop;
//! the registry only maps names to handles and owns nothing mutable that
//! instances could share.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, mpsc};
use tracing::info;

use crate::config::SceneTemplate;
use crate::scene::Scene;
use crate::transport::Outbound;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("scene already registered: {0}")]
    Duplicate(String),
}

/// Registry of live scene instances.
#[derive(Clone, Debug, Default)]
pub struct SceneRegistry {
    scenes: Arc<RwLock<HashMap<String, Scene>>>,
    next_id: Arc<AtomicU64>,
}

impl SceneRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scene under an explicit name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the name is taken.
    pub async fn open(
        &self,
        name: impl Into<String>,
        template: &SceneTemplate,
    ) -> Result<(Scene, mpsc::Receiver<Outbound>), RegistryError> {
        self.open_with_interval(name, template, crate::reconcile::apply_interval_from_env())
            .await
    }

    /// [`SceneRegistry::open`] with an explicit reconciliation interval.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] when the name is taken.
    pub async fn open_with_interval(
        &self,
        name: impl Into<String>,
        template: &SceneTemplate,
        interval: Duration,
    ) -> Result<(Scene, mpsc::Receiver<Outbound>), RegistryError> {
        let name = name.into();
        let mut scenes = self.scenes.write().await;
        if scenes.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        let (scene, rx) = Scene::open_with_interval(name.clone(), template, interval);
        scenes.insert(name, scene.clone());
        Ok((scene, rx))
    }

    /// Open a scene under a generated `scene_{n}` name.
    pub async fn open_auto(&self, template: &SceneTemplate) -> (Scene, mpsc::Receiver<Outbound>) {
        loop {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            let name = format!("scene_{id}");
            match self.open(name, template).await {
                Ok(opened) => return opened,
                Err(RegistryError::Duplicate(_)) => {}
            }
        }
    }

    /// Handle of a registered scene.
    pub async fn get(&self, name: &str) -> Option<Scene> {
        self.scenes.read().await.get(name).cloned()
    }

    /// Names of all registered scenes, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scenes.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Tear down one scene: stop its reconciliation loop and forget it.
    /// Returns whether the name was registered.
    pub async fn close(&self, name: &str) -> bool {
        let removed = self.scenes.write().await.remove(name);
        match removed {
            Some(scene) => {
                scene.close().await;
                info!(instance = name, "registry: scene torn down");
                true
            }
            None => false,
        }
    }

    /// Tear down every registered scene.
    pub async fn close_all(&self) {
        let drained: Vec<Scene> = self.scenes.write().await.drain().map(|(_, scene)| scene).collect();
        for scene in drained {
            scene.close().await;
        }
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
