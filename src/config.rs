//! Scene templates — immutable initial state cloned into each instance.
//!
//! DESIGN
//! ======
//! A template is parsed once (YAML or JSON scene descriptors) and never
//! mutated afterwards; every new scene clones its own copy, so two
//! instances can never alias each other's state. Tuning knobs come from
//! the environment with sane defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid yaml template: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid json template: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable initial state for one scene instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneTemplate {
    /// Initial camera parameters.
    #[serde(default = "default_camera")]
    pub camera: Value,
    /// Initial geometry object map.
    #[serde(default = "empty_map")]
    pub geometry: Value,
    /// Initial color-map table.
    #[serde(default = "empty_map", rename = "color_maps")]
    pub colors: Value,
    /// Virtual-filesystem prefix for file-backed geometry objects.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
}

impl SceneTemplate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            camera: default_camera(),
            geometry: empty_map(),
            colors: empty_map(),
            path_prefix: default_path_prefix(),
        }
    }

    /// Parse a YAML scene descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] when the document does not match the
    /// template shape.
    pub fn from_yaml(descriptor: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(descriptor)?)
    }

    /// Parse a JSON scene descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] when the document does not match the
    /// template shape.
    pub fn from_json(descriptor: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(descriptor)?)
    }

    #[must_use]
    pub fn with_camera(mut self, camera: Value) -> Self {
        self.camera = camera;
        self
    }

    #[must_use]
    pub fn with_geometry(mut self, geometry: Value) -> Self {
        self.geometry = geometry;
        self
    }

    #[must_use]
    pub fn with_colors(mut self, colors: Value) -> Self {
        self.colors = colors;
        self
    }

    #[must_use]
    pub fn with_path_prefix(mut self, path_prefix: impl Into<String>) -> Self {
        self.path_prefix = path_prefix.into();
        self
    }
}

impl Default for SceneTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// A neutral starting camera: ten units back on z, looking at the origin,
/// y-up.
fn default_camera() -> Value {
    serde_json::json!({
        "position": {"x": 0.0, "y": 0.0, "z": 10.0},
        "focal_point": {"x": 0.0, "y": 0.0, "z": 0.0},
        "roll": 0.0,
        "view_up": {"x": 0.0, "y": 1.0, "z": 0.0}
    })
}

fn empty_map() -> Value {
    serde_json::json!({})
}

fn default_path_prefix() -> String {
    "/data/".to_owned()
}

/// Read a typed knob from the environment, falling back to a default.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
