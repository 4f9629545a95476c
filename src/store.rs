//! Fragment store — named state fragments with dirty tracking.
//!
//! DESIGN
//! ======
//! A fragment is a nested `serde_json::Value` tree keyed by name. Every
//! mutation goes through the store so the dirty flag stays the sole
//! authority on whether a push is owed: `set_path` and `merge_path` mark
//! the owning fragment dirty, bulk replacement must call `mark_dirty`
//! explicitly. `flush` is the single hand-off point to the transport — it
//! yields the value at most once per mutation batch and nothing at all
//! when the fragment is clean.
//!
//! ERROR HANDLING
//! ==============
//! Path writes are validated before any mutation, so a `PathConflict`
//! leaves the fragment exactly as it was.

use std::collections::HashMap;

use serde_json::{Map, Value};

/// Fragment holding the camera parameters.
pub const FRAGMENT_CAMERA: &str = "camera";

/// Fragment holding the geometry object map.
pub const FRAGMENT_GEOMETRY: &str = "geometry";

/// Fragment holding the color-map table.
pub const FRAGMENT_COLORS: &str = "colors";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Traversal hit a scalar where a container was expected. The fragment
    /// is left unmodified.
    #[error("path conflict in fragment {fragment}: {path} crosses a scalar")]
    PathConflict { fragment: String, path: String },
}

/// A named, independently trackable unit of synchronized state.
#[derive(Debug, Clone)]
struct Fragment {
    value: Value,
    dirty: bool,
}

/// Server-side store of named state fragments with dirty tracking.
#[derive(Debug, Default)]
pub struct SceneStore {
    fragments: HashMap<String, Fragment>,
}

impl SceneStore {
    #[must_use]
    pub fn new() -> Self {
        Self { fragments: HashMap::new() }
    }

    /// Seed a fragment without marking it dirty.
    pub fn declare(&mut self, fragment: impl Into<String>, value: Value) {
        self.fragments.insert(fragment.into(), Fragment { value, dirty: false });
    }

    /// Current value of a fragment. Unknown fragments read as an empty map.
    #[must_use]
    pub fn get(&self, fragment: &str) -> Value {
        self.fragments
            .get(fragment)
            .map_or_else(|| Value::Object(Map::new()), |f| f.value.clone())
    }

    /// Borrow the value at a slash-delimited path, if present.
    #[must_use]
    pub fn get_path(&self, fragment: &str, path: &str) -> Option<&Value> {
        let mut current = self.fragments.get(fragment).map(|f| &f.value)?;
        for segment in path.split('/') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Overwrite the leaf at a slash-delimited path, creating intermediate
    /// containers as needed, and mark the fragment dirty. Integer segments
    /// index arrays (padding with nulls when extending); any other segment
    /// indexes an object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PathConflict`] if traversal crosses a scalar
    /// (or a non-numeric segment meets an array) before the path is
    /// exhausted. The fragment is left unmodified.
    pub fn set_path(&mut self, fragment: &str, path: &str, value: Value) -> Result<(), StoreError> {
        let slot = self.carve_checked(fragment, path)?;
        *slot = value;
        self.mark_dirty(fragment);
        Ok(())
    }

    /// Deep-merge a value tree onto a slash-delimited path: object fields
    /// and array elements overwrite position-wise, scalars replace. Marks
    /// the fragment dirty.
    ///
    /// # Errors
    ///
    /// Same conflict rules as [`SceneStore::set_path`].
    pub fn merge_path(&mut self, fragment: &str, path: &str, value: &Value) -> Result<(), StoreError> {
        let slot = self.carve_checked(fragment, path)?;
        merge_into(slot, value);
        self.mark_dirty(fragment);
        Ok(())
    }

    /// Replace a fragment wholesale and mark it dirty.
    pub fn replace(&mut self, fragment: impl Into<String>, value: Value) {
        self.fragments.insert(fragment.into(), Fragment { value, dirty: true });
    }

    /// Explicit dirty marking for mutations performed outside the tracked
    /// path accessors.
    pub fn mark_dirty(&mut self, fragment: &str) {
        if let Some(f) = self.fragments.get_mut(fragment) {
            f.dirty = true;
        }
    }

    #[must_use]
    pub fn is_dirty(&self, fragment: &str) -> bool {
        self.fragments.get(fragment).is_some_and(|f| f.dirty)
    }

    /// If dirty, clear the flag and return the current value for the
    /// transport to push. Clean fragments yield nothing.
    pub fn flush(&mut self, fragment: &str) -> Option<Value> {
        let f = self.fragments.get_mut(fragment)?;
        if !f.dirty {
            return None;
        }
        f.dirty = false;
        Some(f.value.clone())
    }

    /// Current value regardless of the dirty flag (clears it). `None` only
    /// for undeclared fragments.
    pub fn force_flush(&mut self, fragment: &str) -> Option<Value> {
        let f = self.fragments.get_mut(fragment)?;
        f.dirty = false;
        Some(f.value.clone())
    }

    /// Drain every dirty fragment in one pass.
    pub fn flush_dirty(&mut self) -> Vec<(String, Value)> {
        let mut flushed: Vec<(String, Value)> = self
            .fragments
            .iter_mut()
            .filter(|(_, f)| f.dirty)
            .map(|(name, f)| {
                f.dirty = false;
                (name.clone(), f.value.clone())
            })
            .collect();
        flushed.sort_by(|a, b| a.0.cmp(&b.0));
        flushed
    }

    /// Names of all declared fragments.
    pub fn fragment_names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    /// Validate the path against the existing tree, then carve out a
    /// mutable slot for it. Validation happens up front so a conflict
    /// cannot leave a half-written fragment behind.
    fn carve_checked(&mut self, fragment: &str, path: &str) -> Result<&mut Value, StoreError> {
        let entry = self
            .fragments
            .entry(fragment.to_owned())
            .or_insert_with(|| Fragment { value: Value::Object(Map::new()), dirty: false });

        let segments: Vec<&str> = path.split('/').collect();
        if !path_is_writable(&entry.value, &segments) {
            return Err(StoreError::PathConflict { fragment: fragment.to_owned(), path: path.to_owned() });
        }

        // Validated above; carve only fails on the conflicts just ruled out.
        carve(&mut entry.value, &segments)
            .ok_or_else(|| StoreError::PathConflict { fragment: fragment.to_owned(), path: path.to_owned() })
    }
}

/// Walk the existing tree along `segments` without mutating. Absent keys,
/// out-of-range indices, and nulls are fine (they will be created); a
/// scalar in the way, or a non-numeric segment against an array, is not.
fn path_is_writable(root: &Value, segments: &[&str]) -> bool {
    let mut current = root;
    for segment in segments {
        match current {
            Value::Object(map) => match map.get(*segment) {
                Some(next) => current = next,
                None => return true,
            },
            Value::Array(items) => {
                let Ok(index) = segment.parse::<usize>() else {
                    return false;
                };
                match items.get(index) {
                    Some(next) => current = next,
                    None => return true,
                }
            }
            Value::Null => return true,
            _ => return false,
        }
    }
    true
}

/// Descend to the slot addressed by `segments`, creating containers shaped
/// by the next segment as needed. Returns `None` only on conflicts already
/// ruled out by [`path_is_writable`].
fn carve<'a>(current: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    let [segment, rest @ ..] = segments else {
        return Some(current);
    };
    if current.is_null() {
        *current = empty_container_for(segment);
    }
    match current {
        Value::Object(map) => carve(map.entry((*segment).to_owned()).or_insert(Value::Null), rest),
        Value::Array(items) => {
            let index = segment.parse::<usize>().ok()?;
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            carve(&mut items[index], rest)
        }
        _ => None,
    }
}

/// Container an intermediate node needs so `segment` can index into it.
fn empty_container_for(segment: &str) -> Value {
    if segment.parse::<usize>().is_ok() {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Deep merge: objects merge per key, arrays merge per index (extending the
/// target), everything else replaces.
fn merge_into(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(t), Value::Object(s)) => {
            for (key, value) in s {
                merge_into(t.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (Value::Array(t), Value::Array(s)) => {
            if t.len() < s.len() {
                t.resize(s.len(), Value::Null);
            }
            for (index, value) in s.iter().enumerate() {
                merge_into(&mut t[index], value);
            }
        }
        (t, s) => *t = s.clone(),
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
