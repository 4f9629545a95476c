//! Client event router — dispatches client payloads into the store.
//!
//! DESIGN
//! ======
//! Events are dispatched by exact `(object, kind)` match. Unknown pairs are
//! ignored so client and server builds can diverge without breaking each
//! other. Malformed payloads are logged and dropped; nothing raised here
//! may take the session down.
//!
//! Routes are typed, not callbacks: the two dispatch patterns the protocol
//! needs (field sync into an editor or applied sub-tree, click toggling)
//! are enumerated in [`Route`], and the scene-wide single-active-widget
//! invariant lives here rather than in any single object.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};
use wire::{Event, EventKind, decode_event};

use crate::store::{SceneStore, StoreError};

// =============================================================================
// ROUTES
// =============================================================================

/// Dispatch key: object name plus interaction type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub object: String,
    pub kind: EventKind,
}

/// What a registered route does with a matched event.
#[derive(Clone, Debug)]
pub enum Route {
    /// Copy the reported value under the object's `editor` sub-tree at
    /// `{object_path}/editor/{property}`. Live-drag values land here; the
    /// applied values are only written by the reconciliation pass.
    EditorField { fragment: String, object_path: String, tracked: bool },
    /// Copy the reported value straight onto the object's own field at
    /// `{object_path}/{property}`.
    ObjectField { fragment: String, object_path: String, tracked: bool },
    /// Flip `{object}/interactive`, deactivating every other toggleable
    /// object on the fragment first. At most one object stays interactive
    /// after any click sequence.
    ToggleInteractive { fragment: String },
}

/// Result of routing one payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// A route matched and the store was updated. Tracked edits feed the
    /// reconciliation counters.
    Applied { tracked: bool },
    /// No route is registered for the `(object, kind)` pair.
    Ignored,
    /// The payload failed to parse. Logged and dropped.
    Malformed,
    /// A route matched but the write hit a path conflict. Store unchanged.
    Rejected,
}

// =============================================================================
// ROUTER
// =============================================================================

/// Per-instance dispatch table from `(object, kind)` to a [`Route`].
#[derive(Debug, Default)]
pub struct EventRouter {
    routes: HashMap<RouteKey, Route>,
}

impl EventRouter {
    #[must_use]
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a route. A later registration for the same key replaces the
    /// earlier one.
    pub fn register(&mut self, object: impl Into<String>, kind: EventKind, route: Route) {
        self.routes.insert(RouteKey { object: object.into(), kind }, route);
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Parse a raw client payload and dispatch it into the store.
    pub fn handle(&self, store: &mut SceneStore, raw: &str) -> Dispatch {
        let event = match decode_event(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "router: malformed event dropped");
                return Dispatch::Malformed;
            }
        };
        self.dispatch(store, &event)
    }

    /// [`EventRouter::handle`] for payloads delivered as bytes.
    pub fn handle_bytes(&self, store: &mut SceneStore, raw: &[u8]) -> Dispatch {
        let event = match wire::decode_event_bytes(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "router: malformed event dropped");
                return Dispatch::Malformed;
            }
        };
        self.dispatch(store, &event)
    }

    /// Dispatch an already-decoded event.
    pub fn dispatch(&self, store: &mut SceneStore, event: &Event) -> Dispatch {
        let key = RouteKey { object: event.object.clone(), kind: event.event };
        let Some(route) = self.routes.get(&key) else {
            debug!(object = %event.object, kind = ?event.event, "router: no route registered");
            return Dispatch::Ignored;
        };

        match route {
            Route::EditorField { fragment, object_path, tracked } => {
                let path = format!("{object_path}/editor/{}", event.info.property);
                apply_field(store, fragment, &path, &event.info.value, *tracked)
            }
            Route::ObjectField { fragment, object_path, tracked } => {
                let path = format!("{object_path}/{}", event.info.property);
                apply_field(store, fragment, &path, &event.info.value, *tracked)
            }
            Route::ToggleInteractive { fragment } => self.toggle_interactive(store, fragment, &event.object),
        }
    }

    /// Flip the clicked object's `interactive` flag. Every other object
    /// with a toggle route on the same fragment loses the flag first, so
    /// at most one widget is ever active — the invariant lives with the
    /// router, not with any single object.
    fn toggle_interactive(&self, store: &mut SceneStore, fragment: &str, object: &str) -> Dispatch {
        for (key, route) in &self.routes {
            let Route::ToggleInteractive { fragment: other_fragment } = route else {
                continue;
            };
            if other_fragment.as_str() != fragment || key.object == object {
                continue;
            }
            let path = format!("{}/interactive", key.object);
            let active = store.get_path(fragment, &path).and_then(Value::as_bool).unwrap_or(false);
            if active {
                if let Err(e) = store.set_path(fragment, &path, Value::Bool(false)) {
                    warn!(error = %e, fragment, %path, "router: widget deactivation skipped");
                }
            }
        }

        let path = format!("{object}/interactive");
        let active = store.get_path(fragment, &path).and_then(Value::as_bool).unwrap_or(false);
        match store.set_path(fragment, &path, Value::Bool(!active)) {
            Ok(()) => Dispatch::Applied { tracked: false },
            Err(e) => {
                warn!(error = %e, fragment, %path, "router: toggle rejected");
                Dispatch::Rejected
            }
        }
    }
}

fn apply_field(store: &mut SceneStore, fragment: &str, path: &str, value: &Value, tracked: bool) -> Dispatch {
    match store.set_path(fragment, path, value.clone()) {
        Ok(()) => Dispatch::Applied { tracked },
        Err(StoreError::PathConflict { .. }) => {
            warn!(fragment, path, "router: field sync rejected, path crosses a scalar");
            Dispatch::Rejected
        }
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
