//! scenelink — bidirectional scene-state synchronization for remote
//! rendering clients.
//!
//! ARCHITECTURE
//! ============
//! A server-side process owns named state fragments (camera, geometry,
//! color maps) per scene instance. Fragments are pushed to the client on
//! demand (dirty tracking), client interactions are routed back into the
//! store by `(object, event)` dispatch, and high-frequency widget edits
//! are batched into authoritative commits by a per-instance
//! reconciliation loop. One-shot remote commands (filesystem writes,
//! camera resets, render requests) bypass the store entirely as typed
//! fire-and-forget messages.
//!
//! The wire message model lives in the `wire` crate, shared with the
//! rendering client.

pub mod config;
pub mod reconcile;
pub mod registry;
pub mod remote;
pub mod router;
pub mod scene;
pub mod store;
pub mod transport;

pub use config::{ConfigError, SceneTemplate};
pub use reconcile::{APPLY_INTERVAL_ENV, ApplyRule, DEFAULT_APPLY_INTERVAL_MS, apply_interval_from_env};
pub use registry::{RegistryError, SceneRegistry};
pub use remote::RemoteScene;
pub use router::{Dispatch, EventRouter, Route, RouteKey};
pub use scene::{MountFile, Scene};
pub use store::{FRAGMENT_CAMERA, FRAGMENT_COLORS, FRAGMENT_GEOMETRY, SceneStore, StoreError};
pub use transport::{OUTBOUND_QUEUE_CAPACITY, Outbound, outbound_channel};
