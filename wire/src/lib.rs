//! Shared message model and JSON codec for the scene sync transport.
//!
//! This crate owns the wire representation used by both the server-side
//! sync engine and the rendering client. Fragment values and event payloads
//! stay flexible (`serde_json::Value`) while the envelopes around them are
//! fixed types, and every remote command is enumerated at compile time so a
//! renamed or removed client method is a type error instead of a silent
//! no-op.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by the decode functions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw payload could not be parsed as JSON or violates the schema.
    #[error("malformed event payload: {0}")]
    MalformedEvent(#[from] serde_json::Error),
    /// The `(namespace, method)` pair on the wire maps to no known command.
    #[error("unknown command: {namespace}.{method}")]
    UnknownCommand { namespace: String, method: String },
    /// A command argument is missing or has the wrong shape.
    #[error("invalid argument {index} for {method}")]
    InvalidArgument { method: String, index: usize },
}

// =============================================================================
// EVENTS (client → server)
// =============================================================================

/// Interaction type reported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// The rendering surface finished booting and accepts commands.
    Ready,
    /// A property of a geometry object changed (widget drag, clip edit).
    Modified,
    /// A geometry object was clicked.
    Clicked,
    /// The client-side camera moved.
    Camera,
    /// The client rendered a frame.
    Render,
    /// A keyboard character arrived while the scene had focus.
    Char,
    /// Any event name this build does not know about. Newer clients must
    /// keep parsing on older servers.
    #[serde(other)]
    Unknown,
}

/// Which nested field of the named object changed, and its new value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    /// Slash-delimited path into the object, e.g. `"min/x"`.
    #[serde(default)]
    pub property: String,
    /// New value at that path.
    #[serde(default)]
    pub value: Value,
}

/// A transient message from client to server. Consumed immediately by the
/// event router; carries no persistent identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Name of the geometry object (or surface) the event refers to.
    pub object: String,
    /// Interaction type.
    pub event: EventKind,
    /// Property path and value. Empty for clicks.
    #[serde(default)]
    pub info: EventInfo,
}

/// Decode a raw client payload into an [`Event`].
///
/// # Errors
///
/// Returns [`CodecError::MalformedEvent`] for unparseable or
/// schema-violating payloads.
pub fn decode_event(raw: &str) -> Result<Event, CodecError> {
    Ok(serde_json::from_str(raw)?)
}

/// Decode a raw client payload delivered as bytes.
///
/// # Errors
///
/// Returns [`CodecError::MalformedEvent`] for unparseable or
/// schema-violating payloads.
pub fn decode_event_bytes(raw: &[u8]) -> Result<Event, CodecError> {
    Ok(serde_json::from_slice(raw)?)
}

// =============================================================================
// STATE PUSH (server → client)
// =============================================================================

/// One declarative fragment replacement pushed to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatePush {
    /// Name of the fragment being replaced.
    #[serde(rename = "fragment_name")]
    pub fragment: String,
    /// Full current value of the fragment.
    pub value: Value,
}

/// Encode a state push as JSON text.
#[must_use]
pub fn encode_push(push: &StatePush) -> String {
    // String-keyed JSON values cannot fail to serialize.
    serde_json::to_string(push).unwrap_or_default()
}

// =============================================================================
// REMOTE COMMANDS (server → client, fire-and-forget)
// =============================================================================

/// Commands in the `scene` namespace.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneCall {
    /// Re-read every synced fragment and rebuild the scene.
    Update,
    /// Frame the camera around the visible geometry.
    ResetCamera,
    /// Render one frame now.
    Render,
    /// Set the virtual-filesystem prefix used to resolve file-backed objects.
    SetPathPrefix(String),
    /// Replace the camera parameters wholesale.
    UpdateCamera(Value),
    /// Replace the geometry object map wholesale.
    UpdateGeometry(Value),
}

/// Commands in the `fs` namespace (virtual-filesystem bridge).
#[derive(Clone, Debug, PartialEq)]
pub enum FsCall {
    /// Create a directory in the client's virtual filesystem.
    Mkdir(String),
    /// Write a file into the client's virtual filesystem.
    WriteFile { path: String, contents: String },
}

/// A one-shot instruction, enumerated per namespace.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Scene(SceneCall),
    Fs(FsCall),
}

impl Call {
    /// Wire namespace tag.
    #[must_use]
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Scene(_) => "scene",
            Self::Fs(_) => "fs",
        }
    }

    /// Wire method name, in the client's casing.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Scene(SceneCall::Update) => "update",
            Self::Scene(SceneCall::ResetCamera) => "resetCamera",
            Self::Scene(SceneCall::Render) => "render",
            Self::Scene(SceneCall::SetPathPrefix(_)) => "setPathPrefix",
            Self::Scene(SceneCall::UpdateCamera(_)) => "updateCamera",
            Self::Scene(SceneCall::UpdateGeometry(_)) => "updateGeometry",
            Self::Fs(FsCall::Mkdir(_)) => "mkdir",
            Self::Fs(FsCall::WriteFile { .. }) => "writeFile",
        }
    }

    /// Positional wire arguments.
    #[must_use]
    pub fn args(&self) -> Vec<Value> {
        match self {
            Self::Scene(SceneCall::Update | SceneCall::ResetCamera | SceneCall::Render) => Vec::new(),
            Self::Scene(SceneCall::SetPathPrefix(prefix)) => vec![Value::String(prefix.clone())],
            Self::Scene(SceneCall::UpdateCamera(v) | SceneCall::UpdateGeometry(v)) => vec![v.clone()],
            Self::Fs(FsCall::Mkdir(path)) => vec![Value::String(path.clone())],
            Self::Fs(FsCall::WriteFile { path, contents }) => {
                vec![Value::String(path.clone()), Value::String(contents.clone())]
            }
        }
    }
}

/// A remote command addressed at one scene instance. No reply is expected.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    /// Target scene instance name.
    pub instance: String,
    /// The enumerated call.
    pub call: Call,
}

/// Flat wire shape: `{instance, namespace, method, args}`.
#[derive(Serialize, Deserialize)]
struct WireCommand {
    instance: String,
    namespace: String,
    method: String,
    #[serde(default)]
    args: Vec<Value>,
}

/// Encode a command as JSON text.
#[must_use]
pub fn encode_command(command: &Command) -> String {
    let wire = WireCommand {
        instance: command.instance.clone(),
        namespace: command.call.namespace().to_owned(),
        method: command.call.method().to_owned(),
        args: command.call.args(),
    };
    // String-keyed JSON values cannot fail to serialize.
    serde_json::to_string(&wire).unwrap_or_default()
}

/// Decode JSON text into a [`Command`].
///
/// # Errors
///
/// Returns [`CodecError::MalformedEvent`] for unparseable JSON,
/// [`CodecError::UnknownCommand`] for an unrecognized namespace/method
/// pair, and [`CodecError::InvalidArgument`] for a missing or mistyped
/// argument.
pub fn decode_command(raw: &str) -> Result<Command, CodecError> {
    let wire: WireCommand = serde_json::from_str(raw)?;
    let call = wire_to_call(&wire)?;
    Ok(Command { instance: wire.instance, call })
}

fn wire_to_call(wire: &WireCommand) -> Result<Call, CodecError> {
    let arg_str = |index: usize| -> Result<String, CodecError> {
        wire.args
            .get(index)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| CodecError::InvalidArgument { method: wire.method.clone(), index })
    };
    let arg_value = |index: usize| -> Result<Value, CodecError> {
        wire.args
            .get(index)
            .cloned()
            .ok_or_else(|| CodecError::InvalidArgument { method: wire.method.clone(), index })
    };

    match (wire.namespace.as_str(), wire.method.as_str()) {
        ("scene", "update") => Ok(Call::Scene(SceneCall::Update)),
        ("scene", "resetCamera") => Ok(Call::Scene(SceneCall::ResetCamera)),
        ("scene", "render") => Ok(Call::Scene(SceneCall::Render)),
        ("scene", "setPathPrefix") => Ok(Call::Scene(SceneCall::SetPathPrefix(arg_str(0)?))),
        ("scene", "updateCamera") => Ok(Call::Scene(SceneCall::UpdateCamera(arg_value(0)?))),
        ("scene", "updateGeometry") => Ok(Call::Scene(SceneCall::UpdateGeometry(arg_value(0)?))),
        ("fs", "mkdir") => Ok(Call::Fs(FsCall::Mkdir(arg_str(0)?))),
        ("fs", "writeFile") => Ok(Call::Fs(FsCall::WriteFile { path: arg_str(0)?, contents: arg_str(1)? })),
        _ => Err(CodecError::UnknownCommand {
            namespace: wire.namespace.clone(),
            method: wire.method.clone(),
        }),
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
