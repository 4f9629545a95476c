//! Transport boundary — messages handed to the external push channel.
//!
//! DESIGN
//! ======
//! The engine never talks to a socket. It emits [`Outbound`] values on a
//! bounded channel; whatever owns the real transport (a WebSocket layer,
//! an in-process test harness) drains the receiver and delivers them.
//! There is no acknowledgement, retry, or per-push timeout — delivery
//! confirmation is not part of this protocol.

use tokio::sync::mpsc;
use tracing::warn;
use wire::{Command, StatePush};

/// Bound for the outbound queue. Matches the per-client channel depth used
/// on the websocket side.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Message leaving the sync engine for the rendering client.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    /// Declarative fragment replacement.
    Push(StatePush),
    /// One-shot remote command.
    Command(Command),
}

/// Create the bounded outbound channel for one scene instance.
#[must_use]
pub fn outbound_channel() -> (mpsc::Sender<Outbound>, mpsc::Receiver<Outbound>) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

/// Best-effort, non-blocking enqueue. Dropping on a full queue beats
/// blocking the store's mutation path.
pub(crate) fn send_or_drop(tx: &mpsc::Sender<Outbound>, message: Outbound) {
    match tx.try_send(message) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(message)) => {
            warn!(kind = outbound_kind(&message), "transport: outbound queue full; dropping message");
        }
        Err(mpsc::error::TrySendError::Closed(message)) => {
            warn!(kind = outbound_kind(&message), "transport: outbound queue closed; dropping message");
        }
    }
}

fn outbound_kind(message: &Outbound) -> &'static str {
    match message {
        Outbound::Push(_) => "push",
        Outbound::Command(_) => "command",
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
