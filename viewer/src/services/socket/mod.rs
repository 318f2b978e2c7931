//! # Socket Connection
//!
//! Owns exactly one WebSocket connection per configured target and keeps it
//! alive across configuration changes.
//!
//! ## Module Overview
//!
//! ```text
//! socket/
//! ├── manager.rs       - SocketConnection state machine and its handle
//! ├── subscription.rs  - Forwarders from external signals into the event queue
//! ├── transport.rs     - tokio-tungstenite transport
//! ├── decode.rs        - Message -> LineEvent
//! └── backoff.rs       - Throttle for auto-reconnect after failed attempts
//! ```
//!
//! ## Event Flow
//!
//! ```text
//!  target watch ─┐
//!  auto-reconnect ┼─ Subscription tasks ─┐
//!  reconnect tick ┘                      ├─► event queue ─► SocketConnection ─┬─► StateSink
//!  transport task (tagged TransportId) ──┘                                     └─► LineSink
//! ```
//!
//! Everything the manager reacts to goes through one queue and is handled one
//! event at a time. Transport notifications carry the [`TransportId`] of the
//! transport that produced them; anything from a superseded transport is
//! dropped on arrival.

pub mod backoff;
pub mod decode;
pub mod manager;
pub mod subscription;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};

pub use backoff::{BackoffPolicy, ReconnectBackoff};
pub use decode::decode_line;
pub use manager::{ConnectionHandle, SocketConnection};
pub use subscription::Subscription;
pub use transport::{WebSocketConnector, WebSocketTransport};

/// Status code for a normal, user-requested closure.
pub const NORMAL_CLOSURE: u16 = 1000;
/// Reason text sent with user-requested closures.
pub const USER_CLOSE_REASON: &str = "User Request";

/// Identity of one transport instance. Monotonic per manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransportId(pub u64);

impl std::fmt::Display for TransportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw message data as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

/// What a transport reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportNotice {
    Opened,
    Message(Payload),
    Closed { code: Option<u16>, reason: String },
}

/// Everything the manager's event loop handles.
#[derive(Debug)]
pub(crate) enum ManagerEvent {
    TargetChanged(Option<String>),
    AutoReconnectChanged(bool),
    ReconnectRequested,
    Connect,
    Disconnect,
    Transport { id: TransportId, notice: TransportNotice },
    Shutdown,
}

/// Callback handle given to a transport when it is created.
///
/// Every notice is tagged with the transport's id before it enters the
/// manager's queue. Notices sent after the manager has gone away are discarded.
#[derive(Debug, Clone)]
pub struct TransportEvents {
    id: TransportId,
    tx: mpsc::UnboundedSender<ManagerEvent>,
}

impl TransportEvents {
    pub(crate) fn new(id: TransportId, tx: mpsc::UnboundedSender<ManagerEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> TransportId {
        self.id
    }

    pub fn opened(&self) {
        self.notify(TransportNotice::Opened);
    }

    pub fn message(&self, payload: Payload) {
        self.notify(TransportNotice::Message(payload));
    }

    pub fn closed(&self, code: Option<u16>, reason: impl Into<String>) {
        self.notify(TransportNotice::Closed {
            code,
            reason: reason.into(),
        });
    }

    fn notify(&self, notice: TransportNotice) {
        let _ = self.tx.send(ManagerEvent::Transport { id: self.id, notice });
    }
}

/// The three external inputs a connection manager follows.
#[derive(Debug)]
pub struct SocketSignals {
    /// Target address; `None` or blank means "no target"
    pub target: watch::Receiver<Option<String>>,
    /// Auto-reconnect policy
    pub auto_reconnect: watch::Receiver<bool>,
    /// Reconnect trigger; carries no payload
    pub reconnect: broadcast::Receiver<()>,
}

/// Tunables for a connection manager and its transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Upper bound on transport establishment
    pub connect_timeout: Duration,
    /// How long a closing transport may wait for the peer's close frame
    pub close_timeout: Duration,
    /// Auto-reconnect throttle after failed attempts
    pub backoff: BackoffPolicy,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(5),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Trim a target address; blank means "no target".
pub fn normalize_target(target: Option<&str>) -> Option<String> {
    target
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_target() {
        assert_eq!(normalize_target(None), None);
        assert_eq!(normalize_target(Some("")), None);
        assert_eq!(normalize_target(Some("   ")), None);
        assert_eq!(
            normalize_target(Some(" ws://localhost:6677 ")),
            Some("ws://localhost:6677".to_string())
        );
    }

    #[test]
    fn test_transport_events_tag_notices() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = TransportEvents::new(TransportId(7), tx);
        events.opened();
        match rx.try_recv() {
            Ok(ManagerEvent::Transport { id, notice }) => {
                assert_eq!(id, TransportId(7));
                assert_eq!(notice, TransportNotice::Opened);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
