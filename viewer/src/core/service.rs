//! # Service Traits
//!
//! Seams between the socket connection manager and the rest of the
//! application. The manager only talks to the outside world through these, so
//! tests can swap in fake transports and recording sinks.

use shared::{ConnectionState, LineEvent};
use tokio::sync::{mpsc, watch};

use crate::core::error::Result;
use crate::services::socket::TransportEvents;

/// Receives every connection state the manager publishes.
pub trait StateSink: Send + Sync {
    fn publish(&self, state: ConnectionState);
}

/// Receives every line decoded from the socket.
pub trait LineSink: Send + Sync {
    fn emit(&self, line: LineEvent);
}

/// Creates transports bound to a target address.
///
/// `open` must return quickly: establishment happens in the background and is
/// reported through `events`. An `Err` means the transport could not even be
/// constructed (malformed address, unsupported scheme).
pub trait Connector: Send + 'static {
    fn open(&self, target: &str, events: TransportEvents) -> Result<Box<dyn Transport>>;
}

/// One connection attempt. Never reused after it reaches
/// [`ConnectionState::Closed`].
pub trait Transport: Send {
    /// Current readiness as reported by the transport itself.
    fn ready_state(&self) -> ConnectionState;

    /// Request a close with the given status code and reason.
    ///
    /// Valid in any state: a transport that is still connecting abandons its
    /// handshake. Calling it more than once has no further effect.
    fn close(&mut self, code: u16, reason: &str);
}

impl StateSink for watch::Sender<ConnectionState> {
    fn publish(&self, state: ConnectionState) {
        self.send_replace(state);
    }
}

impl LineSink for mpsc::UnboundedSender<LineEvent> {
    fn emit(&self, line: LineEvent) {
        let _ = self.send(line);
    }
}
