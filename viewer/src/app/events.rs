//! # Application Events
//!
//! Event types sent from the socket managers to the main loop.

use async_channel::Sender;
use shared::{ConnectionState, LineEvent};
use tracing::trace;

use crate::core::service::{LineSink, StateSink};

/// Which of the two configured sockets an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketId {
    Primary,
    Secondary,
}

impl SocketId {
    pub fn all() -> &'static [SocketId] {
        &[SocketId::Primary, SocketId::Secondary]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SocketId::Primary => "socket1",
            SocketId::Secondary => "socket2",
        }
    }
}

impl std::fmt::Display for SocketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Manager output delivered to the main loop
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A socket published a connection state
    ConnectionStateChanged {
        socket: SocketId,
        state: ConnectionState,
    },
    /// A socket produced a line
    LineReceived { socket: SocketId, line: LineEvent },
}

/// State and line sink that tags everything with its socket and forwards it
/// to the main loop.
#[derive(Debug, Clone)]
pub struct EventSink {
    socket: SocketId,
    tx: Sender<AppEvent>,
}

impl EventSink {
    pub fn new(socket: SocketId, tx: Sender<AppEvent>) -> Self {
        Self { socket, tx }
    }

    fn forward(&self, event: AppEvent) {
        if self.tx.try_send(event).is_err() {
            trace!(socket = %self.socket, "Event loop gone, event dropped");
        }
    }
}

impl StateSink for EventSink {
    fn publish(&self, state: ConnectionState) {
        self.forward(AppEvent::ConnectionStateChanged {
            socket: self.socket,
            state,
        });
    }
}

impl LineSink for EventSink {
    fn emit(&self, line: LineEvent) {
        self.forward(AppEvent::LineReceived {
            socket: self.socket,
            line,
        });
    }
}
