//! Connection readiness published by the socket connection manager.

use serde::{Deserialize, Serialize};

/// Readiness of the one transport owned by a connection manager.
///
/// The numeric codes returned by [`ConnectionState::as_ready_state`] follow the
/// WebSocket `readyState` convention (0 = connecting ... 3 = closed), which is
/// what status indicators historically consumed.
///
/// `Closed` doubles as the manager's "disconnected" state: no target
/// configured, never attempted, failed to establish, or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    /// Transport created, handshake in progress
    Connecting,
    /// Transport established, messages flow
    Open,
    /// Close requested, waiting for the transport to finish
    Closing,
    /// No live transport
    #[default]
    Closed,
}

impl ConnectionState {
    /// WebSocket-style readiness code.
    pub fn as_ready_state(self) -> u8 {
        match self {
            ConnectionState::Connecting => 0,
            ConnectionState::Open => 1,
            ConnectionState::Closing => 2,
            ConnectionState::Closed => 3,
        }
    }

    /// Inverse of [`ConnectionState::as_ready_state`].
    pub fn from_ready_state(code: u8) -> Option<Self> {
        match code {
            0 => Some(ConnectionState::Connecting),
            1 => Some(ConnectionState::Open),
            2 => Some(ConnectionState::Closing),
            3 => Some(ConnectionState::Closed),
            _ => None,
        }
    }

    /// A live transport is one that is open or still connecting.
    pub fn is_live(self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Open)
    }

    /// Whether the manager may move from `self` to `next`.
    ///
    /// `Closed -> Closed` is allowed so a repeated failure can be re-published.
    /// `Closing -> Connecting` covers a reload that starts while the previous
    /// transport is still draining.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;

        matches!(
            (self, next),
            (Closed, Connecting)
                | (Closed, Closed)
                | (Connecting, Open)
                | (Connecting, Closing)
                | (Connecting, Closed)
                | (Open, Closing)
                | (Open, Closed)
                | (Closing, Closed)
                | (Closing, Connecting)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_state_codes() {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closing,
            ConnectionState::Closed,
        ] {
            assert_eq!(ConnectionState::from_ready_state(state.as_ready_state()), Some(state));
        }
        assert_eq!(ConnectionState::from_ready_state(4), None);
    }

    #[test]
    fn test_open_never_transitions_to_open() {
        assert!(!ConnectionState::Open.can_transition_to(ConnectionState::Open));
        assert!(!ConnectionState::Open.can_transition_to(ConnectionState::Connecting));
        assert!(!ConnectionState::Closed.can_transition_to(ConnectionState::Open));
    }

    #[test]
    fn test_full_cycle_is_legal() {
        let cycle = [
            ConnectionState::Closed,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closing,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closed,
        ];
        assert!(cycle.windows(2).all(|pair| pair[0].can_transition_to(pair[1])));
    }

    #[test]
    fn test_serializes_screaming_case() {
        let json = serde_json::to_string(&ConnectionState::Connecting).unwrap();
        assert_eq!(json, "\"CONNECTING\"");
    }
}
