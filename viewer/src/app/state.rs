//! # Application State Types
//!
//! Per-socket connection status and the bounded line log.

use std::collections::VecDeque;
use std::time::Instant;

use shared::{ConnectionState, LineEvent};

use super::events::SocketId;

/// Connection status of one socket
#[derive(Debug, Clone)]
pub struct SocketStatus {
    /// Last published connection state
    pub state: ConnectionState,
    /// Number of connection attempts
    pub connection_attempts: u64,
    /// Last successful connection time
    pub last_connected: Option<Instant>,
    /// Total lines received
    pub lines_received: u64,
    /// Last line time
    pub last_line: Option<Instant>,
}

impl Default for SocketStatus {
    fn default() -> Self {
        Self {
            state: ConnectionState::Closed,
            connection_attempts: 0,
            last_connected: None,
            lines_received: 0,
            last_line: None,
        }
    }
}

impl SocketStatus {
    pub fn record_state(&mut self, state: ConnectionState) {
        match state {
            ConnectionState::Connecting => self.connection_attempts += 1,
            ConnectionState::Open => self.last_connected = Some(Instant::now()),
            ConnectionState::Closing | ConnectionState::Closed => {}
        }
        self.state = state;
    }

    pub fn record_line(&mut self) {
        self.lines_received += 1;
        self.last_line = Some(Instant::now());
    }

    /// One-line summary for the `status` command.
    pub fn summary(&self) -> String {
        let since = |at: Option<Instant>| match at {
            Some(at) => format!("{}s ago", at.elapsed().as_secs()),
            None => "never".to_string(),
        };
        format!(
            "{} | attempts {} | connected {} | lines {} | last line {}",
            self.state.label(),
            self.connection_attempts,
            since(self.last_connected),
            self.lines_received,
            since(self.last_line),
        )
    }
}

/// A line kept in the log with the socket it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedLine {
    pub socket: SocketId,
    pub line: LineEvent,
}

/// Main application state
#[derive(Debug, Clone)]
pub struct AppState {
    primary: SocketStatus,
    secondary: SocketStatus,
    lines: VecDeque<LoggedLine>,
    max_lines: usize,
    prevent_last_duplicate: bool,
}

impl AppState {
    pub fn new(max_lines: usize, prevent_last_duplicate: bool) -> Self {
        Self {
            primary: SocketStatus::default(),
            secondary: SocketStatus::default(),
            lines: VecDeque::with_capacity(max_lines.min(1024)),
            max_lines: max_lines.max(1),
            prevent_last_duplicate,
        }
    }

    pub fn status(&self, socket: SocketId) -> &SocketStatus {
        match socket {
            SocketId::Primary => &self.primary,
            SocketId::Secondary => &self.secondary,
        }
    }

    pub fn status_mut(&mut self, socket: SocketId) -> &mut SocketStatus {
        match socket {
            SocketId::Primary => &mut self.primary,
            SocketId::Secondary => &mut self.secondary,
        }
    }

    /// Append a line, evicting the oldest beyond `max_lines`.
    ///
    /// Returns `false` when the line repeats the previous one and duplicates
    /// are suppressed. The socket's counters are updated either way.
    pub fn push_line(&mut self, socket: SocketId, line: LineEvent) -> bool {
        self.status_mut(socket).record_line();

        if self.prevent_last_duplicate
            && self.lines.back().is_some_and(|last| last.line.text == line.text)
        {
            return false;
        }

        self.lines.push_back(LoggedLine { socket, line });
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
        true
    }

    pub fn lines(&self) -> impl Iterator<Item = &LoggedLine> {
        self.lines.iter()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn last_line(&self) -> Option<&LoggedLine> {
        self.lines.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tracks_attempts_and_connections() {
        let mut status = SocketStatus::default();
        status.record_state(ConnectionState::Connecting);
        status.record_state(ConnectionState::Closed);
        status.record_state(ConnectionState::Connecting);
        status.record_state(ConnectionState::Open);

        assert_eq!(status.connection_attempts, 2);
        assert_eq!(status.state, ConnectionState::Open);
        assert!(status.last_connected.is_some());
        assert!(status.summary().starts_with("open | attempts 2"));
    }

    #[test]
    fn test_line_log_is_bounded() {
        let mut state = AppState::new(3, false);
        for text in ["a", "b", "c", "d"] {
            assert!(state.push_line(SocketId::Primary, LineEvent::socket(text)));
        }

        let texts: Vec<_> = state.lines().map(|l| l.line.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c", "d"]);
        assert_eq!(state.status(SocketId::Primary).lines_received, 4);
    }

    #[test]
    fn test_prevent_last_duplicate() {
        let mut state = AppState::new(10, true);
        assert!(state.push_line(SocketId::Primary, LineEvent::socket("same")));
        assert!(!state.push_line(SocketId::Secondary, LineEvent::socket("same")));
        assert!(state.push_line(SocketId::Primary, LineEvent::socket("other")));
        assert!(state.push_line(SocketId::Primary, LineEvent::socket("same")));

        assert_eq!(state.line_count(), 3);
        assert_eq!(state.status(SocketId::Secondary).lines_received, 1);
    }

    #[test]
    fn test_duplicates_kept_when_allowed() {
        let mut state = AppState::new(10, false);
        assert!(state.push_line(SocketId::Primary, LineEvent::socket("same")));
        assert!(state.push_line(SocketId::Primary, LineEvent::socket("same")));
        assert_eq!(state.line_count(), 2);
    }
}
