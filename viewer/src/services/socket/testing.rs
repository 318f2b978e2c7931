//! In-memory connector and sinks for exercising connection managers without
//! a network.

use std::sync::Arc;

use parking_lot::Mutex;
use shared::{ConnectionState, LineEvent};

use super::{Payload, TransportEvents};
use crate::core::error::{AppError, Result};
use crate::core::service::{Connector, LineSink, StateSink, Transport};

#[derive(Default)]
pub(crate) struct RecordingStates(Mutex<Vec<ConnectionState>>);

impl StateSink for RecordingStates {
    fn publish(&self, state: ConnectionState) {
        self.0.lock().push(state);
    }
}

impl RecordingStates {
    pub(crate) fn all(&self) -> Vec<ConnectionState> {
        self.0.lock().clone()
    }

    pub(crate) fn last(&self) -> Option<ConnectionState> {
        self.0.lock().last().copied()
    }
}

#[derive(Default)]
pub(crate) struct RecordingLines(Mutex<Vec<LineEvent>>);

impl LineSink for RecordingLines {
    fn emit(&self, line: LineEvent) {
        self.0.lock().push(line);
    }
}

impl RecordingLines {
    pub(crate) fn all(&self) -> Vec<LineEvent> {
        self.0.lock().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.0.lock().iter().map(|line| line.text.clone()).collect()
    }
}

/// Remote end of a fake transport, driven by the test.
#[derive(Clone)]
pub(crate) struct FakeRemote {
    ready: Arc<Mutex<ConnectionState>>,
    events: TransportEvents,
}

impl FakeRemote {
    pub(crate) fn open(&self) {
        *self.ready.lock() = ConnectionState::Open;
        self.events.opened();
    }

    pub(crate) fn send(&self, text: &str) {
        self.events.message(Payload::Text(text.to_string()));
    }

    pub(crate) fn drop_connection(&self) {
        *self.ready.lock() = ConnectionState::Closed;
        self.events.closed(Some(1006), "abnormal closure");
    }

    pub(crate) fn fail(&self) {
        *self.ready.lock() = ConnectionState::Closed;
        self.events.closed(None, "connection refused");
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.ready.lock()
    }
}

struct FakeTransport {
    ready: Arc<Mutex<ConnectionState>>,
    events: TransportEvents,
    log: Arc<Mutex<Vec<String>>>,
}

impl Transport for FakeTransport {
    fn ready_state(&self) -> ConnectionState {
        *self.ready.lock()
    }

    fn close(&mut self, code: u16, reason: &str) {
        let mut ready = self.ready.lock();
        if !ready.is_live() {
            return;
        }
        *ready = ConnectionState::Closed;
        self.log
            .lock()
            .push(format!("close {} {} {}", self.events.id(), code, reason));
        self.events.closed(Some(code), reason);
    }
}

/// Accepts any `ws://` target and records every open and close.
#[derive(Clone, Default)]
pub(crate) struct FakeConnector {
    log: Arc<Mutex<Vec<String>>>,
    remotes: Arc<Mutex<Vec<FakeRemote>>>,
}

impl FakeConnector {
    pub(crate) fn remote(&self, index: usize) -> FakeRemote {
        self.remotes.lock()[index].clone()
    }

    pub(crate) fn opened(&self) -> usize {
        self.remotes.lock().len()
    }

    pub(crate) fn live(&self) -> usize {
        self.remotes
            .lock()
            .iter()
            .filter(|remote| remote.state().is_live())
            .count()
    }

    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

impl Connector for FakeConnector {
    fn open(&self, target: &str, events: TransportEvents) -> Result<Box<dyn Transport>> {
        if !target.starts_with("ws://") {
            return Err(AppError::Establishment(format!("bad target {}", target)));
        }
        let ready = Arc::new(Mutex::new(ConnectionState::Connecting));
        self.log.lock().push(format!("open {} {}", events.id(), target));
        self.remotes.lock().push(FakeRemote {
            ready: Arc::clone(&ready),
            events: events.clone(),
        });
        Ok(Box::new(FakeTransport {
            ready,
            events,
            log: Arc::clone(&self.log),
        }))
    }
}
