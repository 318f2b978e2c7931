//! # Socket Connection Manager
//!
//! [`SocketConnection`] owns the one transport for a configured target and
//! keeps it in step with three external signals:
//!
//! - **target**: a new address tears the current transport down and opens a
//!   fresh one (or none, when the address is cleared)
//! - **auto-reconnect policy**: whether reconnect triggers are acted upon
//! - **reconnect trigger**: with the policy enabled and the transport closed,
//!   runs a full reload
//!
//! It publishes every [`ConnectionState`] it moves through and turns each
//! inbound message into a socket [`shared::LineEvent`].
//!
//! ## State Machine
//!
//! ```text
//!            connect (target set)          opened
//!  Closed ──────────────────────► Connecting ──────► Open
//!    ▲  ▲                            │   │             │
//!    │  └──── failed / dropped ──────┘   │ reload      │ disconnect / reload
//!    │                                   ▼             ▼
//!    └──────────── closed ───────────── Closing ◄──────┘
//! ```
//!
//! The manager keeps its own state field and validates every move against
//! [`ConnectionState::can_transition_to`]. Whether a connect is needed is
//! decided from the transport's own readiness, which also catches drift
//! between the two.
//!
//! ## Failure Handling
//!
//! Nothing here returns an error to the caller. A missing target, a target the
//! connector rejects, a failed handshake or a dropped connection all end in a
//! published `Closed`. Retrying is left to the reconnect trigger.

use std::sync::Arc;

use shared::ConnectionState;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::backoff::ReconnectBackoff;
use super::decode::decode_line;
use super::subscription::{forward_auto_reconnect, forward_reconnect, forward_target, Subscription};
use super::{
    normalize_target, ConnectionSettings, ManagerEvent, SocketSignals, TransportEvents, TransportId,
    TransportNotice, NORMAL_CLOSURE, USER_CLOSE_REASON,
};
use crate::core::error::AppError;
use crate::core::service::{Connector, LineSink, StateSink, Transport};

/// The current transport and what the manager knows about it.
struct ActiveTransport {
    id: TransportId,
    handle: Box<dyn Transport>,
    /// Whether an `opened` notice was seen for this transport
    opened: bool,
}

/// Reconnecting connection manager for one socket target.
///
/// Must be created inside a tokio runtime: the signal subscriptions are tasks.
pub struct SocketConnection<C: Connector> {
    name: String,
    connector: C,
    target: Option<String>,
    /// Read when a trigger is handled, never cached
    auto_reconnect: watch::Receiver<bool>,
    state: ConnectionState,
    transport: Option<ActiveTransport>,
    next_transport_id: u64,
    backoff: ReconnectBackoff,
    state_sink: Arc<dyn StateSink>,
    line_sink: Arc<dyn LineSink>,
    events_tx: mpsc::UnboundedSender<ManagerEvent>,
    events_rx: mpsc::UnboundedReceiver<ManagerEvent>,
    subscriptions: Vec<Subscription>,
}

impl<C: Connector> SocketConnection<C> {
    /// Create the manager and subscribe to its signals.
    ///
    /// Publishes `Closed`, then connects right away when a target is already
    /// configured.
    pub fn new(
        name: impl Into<String>,
        connector: C,
        settings: &ConnectionSettings,
        signals: SocketSignals,
        state_sink: Arc<dyn StateSink>,
        line_sink: Arc<dyn LineSink>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let target = normalize_target(signals.target.borrow().as_deref());
        let auto_reconnect = signals.auto_reconnect.clone();

        let subscriptions = vec![
            forward_target(signals.target, events_tx.clone()),
            forward_auto_reconnect(signals.auto_reconnect, events_tx.clone()),
            forward_reconnect(signals.reconnect, events_tx.clone()),
        ];

        let mut manager = Self {
            name: name.into(),
            connector,
            target: None,
            auto_reconnect,
            state: ConnectionState::Closed,
            transport: None,
            next_transport_id: 0,
            backoff: ReconnectBackoff::new(settings.backoff),
            state_sink,
            line_sink,
            events_tx,
            events_rx,
            subscriptions,
        };

        manager.state_sink.publish(ConnectionState::Closed);
        info!(
            socket = %manager.name,
            url = ?target,
            auto_reconnect = manager.auto_reconnect_enabled(),
            "Socket connection manager created"
        );
        manager.set_target(target);
        manager
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The target the manager last acted on.
    pub fn current_target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Last published state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Readiness reported by the current transport; `Closed` when there is none.
    pub fn transport_state(&self) -> ConnectionState {
        self.transport
            .as_ref()
            .map(|active| active.handle.ready_state())
            .unwrap_or(ConnectionState::Closed)
    }

    /// Current value of the auto-reconnect policy signal.
    pub fn auto_reconnect_enabled(&self) -> bool {
        *self.auto_reconnect.borrow()
    }

    /// Subscriptions whose forwarding task is still running.
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions
            .iter()
            .filter(|subscription| subscription.is_active())
            .count()
    }

    /// Open a transport to the current target.
    ///
    /// No-op while the current transport is connecting or open. Without a
    /// target this only publishes `Closed`.
    pub fn connect(&mut self) {
        let actual = self.transport_state();
        self.reconcile(actual);
        if actual.is_live() {
            debug!(socket = %self.name, transport_state = %actual, "Already connected or connecting");
            return;
        }

        let Some(target) = self.target.clone() else {
            let err = AppError::Configuration("no socket target configured".to_string());
            warn!(socket = %self.name, error = %err, "Cannot connect");
            self.transition(ConnectionState::Closed);
            return;
        };

        self.transition(ConnectionState::Connecting);

        self.next_transport_id += 1;
        let id = TransportId(self.next_transport_id);
        let events = TransportEvents::new(id, self.events_tx.clone());

        match self.connector.open(&target, events) {
            Ok(handle) => {
                info!(socket = %self.name, transport = %id, url = %target, "Connecting");
                self.transport = Some(ActiveTransport {
                    id,
                    handle,
                    opened: false,
                });
            }
            Err(err) => {
                warn!(socket = %self.name, url = %target, error = %err, "Failed to create transport");
                self.transport = None;
                self.transition(ConnectionState::Closed);
            }
        }
    }

    /// Ask an open transport to close with a normal-closure code.
    ///
    /// No-op unless the transport is open. The target is kept.
    pub fn disconnect(&mut self) {
        let Some(active) = self.transport.as_mut() else {
            return;
        };
        if active.handle.ready_state() != ConnectionState::Open {
            return;
        }

        info!(socket = %self.name, transport = %active.id, "Closing connection");
        active.handle.close(NORMAL_CLOSURE, USER_CLOSE_REASON);
        self.transition(ConnectionState::Closing);
    }

    /// Close the connection and release every subscription.
    ///
    /// Safe to call more than once.
    pub fn clean_up(&mut self) {
        self.disconnect();
        self.retire_transport();

        if !self.subscriptions.is_empty() {
            for subscription in &mut self.subscriptions {
                subscription.cancel();
            }
            self.subscriptions.clear();
            info!(socket = %self.name, "Socket connection manager cleaned up");
        }

        if self.state != ConnectionState::Closed {
            self.transition(ConnectionState::Closed);
        }
    }

    /// Handle the next queued event.
    ///
    /// Returns `false` once a shutdown was requested.
    pub async fn process_next(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => self.handle_event(event),
            None => false,
        }
    }

    /// Process events until shut down, then clean up.
    pub async fn run(mut self) {
        while self.process_next().await {}
        self.clean_up();
    }

    /// Move the manager onto its own task.
    pub fn spawn(self) -> ConnectionHandle {
        let name = self.name.clone();
        let tx = self.events_tx.clone();
        let task = tokio::spawn(self.run());
        ConnectionHandle {
            name,
            tx,
            task: Some(task),
        }
    }

    fn handle_event(&mut self, event: ManagerEvent) -> bool {
        match event {
            ManagerEvent::TargetChanged(target) => {
                self.set_target(normalize_target(target.as_deref()));
            }
            ManagerEvent::AutoReconnectChanged(enabled) => {
                info!(socket = %self.name, enabled, "Auto-reconnect policy changed");
            }
            ManagerEvent::ReconnectRequested => self.on_reconnect_requested(),
            ManagerEvent::Connect => self.connect(),
            ManagerEvent::Disconnect => self.disconnect(),
            ManagerEvent::Transport { id, notice } => self.on_transport_notice(id, notice),
            ManagerEvent::Shutdown => return false,
        }
        true
    }

    fn set_target(&mut self, target: Option<String>) {
        if target == self.target {
            return;
        }
        info!(socket = %self.name, from = ?self.target, to = ?target, "Socket target changed");
        self.target = target;
        self.reload();
    }

    /// Disconnect, drop the transport, connect again with a fresh one.
    fn reload(&mut self) {
        self.disconnect();
        self.retire_transport();
        self.connect();
    }

    /// Drop the current transport, abandoning it first if still connecting.
    fn retire_transport(&mut self) {
        let Some(mut active) = self.transport.take() else {
            return;
        };
        if active.handle.ready_state() == ConnectionState::Connecting {
            debug!(socket = %self.name, transport = %active.id, "Abandoning connection attempt");
            active.handle.close(NORMAL_CLOSURE, USER_CLOSE_REASON);
            if self.state == ConnectionState::Connecting {
                self.transition(ConnectionState::Closing);
            }
        }
        trace!(socket = %self.name, transport = %active.id, "Transport retired");
    }

    fn on_reconnect_requested(&mut self) {
        // The policy and the trigger arrive through separate forwarders, so the
        // signal itself is the source of truth here
        if !self.auto_reconnect_enabled() {
            trace!(socket = %self.name, "Reconnect trigger ignored, auto-reconnect disabled");
            return;
        }
        let Some(active) = self.transport.as_ref() else {
            trace!(socket = %self.name, "Reconnect trigger ignored, no transport");
            return;
        };
        if active.handle.ready_state() != ConnectionState::Closed {
            trace!(socket = %self.name, "Reconnect trigger ignored, transport not closed");
            return;
        }
        if let Some(remaining) = self.backoff.remaining() {
            debug!(
                socket = %self.name,
                failures = self.backoff.failures(),
                remaining_ms = remaining.as_millis() as u64,
                "Reconnect trigger ignored, backing off"
            );
            return;
        }

        info!(socket = %self.name, url = ?self.target, "Reconnecting");
        self.reload();
    }

    fn on_transport_notice(&mut self, id: TransportId, notice: TransportNotice) {
        let Some(active) = self.transport.as_mut().filter(|active| active.id == id) else {
            trace!(socket = %self.name, transport = %id, ?notice, "Ignoring notice from superseded transport");
            return;
        };

        match notice {
            TransportNotice::Opened => {
                active.opened = true;
                self.backoff.reset();
                if self.state == ConnectionState::Connecting {
                    info!(socket = %self.name, transport = %id, "Connection open");
                    self.transition(ConnectionState::Open);
                } else {
                    debug!(socket = %self.name, transport = %id, state = %self.state, "Opened after close was requested");
                }
            }
            TransportNotice::Message(payload) => {
                if self.state != ConnectionState::Open {
                    debug!(socket = %self.name, transport = %id, state = %self.state, "Message outside open state not emitted");
                    return;
                }
                let line = decode_line(payload);
                trace!(
                    socket = %self.name,
                    line_preview = %shared::preview(&line.text, 80),
                    "Line received"
                );
                self.line_sink.emit(line);
            }
            TransportNotice::Closed { code, reason } => {
                let opened = active.opened;
                match self.state {
                    ConnectionState::Closing => {
                        info!(socket = %self.name, transport = %id, ?code, reason = %reason, "Connection closed");
                    }
                    _ if !opened => {
                        self.backoff.record_failure();
                        warn!(
                            socket = %self.name,
                            transport = %id,
                            reason = %reason,
                            failures = self.backoff.failures(),
                            "Connection could not be established"
                        );
                    }
                    _ => {
                        warn!(socket = %self.name, transport = %id, ?code, reason = %reason, "Connection closed unexpectedly");
                    }
                }
                if self.state != ConnectionState::Closed {
                    self.transition(ConnectionState::Closed);
                }
            }
        }
    }

    /// Compare the published state with the transport's readiness.
    ///
    /// A transport further along `Connecting -> Open -> Closing -> Closed`
    /// than the manager only has a notice in flight. Any other mismatch is
    /// drift and is returned. Either way a manager still `Connecting` or
    /// `Open` over a transport that is no longer live is moved to `Closed`.
    fn reconcile(&mut self, actual: ConnectionState) -> Option<AppError> {
        if actual == self.state {
            return None;
        }

        let drift = if actual.as_ready_state() > self.state.as_ready_state() {
            debug!(socket = %self.name, state = %self.state, transport_state = %actual, "Transport notice pending");
            None
        } else {
            let err = AppError::State(format!(
                "manager is {} but transport is {}",
                self.state, actual
            ));
            warn!(socket = %self.name, error = %err, "Connection state drift");
            Some(err)
        };

        if !actual.is_live() && self.state.is_live() {
            self.transition(ConnectionState::Closed);
        }
        drift
    }

    fn transition(&mut self, next: ConnectionState) -> bool {
        if !self.state.can_transition_to(next) {
            let err = AppError::State(format!("illegal transition {} -> {}", self.state, next));
            error!(socket = %self.name, error = %err, "Connection state not published");
            return false;
        }
        debug!(socket = %self.name, from = %self.state, to = %next, "Connection state");
        self.state = next;
        self.state_sink.publish(next);
        true
    }
}

/// Handle to a manager running on its own task.
#[derive(Debug)]
pub struct ConnectionHandle {
    name: String,
    tx: mpsc::UnboundedSender<ManagerEvent>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connect(&self) {
        let _ = self.tx.send(ManagerEvent::Connect);
    }

    pub fn disconnect(&self) {
        let _ = self.tx.send(ManagerEvent::Disconnect);
    }

    /// Stop the manager and wait for its clean-up.
    pub async fn shutdown(mut self) {
        let _ = self.tx.send(ManagerEvent::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(socket = %self.name, error = %e, "Socket connection task failed");
            }
        }
    }
}
