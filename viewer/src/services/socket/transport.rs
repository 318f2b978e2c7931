//! # WebSocket Transport
//!
//! tokio-tungstenite implementation of [`Connector`] / [`Transport`].
//!
//! Each [`WebSocketTransport`] drives one connection attempt on its own task:
//! - Handshake, bounded by the connect timeout
//! - Text/binary messages forwarded to the manager, pings answered
//! - Close requests honored in any state; while connecting the handshake is
//!   abandoned, once open a close frame is sent and the peer's answer awaited
//!   for at most the close timeout
//! - Exactly one `closed` notice at the end, whatever the reason
//!
//! Dropping the handle counts as a close request, so a transport can never
//! outlive the manager's reference to it.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use shared::ConnectionState;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};

use super::{ConnectionSettings, Payload, TransportEvents, NORMAL_CLOSURE};
use crate::core::error::{AppError, Result};
use crate::core::service::{Connector, Transport};

/// Reason used when the handle is dropped without an explicit close.
const RELEASED_REASON: &str = "Transport released";

/// Opens [`WebSocketTransport`]s.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    connect_timeout: Duration,
    close_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(settings: &ConnectionSettings) -> Self {
        Self {
            connect_timeout: settings.connect_timeout,
            close_timeout: settings.close_timeout,
        }
    }
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new(&ConnectionSettings::default())
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, target: &str, events: TransportEvents) -> Result<Box<dyn Transport>> {
        validate_target(target)?;
        Ok(Box::new(WebSocketTransport::spawn(
            target.to_string(),
            events,
            self.connect_timeout,
            self.close_timeout,
        )))
    }
}

/// Reject targets that cannot become a WebSocket request.
pub fn validate_target(target: &str) -> Result<()> {
    let request = target.into_client_request()?;
    match request.uri().scheme_str() {
        Some("ws") | Some("wss") => Ok(()),
        Some(other) => Err(AppError::Establishment(format!(
            "unsupported scheme '{}' in {}",
            other, target
        ))),
        None => Err(AppError::Establishment(format!("missing scheme in {}", target))),
    }
}

type CloseRequest = Option<(u16, String)>;

/// Handle to one WebSocket connection attempt.
#[derive(Debug)]
pub struct WebSocketTransport {
    ready: Arc<AtomicU8>,
    close_tx: watch::Sender<CloseRequest>,
}

impl WebSocketTransport {
    fn spawn(
        target: String,
        events: TransportEvents,
        connect_timeout: Duration,
        close_timeout: Duration,
    ) -> Self {
        let ready = Arc::new(AtomicU8::new(ConnectionState::Connecting.as_ready_state()));
        let (close_tx, close_rx) = watch::channel(None);

        let driver = Driver {
            target,
            events,
            ready: Arc::clone(&ready),
            close_rx,
            connect_timeout,
            close_timeout,
        };
        tokio::spawn(driver.run());

        Self { ready, close_tx }
    }

    fn set_ready(&self, state: ConnectionState) {
        self.ready.store(state.as_ready_state(), Ordering::SeqCst);
    }
}

impl Transport for WebSocketTransport {
    fn ready_state(&self) -> ConnectionState {
        load_ready(&self.ready)
    }

    fn close(&mut self, code: u16, reason: &str) {
        if !self.ready_state().is_live() || self.close_tx.borrow().is_some() {
            return;
        }
        self.set_ready(ConnectionState::Closing);
        self.close_tx.send_replace(Some((code, reason.to_string())));
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close(NORMAL_CLOSURE, RELEASED_REASON);
    }
}

fn load_ready(ready: &AtomicU8) -> ConnectionState {
    ConnectionState::from_ready_state(ready.load(Ordering::SeqCst)).unwrap_or(ConnectionState::Closed)
}

/// Task side of a [`WebSocketTransport`].
struct Driver {
    target: String,
    events: TransportEvents,
    ready: Arc<AtomicU8>,
    close_rx: watch::Receiver<CloseRequest>,
    connect_timeout: Duration,
    close_timeout: Duration,
}

impl Driver {
    async fn run(mut self) {
        let transport = self.events.id();
        debug!(transport = %transport, url = %self.target, "Opening WebSocket");

        let connecting = tokio::time::timeout(self.connect_timeout, connect_async(self.target.as_str()));
        let stream = tokio::select! {
            biased;
            _ = self.close_rx.changed() => {
                debug!(transport = %transport, "Close requested before open, abandoning handshake");
                self.finish(None, "Closed before open".to_string());
                return;
            }
            result = connecting => match result {
                Ok(Ok((stream, response))) => {
                    info!(
                        transport = %transport,
                        url = %self.target,
                        status = ?response.status(),
                        "WebSocket connection established"
                    );
                    stream
                }
                Ok(Err(e)) => {
                    warn!(transport = %transport, url = %self.target, error = %e, "WebSocket handshake failed");
                    self.finish(None, e.to_string());
                    return;
                }
                Err(_) => {
                    warn!(
                        transport = %transport,
                        url = %self.target,
                        timeout_ms = self.connect_timeout.as_millis() as u64,
                        "WebSocket handshake timed out"
                    );
                    self.finish(None, "Connect timeout".to_string());
                    return;
                }
            }
        };

        // A close may have been requested while the handshake was completing
        if self.close_rx.borrow().is_some() {
            let (mut write, _) = stream.split();
            let _ = write.send(Message::Close(None)).await;
            self.finish(None, "Closed before open".to_string());
            return;
        }

        self.ready.store(ConnectionState::Open.as_ready_state(), Ordering::SeqCst);
        self.events.opened();

        let (mut write, mut read) = stream.split();
        let mut close_requested = false;
        let mut close_code = None;
        let mut close_reason = String::new();
        let mut message_count = 0u64;

        let close_deadline = tokio::time::sleep(Duration::MAX);
        tokio::pin!(close_deadline);

        loop {
            tokio::select! {
                changed = self.close_rx.changed(), if !close_requested => {
                    close_requested = true;
                    let (code, reason) = match changed {
                        Ok(()) => self.close_rx.borrow().clone().unwrap_or((NORMAL_CLOSURE, RELEASED_REASON.to_string())),
                        Err(_) => (NORMAL_CLOSURE, RELEASED_REASON.to_string()),
                    };
                    self.ready.store(ConnectionState::Closing.as_ready_state(), Ordering::SeqCst);
                    debug!(transport = %transport, code, reason = %reason, "Sending close frame");
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(e) = write.send(Message::Close(Some(frame))).await {
                        debug!(transport = %transport, error = %e, "Close frame not sent");
                        break;
                    }
                    close_deadline.as_mut().reset(tokio::time::Instant::now() + self.close_timeout);
                }
                _ = &mut close_deadline, if close_requested => {
                    warn!(transport = %transport, "Peer did not acknowledge close in time");
                    break;
                }
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        message_count += 1;
                        trace!(
                            transport = %transport,
                            message_length = text.len(),
                            message_preview = %shared::preview(&text, 80),
                            "Received WebSocket text message"
                        );
                        self.events.message(Payload::Text(text));
                    }
                    Some(Ok(Message::Binary(data))) => {
                        message_count += 1;
                        trace!(transport = %transport, message_length = data.len(), "Received WebSocket binary message");
                        self.events.message(Payload::Binary(data));
                    }
                    Some(Ok(Message::Ping(data))) => {
                        trace!(data_len = data.len(), "Received ping, sending pong");
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            warn!(transport = %transport, error = %e, "Failed to send pong response");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        close_code = frame.as_ref().map(|f| u16::from(f.code));
                        close_reason = frame.map(|f| f.reason.into_owned()).unwrap_or_default();
                        info!(
                            transport = %transport,
                            code = ?close_code,
                            reason = %close_reason,
                            message_count,
                            "WebSocket close frame received"
                        );
                        // The library answers the close; keep reading until the stream ends
                    }
                    Some(Ok(_)) => {
                        trace!("Received other WebSocket message type");
                    }
                    Some(Err(e)) => {
                        if close_code.is_none() && !close_requested {
                            warn!(transport = %transport, error = %e, message_count, "WebSocket read error");
                            close_reason = AppError::Transport(e.to_string()).to_string();
                        }
                        break;
                    }
                    None => break,
                }
            }
        }

        info!(transport = %transport, message_count, "WebSocket connection ended");
        self.finish(close_code, close_reason);
    }

    fn finish(&self, code: Option<u16>, reason: String) {
        self.ready.store(ConnectionState::Closed.as_ready_state(), Ordering::SeqCst);
        self.events.closed(code, reason);
    }
}
