//! # Application Orchestrator
//!
//! The main [`App`] struct runs the viewer: two socket connection managers,
//! the operator's command input and the display of incoming lines.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Main task                              │
//! │  ┌──────────────────────────────────────────────────────┐   │
//! │  │  App (orchestrator)                                  │   │
//! │  │  - run() - stdin, events, reconnect ticker, Ctrl-C   │   │
//! │  │  - handle_event() - updates state, returns output    │   │
//! │  │  - handle_command() - operator commands              │   │
//! │  └────────────┬──────────────────────────┬──────────────┘   │
//! │               │                          │                  │
//! │  ┌────────────▼──────────────┐  ┌────────▼──────────────┐   │
//! │  │ State: Arc<RwLock<..>>    │  │ SettingsSignals       │   │
//! │  │ - per-socket status       │  │ - url1 / url2 watch   │   │
//! │  │ - bounded line log        │  │ - continuous flag     │   │
//! │  └───────────────────────────┘  │ - reconnect trigger   │   │
//! │                                 └────────┬──────────────┘   │
//! └─────────────────────────▲────────────────┼──────────────────┘
//!                           │ async_channel  │ watch / broadcast
//!                           │ (unbounded)    ▼
//! ┌─────────────────────────┴───────────────────────────────────┐
//! │   SocketConnection (socket1)    SocketConnection (socket2)  │
//! │   own tokio tasks, EventSink tags output with its socket    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Components
//!
//! - **[`App`]**: Orchestrator owning the managers and the signals
//! - **[`AppState`]**: Shared status and line log (see [`state`] module)
//! - **[`AppEvent`]**: Manager output (see [`events`] module)
//! - **[`Settings`]**: Environment configuration (see [`settings`] module)
//! - **[`Command`]**: Operator input (see [`commands`] module)
//!
//! ## Shutdown
//!
//! `quit`, end of input and Ctrl-C all end [`App::run`], which shuts every
//! manager down. Each manager cleans itself up exactly once on its own task.

pub mod commands;
pub mod events;
pub mod settings;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use async_channel::Receiver;
use parking_lot::RwLock;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub use commands::{Command, HELP};
pub use events::{AppEvent, EventSink, SocketId};
pub use settings::{Settings, SettingsSignals};
pub use state::{AppState, LoggedLine, SocketStatus};

use crate::core::service::Connector;
use crate::services::socket::{ConnectionHandle, SocketConnection};

/// What the main loop should show for a handled event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A line for the display (stdout)
    Line(String),
    /// A connection notice for the operator (stderr)
    Notice(String),
}

/// Main application orchestrator
pub struct App {
    /// Shared application state
    pub state: Arc<RwLock<AppState>>,
    signals: SettingsSignals,
    connections: Vec<(SocketId, ConnectionHandle)>,
    event_rx: Receiver<AppEvent>,
    reconnect_interval: Duration,
}

impl App {
    /// Build one connection manager per socket and start them.
    ///
    /// Must be called inside a tokio runtime. Sockets with an address start
    /// connecting right away.
    pub fn start<C>(settings: &Settings, connector: C) -> Self
    where
        C: Connector + Clone,
    {
        let (event_tx, event_rx) = async_channel::unbounded();
        let signals = SettingsSignals::new(settings);
        let connection_settings = settings.connection_settings();

        let connections = SocketId::all()
            .iter()
            .map(|&socket| {
                let sink = Arc::new(EventSink::new(socket, event_tx.clone()));
                let manager = SocketConnection::new(
                    socket.label(),
                    connector.clone(),
                    &connection_settings,
                    signals.subscribe(socket),
                    sink.clone(),
                    sink,
                );
                (socket, manager.spawn())
            })
            .collect();

        info!(
            socket1 = ?settings.socket_url_1,
            socket2 = ?settings.socket_url_2,
            continuous_reconnect = settings.continuous_reconnect,
            "Viewer started"
        );

        Self {
            state: Arc::new(RwLock::new(AppState::new(
                settings.max_lines,
                settings.prevent_last_duplicate,
            ))),
            signals,
            connections,
            event_rx,
            reconnect_interval: settings.reconnect_interval,
        }
    }

    /// Next manager event; `None` once every manager is gone.
    pub async fn next_event(&self) -> Option<AppEvent> {
        self.event_rx.recv().await.ok()
    }

    /// Apply a manager event to the state.
    pub fn handle_event(&self, event: AppEvent) -> Option<Output> {
        match event {
            AppEvent::ConnectionStateChanged { socket, state } => {
                let mut app_state = self.state.write();
                let status = app_state.status_mut(socket);
                let previous = status.state;
                status.record_state(state);
                drop(app_state);

                debug!(socket = %socket, state = %state, "Socket state updated");
                (previous != state).then(|| Output::Notice(format!("[{}] {}", socket, state.label())))
            }
            AppEvent::LineReceived { socket, line } => {
                let text = line.text.clone();
                let accepted = self.state.write().push_line(socket, line);
                if !accepted {
                    debug!(socket = %socket, "Duplicate line suppressed");
                    return None;
                }
                Some(Output::Line(text))
            }
        }
    }

    /// Apply an operator command. Returns a reply for the operator.
    ///
    /// [`Command::Quit`] is handled by the caller; here it is a no-op.
    pub fn handle_command(&self, command: Command) -> Option<String> {
        match command {
            Command::SetUrl(socket, url) => {
                self.signals.set_url(socket, url.as_deref());
                None
            }
            Command::Connect => {
                for (_, connection) in &self.connections {
                    connection.connect();
                }
                None
            }
            Command::Disconnect => {
                for (_, connection) in &self.connections {
                    connection.disconnect();
                }
                None
            }
            Command::Reconnect => {
                let receivers = self.signals.fire_reconnect();
                debug!(receivers, "Reconnect requested");
                None
            }
            Command::AutoReconnect(enabled) => {
                self.signals.set_continuous_reconnect(enabled);
                Some(format!("continuous reconnect {}", if enabled { "on" } else { "off" }))
            }
            Command::Status => Some(self.status_report()),
            Command::Help => Some(HELP.to_string()),
            Command::Quit => None,
        }
    }

    /// Multi-line status of both sockets.
    pub fn status_report(&self) -> String {
        let state = self.state.read();
        let mut report = SocketId::all()
            .iter()
            .map(|&socket| {
                format!(
                    "{} {} | {}",
                    socket,
                    self.signals.url(socket).as_deref().unwrap_or("(no address)"),
                    state.status(socket).summary()
                )
            })
            .collect::<Vec<_>>();
        report.push(format!(
            "continuous reconnect {} | {} lines kept",
            if self.signals.continuous_reconnect() { "on" } else { "off" },
            state.line_count()
        ));
        report.join("\n")
    }

    /// Fire the shared reconnect trigger.
    pub fn fire_reconnect(&self) {
        self.signals.fire_reconnect();
    }

    /// Run until `quit`, end of input or Ctrl-C, then shut down.
    pub async fn run<R>(self, input: R)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut ticker = interval_at(Instant::now() + self.reconnect_interval, self.reconnect_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => match Command::parse(&line) {
                        Ok(Some(Command::Quit)) => {
                            info!("Quit requested");
                            break;
                        }
                        Ok(Some(command)) => {
                            if let Some(reply) = self.handle_command(command) {
                                eprintln!("{}", reply);
                            }
                        }
                        Ok(None) => {}
                        Err(e) => eprintln!("{}", e),
                    },
                    Ok(None) => {
                        info!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to read input");
                        break;
                    }
                },
                event = self.event_rx.recv() => match event {
                    Ok(event) => match self.handle_event(event) {
                        Some(Output::Line(text)) => println!("{}", text),
                        Some(Output::Notice(notice)) => eprintln!("{}", notice),
                        None => {}
                    },
                    Err(_) => {
                        warn!("All socket managers stopped");
                        break;
                    }
                },
                _ = ticker.tick() => self.fire_reconnect(),
                result = &mut ctrl_c => {
                    if let Err(e) = result {
                        error!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    info!("Interrupted");
                    break;
                }
            }
        }

        self.shutdown().await;
    }

    /// Stop every manager and wait for their clean-up.
    pub async fn shutdown(self) {
        for (socket, connection) in self.connections {
            debug!(socket = %socket, "Shutting down socket connection");
            connection.shutdown().await;
        }
        info!("Viewer stopped");
    }
}
