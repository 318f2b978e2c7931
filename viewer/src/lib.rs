//! # Line Viewer - Library Root
//!
//! Follows text lines streamed over WebSocket connections. This library crate
//! contains all modules used by the binary crate (`main.rs`).
//!
//! ## Features
//!
//! - **Reconnecting sockets**: Each configured address gets a connection
//!   manager that follows address changes and reconnects on a shared trigger
//! - **Line decoding**: `{"sentence": "..."}` messages or plain text
//! - **Operator commands**: Change addresses and connection policy on stdin
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              viewer (this crate)                       │
//! ├────────────────────────────────────────────────────────┤
//! │  Tokio              - Async runtime, signals           │
//! │  tokio-tungstenite  - WebSocket client (rustls)        │
//! │  tracing            - Structured logging               │
//! └────────────────────────────────────────────────────────┘
//!          │ ws://                        │ ws://
//!          ▼                              ▼
//! ┌─────────────────┐          ┌─────────────────────────┐
//! │  Line server 1  │          │   Line server 2         │
//! └─────────────────┘          └─────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - **app**: Orchestrator, settings, state, events, operator commands
//! - **core**: Error type and the traits the socket manager is built on
//! - **services**: `socket`, the connection manager and its WebSocket transport
//! - **debug**: Logging initialization

pub mod app;
pub mod core;
pub mod debug;
pub mod services;

pub use app::{App, AppEvent, Settings, SocketId};
pub use crate::core::{AppError, Result};
pub use services::socket::{ConnectionSettings, SocketConnection, SocketSignals, WebSocketConnector};
