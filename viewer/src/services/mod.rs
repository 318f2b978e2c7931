//! # Services Module
//!
//! External connections for the line viewer.
//!
//! ## Module Overview
//!
//! ```text
//! services/
//! └── socket/    - Reconnecting WebSocket connection manager
//!                  (signals, transport, decoding, backoff)
//! ```
//!
//! ## Service Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Viewer                    │
//! │                                              │
//! │  ┌────────────────────┐ ┌────────────────────┐
//! │  │ SocketConnection   │ │ SocketConnection   │
//! │  │ (primary)          │ │ (secondary)        │
//! │  └─────────┬──────────┘ └─────────┬──────────┘
//! └────────────┼──────────────────────┼───────────┘
//!              │ ws:// / wss://       │
//!              ▼                      ▼
//!      ┌───────────────┐      ┌───────────────┐
//!      │ Line server 1 │      │ Line server 2 │
//!      └───────────────┘      └───────────────┘
//! ```

pub mod socket;

pub use socket::{ConnectionHandle, ConnectionSettings, SocketConnection, SocketSignals, WebSocketConnector};
