//! # Core Abstractions
//!
//! Core traits and error types for dependency injection and better testability.
//!
//! - **[`error`]**: Application error types (`AppError`, `Result<T>`)
//! - **[`service`]**: Seams used by the socket connection manager
//!   (`StateSink`, `LineSink`, `Connector`, `Transport`)
//!
//! ## Dependency Injection
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shared::ConnectionState;
//! use tokio::sync::watch;
//! use viewer::core::service::StateSink;
//!
//! // In production: a watch channel observed by the status indicator
//! let (state_tx, _state_rx) = watch::channel(ConnectionState::Closed);
//! let sink: Arc<dyn StateSink> = Arc::new(state_tx);
//!
//! // In tests: a recording sink
//! ```

pub mod error;
pub mod service;

pub use error::{AppError, Result};
pub use service::{Connector, LineSink, StateSink, Transport};
