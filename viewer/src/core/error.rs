//! # Common Error Types
//!
//! Consolidated error handling for the viewer.
//!
//! ## Error Categories
//!
//! - **Configuration**: No socket target configured, bad environment values
//! - **Establishment**: The transport could not be created or its handshake failed
//! - **Transport**: An established transport failed while in use
//! - **State**: Illegal connection state transitions (logic errors)
//! - **Validation**: Malformed operator input
//!
//! The connection manager never hands these back to its callers. Every failure
//! is logged with its category and ends in a published [`shared::ConnectionState`].
//! Decoding problems are not errors at all: a message that is not structured
//! falls back to its raw text.
//!
//! ```rust
//! use viewer::core::error::AppError;
//!
//! let err = AppError::Establishment("relative URL without a base".to_string());
//! assert_eq!(err.to_string(), "Establishment error: relative URL without a base");
//! ```

use thiserror::Error;

/// Application-wide error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Missing or invalid configuration, e.g. no socket target set.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport construction or handshake failure.
    ///
    /// Raised synchronously by a [`crate::core::service::Connector`] when the
    /// target cannot be turned into a request (malformed address, unsupported
    /// scheme), or reported asynchronously when the handshake fails.
    #[error("Establishment error: {0}")]
    Establishment(String),

    /// Failure of an established transport (read/write errors).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Illegal state transition or drift between the manager's state and the
    /// transport's readiness.
    #[error("State error: {0}")]
    State(String),

    /// Malformed operator input.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<lib_utils::Error> for AppError {
    fn from(err: lib_utils::Error) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for AppError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        AppError::Establishment(err.to_string())
    }
}
