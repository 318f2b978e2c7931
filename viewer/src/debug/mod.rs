//! # Logging Infrastructure
//!
//! Structured logs for the viewer, written to a daily rotating file and
//! optionally mirrored to stderr.
//!
//! ## Usage
//!
//! ```rust,no_run
//! // Initialize at startup and keep the guard alive
//! let _log_guard = viewer::debug::init_logger();
//!
//! // Log with structured fields
//! tracing::info!(socket = "socket1", url = "ws://localhost:6677", "Connecting");
//! ```
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (e.g., `viewer=debug,info`)
//! - `LINEFEED_LOG_DIR`: Log directory (default: `logs`)
//! - `LINEFEED_LOG_STDERR`: Mirror logs to stderr (1=on, 0=off)

pub mod config;
pub mod logger;

pub use config::DebugConfig;
pub use logger::{init as init_logger, LogGuard};
