//! Logging configuration from environment variables

use std::path::PathBuf;

use lib_utils::{get_env, get_env_bool};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "viewer=info,warn";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugConfig {
    /// Log directory (daily rotation inside)
    pub log_dir: PathBuf,
    /// Log file name prefix
    pub log_file_name: String,
    /// Log level filter (e.g., "viewer=debug,info")
    pub log_level: String,
    /// Mirror logs to stderr
    pub log_to_stderr: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            log_file_name: "viewer.log".to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_to_stderr: false,
        }
    }
}

impl DebugConfig {
    /// Load configuration from environment variables
    ///
    /// - `LINEFEED_LOG_DIR`: log directory (default `logs`)
    /// - `RUST_LOG`: filter (default `viewer=info,warn`)
    /// - `LINEFEED_LOG_STDERR`: also log to stderr (default off)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_dir: get_env("LINEFEED_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_file_name: defaults.log_file_name,
            log_level: get_env("RUST_LOG").unwrap_or(defaults.log_level),
            log_to_stderr: get_env_bool("LINEFEED_LOG_STDERR").unwrap_or(defaults.log_to_stderr),
        }
    }

    /// Path of today's log file prefix
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(&self.log_file_name)
    }

    /// Check if debug logging is enabled
    pub fn is_debug_enabled(&self) -> bool {
        self.log_level.contains("debug") || self.log_level.contains("trace")
    }
}
