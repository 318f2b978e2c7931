//! # Settings
//!
//! Viewer configuration loaded from the environment, and [`SettingsSignals`],
//! the live copy of the settings the socket managers follow.
//!
//! | Variable                          | Default               |
//! |-----------------------------------|-----------------------|
//! | `LINEFEED_SOCKET_URL_1`           | `ws://localhost:6677` |
//! | `LINEFEED_SOCKET_URL_2`           | `ws://localhost:9001` |
//! | `LINEFEED_CONTINUOUS_RECONNECT`   | `true`                |
//! | `LINEFEED_RECONNECT_INTERVAL_MS`  | `1000`                |
//! | `LINEFEED_CONNECT_TIMEOUT_MS`     | `10000`               |
//! | `LINEFEED_MAX_LINES`              | `1000`                |
//! | `LINEFEED_PREVENT_LAST_DUPLICATE` | `false`               |
//!
//! An address set to the empty string disables that socket.

use std::str::FromStr;
use std::time::Duration;

use lib_utils::{get_env_bool, get_env_opt, get_env_parse};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use super::events::SocketId;
use crate::core::error::{AppError, Result};
use crate::services::socket::{normalize_target, ConnectionSettings, SocketSignals};

pub const DEFAULT_SOCKET_URL_1: &str = "ws://localhost:6677";
pub const DEFAULT_SOCKET_URL_2: &str = "ws://localhost:9001";

/// Viewer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Primary socket address; `None` disables it
    pub socket_url_1: Option<String>,
    /// Secondary socket address; `None` disables it
    pub socket_url_2: Option<String>,
    /// Whether reconnect ticks are acted upon
    pub continuous_reconnect: bool,
    /// Reconnect tick period
    pub reconnect_interval: Duration,
    /// Upper bound on a connection attempt
    pub connect_timeout: Duration,
    /// Lines kept in the line log
    pub max_lines: usize,
    /// Skip a line identical to the previous one
    pub prevent_last_duplicate: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            socket_url_1: Some(DEFAULT_SOCKET_URL_1.to_string()),
            socket_url_2: Some(DEFAULT_SOCKET_URL_2.to_string()),
            continuous_reconnect: true,
            reconnect_interval: Duration::from_millis(1000),
            connect_timeout: Duration::from_millis(10_000),
            max_lines: 1000,
            prevent_last_duplicate: false,
        }
    }
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let settings = Self {
            socket_url_1: url_or("LINEFEED_SOCKET_URL_1", defaults.socket_url_1)?,
            socket_url_2: url_or("LINEFEED_SOCKET_URL_2", defaults.socket_url_2)?,
            continuous_reconnect: or_default(
                get_env_bool("LINEFEED_CONTINUOUS_RECONNECT"),
                defaults.continuous_reconnect,
            )?,
            reconnect_interval: Duration::from_millis(parse_or(
                "LINEFEED_RECONNECT_INTERVAL_MS",
                defaults.reconnect_interval.as_millis() as u64,
            )?),
            connect_timeout: Duration::from_millis(parse_or(
                "LINEFEED_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout.as_millis() as u64,
            )?),
            max_lines: parse_or("LINEFEED_MAX_LINES", defaults.max_lines)?,
            prevent_last_duplicate: or_default(
                get_env_bool("LINEFEED_PREVENT_LAST_DUPLICATE"),
                defaults.prevent_last_duplicate,
            )?,
        };
        settings.validate()?;

        debug!(?settings, "Settings loaded");
        Ok(settings)
    }

    /// Reject values the viewer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_interval.is_zero() {
            return Err(AppError::Configuration(
                "reconnect interval must be greater than zero".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(AppError::Configuration(
                "connect timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_lines == 0 {
            return Err(AppError::Configuration("max lines must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn url(&self, socket: SocketId) -> Option<&str> {
        match socket {
            SocketId::Primary => self.socket_url_1.as_deref(),
            SocketId::Secondary => self.socket_url_2.as_deref(),
        }
    }

    /// Manager tunables derived from these settings.
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            connect_timeout: self.connect_timeout,
            ..ConnectionSettings::default()
        }
    }
}

fn or_default<T>(value: std::result::Result<T, lib_utils::Error>, default: T) -> Result<T> {
    match value {
        Ok(value) => Ok(value),
        Err(lib_utils::Error::MissingEnv(_)) => Ok(default),
        Err(e) => Err(e.into()),
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T> {
    or_default(get_env_parse(name), default)
}

fn url_or(name: &'static str, default: Option<String>) -> Result<Option<String>> {
    match get_env_opt(name)? {
        Some(value) => Ok(normalize_target(Some(&value))),
        None => Ok(default),
    }
}

/// Senders for every signal the socket managers subscribe to.
///
/// Both sockets share the continuous-reconnect flag and the reconnect
/// trigger; each has its own address.
#[derive(Debug)]
pub struct SettingsSignals {
    url_1: watch::Sender<Option<String>>,
    url_2: watch::Sender<Option<String>>,
    continuous_reconnect: watch::Sender<bool>,
    reconnect: broadcast::Sender<()>,
}

impl SettingsSignals {
    pub fn new(settings: &Settings) -> Self {
        let (url_1, _) = watch::channel(settings.socket_url_1.clone());
        let (url_2, _) = watch::channel(settings.socket_url_2.clone());
        let (continuous_reconnect, _) = watch::channel(settings.continuous_reconnect);
        let (reconnect, _) = broadcast::channel(16);
        Self {
            url_1,
            url_2,
            continuous_reconnect,
            reconnect,
        }
    }

    /// Fresh receivers for one socket's manager.
    pub fn subscribe(&self, socket: SocketId) -> SocketSignals {
        SocketSignals {
            target: self.url_sender(socket).subscribe(),
            auto_reconnect: self.continuous_reconnect.subscribe(),
            reconnect: self.reconnect.subscribe(),
        }
    }

    pub fn url(&self, socket: SocketId) -> Option<String> {
        self.url_sender(socket).borrow().clone()
    }

    /// Change a socket's address; blank clears it.
    pub fn set_url(&self, socket: SocketId, url: Option<&str>) {
        let url = normalize_target(url);
        info!(socket = %socket, url = ?url, "Socket address changed");
        self.url_sender(socket).send_replace(url);
    }

    pub fn continuous_reconnect(&self) -> bool {
        *self.continuous_reconnect.borrow()
    }

    pub fn set_continuous_reconnect(&self, enabled: bool) {
        info!(enabled, "Continuous reconnect changed");
        self.continuous_reconnect.send_replace(enabled);
    }

    /// Fire the reconnect trigger. Returns how many managers were listening.
    pub fn fire_reconnect(&self) -> usize {
        self.reconnect.send(()).unwrap_or(0)
    }

    fn url_sender(&self, socket: SocketId) -> &watch::Sender<Option<String>> {
        match socket {
            SocketId::Primary => &self.url_1,
            SocketId::Secondary => &self.url_2,
        }
    }
}
