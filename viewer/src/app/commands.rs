//! Operator commands read from stdin.

use crate::app::events::SocketId;
use crate::core::error::{AppError, Result};

pub const HELP: &str = "\
commands:
  url1 [addr]     set (or clear) the first socket address
  url2 [addr]     set (or clear) the second socket address
  connect         connect both sockets
  disconnect      disconnect both sockets
  reconnect       fire the reconnect trigger
  auto on|off     toggle continuous reconnect
  status          show connection status
  help            show this help
  quit            exit";

/// One parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Change a socket address; `None` clears it
    SetUrl(SocketId, Option<String>),
    Connect,
    Disconnect,
    Reconnect,
    AutoReconnect(bool),
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines are `Ok(None)`.
    pub fn parse(input: &str) -> Result<Option<Command>> {
        let mut words = input.split_whitespace();
        let Some(keyword) = words.next() else {
            return Ok(None);
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(AppError::Validation(format!("too many arguments for '{}'", keyword)));
        }

        let command = match (keyword.to_ascii_lowercase().as_str(), arg) {
            ("url1", url) => Command::SetUrl(SocketId::Primary, url.map(str::to_string)),
            ("url2", url) => Command::SetUrl(SocketId::Secondary, url.map(str::to_string)),
            ("connect", None) => Command::Connect,
            ("disconnect", None) => Command::Disconnect,
            ("reconnect", None) => Command::Reconnect,
            ("auto", Some(flag)) => Command::AutoReconnect(parse_flag(flag)?),
            ("auto", None) => {
                return Err(AppError::Validation("usage: auto on|off".to_string()));
            }
            ("status", None) => Command::Status,
            ("help" | "?", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            ("connect" | "disconnect" | "reconnect" | "status" | "help" | "?" | "quit" | "exit", Some(_)) => {
                return Err(AppError::Validation(format!("'{}' takes no arguments", keyword)));
            }
            (other, _) => {
                return Err(AppError::Validation(format!("unknown command '{}'", other)));
            }
        };
        Ok(Some(command))
    }
}

fn parse_flag(flag: &str) -> Result<bool> {
    match flag.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(AppError::Validation(format!("expected on|off, got '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("url1 ws://localhost:7000").unwrap(),
            Some(Command::SetUrl(SocketId::Primary, Some("ws://localhost:7000".to_string())))
        );
        assert_eq!(
            Command::parse("  URL2  ").unwrap(),
            Some(Command::SetUrl(SocketId::Secondary, None))
        );
        assert_eq!(Command::parse("connect").unwrap(), Some(Command::Connect));
        assert_eq!(Command::parse("auto off").unwrap(), Some(Command::AutoReconnect(false)));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
        assert_eq!(Command::parse("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(Command::parse("jump"), Err(AppError::Validation(_))));
        assert!(matches!(Command::parse("auto"), Err(AppError::Validation(_))));
        assert!(matches!(Command::parse("auto maybe"), Err(AppError::Validation(_))));
        assert!(matches!(Command::parse("status now"), Err(AppError::Validation(_))));
        assert!(matches!(Command::parse("url1 ws://a ws://b"), Err(AppError::Validation(_))));
    }
}
