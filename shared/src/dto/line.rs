//! Line events and the structured socket message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a line came from.
///
/// The socket connection manager only ever produces [`LineOrigin::Socket`];
/// the other origins belong to the rest of the application (pasting, external
/// clipboard monitoring, editing and undo of existing lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineOrigin {
    Socket,
    Paste,
    External,
    Edit,
    Undo,
}

/// A line of text entering the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEvent {
    pub text: String,
    pub origin: LineOrigin,
    /// When the line was produced locally
    pub received_at: DateTime<Utc>,
}

impl LineEvent {
    pub fn new(text: impl Into<String>, origin: LineOrigin) -> Self {
        Self {
            text: text.into(),
            origin,
            received_at: Utc::now(),
        }
    }

    /// Line decoded from a socket message.
    pub fn socket(text: impl Into<String>) -> Self {
        Self::new(text, LineOrigin::Socket)
    }
}

/// Structured form of an inbound socket message.
///
/// Unknown fields are ignored so producers can attach their own metadata.
/// `sentence` is kept as raw JSON; see [`SocketPayload::line_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocketPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<Value>,
}

impl SocketPayload {
    /// Text carried by `sentence`, if it holds a usable scalar.
    ///
    /// Non-empty strings are taken as is, non-zero numbers and `true` are
    /// stringified. `null`, `false`, `0`, `""`, arrays and objects yield
    /// `None`.
    pub fn line_text(&self) -> Option<String> {
        match self.sentence.as_ref()? {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            Value::Number(number) if number.as_f64().is_some_and(|n| n != 0.0) => Some(number.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_line_origin() {
        let line = LineEvent::socket("hello");
        assert_eq!(line.text, "hello");
        assert_eq!(line.origin, LineOrigin::Socket);
    }

    #[test]
    fn test_payload_ignores_unknown_fields() {
        let payload: SocketPayload =
            serde_json::from_str(r#"{"sentence":"hi","process":"game.exe"}"#).unwrap();
        assert_eq!(payload.line_text().as_deref(), Some("hi"));
    }

    #[test]
    fn test_line_text_stringifies_truthy_scalars() {
        let text = |json: &str| serde_json::from_str::<SocketPayload>(json).unwrap().line_text();

        assert_eq!(text(r#"{"sentence":5}"#).as_deref(), Some("5"));
        assert_eq!(text(r#"{"sentence":-2.5}"#).as_deref(), Some("-2.5"));
        assert_eq!(text(r#"{"sentence":true}"#).as_deref(), Some("true"));

        for falsy in [
            r#"{"sentence":0}"#,
            r#"{"sentence":false}"#,
            r#"{"sentence":null}"#,
            r#"{"sentence":""}"#,
            r#"{"sentence":["a"]}"#,
            r#"{"sentence":{"a":1}}"#,
            r#"{}"#,
        ] {
            assert_eq!(text(falsy), None, "{}", falsy);
        }
    }

    #[test]
    fn test_origin_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LineOrigin::Undo).unwrap(), "\"undo\"");
    }
}
