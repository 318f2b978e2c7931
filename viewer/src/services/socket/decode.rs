//! Inbound message decoding.
//!
//! A message is either a JSON object carrying the line in its `sentence`
//! field, or the line itself as plain text. A string `sentence` is used as
//! is; a non-zero number or `true` is stringified. Anything else (not JSON,
//! JSON without `sentence`, an empty, zero, `false`, `null` or compound
//! `sentence`) falls back to the raw text unchanged, so no message is ever
//! lost to decoding.

use serde_json::Value;
use shared::{LineEvent, SocketPayload};
use tracing::trace;

use super::Payload;

/// Decode one inbound message into exactly one socket line.
pub fn decode_line(payload: Payload) -> LineEvent {
    let raw = match payload {
        Payload::Text(text) => text,
        Payload::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    };

    match structured_sentence(&raw) {
        Some(sentence) => LineEvent::socket(sentence),
        None => LineEvent::socket(raw),
    }
}

fn structured_sentence(raw: &str) -> Option<String> {
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(value) if value.is_object() => value,
        Ok(_) => return None,
        Err(e) => {
            trace!(error = %e, "Message is not structured, using raw text");
            return None;
        }
    };

    let sentence = serde_json::from_value::<SocketPayload>(value)
        .ok()
        .and_then(|payload| payload.line_text());
    if sentence.is_none() {
        trace!("Structured message without usable sentence, using raw text");
    }
    sentence
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::LineOrigin;

    fn text(s: &str) -> Payload {
        Payload::Text(s.to_string())
    }

    #[test]
    fn test_structured_sentence_is_extracted() {
        let line = decode_line(text(r#"{"sentence":"hello"}"#));
        assert_eq!(line.text, "hello");
        assert_eq!(line.origin, LineOrigin::Socket);
    }

    #[test]
    fn test_plain_text_falls_back_verbatim() {
        assert_eq!(decode_line(text("hello")).text, "hello");
        assert_eq!(decode_line(text("  spaced  ")).text, "  spaced  ");
    }

    #[test]
    fn test_json_without_sentence_keeps_raw_message() {
        let raw = r#"{"text":"hello"}"#;
        assert_eq!(decode_line(text(raw)).text, raw);

        let empty = r#"{"sentence":""}"#;
        assert_eq!(decode_line(text(empty)).text, empty);
    }

    #[test]
    fn test_json_scalars_keep_raw_message() {
        assert_eq!(decode_line(text("42")).text, "42");
        assert_eq!(decode_line(text("\"quoted\"")).text, "\"quoted\"");
        assert_eq!(decode_line(text("")).text, "");
        assert_eq!(decode_line(text(r#"["hello"]"#)).text, r#"["hello"]"#);
    }

    #[test]
    fn test_scalar_sentence_is_stringified() {
        assert_eq!(decode_line(text(r#"{"sentence":5}"#)).text, "5");
        assert_eq!(decode_line(text(r#"{"sentence":true}"#)).text, "true");

        for raw in [r#"{"sentence":0}"#, r#"{"sentence":false}"#, r#"{"sentence":null}"#] {
            assert_eq!(decode_line(text(raw)).text, raw);
        }
    }

    #[test]
    fn test_binary_payload_is_decoded_as_utf8() {
        let line = decode_line(Payload::Binary(r#"{"sentence":"バイナリ"}"#.as_bytes().to_vec()));
        assert_eq!(line.text, "バイナリ");

        let lossy = decode_line(Payload::Binary(vec![b'o', b'k', 0xff]));
        assert_eq!(lossy.text, "ok\u{fffd}");
    }
}
