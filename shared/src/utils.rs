//! # Shared Utility Functions
//!
//! Helpers used by the viewer and its tooling.
//!
//! ## Line Previews
//!
//! Socket lines can be arbitrarily long; log output only carries a preview:
//! - [`preview`] - First `max_chars` characters followed by `...` when cut
//!
//! ```rust
//! use shared::utils::preview;
//!
//! assert_eq!(preview("hello world", 5), "hello...");
//! assert_eq!(preview("hello", 5), "hello");
//! ```

/// Shorten `text` to at most `max_chars` characters for display in logs.
///
/// Cuts on character boundaries, so multi-byte text never panics.
///
/// # Examples
///
/// ```rust
/// use shared::utils::preview;
///
/// assert_eq!(preview("こんにちは世界", 5), "こんにちは...");
/// ```
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
