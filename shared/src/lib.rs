//! # Shared Line Stream Types
//!
//! This library defines the contract between the socket connection manager and
//! everything that observes it (status indicators, the line log, history).
//!
//! ## Structure
//!
//! - **[`dto`]**: Data types published by the connection manager
//!   - **[`dto::connection`]**: Connection readiness and its legal transitions
//!   - **[`dto::line`]**: Line events and the structured socket payload
//! - **[`utils`]**: Shared helpers
//!   - **[`utils::preview`]**: Shorten a line for log output
//!
//! ## Wire Format
//!
//! Types serialize to JSON using `serde`:
//! - Enums use lowercase / SCREAMING_SNAKE_CASE names (see each type)
//! - A socket message is either a JSON object with a `sentence` field or plain text
//!
//! ```rust
//! use shared::dto::{LineEvent, LineOrigin};
//!
//! let line = LineEvent::socket("hello");
//! assert_eq!(line.origin, LineOrigin::Socket);
//! ```

pub mod dto;
pub mod utils;

// Re-export commonly used types for convenience
pub use dto::*;
pub use utils::*;
