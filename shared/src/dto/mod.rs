//! # Data Transfer Objects (DTOs)
//!
//! Data structures exchanged between the connection manager and its observers.
//!
//! ## Module Organization
//!
//! - [`connection`] - Connection readiness (`ConnectionState`)
//! - [`line`] - Line events and the structured socket payload
//!
//! ## Serialization Format
//!
//! - **Field naming**: snake_case (default serde behavior)
//! - **Optional fields**: Omitted when `None`
//! - **All types**: Implement both `Serialize` and `Deserialize`
//!
//! ## Example Socket Messages
//!
//! ```text
//! {"sentence": "今日はいい天気ですね"}
//! ```
//!
//! ```text
//! 今日はいい天気ですね
//! ```
//!
//! Both produce the same line.

pub mod connection;
pub mod line;

pub use connection::*;
pub use line::*;
