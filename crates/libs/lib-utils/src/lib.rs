//! # Utilities Library
//!
//! Shared utility functions for reading configuration from environment variables.

pub mod envs;

// Re-export commonly used functions
pub use envs::{get_env, get_env_bool, get_env_opt, get_env_parse, Error};
