//! # Environment Variables
//!
//! Utilities for reading and parsing environment variables.

use std::env;
use std::str::FromStr;

/// Get an environment variable by name.
pub fn get_env(name: &'static str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::MissingEnv(name))
}

/// Get and parse an environment variable.
pub fn get_env_parse<T: FromStr>(name: &'static str) -> Result<T, Error> {
    let val = get_env(name)?;
    val.trim().parse::<T>().map_err(|_| Error::WrongFormat(name))
}

/// Get an optional environment variable.
///
/// A missing variable is `Ok(None)`; a present one is returned even when empty,
/// so callers can tell "unset" from "explicitly cleared".
pub fn get_env_opt(name: &'static str) -> Result<Option<String>, Error> {
    match env::var(name) {
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(Error::WrongFormat(name)),
    }
}

/// Get a boolean flag. Accepts `1/0`, `true/false`, `yes/no`, `on/off`.
pub fn get_env_bool(name: &'static str) -> Result<bool, Error> {
    let val = get_env(name)?;
    parse_bool(&val).ok_or(Error::WrongFormat(name))
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// region:    --- Error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    MissingEnv(&'static str),
    WrongFormat(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_missing_env() {
        let err = get_env("LIB_UTILS_TEST_SURELY_UNSET").unwrap_err();
        assert_eq!(err, Error::MissingEnv("LIB_UTILS_TEST_SURELY_UNSET"));
        assert_eq!(get_env_opt("LIB_UTILS_TEST_SURELY_UNSET"), Ok(None));
    }
}
