// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! An unschedulable task set is **not** an error: the analyses report it as
//! `Ok(false)`. Errors are reserved for malformed input and broken model
//! invariants.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal invariant violated: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SchedError>;

/// Shorthand for building a [`SchedError::ConfigError`].
pub(crate) fn config_error(msg: impl Into<String>) -> SchedError {
    SchedError::ConfigError(msg.into())
}

/// Shorthand for building a [`SchedError::Internal`].
pub(crate) fn internal_error(msg: impl Into<String>) -> SchedError {
    SchedError::Internal(msg.into())
}
