// src/errors.rs

//! Crate-wide error types.
//!
//! - [`CliptriggerError`] covers configuration and application wiring.
//! - [`RunError`] is what the process runner reports for a single command.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliptriggerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid pattern for rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure modes of a single process run.
///
/// A non-zero exit code is *not* an error; it is returned as data in
/// [`crate::exec::RunOutput`].
#[derive(Error, Debug)]
pub enum RunError {
    /// The command could not be started at all (not found, not executable, ...).
    #[error("failed to start '{command}': {source}")]
    LaunchFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The global shutdown signal fired while the process was running.
    #[error("cancelled")]
    Cancelled,

    /// Reading output or waiting for the process failed after it started.
    #[error("I/O error while running '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CliptriggerError>;
