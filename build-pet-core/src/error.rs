//! Error types for the build pet.
//!
//! Poller failures are converted into neutral results at the source, so most
//! of these only ever reach a log line. Configuration and asset errors are
//! the ones that surface to the binary at startup.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for build-pet-core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured external command was not found.
    #[error("command not found: '{command}'")]
    CommandNotFound {
        /// The command that was not found.
        command: String,
    },

    /// The external command could not be spawned or waited on.
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what went wrong.
        message: String,
    },

    /// The external command did not finish within its timeout.
    #[error("command timed out after {timeout_ms}ms")]
    CommandTimeout {
        /// The timeout that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// Command output did not have the expected shape.
    #[error("failed to parse command output: {message}")]
    ParseError {
        /// Description of the parse problem.
        message: String,
    },

    /// Failed to read the asset map file from disk.
    #[error("failed to read asset map '{path}': {source}")]
    AssetsReadError {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the asset map JSON content.
    #[error("failed to parse asset map JSON from '{path}': {source}")]
    AssetsParseError {
        /// The path containing invalid JSON.
        path: PathBuf,
        /// The underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem.
        message: String,
    },

    /// Display resources could not be acquired.
    #[error("display unavailable: {message}")]
    DisplayError {
        /// Description of the display problem.
        message: String,
    },
}

impl Error {
    /// Create a new `CommandFailed` error with the given message.
    pub fn command_failed(message: impl Into<String>) -> Self {
        Self::CommandFailed {
            message: message.into(),
        }
    }

    /// Create a new `CommandNotFound` error for the given command.
    pub fn command_not_found(command: impl Into<String>) -> Self {
        Self::CommandNotFound {
            command: command.into(),
        }
    }

    /// Create a new `ParseError` with the given message.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a new `ConfigError` with the given message.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new `DisplayError` with the given message.
    pub fn display_error(message: impl Into<String>) -> Self {
        Self::DisplayError {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for build-pet-core operations.
pub type Result<T> = std::result::Result<T, Error>;
