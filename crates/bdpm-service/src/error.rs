//! Service error types.

use std::time::Duration;

use bdpm_loader::{BdpmError, SourceFile};
use thiserror::Error;

/// Errors raised while downloading or staging the source files.
#[derive(Error, Debug)]
pub enum FetchError {
    /// A fetch attempt exceeded the hard timeout.
    #[error("Timed out fetching {file} after {timeout:?}")]
    Timeout {
        /// The file being fetched.
        file: SourceFile,
        /// The configured timeout.
        timeout: Duration,
    },

    /// The server answered with a non-success status.
    #[error("HTTP status {status} fetching {file}")]
    Status {
        /// The file being fetched.
        file: SourceFile,
        /// The HTTP status code.
        status: u16,
    },

    /// Transport-level HTTP error.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// I/O error reading a local source or writing a scratch file.
    #[error("IO error staging source file: {0}")]
    Io(#[from] std::io::Error),

    /// A background decoding task failed.
    #[error("Decoding task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Errors that abort an update cycle.
///
/// A failed cycle never affects the published snapshot.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// One of the five files could not be fetched.
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A file failed fatally while parsing.
    #[error("Parse failed: {0}")]
    Parse(#[from] BdpmError),

    /// The blocking parse task panicked or was cancelled.
    #[error("Parse task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Invalid service configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// The environment variable.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}
