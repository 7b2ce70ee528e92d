//! Error types module.
//!
//! This module defines the error types used throughout resolvalid.
//! It uses `thiserror` for structured error handling and provides
//! a custom `Result` type alias for convenience.
//!
//! Only two variants abort a validation run: [`Error::NoGroundTruth`] and
//! [`Error::OutputSinkUnavailable`]. Everything that goes wrong while
//! querying a single candidate is folded into that candidate's verdict.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for resolvalid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for resolvalid.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (reading lists, stdin, terminal output)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error (settings file, JSON report)
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// DNS resolver error (query failures)
    #[error("DNS resolver error: {0}")]
    Resolver(#[from] trust_dns_resolver::error::ResolveError),

    /// HTTP client error while fetching a remote resolver list
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Network-related error (connection failures, bad HTTP status)
    #[error("Network error: {0}")]
    Network(String),

    /// Configuration error (invalid settings, missing inputs)
    #[error("Config error: {0}")]
    Config(String),

    /// Parse error (invalid input format, malformed data)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A single DNS query exceeded its deadline
    #[error("Operation timed out")]
    Timeout,

    /// None of the known-good resolvers produced an address for the test domain
    #[error(
        "Failed to resolve test domain {domain:?} through any known-good resolver, \
         please provide another one using --test-domain"
    )]
    NoGroundTruth {
        /// Test domain that could not be resolved
        domain: String,
    },

    /// The output file could not be created or opened
    #[error("Failed to create output file {path:?}: {source}")]
    OutputSinkUnavailable {
        /// Requested output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a new network error with a message.
    #[must_use]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new configuration error with a message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new parse error with a message.
    #[must_use]
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether this error aborts a whole validation run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoGroundTruth { .. } | Self::OutputSinkUnavailable { .. }
        )
    }
}
