//! Error types for codeplay.

use thiserror::Error;

/// Result type for codeplay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised below the orchestrator boundary.
///
/// None of these reach the user directly: the execution client folds them into
/// `ExecutionResult::TransportError`, and the orchestrator renders everything as text.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-2xx status and no recognizable payload.
    #[error("{url} returned {status}")]
    Status { url: String, status: reqwest::StatusCode },

    /// The response body was not the JSON shape the endpoint documents.
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration value could not be used.
    #[error("invalid configuration value for {key}: {value}")]
    Config { key: String, value: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
