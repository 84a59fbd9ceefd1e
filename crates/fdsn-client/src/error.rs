//! Error types for the FDSN client.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for client operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors raised while querying the event service or saving its response.
///
/// A non-success HTTP status is not an error; it is reported as
/// [`FetchOutcome::Failure`](crate::FetchOutcome::Failure).
#[derive(Error, Debug)]
pub enum FetchError {
    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, timeout or body read failure
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
