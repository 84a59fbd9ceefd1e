//! Error types for geographic primitives.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors raised while parsing or validating geographic values.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Invalid bounding box: {0}")]
    InvalidBbox(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid geo-transform: {0}")]
    InvalidTransform(String),

    /// The transform has no inverse (zero determinant).
    #[error("Geo-transform is not invertible")]
    SingularTransform,
}
