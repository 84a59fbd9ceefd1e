//! Error types for time-series store operations.

use std::fmt::Display;

use thiserror::Error;

use crate::cftime::TimeError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by store creation, append and read-back.
///
/// None of these are handled locally; every failure propagates to the caller.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Error reported by the NetCDF/HDF5 library
    #[error("NetCDF error while {context}: {message}")]
    Netcdf { context: String, message: String },

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing variable: {0}")]
    MissingVariable(String),

    #[error("Missing attribute '{attribute}' on variable '{variable}'")]
    MissingAttribute { variable: String, attribute: String },

    #[error("Invalid attribute '{attribute}' on variable '{variable}': {message}")]
    InvalidAttribute {
        variable: String,
        attribute: String,
        message: String,
    },

    /// Slice shape differs from the variable's spatial extent, as (rows, cols)
    #[error("Shape mismatch for '{variable}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        variable: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Invalid store layout: {0}")]
    InvalidLayout(String),

    #[error("Index {index} out of range for '{variable}' (time axis length {len})")]
    IndexOutOfRange {
        variable: String,
        index: usize,
        len: usize,
    },

    /// The time axis length moved between planning and committing an append
    #[error("Time axis changed during append: expected length {expected}, found {found}")]
    ConcurrentModification { expected: usize, found: usize },

    #[error(transparent)]
    Time(#[from] TimeError),
}

impl StoreError {
    /// Wrap a NetCDF library error with what was being attempted.
    pub fn netcdf(context: impl Into<String>, err: impl Display) -> Self {
        Self::Netcdf {
            context: context.into(),
            message: err.to_string(),
        }
    }

    /// Create a MissingAttribute error.
    pub fn missing_attribute(variable: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            variable: variable.into(),
            attribute: attribute.into(),
        }
    }
}

/// Attach context to errors coming out of the NetCDF library.
pub(crate) trait NetcdfContext<T> {
    fn nc_context(self, context: &str) -> StoreResult<T>;
}

impl<T, E: Display> NetcdfContext<T> for Result<T, E> {
    fn nc_context(self, context: &str) -> StoreResult<T> {
        self.map_err(|e| StoreError::netcdf(context, e))
    }
}
