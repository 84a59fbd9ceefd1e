//! Storage backends for time-series slices.
//!
//! The append algorithm only needs a handful of primitives from the
//! underlying store: the time axis descriptors and length, the spatial
//! extent of a variable, and indexed writes. [`SliceSource`] covers the
//! read side and [`SliceStore`] adds the writes, so the same algorithm runs
//! against a NetCDF file ([`NetcdfStore`]) or an in-process
//! [`MemoryStore`].

mod file;
mod memory;

pub use file::{NetcdfReader, NetcdfStore};
pub use memory::MemoryStore;

use chrono::NaiveDateTime;

use crate::cftime::{date2num, num2date, Calendar, TimeUnits};
use crate::error::{StoreError, StoreResult};
use crate::raster::Raster;

/// Name of the time dimension and of its coordinate variable.
pub const TIME_VARIABLE: &str = "time";

/// Name of the column dimension.
pub const X_DIMENSION: &str = "x";

/// Name of the row dimension.
pub const Y_DIMENSION: &str = "y";

/// Decoded `units` and `calendar` of a store's time axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    pub units: TimeUnits,
    pub calendar: Calendar,
}

impl TimeAxis {
    /// Decode the raw attribute values of the time variable.
    pub fn from_attributes(units: &str, calendar: &str) -> StoreResult<Self> {
        let invalid = |attribute: &str, err: crate::cftime::TimeError| StoreError::InvalidAttribute {
            variable: TIME_VARIABLE.to_string(),
            attribute: attribute.to_string(),
            message: err.to_string(),
        };
        Ok(Self {
            units: units.parse().map_err(|e| invalid("units", e))?,
            calendar: calendar.parse().map_err(|e| invalid("calendar", e))?,
        })
    }

    /// Offset of `timestamp` on this axis.
    pub fn encode(&self, timestamp: NaiveDateTime) -> StoreResult<f64> {
        Ok(date2num(timestamp, &self.units, self.calendar)?)
    }

    /// Timestamp of an offset on this axis.
    pub fn decode(&self, offset: f64) -> StoreResult<NaiveDateTime> {
        Ok(num2date(offset, &self.units, self.calendar)?)
    }
}

/// Read access to a time-series store.
pub trait SliceSource {
    /// Decoded descriptors of the time axis.
    fn time_axis(&self) -> StoreResult<TimeAxis>;

    /// Current length of the time axis; the index the next slice lands at.
    fn time_len(&self) -> StoreResult<usize>;

    /// Spatial extent of `variable` as `(rows, cols)`.
    fn spatial_shape(&self, variable: &str) -> StoreResult<(usize, usize)>;

    /// Names of the data variables indexed by the time axis.
    fn data_variables(&self) -> StoreResult<Vec<String>>;

    /// Raw offsets stored on the time axis.
    fn read_times(&self) -> StoreResult<Vec<f64>>;

    /// The slice of `variable` at time index `index`.
    fn read_slice(&self, variable: &str, index: usize) -> StoreResult<Raster>;
}

/// Write access to a time-series store.
///
/// Writes at `index == time_len()` grow the time axis by one.
pub trait SliceStore: SliceSource {
    fn write_time(&mut self, index: usize, offset: f64) -> StoreResult<()>;

    fn write_slice(&mut self, variable: &str, index: usize, raster: &Raster) -> StoreResult<()>;
}

/// Fail with `ShapeMismatch` unless `raster` covers `variable`'s extent exactly.
pub fn check_shape<S: SliceSource + ?Sized>(
    store: &S,
    variable: &str,
    raster: &Raster,
) -> StoreResult<()> {
    let expected = store.spatial_shape(variable)?;
    if raster.shape() != expected {
        return Err(StoreError::ShapeMismatch {
            variable: variable.to_string(),
            expected,
            found: raster.shape(),
        });
    }
    Ok(())
}
