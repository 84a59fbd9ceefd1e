//! Append-only time-series stores in CF-style NetCDF files.
//!
//! A store is a NetCDF-4 file with an unlimited `time` dimension and one or
//! more gridded `f32` variables over `(time, y, x)`. Appending a slice
//! writes the encoded timestamp and the 2D grid at index `n`, where `n` is
//! the current length of the time axis, which grows by one.
//!
//! ```no_run
//! use netcdf_timeseries::{append, create_store, cftime::parse_datetime, Raster, StoreLayout};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = StoreLayout::default().with_size(300, 200);
//! create_store("chlor_a.nc", &layout)?;
//!
//! let slice = Raster::filled(300, 200, 0.25);
//! let index = append("chlor_a.nc", "chlor_a", &slice, parse_datetime("1987-11-21")?)?;
//! assert_eq!(index, 0);
//! # Ok(())
//! # }
//! ```
//!
//! The index is derived from the time axis on every call. Nothing guards
//! against two writers appending to the same file at once; see
//! [`commit_append`] for the check that detects it after the fact.

pub mod append;
pub mod cftime;
pub mod error;
mod hdf5;
pub mod layout;
pub mod raster;
pub mod store;

pub use append::{
    append, append_record, append_record_to, append_slice, commit_append, plan_append,
    read_slice, read_timestamps, read_times, AppendPlan,
};
pub use cftime::{Calendar, TimeError, TimeUnits};
pub use error::{StoreError, StoreResult};
pub use layout::{create_store, StoreLayout};
pub use raster::Raster;
pub use store::{MemoryStore, NetcdfReader, NetcdfStore, SliceSource, SliceStore, TimeAxis};
