//! The append algorithm and read-back helpers.
//!
//! Appending a slice is split in two phases. [`plan_append`] reads the time
//! axis descriptors and length, checks the raster shape and encodes the
//! timestamp without writing anything. [`commit_append`] re-reads the axis
//! length, refuses to continue if it moved since planning, then writes the
//! time offset followed by the slice at the planned index.
//!
//! There is no rollback: if the slice write fails after the offset was
//! written, the time axis has grown while the data variable holds fill
//! values at that index.

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::raster::Raster;
use crate::store::{check_shape, NetcdfReader, NetcdfStore, SliceSource, SliceStore};

/// What an append will write, computed without touching the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppendPlan {
    /// Insertion index; the time axis length observed at planning time
    pub index: usize,
    /// Encoded time offset
    pub offset: f64,
    pub timestamp: NaiveDateTime,
}

/// Plan the append of `raster` to `variable` at `timestamp`.
pub fn plan_append<S: SliceSource + ?Sized>(
    store: &S,
    variable: &str,
    raster: &Raster,
    timestamp: NaiveDateTime,
) -> StoreResult<AppendPlan> {
    let axis = store.time_axis()?;
    let index = store.time_len()?;
    check_shape(store, variable, raster)?;
    let offset = axis.encode(timestamp)?;
    Ok(AppendPlan {
        index,
        offset,
        timestamp,
    })
}

fn ensure_unchanged<S: SliceSource + ?Sized>(store: &S, plan: &AppendPlan) -> StoreResult<()> {
    let found = store.time_len()?;
    if found != plan.index {
        return Err(StoreError::ConcurrentModification {
            expected: plan.index,
            found,
        });
    }
    Ok(())
}

/// Carry out `plan`: write the time offset, then the slice, at `plan.index`.
pub fn commit_append<S: SliceStore + ?Sized>(
    store: &mut S,
    variable: &str,
    raster: &Raster,
    plan: &AppendPlan,
) -> StoreResult<()> {
    ensure_unchanged(store, plan)?;
    store.write_time(plan.index, plan.offset)?;
    store.write_slice(variable, plan.index, raster)?;
    debug!(
        variable,
        index = plan.index,
        offset = plan.offset,
        "Committed slice"
    );
    Ok(())
}

/// Append one slice to an open store and return its index.
pub fn append_slice<S: SliceStore + ?Sized>(
    store: &mut S,
    variable: &str,
    raster: &Raster,
    timestamp: NaiveDateTime,
) -> StoreResult<usize> {
    let plan = plan_append(store, variable, raster, timestamp)?;
    commit_append(store, variable, raster, &plan)?;
    Ok(plan.index)
}

/// Append one time step across several variables.
///
/// Every shape is checked before anything is written, so a bad raster
/// leaves the store untouched.
pub fn append_record<S: SliceStore + ?Sized>(
    store: &mut S,
    slices: &[(&str, &Raster)],
    timestamp: NaiveDateTime,
) -> StoreResult<usize> {
    let Some((first_var, first_raster)) = slices.first() else {
        return Err(StoreError::InvalidRaster(
            "a record needs at least one slice".to_string(),
        ));
    };

    let plan = plan_append(store, first_var, first_raster, timestamp)?;
    for (variable, raster) in &slices[1..] {
        check_shape(store, variable, raster)?;
    }

    ensure_unchanged(store, &plan)?;
    store.write_time(plan.index, plan.offset)?;
    for (variable, raster) in slices {
        store.write_slice(variable, plan.index, raster)?;
    }
    debug!(
        variables = slices.len(),
        index = plan.index,
        "Committed record"
    );
    Ok(plan.index)
}

/// Append `raster` to `variable` of the store file at `path`.
///
/// The file is opened for the duration of the call and released on every
/// exit path. Returns the index the slice was written at.
#[instrument(skip(raster), fields(path = %path.as_ref().display()))]
pub fn append(
    path: impl AsRef<Path>,
    variable: &str,
    raster: &Raster,
    timestamp: NaiveDateTime,
) -> StoreResult<usize> {
    let mut store = NetcdfStore::open_append(path.as_ref())?;
    let index = append_slice(&mut store, variable, raster, timestamp)?;
    info!(index, %timestamp, "Appended slice");
    Ok(index)
}

/// Path form of [`append_record`].
#[instrument(skip(slices), fields(path = %path.as_ref().display(), variables = slices.len()))]
pub fn append_record_to(
    path: impl AsRef<Path>,
    slices: &[(&str, &Raster)],
    timestamp: NaiveDateTime,
) -> StoreResult<usize> {
    let mut store = NetcdfStore::open_append(path.as_ref())?;
    let index = append_record(&mut store, slices, timestamp)?;
    info!(index, %timestamp, "Appended record");
    Ok(index)
}

/// Read the slice of `variable` at `index`.
pub fn read_slice(path: impl AsRef<Path>, variable: &str, index: usize) -> StoreResult<Raster> {
    NetcdfReader::open(path)?.read_slice(variable, index)
}

/// Read the raw offsets of the time axis.
pub fn read_times(path: impl AsRef<Path>) -> StoreResult<Vec<f64>> {
    NetcdfReader::open(path)?.read_times()
}

/// Read the time axis decoded to timestamps.
pub fn read_timestamps(path: impl AsRef<Path>) -> StoreResult<Vec<NaiveDateTime>> {
    let reader = NetcdfReader::open(path)?;
    let axis = reader.time_axis()?;
    reader
        .read_times()?
        .into_iter()
        .map(|offset| axis.decode(offset))
        .collect()
}
