//! NetCDF-backed stores.
//!
//! The file handle is owned by the store value and closed by the netcdf
//! library when it is dropped, so every exit path of a scoped
//! open/modify/close cycle releases (flushes and closes) the file.

use std::path::{Path, PathBuf};

use netcdf::AttributeValue;
use tracing::debug;

use super::{SliceSource, SliceStore, TimeAxis, TIME_VARIABLE};
use crate::error::{NetcdfContext, StoreError, StoreResult};
use crate::hdf5::silence_hdf5_errors;
use crate::raster::Raster;

/// Read-only view of a store file.
pub struct NetcdfReader {
    file: netcdf::File,
    path: PathBuf,
}

impl NetcdfReader {
    /// Open an existing store for reading.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        silence_hdf5_errors();
        let path = path.as_ref().to_path_buf();
        let file = netcdf::open(&path).nc_context(&format!("opening {}", path.display()))?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A store file opened for in-place modification.
pub struct NetcdfStore {
    file: netcdf::FileMut,
    path: PathBuf,
}

impl NetcdfStore {
    /// Open an existing store for appending.
    pub fn open_append(path: impl AsRef<Path>) -> StoreResult<Self> {
        silence_hdf5_errors();
        let path = path.as_ref().to_path_buf();
        let file = netcdf::append(&path)
            .nc_context(&format!("opening {} for append", path.display()))?;
        debug!(path = %path.display(), "Opened store for append");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for NetcdfStore {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Releasing store");
    }
}

// =============================================================================
// Read helpers shared by both handles
// =============================================================================

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

fn variable<'f>(file: &'f netcdf::File, name: &str) -> StoreResult<netcdf::Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| StoreError::MissingVariable(name.to_string()))
}

fn string_attr(var: &netcdf::Variable, variable: &str, name: &str) -> StoreResult<String> {
    if !has_attr(var, name) {
        return Err(StoreError::missing_attribute(variable, name));
    }
    let value = var
        .attribute_value(name)
        .ok_or_else(|| StoreError::missing_attribute(variable, name))?
        .nc_context(&format!("reading {variable}:{name}"))?;

    match value {
        AttributeValue::Str(s) => Ok(s),
        other => Err(StoreError::InvalidAttribute {
            variable: variable.to_string(),
            attribute: name.to_string(),
            message: format!("expected text, found {:?}", other),
        }),
    }
}

fn time_axis_of(file: &netcdf::File) -> StoreResult<TimeAxis> {
    let time = variable(file, TIME_VARIABLE)?;
    let units = string_attr(&time, TIME_VARIABLE, "units")?;
    let calendar = string_attr(&time, TIME_VARIABLE, "calendar")?;
    TimeAxis::from_attributes(&units, &calendar)
}

fn time_len_of(file: &netcdf::File) -> StoreResult<usize> {
    let time = variable(file, TIME_VARIABLE)?;
    time.dimensions()
        .first()
        .map(|dim| dim.len())
        .ok_or_else(|| {
            StoreError::InvalidLayout(format!("'{TIME_VARIABLE}' variable has no dimension"))
        })
}

fn spatial_shape_of(file: &netcdf::File, name: &str) -> StoreResult<(usize, usize)> {
    let var = variable(file, name)?;
    let dims = var.dimensions();
    if dims.len() != 3 || dims[0].name() != TIME_VARIABLE {
        return Err(StoreError::InvalidLayout(format!(
            "variable '{name}' is not indexed by ({TIME_VARIABLE}, row, column)"
        )));
    }
    Ok((dims[1].len(), dims[2].len()))
}

fn data_variables_of(file: &netcdf::File) -> Vec<String> {
    file.variables()
        .filter(|var| {
            let dims = var.dimensions();
            dims.len() == 3 && dims[0].name() == TIME_VARIABLE
        })
        .map(|var| var.name())
        .collect()
}

fn read_times_of(file: &netcdf::File) -> StoreResult<Vec<f64>> {
    if time_len_of(file)? == 0 {
        return Ok(Vec::new());
    }
    variable(file, TIME_VARIABLE)?
        .get_values::<f64, _>(..)
        .nc_context("reading time axis")
}

fn read_slice_of(file: &netcdf::File, name: &str, index: usize) -> StoreResult<Raster> {
    let (rows, cols) = spatial_shape_of(file, name)?;
    let len = time_len_of(file)?;
    if index >= len {
        return Err(StoreError::IndexOutOfRange {
            variable: name.to_string(),
            index,
            len,
        });
    }
    let values = variable(file, name)?
        .get_values::<f32, _>(([index, 0, 0], [1, rows, cols]))
        .nc_context(&format!("reading {name}[{index}]"))?;
    Raster::new(cols, rows, values)
}

impl SliceSource for NetcdfReader {
    fn time_axis(&self) -> StoreResult<TimeAxis> {
        time_axis_of(&self.file)
    }

    fn time_len(&self) -> StoreResult<usize> {
        time_len_of(&self.file)
    }

    fn spatial_shape(&self, variable: &str) -> StoreResult<(usize, usize)> {
        spatial_shape_of(&self.file, variable)
    }

    fn data_variables(&self) -> StoreResult<Vec<String>> {
        Ok(data_variables_of(&self.file))
    }

    fn read_times(&self) -> StoreResult<Vec<f64>> {
        read_times_of(&self.file)
    }

    fn read_slice(&self, variable: &str, index: usize) -> StoreResult<Raster> {
        read_slice_of(&self.file, variable, index)
    }
}

impl SliceSource for NetcdfStore {
    fn time_axis(&self) -> StoreResult<TimeAxis> {
        time_axis_of(&self.file)
    }

    fn time_len(&self) -> StoreResult<usize> {
        time_len_of(&self.file)
    }

    fn spatial_shape(&self, variable: &str) -> StoreResult<(usize, usize)> {
        spatial_shape_of(&self.file, variable)
    }

    fn data_variables(&self) -> StoreResult<Vec<String>> {
        Ok(data_variables_of(&self.file))
    }

    fn read_times(&self) -> StoreResult<Vec<f64>> {
        read_times_of(&self.file)
    }

    fn read_slice(&self, variable: &str, index: usize) -> StoreResult<Raster> {
        read_slice_of(&self.file, variable, index)
    }
}

impl SliceStore for NetcdfStore {
    fn write_time(&mut self, index: usize, offset: f64) -> StoreResult<()> {
        let mut time = self
            .file
            .variable_mut(TIME_VARIABLE)
            .ok_or_else(|| StoreError::MissingVariable(TIME_VARIABLE.to_string()))?;
        time.put_value(offset, [index])
            .nc_context(&format!("writing {TIME_VARIABLE}[{index}]"))
    }

    fn write_slice(&mut self, variable: &str, index: usize, raster: &Raster) -> StoreResult<()> {
        let (rows, cols) = spatial_shape_of(&self.file, variable)?;
        if raster.shape() != (rows, cols) {
            return Err(StoreError::ShapeMismatch {
                variable: variable.to_string(),
                expected: (rows, cols),
                found: raster.shape(),
            });
        }
        let mut var = self
            .file
            .variable_mut(variable)
            .ok_or_else(|| StoreError::MissingVariable(variable.to_string()))?;
        var.put_values(raster.values(), ([index, 0, 0], [1, rows, cols]))
            .nc_context(&format!("writing {variable}[{index}]"))
    }
}
