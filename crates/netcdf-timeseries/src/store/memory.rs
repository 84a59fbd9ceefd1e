//! In-process store with the same indexing semantics as a NetCDF file.
//!
//! Like an unlimited NetCDF dimension, the time axis grows to cover the
//! highest index written through any variable; positions never written read
//! back as fill values (NaN).

use std::collections::BTreeMap;

use super::{SliceSource, SliceStore, TimeAxis};
use crate::error::{StoreError, StoreResult};
use crate::layout::StoreLayout;
use crate::raster::Raster;

#[derive(Debug, Clone)]
struct MemoryVariable {
    rows: usize,
    cols: usize,
    slices: Vec<Option<Vec<f32>>>,
}

/// A time-series store held in memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    units: Option<String>,
    calendar: Option<String>,
    times: Vec<f64>,
    variables: BTreeMap<String, MemoryVariable>,
}

impl MemoryStore {
    /// An empty store shaped like `layout`.
    pub fn from_layout(layout: &StoreLayout) -> StoreResult<Self> {
        layout.validate()?;
        let variables = layout
            .variables
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    MemoryVariable {
                        rows: layout.height,
                        cols: layout.width,
                        slices: Vec::new(),
                    },
                )
            })
            .collect();
        Ok(Self {
            units: Some(layout.time_units.clone()),
            calendar: Some(layout.calendar.clone()),
            times: Vec::new(),
            variables,
        })
    }

    /// Replace (or with `None`, remove) the raw time attributes.
    pub fn set_time_attributes(&mut self, units: Option<&str>, calendar: Option<&str>) {
        self.units = units.map(str::to_string);
        self.calendar = calendar.map(str::to_string);
    }

    fn grow_to(&mut self, len: usize) {
        if self.times.len() < len {
            self.times.resize(len, f64::NAN);
        }
    }

    fn variable(&self, name: &str) -> StoreResult<&MemoryVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| StoreError::MissingVariable(name.to_string()))
    }
}

impl SliceSource for MemoryStore {
    fn time_axis(&self) -> StoreResult<TimeAxis> {
        let units = self
            .units
            .as_deref()
            .ok_or_else(|| StoreError::missing_attribute(super::TIME_VARIABLE, "units"))?;
        let calendar = self
            .calendar
            .as_deref()
            .ok_or_else(|| StoreError::missing_attribute(super::TIME_VARIABLE, "calendar"))?;
        TimeAxis::from_attributes(units, calendar)
    }

    fn time_len(&self) -> StoreResult<usize> {
        Ok(self.times.len())
    }

    fn spatial_shape(&self, variable: &str) -> StoreResult<(usize, usize)> {
        let var = self.variable(variable)?;
        Ok((var.rows, var.cols))
    }

    fn data_variables(&self) -> StoreResult<Vec<String>> {
        Ok(self.variables.keys().cloned().collect())
    }

    fn read_times(&self) -> StoreResult<Vec<f64>> {
        Ok(self.times.clone())
    }

    fn read_slice(&self, variable: &str, index: usize) -> StoreResult<Raster> {
        let var = self.variable(variable)?;
        if index >= self.times.len() {
            return Err(StoreError::IndexOutOfRange {
                variable: variable.to_string(),
                index,
                len: self.times.len(),
            });
        }
        match var.slices.get(index) {
            Some(Some(values)) => Raster::new(var.cols, var.rows, values.clone()),
            _ => Ok(Raster::filled(var.cols, var.rows, f32::NAN)),
        }
    }
}

impl SliceStore for MemoryStore {
    fn write_time(&mut self, index: usize, offset: f64) -> StoreResult<()> {
        self.grow_to(index + 1);
        self.times[index] = offset;
        Ok(())
    }

    fn write_slice(&mut self, variable: &str, index: usize, raster: &Raster) -> StoreResult<()> {
        let var = self
            .variables
            .get_mut(variable)
            .ok_or_else(|| StoreError::MissingVariable(variable.to_string()))?;
        if raster.shape() != (var.rows, var.cols) {
            return Err(StoreError::ShapeMismatch {
                variable: variable.to_string(),
                expected: (var.rows, var.cols),
                found: raster.shape(),
            });
        }
        if var.slices.len() <= index {
            var.slices.resize(index + 1, None);
        }
        var.slices[index] = Some(raster.values().to_vec());
        self.grow_to(index + 1);
        Ok(())
    }
}
