//! Store layout and creation.
//!
//! A store holds two fixed spatial dimensions (`y` rows, `x` columns), one
//! unlimited `time` dimension with its coordinate variable, one `f32` data
//! variable per name over `(time, y, x)`, and a scalar grid-mapping variable
//! carrying the CRS and geo-transform. Append never touches the grid
//! mapping after creation.

use std::collections::HashSet;
use std::path::Path;

use geo_common::{CfAttribute, CrsDefinition, GeoTransform};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::cftime::{Calendar, TimeUnits};
use crate::error::{NetcdfContext, StoreError, StoreResult};
use crate::hdf5::silence_hdf5_errors;
use crate::store::{TIME_VARIABLE, X_DIMENSION, Y_DIMENSION};

/// Global `Conventions` attribute written on new stores.
pub const CONVENTIONS: &str = "CF-1.8";

/// Everything needed to create an empty store.
///
/// Fields missing from a deserialized layout take their values from
/// [`StoreLayout::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreLayout {
    /// Number of columns (`x` dimension)
    pub width: usize,
    /// Number of rows (`y` dimension)
    pub height: usize,
    /// Data variables sharing the time axis
    pub variables: Vec<String>,
    /// CF `units` of the time axis
    pub time_units: String,
    /// CF `calendar` of the time axis
    pub calendar: String,
    /// zlib level for data variables; `None` stores them uncompressed
    pub deflate_level: Option<i32>,
    /// Name of the grid-mapping variable
    pub grid_mapping: String,
    pub crs: CrsDefinition,
    pub transform: GeoTransform,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            width: 3000,
            height: 2000,
            variables: vec!["chlor_a".to_string()],
            time_units: "days since 1970-01-01 00:00:00".to_string(),
            calendar: "gregorian".to_string(),
            deflate_level: Some(4),
            grid_mapping: "laea".to_string(),
            crs: CrsDefinition::default(),
            transform: GeoTransform::from_affine(1000.0, 0.0, 0.0, 0.0, -1000.0, 0.0),
        }
    }
}

impl StoreLayout {
    /// Same layout with a different grid size.
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Same layout with a different set of data variables.
    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    /// Same layout with a different time axis encoding.
    pub fn with_time_encoding(mut self, units: impl Into<String>, calendar: impl Into<String>) -> Self {
        self.time_units = units.into();
        self.calendar = calendar.into();
        self
    }

    /// Validate the layout.
    pub fn validate(&self) -> StoreResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(StoreError::InvalidLayout(format!(
                "grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.variables.is_empty() {
            return Err(StoreError::InvalidLayout(
                "at least one data variable is required".to_string(),
            ));
        }

        let reserved = [
            TIME_VARIABLE,
            X_DIMENSION,
            Y_DIMENSION,
            self.grid_mapping.as_str(),
        ];
        let mut seen = HashSet::new();
        for name in &self.variables {
            if name.is_empty() || reserved.contains(&name.as_str()) {
                return Err(StoreError::InvalidLayout(format!(
                    "'{name}' cannot be used as a data variable name"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(StoreError::InvalidLayout(format!(
                    "data variable '{name}' listed twice"
                )));
            }
        }

        if let Some(level) = self.deflate_level {
            if !(0..=9).contains(&level) {
                return Err(StoreError::InvalidLayout(format!(
                    "deflate level must be 0-9, got {level}"
                )));
            }
        }

        self.time_units.parse::<TimeUnits>()?;
        self.calendar.parse::<Calendar>()?;
        Ok(())
    }
}

/// Create a new, empty store at `path`, replacing any existing file.
#[instrument(skip(layout), fields(path = %path.as_ref().display()))]
pub fn create_store(path: impl AsRef<Path>, layout: &StoreLayout) -> StoreResult<()> {
    layout.validate()?;
    silence_hdf5_errors();

    let path = path.as_ref();
    let mut file = netcdf::create(path).nc_context(&format!("creating {}", path.display()))?;

    // Spatial and temporal dimensions
    file.add_dimension(X_DIMENSION, layout.width)
        .nc_context("adding x dimension")?;
    file.add_dimension(Y_DIMENSION, layout.height)
        .nc_context("adding y dimension")?;
    file.add_unlimited_dimension(TIME_VARIABLE)
        .nc_context("adding time dimension")?;

    {
        let mut time = file
            .add_variable::<f64>(TIME_VARIABLE, &[TIME_VARIABLE])
            .nc_context("adding time variable")?;
        time.put_attribute("standard_name", "time")
            .nc_context("writing time attributes")?;
        time.put_attribute("long_name", "time")
            .nc_context("writing time attributes")?;
        time.put_attribute("units", layout.time_units.as_str())
            .nc_context("writing time attributes")?;
        time.put_attribute("calendar", layout.calendar.as_str())
            .nc_context("writing time attributes")?;
        time.put_attribute("axis", "T")
            .nc_context("writing time attributes")?;
    }

    // Coordinate variables only make sense without rotation terms
    if layout.transform.is_north_up() {
        let geographic = layout.crs.is_geographic();
        let xs: Vec<f64> = (0..layout.width)
            .map(|col| layout.transform.pixel_center(col, 0).0)
            .collect();
        let ys: Vec<f64> = (0..layout.height)
            .map(|row| layout.transform.pixel_center(0, row).1)
            .collect();

        let axes = [
            (
                X_DIMENSION,
                xs,
                if geographic { "longitude" } else { "projection_x_coordinate" },
                if geographic { "degrees_east" } else { "m" },
            ),
            (
                Y_DIMENSION,
                ys,
                if geographic { "latitude" } else { "projection_y_coordinate" },
                if geographic { "degrees_north" } else { "m" },
            ),
        ];
        for (name, values, standard_name, units) in axes {
            let mut coord = file
                .add_variable::<f64>(name, &[name])
                .nc_context("adding coordinate variable")?;
            coord
                .put_attribute("standard_name", standard_name)
                .nc_context("writing coordinate attributes")?;
            coord
                .put_attribute("units", units)
                .nc_context("writing coordinate attributes")?;
            coord
                .put_values(&values, ..)
                .nc_context("writing coordinate values")?;
        }
    }

    for name in &layout.variables {
        let mut var = file
            .add_variable::<f32>(name, &[TIME_VARIABLE, Y_DIMENSION, X_DIMENSION])
            .nc_context(&format!("adding variable {name}"))?;
        var.set_chunking(&[1, layout.height, layout.width])
            .nc_context(&format!("chunking {name}"))?;
        if let Some(level) = layout.deflate_level {
            var.set_compression(level, true)
                .nc_context(&format!("compressing {name}"))?;
        }
        var.set_fill_value(f32::NAN)
            .nc_context(&format!("setting fill value of {name}"))?;
        var.put_attribute("grid_mapping", layout.grid_mapping.as_str())
            .nc_context(&format!("writing attributes of {name}"))?;
    }

    {
        let mut crs = file
            .add_variable::<i32>(&layout.grid_mapping, &[])
            .nc_context("adding grid mapping variable")?;
        crs.put_attribute("long_name", "CRS definition")
            .nc_context("writing grid mapping")?;
        crs.put_attribute("spatial_ref", layout.crs.to_wkt().as_str())
            .nc_context("writing grid mapping")?;
        crs.put_attribute("GeoTransform", layout.transform.to_gdal_string().as_str())
            .nc_context("writing grid mapping")?;
        for attr in layout.crs.cf_attributes() {
            match attr {
                CfAttribute::Text(name, value) => crs.put_attribute(name, value.as_str()),
                CfAttribute::Number(name, value) => crs.put_attribute(name, value),
            }
            .nc_context("writing grid mapping")?;
        }
    }

    file.add_attribute("Conventions", CONVENTIONS)
        .nc_context("writing global attributes")?;

    info!(
        width = layout.width,
        height = layout.height,
        variables = ?layout.variables,
        crs = %layout.crs,
        "Created time-series store"
    );
    Ok(())
}
