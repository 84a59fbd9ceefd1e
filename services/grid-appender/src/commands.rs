//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use netcdf_timeseries::{
    append, create_store, NetcdfReader, Raster, SliceSource, StoreLayout,
};
use tracing::{info, warn};

use crate::synthetic::SliceGenerator;

/// Options shaping a new store.
#[derive(clap::Args, Debug, Clone)]
pub struct LayoutArgs {
    /// YAML layout file; flags below override its values
    #[arg(long)]
    pub layout: Option<PathBuf>,

    /// Number of columns
    #[arg(long)]
    pub width: Option<usize>,

    /// Number of rows
    #[arg(long)]
    pub height: Option<usize>,

    /// Data variable name (repeat for several)
    #[arg(long = "variable")]
    pub variables: Vec<String>,

    /// Time units, e.g. "days since 1970-01-01 00:00:00"
    #[arg(long)]
    pub units: Option<String>,

    /// CF calendar of the time axis
    #[arg(long)]
    pub calendar: Option<String>,

    /// zlib level for data variables (0-9)
    #[arg(long)]
    pub deflate: Option<i32>,
}

impl LayoutArgs {
    pub fn to_layout(&self) -> Result<StoreLayout> {
        let mut layout = match &self.layout {
            Some(path) => load_layout(path)?,
            None => StoreLayout::default(),
        };
        if let Some(width) = self.width {
            layout.width = width;
        }
        if let Some(height) = self.height {
            layout.height = height;
        }
        if !self.variables.is_empty() {
            layout.variables = self.variables.clone();
        }
        if let Some(units) = &self.units {
            layout.time_units = units.clone();
        }
        if let Some(calendar) = &self.calendar {
            layout.calendar = calendar.clone();
        }
        if self.deflate.is_some() {
            layout.deflate_level = self.deflate;
        }
        layout.validate()?;
        Ok(layout)
    }
}

fn load_layout(path: &Path) -> Result<StoreLayout> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout file {}", path.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse layout file {}", path.display()))
}

pub fn create(path: &Path, layout: &StoreLayout) -> Result<()> {
    create_store(path, layout)
        .with_context(|| format!("Failed to create store {}", path.display()))?;
    info!(path = %path.display(), "Store ready");
    Ok(())
}

/// How the appended slice is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SliceFill {
    Constant(f32),
    Random(Option<u64>),
}

/// Append one slice shaped like `variable` and return its index.
pub fn append_one(
    path: &Path,
    variable: &str,
    timestamp: NaiveDateTime,
    fill: SliceFill,
) -> Result<usize> {
    let (rows, cols) = NetcdfReader::open(path)?.spatial_shape(variable)?;
    let raster = match fill {
        SliceFill::Constant(value) => Raster::filled(cols, rows, value),
        SliceFill::Random(seed) => SliceGenerator::new(seed).next_raster(cols, rows)?,
    };
    let index = append(path, variable, &raster, timestamp)
        .with_context(|| format!("Failed to append to {}", path.display()))?;
    Ok(index)
}

/// Parameters of a simulated series.
#[derive(Debug, Clone)]
pub struct Simulation {
    pub steps: usize,
    pub start: NaiveDateTime,
    pub step: Duration,
    pub seed: Option<u64>,
    /// Append to an existing store instead of recreating it
    pub keep: bool,
}

impl Simulation {
    /// Timestamp of step `i`, or an error if it falls outside chrono's range.
    pub fn timestamp(&self, i: usize) -> Result<NaiveDateTime> {
        i32::try_from(i)
            .ok()
            .and_then(|i| self.step.checked_mul(i))
            .and_then(|offset| self.start.checked_add_signed(offset))
            .with_context(|| {
                format!(
                    "Step {i} of {} from {} is out of the representable time range",
                    self.step, self.start
                )
            })
    }
}

/// Variable and `(rows, cols)` the simulated slices are written to.
///
/// An existing store decides both; the layout's first variable is used when
/// the store has it, otherwise the store's first data variable.
fn simulation_target(path: &Path, layout: &StoreLayout) -> Result<(String, usize, usize)> {
    let reader = NetcdfReader::open(path)?;
    let variables = reader.data_variables()?;
    let variable = layout
        .variables
        .iter()
        .find(|v| variables.contains(*v))
        .or_else(|| variables.first())
        .cloned()
        .with_context(|| format!("Store {} has no data variable", path.display()))?;
    let (rows, cols) = reader.spatial_shape(&variable)?;
    Ok((variable, rows, cols))
}

/// Append `steps` random slices to one variable of the store and return the
/// resulting time axis length.
pub fn simulate(path: &Path, layout: &StoreLayout, sim: &Simulation) -> Result<usize> {
    if let Some(last) = sim.steps.checked_sub(1) {
        sim.timestamp(last)?;
    }
    if !sim.keep || !path.exists() {
        create(path, layout)?;
    }
    let (variable, rows, cols) = simulation_target(path, layout)?;

    let mut generator = SliceGenerator::new(sim.seed);
    for i in 0..sim.steps {
        let timestamp = sim.timestamp(i)?;
        let raster = generator.next_raster(cols, rows)?;
        append(path, &variable, &raster, timestamp)
            .with_context(|| format!("Failed to append step {i}"))?;
    }

    let length = NetcdfReader::open(path)?.time_len()?;
    info!(
        path = %path.display(),
        variable = %variable,
        steps = sim.steps,
        length,
        "Simulation complete"
    );
    Ok(length)
}

/// Summary of a store's time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    pub length: usize,
    pub units: String,
    pub calendar: String,
    pub variables: Vec<String>,
    pub times: Vec<f64>,
    /// Decoded times; empty when the calendar cannot be decoded
    pub timestamps: Vec<NaiveDateTime>,
}

pub fn inspect(path: &Path) -> Result<Inventory> {
    let reader = NetcdfReader::open(path)?;
    let axis = reader.time_axis()?;
    let times = reader.read_times()?;
    let timestamps = match times
        .iter()
        .map(|t| axis.decode(*t))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(timestamps) => timestamps,
        Err(e) => {
            warn!(error = %e, "Time axis cannot be decoded");
            Vec::new()
        }
    };

    let inventory = Inventory {
        length: reader.time_len()?,
        units: axis.units.to_string(),
        calendar: axis.calendar.to_string(),
        variables: reader.data_variables()?,
        times,
        timestamps,
    };

    info!(
        path = %path.display(),
        length = inventory.length,
        units = %inventory.units,
        calendar = %inventory.calendar,
        variables = ?inventory.variables,
        "Store time axis"
    );
    for (index, timestamp) in inventory.timestamps.iter().enumerate() {
        info!(index, offset = inventory.times[index], %timestamp, "Time step");
    }
    Ok(inventory)
}
