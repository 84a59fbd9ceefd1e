//! Grid time-series appender.
//!
//! Creates CF-style NetCDF stores with an unlimited time axis and appends
//! gridded slices to them:
//! - `create` lays out an empty store
//! - `append` adds one constant or random slice at a timestamp
//! - `simulate` builds a daily series of random slices
//! - `inspect` reports the time axis of a store

mod commands;
mod synthetic;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use clap::{Parser, Subcommand};
use netcdf_timeseries::cftime::parse_datetime;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use commands::{LayoutArgs, SliceFill, Simulation};

#[derive(Parser, Debug)]
#[command(name = "grid-appender")]
#[command(about = "Create NetCDF time-series stores and append slices to them")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty store, replacing any existing file
    Create {
        /// Store file
        #[arg(long, env = "STORE_PATH")]
        path: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Append one slice to a variable
    Append {
        #[arg(long, env = "STORE_PATH")]
        path: PathBuf,

        #[arg(long, default_value = "chlor_a")]
        variable: String,

        /// Timestamp of the slice (UTC)
        #[arg(long, value_parser = parse_time)]
        time: NaiveDateTime,

        /// Fill every cell with this value
        #[arg(long, conflicts_with = "random", allow_negative_numbers = true)]
        fill: Option<f32>,

        /// Fill with uniform random values (the default)
        #[arg(long)]
        random: bool,

        /// Seed for random values
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Create a store and append a daily series of random slices
    Simulate {
        #[arg(long, env = "STORE_PATH")]
        path: PathBuf,

        #[arg(long, default_value = "50")]
        steps: usize,

        /// Timestamp of the first slice
        #[arg(long, value_parser = parse_time, default_value = "1987-11-21")]
        start: NaiveDateTime,

        /// Days between slices
        #[arg(long, default_value = "1", allow_negative_numbers = true)]
        step_days: i64,

        #[arg(long)]
        seed: Option<u64>,

        /// Append to an existing store instead of recreating it
        #[arg(long)]
        keep: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Report the time axis of a store
    Inspect {
        #[arg(long, env = "STORE_PATH")]
        path: PathBuf,
    },
}

fn parse_time(s: &str) -> Result<NaiveDateTime, String> {
    parse_datetime(s).map_err(|e| e.to_string())
}

fn step_duration(days: i64) -> Result<Duration> {
    Duration::try_days(days).with_context(|| format!("--step-days {days} is out of range"))
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    match args.command {
        Command::Create { path, layout } => {
            commands::create(&path, &layout.to_layout()?)?;
        }
        Command::Append {
            path,
            variable,
            time,
            fill,
            random: _,
            seed,
        } => {
            let fill = match fill {
                Some(value) => SliceFill::Constant(value),
                None => SliceFill::Random(seed),
            };
            let index = commands::append_one(&path, &variable, time, fill)?;
            info!(path = %path.display(), variable = %variable, index, %time, "Appended slice");
        }
        Command::Simulate {
            path,
            steps,
            start,
            step_days,
            seed,
            keep,
            layout,
        } => {
            let sim = Simulation {
                steps,
                start,
                step: step_duration(step_days)?,
                seed,
                keep,
            };
            commands::simulate(&path, &layout.to_layout()?, &sim)?;
        }
        Command::Inspect { path } => {
            commands::inspect(&path)?;
        }
    }
    Ok(())
}
