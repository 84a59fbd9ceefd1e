//! Earthquake event fetcher.
//!
//! Queries an FDSN event service (USGS by default) for the events in a time
//! and space window and saves the raw response to a file. The query starts
//! from the built-in default window, is overlaid with an optional YAML query
//! file, then with command line flags.
//!
//! Exits non-zero when the service answers with a non-success status; the
//! output file is not touched in that case.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use fdsn_client::{
    load_query, parse_timestamp, ClientConfig, EventClient, EventQuery, FetchOutcome, OrderBy,
    ResponseFormat, DEFAULT_ENDPOINT,
};
use geo_common::BoundingBox;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "quake-fetcher")]
#[command(about = "Download earthquake events from an FDSN event service")]
struct Args {
    /// YAML query file (FDSN parameter names)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start of the time window (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS, UTC)
    #[arg(long, value_parser = parse_time)]
    start: Option<NaiveDateTime>,

    /// End of the time window
    #[arg(long, value_parser = parse_time)]
    end: Option<NaiveDateTime>,

    #[arg(long, allow_negative_numbers = true)]
    min_lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    max_lat: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    min_lon: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    max_lon: Option<f64>,

    /// Geographic window as minlon,minlat,maxlon,maxlat
    #[arg(long, allow_hyphen_values = true, conflicts_with_all = ["min_lat", "max_lat", "min_lon", "max_lon"])]
    bbox: Option<String>,

    #[arg(long, allow_negative_numbers = true)]
    min_magnitude: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    max_magnitude: Option<f64>,

    /// Maximum number of events
    #[arg(long)]
    limit: Option<u32>,

    /// time, time-asc, magnitude or magnitude-asc
    #[arg(long)]
    order_by: Option<OrderBy>,

    /// geojson, csv, kml, quakeml, text or xml
    #[arg(long)]
    format: Option<ResponseFormat>,

    /// Destination file for the response body
    #[arg(short, long, env = "FETCH_OUTPUT", default_value = "html/data/earthquakes.geojson")]
    output: PathBuf,

    /// Event query endpoint
    #[arg(long, env = "FDSN_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds (0, the default, waits indefinitely)
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value = "0")]
    timeout_secs: u64,

    /// Print the request URL and exit without fetching
    #[arg(long)]
    print_url: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_time(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).map_err(|e| e.to_string())
}

impl Args {
    /// Build the query: defaults, then the query file, then flags.
    fn query(&self) -> Result<EventQuery> {
        let mut query = match &self.config {
            Some(path) => load_query(path)?,
            None => EventQuery::default(),
        };

        if let Some(start) = self.start {
            query.start_time = start;
        }
        if let Some(end) = self.end {
            query.end_time = end;
        }
        if let Some(bbox) = &self.bbox {
            let bbox = BoundingBox::from_csv(bbox).context("Invalid --bbox")?;
            query = query.with_extent(bbox);
        }
        if let Some(v) = self.min_lat {
            query.min_latitude = v;
        }
        if let Some(v) = self.max_lat {
            query.max_latitude = v;
        }
        if let Some(v) = self.min_lon {
            query.min_longitude = v;
        }
        if let Some(v) = self.max_lon {
            query.max_longitude = v;
        }
        if let Some(v) = self.min_magnitude {
            query.min_magnitude = v;
        }
        if self.max_magnitude.is_some() {
            query.max_magnitude = self.max_magnitude;
        }
        if self.limit.is_some() {
            query.limit = self.limit;
        }
        if let Some(order_by) = self.order_by {
            query.order_by = order_by;
        }
        if let Some(format) = self.format {
            query.format = format;
        }
        Ok(query)
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            request_timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            ..ClientConfig::default()
        }
    }
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

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let query = args.query()?;
    query.validate().context("Refusing to send query")?;

    let client = EventClient::new(args.client_config())?;
    let url = client.request_url(&query)?;

    if args.print_url {
        println!("{url}");
        return Ok(());
    }

    info!(
        url = %url,
        output = %args.output.display(),
        "Fetching earthquake events"
    );

    match client.fetch_to_file(&query, &args.output).await? {
        FetchOutcome::Success { status, body } => {
            info!(
                status = %status,
                bytes = body.len(),
                output = %args.output.display(),
                "Saved earthquake events"
            );
            Ok(())
        }
        FetchOutcome::Failure { status } => {
            error!(status = %status, url = %url, "Event service request failed");
            bail!("event service answered {status}; {} left unchanged", args.output.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("quake-fetcher").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_flags_gives_default_query() {
        let args = parse(&[]);
        assert_eq!(args.query().unwrap(), EventQuery::default());
        assert_eq!(args.client_config().request_timeout, None);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = parse(&[
            "--start",
            "2020-01-01",
            "--min-lat",
            "-10.5",
            "--order-by",
            "magnitude",
            "--format",
            "csv",
            "--limit",
            "10",
        ]);
        let query = args.query().unwrap();
        assert_eq!(query.start_time, parse_timestamp("2020-01-01").unwrap());
        assert_eq!(query.min_latitude, -10.5);
        assert_eq!(query.order_by, OrderBy::Magnitude);
        assert_eq!(query.format, ResponseFormat::Csv);
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn test_bbox_flag() {
        let args = parse(&["--bbox", "-120,30,-110,40"]);
        let query = args.query().unwrap();
        assert_eq!(query.extent(), BoundingBox::new(-120.0, 30.0, -110.0, 40.0));
    }

    #[test]
    fn test_bbox_conflicts_with_bounds() {
        let result = Args::try_parse_from(["quake-fetcher", "--bbox", "0,0,1,1", "--min-lat", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_is_opt_in() {
        let args = parse(&["--timeout-secs", "30"]);
        assert_eq!(args.client_config().request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_negative_magnitudes_accepted() {
        let args = parse(&["--min-magnitude", "-1.5", "--max-magnitude", "-0.5"]);
        let query = args.query().unwrap();
        assert_eq!(query.min_magnitude, -1.5);
        assert_eq!(query.max_magnitude, Some(-0.5));
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        assert!(Args::try_parse_from(["quake-fetcher", "--start", "yesterday"]).is_err());
    }
}
