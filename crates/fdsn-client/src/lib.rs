//! Client for FDSN event web services.
//!
//! Sends one event query to an FDSN `event/1/query` endpoint (the USGS
//! earthquake catalog by default) and optionally saves the response body to
//! disk. The body is treated as opaque bytes.
//!
//! ```no_run
//! use fdsn_client::{ClientConfig, EventClient, EventQuery, FetchOutcome};
//!
//! # async fn run() -> Result<(), fdsn_client::FetchError> {
//! let client = EventClient::new(ClientConfig::default())?;
//! match client
//!     .fetch_to_file(&EventQuery::default(), "html/data/earthquakes.geojson")
//!     .await?
//! {
//!     FetchOutcome::Success { body, .. } => println!("saved {} bytes", body.len()),
//!     FetchOutcome::Failure { status } => eprintln!("service answered {status}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod query;

pub use client::{write_body, ClientConfig, EventClient, FetchOutcome, DEFAULT_ENDPOINT};
pub use config::load_query;
pub use error::{FetchError, FetchResult};
pub use query::{parse_timestamp, EventQuery, OrderBy, ResponseFormat};
