//! Loading event queries from YAML files.
//!
//! A query file uses the service's parameter names (or the field names of
//! [`EventQuery`]); anything it leaves out keeps its default:
//!
//! ```yaml
//! starttime: 2017-09-08T04:30:00
//! endtime: 2017-09-11T04:30:00
//! minmagnitude: 6
//! orderby: magnitude
//! ```

use std::path::Path;

use tracing::{debug, info};

use crate::error::{FetchError, FetchResult};
use crate::query::EventQuery;

/// Load a query from a YAML file.
pub fn load_query(path: impl AsRef<Path>) -> FetchResult<EventQuery> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Loading query file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| FetchError::Config(format!("failed to read {}: {e}", path.display())))?;
    let query = parse_query(&contents)
        .map_err(|e| FetchError::Config(format!("{}: {e}", path.display())))?;

    info!(
        path = %path.display(),
        start = %query.start_time,
        end = %query.end_time,
        "Loaded query"
    );
    Ok(query)
}

/// Parse a query from YAML text.
pub fn parse_query(yaml: &str) -> Result<EventQuery, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}
