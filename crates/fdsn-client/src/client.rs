//! HTTP client for the event service.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode, Url};
use tempfile::Builder;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::error::{FetchError, FetchResult};
use crate::query::EventQuery;

/// USGS FDSN event query endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://earthquake.usgs.gov/fdsnws/event/1/query";

/// Configuration for [`EventClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Event query endpoint URL
    pub endpoint: String,
    /// Overall request timeout, connect to last body byte; `None` (the
    /// default) waits indefinitely
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: None,
            user_agent: concat!("quake-grid/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Result of one request to the event service.
///
/// Only `200 OK` is a success carrying the raw body. Everything else,
/// including other 2xx codes such as the `204 No Content` an FDSN service
/// sends when no events match, is a failure carrying only the status; its
/// body is not read.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum FetchOutcome {
    Success { status: StatusCode, body: Bytes },
    Failure { status: StatusCode },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn status(&self) -> StatusCode {
        match self {
            FetchOutcome::Success { status, .. } | FetchOutcome::Failure { status } => *status,
        }
    }

    /// Response body, present only on success.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            FetchOutcome::Success { body, .. } => Some(body),
            FetchOutcome::Failure { .. } => None,
        }
    }
}

/// Client for an FDSN event query endpoint.
#[derive(Debug, Clone)]
pub struct EventClient {
    http: Client,
    endpoint: Url,
}

impl EventClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> FetchResult<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            FetchError::Config(format!("invalid endpoint '{}': {e}", config.endpoint))
        })?;

        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(FetchError::Client)?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// The exact URL a fetch of `query` would request.
    pub fn request_url(&self, query: &EventQuery) -> FetchResult<Url> {
        let request = self
            .http
            .get(self.endpoint.clone())
            .query(query)
            .build()
            .map_err(|e| FetchError::InvalidQuery(e.to_string()))?;
        Ok(request.url().clone())
    }

    /// Issue one GET for `query`.
    ///
    /// Any status other than `200 OK` is returned as
    /// [`FetchOutcome::Failure`], not as an error. There are no retries.
    #[instrument(skip(self, query), fields(endpoint = %self.endpoint))]
    pub async fn fetch(&self, query: &EventQuery) -> FetchResult<FetchOutcome> {
        let url = self.request_url(query)?;
        debug!(url = %url, "Querying event service");

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = %status, "Event service did not return data");
            return Ok(FetchOutcome::Failure { status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        info!(status = %status, bytes = body.len(), "Received event data");
        Ok(FetchOutcome::Success { status, body })
    }

    /// Fetch `query` and, on success only, save the body to `path`.
    ///
    /// On failure nothing is written and any existing file at `path` is
    /// left as it was.
    #[instrument(skip(self, query), fields(path = %path.as_ref().display()))]
    pub async fn fetch_to_file(
        &self,
        query: &EventQuery,
        path: impl AsRef<Path>,
    ) -> FetchResult<FetchOutcome> {
        let outcome = self.fetch(query).await?;
        if let FetchOutcome::Success { body, .. } = &outcome {
            write_body(path.as_ref(), body).await?;
        }
        Ok(outcome)
    }
}

/// Write `body` to `path` byte for byte, replacing any existing file.
///
/// Parent directories are created as needed. The body goes to a uniquely
/// named `<name>.*.partial` file next to the destination, which is then
/// renamed into place; the temporary file is removed if anything fails.
pub async fn write_body(path: impl AsRef<Path>, body: &[u8]) -> FetchResult<()> {
    let path = path.as_ref();
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent, e))?;
            parent.to_path_buf()
        }
        None => PathBuf::from("."),
    };

    let dest = path.to_path_buf();
    let data = body.to_vec();
    tokio::task::spawn_blocking(move || persist_body(&parent, &dest, &data))
        .await
        .map_err(|e| FetchError::io(path, std::io::Error::new(std::io::ErrorKind::Other, e)))??;

    info!(path = %path.display(), bytes = body.len(), "Saved response body");
    Ok(())
}

fn persist_body(dir: &Path, path: &Path, body: &[u8]) -> FetchResult<()> {
    let mut prefix = path.file_name().unwrap_or_default().to_owned();
    prefix.push(".");
    let mut temp = Builder::new()
        .prefix(&prefix)
        .suffix(".partial")
        .tempfile_in(dir)
        .map_err(|e| FetchError::io(dir, e))?;
    temp.write_all(body)
        .map_err(|e| FetchError::io(temp.path(), e))?;
    debug!(temp = %temp.path().display(), "Wrote partial file");
    temp.persist(path).map_err(|e| FetchError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EventClient {
        EventClient::new(ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_request_url_carries_query() {
        let url = client().request_url(&EventQuery::default()).unwrap();
        assert_eq!(url.host_str(), Some("earthquake.usgs.gov"));
        assert_eq!(url.path(), "/fdsnws/event/1/query");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let names: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            [
                "starttime",
                "endtime",
                "minlatitude",
                "maxlatitude",
                "minlongitude",
                "maxlongitude",
                "minmagnitude",
                "orderby",
                "format"
            ]
        );

        let value = |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_eq!(value("starttime"), "2017-09-08T04:30:00");
        assert_eq!(value("endtime"), "2017-09-11T04:30:00");
        assert_eq!(value("minlatitude").parse::<f64>().unwrap(), 12.5);
        assert_eq!(value("maxlongitude").parse::<f64>().unwrap(), -91.0);
        assert_eq!(value("orderby"), "time-asc");
        assert_eq!(value("format"), "geojson");
    }

    #[test]
    fn test_request_url_optional_fields() {
        let query = EventQuery {
            limit: Some(20),
            max_magnitude: Some(9.5),
            ..EventQuery::default()
        };
        let url = client().request_url(&query).unwrap();
        let query_string = url.query().unwrap();
        assert!(query_string.contains("limit=20"));
        assert!(query_string.contains("maxmagnitude=9.5"));
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = ClientConfig {
            endpoint: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(EventClient::new(config), Err(FetchError::Config(_))));
    }

    #[test]
    fn test_default_config_has_no_timeout() {
        assert_eq!(ClientConfig::default().request_timeout, None);
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = FetchOutcome::Success {
            status: StatusCode::OK,
            body: Bytes::from_static(b"{}"),
        };
        assert!(ok.is_success());
        assert_eq!(ok.body().map(|b| b.as_ref()), Some(&b"{}"[..]));

        let failed = FetchOutcome::Failure {
            status: StatusCode::NOT_FOUND,
        };
        assert!(!failed.is_success());
        assert_eq!(failed.status(), StatusCode::NOT_FOUND);
        assert!(failed.body().is_none());
    }

    #[test]
    fn test_write_body_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("html").join("data").join("events.geojson");
        tokio_test::block_on(write_body(&path, b"{\"features\":[]}")).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"{\"features\":[]}");
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_body_leaves_foreign_partial_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.geojson");
        let other = dir.path().join("events.geojson.partial");
        std::fs::write(&other, b"someone else's download").unwrap();

        tokio_test::block_on(write_body(&path, b"[]")).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"[]");
        assert_eq!(std::fs::read(&other).unwrap(), b"someone else's download");
    }

    #[test]
    fn test_write_body_rename_failure_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let path = dir.path().join("events.geojson");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = tokio_test::block_on(write_body(&path, b"[]")).unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert!(path.join("keep").exists());
    }
}
