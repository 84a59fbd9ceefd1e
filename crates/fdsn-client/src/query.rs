//! Event query parameters.
//!
//! Field names serialize to the FDSN event service parameter names, so an
//! [`EventQuery`] can be handed directly to `reqwest`'s query encoder or
//! read from a YAML file.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use geo_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::error::{FetchError, FetchResult};

/// Format used for timestamps on the wire.
pub const WIRE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Sort order of returned events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderBy {
    /// Newest first
    #[serde(rename = "time")]
    Time,
    /// Oldest first
    #[default]
    #[serde(rename = "time-asc")]
    TimeAsc,
    /// Largest first
    #[serde(rename = "magnitude")]
    Magnitude,
    /// Smallest first
    #[serde(rename = "magnitude-asc")]
    MagnitudeAsc,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Time => "time",
            OrderBy::TimeAsc => "time-asc",
            OrderBy::Magnitude => "magnitude",
            OrderBy::MagnitudeAsc => "magnitude-asc",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "time" => Ok(OrderBy::Time),
            "time-asc" => Ok(OrderBy::TimeAsc),
            "magnitude" => Ok(OrderBy::Magnitude),
            "magnitude-asc" => Ok(OrderBy::MagnitudeAsc),
            other => Err(FetchError::InvalidQuery(format!("unknown orderby '{other}'"))),
        }
    }
}

/// Response body format requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Geojson,
    Csv,
    Kml,
    Quakeml,
    Text,
    Xml,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseFormat::Geojson => "geojson",
            ResponseFormat::Csv => "csv",
            ResponseFormat::Kml => "kml",
            ResponseFormat::Quakeml => "quakeml",
            ResponseFormat::Text => "text",
            ResponseFormat::Xml => "xml",
        }
    }

    /// Conventional file extension for bodies in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ResponseFormat::Geojson => "geojson",
            ResponseFormat::Csv => "csv",
            ResponseFormat::Kml => "kml",
            ResponseFormat::Quakeml | ResponseFormat::Xml => "xml",
            ResponseFormat::Text => "txt",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "geojson" => Ok(ResponseFormat::Geojson),
            "csv" => Ok(ResponseFormat::Csv),
            "kml" => Ok(ResponseFormat::Kml),
            "quakeml" => Ok(ResponseFormat::Quakeml),
            "text" => Ok(ResponseFormat::Text),
            "xml" => Ok(ResponseFormat::Xml),
            other => Err(FetchError::InvalidQuery(format!("unknown format '{other}'"))),
        }
    }
}

/// Search window and filters for an event query.
///
/// Missing fields in a deserialized query take their values from
/// [`EventQuery::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventQuery {
    #[serde(rename = "starttime", alias = "start_time", with = "wire_time")]
    pub start_time: NaiveDateTime,
    #[serde(rename = "endtime", alias = "end_time", with = "wire_time")]
    pub end_time: NaiveDateTime,
    #[serde(rename = "minlatitude", alias = "min_latitude")]
    pub min_latitude: f64,
    #[serde(rename = "maxlatitude", alias = "max_latitude")]
    pub max_latitude: f64,
    #[serde(rename = "minlongitude", alias = "min_longitude")]
    pub min_longitude: f64,
    #[serde(rename = "maxlongitude", alias = "max_longitude")]
    pub max_longitude: f64,
    #[serde(rename = "minmagnitude", alias = "min_magnitude")]
    pub min_magnitude: f64,
    #[serde(
        rename = "maxmagnitude",
        alias = "max_magnitude",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_magnitude: Option<f64>,
    /// Maximum number of events returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(rename = "orderby", alias = "order_by")]
    pub order_by: OrderBy,
    pub format: ResponseFormat,
}

impl Default for EventQuery {
    /// Magnitude 5+ events off the coast of Chiapas, 8-11 September 2017.
    fn default() -> Self {
        Self {
            start_time: at(2017, 9, 8, 4, 30),
            end_time: at(2017, 9, 11, 4, 30),
            min_latitude: 12.5,
            max_latitude: 18.0,
            min_longitude: -103.0,
            max_longitude: -91.0,
            min_magnitude: 5.0,
            max_magnitude: None,
            limit: None,
            order_by: OrderBy::TimeAsc,
            format: ResponseFormat::Geojson,
        }
    }
}

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, min, 0))
        .unwrap_or_default()
}

impl EventQuery {
    /// The geographic window as a bounding box (x = longitude, y = latitude).
    pub fn extent(&self) -> BoundingBox {
        BoundingBox::new(
            self.min_longitude,
            self.min_latitude,
            self.max_longitude,
            self.max_latitude,
        )
    }

    /// Same query over a different geographic window.
    pub fn with_extent(mut self, bbox: BoundingBox) -> Self {
        self.min_longitude = bbox.min_x;
        self.min_latitude = bbox.min_y;
        self.max_longitude = bbox.max_x;
        self.max_latitude = bbox.max_y;
        self
    }

    /// Same query over a different time window.
    pub fn with_window(mut self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    /// Sanity-check the query before sending it.
    ///
    /// The client itself sends queries as given; this is for callers that
    /// want to refuse obviously malformed input up front.
    pub fn validate(&self) -> FetchResult<()> {
        if self.start_time >= self.end_time {
            return Err(FetchError::InvalidQuery(format!(
                "start time {} is not before end time {}",
                self.start_time.format(WIRE_TIME_FORMAT),
                self.end_time.format(WIRE_TIME_FORMAT)
            )));
        }
        self.extent()
            .validate_geographic()
            .map_err(|e| FetchError::InvalidQuery(e.to_string()))?;
        if let Some(max) = self.max_magnitude {
            if max < self.min_magnitude {
                return Err(FetchError::InvalidQuery(format!(
                    "max magnitude {max} is below min magnitude {}",
                    self.min_magnitude
                )));
            }
        }
        if self.limit == Some(0) {
            return Err(FetchError::InvalidQuery("limit must be positive".to_string()));
        }
        Ok(())
    }
}

/// Parse a timestamp given as `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_timestamp(s: &str) -> FetchResult<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, WIRE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| FetchError::InvalidQuery(format!("invalid timestamp '{s}'")))
}

mod wire_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{parse_timestamp, WIRE_TIME_FORMAT};

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(WIRE_TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_timestamp(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_is_valid() {
        let query = EventQuery::default();
        assert!(query.validate().is_ok());
        assert_eq!(
            query.start_time.format(WIRE_TIME_FORMAT).to_string(),
            "2017-09-08T04:30:00"
        );
    }

    #[test]
    fn test_extent_round_trip() {
        let query = EventQuery::default();
        let bbox = query.extent();
        assert_eq!(bbox, BoundingBox::new(-103.0, 12.5, -91.0, 18.0));
        assert_eq!(EventQuery::default().with_extent(bbox), query);
    }

    #[test]
    fn test_validate_rejects_reversed_window() {
        let query = EventQuery::default();
        let reversed = query.clone().with_window(query.end_time, query.start_time);
        assert!(matches!(reversed.validate(), Err(FetchError::InvalidQuery(_))));
    }

    #[test]
    fn test_validate_rejects_bad_latitude() {
        let query = EventQuery {
            max_latitude: 95.0,
            ..EventQuery::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_magnitude_range() {
        let query = EventQuery {
            max_magnitude: Some(4.0),
            ..EventQuery::default()
        };
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_order_and_format_parse() {
        assert_eq!("magnitude-asc".parse::<OrderBy>().unwrap(), OrderBy::MagnitudeAsc);
        assert_eq!("QuakeML".parse::<ResponseFormat>().unwrap(), ResponseFormat::Quakeml);
        assert!("newest".parse::<OrderBy>().is_err());
        assert_eq!(ResponseFormat::Text.extension(), "txt");
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let full = parse_timestamp("2017-09-08T04:30:00").unwrap();
        let spaced = parse_timestamp("2017-09-08 04:30:00").unwrap();
        assert_eq!(full, spaced);
        assert_eq!(
            parse_timestamp("2017-09-08").unwrap(),
            at(2017, 9, 8, 0, 0)
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_serializes_wire_names() {
        let json = serde_json::to_value(EventQuery::default()).unwrap();
        assert_eq!(json["starttime"], "2017-09-08T04:30:00");
        assert_eq!(json["orderby"], "time-asc");
        assert_eq!(json["format"], "geojson");
        assert!(json.get("limit").is_none());
        assert!(json.get("maxmagnitude").is_none());
    }
}
