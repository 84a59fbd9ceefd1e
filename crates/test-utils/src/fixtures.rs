//! Common test fixtures for quake-grid tests.
//!
//! This module provides pre-defined test data that represents common
//! scenarios for the fetcher and the grid appender.

/// Canned FDSN event service responses.
pub mod fdsn {
    /// A minimal GeoJSON FeatureCollection with one event, as the USGS
    /// service returns it.
    pub const GEOJSON_ONE_EVENT: &str = r#"{"type":"FeatureCollection","metadata":{"generated":1505104200000,"url":"https://earthquake.usgs.gov/fdsnws/event/1/query","title":"USGS Earthquakes","status":200,"api":"1.5.8","count":1},"features":[{"type":"Feature","properties":{"mag":8.1,"place":"101km SSW of Tres Picos, Mexico","time":1504846159180,"type":"earthquake","title":"M 8.1 - 101km SSW of Tres Picos, Mexico"},"geometry":{"type":"Point","coordinates":[-93.8993,15.0222,47.39]},"id":"us2000ahv0"}],"bbox":[-93.8993,15.0222,47.39,-93.8993,15.0222,47.39]}"#;

    /// An empty FeatureCollection (no events matched).
    pub const GEOJSON_EMPTY: &str = r#"{"type":"FeatureCollection","metadata":{"count":0},"features":[]}"#;

    /// Body the service sends with a 400 for a malformed query.
    pub const BAD_REQUEST_BODY: &str = "Error 400: Bad Request\n\nBad starttime value \"yesterday\".\n";

    /// Body containing bytes that are not valid UTF-8, to check that bodies
    /// are persisted untouched.
    pub const NON_UTF8_BODY: &[u8] = &[0x7b, 0xff, 0xfe, 0x00, 0x7d, 0x0a];
}

/// Small store dimensions for fast NetCDF tests.
pub mod store {
    /// Columns of the small test grid
    pub const WIDTH: usize = 6;

    /// Rows of the small test grid
    pub const HEIGHT: usize = 4;

    /// Data variable used by single-variable tests
    pub const VARIABLE: &str = "chlor_a";

    /// Second data variable for multi-variable tests
    pub const SECOND_VARIABLE: &str = "sst";

    /// Time units of the reference dataset
    pub const TIME_UNITS: &str = "days since 1970-01-01 00:00:00";

    /// Calendar of the reference dataset
    pub const CALENDAR: &str = "gregorian";
}

/// Common time values for testing.
pub mod time {
    /// First timestamp of the reference series (1987-11-21T00:00:00)
    pub const SERIES_START: &str = "1987-11-21T00:00:00";

    /// `SERIES_START` as days since 1970-01-01
    pub const SERIES_START_DAYS: f64 = 6533.0;

    /// Start of the reference earthquake query window
    pub const QUERY_START: &str = "2017-09-08T04:30:00";

    /// End of the reference earthquake query window
    pub const QUERY_END: &str = "2017-09-11T04:30:00";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_utf8_body_is_not_utf8() {
        assert!(std::str::from_utf8(fdsn::NON_UTF8_BODY).is_err());
    }

    #[test]
    fn test_store_dims_are_not_square() {
        assert_ne!(store::WIDTH, store::HEIGHT);
    }
}
