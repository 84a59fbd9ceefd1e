//! Coordinate Reference System definitions.
//!
//! Only what a grid-mapping variable needs to carry: a WKT string for GDAL
//! style readers, a PROJ string for humans, and CF grid-mapping attributes
//! for CF-aware readers.

use serde::{Deserialize, Serialize};
use std::fmt;

const WGS84_GEOGCS: &str = concat!(
    r#"GEOGCS["WGS 84","#,
    r#"DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],"#,
    r#"PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],"#,
    r#"UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]]"#,
);

/// Semi-major axis of the WGS84 ellipsoid (meters).
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// Inverse flattening of the WGS84 ellipsoid.
pub const WGS84_INVERSE_FLATTENING: f64 = 298.257_223_563;

/// Lambert Azimuthal Equal Area parameters on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambertAzimuthalEqualArea {
    /// Latitude of the projection center (degrees)
    pub lat_0: f64,
    /// Longitude of the projection center (degrees)
    pub lon_0: f64,
    /// False easting (meters)
    #[serde(default)]
    pub false_easting: f64,
    /// False northing (meters)
    #[serde(default)]
    pub false_northing: f64,
}

impl Default for LambertAzimuthalEqualArea {
    fn default() -> Self {
        Self {
            lat_0: 0.0,
            lon_0: 0.0,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }
}

/// One CF grid-mapping attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum CfAttribute {
    Text(&'static str, String),
    Number(&'static str, f64),
}

impl CfAttribute {
    pub fn name(&self) -> &'static str {
        match self {
            CfAttribute::Text(name, _) | CfAttribute::Number(name, _) => name,
        }
    }
}

/// A coordinate reference system attached to a gridded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrsDefinition {
    /// Geographic WGS84 (EPSG:4326)
    Wgs84,
    /// Lambert Azimuthal Equal Area on WGS84
    Laea(LambertAzimuthalEqualArea),
    /// Arbitrary WKT passed through untouched
    Wkt { wkt: String },
}

impl Default for CrsDefinition {
    fn default() -> Self {
        CrsDefinition::Laea(LambertAzimuthalEqualArea::default())
    }
}

impl CrsDefinition {
    /// Render as OGC WKT1.
    pub fn to_wkt(&self) -> String {
        match self {
            CrsDefinition::Wgs84 => format!(
                r#"{},AXIS["Latitude",NORTH],AXIS["Longitude",EAST],AUTHORITY["EPSG","4326"]]"#,
                WGS84_GEOGCS
            ),
            CrsDefinition::Laea(p) => format!(
                concat!(
                    r#"PROJCS["unknown",{}],"#,
                    r#"PROJECTION["Lambert_Azimuthal_Equal_Area"],"#,
                    r#"PARAMETER["latitude_of_center",{}],"#,
                    r#"PARAMETER["longitude_of_center",{}],"#,
                    r#"PARAMETER["false_easting",{}],"#,
                    r#"PARAMETER["false_northing",{}],"#,
                    r#"UNIT["metre",1,AUTHORITY["EPSG","9001"]],"#,
                    r#"AXIS["Easting",EAST],AXIS["Northing",NORTH]]"#,
                ),
                WGS84_GEOGCS, p.lat_0, p.lon_0, p.false_easting, p.false_northing
            ),
            CrsDefinition::Wkt { wkt } => wkt.clone(),
        }
    }

    /// Render as a PROJ string, when one is known.
    pub fn to_proj4(&self) -> Option<String> {
        match self {
            CrsDefinition::Wgs84 => Some("+proj=longlat +datum=WGS84 +no_defs".to_string()),
            CrsDefinition::Laea(p) => Some(format!(
                "+proj=laea +lat_0={} +lon_0={} +x_0={} +y_0={} +ellps=WGS84 +units=m +no_defs",
                p.lat_0, p.lon_0, p.false_easting, p.false_northing
            )),
            CrsDefinition::Wkt { .. } => None,
        }
    }

    /// CF-1.x grid mapping attributes for this CRS.
    ///
    /// A pass-through WKT has no CF equivalent; only `crs_wkt` is emitted.
    pub fn cf_attributes(&self) -> Vec<CfAttribute> {
        let mut attrs = match self {
            CrsDefinition::Wgs84 => vec![
                CfAttribute::Text("grid_mapping_name", "latitude_longitude".to_string()),
                CfAttribute::Number("semi_major_axis", WGS84_SEMI_MAJOR_AXIS),
                CfAttribute::Number("inverse_flattening", WGS84_INVERSE_FLATTENING),
            ],
            CrsDefinition::Laea(p) => vec![
                CfAttribute::Text(
                    "grid_mapping_name",
                    "lambert_azimuthal_equal_area".to_string(),
                ),
                CfAttribute::Number("latitude_of_projection_origin", p.lat_0),
                CfAttribute::Number("longitude_of_projection_origin", p.lon_0),
                CfAttribute::Number("false_easting", p.false_easting),
                CfAttribute::Number("false_northing", p.false_northing),
                CfAttribute::Number("semi_major_axis", WGS84_SEMI_MAJOR_AXIS),
                CfAttribute::Number("inverse_flattening", WGS84_INVERSE_FLATTENING),
            ],
            CrsDefinition::Wkt { .. } => Vec::new(),
        };
        attrs.push(CfAttribute::Text("crs_wkt", self.to_wkt()));
        attrs
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        match self {
            CrsDefinition::Wgs84 => true,
            CrsDefinition::Laea(_) => false,
            CrsDefinition::Wkt { wkt } => wkt.trim_start().starts_with("GEOGCS"),
        }
    }
}

impl fmt::Display for CrsDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsDefinition::Wgs84 => write!(f, "EPSG:4326"),
            CrsDefinition::Laea(p) => write!(f, "LAEA(lat_0={}, lon_0={})", p.lat_0, p.lon_0),
            CrsDefinition::Wkt { .. } => write!(f, "custom WKT"),
        }
    }
}
