//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// A geographic or projected bounding box.
///
/// For geographic extents `x` is longitude and `y` is latitude, both in
/// degrees. For projected extents both axes are in CRS units (usually meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Parse a comma separated "minx,miny,maxx,maxy" string.
    pub fn from_csv(s: &str) -> GeoResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeoError::InvalidBbox(format!(
                "{s}: expected 'minx,miny,maxx,maxy'"
            )));
        }

        let parse = |p: &str| {
            p.parse::<f64>()
                .map_err(|_| GeoError::InvalidNumber(p.to_string()))
        };

        Ok(Self {
            min_x: parse(parts[0])?,
            min_y: parse(parts[1])?,
            max_x: parse(parts[2])?,
            max_y: parse(parts[3])?,
        })
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check that min <= max on both axes.
    pub fn is_ordered(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Validate this box as a lon/lat extent.
    ///
    /// Longitudes must lie in [-180, 180], latitudes in [-90, 90], and each
    /// minimum must not exceed its maximum.
    pub fn validate_geographic(&self) -> GeoResult<()> {
        if !self.is_ordered() {
            return Err(GeoError::InvalidBbox(format!(
                "minimum exceeds maximum in {:?}",
                self
            )));
        }
        for lon in [self.min_x, self.max_x] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(GeoError::InvalidBbox(format!(
                    "longitude {lon} outside [-180, 180]"
                )));
            }
        }
        for lat in [self.min_y, self.max_y] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(GeoError::InvalidBbox(format!(
                    "latitude {lat} outside [-90, 90]"
                )));
            }
        }
        Ok(())
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        if !self.intersects(other) {
            return None;
        }

        Some(BoundingBox {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}
