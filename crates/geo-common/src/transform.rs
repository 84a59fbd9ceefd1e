//! Affine geo-transforms in GDAL coefficient order.
//!
//! A pixel `(col, row)` maps to projected coordinates as
//!
//! ```text
//! x = gt[0] + col * gt[1] + row * gt[2]
//! y = gt[3] + col * gt[4] + row * gt[5]
//! ```
//!
//! with `(0, 0)` the outer corner of the top-left pixel.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bbox::BoundingBox;
use crate::error::{GeoError, GeoResult};

/// Six affine coefficients stored in GDAL order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    coefficients: [f64; 6],
}

impl GeoTransform {
    /// Build from GDAL ordered coefficients
    /// `(origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height)`.
    pub fn from_gdal(coefficients: [f64; 6]) -> Self {
        Self { coefficients }
    }

    /// Build from affine matrix coefficients `(a, b, c, d, e, f)` where
    /// `x = a*col + b*row + c` and `y = d*col + e*row + f`.
    pub fn from_affine(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            coefficients: [c, a, b, f, d, e],
        }
    }

    /// North-up transform anchored at the top-left corner `(west, north)`.
    pub fn from_origin(west: f64, north: f64, x_size: f64, y_size: f64) -> Self {
        Self::from_affine(x_size, 0.0, west, 0.0, -y_size, north)
    }

    /// The coefficients in GDAL order.
    pub fn to_gdal(&self) -> [f64; 6] {
        self.coefficients
    }

    /// The coefficients in affine matrix order `(a, b, c, d, e, f)`.
    pub fn to_affine(&self) -> [f64; 6] {
        let [c, a, b, f, d, e] = self.coefficients;
        [a, b, c, d, e, f]
    }

    /// Size of one pixel as `(width, height)`; height is negative for
    /// north-up rasters.
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.coefficients[1], self.coefficients[5])
    }

    /// True when the transform has no rotation terms.
    pub fn is_north_up(&self) -> bool {
        self.coefficients[2] == 0.0 && self.coefficients[4] == 0.0
    }

    /// Map fractional pixel coordinates to projected coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let gt = &self.coefficients;
        (
            gt[0] + col * gt[1] + row * gt[2],
            gt[3] + col * gt[4] + row * gt[5],
        )
    }

    /// Projected coordinates of the center of pixel `(col, row)`.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Invert the transform: projected coordinates to fractional pixel
    /// coordinates.
    pub fn invert(&self, x: f64, y: f64) -> GeoResult<(f64, f64)> {
        let [c, a, b, f, d, e] = self.coefficients;
        let det = a * e - b * d;
        if det == 0.0 {
            return Err(GeoError::SingularTransform);
        }
        let dx = x - c;
        let dy = y - f;
        Ok(((e * dx - b * dy) / det, (a * dy - d * dx) / det))
    }

    /// Footprint of a `width` x `height` raster under this transform.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(width as f64, 0.0),
            self.apply(0.0, height as f64),
            self.apply(width as f64, height as f64),
        ];
        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in corners {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox
    }

    /// Render as six space separated numbers, the form GDAL reads from a
    /// `GeoTransform` attribute.
    pub fn to_gdal_string(&self) -> String {
        self.coefficients
            .iter()
            .map(|v| format!("{v:?}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parse the space separated form produced by [`to_gdal_string`](Self::to_gdal_string).
    pub fn parse_gdal_string(s: &str) -> GeoResult<Self> {
        let values: Vec<f64> = s
            .split_whitespace()
            .map(|p| {
                p.parse::<f64>()
                    .map_err(|_| GeoError::InvalidNumber(p.to_string()))
            })
            .collect::<GeoResult<_>>()?;

        let coefficients: [f64; 6] = values.try_into().map_err(|v: Vec<f64>| {
            GeoError::InvalidTransform(format!("expected 6 coefficients, got {}", v.len()))
        })?;
        Ok(Self { coefficients })
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_gdal_string())
    }
}

impl FromStr for GeoTransform {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_gdal_string(s)
    }
}
