//! A single 2D slice of a gridded variable.

use crate::error::{StoreError, StoreResult};

/// Row-major `f32` grid of `height` rows by `width` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Raster {
    /// Wrap `values` (row 0 first) as a `width` x `height` raster.
    pub fn new(width: usize, height: usize, values: Vec<f32>) -> StoreResult<Self> {
        if values.len() != width * height {
            return Err(StoreError::InvalidRaster(format!(
                "{} values do not fill a {}x{} grid",
                values.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    /// A raster with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![value; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Shape as `(rows, cols)`, the order of the trailing store dimensions.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }

    /// Value at `(row, col)`, if in bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.values.get(row * self.width + col).copied()
    }

    /// Cells holding a finite value.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    /// Compare with another raster treating NaN cells as equal.
    pub fn same_values(&self, other: &Raster) -> bool {
        self.shape() == other.shape()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}
