//! Synthetic slices for exercising a store.

use netcdf_timeseries::{Raster, StoreResult};
use rand::prelude::*;

/// Source of random slices, uniform in `[0, 1)`.
///
/// Seeded generators repeat the same sequence of slices.
pub struct SliceGenerator {
    rng: StdRng,
}

impl SliceGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Next random `width` x `height` slice.
    pub fn next_raster(&mut self, width: usize, height: usize) -> StoreResult<Raster> {
        let values: Vec<f32> = (0..width * height).map(|_| self.rng.gen::<f32>()).collect();
        Raster::new(width, height, values)
    }
}
