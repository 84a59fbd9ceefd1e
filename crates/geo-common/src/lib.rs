//! Geographic primitives shared across the quake-grid workspace.
//!
//! - [`BoundingBox`]: rectangular extents (query windows, raster footprints)
//! - [`CrsDefinition`]: coordinate reference systems rendered as WKT, PROJ
//!   strings and CF grid-mapping attributes
//! - [`GeoTransform`]: the six-coefficient affine mapping from pixel
//!   indices to projected coordinates

pub mod bbox;
pub mod crs;
pub mod error;
pub mod transform;

pub use bbox::BoundingBox;
pub use crs::{CfAttribute, CrsDefinition, LambertAzimuthalEqualArea};
pub use error::{GeoError, GeoResult};
pub use transform::GeoTransform;
