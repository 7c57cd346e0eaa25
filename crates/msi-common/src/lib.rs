//! Common types and utilities shared across the water-msi pipeline.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod fs;
pub mod surface;

pub use bbox::{BoundingBox, Region};
pub use crs::EpsgCode;
pub use error::{CommonError, CommonResult};
pub use fs::ensure_dir;
pub use surface::{PointSurface, SurfacePoint};
