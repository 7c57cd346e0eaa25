//! Raster grid model and the bottom-reflectance derivation pipeline.
//!
//! This crate holds the one piece of genuine processing logic in the
//! pipeline: turning a scattered bathymetric point surface into a regular
//! elevation grid, fusing it with the atmospheric-correction output on a
//! common coordinate grid, and computing a depth-invariant
//! bottom-reflectance index per wavelength band.

pub mod error;
pub mod fusion;
pub mod grid;
pub mod index;
pub mod rasterize;
pub mod table;

pub use error::{RasterError, RasterResult};
pub use fusion::fuse;
pub use grid::RasterGrid;
pub use index::{compute_bri, BRI_WAVELENGTHS};
pub use rasterize::{rasterize_surface, ELEVATION_BAND};
pub use table::{write_bri_table, write_reflectance_table, LAT_BAND, LON_BAND};
