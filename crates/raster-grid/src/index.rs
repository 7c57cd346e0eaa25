//! Bottom-reflectance index (BRI) computation.
//!
//! Removes the exponential decay of upward radiance through the water
//! column, yielding a depth-invariant proxy for seafloor reflectance:
//!
//! ```text
//! BRI_b = rhow_b / exp(-z * kd_b)
//! ```
//!
//! Sign convention: `z` is the water-column elevation with **negative values
//! below the surface** (a bottom at 5 m depth has z = -5), the same frame
//! the rasterizer's tide offset is applied in. A submerged cell therefore
//! always produces a positive optical-path exponent.

use tracing::{debug, warn};

use crate::error::{RasterError, RasterResult};
use crate::grid::RasterGrid;

/// Wavelengths (nm) the index is derived for: the Sentinel-2 blue, green
/// and red bands.
pub const BRI_WAVELENGTHS: [u32; 3] = [492, 559, 665];

/// Compute `BRI_<λ>` bands on a fused grid holding `rhow_<λ>`, `kd_<λ>` and
/// a depth band. Returns the names of the bands produced.
///
/// A wavelength is skipped (with a warning) when either of its input bands
/// is absent from the grid. Non-finite inputs propagate as null output;
/// the exponential denominator is positive for all finite arguments, so no
/// division guard is needed. The computation is purely cellwise and
/// deterministic: identical inputs give bit-for-bit identical output.
pub fn compute_bri(
    grid: &mut RasterGrid,
    depth_band: &str,
    wavelengths: &[u32],
) -> RasterResult<Vec<String>> {
    let depth = grid
        .band(depth_band)
        .ok_or_else(|| RasterError::BandNotFound(depth_band.to_string()))?
        .to_vec();

    let mut produced = Vec::new();

    for &wl in wavelengths {
        let rhow_name = format!("rhow_{wl}");
        let kd_name = format!("kd_{wl}");

        let (rhow, kd) = match (grid.band(&rhow_name), grid.band(&kd_name)) {
            (Some(r), Some(k)) => (r, k),
            _ => {
                warn!(
                    wavelength = wl,
                    "Missing reflectance or attenuation band, skipping index"
                );
                continue;
            }
        };

        let values: Vec<f64> = rhow
            .iter()
            .zip(kd.iter())
            .zip(depth.iter())
            .map(|((&r, &k), &z)| r / (-z * k).exp())
            .collect();

        let name = format!("BRI_{wl}");
        grid.add_band(name.clone(), values)?;
        produced.push(name);
    }

    if produced.is_empty() {
        return Err(RasterError::BandNotFound(format!(
            "no reflectance/attenuation band pair for any of {wavelengths:?}"
        )));
    }

    debug!(bands = ?produced, "Computed bottom-reflectance index");
    Ok(produced)
}
