//! Coordinate-aligned fusion of raster grids.
//!
//! Grids are combined by cell-center coordinate, never by array index, so
//! two grids covering different extents at the same resolution line up on
//! their overlap and everything else is null-filled.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{RasterError, RasterResult};
use crate::grid::RasterGrid;

/// Maximum relative resolution difference tolerated between fused grids.
const RES_TOLERANCE: f64 = 1e-9;

/// Fuse two grids into one.
///
/// The output takes its cell set from `over`, the override-priority grid:
/// every cell of `over` appears in the result. Bands are the union of both
/// grids' bands; where both define a band, `over` wins outright. Bands only
/// present in `base` are carried over by coordinate match, null where `base`
/// has no matching cell.
///
/// Fails with [`RasterError::GridMismatch`] when the grids disagree on
/// resolution or CRS.
pub fn fuse(base: &RasterGrid, over: &RasterGrid) -> RasterResult<RasterGrid> {
    let (bx, by) = base.resolution();
    let (ox, oy) = over.resolution();
    if (bx - ox).abs() > RES_TOLERANCE * bx.abs() || (by - oy).abs() > RES_TOLERANCE * by.abs() {
        return Err(RasterError::grid_mismatch(format!(
            "resolution ({bx}, {by}) vs ({ox}, {oy})"
        )));
    }
    if base.crs() != over.crs() {
        return Err(RasterError::grid_mismatch(format!(
            "CRS {} vs {}",
            base.crs(),
            over.crs()
        )));
    }

    // Coordinate index of the base grid's cells.
    let mut base_cells: HashMap<(i64, i64), usize> = HashMap::with_capacity(base.len());
    for row in 0..base.height() {
        for col in 0..base.width() {
            let (x, y) = base.cell_center(col, row);
            base_cells.insert(base.coord_key(x, y), row * base.width() + col);
        }
    }

    let mut fused = over.clone();
    let mut carried = 0usize;

    for name in base.band_names() {
        if fused.has_band(name) {
            // Conflict: the override grid's band stands.
            continue;
        }
        let Some(src) = base.band(name) else {
            continue;
        };

        let mut values = vec![f64::NAN; fused.len()];
        for row in 0..fused.height() {
            for col in 0..fused.width() {
                let (x, y) = fused.cell_center(col, row);
                if let Some(&idx) = base_cells.get(&fused.coord_key(x, y)) {
                    values[row * fused.width() + col] = src[idx];
                }
            }
        }
        fused.add_band(name.to_string(), values)?;
        carried += 1;
    }

    debug!(
        cells = fused.len(),
        carried_bands = carried,
        total_bands = fused.band_names().len(),
        "Fused raster grids"
    );
    Ok(fused)
}
