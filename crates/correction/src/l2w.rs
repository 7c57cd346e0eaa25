//! L2W output grid reading.
//!
//! The correction tool writes a multi-band NetCDF grid: `x`/`y` coordinate
//! variables plus one 2-D variable per requested parameter (`rhow_<λ>`,
//! `kd_<λ>`, per-cell `lon`/`lat`, a flags layer and a grid-mapping
//! variable). Everything raster-like becomes a band; flags and the grid
//! mapping are dropped.

use std::path::Path;

use msi_common::EpsgCode;
use raster_grid::RasterGrid;
use tracing::{debug, info};

use crate::error::{CorrectionError, CorrectionResult};

/// Variables that are never data bands.
const SKIP_VARIABLES: [&str; 4] = ["x", "y", "l2_flags", "transverse_mercator"];

/// Load an L2W result grid into a [`RasterGrid`] expressed in `crs` (the
/// output projection requested from the correction tool).
pub fn read_l2w(path: &Path, crs: EpsgCode) -> CorrectionResult<RasterGrid> {
    let file = netcdf::open(path)
        .map_err(|e| CorrectionError::output_read(format!("{}: {e}", path.display())))?;

    let width = file
        .dimension("x")
        .ok_or_else(|| CorrectionError::output_read("missing x dimension"))?
        .len();
    let height = file
        .dimension("y")
        .ok_or_else(|| CorrectionError::output_read("missing y dimension"))?
        .len();

    let x_axis = read_axis(&file, "x")?;
    let y_axis = read_axis(&file, "y")?;

    let mut grid = RasterGrid::with_origin(
        x_axis.origin,
        y_axis.origin,
        x_axis.res,
        y_axis.res,
        width,
        height,
        crs,
    )?;

    for var in file.variables() {
        let name = var.name();
        if SKIP_VARIABLES.contains(&name.as_str()) {
            continue;
        }

        let dims = var.dimensions();
        let is_raster = dims.len() == 2 && dims[0].name() == "y" && dims[1].name() == "x";
        if !is_raster {
            debug!(variable = %name, "Skipping non-raster variable");
            continue;
        }

        let raw: Vec<f64> = var.get_values(..).map_err(|e| {
            CorrectionError::output_read(format!("failed to read {name}: {e}"))
        })?;

        let scale = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
        let offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);
        let fill = get_f64_attr(&var, "_FillValue");

        let mut values: Vec<f64> = raw
            .iter()
            .map(|&v| {
                if Some(v) == fill || !v.is_finite() {
                    f64::NAN
                } else {
                    v * scale + offset
                }
            })
            .collect();

        // The file stores rows north-to-south when the y axis descends;
        // the grid model keeps row 0 at min-y.
        if y_axis.descending {
            values = flip_rows(&values, width, height);
        }

        grid.add_band(name, values)?;
    }

    if grid.band_names().is_empty() {
        return Err(CorrectionError::output_read(format!(
            "{}: no raster bands in L2W grid",
            path.display()
        )));
    }

    info!(
        path = %path.display(),
        width,
        height,
        bands = grid.band_names().len(),
        "Loaded L2W grid"
    );
    Ok(grid)
}

/// A regular coordinate axis recovered from a NetCDF coordinate variable.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    /// Coordinate of the minimum cell center.
    origin: f64,
    /// Positive cell spacing.
    res: f64,
    /// True when the file stores coordinates max-to-min.
    descending: bool,
}

fn read_axis(file: &netcdf::File, name: &str) -> CorrectionResult<Axis> {
    let var = file
        .variable(name)
        .ok_or_else(|| CorrectionError::output_read(format!("missing {name} variable")))?;
    let values: Vec<f64> = var
        .get_values(..)
        .map_err(|e| CorrectionError::output_read(format!("failed to read {name}: {e}")))?;
    axis_from_coords(&values)
        .ok_or_else(|| CorrectionError::output_read(format!("irregular {name} axis")))
}

/// Recover origin/resolution from evenly spaced coordinates; None when the
/// axis is degenerate or not uniform.
fn axis_from_coords(values: &[f64]) -> Option<Axis> {
    if values.len() < 2 {
        return None;
    }
    let step = (values[values.len() - 1] - values[0]) / (values.len() - 1) as f64;
    if step == 0.0 || !step.is_finite() {
        return None;
    }

    // Uniformity check, tolerant of floating-point accumulation.
    let tol = step.abs() * 1e-6;
    for (i, pair) in values.windows(2).enumerate() {
        if ((pair[1] - pair[0]) - step).abs() > tol {
            tracing::warn!(index = i, "Non-uniform coordinate spacing");
            return None;
        }
    }

    let descending = step < 0.0;
    Some(Axis {
        origin: if descending {
            values[values.len() - 1]
        } else {
            values[0]
        },
        res: step.abs(),
        descending,
    })
}

/// Reverse the row order of a row-major array.
fn flip_rows(values: &[f64], width: usize, height: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    for row in (0..height).rev() {
        out.extend_from_slice(&values[row * width..(row + 1) * width]);
    }
    out
}

fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get an f64 attribute.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}
