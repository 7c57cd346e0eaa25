//! Regular multi-band raster grid addressed by cell-center coordinates.

use std::collections::BTreeMap;

use msi_common::{BoundingBox, EpsgCode};

use crate::error::{RasterError, RasterResult};

/// A regular 2-D grid of cells with one or more named bands.
///
/// Cells are addressed by `(col, row)` with row 0 at the minimum-y edge, and
/// each cell carries the map coordinates of its center. Band values are
/// `f64` with `NaN` as the null marker, matching the fill-value handling of
/// the correction tool's output.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    origin_x: f64,
    origin_y: f64,
    res_x: f64,
    res_y: f64,
    width: usize,
    height: usize,
    crs: EpsgCode,
    bands: BTreeMap<String, Vec<f64>>,
}

impl RasterGrid {
    /// Create an empty grid covering `bbox` at exactly the requested cell
    /// resolution. The extent is rounded up to whole cells, so the grid
    /// always covers the box.
    pub fn covering(
        bbox: &BoundingBox,
        res_x: f64,
        res_y: f64,
        crs: EpsgCode,
    ) -> RasterResult<Self> {
        if !(res_x > 0.0 && res_y > 0.0) {
            return Err(RasterError::grid_mismatch(format!(
                "resolution must be positive, got ({res_x}, {res_y})"
            )));
        }

        let width = (bbox.width() / res_x).ceil().max(1.0) as usize;
        let height = (bbox.height() / res_y).ceil().max(1.0) as usize;

        Ok(Self {
            origin_x: bbox.min_x + res_x / 2.0,
            origin_y: bbox.min_y + res_y / 2.0,
            res_x,
            res_y,
            width,
            height,
            crs,
            bands: BTreeMap::new(),
        })
    }

    /// Create an empty grid from an explicit first-cell-center origin.
    pub fn with_origin(
        origin_x: f64,
        origin_y: f64,
        res_x: f64,
        res_y: f64,
        width: usize,
        height: usize,
        crs: EpsgCode,
    ) -> RasterResult<Self> {
        if !(res_x > 0.0 && res_y > 0.0) || width == 0 || height == 0 {
            return Err(RasterError::grid_mismatch(format!(
                "invalid grid geometry {width}x{height} at ({res_x}, {res_y})"
            )));
        }
        Ok(Self {
            origin_x,
            origin_y,
            res_x,
            res_y,
            width,
            height,
            crs,
            bands: BTreeMap::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resolution(&self) -> (f64, f64) {
        (self.res_x, self.res_y)
    }

    pub fn crs(&self) -> EpsgCode {
        self.crs
    }

    /// Map coordinates of a cell center.
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + col as f64 * self.res_x,
            self.origin_y + row as f64 * self.res_y,
        )
    }

    /// Cell containing the map coordinate, if inside the grid.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let col = ((x - self.origin_x) / self.res_x).round();
        let row = ((y - self.origin_y) / self.res_y).round();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col < self.width && row < self.height {
            Some((col, row))
        } else {
            None
        }
    }

    /// Quantized coordinate key for a cell center, stable across grids that
    /// share resolution but not origin. Quantizes to 1/1024 of a cell so
    /// floating-point noise cannot split matching coordinates.
    pub(crate) fn coord_key(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.res_x * 1024.0).round() as i64,
            (y / self.res_y * 1024.0).round() as i64,
        )
    }

    /// Names of all bands, in deterministic (sorted) order.
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.keys().map(String::as_str).collect()
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.contains_key(name)
    }

    /// Band values in row-major order, or None if the band does not exist.
    pub fn band(&self, name: &str) -> Option<&[f64]> {
        self.bands.get(name).map(Vec::as_slice)
    }

    /// Add a band; the data length must match the grid dimensions.
    pub fn add_band(&mut self, name: impl Into<String>, data: Vec<f64>) -> RasterResult<()> {
        let name = name.into();
        if data.len() != self.len() {
            return Err(RasterError::BandSizeMismatch(format!(
                "band '{}' has {} values, grid has {} cells",
                name,
                data.len(),
                self.len()
            )));
        }
        self.bands.insert(name, data);
        Ok(())
    }

    /// Value of a band at a cell, None if the band is missing or the cell is
    /// out of bounds. A null cell reads as NaN.
    pub fn value(&self, name: &str, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.bands.get(name).map(|b| b[row * self.width + col])
    }

    /// Set a band value at a cell.
    pub fn set_value(&mut self, name: &str, col: usize, row: usize, value: f64) -> RasterResult<()> {
        if col >= self.width || row >= self.height {
            return Err(RasterError::grid_mismatch(format!(
                "cell ({col}, {row}) outside {}x{} grid",
                self.width, self.height
            )));
        }
        let width = self.width;
        let band = self
            .bands
            .get_mut(name)
            .ok_or_else(|| RasterError::BandNotFound(name.to_string()))?;
        band[row * width + col] = value;
        Ok(())
    }

    /// Add a constant offset to every non-null cell of a band. Null cells
    /// stay null. Used for the tide/water-level correction after
    /// rasterization.
    pub fn apply_offset(&mut self, name: &str, offset: f64) -> RasterResult<()> {
        let band = self
            .bands
            .get_mut(name)
            .ok_or_else(|| RasterError::BandNotFound(name.to_string()))?;
        for v in band.iter_mut() {
            if v.is_finite() {
                *v += offset;
            }
        }
        Ok(())
    }
}
