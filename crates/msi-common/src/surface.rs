//! Point-surface input: scattered (x, y, elevation) soundings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crs::EpsgCode;
use crate::error::{CommonError, CommonResult};

/// A single surface sounding in a projected CRS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
    /// Elevation in map units. The pipeline's convention is negative below
    /// the water surface (a bottom at 5 m depth has z = -5).
    pub z: f64,
}

impl SurfacePoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// An ordered sequence of soundings with the CRS they are expressed in.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSurface {
    pub points: Vec<SurfacePoint>,
    pub crs: EpsgCode,
}

impl PointSurface {
    /// Load a surface from a delimited text file.
    ///
    /// The first three columns are `x`, `y`, `z` in that order; any further
    /// columns are ignored. Files without a header row are accepted.
    pub fn from_delimited_file(
        path: &Path,
        separator: u8,
        crs: EpsgCode,
    ) -> CommonResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(separator)
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| CommonError::surface_parse(format!("{}: {e}", path.display())))?;

        let mut points = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record =
                record.map_err(|e| CommonError::surface_parse(format!("line {}: {e}", line + 1)))?;

            if record.len() < 3 {
                return Err(CommonError::surface_parse(format!(
                    "line {}: expected at least 3 columns, got {}",
                    line + 1,
                    record.len()
                )));
            }

            // Skip a header row if the first record is not numeric.
            let parsed: Option<Vec<f64>> = record
                .iter()
                .take(3)
                .map(|f| f.trim().parse::<f64>().ok())
                .collect();
            match parsed {
                Some(vals) => points.push(SurfacePoint::new(vals[0], vals[1], vals[2])),
                None if line == 0 => continue,
                None => {
                    return Err(CommonError::surface_parse(format!(
                        "line {}: non-numeric coordinate",
                        line + 1
                    )))
                }
            }
        }

        if points.is_empty() {
            return Err(CommonError::surface_parse(format!(
                "{}: no data rows",
                path.display()
            )));
        }

        debug!(points = points.len(), %crs, "Loaded point surface");
        Ok(Self { points, crs })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
