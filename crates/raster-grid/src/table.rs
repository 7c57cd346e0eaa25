//! Tabular emission: flattening grids to row-per-cell delimited text.
//!
//! Tables are streamed straight to a writer (normally stdout) with a header
//! row, comma separator and no trailing index column. Null cells are
//! emitted as empty fields.

use std::io::Write;

use crate::error::RasterResult;
use crate::grid::RasterGrid;

/// Band holding per-cell longitudes in the correction output.
pub const LON_BAND: &str = "lon";
/// Band holding per-cell latitudes in the correction output.
pub const LAT_BAND: &str = "lat";

fn field(v: f64) -> String {
    if v.is_finite() {
        format!("{v}")
    } else {
        String::new()
    }
}

/// Write the direct water-reflectance table: one row per cell with columns
/// `x,y,<band>` for every data band of the grid.
///
/// The `lon`/`lat` bands become the `x`/`y` columns, as the correction
/// output reports geographic coordinates per cell; grids without them fall
/// back to cell-center map coordinates. Rows where every data band is null
/// are dropped.
pub fn write_reflectance_table<W: Write>(grid: &RasterGrid, out: W) -> RasterResult<()> {
    let data_bands: Vec<&str> = grid
        .band_names()
        .into_iter()
        .filter(|n| *n != LON_BAND && *n != LAT_BAND)
        .collect();

    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["x".to_string(), "y".to_string()];
    header.extend(data_bands.iter().map(|n| n.to_string()));
    writer.write_record(&header)?;

    let lon = grid.band(LON_BAND);
    let lat = grid.band(LAT_BAND);

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let idx = row * grid.width() + col;

            let values: Vec<f64> = data_bands
                .iter()
                .map(|n| grid.band(n).map(|b| b[idx]).unwrap_or(f64::NAN))
                .collect();
            if values.iter().all(|v| !v.is_finite()) {
                continue;
            }

            let (cx, cy) = grid.cell_center(col, row);
            let x = lon.map(|b| b[idx]).unwrap_or(cx);
            let y = lat.map(|b| b[idx]).unwrap_or(cy);

            let mut record = vec![field(x), field(y)];
            record.extend(values.iter().map(|&v| field(v)));
            writer.write_record(&record)?;
        }
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the fused bottom-reflectance table: per-band `(y, x, BRI_<λ>)`
/// tables left-merged on `(y, x)` into one row per cell.
///
/// The first listed band drives the row set; the others contribute values
/// where they are defined and empty fields where they are not.
pub fn write_bri_table<W: Write>(
    grid: &RasterGrid,
    bands: &[String],
    out: W,
) -> RasterResult<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["y".to_string(), "x".to_string()];
    header.extend(bands.iter().cloned());
    writer.write_record(&header)?;

    let Some(first) = bands.first() else {
        writer.flush().map_err(csv::Error::from)?;
        return Ok(());
    };

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            // Left merge: the first band's non-null cells define the rows.
            let Some(lead) = grid.value(first, col, row) else {
                continue;
            };
            if !lead.is_finite() {
                continue;
            }

            let (x, y) = grid.cell_center(col, row);
            let mut record = vec![field(y), field(x)];
            for band in bands {
                let v = grid.value(band, col, row).unwrap_or(f64::NAN);
                record.push(field(v));
            }
            writer.write_record(&record)?;
        }
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
