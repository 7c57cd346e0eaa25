//! Water-reflectance command: download, correct, flatten to CSV.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use catalog_client::{CatalogClient, ProductQuery};
use correction::{read_l2w, CorrectionSettings, CorrectionTool};
use msi_common::{ensure_dir, EpsgCode};
use raster_grid::write_reflectance_table;
use tracing::info;

use crate::acquire::acquire_product;

pub async fn run(
    client: &CatalogClient,
    tool: &dyn CorrectionTool,
    query: &ProductQuery,
    workdir: &Path,
) -> Result<()> {
    ensure_dir(workdir).context("creating working directory")?;

    let acquisition = acquire_product(client, query, workdir).await?;

    let settings = CorrectionSettings::water_reflectance(
        acquisition.safe_dir.clone(),
        acquisition.ac_dir.clone(),
    )
    .with_polygon(acquisition.mask_path.clone());

    let output = tool.run(&settings).await.context("correction run")?;

    // The table is keyed on the per-cell lon/lat bands, so the grid's own
    // projection is not interpreted here.
    let grid = read_l2w(&output.l2w_path, EpsgCode::WGS84)
        .with_context(|| format!("reading {}", output.l2w_path.display()))?;

    info!(bands = grid.band_names().len(), "Writing reflectance table");
    write_reflectance_table(&grid, io::stdout().lock()).context("writing table")?;
    Ok(())
}
