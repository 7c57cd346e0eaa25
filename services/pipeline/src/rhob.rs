//! Bottom-reflectance command: fuse a depth surface with the corrected
//! reflectance/attenuation grids and emit per-wavelength BRI columns.

use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use catalog_client::{CatalogClient, ProductQuery};
use correction::{read_l2w, CorrectionSettings, CorrectionTool};
use msi_common::{ensure_dir, PointSurface};
use raster_grid::{
    compute_bri, fuse, rasterize_surface, write_bri_table, BRI_WAVELENGTHS, ELEVATION_BAND,
};
use tracing::info;

use crate::acquire::acquire_product;

pub struct RhobParams {
    /// Water-level offset added to every surface cell, in the elevation
    /// frame (negative below the surface).
    pub tide_offset: f64,
    /// Target grid resolution in meters, shared by the rasterized surface
    /// and the correction output.
    pub resolution_m: u32,
}

pub async fn run(
    client: &CatalogClient,
    tool: &dyn CorrectionTool,
    query: &ProductQuery,
    surface: &PointSurface,
    params: &RhobParams,
    workdir: &Path,
) -> Result<()> {
    ensure_dir(workdir).context("creating working directory")?;

    let acquisition = acquire_product(client, query, workdir).await?;

    let settings = CorrectionSettings::bottom_reflectance(
        acquisition.safe_dir.clone(),
        acquisition.ac_dir.clone(),
        surface.crs,
        params.resolution_m,
    )
    .with_polygon(acquisition.mask_path.clone());

    let output = tool.run(&settings).await.context("correction run")?;

    let reflectance = read_l2w(&output.l2w_path, surface.crs)
        .with_context(|| format!("reading {}", output.l2w_path.display()))?;

    let resolution = f64::from(params.resolution_m);
    let mut depth = rasterize_surface(surface, resolution, resolution)
        .context("rasterizing depth surface")?;
    depth
        .apply_offset(ELEVATION_BAND, params.tide_offset)
        .context("applying tide offset")?;

    info!(
        cells = depth.len(),
        tide = params.tide_offset,
        "Rasterized depth surface"
    );

    // Surface extent drives the output cells; reflectance and attenuation
    // bands join by cell-center coordinate.
    let mut fused = fuse(&reflectance, &depth).context("fusing grids")?;
    let bands =
        compute_bri(&mut fused, ELEVATION_BAND, &BRI_WAVELENGTHS).context("computing indices")?;

    info!(bands = bands.len(), "Writing index table");
    write_bri_table(&fused, &bands, io::stdout().lock()).context("writing table")?;
    Ok(())
}
