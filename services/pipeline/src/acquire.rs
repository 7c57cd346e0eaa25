//! Product acquisition: catalog search, archive download, unpacking and the
//! polygon mask file.
//!
//! Working-directory layout: `L1C/` holds the downloaded archive, `ac/`
//! holds the unpacked product and the correction outputs, and the polygon
//! mask sits next to them. Directories are created idempotently, and only
//! after the search has confirmed a product exists.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use catalog_client::{CatalogClient, ProductQuery};
use msi_common::{ensure_dir, Region};
use tracing::info;

/// Name of the polygon mask file written into the working directory.
const MASK_FILE: &str = "polygon_limit.geojson";

/// Everything downstream processing needs from one acquired product.
pub struct Acquisition {
    /// Unpacked `.SAFE` input product.
    pub safe_dir: PathBuf,
    /// Correction input/output directory.
    pub ac_dir: PathBuf,
    /// GeoJSON mask for the query polygon.
    pub mask_path: PathBuf,
}

/// Search the catalog, download the first matching product and unpack it.
///
/// The search runs before any directory is created, so an empty result
/// leaves the working directory untouched.
pub async fn acquire_product(
    client: &CatalogClient,
    query: &ProductQuery,
    workdir: &Path,
) -> Result<Acquisition> {
    let products = client
        .search(query)
        .await
        .with_context(|| format!("catalog search failed for {}", query.describe()))?;

    // The first match is the retrieval unit.
    let product = products.first().context("catalog returned no products")?;
    info!(
        product = product.title(),
        size = product.content_length,
        matches = products.len(),
        "Selected product"
    );

    let l1c_dir = workdir.join("L1C");
    ensure_dir(&l1c_dir).context("creating L1C directory")?;

    let archive = client
        .download(product, &l1c_dir)
        .await
        .with_context(|| format!("downloading {}", product.title()))?;

    let ac_dir = workdir.join("ac");
    ensure_dir(&ac_dir).context("creating correction directory")?;

    let safe_dir = catalog_client::unpack_product(&archive, &ac_dir)
        .with_context(|| format!("unpacking {}", archive.display()))?;

    let mask_path = write_mask(&query.region, workdir)?;

    Ok(Acquisition {
        safe_dir,
        ac_dir,
        mask_path,
    })
}

/// Write the search polygon as a GeoJSON mask file for the correction tool.
fn write_mask(region: &Region, workdir: &Path) -> Result<PathBuf> {
    let path = workdir.join(MASK_FILE);
    let geojson = serde_json::to_string(&region.to_geojson()).context("serializing mask")?;
    std::fs::write(&path, geojson)
        .with_context(|| format!("writing mask {}", path.display()))?;
    Ok(path)
}
