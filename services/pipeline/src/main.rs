//! Sentinel-2 water and bottom reflectance pipeline.
//!
//! Two subcommands mirroring the two products:
//! - `rhow` — download an L1C scene over a bounding box, run atmospheric
//!   correction and print the water-reflectance table to stdout.
//! - `rhob` — additionally rasterize a depth point surface, fuse it with
//!   the corrected grids and print per-wavelength bottom-reflectance
//!   indices to stdout.

mod acquire;
mod rhob;
mod rhow;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use catalog_client::{CatalogClient, ClientConfig, Credentials, ProductQuery};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use correction::AcoliteRunner;
use msi_common::{EpsgCode, PointSurface, Region};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pipeline")]
#[command(about = "Sentinel-2 water and bottom reflectance tables")]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Water-reflectance table over a bounding box
    Rhow {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        extent: ExtentArgs,
    },
    /// Bottom-reflectance indices over a depth point surface
    Rhob {
        #[command(flatten)]
        common: CommonArgs,

        /// Geographic search extent; defaults to the surface extent when
        /// the surface is already geographic
        #[command(flatten)]
        extent: OptionalExtentArgs,

        /// Delimited x,y,z point-surface file
        #[arg(long)]
        surface: PathBuf,

        /// Column separator in the surface file ("tab" for tabs)
        #[arg(long, default_value = ",")]
        separator: String,

        /// EPSG code of the surface coordinates ("2960" or "EPSG:2960")
        #[arg(long, value_parser = parse_epsg)]
        epsg: EpsgCode,

        /// Water-level offset added to every surface cell (meters,
        /// negative below the surface)
        #[arg(long, default_value = "0.0")]
        tide: f64,

        /// Output grid resolution in meters
        #[arg(long, default_value = "10")]
        resolution: u32,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// First acquisition date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    start_date: NaiveDate,

    /// Last acquisition date, exclusive (YYYY-MM-DD)
    #[arg(long)]
    end_date: NaiveDate,

    /// Minimum cloud cover percentage
    #[arg(long, default_value = "0.0")]
    cloud_min: f64,

    /// Maximum cloud cover percentage
    #[arg(long, default_value = "20.0")]
    cloud_max: f64,

    /// Working directory for downloads and correction outputs
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// YAML credentials file for the data space account
    #[arg(long, env = "CDSE_CREDENTIALS")]
    credentials: PathBuf,

    /// Path to the correction tool launcher script
    #[arg(long, env = "ACOLITE_LAUNCHER")]
    acolite: PathBuf,

    /// Python interpreter used for the correction tool
    #[arg(long, default_value = "python3")]
    python: PathBuf,
}

#[derive(Args, Debug)]
struct ExtentArgs {
    /// Western longitude
    #[arg(long)]
    min_lon: f64,

    /// Southern latitude
    #[arg(long)]
    min_lat: f64,

    /// Eastern longitude
    #[arg(long)]
    max_lon: f64,

    /// Northern latitude
    #[arg(long)]
    max_lat: f64,
}

#[derive(Args, Debug)]
struct OptionalExtentArgs {
    /// Western longitude
    #[arg(long)]
    min_lon: Option<f64>,

    /// Southern latitude
    #[arg(long)]
    min_lat: Option<f64>,

    /// Eastern longitude
    #[arg(long)]
    max_lon: Option<f64>,

    /// Northern latitude
    #[arg(long)]
    max_lat: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Tables go to stdout, logs to stderr.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Command::Rhow { common, extent } => {
            let region = Region::from_corners(
                extent.min_lon,
                extent.min_lat,
                extent.max_lon,
                extent.max_lat,
                EpsgCode::WGS84,
            )
            .context("invalid search extent")?;
            let (client, tool, query) = setup(&common, region)?;

            info!(query = %query.describe(), "Starting water-reflectance run");
            rhow::run(&client, &tool, &query, &common.workdir).await
        }
        Command::Rhob {
            common,
            extent,
            surface,
            separator,
            epsg,
            tide,
            resolution,
        } => {
            let surface =
                PointSurface::from_delimited_file(&surface, parse_separator(&separator)?, epsg)
                    .context("loading surface")?;
            // Validates the extent before any catalog traffic.
            let native = Region::from_surface(&surface).context("invalid surface extent")?;
            let region = search_region(&extent, &native)?;
            let (client, tool, query) = setup(&common, region)?;

            info!(
                query = %query.describe(),
                points = surface.len(),
                "Starting bottom-reflectance run"
            );
            let params = rhob::RhobParams {
                tide_offset: tide,
                resolution_m: resolution,
            };
            rhob::run(&client, &tool, &query, &surface, &params, &common.workdir).await
        }
    }
}

fn setup(
    common: &CommonArgs,
    region: Region,
) -> Result<(CatalogClient, AcoliteRunner, ProductQuery)> {
    let credentials = Credentials::load(&common.credentials)
        .with_context(|| format!("loading credentials {}", common.credentials.display()))?;
    let client =
        CatalogClient::new(ClientConfig::default(), credentials).context("building client")?;
    let tool = AcoliteRunner::new(common.acolite.clone()).with_python(common.python.clone());

    let query = ProductQuery {
        region,
        start: common.start_date,
        end: common.end_date,
        cloud_cover: (common.cloud_min, common.cloud_max),
    };
    Ok((client, tool, query))
}

/// Geographic search region for the `rhob` command: explicit extrema when
/// given, the surface's own extent when it is already geographic.
fn search_region(extent: &OptionalExtentArgs, native: &Region) -> Result<Region> {
    match (extent.min_lon, extent.min_lat, extent.max_lon, extent.max_lat) {
        (Some(min_lon), Some(min_lat), Some(max_lon), Some(max_lat)) => {
            Region::from_corners(min_lon, min_lat, max_lon, max_lat, EpsgCode::WGS84)
                .context("invalid search extent")
        }
        (None, None, None, None) => {
            if native.crs.is_geographic() {
                Ok(*native)
            } else {
                bail!(
                    "surface is in {}; pass --min-lon/--min-lat/--max-lon/--max-lat \
                     for the catalog search",
                    native.crs
                )
            }
        }
        _ => bail!("pass all four of --min-lon/--min-lat/--max-lon/--max-lat, or none"),
    }
}

fn parse_epsg(s: &str) -> Result<EpsgCode, String> {
    EpsgCode::parse(s).ok_or_else(|| format!("invalid EPSG code: {s:?}"))
}

fn parse_separator(s: &str) -> Result<u8> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let bytes = s.as_bytes();
            if bytes.len() != 1 {
                bail!("separator must be a single character, got {s:?}");
            }
            Ok(bytes[0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg_arg() {
        assert_eq!(parse_epsg("2960").unwrap(), EpsgCode(2960));
        assert_eq!(parse_epsg("EPSG:2960").unwrap(), EpsgCode(2960));
        assert!(parse_epsg("nope").is_err());
    }

    #[test]
    fn test_parse_separator() {
        assert_eq!(parse_separator(",").unwrap(), b',');
        assert_eq!(parse_separator(";").unwrap(), b';');
        assert_eq!(parse_separator("tab").unwrap(), b'\t');
        assert_eq!(parse_separator("\\t").unwrap(), b'\t');
        assert!(parse_separator("ab").is_err());
    }

    #[test]
    fn test_search_region_from_geographic_surface() {
        let native = Region::from_corners(-66.5, 45.0, -66.0, 45.5, EpsgCode::WGS84).unwrap();
        let extent = OptionalExtentArgs {
            min_lon: None,
            min_lat: None,
            max_lon: None,
            max_lat: None,
        };
        assert_eq!(search_region(&extent, &native).unwrap(), native);
    }

    #[test]
    fn test_search_region_requires_extrema_for_projected_surface() {
        let native = Region::from_corners(250_000.0, 5_000_000.0, 260_000.0, 5_010_000.0, EpsgCode(2960))
            .unwrap();
        let extent = OptionalExtentArgs {
            min_lon: None,
            min_lat: None,
            max_lon: None,
            max_lat: None,
        };
        assert!(search_region(&extent, &native).is_err());

        let extent = OptionalExtentArgs {
            min_lon: Some(-66.5),
            min_lat: Some(45.0),
            max_lon: Some(-66.0),
            max_lat: Some(45.5),
        };
        let region = search_region(&extent, &native).unwrap();
        assert_eq!(region.crs, EpsgCode::WGS84);
    }

    #[test]
    fn test_partial_extrema_rejected() {
        let native = Region::from_corners(-66.5, 45.0, -66.0, 45.5, EpsgCode::WGS84).unwrap();
        let extent = OptionalExtentArgs {
            min_lon: Some(-66.5),
            min_lat: None,
            max_lon: None,
            max_lat: None,
        };
        assert!(search_region(&extent, &native).is_err());
    }
}
