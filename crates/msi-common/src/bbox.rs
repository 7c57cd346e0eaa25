//! Bounding box and search-region types.

use serde::{Deserialize, Serialize};

use crate::crs::EpsgCode;
use crate::error::{CommonError, CommonResult};
use crate::surface::PointSurface;

/// A rectangular bounding box in the coordinate units of its CRS.
///
/// For geographic CRS the corners are degrees (lon/lat); for projected CRS
/// they are map units (usually meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a bounding box from corner coordinates.
    ///
    /// Rejects non-finite corners and degenerate (zero-width or zero-height)
    /// extents, so malformed regions fail before any network call.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> CommonResult<Self> {
        for v in [min_x, min_y, max_x, max_y] {
            if !v.is_finite() {
                return Err(CommonError::invalid_region(format!(
                    "non-finite corner coordinate: {v}"
                )));
            }
        }
        if min_x >= max_x || min_y >= max_y {
            return Err(CommonError::invalid_region(format!(
                "degenerate extent [{min_x}, {min_y}, {max_x}, {max_y}] (min must be < max on both axes)"
            )));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Minimum enclosing rectangle of a point set.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> CommonResult<Self> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for (x, y) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        if !min_x.is_finite() {
            return Err(CommonError::invalid_region("empty point set"));
        }
        Self::new(min_x, min_y, max_x, max_y)
    }

    /// Width in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Closed polygon ring of the four corners, counter-clockwise.
    fn ring(&self) -> Vec<(f64, f64)> {
        vec![
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
        ]
    }

    /// WKT POLYGON representation used by the catalog search filter.
    pub fn to_wkt_polygon(&self) -> String {
        let coords: Vec<String> = self
            .ring()
            .iter()
            .map(|(x, y)| format!("{x} {y}"))
            .collect();
        format!("POLYGON(({}))", coords.join(","))
    }
}

/// A bounding polygon together with the CRS it is expressed in.
///
/// The pipeline searches the catalog in geographic coordinates but keeps the
/// native projected CRS around for the correction tool's output-projection
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub bbox: BoundingBox,
    pub crs: EpsgCode,
}

impl Region {
    /// Build a region from four explicit geographic extrema
    /// (lonmin, latmin, lonmax, latmax).
    pub fn from_corners(
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        crs: EpsgCode,
    ) -> CommonResult<Self> {
        Ok(Self {
            bbox: BoundingBox::new(min_x, min_y, max_x, max_y)?,
            crs,
        })
    }

    /// Build a region from the spatial extent of a point surface, retaining
    /// the surface's projected CRS.
    pub fn from_surface(surface: &PointSurface) -> CommonResult<Self> {
        let bbox = BoundingBox::from_points(surface.points.iter().map(|p| (p.x, p.y)))?;
        Ok(Self {
            bbox,
            crs: surface.crs,
        })
    }

    /// GeoJSON FeatureCollection with the bounding polygon as its only
    /// feature, written as the correction tool's polygon mask file.
    pub fn to_geojson(&self) -> geojson::GeoJson {
        let ring: Vec<Vec<f64>> = self.bbox.ring().iter().map(|(x, y)| vec![*x, *y]).collect();
        let geometry = geojson::Geometry::new(geojson::Value::Polygon(vec![ring]));
        let feature = geojson::Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        };
        geojson::GeoJson::FeatureCollection(geojson::FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfacePoint;

    #[test]
    fn test_new_valid() {
        let bbox = BoundingBox::new(-67.71, 49.28, -67.67, 49.31).unwrap();
        assert!((bbox.width() - 0.04).abs() < 1e-9);
        assert!(bbox.contains_point(-67.7, 49.3));
    }

    #[test]
    fn test_degenerate_rejected() {
        // Zero width
        assert!(matches!(
            BoundingBox::new(1.0, 0.0, 1.0, 2.0),
            Err(CommonError::InvalidRegion(_))
        ));
        // Zero height
        assert!(matches!(
            BoundingBox::new(0.0, 2.0, 1.0, 2.0),
            Err(CommonError::InvalidRegion(_))
        ));
        // Inverted
        assert!(BoundingBox::new(2.0, 0.0, 1.0, 2.0).is_err());
        // Non-finite
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 2.0).is_err());
    }

    #[test]
    fn test_from_points() {
        let bbox =
            BoundingBox::from_points(vec![(0.0, 10.0), (10.0, 0.0), (5.0, 5.0)]).unwrap();
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 10.0);
        assert_eq!(bbox.min_y, 0.0);
        assert_eq!(bbox.max_y, 10.0);
    }

    #[test]
    fn test_from_points_empty() {
        assert!(BoundingBox::from_points(Vec::<(f64, f64)>::new()).is_err());
    }

    #[test]
    fn test_wkt_polygon_closed() {
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 2.0).unwrap();
        let wkt = bbox.to_wkt_polygon();
        assert!(wkt.starts_with("POLYGON(("));
        assert!(wkt.ends_with("))"));
        // Five vertices, first == last
        assert_eq!(wkt.matches(',').count(), 4);
        assert!(wkt.contains("0 0,1 0,1 2,0 2,0 0"));
    }

    #[test]
    fn test_region_from_surface() {
        let surface = PointSurface {
            points: vec![
                SurfacePoint::new(0.0, 0.0, -5.0),
                SurfacePoint::new(10.0, 10.0, -5.0),
            ],
            crs: EpsgCode(2960),
        };
        let region = Region::from_surface(&surface).unwrap();
        assert_eq!(region.crs, EpsgCode(2960));
        assert_eq!(region.bbox.max_x, 10.0);
    }

    #[test]
    fn test_geojson_mask() {
        let region = Region::from_corners(0.0, 0.0, 1.0, 1.0, EpsgCode::WGS84).unwrap();
        let json = region.to_geojson().to_string();
        assert!(json.contains("FeatureCollection"));
        assert!(json.contains("Polygon"));
    }
}
