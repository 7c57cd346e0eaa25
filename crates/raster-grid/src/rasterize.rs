//! Surface rasterization: scattered soundings to a regular elevation grid.
//!
//! Linear spatial interpolation over a Delaunay triangulation of the input
//! points: each output cell center is located in its enclosing triangle and
//! interpolated with barycentric weights. Cells outside the convex hull of
//! the input points are left null (NaN) — no extrapolation.

use msi_common::{BoundingBox, PointSurface, SurfacePoint};
use tracing::debug;

use crate::error::{RasterError, RasterResult};
use crate::grid::RasterGrid;

/// Name of the elevation band produced by rasterization.
pub const ELEVATION_BAND: &str = "elevation";

/// Rasterize a point surface into a single-band elevation grid at the
/// requested cell resolution. The grid covers the bounding extent of the
/// input points; the elevation sign convention of the input is preserved.
///
/// Fails with [`RasterError::InsufficientData`] when fewer than 3 finite,
/// non-collinear points are supplied.
pub fn rasterize_surface(
    surface: &PointSurface,
    res_x: f64,
    res_y: f64,
) -> RasterResult<RasterGrid> {
    let points: Vec<SurfacePoint> = surface
        .points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
        .collect();

    if points.len() < 3 {
        return Err(RasterError::insufficient_data(format!(
            "need at least 3 finite points, got {}",
            points.len()
        )));
    }

    let bbox = BoundingBox::from_points(points.iter().map(|p| (p.x, p.y)))
        .map_err(|e| RasterError::insufficient_data(e.to_string()))?;

    let triangles = triangulate(&points);
    if triangles.is_empty() {
        return Err(RasterError::insufficient_data(
            "points are collinear, no triangulation possible",
        ));
    }

    let mut grid = RasterGrid::covering(&bbox, res_x, res_y, surface.crs)?;
    let mut elevation = vec![f64::NAN; grid.len()];

    for row in 0..grid.height() {
        for col in 0..grid.width() {
            let (cx, cy) = grid.cell_center(col, row);
            elevation[row * grid.width() + col] = interpolate_at(cx, cy, &points, &triangles);
        }
    }

    let defined = elevation.iter().filter(|v| v.is_finite()).count();
    debug!(
        cells = grid.len(),
        defined,
        triangles = triangles.len(),
        "Rasterized point surface"
    );

    grid.add_band(ELEVATION_BAND, elevation)?;
    Ok(grid)
}

/// A triangle as three indices into the point list.
#[derive(Debug, Clone, Copy)]
struct Triangle(usize, usize, usize);

/// Linearly interpolate the elevation at (x, y), NaN outside the hull.
fn interpolate_at(x: f64, y: f64, points: &[SurfacePoint], triangles: &[Triangle]) -> f64 {
    // Inclusion tolerance so cell centers on a shared edge are not dropped.
    const EDGE_EPS: f64 = -1e-10;

    for tri in triangles {
        let (a, b, c) = (&points[tri.0], &points[tri.1], &points[tri.2]);
        if let Some((u, v, w)) = barycentric(x, y, a, b, c) {
            if u >= EDGE_EPS && v >= EDGE_EPS && w >= EDGE_EPS {
                return u * a.z + v * b.z + w * c.z;
            }
        }
    }
    f64::NAN
}

/// Barycentric weights of (x, y) with respect to triangle (a, b, c), or None
/// for a degenerate triangle.
fn barycentric(
    x: f64,
    y: f64,
    a: &SurfacePoint,
    b: &SurfacePoint,
    c: &SurfacePoint,
) -> Option<(f64, f64, f64)> {
    let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if det.abs() < 1e-12 {
        return None;
    }
    let u = ((b.y - c.y) * (x - c.x) + (c.x - b.x) * (y - c.y)) / det;
    let v = ((c.y - a.y) * (x - c.x) + (a.x - c.x) * (y - c.y)) / det;
    Some((u, v, 1.0 - u - v))
}

/// Squared circumcircle test: does the circumcircle of (a, b, c) contain p?
fn in_circumcircle(p: &SurfacePoint, a: &SurfacePoint, b: &SurfacePoint, c: &SurfacePoint) -> bool {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        return false;
    }

    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;

    let r2 = (a.x - ux).powi(2) + (a.y - uy).powi(2);
    (p.x - ux).powi(2) + (p.y - uy).powi(2) <= r2
}

/// Incremental Bowyer-Watson Delaunay triangulation.
///
/// Returns triangles as indices into `points`; empty when all points are
/// collinear.
fn triangulate(points: &[SurfacePoint]) -> Vec<Triangle> {
    let bbox = match BoundingBox::from_points(points.iter().map(|p| (p.x, p.y))) {
        Ok(b) => b,
        Err(_) => return Vec::new(),
    };
    let span = bbox.width().max(bbox.height()).max(1.0);

    // Vertices 0..3 form a super-triangle enclosing all input points; they
    // are stripped again at the end.
    let mut verts: Vec<SurfacePoint> = vec![
        SurfacePoint::new(bbox.min_x - 10.0 * span, bbox.min_y - span, 0.0),
        SurfacePoint::new(bbox.min_x + bbox.width() / 2.0, bbox.max_y + 10.0 * span, 0.0),
        SurfacePoint::new(bbox.max_x + 10.0 * span, bbox.min_y - span, 0.0),
    ];
    let mut tris: Vec<Triangle> = vec![Triangle(0, 1, 2)];

    for point in points {
        let vi = verts.len();
        verts.push(*point);

        // Triangles whose circumcircle contains the new point get removed
        // and their cavity is re-triangulated around the point.
        let mut bad: Vec<usize> = Vec::new();
        for (ti, tri) in tris.iter().enumerate() {
            if in_circumcircle(point, &verts[tri.0], &verts[tri.1], &verts[tri.2]) {
                bad.push(ti);
            }
        }

        let mut cavity: Vec<(usize, usize)> = Vec::new();
        for &bi in &bad {
            let t = tris[bi];
            for edge in [(t.0, t.1), (t.1, t.2), (t.2, t.0)] {
                let shared = bad.iter().any(|&oi| {
                    if oi == bi {
                        return false;
                    }
                    let o = tris[oi];
                    [(o.0, o.1), (o.1, o.2), (o.2, o.0)]
                        .iter()
                        .any(|&(p, q)| (p == edge.0 && q == edge.1) || (p == edge.1 && q == edge.0))
                });
                if !shared {
                    cavity.push(edge);
                }
            }
        }

        bad.sort_unstable_by(|a, b| b.cmp(a));
        for bi in bad {
            tris.swap_remove(bi);
        }
        for (p, q) in cavity {
            tris.push(Triangle(p, q, vi));
        }
    }

    // Drop anything still touching the super-triangle and shift indices
    // back into the input point list.
    tris.retain(|t| t.0 >= 3 && t.1 >= 3 && t.2 >= 3);
    for t in &mut tris {
        t.0 -= 3;
        t.1 -= 3;
        t.2 -= 3;
    }

    // Collinear triples produce zero-area triangles; drop them so callers
    // can tell a degenerate cloud from a valid triangulation.
    tris.retain(|t| {
        let (a, b, c) = (&points[t.0], &points[t.1], &points[t.2]);
        let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
        det.abs() > 1e-12
    });
    tris
}

#[cfg(test)]
mod tests {
    use super::*;
    use msi_common::EpsgCode;

    fn surface(points: Vec<SurfacePoint>) -> PointSurface {
        PointSurface {
            points,
            crs: EpsgCode(2960),
        }
    }

    fn flat_corners(z: f64) -> PointSurface {
        surface(vec![
            SurfacePoint::new(0.0, 0.0, z),
            SurfacePoint::new(10.0, 0.0, z),
            SurfacePoint::new(0.0, 10.0, z),
            SurfacePoint::new(10.0, 10.0, z),
        ])
    }

    #[test]
    fn test_too_few_points() {
        let s = surface(vec![
            SurfacePoint::new(0.0, 0.0, -5.0),
            SurfacePoint::new(1.0, 0.0, -5.0),
        ]);
        assert!(matches!(
            rasterize_surface(&s, 1.0, 1.0),
            Err(RasterError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_collinear_points_rejected() {
        // All points on one diagonal line cannot form a triangle once the
        // super-triangle is stripped.
        let s = surface(vec![
            SurfacePoint::new(0.0, 0.0, -5.0),
            SurfacePoint::new(5.0, 5.0, -5.0),
            SurfacePoint::new(10.0, 10.0, -5.0),
        ]);
        assert!(matches!(
            rasterize_surface(&s, 1.0, 1.0),
            Err(RasterError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_non_finite_points_filtered() {
        let s = surface(vec![
            SurfacePoint::new(0.0, 0.0, -5.0),
            SurfacePoint::new(10.0, 0.0, f64::NAN),
            SurfacePoint::new(1.0, 0.0, -5.0),
        ]);
        // Only two finite points remain
        assert!(rasterize_surface(&s, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_extent_and_resolution() {
        let grid = rasterize_surface(&flat_corners(-5.0), 10.0, 10.0).unwrap();
        // 10x10 extent at 10 m cells: one cell each way, covering the bbox
        assert_eq!(grid.width(), 1);
        assert_eq!(grid.height(), 1);
        assert_eq!(grid.resolution(), (10.0, 10.0));
        assert_eq!(grid.cell_center(0, 0), (5.0, 5.0));
    }

    #[test]
    fn test_flat_surface_value() {
        let grid = rasterize_surface(&flat_corners(-5.0), 10.0, 10.0).unwrap();
        let z = grid.value(ELEVATION_BAND, 0, 0).unwrap();
        assert!((z - (-5.0)).abs() < 1e-9, "flat plane should stay -5, got {z}");
    }

    #[test]
    fn test_tilted_plane_is_linear() {
        // z = x + y
        let s = surface(vec![
            SurfacePoint::new(0.0, 0.0, 0.0),
            SurfacePoint::new(10.0, 0.0, 10.0),
            SurfacePoint::new(0.0, 10.0, 10.0),
            SurfacePoint::new(10.0, 10.0, 20.0),
        ]);
        let grid = rasterize_surface(&s, 2.0, 2.0).unwrap();

        for row in 0..grid.height() {
            for col in 0..grid.width() {
                let (x, y) = grid.cell_center(col, row);
                let z = grid.value(ELEVATION_BAND, col, row).unwrap();
                if z.is_finite() {
                    assert!(
                        (z - (x + y)).abs() < 1e-6,
                        "expected {} at ({x}, {y}), got {z}",
                        x + y
                    );
                }
            }
        }
    }

    #[test]
    fn test_outside_hull_is_null() {
        // L-shaped cloud: the far corner of the bbox is outside the hull
        let s = surface(vec![
            SurfacePoint::new(0.0, 0.0, -5.0),
            SurfacePoint::new(20.0, 0.0, -5.0),
            SurfacePoint::new(0.0, 20.0, -5.0),
        ]);
        let grid = rasterize_surface(&s, 2.0, 2.0).unwrap();

        // Far corner cell center (19, 19) lies well outside the triangle
        let far = grid.value(ELEVATION_BAND, grid.width() - 1, grid.height() - 1).unwrap();
        assert!(far.is_nan(), "outside-hull cell must stay null, got {far}");

        // Near corner is inside
        let near = grid.value(ELEVATION_BAND, 0, 0).unwrap();
        assert!(near.is_finite());
    }

    #[test]
    fn test_dense_cloud_mostly_defined() {
        let mut points = Vec::new();
        for i in 0..6 {
            for j in 0..6 {
                let (x, y) = (i as f64 * 2.0, j as f64 * 2.0);
                points.push(SurfacePoint::new(x, y, -(x + y)));
            }
        }
        let grid = rasterize_surface(&surface(points), 1.0, 1.0).unwrap();

        let band = grid.band(ELEVATION_BAND).unwrap();
        let defined = band.iter().filter(|v| v.is_finite()).count();
        assert!(
            defined * 2 > band.len(),
            "most cells should interpolate, got {defined}/{}",
            band.len()
        );
    }
}
