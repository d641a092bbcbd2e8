//! Closed lat/lon polygons
//!
//! Vertices are stored as an open ring (the closing edge from the last vertex
//! back to the first is implicit). Coordinates are degrees treated as a plane,
//! with `x = longitude` and `y = latitude`.

use crate::core_types::geo::{GeoPoint, KM_PER_DEGREE};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Distance in degrees within which a point counts as lying on an edge
pub const EDGE_TOLERANCE_DEG: f64 = 1e-12;

/// Area below this fraction of the squared bounding extent counts as zero
pub const ZERO_AREA_RELATIVE: f64 = 1e-9;

/// A simple closed polygon in degree space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<GeoPoint>,
}

impl Polygon {
    /// Build a polygon from an open ring of vertices
    ///
    /// # Errors
    ///
    /// `InvalidInput` for fewer than three vertices or any non-finite coordinate.
    pub fn new(vertices: Vec<GeoPoint>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(EngineError::invalid(
                "vertices",
                format!("a polygon needs at least 3 vertices, got {}", vertices.len()),
            ));
        }
        if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(EngineError::invalid(
                "vertices",
                format!("vertex {index} has a non-finite coordinate"),
            ));
        }
        Ok(Self { vertices })
    }

    /// Wrap a ring already known to be finite with at least three vertices
    pub(crate) fn from_ring(vertices: Vec<GeoPoint>) -> Self {
        debug_assert!(vertices.len() >= 3);
        Self { vertices }
    }

    /// Vertices in ring order
    #[inline]
    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    /// Number of vertices
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false; a polygon has at least three vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Edges as `(start, end)` pairs, closing edge included
    pub fn edges(&self) -> impl Iterator<Item = (&GeoPoint, &GeoPoint)> {
        let n = self.vertices.len();
        (0..n).map(move |i| (&self.vertices[i], &self.vertices[(i + 1) % n]))
    }

    /// Edges as `(x, y)` offsets in degrees from the first vertex
    ///
    /// Shoelace cross terms on absolute coordinates are ~1e3 deg² at city
    /// latitudes while a perimeter spans ~1e-6 deg², so sums cancel to noise.
    fn local_edges(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        let origin = self.vertices[0];
        let local = move |p: &GeoPoint| (p.lon - origin.lon, p.lat - origin.lat);
        self.edges().map(move |(a, b)| (local(a), local(b)))
    }

    /// Signed shoelace area in square degrees (positive when counter-clockwise)
    pub fn signed_area_deg2(&self) -> f64 {
        self.local_edges()
            .map(|((ax, ay), (bx, by))| ax * by - bx * ay)
            .sum::<f64>()
            / 2.0
    }

    /// Approximate area in km², projecting about the first vertex
    pub fn area_km2(&self) -> f64 {
        let origin = self.vertices[0];
        let cos_lat = origin.lat.to_radians().cos();
        self.signed_area_deg2().abs() * KM_PER_DEGREE * KM_PER_DEGREE * cos_lat
    }

    /// Largest side of the bounding box, in degrees
    fn extent_deg(&self) -> f64 {
        let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_lon, mut max_lon) = (f64::INFINITY, f64::NEG_INFINITY);
        for v in &self.vertices {
            min_lat = min_lat.min(v.lat);
            max_lat = max_lat.max(v.lat);
            min_lon = min_lon.min(v.lon);
            max_lon = max_lon.max(v.lon);
        }
        (max_lat - min_lat).max(max_lon - min_lon)
    }

    /// Encloses no area beyond rounding, relative to the ring's own extent
    pub fn is_degenerate(&self) -> bool {
        let extent = self.extent_deg();
        self.signed_area_deg2().abs() <= ZERO_AREA_RELATIVE * extent * extent
    }

    /// Area-weighted centroid; falls back to the vertex mean for zero area
    pub fn centroid(&self) -> GeoPoint {
        let origin = self.vertices[0];
        if self.is_degenerate() {
            let n = self.vertices.len() as f64;
            let (dlat, dlon) = self.vertices.iter().fold((0.0, 0.0), |(lat, lon), v| {
                (lat + (v.lat - origin.lat), lon + (v.lon - origin.lon))
            });
            return GeoPoint::new(origin.lat + dlat / n, origin.lon + dlon / n);
        }

        let (mut cx, mut cy) = (0.0, 0.0);
        for ((ax, ay), (bx, by)) in self.local_edges() {
            let cross = ax * by - bx * ay;
            cx += (ax + bx) * cross;
            cy += (ay + by) * cross;
        }
        let factor = 1.0 / (6.0 * self.signed_area_deg2());
        GeoPoint::new(origin.lat + cy * factor, origin.lon + cx * factor)
    }

    /// Point lies strictly inside or on the boundary
    ///
    /// Edge test first (within [`EDGE_TOLERANCE_DEG`]), then even-odd ray
    /// casting toward +longitude. Edges parallel to the ray never straddle it,
    /// so the crossing formula never divides by zero.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        if !point.is_finite() {
            return false;
        }
        if self.edges().any(|(a, b)| on_segment(point, a, b)) {
            return true;
        }

        let (x, y) = (point.lon, point.lat);
        let mut inside = false;
        for (a, b) in self.edges() {
            if (a.lat > y) != (b.lat > y) {
                let x_cross = a.lon + (y - a.lat) * (b.lon - a.lon) / (b.lat - a.lat);
                if x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

/// `p` is within tolerance of the segment `a`-`b`
fn on_segment(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> bool {
    let (dx, dy) = (b.lon - a.lon, b.lat - a.lat);
    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        return p.planar_distance(a) <= EDGE_TOLERANCE_DEG;
    }
    let t = (((p.lon - a.lon) * dx + (p.lat - a.lat) * dy) / length_sq).clamp(0.0, 1.0);
    let nearest = GeoPoint::new(a.lat + t * dy, a.lon + t * dx);
    p.planar_distance(&nearest) <= EDGE_TOLERANCE_DEG
}
