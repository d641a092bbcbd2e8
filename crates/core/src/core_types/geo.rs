//! Geographic primitives shared by the risk, spread and dispatch components
//!
//! All geometry in the engine works on raw latitude/longitude degrees treated as a
//! plane. That is adequate at municipal scale (tens of kilometres) and wrong near
//! the poles or across the antimeridian; callers working at larger extents must
//! project first.

use serde::{Deserialize, Serialize};

/// Kilometres per degree of latitude used by every flat-Earth conversion
pub const KM_PER_DEGREE: f64 = 111.0;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (positive north)
    pub lat: f64,
    /// Longitude in degrees (positive east)
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point
    #[inline]
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both coordinates are finite numbers
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Planar Euclidean distance in degree space
    #[inline]
    pub fn planar_distance(&self, other: &GeoPoint) -> f64 {
        (self.lat - other.lat).hypot(self.lon - other.lon)
    }

    /// Offset this point by planar kilometres (x east, y north)
    ///
    /// Flat-Earth approximation: `Δlat = y / 111`, `Δlon = x / (111 × cos(lat))`.
    pub fn offset_km(&self, x_km: f64, y_km: f64) -> GeoPoint {
        let delta_lat = y_km / KM_PER_DEGREE;
        let delta_lon = x_km / (KM_PER_DEGREE * self.lat.to_radians().cos());
        GeoPoint::new(self.lat + delta_lat, self.lon + delta_lon)
    }

    /// Planar kilometre offset of `other` relative to this point (x east, y north)
    pub fn km_offset_to(&self, other: &GeoPoint) -> (f64, f64) {
        let y_km = (other.lat - self.lat) * KM_PER_DEGREE;
        let x_km = (other.lon - self.lon) * KM_PER_DEGREE * self.lat.to_radians().cos();
        (x_km, y_km)
    }
}

/// Axis-aligned latitude/longitude box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern edge
    pub lat_min: f64,
    /// Northern edge
    pub lat_max: f64,
    /// Western edge
    pub lon_min: f64,
    /// Eastern edge
    pub lon_max: f64,
}

impl BoundingBox {
    /// Smallest box containing every finite point, or `None` if there are none
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        points
            .into_iter()
            .filter(GeoPoint::is_finite)
            .fold(None, |acc, p| {
                Some(match acc {
                    None => BoundingBox {
                        lat_min: p.lat,
                        lat_max: p.lat,
                        lon_min: p.lon,
                        lon_max: p.lon,
                    },
                    Some(b) => BoundingBox {
                        lat_min: b.lat_min.min(p.lat),
                        lat_max: b.lat_max.max(p.lat),
                        lon_min: b.lon_min.min(p.lon),
                        lon_max: b.lon_max.max(p.lon),
                    },
                })
            })
    }

    /// Latitude extent in degrees
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Longitude extent in degrees
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Box has positive extent on both axes
    pub fn has_area(&self) -> bool {
        self.lat_span() > 0.0 && self.lon_span() > 0.0
    }

    /// Point lies inside or on the edge of the box
    pub fn contains(&self, p: &GeoPoint) -> bool {
        (self.lat_min..=self.lat_max).contains(&p.lat)
            && (self.lon_min..=self.lon_max).contains(&p.lon)
    }

    /// Regular `n × n` lattice spanning the box, edges included, row-major by latitude
    ///
    /// `n == 1` yields the box's south-west corner; `n == 0` yields nothing.
    pub fn lattice(&self, n: usize) -> Vec<GeoPoint> {
        let lats = linspace(self.lat_min, self.lat_max, n);
        let lons = linspace(self.lon_min, self.lon_max, n);
        lats.iter()
            .flat_map(|&lat| lons.iter().map(move |&lon| GeoPoint::new(lat, lon)))
            .collect()
    }
}

/// `n` evenly spaced samples from `start` to `end` inclusive
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}
