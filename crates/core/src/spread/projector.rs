//! Wind-driven elliptical spread perimeter
//!
//! The perimeter is an ellipse whose trailing tip sits on the ignition point and
//! whose major axis points along the heading derived from the wind direction:
//!
//! ```text
//! major = max(wind_speed × duration × coefficient, min_major_axis)
//! minor = axis_ratio × major
//! x(θ)  = major/2 · cos θ + major/2
//! y(θ)  = minor/2 · sin θ                  θ = π + 2πi/n,  i = 0..n
//! ```
//!
//! The local frame is rotated by `wind_dir − 90°` and converted to degrees with
//! the flat-Earth factors in [`GeoPoint::offset_km`]. With that rotation a wind
//! direction of 90° stretches the ellipse east (+longitude) and 0° stretches it
//! south (−latitude).
//!
//! The model is geometric only. Fuel, slope and moisture are not considered.

use super::polygon::Polygon;
use crate::config::SpreadParams;
use crate::core_types::geo::GeoPoint;
use crate::error::{ensure_coordinates, ensure_non_negative, EngineError, Result};
use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use tracing::debug;

/// Projected fire perimeter for one ignition and wind vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadPerimeter {
    /// Ignition point (also vertex 0)
    pub ignition: GeoPoint,
    /// Wind direction used, degrees
    pub wind_dir_deg: f64,
    /// Wind speed used, km/h
    pub wind_speed_kmh: f64,
    /// Modeled duration, hours
    pub duration_hours: f64,
    /// Full major axis after flooring, km
    pub major_axis_km: f64,
    /// Full minor axis, km
    pub minor_axis_km: f64,
    /// Open ring; the closing edge back to vertex 0 is implicit
    pub vertices: Vec<GeoPoint>,
    head: GeoPoint,
}

impl SpreadPerimeter {
    /// Number of ring vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Ring as a [`Polygon`] for impact analysis
    pub fn polygon(&self) -> Polygon {
        Polygon::from_ring(self.vertices.clone())
    }

    /// Approximate enclosed area, km²
    pub fn area_km2(&self) -> f64 {
        self.polygon().area_km2()
    }

    /// Area-weighted centroid
    pub fn centroid(&self) -> GeoPoint {
        self.polygon().centroid()
    }

    /// Leading tip of the major axis (a ring vertex when the vertex count is even)
    #[inline]
    pub fn head_point(&self) -> GeoPoint {
        self.head
    }
}

/// Project a spread perimeter
///
/// # Errors
///
/// - `InvalidInput`: ignition outside valid coordinates or beyond
///   `params.max_abs_latitude`; negative or non-finite wind speed; any bad
///   field in `params`
/// - `GeometryDegenerate`: the ring encloses zero area
///
/// # Example
///
/// ```
/// use fire_risk_core::config::SpreadParams;
/// use fire_risk_core::spread::project;
///
/// let perimeter = project(31.7389, -106.4856, 90.0, 40.0, &SpreadParams::default()).unwrap();
/// assert_eq!(perimeter.vertex_count(), 36);
/// assert!(perimeter.centroid().lon > -106.4856);
/// ```
pub fn project(
    ignition_lat: f64,
    ignition_lon: f64,
    wind_dir_deg: f64,
    wind_speed_kmh: f64,
    params: &SpreadParams,
) -> Result<SpreadPerimeter> {
    params.validate()?;
    ensure_coordinates(ignition_lat, ignition_lon)?;
    if ignition_lat.abs() > params.max_abs_latitude {
        return Err(EngineError::invalid(
            "latitude",
            format!(
                "|{ignition_lat}| exceeds {} where the flat-Earth conversion breaks down",
                params.max_abs_latitude
            ),
        ));
    }
    if !wind_dir_deg.is_finite() {
        return Err(EngineError::invalid(
            "wind_dir_deg",
            format!("must be finite, got {wind_dir_deg}"),
        ));
    }
    let wind_speed_kmh = ensure_non_negative("wind_speed_kmh", wind_speed_kmh)?;

    let major = (wind_speed_kmh * params.duration_hours * params.spread_coefficient)
        .max(params.min_major_axis_km);
    let minor = params.axis_ratio * major;
    let (semi_major, semi_minor) = (major / 2.0, minor / 2.0);

    let ignition = GeoPoint::new(ignition_lat, ignition_lon);
    let rotation = Rotation2::new((wind_dir_deg - 90.0).to_radians());
    let to_geo = |local: Vector2<f64>| {
        let world = rotation * local;
        ignition.offset_km(world.x, world.y)
    };

    let n = params.vertex_count;
    let vertices: Vec<GeoPoint> = (0..n)
        .map(|i| {
            let theta = PI + TAU * i as f64 / n as f64;
            to_geo(Vector2::new(
                semi_major * theta.cos() + semi_major,
                semi_minor * theta.sin(),
            ))
        })
        .collect();
    let head = to_geo(Vector2::new(major, 0.0));

    let perimeter = SpreadPerimeter {
        ignition,
        wind_dir_deg,
        wind_speed_kmh,
        duration_hours: params.duration_hours,
        major_axis_km: major,
        minor_axis_km: minor,
        vertices,
        head,
    };

    if perimeter.polygon().is_degenerate() {
        return Err(EngineError::GeometryDegenerate(format!(
            "perimeter at ({ignition_lat}, {ignition_lon}) encloses zero area"
        )));
    }

    debug!(
        major_km = major,
        minor_km = minor,
        vertices = n,
        "projected spread perimeter"
    );

    Ok(perimeter)
}
