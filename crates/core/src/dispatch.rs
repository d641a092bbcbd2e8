//! Responder selection
//!
//! Picks the closest fire station by straight-line distance in degree space.
//! Road networks and live availability are the routing provider's business; the
//! route duration it returns can be tiered with [`ResponseUrgency`].

use crate::core_types::geo::{GeoPoint, KM_PER_DEGREE};
use crate::core_types::infrastructure::{AssetCategory, InfrastructureAsset};
use crate::error::{ensure_finite, EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Route durations up to this many minutes are nominal
pub const NOMINAL_MAX_MINUTES: f64 = 10.0;
/// Route durations up to this many minutes are delayed; longer is critical
pub const DELAYED_MAX_MINUTES: f64 = 20.0;

/// Selected responder for an incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchAssignment {
    /// Incident location
    pub incident: GeoPoint,
    /// Chosen fire station
    pub station: InfrastructureAsset,
    /// Planar distance in degrees
    pub distance_deg: f64,
}

impl DispatchAssignment {
    /// Distance converted with the flat-Earth factors at the incident latitude
    pub fn approx_distance_km(&self) -> f64 {
        let (x, y) = self.incident.km_offset_to(&self.station.location());
        x.hypot(y)
    }
}

/// All fire stations ordered by distance, ties by ascending id
///
/// # Errors
///
/// `InvalidInput` for non-finite incident coordinates.
pub fn rank_stations(
    incident_lat: f64,
    incident_lon: f64,
    assets: &[InfrastructureAsset],
) -> Result<Vec<DispatchAssignment>> {
    ensure_finite("incident_lat", incident_lat)?;
    ensure_finite("incident_lon", incident_lon)?;
    let incident = GeoPoint::new(incident_lat, incident_lon);

    let mut ranked: Vec<DispatchAssignment> = assets
        .iter()
        .filter(|a| a.category == AssetCategory::FireStation && a.location().is_finite())
        .map(|station| DispatchAssignment {
            incident,
            station: station.clone(),
            distance_deg: incident.planar_distance(&station.location()),
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_deg
            .total_cmp(&b.distance_deg)
            .then(a.station.id.cmp(&b.station.id))
    });
    Ok(ranked)
}

/// Nearest fire station to an incident
///
/// # Errors
///
/// `InvalidInput` for non-finite coordinates; `InsufficientData` when no
/// fire station is registered.
///
/// # Example
///
/// ```
/// use fire_risk_core::core_types::{AssetCategory, InfrastructureAsset};
/// use fire_risk_core::dispatch::nearest_station;
///
/// let assets = vec![
///     InfrastructureAsset::new(7, 31.80, -106.40, AssetCategory::FireStation, "Station 7"),
///     InfrastructureAsset::new(3, 31.70, -106.50, AssetCategory::FireStation, "Station 3"),
/// ];
/// let assignment = nearest_station(31.71, -106.49, &assets).unwrap();
/// assert_eq!(assignment.station.id, 3);
/// ```
pub fn nearest_station(
    incident_lat: f64,
    incident_lon: f64,
    assets: &[InfrastructureAsset],
) -> Result<DispatchAssignment> {
    let ranked = rank_stations(incident_lat, incident_lon, assets)?;
    let assignment = ranked
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::insufficient("fire station dispatch", 1, 0))?;

    debug!(
        station = assignment.station.id,
        distance_deg = assignment.distance_deg,
        "selected nearest fire station"
    );
    Ok(assignment)
}

/// Urgency tier for a routed response time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseUrgency {
    /// Up to 10 minutes
    Nominal,
    /// Over 10, up to 20 minutes
    Delayed,
    /// Over 20 minutes
    Critical,
}

impl ResponseUrgency {
    /// Tier a route duration in minutes
    ///
    /// # Errors
    ///
    /// `InvalidInput` for negative or non-finite durations.
    pub fn from_route_minutes(minutes: f64) -> Result<Self> {
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(EngineError::invalid(
                "route_minutes",
                format!("must be finite and non-negative, got {minutes}"),
            ));
        }
        Ok(if minutes <= NOMINAL_MAX_MINUTES {
            ResponseUrgency::Nominal
        } else if minutes <= DELAYED_MAX_MINUTES {
            ResponseUrgency::Delayed
        } else {
            ResponseUrgency::Critical
        })
    }

    /// Upper-case label
    pub fn label(&self) -> &'static str {
        match self {
            ResponseUrgency::Nominal => "NOMINAL",
            ResponseUrgency::Delayed => "DELAYED",
            ResponseUrgency::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for ResponseUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn station(id: u64, lat: f64, lon: f64) -> InfrastructureAsset {
        InfrastructureAsset::new(id, lat, lon, AssetCategory::FireStation, format!("Station {id}"))
    }

    #[test]
    fn test_only_fire_stations_are_candidates() {
        let assets = vec![
            InfrastructureAsset::new(1, 0.0, 0.0, AssetCategory::Hospital, "Closest but a hospital"),
            station(2, 1.0, 1.0),
        ];
        let assignment = nearest_station(0.0, 0.0, &assets).unwrap();
        assert_eq!(assignment.station.id, 2);
        assert_relative_eq!(assignment.distance_deg, 2f64.sqrt());
    }

    #[test]
    fn test_equidistant_stations_pick_lower_id() {
        let assets = vec![station(9, 0.0, 1.0), station(4, 0.0, -1.0), station(6, 1.0, 0.0)];
        let assignment = nearest_station(0.0, 0.0, &assets).unwrap();
        assert_eq!(assignment.station.id, 4);

        let ids: Vec<_> = rank_stations(0.0, 0.0, &assets)
            .unwrap()
            .iter()
            .map(|a| a.station.id)
            .collect();
        assert_eq!(ids, vec![4, 6, 9]);
    }

    #[test]
    fn test_errors() {
        let hospital = vec![InfrastructureAsset::new(1, 0.0, 0.0, AssetCategory::Hospital, "H")];
        assert!(matches!(
            nearest_station(0.0, 0.0, &hospital),
            Err(EngineError::InsufficientData { .. })
        ));
        assert!(matches!(
            nearest_station(f64::NAN, 0.0, &[station(1, 0.0, 0.0)]),
            Err(EngineError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_distance_km_at_equator() {
        let assignment = nearest_station(0.0, 0.0, &[station(1, 0.0, 0.1)]).unwrap();
        assert_relative_eq!(assignment.approx_distance_km(), 11.1, epsilon = 1e-9);
    }

    #[test]
    fn test_urgency_tiers() {
        assert_eq!(ResponseUrgency::from_route_minutes(0.0), Ok(ResponseUrgency::Nominal));
        assert_eq!(ResponseUrgency::from_route_minutes(10.0), Ok(ResponseUrgency::Nominal));
        assert_eq!(ResponseUrgency::from_route_minutes(10.5), Ok(ResponseUrgency::Delayed));
        assert_eq!(ResponseUrgency::from_route_minutes(20.0), Ok(ResponseUrgency::Delayed));
        assert_eq!(ResponseUrgency::from_route_minutes(20.1), Ok(ResponseUrgency::Critical));
        assert!(ResponseUrgency::from_route_minutes(-1.0).is_err());
        assert!(ResponseUrgency::from_route_minutes(f64::INFINITY).is_err());
    }
}
