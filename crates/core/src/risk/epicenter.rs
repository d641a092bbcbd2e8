//! Unsupervised risk epicenters from incident history
//!
//! Incident coordinates are clustered with k-means over raw (latitude, longitude)
//! pairs. This treats degrees as a plane: one degree of longitude is shorter than
//! one degree of latitude away from the equator, so clusters are slightly
//! stretched east-west. Acceptable at city scale, not across regions.

use super::kmeans::{Clusterer, KMeans, Point2};
use crate::config::ClusterParams;
use crate::core_types::incident::IncidentRecord;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{info, warn};

/// A cluster is CRITICAL when it holds more than this multiple of the average load
pub const CRITICAL_LOAD_FACTOR: f64 = 1.2;

/// Severity of an epicenter relative to the average cluster load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeverityTier {
    /// At or below 1.2 × the average incidents per cluster
    High,
    /// Above 1.2 × the average incidents per cluster
    Critical,
}

/// A spatial hot-zone derived from incident history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEpicenter {
    /// Cluster id, 1-based
    pub id: usize,
    /// Centroid latitude
    pub lat: f64,
    /// Centroid longitude
    pub lon: f64,
    /// Incidents assigned to this cluster
    pub member_count: usize,
    /// Severity tier
    pub severity: SeverityTier,
}

/// Extract epicenters with the default seeded k-means
///
/// # Errors
///
/// `InvalidInput` for bad parameters (e.g. `k == 0`); `InsufficientData` when
/// fewer than `k` incidents have usable coordinates.
///
/// # Example
///
/// ```
/// use fire_risk_core::config::ClusterParams;
/// use fire_risk_core::risk::extract_epicenters;
///
/// let err = extract_epicenters(&[], &ClusterParams::with_k(3)).unwrap_err();
/// assert!(matches!(err, fire_risk_core::EngineError::InsufficientData { .. }));
/// ```
pub fn extract_epicenters(
    history: &[IncidentRecord],
    params: &ClusterParams,
) -> Result<Vec<RiskEpicenter>> {
    params.validate()?;
    extract_epicenters_with(history, params.k, &KMeans::new(params))
}

/// Extract epicenters with a caller-supplied clusterer
///
/// Output is sorted by member count descending, ties by ascending id. Clusters
/// left without members are omitted, so at most `k` epicenters are returned and
/// their member counts always sum to the number of incidents used.
///
/// # Errors
///
/// As [`extract_epicenters`], plus `ModelTrainingFailure` when the clusterer
/// returns a result of the wrong shape (see [`Clustering::validate`](super::kmeans::Clustering::validate)).
pub fn extract_epicenters_with<C>(
    history: &[IncidentRecord],
    k: usize,
    clusterer: &C,
) -> Result<Vec<RiskEpicenter>>
where
    C: Clusterer + ?Sized,
{
    if k == 0 {
        return Err(EngineError::invalid("k", "cluster count must be positive"));
    }

    let points: Vec<Point2> = history
        .iter()
        .filter(|r| r.has_valid_location())
        .map(|r| Point2::new(r.lat, r.lon))
        .collect();

    let dropped = history.len() - points.len();
    if dropped > 0 {
        warn!(dropped, "ignoring incidents without usable coordinates");
    }
    if points.len() < k {
        return Err(EngineError::insufficient(
            "epicenter clustering",
            k,
            points.len(),
        ));
    }

    let clustering = clusterer.cluster(&points, k)?;
    clustering.validate(points.len(), k)?;
    let counts = clustering.member_counts();
    let average_load = points.len() as f64 / k as f64;

    let mut epicenters: Vec<RiskEpicenter> = clustering
        .centroids
        .iter()
        .zip(counts)
        .enumerate()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(index, (centroid, member_count))| RiskEpicenter {
            id: index + 1,
            lat: centroid.x,
            lon: centroid.y,
            member_count,
            severity: if member_count as f64 > CRITICAL_LOAD_FACTOR * average_load {
                SeverityTier::Critical
            } else {
                SeverityTier::High
            },
        })
        .collect();

    let empty = k.saturating_sub(epicenters.len());
    if empty > 0 {
        warn!(empty, "k-means left clusters without members");
    }

    epicenters.sort_by_key(|e| (Reverse(e.member_count), e.id));

    info!(
        incidents = points.len(),
        k,
        epicenters = epicenters.len(),
        critical = epicenters
            .iter()
            .filter(|e| e.severity == SeverityTier::Critical)
            .count(),
        "extracted risk epicenters"
    );

    Ok(epicenters)
}
