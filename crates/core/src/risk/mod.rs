//! Spatial risk modeling from incident history
//!
//! Two interchangeable strategies implement [`SpatialRiskModel`]:
//!
//! - [`EpicenterModel`]: unsupervised k-means epicenters ([`epicenter`])
//! - [`GridProbabilityModel`]: supervised random-forest probability lattice ([`grid`])
//!
//! Both recompute from scratch on every call. Repeated requests over unchanged
//! history should go through [`RiskModelCache`], which memoizes by content
//! fingerprint and runs training on a bounded worker pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use fire_risk_core::risk::{create_risk_model, RiskStrategy};
//! use fire_risk_core::EngineConfig;
//!
//! let model = create_risk_model(RiskStrategy::Epicenters, &EngineConfig::default(), today);
//! let surface = model.train_and_query(&history)?;
//! ```

pub mod cache;
pub mod epicenter;
pub mod forest;
pub mod grid;
pub mod kmeans;

pub use cache::RiskModelCache;
pub use epicenter::{extract_epicenters, extract_epicenters_with, RiskEpicenter, SeverityTier};
pub use forest::{Classifier, Features, ProbabilityModel, RandomForest};
pub use grid::{train_grid_model, train_grid_model_with, RiskGrid, RiskGridCell};
pub use kmeans::{Clusterer, Clustering, KMeans};

use crate::config::{ClassifierParams, ClusterParams, EngineConfig};
use crate::core_types::incident::IncidentRecord;
use crate::error::Result;
use chrono::NaiveDate;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use tracing::info;

/// Output of a spatial risk model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskSurface {
    /// Cluster epicenters, most loaded first
    Epicenters(Vec<RiskEpicenter>),
    /// Probability lattice
    Grid(RiskGrid),
}

impl RiskSurface {
    /// Epicenters, if this surface came from the clustering strategy
    pub fn epicenters(&self) -> Option<&[RiskEpicenter]> {
        match self {
            RiskSurface::Epicenters(list) => Some(list),
            RiskSurface::Grid(_) => None,
        }
    }

    /// Grid, if this surface came from the classifier strategy
    pub fn grid(&self) -> Option<&RiskGrid> {
        match self {
            RiskSurface::Grid(grid) => Some(grid),
            RiskSurface::Epicenters(_) => None,
        }
    }
}

/// Strategy selector for [`create_risk_model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskStrategy {
    /// Unsupervised k-means epicenters
    Epicenters,
    /// Supervised grid-probability classifier
    GridProbability,
}

/// Backend-agnostic interface for spatial risk strategies
pub trait SpatialRiskModel: Send + Sync {
    /// Fit on `history` and return the resulting surface
    ///
    /// # Errors
    ///
    /// Strategy-specific; see [`extract_epicenters`] and [`train_grid_model`].
    fn train_and_query(&self, history: &[IncidentRecord]) -> Result<RiskSurface>;

    /// Hash of every parameter that influences the output
    ///
    /// Two models with equal keys must produce equal surfaces for equal history.
    fn parameter_key(&self) -> u64;

    /// Short strategy name for logs
    fn name(&self) -> &'static str;
}

/// k-means epicenter strategy
#[derive(Debug, Clone, PartialEq)]
pub struct EpicenterModel {
    /// Clustering parameters
    pub params: ClusterParams,
}

impl SpatialRiskModel for EpicenterModel {
    fn train_and_query(&self, history: &[IncidentRecord]) -> Result<RiskSurface> {
        extract_epicenters(history, &self.params).map(RiskSurface::Epicenters)
    }

    fn parameter_key(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.name().hash(&mut hasher);
        self.params.k.hash(&mut hasher);
        self.params.seed.hash(&mut hasher);
        self.params.n_init.hash(&mut hasher);
        self.params.max_iterations.hash(&mut hasher);
        self.params.tolerance.to_bits().hash(&mut hasher);
        hasher.finish()
    }

    fn name(&self) -> &'static str {
        "epicenters"
    }
}

/// Random-forest grid strategy for a given query date
#[derive(Debug, Clone, PartialEq)]
pub struct GridProbabilityModel {
    /// Classifier parameters
    pub params: ClassifierParams,
    /// Date whose month/weekday drive the lattice prediction
    pub query_date: NaiveDate,
}

impl SpatialRiskModel for GridProbabilityModel {
    fn train_and_query(&self, history: &[IncidentRecord]) -> Result<RiskSurface> {
        train_grid_model(history, self.query_date, &self.params).map(RiskSurface::Grid)
    }

    fn parameter_key(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.name().hash(&mut hasher);
        self.params.n_trees.hash(&mut hasher);
        self.params.max_depth.hash(&mut hasher);
        self.params.min_samples_split.hash(&mut hasher);
        self.params.grid_resolution.hash(&mut hasher);
        self.params.threshold.to_bits().hash(&mut hasher);
        self.params.min_incidents.hash(&mut hasher);
        self.params.test_fraction.to_bits().hash(&mut hasher);
        self.params.seed.hash(&mut hasher);
        self.query_date.hash(&mut hasher);
        hasher.finish()
    }

    fn name(&self) -> &'static str {
        "grid-probability"
    }
}

/// Create a spatial risk model for the requested strategy
///
/// `query_date` only matters for [`RiskStrategy::GridProbability`].
pub fn create_risk_model(
    strategy: RiskStrategy,
    config: &EngineConfig,
    query_date: NaiveDate,
) -> Box<dyn SpatialRiskModel> {
    info!(?strategy, "creating spatial risk model");
    match strategy {
        RiskStrategy::Epicenters => Box::new(EpicenterModel {
            params: config.cluster.clone(),
        }),
        RiskStrategy::GridProbability => Box::new(GridProbabilityModel {
            params: config.classifier.clone(),
            query_date,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_keys_distinguish_settings() {
        let a = EpicenterModel {
            params: ClusterParams::with_k(3),
        };
        let b = EpicenterModel {
            params: ClusterParams::with_k(4),
        };
        assert_ne!(a.parameter_key(), b.parameter_key());
        assert_eq!(a.parameter_key(), a.clone().parameter_key());

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let g1 = GridProbabilityModel {
            params: ClassifierParams::default(),
            query_date: date,
        };
        let g2 = GridProbabilityModel {
            params: ClassifierParams::default(),
            query_date: next,
        };
        assert_ne!(g1.parameter_key(), g2.parameter_key());
    }

    #[test]
    fn test_factory_selects_strategy() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let config = EngineConfig::default();
        assert_eq!(
            create_risk_model(RiskStrategy::Epicenters, &config, date).name(),
            "epicenters"
        );
        assert_eq!(
            create_risk_model(RiskStrategy::GridProbability, &config, date).name(),
            "grid-probability"
        );
    }
}
