//! Engine configuration
//!
//! Each component takes its own parameter set so callers can override a single
//! knob without building a full [`EngineConfig`]. All parameter sets are plain
//! serde structs with defaults matching the reference behaviour of the municipal
//! dashboard (5 epicenters, 40×40 risk lattice, 36-vertex perimeter).
//!
//! # Example
//! ```
//! use fire_risk_core::config::{EngineConfig, SpreadParams};
//!
//! let config = EngineConfig {
//!     spread: SpreadParams { duration_hours: 3.0, ..SpreadParams::default() },
//!     ..EngineConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Seed shared by every stochastic step unless overridden
pub const DEFAULT_SEED: u64 = 42;

/// Parameters for k-means epicenter extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterParams {
    /// Number of clusters requested
    pub k: usize,
    /// Seed for k-means++ initialisation
    pub seed: u64,
    /// Independent restarts; the lowest-inertia run wins
    pub n_init: usize,
    /// Lloyd iteration cap per restart
    pub max_iterations: usize,
    /// Stop once no centroid moves more than this (degrees)
    pub tolerance: f64,
}

impl Default for ClusterParams {
    fn default() -> Self {
        Self {
            k: 5,
            seed: DEFAULT_SEED,
            n_init: 10,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

impl ClusterParams {
    /// Defaults with a different cluster count
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Self::default()
        }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(EngineError::invalid("k", "cluster count must be positive"));
        }
        if self.n_init == 0 {
            return Err(EngineError::invalid("n_init", "must be at least 1"));
        }
        if self.max_iterations == 0 {
            return Err(EngineError::invalid("max_iterations", "must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(EngineError::invalid(
                "tolerance",
                format!("must be finite and non-negative, got {}", self.tolerance),
            ));
        }
        Ok(())
    }
}

/// Parameters for the supervised grid-probability model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Trees in the random forest
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Nodes with fewer samples become leaves
    pub min_samples_split: usize,
    /// Lattice resolution per axis (N for an N×N grid)
    pub grid_resolution: usize,
    /// Cells with probability strictly above this are reported as high risk
    pub threshold: f64,
    /// Minimum usable incidents before training is attempted
    pub min_incidents: usize,
    /// Fraction of samples held out for accuracy
    pub test_fraction: f64,
    /// Seed for negative sampling, the split and bootstrap draws
    pub seed: u64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 12,
            min_samples_split: 2,
            grid_resolution: 40,
            threshold: 0.5,
            min_incidents: 10,
            test_fraction: 0.2,
            seed: DEFAULT_SEED,
        }
    }
}

impl ClassifierParams {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(EngineError::invalid("n_trees", "must be at least 1"));
        }
        if self.max_depth == 0 {
            return Err(EngineError::invalid("max_depth", "must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(EngineError::invalid(
                "min_samples_split",
                format!("must be at least 2, got {}", self.min_samples_split),
            ));
        }
        if self.grid_resolution < 2 {
            return Err(EngineError::invalid(
                "grid_resolution",
                format!("must be at least 2, got {}", self.grid_resolution),
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(EngineError::invalid(
                "threshold",
                format!("must be within [0, 1], got {}", self.threshold),
            ));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(EngineError::invalid(
                "test_fraction",
                format!("must be within (0, 1), got {}", self.test_fraction),
            ));
        }
        if self.min_incidents < 2 {
            return Err(EngineError::invalid(
                "min_incidents",
                format!("must be at least 2, got {}", self.min_incidents),
            ));
        }
        Ok(())
    }
}

/// Parameters for the wind-driven spread projector
///
/// `spread_coefficient` and `axis_ratio` are empirical, not derived from a
/// physical model; tune them per fuel type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadParams {
    /// Modeled duration in hours
    pub duration_hours: f64,
    /// Kilometres of major axis per (km/h × hour) of wind
    pub spread_coefficient: f64,
    /// Minor axis as a fraction of the major axis
    pub axis_ratio: f64,
    /// Vertices in the output ring
    pub vertex_count: usize,
    /// Floor applied to the major axis so calm wind still yields an area (km)
    pub min_major_axis_km: f64,
    /// Ignition latitudes beyond this are refused (flat-Earth breakdown)
    pub max_abs_latitude: f64,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            duration_hours: 1.0,
            spread_coefficient: 0.1,
            axis_ratio: 0.4,
            vertex_count: 36,
            min_major_axis_km: 0.05,
            max_abs_latitude: 85.0,
        }
    }
}

impl SpreadParams {
    /// Defaults with a different modeled duration
    pub fn for_duration(duration_hours: f64) -> Self {
        Self {
            duration_hours,
            ..Self::default()
        }
    }

    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if !self.duration_hours.is_finite() || self.duration_hours < 0.0 {
            return Err(EngineError::invalid(
                "duration_hours",
                format!("must be finite and non-negative, got {}", self.duration_hours),
            ));
        }
        if !self.spread_coefficient.is_finite() || self.spread_coefficient < 0.0 {
            return Err(EngineError::invalid(
                "spread_coefficient",
                format!(
                    "must be finite and non-negative, got {}",
                    self.spread_coefficient
                ),
            ));
        }
        if !(self.axis_ratio > 0.0 && self.axis_ratio <= 1.0) {
            return Err(EngineError::invalid(
                "axis_ratio",
                format!("must be within (0, 1], got {}", self.axis_ratio),
            ));
        }
        if self.vertex_count < 3 {
            return Err(EngineError::invalid(
                "vertex_count",
                format!("must be at least 3, got {}", self.vertex_count),
            ));
        }
        if !self.min_major_axis_km.is_finite() || self.min_major_axis_km <= 0.0 {
            return Err(EngineError::invalid(
                "min_major_axis_km",
                format!("must be finite and positive, got {}", self.min_major_axis_km),
            ));
        }
        if !(self.max_abs_latitude > 0.0 && self.max_abs_latitude < 90.0) {
            return Err(EngineError::invalid(
                "max_abs_latitude",
                format!("must be within (0, 90), got {}", self.max_abs_latitude),
            ));
        }
        Ok(())
    }
}

/// Parameters for the trained-model cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheParams {
    /// Threads in the bounded training pool
    pub worker_threads: usize,
    /// Fingerprints retained before the oldest is evicted
    pub capacity: usize,
}

impl Default for CacheParams {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            capacity: 32,
        }
    }
}

impl CacheParams {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == 0 {
            return Err(EngineError::invalid("worker_threads", "must be at least 1"));
        }
        if self.capacity == 0 {
            return Err(EngineError::invalid("capacity", "must be at least 1"));
        }
        Ok(())
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Epicenter clustering
    pub cluster: ClusterParams,
    /// Grid-probability classifier
    pub classifier: ClassifierParams,
    /// Spread projector
    pub spread: SpreadParams,
    /// Model cache
    pub cache: CacheParams,
}

impl EngineConfig {
    /// Lighter preset for interactive use: fewer trees, coarser lattice, fewer restarts
    pub fn fast() -> Self {
        Self {
            cluster: ClusterParams {
                n_init: 3,
                ..ClusterParams::default()
            },
            classifier: ClassifierParams {
                n_trees: 25,
                max_depth: 8,
                grid_resolution: 20,
                ..ClassifierParams::default()
            },
            ..Self::default()
        }
    }

    /// Validate every parameter set
    pub fn validate(&self) -> Result<()> {
        self.cluster.validate()?;
        self.classifier.validate()?;
        self.spread.validate()?;
        self.cache.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::fast().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ClusterParams::with_k(0).validate().is_err());
        let spread = SpreadParams {
            vertex_count: 2,
            ..SpreadParams::default()
        };
        assert!(matches!(
            spread.validate(),
            Err(EngineError::InvalidInput {
                parameter: "vertex_count",
                ..
            })
        ));
        let spread = SpreadParams {
            min_major_axis_km: 0.0,
            ..SpreadParams::default()
        };
        assert!(spread.validate().is_err());
        let classifier = ClassifierParams {
            threshold: 1.5,
            ..ClassifierParams::default()
        };
        assert!(classifier.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "cluster": { "k": 3 }, "spread": { "vertex_count": 72 } }"#)
                .unwrap();
        assert_eq!(config.cluster.k, 3);
        assert_eq!(config.cluster.n_init, 10);
        assert_eq!(config.spread.vertex_count, 72);
        assert_eq!(config.classifier, ClassifierParams::default());
    }
}
