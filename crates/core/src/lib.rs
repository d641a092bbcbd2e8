//! Fire Risk Core Library
//!
//! Computational core of a municipal wildfire decision-support system. Scores
//! fire-weather danger, derives spatial risk from incident history, projects a
//! wind-driven spread perimeter, and reports which infrastructure falls inside it
//! and which fire station should respond.
//!
//! ## Components
//!
//! - [`weather`]: temperature/humidity/wind danger index and category
//! - [`risk`]: k-means epicenters or a random-forest probability grid, with an
//!   optional content-addressed training cache
//! - [`spread`]: elliptical perimeter projection and polygon geometry
//! - [`impact`]: point-in-polygon infrastructure exposure
//! - [`dispatch`]: nearest fire station and response urgency
//! - [`analytics`], [`briefing`]: history statistics and the situation summary
//!
//! Every component is a pure function of its inputs. No I/O is performed and no
//! state is kept between calls.
//!
//! ```
//! use fire_risk_core::{project, score, DangerCategory, SpreadParams};
//!
//! let risk = score(34.0, 12.0, 25.0).unwrap();
//! assert_eq!(risk.category, DangerCategory::VeryHigh);
//!
//! let perimeter = project(31.7389, -106.4856, 45.0, 25.0, &SpreadParams::default()).unwrap();
//! assert!(perimeter.area_km2() > 0.0);
//! ```

// Shared records, configuration and errors
pub mod config;
pub mod core_types;
pub mod error;

// Scoring and modeling
pub mod risk;
pub mod spread;
pub mod weather;

// Consumers of the models
pub mod analytics;
pub mod briefing;
pub mod dispatch;
pub mod impact;

// Re-export core types
pub use config::{CacheParams, ClassifierParams, ClusterParams, EngineConfig, SpreadParams};
pub use core_types::{
    AssetCategory, BoundingBox, GeoPoint, IncidentRecord, InfrastructureAsset,
    WeatherObservation, WeatherSnapshot,
};
pub use error::{EngineError, Result};

// Re-export component entry points
pub use briefing::{summarize, OperationalStatus, SituationSummary};
pub use dispatch::{nearest_station, DispatchAssignment, ResponseUrgency};
pub use impact::{find_impacted, ImpactFinding, ImpactReport};
pub use risk::{
    create_risk_model, RiskEpicenter, RiskGrid, RiskModelCache, RiskStrategy, RiskSurface,
    SpatialRiskModel,
};
pub use spread::{project, Polygon, SpreadPerimeter};
pub use weather::{score, DangerCategory, RiskAssessment};
