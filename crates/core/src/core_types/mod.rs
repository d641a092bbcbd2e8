//! Core types and utilities

pub mod geo;
pub mod incident;
pub mod infrastructure;
pub mod units;
pub mod weather;

pub use geo::{BoundingBox, GeoPoint, KM_PER_DEGREE};
pub use incident::IncidentRecord;
pub use infrastructure::{AssetCategory, InfrastructureAsset};
pub use units::*;
pub use weather::{WeatherObservation, WeatherSnapshot};
