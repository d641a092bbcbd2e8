//! Critical infrastructure inventory

use crate::core_types::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a registered asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetCategory {
    /// Fuel station (explosion hazard inside a perimeter)
    FuelStation,
    /// School
    School,
    /// Fire station (the only category eligible for dispatch)
    FireStation,
    /// Hospital
    Hospital,
}

impl AssetCategory {
    /// All categories in declaration order
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::FuelStation,
        AssetCategory::School,
        AssetCategory::FireStation,
        AssetCategory::Hospital,
    ];

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            AssetCategory::FuelStation => "Fuel Station",
            AssetCategory::School => "School",
            AssetCategory::FireStation => "Fire Station",
            AssetCategory::Hospital => "Hospital",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A registered infrastructure asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfrastructureAsset {
    /// Stable identifier (e.g. an OSM node id)
    pub id: u64,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Asset category
    pub category: AssetCategory,
    /// Display name
    pub name: String,
}

impl InfrastructureAsset {
    /// Create a new asset
    pub fn new(id: u64, lat: f64, lon: f64, category: AssetCategory, name: impl Into<String>) -> Self {
        Self {
            id,
            lat,
            lon,
            category,
            name: name.into(),
        }
    }

    /// Asset location
    #[inline]
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}
