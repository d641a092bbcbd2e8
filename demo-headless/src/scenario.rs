//! Scenario input: a JSON file or a seeded synthetic municipality

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use fire_risk_core::{AssetCategory, GeoPoint, IncidentRecord, InfrastructureAsset};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Incident history plus registered infrastructure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub incidents: Vec<IncidentRecord>,
    pub assets: Vec<InfrastructureAsset>,
}

impl Scenario {
    /// Load `{ "incidents": [...], "assets": [...] }` from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Seeded synthetic history clustered around a few hot-spots near `center`
    pub fn synthetic(center: GeoPoint, incident_count: usize, seed: u64) -> Result<Self> {
        const NEIGHBORHOODS: [&str; 6] = [
            "Centro",
            "Anapra",
            "Bellavista",
            "Zaragoza",
            "Riberas del Bravo",
            "Juárez Nuevo",
        ];
        const TYPES: [&str; 4] = ["Pastizal", "Basura", "Lote baldío", "Casa habitación"];
        const CAUSES: [&str; 4] = ["Quema", "Colilla", "Eléctrico", "Desconocida"];
        const SEVERITIES: [&str; 3] = ["Menor", "Moderado", "Grave"];

        let mut rng = StdRng::seed_from_u64(seed);

        // Hot-spots within ~8 km of the center, one per neighborhood
        let hotspots: Vec<GeoPoint> = NEIGHBORHOODS
            .iter()
            .map(|_| {
                GeoPoint::new(
                    center.lat + rng.random_range(-0.07..0.07),
                    center.lon + rng.random_range(-0.07..0.07),
                )
            })
            .collect();

        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .context("building synthetic start date")?;

        let incidents: Vec<IncidentRecord> = (0..incident_count)
            .map(|_| {
                // Skew toward the first hot-spots so loads differ
                let spot = (rng.random::<f64>().powi(2) * hotspots.len() as f64) as usize;
                let spot = spot.min(hotspots.len() - 1);
                // Sum of uniforms approximates a bell around the hot-spot
                let jitter = |rng: &mut StdRng| (0..3).map(|_| rng.random_range(-0.006..0.006)).sum::<f64>();
                let minutes = rng.random_range(0..365 * 24 * 60);

                IncidentRecord {
                    timestamp: start + Duration::minutes(minutes),
                    lat: hotspots[spot].lat + jitter(&mut rng),
                    lon: hotspots[spot].lon + jitter(&mut rng),
                    neighborhood: NEIGHBORHOODS[spot].to_owned(),
                    incident_type: TYPES[rng.random_range(0..TYPES.len())].to_owned(),
                    cause: CAUSES[rng.random_range(0..CAUSES.len())].to_owned(),
                    severity: SEVERITIES[rng.random_range(0..SEVERITIES.len())].to_owned(),
                }
            })
            .collect();

        let mut assets = Vec::new();
        let mut id = 1000;
        for (category, count) in [
            (AssetCategory::FireStation, 5),
            (AssetCategory::School, 12),
            (AssetCategory::Hospital, 3),
            (AssetCategory::FuelStation, 10),
        ] {
            for n in 1..=count {
                id += 1;
                assets.push(InfrastructureAsset::new(
                    id,
                    center.lat + rng.random_range(-0.08..0.08),
                    center.lon + rng.random_range(-0.08..0.08),
                    category,
                    format!("{category} {n}"),
                ));
            }
        }
        // Something always sits at the ignition point
        assets.push(InfrastructureAsset::new(
            id + 1,
            center.lat,
            center.lon,
            AssetCategory::FuelStation,
            "Ignition Fuel Depot",
        ));

        debug!(
            seed,
            incidents = incidents.len(),
            assets = assets.len(),
            "synthesised scenario"
        );
        Ok(Self { incidents, assets })
    }

    /// Latest incident date, used as the grid query date
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.incidents.iter().map(|r| r.timestamp.date()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_is_seeded() {
        let center = GeoPoint::new(31.7389, -106.4856);
        let a = Scenario::synthetic(center, 50, 7).unwrap();
        let b = Scenario::synthetic(center, 50, 7).unwrap();
        assert_eq!(a.incidents, b.incidents);
        assert_eq!(a.incidents.len(), 50);

        let depot = a.assets.last().unwrap();
        assert_eq!(depot.category, AssetCategory::FuelStation);
        assert_eq!((depot.lat, depot.lon), (center.lat, center.lon));
        assert!(a.latest_date().is_some());
    }
}
