//! Fire-weather index (FWI) scoring
//!
//! A simplified danger index built from three multiplicative factors:
//!
//! ```text
//! FWI = humidity_factor × wind_factor × temperature_factor
//! ```
//!
//! - **humidity_factor**: 10 below 10% RH, 6 below 30%, 3 below 50%, otherwise 1
//!   (a stand-in for fine fuel moisture)
//! - **wind_factor**: `1 + wind_kmh / 10` (a stand-in for initial spread index)
//! - **temperature_factor**: 2 above 30 °C, otherwise 1
//!
//! The scorer is deterministic and has no side effects.

use crate::core_types::weather::{WeatherObservation, WeatherSnapshot};
use crate::error::{ensure_finite, ensure_non_negative, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// FWI threshold constants for danger categories.
///
/// Rust `Range` types use **inclusive lower bound and exclusive upper bound**
/// [a, b), so a value sitting exactly on a boundary belongs to the higher category.
pub mod fwi_ranges {
    use std::ops::{Range, RangeFrom};

    /// "Low" danger `[0.0, 5.0)`
    pub const LOW: Range<f64> = 0.0..5.0;

    /// "Moderate" danger `[5.0, 15.0)`
    pub const MODERATE: Range<f64> = 5.0..15.0;

    /// "High" danger `[15.0, 30.0)`
    pub const HIGH: Range<f64> = 15.0..30.0;

    /// "Very High" danger `[30.0, 60.0)`
    pub const VERY_HIGH: Range<f64> = 30.0..60.0;

    /// "Extreme" danger `[60.0, ∞)`
    pub const EXTREME: RangeFrom<f64> = 60.0..;
}

/// Danger category derived from the FWI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DangerCategory {
    /// FWI below 5
    Low,
    /// FWI 5 to below 15
    Moderate,
    /// FWI 15 to below 30
    High,
    /// FWI 30 to below 60
    VeryHigh,
    /// FWI 60 and above
    Extreme,
}

impl DangerCategory {
    /// Classify an FWI value
    ///
    /// Values below zero cannot be produced by [`score`]; they classify as `Low`.
    pub fn from_value(value: f64) -> Self {
        match value {
            v if v < fwi_ranges::LOW.end => DangerCategory::Low,
            v if fwi_ranges::MODERATE.contains(&v) => DangerCategory::Moderate,
            v if fwi_ranges::HIGH.contains(&v) => DangerCategory::High,
            v if fwi_ranges::VERY_HIGH.contains(&v) => DangerCategory::VeryHigh,
            _ => DangerCategory::Extreme,
        }
    }

    /// Upper-case label used in briefings
    pub fn label(&self) -> &'static str {
        match self {
            DangerCategory::Low => "LOW",
            DangerCategory::Moderate => "MODERATE",
            DangerCategory::High => "HIGH",
            DangerCategory::VeryHigh => "VERY_HIGH",
            DangerCategory::Extreme => "EXTREME",
        }
    }

    /// High danger or worse
    pub fn is_elevated(&self) -> bool {
        *self >= DangerCategory::High
    }
}

impl fmt::Display for DangerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scored fire-weather danger
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// FWI value, always ≥ 0
    pub value: f64,
    /// Category of `value`
    pub category: DangerCategory,
}

fn humidity_factor(humidity_pct: f64) -> f64 {
    match humidity_pct {
        h if h < 10.0 => 10.0,
        h if h < 30.0 => 6.0,
        h if h < 50.0 => 3.0,
        _ => 1.0,
    }
}

/// Score fire-weather danger from temperature (°C), humidity (%) and wind (km/h)
///
/// # Errors
///
/// `InvalidInput` for negative or non-finite humidity or wind speed, or a
/// non-finite temperature.
///
/// # Example
///
/// ```
/// use fire_risk_core::weather::{score, DangerCategory};
///
/// // humidity 9 → 10, calm wind → 1, 31 °C → 2
/// let risk = score(31.0, 9.0, 0.0).unwrap();
/// assert_eq!(risk.value, 20.0);
/// assert_eq!(risk.category, DangerCategory::High);
/// ```
pub fn score(temperature_c: f64, humidity_pct: f64, wind_speed_kmh: f64) -> Result<RiskAssessment> {
    let temperature_c = ensure_finite("temperature_c", temperature_c)?;
    let humidity_pct = ensure_non_negative("humidity_pct", humidity_pct)?;
    let wind_speed_kmh = ensure_non_negative("wind_speed_kmh", wind_speed_kmh)?;

    let wind_factor = 1.0 + wind_speed_kmh / 10.0;
    let temperature_factor = if temperature_c > 30.0 { 2.0 } else { 1.0 };
    let value = humidity_factor(humidity_pct) * wind_factor * temperature_factor;
    let category = DangerCategory::from_value(value);

    debug!(
        temperature_c,
        humidity_pct, wind_speed_kmh, value, %category, "scored fire weather"
    );

    Ok(RiskAssessment { value, category })
}

/// Score a complete observation
pub fn score_observation(observation: &WeatherObservation) -> Result<RiskAssessment> {
    score(
        *observation.temperature,
        *observation.humidity,
        *observation.wind_speed,
    )
}

/// Score a provider snapshot; `Ok(None)` when the weather is unknown
///
/// Missing fields are not an error: the surrounding application decides how
/// to present an unknown danger level.
pub fn assess_snapshot(snapshot: &WeatherSnapshot) -> Result<Option<RiskAssessment>> {
    match snapshot.observation() {
        Some(observation) => score_observation(&observation).map(Some),
        None => {
            debug!("weather snapshot incomplete, danger unknown");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_reference_score() {
        let risk = score(31.0, 9.0, 0.0).unwrap();
        assert_eq!(risk.value, 20.0);
        assert_eq!(risk.category, DangerCategory::High);

        // Both thresholds are strict: 30 °C and 10 % fall in the lower steps
        let risk = score(30.0, 10.0, 0.0).unwrap();
        assert_eq!(risk.value, 6.0);
        assert_eq!(risk.category, DangerCategory::Moderate);
    }

    #[test]
    fn test_humidity_factor_steps() {
        assert_eq!(humidity_factor(0.0), 10.0);
        assert_eq!(humidity_factor(9.99), 10.0);
        assert_eq!(humidity_factor(10.0), 6.0);
        assert_eq!(humidity_factor(29.9), 6.0);
        assert_eq!(humidity_factor(30.0), 3.0);
        assert_eq!(humidity_factor(50.0), 1.0);
    }

    #[test]
    fn test_temperature_threshold_is_strict() {
        assert_eq!(score(30.0, 60.0, 0.0).unwrap().value, 1.0);
        assert_eq!(score(30.1, 60.0, 0.0).unwrap().value, 2.0);
    }

    #[test]
    fn test_category_boundaries() {
        let cases = [
            (4.999, DangerCategory::Low),
            (5.0, DangerCategory::Moderate),
            (5.001, DangerCategory::Moderate),
            (14.999, DangerCategory::Moderate),
            (15.0, DangerCategory::High),
            (29.999, DangerCategory::High),
            (30.0, DangerCategory::VeryHigh),
            (59.999, DangerCategory::VeryHigh),
            (60.0, DangerCategory::Extreme),
            (60.001, DangerCategory::Extreme),
        ];
        for (value, expected) in cases {
            assert_eq!(
                DangerCategory::from_value(value),
                expected,
                "value {value} should map to {expected:?}"
            );
        }
    }

    #[test]
    fn test_negative_inputs_rejected() {
        assert!(matches!(
            score(25.0, -1.0, 10.0),
            Err(EngineError::InvalidInput {
                parameter: "humidity_pct",
                ..
            })
        ));
        assert!(matches!(
            score(25.0, 20.0, -0.1),
            Err(EngineError::InvalidInput {
                parameter: "wind_speed_kmh",
                ..
            })
        ));
        assert!(score(f64::NAN, 20.0, 5.0).is_err());
    }

    #[test]
    fn test_unknown_snapshot_is_not_an_error() {
        assert_eq!(assess_snapshot(&WeatherSnapshot::unknown()), Ok(None));

        let snapshot = WeatherSnapshot {
            temperature_c: Some(35.0),
            humidity_pct: Some(8.0),
            wind_speed_kmh: Some(40.0),
            wind_dir_deg: None,
        };
        let risk = assess_snapshot(&snapshot).unwrap().unwrap();
        assert_eq!(risk.value, 100.0);
        assert_eq!(risk.category, DangerCategory::Extreme);
    }

    #[test]
    fn test_elevated_categories() {
        assert!(!DangerCategory::Moderate.is_elevated());
        assert!(DangerCategory::High.is_elevated());
        assert!(DangerCategory::Extreme.is_elevated());
    }
}
