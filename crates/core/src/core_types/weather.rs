//! Weather observations consumed by the fire-weather scorer and spread projector
//!
//! A weather provider failure must never abort the engine, so the inbound
//! contract is [`WeatherSnapshot`] with every field optional. Components that
//! need complete data convert it into a [`WeatherObservation`] first.

use crate::core_types::units::{Celsius, Degrees, KilometersPerHour, Percent};
use serde::{Deserialize, Serialize};

/// A complete weather observation at the area of interest
///
/// # Example
/// ```
/// use fire_risk_core::WeatherObservation;
///
/// let obs = WeatherObservation::new(34.0, 18.0, 25.0, 225.0);
/// assert_eq!(*obs.humidity, 18.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Air temperature
    pub temperature: Celsius,
    /// Relative humidity
    pub humidity: Percent,
    /// Sustained wind speed
    pub wind_speed: KilometersPerHour,
    /// Direction the wind blows from (meteorological bearing, 0° = North, clockwise)
    pub wind_direction: Degrees,
}

impl WeatherObservation {
    /// Create an observation from raw values (°C, %, km/h, degrees)
    pub fn new(
        temperature_c: f64,
        humidity_pct: f64,
        wind_speed_kmh: f64,
        wind_direction_deg: f64,
    ) -> Self {
        Self {
            temperature: Celsius::new(temperature_c),
            humidity: Percent::new(humidity_pct),
            wind_speed: KilometersPerHour::new(wind_speed_kmh),
            wind_direction: Degrees::new(wind_direction_deg),
        }
    }
}

/// Weather as delivered by an upstream provider; `None` marks an unknown field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Air temperature (°C)
    pub temperature_c: Option<f64>,
    /// Relative humidity (%)
    pub humidity_pct: Option<f64>,
    /// Wind speed (km/h)
    pub wind_speed_kmh: Option<f64>,
    /// Wind bearing (degrees)
    pub wind_dir_deg: Option<f64>,
}

impl WeatherSnapshot {
    /// Snapshot representing a provider that returned nothing
    pub const fn unknown() -> Self {
        Self {
            temperature_c: None,
            humidity_pct: None,
            wind_speed_kmh: None,
            wind_dir_deg: None,
        }
    }

    /// Complete observation if temperature, humidity and wind speed are known
    ///
    /// A missing wind direction defaults to 0° since the danger index does not
    /// use it; spread projection callers should check `wind_dir_deg` themselves.
    pub fn observation(&self) -> Option<WeatherObservation> {
        Some(WeatherObservation::new(
            self.temperature_c?,
            self.humidity_pct?,
            self.wind_speed_kmh?,
            self.wind_dir_deg.unwrap_or(0.0),
        ))
    }
}

impl From<WeatherObservation> for WeatherSnapshot {
    fn from(obs: WeatherObservation) -> Self {
        Self {
            temperature_c: Some(*obs.temperature),
            humidity_pct: Some(*obs.humidity),
            wind_speed_kmh: Some(*obs.wind_speed),
            wind_dir_deg: Some(*obs.wind_direction),
        }
    }
}
