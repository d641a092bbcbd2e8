//! Historical incident records
//!
//! Incidents are immutable facts owned by the data-acquisition layer. The engine
//! only ever reads slices of them.

use crate::core_types::geo::GeoPoint;
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// One historical fire incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// When the incident was reported (local time)
    pub timestamp: NaiveDateTime,
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
    /// Neighborhood label as recorded by dispatch
    pub neighborhood: String,
    /// Incident type (e.g. "Pastizal", "Casa habitación")
    pub incident_type: String,
    /// Recorded cause
    pub cause: String,
    /// Damage severity as recorded
    pub severity: String,
}

impl IncidentRecord {
    /// Incident location
    #[inline]
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Location is usable for spatial models
    #[inline]
    pub fn has_valid_location(&self) -> bool {
        self.location().is_finite()
    }

    /// Calendar month, 1-12
    #[inline]
    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }

    /// Day of week, Monday = 0 through Sunday = 6
    #[inline]
    pub fn weekday(&self) -> u32 {
        self.timestamp.weekday().num_days_from_monday()
    }

    /// Hour of day, 0-23
    #[inline]
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_calendar_features() {
        // 2024-03-17 was a Sunday
        let timestamp = NaiveDate::from_ymd_opt(2024, 3, 17)
            .unwrap()
            .and_hms_opt(15, 30, 0)
            .unwrap();
        let record = IncidentRecord {
            timestamp,
            lat: 31.74,
            lon: -106.48,
            neighborhood: "Centro".into(),
            incident_type: "Pastizal".into(),
            cause: "Quema".into(),
            severity: "Menor".into(),
        };
        assert_eq!(record.month(), 3);
        assert_eq!(record.weekday(), 6);
        assert_eq!(record.hour(), 15);
        assert!(record.has_valid_location());
    }
}
