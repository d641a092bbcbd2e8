//! Operational situation summary
//!
//! Combines the weather assessment, the active satellite anomaly count and the
//! epicenter list into one status record. Rendering is left to the caller.

use crate::risk::epicenter::RiskEpicenter;
use crate::weather::danger::{DangerCategory, RiskAssessment};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationalStatus {
    /// No elevated danger and no active anomalies
    Stable,
    /// Elevated weather danger or at least one active anomaly
    Critical,
}

impl OperationalStatus {
    /// Upper-case label
    pub fn label(&self) -> &'static str {
        match self {
            OperationalStatus::Stable => "STABLE",
            OperationalStatus::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for OperationalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Snapshot of the operational picture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationSummary {
    /// Overall status
    pub status: OperationalStatus,
    /// Weather category, `None` when weather is unknown
    pub danger: Option<DangerCategory>,
    /// Active satellite thermal anomalies
    pub satellite_anomalies: usize,
    /// Most loaded epicenter, if any
    pub dominant_epicenter: Option<RiskEpicenter>,
}

/// Assemble a situation summary
///
/// `epicenters` is expected in the order returned by epicenter extraction, so
/// the first entry is the most loaded.
pub fn summarize(
    assessment: Option<&RiskAssessment>,
    satellite_anomalies: usize,
    epicenters: &[RiskEpicenter],
) -> SituationSummary {
    let danger = assessment.map(|a| a.category);
    let elevated = danger.is_some_and(|c| c.is_elevated());
    let status = if elevated || satellite_anomalies > 0 {
        OperationalStatus::Critical
    } else {
        OperationalStatus::Stable
    };

    SituationSummary {
        status,
        danger,
        satellite_anomalies,
        dominant_epicenter: epicenters.first().cloned(),
    }
}
