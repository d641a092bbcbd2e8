//! Fire-weather danger scoring

pub mod danger;

pub use danger::{
    assess_snapshot, fwi_ranges, score, score_observation, DangerCategory, RiskAssessment,
};
