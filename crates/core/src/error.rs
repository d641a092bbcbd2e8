//! Error taxonomy for the risk engine
//!
//! Every fallible operation returns [`EngineError`] explicitly. Nothing inside the
//! engine substitutes defaults for bad input; presentation layers decide what to
//! show when a computation is refused.

use thiserror::Error;

/// Errors returned by engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A numeric parameter is out of range or not finite
    #[error("invalid input '{parameter}': {reason}")]
    InvalidInput {
        /// Name of the offending parameter (e.g. `"humidity_pct"`, `"k"`)
        parameter: &'static str,
        /// What constraint was violated, including the rejected value
        reason: String,
    },

    /// Not enough records to run the requested computation
    #[error("insufficient data for {what}: need {required}, have {available}")]
    InsufficientData {
        /// What the records were needed for
        what: &'static str,
        /// Minimum number of records required
        required: usize,
        /// Number of usable records supplied
        available: usize,
    },

    /// The classifier could not be fit to the training set
    #[error("model training failed: {0}")]
    ModelTrainingFailure(String),

    /// A perimeter would enclose zero area
    #[error("degenerate geometry: {0}")]
    GeometryDegenerate(String),
}

impl EngineError {
    /// Create an [`EngineError::InvalidInput`] for a parameter
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter,
            reason: reason.into(),
        }
    }

    /// Create an [`EngineError::InsufficientData`]
    pub fn insufficient(what: &'static str, required: usize, available: usize) -> Self {
        Self::InsufficientData {
            what,
            required,
            available,
        }
    }
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Reject NaN and infinities for a named parameter.
pub(crate) fn ensure_finite(parameter: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::invalid(
            parameter,
            format!("must be finite, got {value}"),
        ))
    }
}

/// Reject negative or non-finite values for a named parameter.
pub(crate) fn ensure_non_negative(parameter: &'static str, value: f64) -> Result<f64> {
    let value = ensure_finite(parameter, value)?;
    if value < 0.0 {
        return Err(EngineError::invalid(
            parameter,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(value)
}

/// Validate a latitude/longitude pair.
pub(crate) fn ensure_coordinates(lat: f64, lon: f64) -> Result<()> {
    let lat = ensure_finite("latitude", lat)?;
    let lon = ensure_finite("longitude", lon)?;
    if !(-90.0..=90.0).contains(&lat) {
        return Err(EngineError::invalid(
            "latitude",
            format!("must be within [-90, 90], got {lat}"),
        ));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(EngineError::invalid(
            "longitude",
            format!("must be within [-180, 180], got {lon}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_parameter() {
        let err = EngineError::invalid("humidity_pct", "must be non-negative, got -1");
        assert_eq!(
            err.to_string(),
            "invalid input 'humidity_pct': must be non-negative, got -1"
        );

        let err = EngineError::insufficient("k-means clustering", 5, 3);
        assert_eq!(
            err.to_string(),
            "insufficient data for k-means clustering: need 5, have 3"
        );
    }

    #[test]
    fn test_guards() {
        assert!(ensure_finite("x", f64::NAN).is_err());
        assert!(ensure_non_negative("x", -0.5).is_err());
        assert_eq!(ensure_non_negative("x", 0.0), Ok(0.0));
        assert!(ensure_coordinates(91.0, 0.0).is_err());
        assert!(ensure_coordinates(0.0, -181.0).is_err());
        assert!(ensure_coordinates(31.7, -106.4).is_ok());
    }
}
