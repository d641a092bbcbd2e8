//! Semantic unit types for weather and geometry inputs
//!
//! Newtype wrappers keep the engine from mixing incompatible quantities
//! (a wind speed where a bearing was expected, humidity where temperature was).
//!
//! # Design Philosophy
//! - All quantities use f64: inputs arrive as f64 coordinates and the spread
//!   geometry works in the same precision
//! - Total ordering via `Ord` (NaN sorts above all values)
//! - `Deref` to the raw value for arithmetic at call sites
//! - Serde support so observations can cross the library boundary as JSON
//!
//! Construction never validates; range checks live in the operations that
//! consume the values and report [`crate::EngineError::InvalidInput`].
//!
//! # Usage
//! ```
//! use fire_risk_core::core_types::units::{Degrees, KilometersPerHour};
//!
//! let bearing = Degrees::new(270.0);
//! assert!((bearing.to_radians() - 3.0 * std::f64::consts::FRAC_PI_2).abs() < 1e-12);
//!
//! let wind = KilometersPerHour::new(36.0);
//! assert!((wind.to_mps() - 10.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

/// Declares an f64 newtype with total ordering, `Deref`, conversions and `Display`.
macro_rules! scalar_unit {
    ($(#[$meta:meta])* $name:ident, $suffix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        #[repr(transparent)]
        pub struct $name(f64);

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Deref for $name {
            type Target = f64;
            #[inline]
            fn deref(&self) -> &f64 {
                &self.0
            }
        }

        impl $name {
            #[doc = concat!("Create a new `", stringify!($name), "` value")]
            #[inline]
            #[must_use]
            pub const fn new(value: f64) -> Self {
                $name(value)
            }

            /// Get the raw f64 value
            #[inline]
            #[must_use]
            pub const fn value(self) -> f64 {
                self.0
            }
        }

        impl From<f64> for $name {
            fn from(v: f64) -> Self {
                $name(v)
            }
        }

        impl From<$name> for f64 {
            fn from(v: $name) -> f64 {
                v.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!("{:.1}", $suffix), self.0)
            }
        }
    };
}

scalar_unit!(
    /// Air temperature in degrees Celsius
    Celsius,
    "°C"
);

scalar_unit!(
    /// Relative humidity in percent (0-100)
    Percent,
    "%"
);

scalar_unit!(
    /// Wind speed in kilometres per hour
    KilometersPerHour,
    " km/h"
);

scalar_unit!(
    /// Angle in degrees. Bearings use the meteorological convention (0° = North, clockwise).
    Degrees,
    "°"
);

impl Percent {
    /// Convert to a 0-1 fraction
    #[inline]
    #[must_use]
    pub fn to_fraction(self) -> f64 {
        self.0 / 100.0
    }
}

impl KilometersPerHour {
    /// Convert to metres per second
    #[inline]
    #[must_use]
    pub fn to_mps(self) -> f64 {
        self.0 / 3.6
    }
}

impl Degrees {
    /// Convert to radians
    #[inline]
    #[must_use]
    pub fn to_radians(self) -> f64 {
        self.0.to_radians()
    }
}
