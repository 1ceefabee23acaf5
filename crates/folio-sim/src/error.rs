//! Error types for drive configuration.

use std::fmt;

use crate::zones::ZoneId;

/// Result type for configuration checks.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// A tuning value that would break the simulation's invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A scalar fell outside its allowed range.
    OutOfRange {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
        /// Human-readable description of the accepted range.
        expected: &'static str,
    },
    /// A `min`/`max` pair is inverted or empty.
    InvertedRange {
        /// Dotted path of the lower bound.
        min_field: &'static str,
        /// Dotted path of the upper bound.
        max_field: &'static str,
    },
    /// The same zone id appears more than once in a layout.
    DuplicateZone(ZoneId),
    /// The zone layout is empty.
    NoZones,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::OutOfRange {
                field,
                value,
                expected,
            } => write!(f, "{field} = {value} is out of range (expected {expected})"),
            ConfigError::InvertedRange {
                min_field,
                max_field,
            } => write!(f, "{min_field} must be below {max_field}"),
            ConfigError::DuplicateZone(id) => write!(f, "zone {id} is defined more than once"),
            ConfigError::NoZones => write!(f, "zone layout has no zones"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Reject values that are not finite or fall outside `(lo, hi)` / `[lo, hi]`.
pub(crate) fn check_range(
    field: &'static str,
    value: f32,
    range: impl std::ops::RangeBounds<f32>,
    expected: &'static str,
) -> Result<()> {
    if value.is_finite() && range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

/// Reject strictly non-positive or non-finite values.
pub(crate) fn check_positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected: "> 0",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_out_of_range() {
        let err = ConfigError::OutOfRange {
            field: "vehicle.friction",
            value: 1.5,
            expected: "0 < x < 1",
        };
        assert_eq!(
            err.to_string(),
            "vehicle.friction = 1.5 is out of range (expected 0 < x < 1)"
        );
    }

    #[test]
    fn test_check_range_rejects_nan() {
        assert!(check_range("x", f32::NAN, 0.0..=1.0, "[0, 1]").is_err());
        assert!(check_range("x", 0.5, 0.0..=1.0, "[0, 1]").is_ok());
    }

    #[test]
    fn test_check_positive() {
        assert!(check_positive("x", 0.0).is_err());
        assert!(check_positive("x", f32::INFINITY).is_err());
        assert!(check_positive("x", 1e-3).is_ok());
    }
}
