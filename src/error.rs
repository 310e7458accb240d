//! Configuration faults shared across the crate.
//!
//! Anything reported here is detected while building components from
//! settings, before the first frame runs. Per-frame failures live next to
//! the code that produces them (`physics::QueryError`,
//! `player::LocomotionError`).
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("camera rig '{0}' is not registered")]
    MissingCameraRig(&'static str),

    #[error("{field} must be a finite value greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must be a finite, non-negative value (got {value})")]
    Negative { field: &'static str, value: f32 },

    #[error("pitch limits are inverted: min {min} > max {max}")]
    InvertedPitchLimits { min: f32, max: f32 },

    #[error("pitch limits must stay within +/-90 degrees (got min {min}, max {max} radians)")]
    PitchOutOfRange { min: f32, max: f32 },

    #[error("{0} layer mask is empty")]
    EmptyLayerMask(&'static str),

    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

/// Reject zero, negative and non-finite values.
pub(crate) fn require_positive(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Reject negative and non-finite values; zero is allowed.
pub(crate) fn require_non_negative(field: &'static str, value: f32) -> Result<f32, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_check_rejects_zero_and_nan() {
        assert!(require_positive("speed", 1.0).is_ok());
        assert_eq!(
            require_positive("speed", 0.0),
            Err(ConfigError::NotPositive { field: "speed", value: 0.0 })
        );
        assert!(require_positive("speed", f32::NAN).is_err());
        assert!(require_positive("speed", f32::INFINITY).is_err());
    }

    #[test]
    fn non_negative_check_allows_zero() {
        assert!(require_non_negative("jump", 0.0).is_ok());
        assert!(require_non_negative("jump", -0.5).is_err());
    }
}
