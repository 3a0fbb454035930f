//! Error types for session configuration

use thiserror::Error;

/// Result type for configuration checks
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reasons a [`SessionConfig`](crate::config::SessionConfig) is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("configuration has no bodies")]
    NoBodies,

    #[error("body at index {0} has an empty id")]
    EmptyId(usize),

    #[error("duplicate body id: {0}")]
    DuplicateId(String),

    #[error("body {id}: orbital period must be positive and finite, got {value}")]
    InvalidPeriod { id: String, value: f64 },

    #[error("body {id}: orbital radius must be positive and finite, got {value}")]
    InvalidOrbitalRadius { id: String, value: f64 },

    #[error("body {id}: visual radius must be positive and finite, got {value}")]
    InvalidVisualRadius { id: String, value: f64 },

    #[error("body {id}: phase offset must be finite")]
    InvalidPhaseOffset { id: String },

    #[error("period scale factor must be positive and finite, got {0}")]
    InvalidPeriodScale(f64),

    #[error("max speed must be non-negative and finite, got {0}")]
    InvalidMaxSpeed(f64),

    #[error("initial speed {speed} outside [0, {max}]")]
    InitialSpeedOutOfRange { speed: f64, max: f64 },

    #[error("trail arm delay must be non-negative and finite, got {0}")]
    InvalidArmDelay(f64),

    #[error("pointer {name} must be non-negative and finite, got {value}")]
    InvalidPointer { name: &'static str, value: f64 },

    #[error("label margin must be finite, got {0}")]
    InvalidLabelMargin(f64),

    #[error("motion parameter {name} must be finite, got {value}")]
    InvalidMotion { name: &'static str, value: f64 },
}
