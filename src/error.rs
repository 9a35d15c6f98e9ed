use std::path::PathBuf;

use thiserror::Error;

/// Structural misconfiguration, reported when a [`crate::subset::SubsetEngine`]
/// is built.  Per-record data problems are never errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("optimal launch angle range is inverted: low {low}° > high {high}°")]
    InvalidLaunchAngleRange { low: f64, high: f64 },

    #[error("{field} must be a finite number, got {value}")]
    NonFiniteValue { field: &'static str, value: f64 },

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}
