use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_HARD_HIT_THRESHOLD_MPH: f64 = 95.0;
pub const DEFAULT_OPTIMAL_LAUNCH_ANGLE_LOW: f64 = 8.0;
pub const DEFAULT_OPTIMAL_LAUNCH_ANGLE_HIGH: f64 = 32.0;

// ---------------------------------------------------------------------------
// LaunchAngleRange – closed interval in degrees
// ---------------------------------------------------------------------------

/// Closed launch-angle window `[low, high]`, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchAngleRange {
    pub low: f64,
    pub high: f64,
}

impl Default for LaunchAngleRange {
    fn default() -> Self {
        Self {
            low: DEFAULT_OPTIMAL_LAUNCH_ANGLE_LOW,
            high: DEFAULT_OPTIMAL_LAUNCH_ANGLE_HIGH,
        }
    }
}

impl LaunchAngleRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Both bounds are inclusive.
    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.low && angle <= self.high
    }
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Thresholds used by metric derivation.
///
/// Deserializes from TOML with every field optional:
///
/// ```toml
/// hard_hit_threshold_mph = 95.0
///
/// [optimal_launch_angle_range]
/// low = 8.0
/// high = 32.0
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub hard_hit_threshold_mph: f64,
    pub optimal_launch_angle_range: LaunchAngleRange,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hard_hit_threshold_mph: DEFAULT_HARD_HIT_THRESHOLD_MPH,
            optimal_launch_angle_range: LaunchAngleRange::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document. The result is not yet validated.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply command-line style overrides on top of this config.
    pub fn with_overrides(
        mut self,
        hard_hit_threshold_mph: Option<f64>,
        launch_angle_low: Option<f64>,
        launch_angle_high: Option<f64>,
    ) -> Self {
        if let Some(v) = hard_hit_threshold_mph {
            self.hard_hit_threshold_mph = v;
        }
        if let Some(v) = launch_angle_low {
            self.optimal_launch_angle_range.low = v;
        }
        if let Some(v) = launch_angle_high {
            self.optimal_launch_angle_range.high = v;
        }
        self
    }

    /// Reject structurally invalid settings.  `low == high` is allowed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let range = self.optimal_launch_angle_range;
        for (field, value) in [
            ("hard_hit_threshold_mph", self.hard_hit_threshold_mph),
            ("optimal_launch_angle_range.low", range.low),
            ("optimal_launch_angle_range.high", range.high),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue { field, value });
            }
        }
        if range.low > range.high {
            return Err(ConfigError::InvalidLaunchAngleRange {
                low: range.low,
                high: range.high,
            });
        }
        Ok(())
    }
}
