//! Engine configuration.
//!
//! The host passes configuration as JSON across the JNI boundary, so
//! missing fields fall back to defaults and every value is validated
//! before an analysis runs.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;
pub const DEFAULT_ELEVATION_THRESHOLD_M: f64 = 3.0;
pub const DEFAULT_DIRECTION_INTERVAL_M: f64 = 2000.0;
/// Direction arrows closer together than this are rejected.
pub const MIN_DIRECTION_INTERVAL_M: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Width of the centered moving-average filter, in points. Positive and odd.
    pub smoothing_window: usize,
    /// Minimum accumulated climb or descent before it counts, in meters.
    pub elevation_threshold_meters: f64,
    /// Spacing of direction arrows along the track, in meters.
    pub direction_sample_interval_meters: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            elevation_threshold_meters: DEFAULT_ELEVATION_THRESHOLD_M,
            direction_sample_interval_meters: DEFAULT_DIRECTION_INTERVAL_M,
        }
    }
}

impl AnalysisConfig {
    pub fn new(
        smoothing_window: usize,
        elevation_threshold_meters: f64,
        direction_sample_interval_meters: f64,
    ) -> Result<Self> {
        let config = Self {
            smoothing_window,
            elevation_threshold_meters,
            direction_sample_interval_meters,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON object. An empty string yields the defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.smoothing_window == 0 || self.smoothing_window % 2 == 0 {
            return Err(EngineError::InvalidConfig(format!(
                "smoothing_window must be a positive odd integer, got {}",
                self.smoothing_window
            )));
        }
        if !self.elevation_threshold_meters.is_finite() || self.elevation_threshold_meters < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "elevation_threshold_meters must be >= 0, got {}",
                self.elevation_threshold_meters
            )));
        }
        if !self.direction_sample_interval_meters.is_finite()
            || self.direction_sample_interval_meters < MIN_DIRECTION_INTERVAL_M
        {
            return Err(EngineError::InvalidConfig(format!(
                "direction_sample_interval_meters must be >= {MIN_DIRECTION_INTERVAL_M}, got {}",
                self.direction_sample_interval_meters
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.smoothing_window, 5);
        assert_eq!(config.elevation_threshold_meters, 3.0);
        assert_eq!(config.direction_sample_interval_meters, 2000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_even_window() {
        let result = AnalysisConfig::new(4, 3.0, 2000.0);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_window() {
        assert!(AnalysisConfig::new(0, 3.0, 2000.0).is_err());
    }

    #[test]
    fn rejects_negative_threshold() {
        assert!(AnalysisConfig::new(5, -0.1, 2000.0).is_err());
        assert!(AnalysisConfig::new(5, f64::NAN, 2000.0).is_err());
    }

    #[test]
    fn rejects_non_positive_interval() {
        assert!(AnalysisConfig::new(5, 3.0, 0.0).is_err());
    }

    #[test]
    fn rejects_sub_meter_interval() {
        assert!(matches!(
            AnalysisConfig::new(5, 3.0, 1e-9),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(AnalysisConfig::new(5, 3.0, 0.5).is_err());
        assert!(AnalysisConfig::new(5, 3.0, MIN_DIRECTION_INTERVAL_M).is_ok());

        let result = AnalysisConfig::from_json(r#"{"direction_sample_interval_meters": 1e-9}"#);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn zero_threshold_is_allowed() {
        assert!(AnalysisConfig::new(1, 0.0, 500.0).is_ok());
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = AnalysisConfig::from_json(r#"{"smoothing_window": 7}"#).unwrap();
        assert_eq!(config.smoothing_window, 7);
        assert_eq!(config.elevation_threshold_meters, 3.0);
    }

    #[test]
    fn from_json_empty_is_default() {
        assert_eq!(AnalysisConfig::from_json("  ").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn from_json_validates() {
        let result = AnalysisConfig::from_json(r#"{"smoothing_window": 2}"#);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn from_json_malformed() {
        assert!(matches!(
            AnalysisConfig::from_json("{not json"),
            Err(EngineError::Json(_))
        ));
    }
}
