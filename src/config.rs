use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_BATCH_SIZE: usize = 5;
const DEFAULT_SAFE_BATTERY_FRACTION: f64 = 0.9;
const DEFAULT_CRITICAL_THRESHOLD_FRACTION: f64 = 0.05;
const DEFAULT_PREDICTION_HORIZON: u32 = 5;
const DEFAULT_MANEUVER_RESERVE: f64 = 5.0; // energy units held back for docking maneuvers
const DEFAULT_SAFETY_MARGIN: f64 = 0.1; // fraction of capacity
const DEFAULT_TICK_SECONDS: f64 = 1.0;

/// Longest accepted lookahead; the predictor walks every step of it per satellite per tick.
pub const MAX_PREDICTION_HORIZON: u32 = 10_000;

/// Tunables for prediction, ranking and docking.
///
/// Every field has a default, so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FleetConfig {
    /// Telemetry readings merged per tick.
    pub batch_size: usize,
    /// Energy ratio at which charging is considered complete.
    pub safe_battery_fraction: f64,
    /// Energy ratio at or below which a satellite is forced to CRITICAL.
    pub critical_threshold_fraction: f64,
    /// Ticks looked ahead by the failure predictor.
    pub prediction_horizon: u32,
    pub maneuver_reserve: f64,
    pub safety_margin: f64,
    /// Simulated seconds represented by one tick.
    pub tick_seconds: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            safe_battery_fraction: DEFAULT_SAFE_BATTERY_FRACTION,
            critical_threshold_fraction: DEFAULT_CRITICAL_THRESHOLD_FRACTION,
            prediction_horizon: DEFAULT_PREDICTION_HORIZON,
            maneuver_reserve: DEFAULT_MANEUVER_RESERVE,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            tick_seconds: DEFAULT_TICK_SECONDS,
        }
    }
}

impl FleetConfig {
    /// Load a config file and validate it. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: FleetConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(invalid("batchSize", "must be at least 1"));
        }
        if !is_fraction(self.safe_battery_fraction) {
            return Err(invalid("safeBatteryFraction", "must be in (0, 1]"));
        }
        if !is_fraction(self.critical_threshold_fraction) {
            return Err(invalid("criticalThresholdFraction", "must be in (0, 1]"));
        }
        if self.critical_threshold_fraction >= self.safe_battery_fraction {
            return Err(invalid(
                "criticalThresholdFraction",
                "must be below safeBatteryFraction",
            ));
        }
        if self.prediction_horizon > MAX_PREDICTION_HORIZON {
            return Err(ConfigError::InvalidValue {
                field: "predictionHorizon",
                reason: format!("must be at most {MAX_PREDICTION_HORIZON}"),
            });
        }
        if !self.maneuver_reserve.is_finite() || self.maneuver_reserve < 0.0 {
            return Err(invalid("maneuverReserve", "must be a non-negative number"));
        }
        if !self.safety_margin.is_finite() || self.safety_margin < 0.0 {
            return Err(invalid("safetyMargin", "must be a non-negative number"));
        }
        if !self.tick_seconds.is_finite() || self.tick_seconds <= 0.0 {
            return Err(invalid("tickSeconds", "must be a positive number"));
        }
        Ok(())
    }

    /// Energy level at which a docked satellite is released.
    pub fn safe_ceiling(&self, capacity: f64) -> f64 {
        self.safe_battery_fraction * capacity
    }
}

fn is_fraction(value: f64) -> bool {
    value.is_finite() && value > 0.0 && value <= 1.0
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FleetConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.prediction_horizon, 5);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: FleetConfig =
            serde_json::from_str(r#"{"batchSize": 2, "safeBatteryFraction": 0.8}"#).unwrap();
        assert_eq!(config.batch_size, 2);
        assert!((config.safe_battery_fraction - 0.8).abs() < f64::EPSILON);
        assert!((config.tick_seconds - 1.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = FleetConfig {
            batch_size: 0,
            ..FleetConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "batchSize", .. })
        ));
    }

    #[test]
    fn test_critical_must_be_below_safe() {
        let config = FleetConfig {
            critical_threshold_fraction: 0.9,
            safe_battery_fraction: 0.8,
            ..FleetConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_tick_rejected() {
        let config = FleetConfig {
            tick_seconds: 0.0,
            ..FleetConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_horizon_is_bounded() {
        let mut config = FleetConfig {
            prediction_horizon: u32::MAX,
            ..FleetConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "predictionHorizon", .. })
        ));

        config.prediction_horizon = MAX_PREDICTION_HORIZON;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_safe_ceiling() {
        let config = FleetConfig {
            safe_battery_fraction: 0.8,
            ..FleetConfig::default()
        };
        assert!((config.safe_ceiling(200.0) - 160.0).abs() < 1e-9);
    }
}
