//! Forward energy forecast for a single satellite.
//!
//! The predictor walks the satellite's trajectory toward the dock one tick at a
//! time on a copy of its energy and distance, and reports the first step at which
//! the running energy no longer covers the safe threshold:
//!
//! ```text
//! threshold(step) = distance(step) * energy_per_km + maneuver_reserve + safety_margin * capacity
//! ```
//!
//! `distance(step)` is the estimate at the start of the step; the energy compared
//! against it already includes that step's travel cost and passive drain.

use crate::config::FleetConfig;
use crate::satellite::Satellite;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert;

/// Added to the horizon when no breach is found: not urgent now, but not infinitely safe.
pub const LOOKAHEAD_PADDING: u32 = 5;

// Neutral priority is `horizon + LOOKAHEAD_PADDING`; it must stay above the most
// urgent predicted value `horizon + 1`.
const_assert!(LOOKAHEAD_PADDING > 1);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictorParams {
    pub horizon: u32,
    pub tick_seconds: f64,
    pub maneuver_reserve: f64,
    pub safety_margin: f64,
}

impl From<&FleetConfig> for PredictorParams {
    fn from(config: &FleetConfig) -> Self {
        Self {
            horizon: config.prediction_horizon,
            tick_seconds: config.tick_seconds,
            maneuver_reserve: config.maneuver_reserve,
            safety_margin: config.safety_margin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub will_fail: bool,
    pub steps_until_failure: u32,
}

/// Energy a satellite needs to reach the dock from `distance` and still maneuver,
/// plus the capacity margin.
pub fn safe_threshold(satellite: &Satellite, distance: f64, params: &PredictorParams) -> f64 {
    distance * satellite.energy_per_km
        + params.maneuver_reserve
        + params.safety_margin * satellite.capacity
}

/// Forecast whether `satellite` breaches its safe threshold within `params.horizon` ticks.
///
/// Pure: the record is only read.
pub fn predict(satellite: &Satellite, params: &PredictorParams) -> Prediction {
    let km_per_step = satellite.speed * params.tick_seconds;
    let travel_cost = km_per_step * satellite.energy_per_km;

    let mut energy = satellite.energy;
    let mut distance = satellite.distance_to_station;

    for step in 1..=params.horizon {
        let threshold = safe_threshold(satellite, distance, params);

        energy -= travel_cost;
        energy -= satellite.power_consumption;
        distance = (distance - km_per_step).max(0.0);

        if energy <= threshold {
            return Prediction {
                will_fail: true,
                steps_until_failure: step,
            };
        }
    }

    Prediction {
        will_fail: false,
        steps_until_failure: params.horizon.saturating_add(LOOKAHEAD_PADDING),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PredictorParams {
        PredictorParams::from(&FleetConfig::default())
    }

    #[test]
    fn test_healthy_satellite_does_not_fail() {
        // threshold at 200 km: 20 + 5 + 10 = 35; energy drops 3 per step
        let sat = Satellite::new("SAT-1", 100.0, 95.0, 200.0);
        let prediction = predict(&sat, &params());
        assert!(!prediction.will_fail);
        assert_eq!(prediction.steps_until_failure, 5 + LOOKAHEAD_PADDING);
    }

    #[test]
    fn test_breach_reported_at_first_failing_step() {
        // step 1: threshold 35, energy 40 - 3 = 37 -> safe
        // step 2: threshold 33, energy 34 -> safe
        // step 3: threshold 31, energy 31 -> breach
        let sat = Satellite::new("SAT-2", 100.0, 40.0, 200.0);
        let prediction = predict(&sat, &params());
        assert!(prediction.will_fail);
        assert_eq!(prediction.steps_until_failure, 3);
    }

    #[test]
    fn test_satellite_at_threshold_fails_on_first_step() {
        let sat = Satellite::new("SAT-3", 100.0, 15.0, 0.0);
        let prediction = predict(&sat, &params());
        assert!(prediction.will_fail);
        assert_eq!(prediction.steps_until_failure, 1);
    }

    #[test]
    fn test_prediction_is_pure_and_deterministic() {
        let sat = Satellite::new("SAT-4", 100.0, 42.0, 180.0).with_speed(25.0);
        let before = sat.clone();
        let first = predict(&sat, &params());
        let second = predict(&sat, &params());
        assert_eq!(first, second);
        assert_eq!(sat, before);
    }

    #[test]
    fn test_zero_horizon_never_fails() {
        let sat = Satellite::new("SAT-5", 100.0, 1.0, 500.0);
        let params = PredictorParams {
            horizon: 0,
            ..params()
        };
        let prediction = predict(&sat, &params);
        assert!(!prediction.will_fail);
        assert_eq!(prediction.steps_until_failure, LOOKAHEAD_PADDING);
    }

    #[test]
    fn test_distance_estimate_floors_at_zero() {
        // Close to the dock: after the first step the threshold is distance-free (15)
        let sat = Satellite::new("SAT-6", 100.0, 23.0, 10.0).with_power_consumption(0.0);
        // step 1: threshold 16, energy 21 -> safe
        // step 2: threshold 15, energy 19 -> safe
        // step 3: threshold 15, energy 17 -> safe
        // step 4: threshold 15, energy 15 -> breach
        let prediction = predict(&sat, &params());
        assert!(prediction.will_fail);
        assert_eq!(prediction.steps_until_failure, 4);
    }
}
