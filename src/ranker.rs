use crate::config::FleetConfig;
use crate::events::DockTransition;
use crate::predictor::{self, PredictorParams, LOOKAHEAD_PADDING};
use crate::satellite::{Satellite, SatelliteSnapshot, SatelliteStatus};
use crate::store::SatelliteStore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Highest urgency. Shared by CRITICAL and ALERT satellites.
pub const TOP_PRIORITY: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    /// Energy ratio at or below the critical fraction.
    Critical,
    /// Energy at or below the immediate docking threshold.
    Alert,
    /// Predicted breach within the horizon.
    Shortage { steps_until_failure: u32 },
    Nominal,
}

impl Urgency {
    pub fn is_urgent(self) -> bool {
        !matches!(self, Urgency::Nominal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub priority: u32,
    pub satellite: SatelliteSnapshot,
}

/// Result of re-ranking the fleet for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Urgent satellites, most urgent first.
    pub alerts: Vec<Alert>,
    /// Status changes into or out of CHARGED caused by new telemetry.
    pub transitions: Vec<DockTransition>,
}

/// Turns energy state and predictions into per-satellite priorities.
#[derive(Debug, Clone)]
pub struct PriorityRanker {
    params: PredictorParams,
    critical_threshold_fraction: f64,
    safe_battery_fraction: f64,
}

impl PriorityRanker {
    pub fn new(config: &FleetConfig) -> Self {
        Self {
            params: PredictorParams::from(config),
            critical_threshold_fraction: config.critical_threshold_fraction,
            safe_battery_fraction: config.safe_battery_fraction,
        }
    }

    /// Baseline for satellites with nothing to report; above every urgent priority.
    pub fn neutral_priority(&self) -> u32 {
        self.params.horizon.saturating_add(LOOKAHEAD_PADDING)
    }

    /// Energy needed right now to reach the dock, maneuver, and keep the margin.
    pub fn immediate_threshold(&self, satellite: &Satellite) -> f64 {
        predictor::safe_threshold(satellite, satellite.distance_to_station, &self.params)
    }

    pub fn assess(&self, satellite: &Satellite) -> Urgency {
        if satellite.energy_ratio() <= self.critical_threshold_fraction {
            return Urgency::Critical;
        }
        if satellite.energy <= self.immediate_threshold(satellite) {
            return Urgency::Alert;
        }

        let prediction = predictor::predict(satellite, &self.params);
        debug!(
            "Prediction for {}: will_fail={} steps={}",
            satellite.id, prediction.will_fail, prediction.steps_until_failure
        );
        if prediction.will_fail {
            Urgency::Shortage {
                steps_until_failure: prediction.steps_until_failure,
            }
        } else {
            Urgency::Nominal
        }
    }

    pub fn priority_for(&self, urgency: Urgency) -> u32 {
        match urgency {
            Urgency::Critical | Urgency::Alert => TOP_PRIORITY,
            Urgency::Shortage { steps_until_failure } => steps_until_failure.saturating_add(1),
            Urgency::Nominal => self.neutral_priority(),
        }
    }

    /// Re-rank every satellite in the store and collect alerts, most urgent first.
    ///
    /// The dock occupant gets a fresh priority but keeps its dock status; the
    /// scheduler owns that until release.
    pub fn rank(&self, store: &mut SatelliteStore, dock_occupant: Option<&str>, tick: u64) -> Ranking {
        let mut ranking = Ranking::default();

        for satellite in store.iter_mut() {
            let urgency = self.assess(satellite);
            satellite.priority = self.priority_for(urgency);

            if dock_occupant != Some(satellite.id.as_str()) {
                let charged = satellite.energy >= self.safe_battery_fraction * satellite.capacity;
                let next = next_status(urgency, charged);
                if next == SatelliteStatus::Critical && satellite.status != SatelliteStatus::Critical {
                    warn!(
                        "{} is CRITICAL: energy {:.1}/{:.1}",
                        satellite.id, satellite.energy, satellite.capacity
                    );
                }
                if next != satellite.status && (next.is_dock_phase() || satellite.status.is_dock_phase()) {
                    ranking.transitions.push(DockTransition {
                        tick,
                        satellite_id: satellite.id.clone(),
                        from: satellite.status,
                        to: next,
                    });
                }
                satellite.status = next;
            }

            if urgency.is_urgent() && satellite.status != SatelliteStatus::Charged {
                ranking.alerts.push(Alert {
                    priority: satellite.priority,
                    satellite: satellite.snapshot(),
                });
            }
        }

        ranking.alerts.sort_by(compare_alerts);
        ranking
    }
}

fn next_status(urgency: Urgency, charged: bool) -> SatelliteStatus {
    match urgency {
        Urgency::Critical => SatelliteStatus::Critical,
        Urgency::Alert => SatelliteStatus::Alert,
        Urgency::Shortage { steps_until_failure } => SatelliteStatus::Waiting { steps_until_failure },
        Urgency::Nominal if charged => SatelliteStatus::Charged,
        Urgency::Nominal => SatelliteStatus::Idle,
    }
}

fn compare_alerts(a: &Alert, b: &Alert) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| {
            a.satellite
                .distance_to_station
                .total_cmp(&b.satellite.distance_to_station)
        })
        .then_with(|| a.satellite.id.cmp(&b.satellite.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranker() -> PriorityRanker {
        PriorityRanker::new(&FleetConfig::default())
    }

    #[test]
    fn test_neutral_priority_above_urgent_range() {
        let ranker = ranker();
        let worst_urgent = ranker.priority_for(Urgency::Shortage {
            steps_until_failure: FleetConfig::default().prediction_horizon,
        });
        assert!(ranker.neutral_priority() > worst_urgent);
    }

    #[test]
    fn test_below_immediate_threshold_is_alert() {
        // threshold = 100 * 0.1 + 5 + 10 = 25
        let sat = Satellite::new("SAT-1", 100.0, 25.0, 100.0);
        assert_eq!(ranker().assess(&sat), Urgency::Alert);
    }

    #[test]
    fn test_critical_fraction_overrides_prediction() {
        let sat = Satellite::new("SAT-1", 1000.0, 40.0, 0.0);
        assert_eq!(ranker().assess(&sat), Urgency::Critical);
    }

    #[test]
    fn test_shortage_priority_is_steps_plus_one() {
        let sat = Satellite::new("SAT-2", 100.0, 40.0, 200.0);
        let urgency = ranker().assess(&sat);
        assert_eq!(urgency, Urgency::Shortage { steps_until_failure: 3 });
        assert_eq!(ranker().priority_for(urgency), 4);
    }

    #[test]
    fn test_rank_orders_alerts_and_updates_status() {
        let mut store: SatelliteStore = vec![
            Satellite::new("FAR", 100.0, 20.0, 100.0),
            Satellite::new("NEAR", 100.0, 20.0, 50.0),
            Satellite::new("SHORT", 100.0, 40.0, 200.0),
            Satellite::new("FINE", 100.0, 95.0, 10.0),
            Satellite::new("OKAY", 100.0, 70.0, 10.0),
        ]
        .into_iter()
        .collect();

        let alerts = ranker().rank(&mut store, None, 1).alerts;

        let ids: Vec<_> = alerts.iter().map(|a| a.satellite.id.as_str()).collect();
        assert_eq!(ids, vec!["NEAR", "FAR", "SHORT"]);
        assert_eq!(store.get("NEAR").unwrap().status, SatelliteStatus::Alert);
        assert_eq!(
            store.get("SHORT").unwrap().status,
            SatelliteStatus::Waiting { steps_until_failure: 3 }
        );
        assert_eq!(store.get("FINE").unwrap().status, SatelliteStatus::Charged);
        assert_eq!(store.get("FINE").unwrap().priority, ranker().neutral_priority());
        assert_eq!(store.get("OKAY").unwrap().status, SatelliteStatus::Idle);
    }

    #[test]
    fn test_occupant_keeps_dock_status() {
        let mut occupant = Satellite::new("DOCKED", 100.0, 15.0, 40.0);
        occupant.status = SatelliteStatus::TravelingToDock;
        let mut store: SatelliteStore = std::iter::once(occupant).collect();

        let alerts = ranker().rank(&mut store, Some("DOCKED"), 1).alerts;

        let sat = store.get("DOCKED").unwrap();
        assert_eq!(sat.status, SatelliteStatus::TravelingToDock);
        assert_eq!(sat.priority, TOP_PRIORITY);
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn test_nominal_satellite_at_ceiling_is_charged() {
        let mut sat = Satellite::new("DONE", 100.0, 90.0, 0.0);
        sat.status = SatelliteStatus::Charged;
        let mut store: SatelliteStore = std::iter::once(sat).collect();

        let ranking = ranker().rank(&mut store, None, 1);

        assert!(ranking.alerts.is_empty());
        assert!(ranking.transitions.is_empty());
        assert_eq!(store.get("DONE").unwrap().status, SatelliteStatus::Charged);
    }

    #[test]
    fn test_leaving_charged_is_a_transition() {
        let mut sat = Satellite::new("DRAINED", 100.0, 10.0, 300.0);
        sat.status = SatelliteStatus::Charged;
        let mut store: SatelliteStore = std::iter::once(sat).collect();

        let ranking = ranker().rank(&mut store, None, 7);

        assert_eq!(
            ranking.transitions,
            vec![DockTransition {
                tick: 7,
                satellite_id: "DRAINED".to_string(),
                from: SatelliteStatus::Charged,
                to: SatelliteStatus::Alert,
            }]
        );
        assert!(!ranking.transitions[0].is_release());
    }

    #[test]
    fn test_entering_charged_from_telemetry_is_a_transition() {
        let mut store: SatelliteStore = std::iter::once(Satellite::new("FULL", 100.0, 95.0, 10.0)).collect();

        let ranking = ranker().rank(&mut store, None, 2);

        assert_eq!(ranking.transitions.len(), 1);
        assert_eq!(ranking.transitions[0].from, SatelliteStatus::Idle);
        assert_eq!(ranking.transitions[0].to, SatelliteStatus::Charged);
        assert!(!ranking.transitions[0].is_release());
    }

    #[test]
    fn test_huge_horizon_priorities_saturate() {
        let ranker = PriorityRanker::new(&FleetConfig {
            prediction_horizon: u32::MAX,
            ..FleetConfig::default()
        });
        assert_eq!(ranker.neutral_priority(), u32::MAX);
        assert_eq!(
            ranker.priority_for(Urgency::Shortage { steps_until_failure: u32::MAX }),
            u32::MAX
        );
    }
}
