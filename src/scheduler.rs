use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::events::DockTransition;
use crate::satellite::{Satellite, SatelliteId, SatelliteSnapshot, SatelliteStatus};
use crate::store::SatelliteStore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, error, info};

/// The single dock lease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockState {
    pub occupant: Option<SatelliteId>,
    pub occupied_since_tick: Option<u64>,
}

impl DockState {
    pub fn is_free(&self) -> bool {
        self.occupant.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DockStats {
    pub acquisitions: u32,
    pub cycles_completed: u32,
    pub energy_delivered: f64,
    pub km_traveled: f64,
}

/// What one scheduler step did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub transitions: Vec<DockTransition>,
    /// Flagged satellites left queued behind the occupant, in selection order.
    pub waiting: Vec<SatelliteSnapshot>,
    pub released: Option<SatelliteId>,
}

/// Arbitrates the dock: selects an occupant, advances it, releases it at the safe ceiling.
///
/// An occupant is never preempted; a more urgent candidate waits for the release.
/// A satellite whose step would leave its physical range is grounded: it loses the
/// dock and is not selected again until fresh telemetry reinstates it.
#[derive(Debug)]
pub struct DockScheduler {
    safe_battery_fraction: f64,
    tick_seconds: f64,
    dock: DockState,
    stats: DockStats,
    grounded: BTreeSet<SatelliteId>,
}

/// One tick of movement or charge, computed before it is committed.
#[derive(Debug, Clone, Copy, Default)]
struct Advance {
    moved: f64,
    charged: f64,
    released: bool,
}

impl DockScheduler {
    pub fn new(config: &FleetConfig) -> Self {
        Self {
            safe_battery_fraction: config.safe_battery_fraction,
            tick_seconds: config.tick_seconds,
            dock: DockState::default(),
            stats: DockStats::default(),
            grounded: BTreeSet::new(),
        }
    }

    pub fn occupant(&self) -> Option<&str> {
        self.dock.occupant.as_deref()
    }

    pub fn dock_state(&self) -> &DockState {
        &self.dock
    }

    pub fn get_stats(&self) -> &DockStats {
        &self.stats
    }

    pub fn grounded(&self) -> &BTreeSet<SatelliteId> {
        &self.grounded
    }

    /// Make a grounded satellite eligible again. Returns true if it was grounded.
    pub fn reinstate(&mut self, id: &str) -> bool {
        let was_grounded = self.grounded.remove(id);
        if was_grounded {
            info!("{} reinstated for docking after fresh telemetry", id);
        }
        was_grounded
    }

    /// Best candidate for a free dock by `(priority, distance_to_station)`.
    pub fn select_candidate<'a>(&self, store: &'a SatelliteStore) -> Option<&'a Satellite> {
        store
            .iter()
            .filter(|s| s.status.is_candidate() && !self.grounded.contains(&s.id))
            .min_by(|a, b| selection_order(a, b))
    }

    /// Run one tick of dock arbitration against the ranked store.
    ///
    /// On an invariant violation the store keeps the occupant's last valid state,
    /// the dock is released and the satellite is grounded.
    pub fn step(&mut self, store: &mut SatelliteStore, tick: u64) -> Result<StepOutcome, FleetError> {
        let mut outcome = StepOutcome::default();

        if self.dock.is_free() {
            if let Some(selected) = self.select_candidate(store) {
                info!(
                    "Dock assigned to {} (priority {}, {:.1} km out)",
                    selected.id, selected.priority, selected.distance_to_station
                );
                self.dock.occupant = Some(selected.id.clone());
                self.dock.occupied_since_tick = Some(tick);
                self.stats.acquisitions += 1;
            }
        }

        if let Some(occupant_id) = self.dock.occupant.clone() {
            let Some(satellite) = store.get_mut(&occupant_id) else {
                error!("Dock occupant {} missing from store", occupant_id);
                self.dock = DockState::default();
                return Err(FleetError::InvariantViolation {
                    id: occupant_id,
                    detail: "dock occupant has no record".to_string(),
                });
            };

            let mut proposed = satellite.clone();
            let advance = self.advance(&mut proposed);
            if let Err(e) = proposed.check_invariants() {
                error!("{}; {} grounded and dock released", e, occupant_id);
                self.dock = DockState::default();
                self.grounded.insert(occupant_id);
                return Err(e);
            }

            let from = satellite.status;
            *satellite = proposed;
            self.stats.km_traveled += advance.moved;
            self.stats.energy_delivered += advance.charged;

            let to = satellite.status;
            if advance.released && from != SatelliteStatus::Charging {
                // Docked and topped up within one tick: report the entry before the release
                outcome.transitions.push(DockTransition {
                    tick,
                    satellite_id: occupant_id.clone(),
                    from,
                    to: SatelliteStatus::Charging,
                });
                outcome.transitions.push(DockTransition {
                    tick,
                    satellite_id: occupant_id.clone(),
                    from: SatelliteStatus::Charging,
                    to,
                });
            } else if from != to && (from.is_dock_phase() || to.is_dock_phase()) {
                outcome.transitions.push(DockTransition {
                    tick,
                    satellite_id: occupant_id.clone(),
                    from,
                    to,
                });
            }

            if advance.released {
                info!(
                    "{} charged to {:.1}/{:.1}, leaving the dock after {} ticks",
                    occupant_id,
                    satellite.energy,
                    satellite.capacity,
                    self.dock
                        .occupied_since_tick
                        .map_or(1, |since| tick.saturating_sub(since) + 1)
                );
                self.dock = DockState::default();
                self.stats.cycles_completed += 1;
                outcome.released = Some(occupant_id);
            }
        }

        let mut waiting: Vec<&Satellite> = store
            .iter()
            .filter(|s| {
                s.status.is_queued()
                    && self.occupant() != Some(s.id.as_str())
                    && !self.grounded.contains(&s.id)
            })
            .collect();
        waiting.sort_by(|a, b| selection_order(a, b));
        outcome.waiting = waiting.into_iter().map(Satellite::snapshot).collect();

        debug_assert!(
            store.iter().filter(|s| s.status.holds_dock()).count() <= 1,
            "more than one satellite holds the dock at tick {tick}"
        );

        Ok(outcome)
    }

    /// Move the occupant one tick toward the dock, or charge it once docked.
    fn advance(&self, satellite: &mut Satellite) -> Advance {
        if satellite.distance_to_station > 0.0 {
            let moved = (satellite.speed * self.tick_seconds).min(satellite.distance_to_station);
            satellite.distance_to_station -= moved;
            satellite.energy -= moved * satellite.energy_per_km;
            satellite.status = SatelliteStatus::TravelingToDock;
            debug!(
                "{} traveling: {:.1} km left, energy {:.1}",
                satellite.id, satellite.distance_to_station, satellite.energy
            );
            return Advance {
                moved,
                ..Advance::default()
            };
        }

        let ceiling = self.safe_battery_fraction * satellite.capacity;
        let charged = (satellite.charge_rate * self.tick_seconds).min((ceiling - satellite.energy).max(0.0));
        satellite.energy += charged;
        satellite.status = SatelliteStatus::Charging;
        debug!("{} charging: energy {:.1}/{:.1}", satellite.id, satellite.energy, ceiling);

        let released = satellite.energy >= ceiling;
        if released {
            satellite.status = SatelliteStatus::Charged;
        }
        Advance {
            moved: 0.0,
            charged,
            released,
        }
    }
}

fn selection_order(a: &Satellite, b: &Satellite) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.distance_to_station.total_cmp(&b.distance_to_station))
        .then_with(|| a.energy.total_cmp(&b.energy))
        .then_with(|| a.id.cmp(&b.id))
}
