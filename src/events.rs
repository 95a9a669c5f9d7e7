use crate::satellite::{SatelliteId, SatelliteStatus};
use heapless::Vec;
use serde::{Deserialize, Serialize};

pub const MAX_DOCK_EVENTS: usize = 64;

/// A satellite entering or leaving TRAVELING_TO_DOCK, CHARGING or CHARGED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockTransition {
    pub tick: u64,
    pub satellite_id: SatelliteId,
    pub from: SatelliteStatus,
    pub to: SatelliteStatus,
}

impl DockTransition {
    /// The occupant finished charging and left the dock.
    pub fn is_release(&self) -> bool {
        self.from == SatelliteStatus::Charging && self.to == SatelliteStatus::Charged
    }
}

/// Bounded history of dock transitions; the oldest entry is evicted when full.
#[derive(Debug, Default)]
pub struct DockEventLog {
    history: Vec<DockTransition, MAX_DOCK_EVENTS>,
    total_recorded: u64,
}

impl DockEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, transition: DockTransition) {
        if self.history.is_full() {
            self.history.remove(0);
        }

        let _ = self.history.push(transition);
        self.total_recorded += 1;
    }

    pub fn history(&self) -> &[DockTransition] {
        &self.history
    }

    pub fn for_satellite<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a DockTransition> {
        self.history.iter().filter(move |t| t.satellite_id == id)
    }

    /// Transitions recorded since creation, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }
}
