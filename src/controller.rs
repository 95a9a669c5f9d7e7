use crate::config::FleetConfig;
use crate::error::FleetError;
use crate::events::{DockEventLog, DockTransition};
use crate::ranker::{Alert, PriorityRanker};
use crate::satellite::{SatelliteId, SatelliteSnapshot, TelemetryReading};
use crate::scheduler::{DockScheduler, DockState, DockStats};
use crate::store::{SatelliteStore, SpecCatalog};
use crate::telemetry::{SkippedReading, TelemetryMerger};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerState {
    pub tick_count: u64,
    pub readings_merged: u64,
    pub readings_skipped: u64,
    pub satellites_known: usize,
    pub last_error: Option<String>,
}

/// Everything the reporting side needs from one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickOutcome {
    pub tick: u64,
    /// Latest reading time in the batch, if the batch had readings.
    pub timestamp: Option<u64>,
    /// Urgent satellites, most urgent first.
    pub alerts: Vec<Alert>,
    /// Every known satellite after the scheduler step, ordered by id.
    pub snapshot: Vec<SatelliteSnapshot>,
    pub transitions: Vec<DockTransition>,
    pub waiting: Vec<SatelliteSnapshot>,
    pub skipped: Vec<SkippedReading>,
    pub dock_occupant: Option<SatelliteId>,
}

/// Receives each tick's outcome, e.g. to render it.
pub trait TickReporter {
    fn report(&mut self, outcome: &TickOutcome);
}

/// Drives the fleet one batch at a time: merge, rank, schedule, report.
pub struct FleetController {
    config: FleetConfig,
    catalog: SpecCatalog,
    store: SatelliteStore,
    ranker: PriorityRanker,
    scheduler: DockScheduler,
    event_log: DockEventLog,
    state: ControllerState,
}

impl FleetController {
    pub fn new(config: FleetConfig, catalog: SpecCatalog) -> Result<Self, FleetError> {
        config.validate()?;

        Ok(Self {
            ranker: PriorityRanker::new(&config),
            scheduler: DockScheduler::new(&config),
            config,
            catalog,
            store: SatelliteStore::new(),
            event_log: DockEventLog::new(),
            state: ControllerState::default(),
        })
    }

    /// Process one telemetry batch as one tick.
    ///
    /// An empty batch still ranks the fleet and advances the dock occupant.
    pub fn process_batch(&mut self, batch: &[TelemetryReading]) -> Result<TickOutcome, FleetError> {
        self.state.tick_count += 1;
        let tick = self.state.tick_count;

        let merge_report = TelemetryMerger::new(&self.catalog).merge_batch(
            &mut self.store,
            batch,
            self.scheduler.occupant(),
        );
        self.state.readings_merged += (batch.len() - merge_report.skipped.len()) as u64;
        self.state.readings_skipped += merge_report.skipped.len() as u64;
        for id in &merge_report.created {
            info!("Tracking new satellite {}", id);
        }
        for id in &merge_report.merged {
            self.scheduler.reinstate(id);
        }

        let ranking = self.ranker.rank(&mut self.store, self.scheduler.occupant(), tick);
        for transition in &ranking.transitions {
            self.event_log.record(transition.clone());
        }
        self.state.satellites_known = self.store.len();

        let step = match self.scheduler.step(&mut self.store, tick) {
            Ok(step) => step,
            Err(e) => {
                error!("Tick {} aborted: {}", tick, e);
                self.state.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        for transition in &step.transitions {
            self.event_log.record(transition.clone());
        }
        let alerts = ranking.alerts;
        let mut transitions = ranking.transitions;
        transitions.extend(step.transitions);

        debug!(
            "Tick {}: {} merged, {} skipped, {} alerts, occupant {:?}",
            tick,
            merge_report.merged.len(),
            merge_report.skipped.len(),
            alerts.len(),
            self.scheduler.occupant()
        );

        Ok(TickOutcome {
            tick,
            timestamp: batch.iter().map(|r| r.time).max(),
            alerts,
            snapshot: self.store.snapshot(),
            transitions,
            waiting: step.waiting,
            skipped: merge_report.skipped,
            dock_occupant: self.scheduler.occupant().map(str::to_string),
        })
    }

    /// Feed `readings` through in `batch_size` chunks, in arrival order.
    /// Returns the number of ticks processed.
    pub fn run<R: TickReporter + ?Sized>(
        &mut self,
        readings: &[TelemetryReading],
        reporter: &mut R,
    ) -> Result<u64, FleetError> {
        let mut ticks = 0;
        for batch in readings.chunks(self.config.batch_size) {
            let outcome = self.process_batch(batch)?;
            reporter.report(&outcome);
            ticks += 1;
        }
        Ok(ticks)
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn store(&self) -> &SatelliteStore {
        &self.store
    }

    pub fn dock_state(&self) -> &DockState {
        self.scheduler.dock_state()
    }

    pub fn dock_stats(&self) -> &DockStats {
        self.scheduler.get_stats()
    }

    /// Satellites barred from the dock after a failed step, until fresh telemetry.
    pub fn grounded(&self) -> impl Iterator<Item = &str> {
        self.scheduler.grounded().iter().map(String::as_str)
    }

    pub fn event_log(&self) -> &DockEventLog {
        &self.event_log
    }

    pub fn get_state(&self) -> &ControllerState {
        &self.state
    }
}
