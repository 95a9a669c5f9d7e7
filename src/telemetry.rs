use crate::error::SkipReason;
use crate::satellite::{Satellite, SatelliteId, TelemetryReading};
use crate::store::{SatelliteStore, SpecCatalog};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A reading that was not folded into the store, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedReading {
    pub id: SatelliteId,
    pub time: u64,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Ids seen for the first time in this batch.
    pub created: Vec<SatelliteId>,
    /// Ids whose record was updated from a reading (including newly created ones).
    pub merged: Vec<SatelliteId>,
    pub skipped: Vec<SkippedReading>,
}

impl MergeReport {
    fn note_merged(&mut self, id: &str) {
        if !self.merged.iter().any(|m| m == id) {
            self.merged.push(id.to_string());
        }
    }
}

/// Folds telemetry batches into the satellite store.
///
/// Readings touch only their own satellite's record, so a batch has no
/// cross-satellite ordering requirement beyond arrival order per id.
#[derive(Debug)]
pub struct TelemetryMerger<'a> {
    catalog: &'a SpecCatalog,
}

impl<'a> TelemetryMerger<'a> {
    pub fn new(catalog: &'a SpecCatalog) -> Self {
        Self { catalog }
    }

    /// Merge one batch in arrival order. `dock_occupant` is locked against updates.
    pub fn merge_batch(
        &self,
        store: &mut SatelliteStore,
        batch: &[TelemetryReading],
        dock_occupant: Option<&str>,
    ) -> MergeReport {
        let mut report = MergeReport::default();

        for reading in batch {
            match self.merge_reading(store, reading, dock_occupant) {
                Ok(created) => {
                    if created {
                        report.created.push(reading.id.clone());
                    }
                    report.note_merged(&reading.id);
                }
                Err(reason) => {
                    warn!("Skipping reading for {} at t={}: {}", reading.id, reading.time, reason);
                    report.skipped.push(SkippedReading {
                        id: reading.id.clone(),
                        time: reading.time,
                        reason,
                    });
                }
            }
        }

        report
    }

    /// Returns `Ok(true)` when the reading created a new record.
    fn merge_reading(
        &self,
        store: &mut SatelliteStore,
        reading: &TelemetryReading,
        dock_occupant: Option<&str>,
    ) -> Result<bool, SkipReason> {
        let spec = self.catalog.get(&reading.id).ok_or(SkipReason::MissingSpec)?;

        validate_core_fields(reading, spec.capacity)?;
        let reading = reading.sanitized();

        if dock_occupant == Some(reading.id.as_str()) {
            return Err(SkipReason::DockLocked);
        }

        if let Some(existing) = store.get_mut(&reading.id) {
            if reading.time < existing.last_reading_time {
                return Err(SkipReason::Stale {
                    reading_time: reading.time,
                    last_seen: existing.last_reading_time,
                });
            }
            existing.apply_reading(&reading);
            return Ok(false);
        }

        debug!("First telemetry for {}, creating record", reading.id);
        store.insert(Satellite::from_first_reading(spec, &reading));
        Ok(true)
    }
}

fn validate_core_fields(reading: &TelemetryReading, capacity: f64) -> Result<(), SkipReason> {
    let invalid = |reason: String| Err(SkipReason::InvalidReading { reason });

    if !reading.energy.is_finite() || reading.energy < 0.0 {
        return invalid(format!("energy {} is not a non-negative number", reading.energy));
    }
    if reading.energy > capacity {
        return invalid(format!("energy {} exceeds capacity {}", reading.energy, capacity));
    }
    if !reading.distance_to_station.is_finite() || reading.distance_to_station < 0.0 {
        return invalid(format!(
            "distance_to_station {} is not a non-negative number",
            reading.distance_to_station
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::satellite::SatelliteSpec;

    fn catalog() -> SpecCatalog {
        let mut catalog = SpecCatalog::new();
        catalog.insert("SAT-1".to_string(), SatelliteSpec::with_capacity(100.0));
        catalog.insert("SAT-2".to_string(), SatelliteSpec::with_capacity(200.0));
        catalog
    }

    #[test]
    fn test_first_sight_creates_record() {
        let catalog = catalog();
        let merger = TelemetryMerger::new(&catalog);
        let mut store = SatelliteStore::new();

        let report = merger.merge_batch(
            &mut store,
            &[TelemetryReading::new("SAT-1", 1, 50.0, 100.0)],
            None,
        );

        assert_eq!(report.created, vec!["SAT-1"]);
        assert_eq!(report.merged, vec!["SAT-1"]);
        assert!(report.skipped.is_empty());
        assert!(store.contains("SAT-1"));
    }

    #[test]
    fn test_unknown_id_is_skipped_and_not_stored() {
        let catalog = catalog();
        let merger = TelemetryMerger::new(&catalog);
        let mut store = SatelliteStore::new();

        let report = merger.merge_batch(
            &mut store,
            &[TelemetryReading::new("GHOST", 1, 50.0, 100.0)],
            None,
        );

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].reason, SkipReason::MissingSpec);
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_reading_is_skipped() {
        let catalog = catalog();
        let merger = TelemetryMerger::new(&catalog);
        let mut store = SatelliteStore::new();

        merger.merge_batch(&mut store, &[TelemetryReading::new("SAT-1", 10, 50.0, 100.0)], None);
        let report =
            merger.merge_batch(&mut store, &[TelemetryReading::new("SAT-1", 4, 90.0, 10.0)], None);

        assert!(matches!(report.skipped[0].reason, SkipReason::Stale { reading_time: 4, last_seen: 10 }));
        let sat = store.get("SAT-1").unwrap();
        assert!((sat.energy - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dock_occupant_is_locked() {
        let catalog = catalog();
        let merger = TelemetryMerger::new(&catalog);
        let mut store = SatelliteStore::new();

        merger.merge_batch(&mut store, &[TelemetryReading::new("SAT-1", 1, 50.0, 100.0)], None);
        let report = merger.merge_batch(
            &mut store,
            &[TelemetryReading::new("SAT-1", 2, 10.0, 500.0)],
            Some("SAT-1"),
        );

        assert_eq!(report.skipped[0].reason, SkipReason::DockLocked);
        assert!((store.get("SAT-1").unwrap().distance_to_station - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_energy_above_capacity_is_invalid() {
        let catalog = catalog();
        let merger = TelemetryMerger::new(&catalog);
        let mut store = SatelliteStore::new();

        let report = merger.merge_batch(
            &mut store,
            &[TelemetryReading::new("SAT-1", 1, 150.0, 10.0)],
            None,
        );

        assert!(matches!(report.skipped[0].reason, SkipReason::InvalidReading { .. }));
        assert!(!store.contains("SAT-1"));
    }

    #[test]
    fn test_bad_override_falls_back_to_default() {
        let catalog = catalog();
        let merger = TelemetryMerger::new(&catalog);
        let mut store = SatelliteStore::new();

        let mut reading = TelemetryReading::new("SAT-2", 1, 150.0, 10.0);
        reading.speed = Some(-5.0);
        reading.charge_rate = Some(3.0);
        let report = merger.merge_batch(&mut store, &[reading], None);

        assert!(report.skipped.is_empty());
        let sat = store.get("SAT-2").unwrap();
        assert!((sat.speed - crate::satellite::DEFAULT_SPEED_KM_PER_SEC).abs() < f64::EPSILON);
        assert!((sat.charge_rate - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_later_reading_in_same_batch_wins() {
        let catalog = catalog();
        let merger = TelemetryMerger::new(&catalog);
        let mut store = SatelliteStore::new();

        let report = merger.merge_batch(
            &mut store,
            &[
                TelemetryReading::new("SAT-1", 1, 50.0, 100.0),
                TelemetryReading::new("SAT-1", 2, 48.0, 80.0),
            ],
            None,
        );

        assert_eq!(report.merged, vec!["SAT-1"]);
        let sat = store.get("SAT-1").unwrap();
        assert!((sat.distance_to_station - 80.0).abs() < f64::EPSILON);
        assert_eq!(sat.last_reading_time, 2);
    }
}
