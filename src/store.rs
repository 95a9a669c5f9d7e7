use crate::satellite::{Satellite, SatelliteId, SatelliteSnapshot, SatelliteSpec};
use std::collections::{BTreeMap, HashMap};

/// Static specifications, keyed by satellite id.
pub type SpecCatalog = HashMap<SatelliteId, SatelliteSpec>;

/// Authoritative state of every satellite seen so far.
///
/// Records are created on first telemetry and never removed. Iteration is in id
/// order so snapshots are deterministic.
#[derive(Debug, Default, Clone)]
pub struct SatelliteStore {
    satellites: BTreeMap<SatelliteId, Satellite>,
}

impl SatelliteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Satellite> {
        self.satellites.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Satellite> {
        self.satellites.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.satellites.contains_key(id)
    }

    /// Insert a record, replacing any previous one with the same id.
    pub fn insert(&mut self, satellite: Satellite) {
        self.satellites.insert(satellite.id.clone(), satellite);
    }

    pub fn len(&self) -> usize {
        self.satellites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.satellites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Satellite> {
        self.satellites.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Satellite> {
        self.satellites.values_mut()
    }

    pub fn snapshot(&self) -> Vec<SatelliteSnapshot> {
        self.satellites.values().map(Satellite::snapshot).collect()
    }
}

impl FromIterator<Satellite> for SatelliteStore {
    fn from_iter<I: IntoIterator<Item = Satellite>>(iter: I) -> Self {
        let mut store = SatelliteStore::new();
        for satellite in iter {
            store.insert(satellite);
        }
        store
    }
}
