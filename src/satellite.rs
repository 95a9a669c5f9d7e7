use crate::error::FleetError;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub type SatelliteId = String;

pub const DEFAULT_SPEED_KM_PER_SEC: f64 = 20.0;
pub const DEFAULT_ENERGY_PER_KM: f64 = 0.1;
pub const DEFAULT_POWER_CONSUMPTION: f64 = 1.0;
pub const DEFAULT_CHARGE_RATE: f64 = 1.0;

/// Priority carried by a record that has not been ranked yet.
pub const UNRANKED_PRIORITY: u32 = u32::MAX;

// Absorbs floating point drift in invariant checks; never used to clamp state.
const INVARIANT_TOLERANCE: f64 = 1e-9;

/// Static, per-satellite specification supplied by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteSpec {
    pub capacity: f64,
    #[serde(default)]
    pub energy_per_km: Option<f64>,
    #[serde(default, alias = "speed_km_per_sec")]
    pub speed: Option<f64>,
    #[serde(default)]
    pub power_consumption: Option<f64>,
    #[serde(default)]
    pub charge_rate: Option<f64>,
}

impl SatelliteSpec {
    pub fn with_capacity(capacity: f64) -> Self {
        Self {
            capacity,
            energy_per_km: None,
            speed: None,
            power_consumption: None,
            charge_rate: None,
        }
    }

    /// Copy with out-of-range optional fields cleared, so the defaults apply.
    pub fn sanitized(&self, id: &str) -> Self {
        Self {
            capacity: self.capacity,
            speed: keep_if(id, "speed", self.speed, is_positive),
            energy_per_km: keep_if(id, "energy_per_km", self.energy_per_km, is_non_negative),
            power_consumption: keep_if(id, "power_consumption", self.power_consumption, is_non_negative),
            charge_rate: keep_if(id, "charge_rate", self.charge_rate, is_positive),
        }
    }
}

/// One dynamic telemetry reading. Optional fields override the static specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    pub id: SatelliteId,
    #[serde(default)]
    pub time: u64,
    pub energy: f64,
    pub distance_to_station: f64,
    #[serde(default, alias = "speed_km_per_sec")]
    pub speed: Option<f64>,
    #[serde(default)]
    pub energy_per_km: Option<f64>,
    #[serde(default)]
    pub power_consumption: Option<f64>,
    #[serde(default)]
    pub charge_rate: Option<f64>,
}

impl TelemetryReading {
    pub fn new(id: impl Into<SatelliteId>, time: u64, energy: f64, distance_to_station: f64) -> Self {
        Self {
            id: id.into(),
            time,
            energy,
            distance_to_station,
            speed: None,
            energy_per_km: None,
            power_consumption: None,
            charge_rate: None,
        }
    }

    /// Copy with out-of-range overrides cleared, so the static value or default applies.
    pub fn sanitized(&self) -> Self {
        let id = self.id.as_str();
        Self {
            speed: keep_if(id, "speed", self.speed, is_positive),
            energy_per_km: keep_if(id, "energy_per_km", self.energy_per_km, is_non_negative),
            power_consumption: keep_if(id, "power_consumption", self.power_consumption, is_non_negative),
            charge_rate: keep_if(id, "charge_rate", self.charge_rate, is_positive),
            ..self.clone()
        }
    }
}

fn is_positive(v: f64) -> bool {
    v > 0.0
}

fn is_non_negative(v: f64) -> bool {
    v >= 0.0
}

fn keep_if(id: &str, field: &str, value: Option<f64>, valid: fn(f64) -> bool) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() && valid(v) => Some(v),
        Some(v) => {
            warn!("Ignoring out-of-range {} = {} for {}", field, v, id);
            None
        }
        None => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SatelliteStatus {
    /// Nominal and below the safe ceiling; served when nothing more urgent waits.
    Idle,
    /// Predicted to breach its safe threshold within the horizon; queued for the dock.
    Waiting { steps_until_failure: u32 },
    /// Already at or below the energy needed to reach the dock safely.
    Alert,
    /// Energy ratio at or below the critical fraction.
    Critical,
    TravelingToDock,
    Charging,
    /// At or above the safe ceiling; not competing for the dock.
    Charged,
}

impl SatelliteStatus {
    /// States that compete for the dock.
    pub fn is_candidate(self) -> bool {
        matches!(
            self,
            SatelliteStatus::Idle
                | SatelliteStatus::Waiting { .. }
                | SatelliteStatus::Alert
                | SatelliteStatus::Critical
        )
    }

    /// Candidates flagged by the ranker, as opposed to merely idle ones.
    pub fn is_queued(self) -> bool {
        matches!(
            self,
            SatelliteStatus::Waiting { .. } | SatelliteStatus::Alert | SatelliteStatus::Critical
        )
    }

    /// States that only the dock occupant can be in.
    pub fn holds_dock(self) -> bool {
        matches!(self, SatelliteStatus::TravelingToDock | SatelliteStatus::Charging)
    }

    /// States whose entry or exit is reported as a dock transition.
    pub fn is_dock_phase(self) -> bool {
        matches!(
            self,
            SatelliteStatus::TravelingToDock | SatelliteStatus::Charging | SatelliteStatus::Charged
        )
    }

    pub fn is_emergency(self) -> bool {
        matches!(self, SatelliteStatus::Alert | SatelliteStatus::Critical)
    }
}

impl core::fmt::Display for SatelliteStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SatelliteStatus::Idle => write!(f, "idle"),
            SatelliteStatus::Waiting { steps_until_failure } => {
                write!(f, "waiting (shortage in {steps_until_failure} ticks)")
            }
            SatelliteStatus::Alert => write!(f, "ALERT"),
            SatelliteStatus::Critical => write!(f, "CRITICAL"),
            SatelliteStatus::TravelingToDock => write!(f, "traveling to dock"),
            SatelliteStatus::Charging => write!(f, "charging"),
            SatelliteStatus::Charged => write!(f, "charged"),
        }
    }
}

/// Authoritative per-satellite state, persisted between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Satellite {
    pub id: SatelliteId,
    pub energy: f64,
    pub capacity: f64,
    pub distance_to_station: f64,
    pub speed: f64,
    pub energy_per_km: f64,
    pub power_consumption: f64,
    pub charge_rate: f64,
    pub status: SatelliteStatus,
    pub priority: u32,
    pub last_reading_time: u64,
}

impl Satellite {
    /// A satellite with every optional field at its default.
    pub fn new(id: impl Into<SatelliteId>, capacity: f64, energy: f64, distance_to_station: f64) -> Self {
        Self {
            id: id.into(),
            energy,
            capacity,
            distance_to_station,
            speed: DEFAULT_SPEED_KM_PER_SEC,
            energy_per_km: DEFAULT_ENERGY_PER_KM,
            power_consumption: DEFAULT_POWER_CONSUMPTION,
            charge_rate: DEFAULT_CHARGE_RATE,
            status: SatelliteStatus::Idle,
            priority: UNRANKED_PRIORITY,
            last_reading_time: 0,
        }
    }

    /// Build the record at first sight: reading overrides the static specification, defaults fill the rest.
    ///
    /// Out-of-range static values are dropped here; the reading is expected to be
    /// sanitized by the caller.
    pub fn from_first_reading(spec: &SatelliteSpec, reading: &TelemetryReading) -> Self {
        let spec = spec.sanitized(&reading.id);
        Self {
            id: reading.id.clone(),
            energy: reading.energy,
            capacity: spec.capacity,
            distance_to_station: reading.distance_to_station,
            speed: reading.speed.or(spec.speed).unwrap_or(DEFAULT_SPEED_KM_PER_SEC),
            energy_per_km: reading
                .energy_per_km
                .or(spec.energy_per_km)
                .unwrap_or(DEFAULT_ENERGY_PER_KM),
            power_consumption: reading
                .power_consumption
                .or(spec.power_consumption)
                .unwrap_or(DEFAULT_POWER_CONSUMPTION),
            charge_rate: reading.charge_rate.or(spec.charge_rate).unwrap_or(DEFAULT_CHARGE_RATE),
            status: SatelliteStatus::Idle,
            priority: UNRANKED_PRIORITY,
            last_reading_time: reading.time,
        }
    }

    /// Fold a later reading into an existing record.
    pub fn apply_reading(&mut self, reading: &TelemetryReading) {
        self.energy = reading.energy;
        self.distance_to_station = reading.distance_to_station;
        if let Some(speed) = reading.speed {
            self.speed = speed;
        }
        if let Some(energy_per_km) = reading.energy_per_km {
            self.energy_per_km = energy_per_km;
        }
        if let Some(power_consumption) = reading.power_consumption {
            self.power_consumption = power_consumption;
        }
        if let Some(charge_rate) = reading.charge_rate {
            self.charge_rate = charge_rate;
        }
        self.last_reading_time = reading.time;
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_energy_per_km(mut self, energy_per_km: f64) -> Self {
        self.energy_per_km = energy_per_km;
        self
    }

    pub fn with_power_consumption(mut self, power_consumption: f64) -> Self {
        self.power_consumption = power_consumption;
        self
    }

    pub fn with_charge_rate(mut self, charge_rate: f64) -> Self {
        self.charge_rate = charge_rate;
        self
    }

    pub fn energy_ratio(&self) -> f64 {
        self.energy / self.capacity
    }

    pub fn is_at_dock(&self) -> bool {
        self.distance_to_station <= 0.0
    }

    /// Fails when energy or distance left their physical range.
    pub fn check_invariants(&self) -> Result<(), FleetError> {
        if self.distance_to_station < 0.0 {
            return Err(self.violation(format!(
                "negative distance_to_station {}",
                self.distance_to_station
            )));
        }
        if self.energy < -INVARIANT_TOLERANCE {
            return Err(self.violation(format!("negative energy {}", self.energy)));
        }
        if self.energy > self.capacity + INVARIANT_TOLERANCE {
            return Err(self.violation(format!(
                "energy {} exceeds capacity {}",
                self.energy, self.capacity
            )));
        }
        Ok(())
    }

    fn violation(&self, detail: String) -> FleetError {
        FleetError::InvariantViolation {
            id: self.id.clone(),
            detail,
        }
    }

    pub fn snapshot(&self) -> SatelliteSnapshot {
        SatelliteSnapshot {
            id: self.id.clone(),
            energy: self.energy,
            capacity: self.capacity,
            distance_to_station: self.distance_to_station,
            status: self.status,
            priority: self.priority,
        }
    }
}

/// Reporting view of a satellite at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteSnapshot {
    pub id: SatelliteId,
    pub energy: f64,
    pub capacity: f64,
    pub distance_to_station: f64,
    pub status: SatelliteStatus,
    pub priority: u32,
}

impl SatelliteSnapshot {
    pub fn energy_percent(&self) -> f64 {
        self.energy / self.capacity * 100.0
    }
}
