use crate::satellite::SatelliteId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid static specification for {id}: {reason}")]
    InvalidSpec { id: SatelliteId, reason: String },
}

/// Errors that stop the simulation.
#[derive(Debug, Error)]
pub enum FleetError {
    /// A computed step left a satellite in a physically impossible state.
    #[error("invariant violated for satellite {id}: {detail}")]
    InvariantViolation { id: SatelliteId, detail: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a telemetry reading was not merged. Skips are recoverable and reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// No static specification exists for the id.
    MissingSpec,
    /// Reading is older than the newest one already merged.
    Stale { reading_time: u64, last_seen: u64 },
    /// Field values outside their physical range.
    InvalidReading { reason: String },
    /// The satellite holds the dock; the scheduler owns its state until release.
    DockLocked,
}

impl core::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SkipReason::MissingSpec => write!(f, "no static specification"),
            SkipReason::Stale { reading_time, last_seen } => {
                write!(f, "stale reading (t={reading_time} < last seen t={last_seen})")
            }
            SkipReason::InvalidReading { reason } => write!(f, "invalid reading: {reason}"),
            SkipReason::DockLocked => write!(f, "satellite is docking, reading ignored"),
        }
    }
}
