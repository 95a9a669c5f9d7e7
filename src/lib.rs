//! # Satellite Dock Scheduler
//!
//! Predictive energy-failure detection and single-dock charging arbitration for a
//! fleet of satellites sharing one orbital charging station.
//!
//! ## Features
//!
//! - **Failure prediction**: forward simulation of energy against the safe docking threshold
//! - **Urgency ranking**: CRITICAL / ALERT / shortage priorities with a closest-first tie-break
//! - **Dock arbitration**: exactly one occupant, advanced through travel and charging
//! - **Telemetry merging**: layered defaults, stale and invalid readings skipped
//! - **Reporting**: console progress bars, compact lines or JSON per tick
//!
//! ## Quick Start
//!
//! ```rust
//! use satdock::{FleetConfig, FleetController, SatelliteSpec, SpecCatalog, TelemetryReading};
//!
//! let mut catalog = SpecCatalog::new();
//! catalog.insert("SAT-1".to_string(), SatelliteSpec::with_capacity(100.0));
//!
//! let mut controller = FleetController::new(FleetConfig::default(), catalog).unwrap();
//! let outcome = controller
//!     .process_batch(&[TelemetryReading::new("SAT-1", 0, 20.0, 40.0)])
//!     .unwrap();
//!
//! assert_eq!(outcome.dock_occupant.as_deref(), Some("SAT-1"));
//! ```
//!
//! ## Architecture
//!
//! - [`store`] - Satellite state between ticks
//! - [`telemetry`] - Folding readings into the store
//! - [`predictor`] - Forward energy forecast
//! - [`ranker`] - Priorities and alerts
//! - [`scheduler`] - The dock lease and occupant advance
//! - [`controller`] - One tick: merge, rank, schedule, report

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod loader;
pub mod predictor;
pub mod ranker;
pub mod report;
pub mod satellite;
pub mod scheduler;
pub mod store;
pub mod telemetry;

// Re-export main public types for convenience
pub use config::FleetConfig;
pub use controller::{FleetController, TickOutcome, TickReporter};
pub use error::{ConfigError, FleetError, LoadError, SkipReason};
pub use satellite::{Satellite, SatelliteId, SatelliteSnapshot, SatelliteSpec, SatelliteStatus, TelemetryReading};
pub use store::{SatelliteStore, SpecCatalog};
