//! JSON input loading.
//!
//! Static specifications are a JSON object keyed by satellite id; telemetry is a
//! JSON array of readings in arrival order.

use crate::error::LoadError;
use crate::satellite::TelemetryReading;
use crate::store::SpecCatalog;
use serde::de::DeserializeOwned;
use std::path::Path;

pub fn load_spec_catalog(path: impl AsRef<Path>) -> Result<SpecCatalog, LoadError> {
    let catalog: SpecCatalog = read_json(path.as_ref())?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

pub fn load_telemetry(path: impl AsRef<Path>) -> Result<Vec<TelemetryReading>, LoadError> {
    read_json(path.as_ref())
}

pub fn parse_spec_catalog(json: &str) -> Result<SpecCatalog, LoadError> {
    let catalog: SpecCatalog = serde_json::from_str(json).map_err(|source| LoadError::Parse {
        path: "<inline>".to_string(),
        source,
    })?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// Capacity must be a positive number; optional fields are left to the merger's defaults.
pub fn validate_catalog(catalog: &SpecCatalog) -> Result<(), LoadError> {
    for (id, spec) in catalog {
        if !spec.capacity.is_finite() || spec.capacity <= 0.0 {
            return Err(LoadError::InvalidSpec {
                id: id.clone(),
                reason: format!("capacity {} must be a positive number", spec.capacity),
            });
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
        path: display,
        source,
    })
}
