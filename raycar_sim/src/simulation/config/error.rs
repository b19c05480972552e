// raycar_sim/src/simulation/config/error.rs

use raycar_core::error::TuningError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between reading a scenario file and handing a
/// validated tuning to the simulation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("scenario file not found: {0}")]
    ScenarioNotFound(PathBuf),

    #[error("failed to read scenario: {0}")]
    Extraction(#[from] figment::Error),

    #[error("failed to read catalog item {path}: {source}")]
    CatalogItem {
        path: PathBuf,
        #[source]
        source: figment::Error,
    },

    #[error("prefab '{0}' not found in catalog")]
    MissingPrefab(String),

    #[error("prefab '{0}' must resolve to a table to be merged")]
    PrefabNotATable(String),

    #[error("prefab '{0}' inherits from itself")]
    CyclicPrefab(String),

    #[error("[simulation] {0} must be finite and positive, got {1}")]
    InvalidSimulationValue(&'static str, f64),

    #[error("scripted input at {0} s is not a finite, non-negative time")]
    InvalidInputTime(f64),

    #[error(transparent)]
    Tuning(#[from] TuningError),
}
