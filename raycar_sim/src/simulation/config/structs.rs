// raycar_sim/src/simulation/config/structs.rs

use bevy::prelude::Resource;
use figment::value::{Dict, Tag, Value};
use raycar_core::prelude::{Action, VehicleTuning, WorldSettings};
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Run parameters for the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    pub name: String,
    /// Seconds of simulated time before a headless run exits.
    pub duration: f64,
    /// Fixed frame delta fed to headless runs, in seconds.
    pub frame_delta: f64,
    /// Simulated seconds between pose log lines. Zero disables them.
    pub pose_log_interval: f64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            name: "unnamed".to_string(),
            duration: 10.0,
            frame_delta: 1.0 / 60.0,
            pose_log_interval: 1.0,
        }
    }
}

impl SimulationSection {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidSimulationValue(name, value))
            }
        };
        positive("duration", self.duration)?;
        positive("frame_delta", self.frame_delta)?;
        // Zero turns pose logging off.
        if self.pose_log_interval != 0.0 {
            positive("pose_log_interval", self.pose_log_interval)?;
        }
        Ok(())
    }
}

/// One entry of a scripted input timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedInput {
    /// Simulated time in seconds at which the event fires.
    pub at: f64,
    pub action: Action,
    #[serde(default = "pressed_by_default")]
    pub pressed: bool,
}

fn pressed_by_default() -> bool {
    true
}

/// The scenario file as written on disk, before prefab resolution.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RawScenario {
    #[serde(default)]
    pub simulation: SimulationSection,
    #[serde(default)]
    pub world: WorldSettings,
    /// Either inline tuning values or `from = "vehicles.<name>"` plus overrides.
    #[serde(default = "empty_table")]
    pub vehicle: Value,
    #[serde(default)]
    pub inputs: Vec<ScriptedInput>,
}

fn empty_table() -> Value {
    Value::Dict(Tag::Default, Dict::new())
}

/// A fully resolved and validated scenario.
#[derive(Resource, Debug, Clone, PartialEq, Default)]
pub struct ScenarioConfig {
    pub simulation: SimulationSection,
    pub world: WorldSettings,
    pub vehicle: VehicleTuning,
    /// Sorted by `at`.
    pub inputs: Vec<ScriptedInput>,
}
