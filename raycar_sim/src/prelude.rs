// raycar_sim/src/prelude.rs

// Re-export the entire Bevy prelude for convenience.
pub use bevy::prelude::*;

// The pure vehicle types, listed by name to keep the Bevy and avian names clear.
pub use raycar_core::prelude::{
    Action, ActionState, DriveCommand, InputEvent, Pose, PoseSnapshot, Real, SharedActionState,
    Simulation, TuningError, VehicleTuning, WheelPosition, WorldSettings, WHEEL_COUNT,
};

// Common simulation-side types for the plugins.
pub use crate::cli::Cli;
pub use crate::simulation::config::structs::*;
pub use crate::simulation::core::app_state::{AppState, TickSet};
pub use crate::simulation::plugins::input::ActionInput;
pub use crate::simulation::plugins::vehicles::raycast_car::{CarEntities, Chassis, LatestPose};
