// raycar_sim/src/simulation/core/app_state.rs

use bevy::{ecs::schedule::SystemSet, prelude::States};

/// The major phases of the application's lifecycle.
#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    /// Reading the catalog and the scenario. The app starts here.
    #[default]
    Loading,

    /// The simulation ticks once per frame.
    Running,

    /// The run limit was reached. The summary is printed and the app exits.
    Finished,
}

// =========================================================================
// == Per-Frame Sets (The "Data Flow") ==
// =========================================================================

/// Chained in `Update` in declaration order while `AppState::Running`.
/// Physics runs in the fixed schedules before any of them.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSet {
    /// Keyboard and scripted inputs write into the shared action state.
    Input,
    /// One controller update with the frame delta, and the reset if requested.
    /// The frame's fixed physics steps have already run.
    Simulate,
    /// The fresh pose snapshot is copied out for presentation.
    Publish,
    /// Logging, run statistics and the run limit check.
    Report,
}
