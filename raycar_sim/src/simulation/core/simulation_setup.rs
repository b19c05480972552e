// raycar_sim/src/simulation/core/simulation_setup.rs

use crate::prelude::*;

/// Registers the lifecycle state and the per-frame set chain every other
/// plugin schedules into.
pub struct SimulationSetupPlugin;

impl Plugin for SimulationSetupPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>();

        // --- CONFIGURE THE FRAME PIPELINE ---
        // Inputs land before the tick, the tick before anyone reads its pose.
        app.configure_sets(
            Update,
            (
                TickSet::Input,
                TickSet::Simulate,
                TickSet::Publish,
                TickSet::Report,
            )
                .chain()
                .run_if(in_state(AppState::Running)),
        );

        app.add_systems(OnEnter(AppState::Running), log_running)
            .add_systems(OnEnter(AppState::Finished), log_finished);
    }
}

fn log_running(scenario: Res<ScenarioConfig>) {
    info!(
        "Configuration complete. Running scenario '{}'.",
        scenario.simulation.name
    );
}

fn log_finished() {
    info!("Run limit reached. Transitioning to Finished state.");
}
