// raycar_sim/src/simulation/plugins/debugging/mod.rs

use avian3d::prelude::PhysicsDebugPlugin;
use bevy::prelude::*;

// --- Sub-modules for organization ---
mod components;
mod systems;

pub use components::{DebugGizmoSettings, FollowCamera};

use crate::prelude::{AppState, Simulation, TickSet};

/// Windowed presentation: camera, light and gizmo drawing of the published
/// pose. Needs the render plugins, so it is only added with `--windowed`.
pub struct DebuggingPlugin;

impl Plugin for DebuggingPlugin {
    fn build(&self, app: &mut App) {
        // Collider outlines straight from avian.
        app.add_plugins(PhysicsDebugPlugin::default())
            .init_resource::<DebugGizmoSettings>()
            .add_systems(OnEnter(AppState::Running), systems::spawn_camera_and_light)
            .add_systems(
                Update,
                (
                    // Global hotkey toggles
                    systems::toggle_gizmos,
                    // The actual drawing systems
                    systems::follow_chassis,
                    systems::draw_ground_grid,
                    systems::draw_vehicle,
                    systems::draw_suspension,
                )
                    .after(TickSet::Publish)
                    .run_if(in_state(AppState::Running))
                    .run_if(resource_exists::<Simulation>),
            );
    }
}
