// raycar_sim/src/simulation/plugins/world/mod.rs

//! The rigid body world: avian3d, configured from `[world]`, plus the ground.

use std::time::Duration;

use avian3d::prelude::*;

use crate::prelude::*;
use crate::simulation::core::transforms::z_up_vector_to_bevy;

/// Half the side length of the square ground slab, in metres.
pub const GROUND_HALF_SIZE: f32 = 1000.0;
/// Slab thickness. Its top face is the `z = 0` plane.
const GROUND_THICKNESS: f32 = 1.0;

/// Marks the static ground body.
#[derive(Component, Debug, Default)]
pub struct Ground;

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        // Physics steps in FixedPostUpdate, ahead of every Update set.
        app.add_plugins(PhysicsPlugins::default()).add_systems(
            OnEnter(AppState::Running),
            (configure_physics, spawn_ground),
        );
    }
}

// --- SYSTEMS ---

/// Applies the scenario's world settings to the physics resources and clocks.
fn configure_physics(
    mut commands: Commands,
    scenario: Res<ScenarioConfig>,
    mut fixed: ResMut<Time<Fixed>>,
    mut virtual_time: ResMut<Time<Virtual>>,
) {
    let settings = &scenario.world;

    fixed.set_timestep_seconds(settings.fixed_time_step);
    // Frames longer than this are dropped, not caught up.
    virtual_time.set_max_delta(Duration::from_secs_f64(settings.max_step_delta()));

    commands.insert_resource(Gravity(z_up_vector_to_bevy(&settings.gravity())));
    commands.insert_resource(SubstepCount(settings.solver_iterations as u32));
    commands.insert_resource(sleeping_threshold(settings));
    commands.insert_resource(DeactivationTime(settings.sleep_time_limit as f32));

    info!(
        "[WORLD] {:.1} Hz fixed step, {} solver substeps, gravity {:?}, max catch-up {:.3}s.",
        1.0 / settings.fixed_time_step,
        settings.solver_iterations,
        settings.gravity,
        settings.max_step_delta()
    );
}

/// Speeds below which a body may fall asleep. Negative values never trigger.
pub fn sleeping_threshold(settings: &WorldSettings) -> SleepingThreshold {
    if settings.allow_sleep {
        let limit = settings.sleep_speed_limit as f32;
        SleepingThreshold {
            linear: limit,
            angular: limit,
        }
    } else {
        SleepingThreshold {
            linear: -1.0,
            angular: -1.0,
        }
    }
}

/// The infinite plane, approximated by a static slab whose top face is at
/// `z = 0`.
fn spawn_ground(mut commands: Commands, scenario: Res<ScenarioConfig>) {
    let settings = &scenario.world;
    commands.spawn((
        Name::new("Ground"),
        Ground,
        RigidBody::Static,
        Collider::cuboid(
            GROUND_HALF_SIZE * 2.0,
            GROUND_THICKNESS,
            GROUND_HALF_SIZE * 2.0,
        ),
        Friction::new(settings.ground_friction as f32),
        Restitution::new(settings.ground_restitution as f32),
        Transform::from_xyz(0.0, -GROUND_THICKNESS * 0.5, 0.0),
    ));
    debug!(
        "[WORLD] Ground spawned: friction {}, restitution {}.",
        settings.ground_friction, settings.ground_restitution
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_can_be_switched_off() {
        let asleep = sleeping_threshold(&WorldSettings::default());
        assert_eq!(asleep.linear, 0.1);

        let settings = WorldSettings {
            allow_sleep: false,
            ..Default::default()
        };
        let awake = sleeping_threshold(&settings);
        assert!(awake.linear < 0.0 && awake.angular < 0.0);
    }
}
