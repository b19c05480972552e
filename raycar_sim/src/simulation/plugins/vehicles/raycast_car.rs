// raycar_sim/src/simulation/plugins/vehicles/raycast_car.rs

use avian3d::prelude::*;
use nalgebra::Vector3;
use raycar_core::prelude::{ChassisState, PointImpulse, RayCaster, RayHit};

use crate::prelude::*;
use crate::simulation::core::transforms::{
    bevy_quat_to_z_up, bevy_vector_to_z_up, pose_to_bevy_transform, z_up_extent_to_bevy,
    z_up_quat_to_bevy, z_up_vector_to_bevy,
};

/// The pose published by the most recent frame. Presentation and reporting
/// read this instead of the simulation itself.
#[derive(Resource, Debug, Clone)]
pub struct LatestPose(pub PoseSnapshot);

/// Marks the dynamic chassis body.
#[derive(Component, Debug, Default)]
pub struct Chassis;

/// The entities that make up the car. Wheel rays ignore both.
#[derive(Resource, Debug, Clone, Copy)]
pub struct CarEntities {
    pub chassis: Entity,
    pub collider: Entity,
}

type ChassisKinematics<'a> = (
    &'a Position,
    &'a Rotation,
    &'a LinearVelocity,
    &'a AngularVelocity,
);

// --- THE PLUGIN ---
pub struct RaycastCarPlugin;

impl Plugin for RaycastCarPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::Running), spawn_car)
            .add_systems(
                FixedUpdate,
                apply_wheel_impulses
                    .run_if(in_state(AppState::Running))
                    .run_if(resource_exists::<CarEntities>),
            )
            .add_systems(
                FixedPostUpdate,
                finish_physics_step
                    .after(PhysicsSet::StepSimulation)
                    .run_if(in_state(AppState::Running))
                    .run_if(resource_exists::<CarEntities>),
            )
            .add_systems(
                Update,
                (
                    drive_vehicle.in_set(TickSet::Simulate),
                    publish_pose.in_set(TickSet::Publish),
                )
                    .run_if(resource_exists::<CarEntities>),
            );
    }
}

// --- Frame conversion ---

/// Reads the chassis body back into the Z-up frame the vehicle model uses.
fn chassis_state(tuning: &VehicleTuning, body: ChassisKinematics) -> ChassisState {
    let (position, rotation, linear, angular) = body;
    ChassisState {
        position: bevy_vector_to_z_up(&position.0),
        orientation: bevy_quat_to_z_up(&rotation.0),
        linear_velocity: bevy_vector_to_z_up(&linear.0),
        angular_velocity: bevy_vector_to_z_up(&angular.0),
        mass: tuning.chassis_mass,
        inertia: tuning.chassis_inertia(),
    }
}

/// Wheel rays through avian's spatial query, against everything but the car.
struct SpatialGround<'a, 'w, 's> {
    query: &'a SpatialQuery<'w, 's>,
    filter: SpatialQueryFilter,
}

impl RayCaster for SpatialGround<'_, '_, '_> {
    fn cast_ray(
        &self,
        origin: &Vector3<Real>,
        dir: &Vector3<Real>,
        max_distance: Real,
    ) -> Option<RayHit> {
        let origin = z_up_vector_to_bevy(origin);
        let dir = Dir3::new(z_up_vector_to_bevy(dir)).ok()?;
        let hit = self
            .query
            .cast_ray(origin, dir, max_distance as f32, true, &self.filter)?;
        let point = origin + *dir * hit.distance;
        Some(RayHit {
            point: bevy_vector_to_z_up(&point),
            normal: bevy_vector_to_z_up(&hit.normal),
            distance: hit.distance as Real,
        })
    }
}

// --- SYSTEMS ---

/// Builds the vehicle model and the avian chassis from the resolved scenario.
fn spawn_car(
    mut commands: Commands,
    scenario: Res<ScenarioConfig>,
    mut exit: EventWriter<AppExit>,
) {
    let sim = match Simulation::new(scenario.vehicle.clone(), scenario.world.clone()) {
        Ok(sim) => sim,
        Err(e) => {
            error!("Failed to build the simulation: {}", e);
            exit.write(AppExit::error());
            return;
        }
    };
    let tuning = sim.tuning();
    let world = &scenario.world;
    let spawn = sim.spawn_state();
    let transform = pose_to_bevy_transform(&spawn.pose());
    let size = z_up_extent_to_bevy(&tuning.chassis_size());

    // Friction and restitution match the ground so the averaged contact keeps
    // the ground's values.
    let collider = commands
        .spawn((
            Name::new("ChassisCollider"),
            Collider::cuboid(size.x, size.y, size.z),
            Friction::new(world.ground_friction as f32),
            Restitution::new(world.ground_restitution as f32),
            Transform::from_translation(z_up_vector_to_bevy(&tuning.chassis_offset())),
        ))
        .id();

    // Mass properties come from the tuning, not from the collider.
    let chassis = commands
        .spawn((
            Name::new("Chassis"),
            Chassis,
            RigidBody::Dynamic,
            Mass(tuning.chassis_mass as f32),
            AngularInertia::new(z_up_extent_to_bevy(&tuning.chassis_inertia())),
            CenterOfMass(Vec3::ZERO),
            (NoAutoMass, NoAutoAngularInertia, NoAutoCenterOfMass),
            SleepingDisabled,
            LinearDamping(world.linear_damping as f32),
            AngularDamping(world.angular_damping as f32),
            ExternalImpulse::default().with_persistence(false),
            (LinearVelocity::ZERO, AngularVelocity::ZERO),
            (
                Position(transform.translation),
                Rotation(transform.rotation),
                transform,
            ),
        ))
        .add_child(collider)
        .id();

    info!(
        "[SPAWN] Chassis at ({:.2}, {:.2}, {:.2}), mass {} kg, {} wheels, ray reach {:.2} m.",
        spawn.position.x,
        spawn.position.y,
        spawn.position.z,
        tuning.chassis_mass,
        WHEEL_COUNT,
        sim.suspension().spec(WheelPosition::FrontLeft).ray_length()
    );
    commands.insert_resource(CarEntities { chassis, collider });
    commands.insert_resource(LatestPose(sim.snapshot().clone()));
    commands.insert_resource(sim);
}

/// FIXED STEP: suspension and traction impulses for the step about to run.
fn apply_wheel_impulses(
    mut sim: ResMut<Simulation>,
    car: Res<CarEntities>,
    time: Res<Time<Fixed>>,
    spatial_query: SpatialQuery,
    mut bodies: Query<(ChassisKinematics, &mut ExternalImpulse), With<Chassis>>,
    mut impulses: Local<Vec<PointImpulse>>,
) {
    let Ok((kinematics, mut external)) = bodies.get_mut(car.chassis) else {
        return;
    };
    let state = chassis_state(sim.tuning(), kinematics);
    let ground = SpatialGround {
        query: &spatial_query,
        filter: SpatialQueryFilter::from_excluded_entities([car.chassis, car.collider]),
    };

    impulses.clear();
    sim.step_forces(&state, &ground, time.delta_secs_f64(), &mut impulses);

    let center = z_up_vector_to_bevy(&state.position);
    for p in impulses.iter() {
        external.apply_impulse_at_point(
            z_up_vector_to_bevy(&p.impulse),
            z_up_vector_to_bevy(&p.point),
            center,
        );
    }
}

/// FIXED STEP: wheel spin, world time and the speed cap, once avian has
/// integrated the step.
fn finish_physics_step(
    mut sim: ResMut<Simulation>,
    car: Res<CarEntities>,
    time: Res<Time<Fixed>>,
    mut bodies: Query<
        (&Position, &Rotation, &mut LinearVelocity, &AngularVelocity),
        With<Chassis>,
    >,
) {
    let Ok((position, rotation, mut linear, angular)) = bodies.get_mut(car.chassis) else {
        return;
    };
    let state = chassis_state(sim.tuning(), (position, rotation, &*linear, angular));
    if let Some(limited) = sim.finish_step(&state, time.delta_secs_f64()) {
        linear.0 = z_up_vector_to_bevy(&limited);
    }
}

/// RUNTIME: one controller update per frame, then the reset if requested.
fn drive_vehicle(
    mut sim: ResMut<Simulation>,
    input: Res<ActionInput>,
    time: Res<Time>,
    car: Res<CarEntities>,
    mut bodies: Query<
        (
            &mut Position,
            &mut Rotation,
            &mut LinearVelocity,
            &mut AngularVelocity,
            &mut Transform,
        ),
        With<Chassis>,
    >,
) {
    let Ok((mut position, mut rotation, mut linear, mut angular, mut transform)) =
        bodies.get_mut(car.chassis)
    else {
        return;
    };
    let actions = input.0.snapshot();
    let kinematics = (&*position, &*rotation, &*linear, &*angular);
    let state = chassis_state(sim.tuning(), kinematics);
    let command = sim.drive(&actions, &state, time.delta_secs_f64());
    trace!(
        "[TICK] speed {:.3}, engine {:?}, brake {:?}",
        state.planar_speed(),
        command.engine_force,
        command.brake
    );

    if actions.reset {
        let spawn = sim.reset();
        *transform = pose_to_bevy_transform(&spawn.pose());
        position.0 = transform.translation;
        rotation.0 = z_up_quat_to_bevy(&spawn.orientation);
        linear.0 = Vec3::ZERO;
        angular.0 = Vec3::ZERO;
        info!(
            "[RESET] Chassis returned to the spawn pose at t={:.2}s (reset #{}).",
            sim.time(),
            sim.resets()
        );
    }
}

fn publish_pose(
    mut sim: ResMut<Simulation>,
    car: Res<CarEntities>,
    bodies: Query<ChassisKinematics, With<Chassis>>,
    mut latest: ResMut<LatestPose>,
) {
    let Ok(kinematics) = bodies.get(car.chassis) else {
        return;
    };
    let state = chassis_state(sim.tuning(), kinematics);
    latest.0 = sim.publish(&state).clone();
}
