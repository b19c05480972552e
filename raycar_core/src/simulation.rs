// raycar_core/src/simulation.rs

use nalgebra::Vector3;

use crate::actions::ActionState;
use crate::controller::{active_speed_cap, ControlTuning, DriveCommand, VehicleController};
use crate::error::TuningError;
use crate::physics::{ChassisState, PointImpulse, RayCaster, SuspensionForceProvider};
use crate::pose::PoseSnapshot;
use crate::suspension::RaycastSuspension;
use crate::tuning::{VehicleTuning, WorldSettings};
use crate::types::Real;

/// The vehicle side of one car-on-a-plane simulation.
///
/// The host physics engine owns the chassis body. Each frame it calls, in
/// order:
///
/// 1. [`step_forces`](Self::step_forces) then [`finish_step`](Self::finish_step)
///    around every fixed step it takes,
/// 2. [`drive`](Self::drive) with the frame's actions, plus
///    [`reset`](Self::reset) when the actions carry a reset,
/// 3. [`publish`](Self::publish) with the chassis state it ended on.
///
/// Independent values never share state.
#[cfg_attr(feature = "bevy", derive(bevy_ecs::prelude::Resource))]
#[derive(Debug, Clone)]
pub struct Simulation {
    tuning: VehicleTuning,
    settings: WorldSettings,
    suspension: RaycastSuspension,
    controller: VehicleController,
    last_command: DriveCommand,
    /// Planar speed limit of the drive action currently held.
    speed_cap: Option<Real>,
    tick: u64,
    steps: u64,
    time: Real,
    resets: u64,
    latest: PoseSnapshot,
}

impl Simulation {
    pub fn new(tuning: VehicleTuning, settings: WorldSettings) -> Result<Self, TuningError> {
        tuning.validate()?;
        settings.validate()?;

        let spawn = spawn_state(&tuning);
        let mut suspension = RaycastSuspension::new(&tuning);
        suspension.update_wheel_transforms(&spawn);
        let latest = PoseSnapshot::capture(0, 0.0, &spawn, &suspension);

        Ok(Self {
            controller: VehicleController::new(ControlTuning::from(&tuning)),
            tuning,
            settings,
            suspension,
            last_command: DriveCommand::default(),
            speed_cap: None,
            tick: 0,
            steps: 0,
            time: 0.0,
            resets: 0,
            latest,
        })
    }

    /// Default tuning on default world settings.
    pub fn with_defaults() -> Result<Self, TuningError> {
        Self::new(VehicleTuning::default(), WorldSettings::default())
    }

    /// The chassis at its spawn pose, at rest.
    pub fn spawn_state(&self) -> ChassisState {
        spawn_state(&self.tuning)
    }

    // --- Per frame ---

    /// Runs the controller for one frame and hands the commands to the
    /// wheels. `delta` is clamped to the world's frame bound.
    pub fn drive(
        &mut self,
        actions: &ActionState,
        chassis: &ChassisState,
        delta: Real,
    ) -> &DriveCommand {
        let delta = self.settings.clamp_frame_delta(delta);
        let speed = chassis.planar_speed();

        self.last_command = self.controller.update(actions, speed, delta);
        self.suspension.apply_command(&self.last_command);
        self.speed_cap = active_speed_cap(actions, self.controller.tuning());
        self.tick += 1;
        &self.last_command
    }

    /// Counts a reset and returns the state the chassis must be snapped to.
    /// Neither the controller runtime nor the wheel commands are touched.
    pub fn reset(&mut self) -> ChassisState {
        self.resets += 1;
        self.spawn_state()
    }

    /// Refreshes the wheel transforms and captures the frame's pose.
    pub fn publish(&mut self, chassis: &ChassisState) -> &PoseSnapshot {
        self.suspension.update_wheel_transforms(chassis);
        self.latest = PoseSnapshot::capture(self.tick, self.time, chassis, &self.suspension);
        &self.latest
    }

    // --- Per fixed step ---

    /// Suspension and traction impulses for the step about to be integrated.
    pub fn step_forces(
        &mut self,
        chassis: &ChassisState,
        ground: &dyn RayCaster,
        dt: Real,
        out: &mut Vec<PointImpulse>,
    ) {
        self.suspension.begin_step(chassis);
        for wheel in 0..self.suspension.wheel_count() {
            self.suspension.wheel_impulses(wheel, chassis, ground, dt, out);
        }
    }

    /// Closes a fixed step: advances wheel spin and world time. Returns the
    /// linear velocity to write back when the step left the chassis above
    /// the active speed cap.
    pub fn finish_step(&mut self, chassis: &ChassisState, dt: Real) -> Option<Vector3<Real>> {
        self.suspension.end_step(chassis, dt);
        self.steps += 1;
        self.time += dt;
        self.speed_cap
            .and_then(|cap| limit_planar_speed(&chassis.linear_velocity, cap))
    }

    // --- Accessors ---

    /// The pose published by the most recent frame.
    pub fn snapshot(&self) -> &PoseSnapshot {
        &self.latest
    }

    pub fn tuning(&self) -> &VehicleTuning {
        &self.tuning
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn suspension(&self) -> &RaycastSuspension {
        &self.suspension
    }

    pub fn controller(&self) -> &VehicleController {
        &self.controller
    }

    pub fn last_command(&self) -> &DriveCommand {
        &self.last_command
    }

    pub fn speed_cap(&self) -> Option<Real> {
        self.speed_cap
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Fixed steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn resets(&self) -> u64 {
        self.resets
    }

    pub fn time(&self) -> Real {
        self.time
    }
}

fn spawn_state(tuning: &VehicleTuning) -> ChassisState {
    ChassisState::at_rest(tuning.spawn_pose(), tuning.chassis_mass, tuning.chassis_inertia())
}

/// Scales the planar part of `velocity` down to `cap`, keeping the vertical
/// part. `None` when it is already within the cap.
pub fn limit_planar_speed(velocity: &Vector3<Real>, cap: Real) -> Option<Vector3<Real>> {
    let planar = velocity.xy().norm();
    if planar <= cap {
        return None;
    }
    let scale = cap.max(0.0) / planar;
    Some(Vector3::new(velocity.x * scale, velocity.y * scale, velocity.z))
}
