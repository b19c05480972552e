// raycar_core/src/tuning.rs

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::TuningError;
use crate::physics::box_inertia;
use crate::types::Pose;

// =========================================================================
// == Vehicle Tuning ==
// =========================================================================

/// # VehicleTuning
/// Every named constant that shapes the car: chassis geometry and mass, wheel
/// layout, suspension response, and the steering/acceleration/brake mapping.
///
/// Loaded once at startup. Frame conventions: chassis `+X` forward, `+Y` left,
/// `+Z` up. Suspension stiffness and damping are mass-normalised, i.e. they are
/// multiplied by the chassis mass when turned into a force.
#[cfg_attr(feature = "bevy", derive(bevy_ecs::prelude::Resource))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleTuning {
    // --- Chassis ---
    pub chassis_width: f64,
    pub chassis_height: f64,
    pub chassis_depth: f64,
    /// Offset of the box shape from the chassis centre of mass (chassis frame).
    pub chassis_offset: [f64; 3],
    pub chassis_mass: f64,

    // --- Wheel layout ---
    pub wheel_front_offset_depth: f64,
    pub wheel_back_offset_depth: f64,
    pub wheel_offset_width: f64,
    pub wheel_radius: f64,
    /// Tread width. Only consumed by presentation.
    pub wheel_height: f64,
    /// Mass of the visual wheel bodies. Not simulated.
    pub wheel_mass: f64,

    // --- Suspension ---
    pub wheel_suspension_stiffness: f64,
    pub wheel_suspension_rest_length: f64,
    pub wheel_friction_slip: f64,
    pub wheel_damping_relaxation: f64,
    pub wheel_damping_compression: f64,
    pub wheel_max_suspension_force: f64,
    pub wheel_roll_influence: f64,
    pub wheel_max_suspension_travel: f64,
    /// Spin rate (rad/s) of a driven wheel that slips or hangs in the air.
    pub wheel_custom_sliding_rotational_speed: f64,

    // --- Controls ---
    /// Steering rate in rad/s.
    pub controls_steering_speed: f64,
    pub controls_steering_max: f64,
    pub controls_accelerating_max_speed: f64,
    pub controls_accelerating_max_speed_boost: f64,
    /// Engine force applied while accelerating.
    pub controls_accelerating_speed: f64,
    pub controls_accelerating_speed_boost: f64,
    pub controls_brake_strength: f64,

    // --- Spawn ---
    pub spawn_position: [f64; 3],
    /// Heading about `+Z`, radians.
    pub spawn_yaw: f64,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            chassis_width: 1.02,
            chassis_height: 1.16,
            chassis_depth: 2.03,
            chassis_offset: [0.0, 0.0, 0.41],
            chassis_mass: 40.0,

            wheel_front_offset_depth: 0.635,
            wheel_back_offset_depth: -0.475,
            wheel_offset_width: 0.39,
            wheel_radius: 0.25,
            wheel_height: 0.24,
            wheel_mass: 5.0,

            wheel_suspension_stiffness: 50.0,
            wheel_suspension_rest_length: 0.1,
            wheel_friction_slip: 10.0,
            wheel_damping_relaxation: 1.8,
            wheel_damping_compression: 1.5,
            wheel_max_suspension_force: 100_000.0,
            wheel_roll_influence: 0.01,
            wheel_max_suspension_travel: 0.3,
            wheel_custom_sliding_rotational_speed: 30.0,

            controls_steering_speed: 0.015,
            controls_steering_max: PI * 0.17,
            controls_accelerating_max_speed: 0.12,
            controls_accelerating_max_speed_boost: 0.24,
            controls_accelerating_speed: 22.0,
            controls_accelerating_speed_boost: 32.0,
            controls_brake_strength: 0.6,

            spawn_position: [0.0, 0.0, 2.0],
            spawn_yaw: -PI * 0.5,
        }
    }
}

impl VehicleTuning {
    /// Fails fast on configuration the simulation cannot run with.
    pub fn validate(&self) -> Result<(), TuningError> {
        let named = [
            ("chassis_width", self.chassis_width),
            ("chassis_height", self.chassis_height),
            ("chassis_depth", self.chassis_depth),
            ("chassis_mass", self.chassis_mass),
            ("wheel_front_offset_depth", self.wheel_front_offset_depth),
            ("wheel_back_offset_depth", self.wheel_back_offset_depth),
            ("wheel_offset_width", self.wheel_offset_width),
            ("wheel_radius", self.wheel_radius),
            ("wheel_suspension_stiffness", self.wheel_suspension_stiffness),
            ("wheel_suspension_rest_length", self.wheel_suspension_rest_length),
            ("wheel_friction_slip", self.wheel_friction_slip),
            ("wheel_damping_relaxation", self.wheel_damping_relaxation),
            ("wheel_damping_compression", self.wheel_damping_compression),
            ("wheel_max_suspension_force", self.wheel_max_suspension_force),
            ("wheel_roll_influence", self.wheel_roll_influence),
            ("wheel_max_suspension_travel", self.wheel_max_suspension_travel),
            (
                "wheel_custom_sliding_rotational_speed",
                self.wheel_custom_sliding_rotational_speed,
            ),
            ("controls_steering_speed", self.controls_steering_speed),
            ("controls_steering_max", self.controls_steering_max),
            (
                "controls_accelerating_max_speed",
                self.controls_accelerating_max_speed,
            ),
            (
                "controls_accelerating_max_speed_boost",
                self.controls_accelerating_max_speed_boost,
            ),
            ("controls_accelerating_speed", self.controls_accelerating_speed),
            (
                "controls_accelerating_speed_boost",
                self.controls_accelerating_speed_boost,
            ),
            ("controls_brake_strength", self.controls_brake_strength),
            ("spawn_yaw", self.spawn_yaw),
        ];
        if let Some((name, _)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TuningError::NonFinite(*name));
        }
        if self
            .chassis_offset
            .iter()
            .chain(self.spawn_position.iter())
            .any(|v| !v.is_finite())
        {
            return Err(TuningError::NonFinite("chassis_offset/spawn_position"));
        }

        if self.chassis_mass <= 0.0 {
            return Err(TuningError::NonPositiveMass(self.chassis_mass));
        }
        let dims = [self.chassis_depth, self.chassis_width, self.chassis_height];
        if dims.iter().any(|d| *d <= 0.0) {
            return Err(TuningError::InvalidChassisDimensions(dims));
        }
        if self.wheel_radius <= 0.0 {
            return Err(TuningError::InvalidWheelRadius(self.wheel_radius));
        }
        if self.wheel_suspension_rest_length <= 0.0 {
            return Err(TuningError::NonPositiveRestLength(
                self.wheel_suspension_rest_length,
            ));
        }
        if self.wheel_max_suspension_travel < 0.0 {
            return Err(TuningError::NegativeSuspensionTravel(
                self.wheel_max_suspension_travel,
            ));
        }
        if self.wheel_max_suspension_force < 0.0 {
            return Err(TuningError::NegativeSuspensionForce(
                self.wheel_max_suspension_force,
            ));
        }
        Ok(())
    }

    /// Half extents of the chassis box in the chassis frame.
    pub fn chassis_half_extents(&self) -> Vector3<f64> {
        Vector3::new(
            self.chassis_depth * 0.5,
            self.chassis_width * 0.5,
            self.chassis_height * 0.5,
        )
    }

    /// Full extents of the chassis box: depth, width, height.
    pub fn chassis_size(&self) -> Vector3<f64> {
        self.chassis_half_extents() * 2.0
    }

    /// Principal moments of the chassis box about the centre of mass. The
    /// shape offset does not shift them.
    pub fn chassis_inertia(&self) -> Vector3<f64> {
        box_inertia(self.chassis_mass, &self.chassis_size())
    }

    pub fn chassis_offset(&self) -> Vector3<f64> {
        Vector3::from(self.chassis_offset)
    }

    /// The canonical spawn pose the chassis is created at and reset to.
    pub fn spawn_pose(&self) -> Pose {
        Pose::new(
            Vector3::from(self.spawn_position),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), self.spawn_yaw),
        )
    }
}

// =========================================================================
// == World Settings ==
// =========================================================================

/// Global parameters of the rigid body world, applied to the physics engine.
#[cfg_attr(feature = "bevy", derive(bevy_ecs::prelude::Resource))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldSettings {
    /// Global gravity vector in m/s^2.
    pub gravity: [f64; 3],
    /// Size of one fixed physics step in seconds.
    pub fixed_time_step: f64,
    /// Solver sub-steps per fixed step.
    pub solver_iterations: usize,
    /// Upper bound on fixed steps taken to catch up a single frame.
    pub max_sub_steps: usize,
    /// Frame delta upper bound applied before stepping.
    pub max_frame_delta: f64,
    /// Coulomb friction of the ground contact. Traction comes from the wheels.
    pub ground_friction: f64,
    pub ground_restitution: f64,
    pub allow_sleep: bool,
    pub sleep_speed_limit: f64,
    pub sleep_time_limit: f64,
    pub linear_damping: f64,
    pub angular_damping: f64,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            gravity: [0.0, 0.0, -13.0],
            fixed_time_step: 1.0 / 60.0,
            solver_iterations: 10,
            max_sub_steps: 3,
            max_frame_delta: 0.033,
            ground_friction: 0.0,
            ground_restitution: 0.2,
            allow_sleep: true,
            sleep_speed_limit: 0.1,
            sleep_time_limit: 1.0,
            linear_damping: 0.01,
            angular_damping: 0.01,
        }
    }
}

impl WorldSettings {
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.gravity.iter().any(|g| !g.is_finite()) {
            return Err(TuningError::NonFinite("gravity"));
        }
        if !self.fixed_time_step.is_finite() || self.fixed_time_step <= 0.0 {
            return Err(TuningError::NonPositiveTimeStep(self.fixed_time_step));
        }
        if !self.max_frame_delta.is_finite() {
            return Err(TuningError::NonFinite("max_frame_delta"));
        }
        if self.solver_iterations == 0 {
            return Err(TuningError::ZeroSolverIterations);
        }
        if self.max_sub_steps == 0 {
            return Err(TuningError::ZeroSubSteps);
        }
        Ok(())
    }

    pub fn gravity(&self) -> Vector3<f64> {
        Vector3::from(self.gravity)
    }

    /// Longest frame the fixed loop catches up on, in seconds.
    pub fn max_step_delta(&self) -> f64 {
        self.max_frame_delta
            .min(self.fixed_time_step * self.max_sub_steps as f64)
    }

    /// Clamps a raw frame delta into `[0, max_frame_delta]`. Non-finite input
    /// counts as a stalled frame.
    pub fn clamp_frame_delta(&self, delta: f64) -> f64 {
        if delta.is_finite() {
            delta.clamp(0.0, self.max_frame_delta)
        } else {
            0.0
        }
    }
}
