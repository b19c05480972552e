// raycar_core/src/suspension.rs

//! Raycast wheels: one ray per wheel replaces a simulated wheel body.
//!
//! Each fixed step the physics engine hands [`RaycastSuspension`] a copy of
//! the chassis state. For every wheel the model casts a ray from the chassis-mounted
//! connection point along the chassis down axis, turns the hit distance into a
//! spring/damper force, adds longitudinal (engine, brake) and lateral traction,
//! and returns the resulting point impulses for the engine to apply.

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::controller::DriveCommand;
use crate::physics::{ChassisState, PointImpulse, RayCaster, SuspensionForceProvider};
use crate::tuning::VehicleTuning;
use crate::types::{Pose, Real, WheelPosition, WHEEL_COUNT};

/// Below this |normal . ray| the contact is treated as grazing.
const GRAZING_CONTACT_DOT: Real = -0.1;
/// Damping factor of the lateral bilateral constraint.
const SIDE_CONTACT_DAMPING: Real = 0.2;
/// Weight of the forward impulse in the friction circle test.
const FORWARD_SLIP_WEIGHT: Real = 0.5;
/// Per step decay of the stored spin delta.
const SPIN_DECAY: Real = 0.99;

// =========================================================================
// == Wheel Spec ==
// =========================================================================

/// Static per-wheel configuration in the chassis frame.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelSpec {
    pub position: WheelPosition,
    pub connection_point: Vector3<Real>,
    /// Suspension ray direction (local down).
    pub direction: Vector3<Real>,
    pub axle: Vector3<Real>,
    pub radius: Real,
    pub suspension_stiffness: Real,
    pub suspension_rest_length: Real,
    pub damping_compression: Real,
    pub damping_relaxation: Real,
    pub max_suspension_force: Real,
    pub max_suspension_travel: Real,
    pub roll_influence: Real,
    pub friction_slip: Real,
    pub custom_sliding_rotational_speed: Real,
}

impl WheelSpec {
    pub fn from_tuning(tuning: &VehicleTuning, position: WheelPosition) -> Self {
        let depth = if position.is_front() {
            tuning.wheel_front_offset_depth
        } else {
            tuning.wheel_back_offset_depth
        };
        let width = if position.is_right_side() {
            -tuning.wheel_offset_width
        } else {
            tuning.wheel_offset_width
        };
        Self {
            position,
            connection_point: Vector3::new(depth, width, 0.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
            axle: Vector3::new(0.0, 1.0, 0.0),
            radius: tuning.wheel_radius,
            suspension_stiffness: tuning.wheel_suspension_stiffness,
            suspension_rest_length: tuning.wheel_suspension_rest_length,
            damping_compression: tuning.wheel_damping_compression,
            damping_relaxation: tuning.wheel_damping_relaxation,
            max_suspension_force: tuning.wheel_max_suspension_force,
            max_suspension_travel: tuning.wheel_max_suspension_travel,
            roll_influence: tuning.wheel_roll_influence,
            friction_slip: tuning.wheel_friction_slip,
            custom_sliding_rotational_speed: tuning.wheel_custom_sliding_rotational_speed,
        }
    }

    /// Reach of the suspension ray. A hit further away leaves the wheel airborne.
    pub fn ray_length(&self) -> Real {
        self.suspension_rest_length + self.max_suspension_travel
    }

    pub fn min_suspension_length(&self) -> Real {
        self.suspension_rest_length - self.max_suspension_travel
    }

    pub fn max_suspension_length(&self) -> Real {
        self.suspension_rest_length + self.max_suspension_travel
    }

    /// Local up axis, the steering axis.
    pub fn up(&self) -> Unit<Vector3<Real>> {
        Unit::new_normalize(-self.direction)
    }

    fn steering_rotation(&self, steering: Real) -> UnitQuaternion<Real> {
        UnitQuaternion::from_axis_angle(&self.up(), steering)
    }

    fn spin_rotation(&self, rotation: Real) -> UnitQuaternion<Real> {
        UnitQuaternion::from_axis_angle(&Unit::new_normalize(self.axle), rotation)
    }
}

// =========================================================================
// == Wheel State ==
// =========================================================================

/// Dynamic per-wheel state, refreshed every step.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelState {
    pub suspension_length: Real,
    pub in_contact: bool,
    pub contact_point: Vector3<Real>,
    pub contact_normal: Vector3<Real>,
    /// Always within `[0, max_suspension_force]`; zero while airborne.
    pub suspension_force: Real,
    pub suspension_relative_velocity: Real,
    clipped_inv_contact_dot: Real,

    // --- Commands ---
    pub steering: Real,
    pub engine_force: Real,
    pub brake: Real,

    // --- Traction ---
    pub sliding: bool,
    pub skid: Real,
    pub forward_impulse: Real,
    pub side_impulse: Real,

    // --- Spin ---
    pub rotation: Real,
    /// Spin applied last step. Carried over, decaying, while nothing drives it.
    pub delta_rotation: Real,

    // --- World frame ---
    pub connection_world: Vector3<Real>,
    pub direction_world: Vector3<Real>,
    pub world_pose: Pose,
}

impl WheelState {
    fn new(spec: &WheelSpec) -> Self {
        Self {
            suspension_length: spec.max_suspension_length(),
            in_contact: false,
            contact_point: Vector3::zeros(),
            contact_normal: -spec.direction,
            suspension_force: 0.0,
            suspension_relative_velocity: 0.0,
            clipped_inv_contact_dot: 1.0,
            steering: 0.0,
            engine_force: 0.0,
            brake: 0.0,
            sliding: false,
            skid: 1.0,
            forward_impulse: 0.0,
            side_impulse: 0.0,
            rotation: 0.0,
            delta_rotation: 0.0,
            connection_world: spec.connection_point,
            direction_world: spec.direction,
            world_pose: Pose::identity(),
        }
    }
}

// =========================================================================
// == Raycast Suspension ==
// =========================================================================

#[derive(Debug, Clone)]
pub struct RaycastSuspension {
    specs: [WheelSpec; WHEEL_COUNT],
    wheels: [WheelState; WHEEL_COUNT],
}

impl RaycastSuspension {
    pub fn new(tuning: &VehicleTuning) -> Self {
        let specs = WheelPosition::ALL.map(|p| WheelSpec::from_tuning(tuning, p));
        let wheels = std::array::from_fn(|i| WheelState::new(&specs[i]));
        Self { specs, wheels }
    }

    pub fn spec(&self, wheel: WheelPosition) -> &WheelSpec {
        &self.specs[wheel.index()]
    }

    pub fn wheel(&self, wheel: WheelPosition) -> &WheelState {
        &self.wheels[wheel.index()]
    }

    pub fn wheels(&self) -> &[WheelState; WHEEL_COUNT] {
        &self.wheels
    }

    pub fn wheels_in_contact(&self) -> usize {
        self.wheels.iter().filter(|w| w.in_contact).count()
    }

    // --- Commands ---

    /// Steering angle about the chassis up axis, counter-clockwise positive.
    pub fn set_steering_value(&mut self, value: Real, wheel: WheelPosition) {
        self.wheels[wheel.index()].steering = value;
    }

    /// Longitudinal drive force, positive forward.
    pub fn apply_engine_force(&mut self, force: Real, wheel: WheelPosition) {
        self.wheels[wheel.index()].engine_force = force;
    }

    /// Upper bound on the rolling friction impulse per step.
    pub fn set_brake(&mut self, brake: Real, wheel: WheelPosition) {
        self.wheels[wheel.index()].brake = brake;
    }

    /// Writes one tick's commands; each channel keeps only the latest value.
    pub fn apply_command(&mut self, command: &DriveCommand) {
        for wheel in WheelPosition::ALL {
            let i = wheel.index();
            self.set_steering_value(command.steering[i], wheel);
            self.apply_engine_force(command.engine_force[i], wheel);
            self.set_brake(command.brake[i], wheel);
        }
    }

    /// Recomputes every wheel's world pose from the current chassis pose.
    pub fn update_wheel_transforms(&mut self, chassis: &ChassisState) {
        let tread_flip = |spec: &WheelSpec| {
            if spec.position.is_right_side() {
                UnitQuaternion::from_axis_angle(&spec.up(), std::f64::consts::PI)
            } else {
                UnitQuaternion::identity()
            }
        };
        for (spec, wheel) in self.specs.iter().zip(self.wheels.iter_mut()) {
            wheel.connection_world = chassis.point_to_world(&spec.connection_point);
            wheel.direction_world = chassis.vector_to_world(&spec.direction);

            let orientation = chassis.orientation
                * spec.steering_rotation(wheel.steering)
                * spec.spin_rotation(wheel.rotation)
                * tread_flip(spec);
            wheel.world_pose = Pose::new(
                wheel.connection_world + wheel.direction_world * wheel.suspension_length,
                UnitQuaternion::new_normalize(orientation.into_inner()),
            );
        }
    }

    // --- Per step pieces ---

    fn cast(
        spec: &WheelSpec,
        wheel: &mut WheelState,
        chassis: &ChassisState,
        ground: &dyn RayCaster,
    ) {
        wheel.connection_world = chassis.point_to_world(&spec.connection_point);
        wheel.direction_world = chassis.vector_to_world(&spec.direction);

        let hit = ground.cast_ray(
            &wheel.connection_world,
            &wheel.direction_world,
            spec.ray_length(),
        );
        let Some(hit) = hit else {
            wheel.in_contact = false;
            wheel.suspension_length = spec.max_suspension_length();
            wheel.suspension_relative_velocity = 0.0;
            wheel.contact_normal = -wheel.direction_world;
            wheel.clipped_inv_contact_dot = 1.0;
            return;
        };

        wheel.in_contact = true;
        wheel.contact_point = hit.point;
        wheel.contact_normal = hit.normal;
        wheel.suspension_length = (hit.distance - spec.radius)
            .clamp(spec.min_suspension_length(), spec.max_suspension_length());

        let denominator = hit.normal.dot(&wheel.direction_world);
        if denominator >= GRAZING_CONTACT_DOT {
            wheel.suspension_relative_velocity = 0.0;
            wheel.clipped_inv_contact_dot = 1.0 / -GRAZING_CONTACT_DOT;
        } else {
            let inv = -1.0 / denominator;
            let projected = hit.normal.dot(&chassis.velocity_at_point(&hit.point));
            wheel.suspension_relative_velocity = projected * inv;
            wheel.clipped_inv_contact_dot = inv;
        }
    }

    fn suspension_force(spec: &WheelSpec, wheel: &WheelState, chassis_mass: Real) -> Real {
        if !wheel.in_contact {
            return 0.0;
        }
        let rest = spec.suspension_rest_length;
        let compression = (1.0 - wheel.suspension_length / rest).clamp(0.0, 1.0);
        let spring =
            spec.suspension_stiffness * compression * rest * wheel.clipped_inv_contact_dot;

        let relative = wheel.suspension_relative_velocity;
        let damping = if relative < 0.0 {
            spec.damping_compression
        } else {
            spec.damping_relaxation
        };
        let force = (spring - damping * relative) * chassis_mass;
        force.clamp(0.0, spec.max_suspension_force)
    }

    fn traction(
        spec: &WheelSpec,
        wheel: &mut WheelState,
        chassis: &ChassisState,
        dt: Real,
        out: &mut Vec<PointImpulse>,
    ) {
        wheel.sliding = false;
        wheel.skid = 1.0;
        wheel.forward_impulse = 0.0;
        wheel.side_impulse = 0.0;
        if !wheel.in_contact {
            return;
        }

        let normal = wheel.contact_normal;
        let axle = chassis.orientation * spec.steering_rotation(wheel.steering) * spec.axle;
        let axle = axle - normal * axle.dot(&normal);
        let Some(axle) = axle.try_normalize(Real::EPSILON) else {
            return;
        };
        let forward = axle.cross(&normal);

        let point = wheel.contact_point;
        let velocity = chassis.velocity_at_point(&point);

        // Lateral: damped bilateral constraint against the static ground.
        let mut side = -SIDE_CONTACT_DAMPING * axle.dot(&velocity) * chassis.mass();

        // Longitudinal: rolling friction capped by the brake, plus the engine.
        let max_rolling = wheel.brake.abs();
        let rolling = {
            let denominator = chassis.impulse_denominator(&point, &forward);
            if denominator > 0.0 {
                (-forward.dot(&velocity) / denominator).clamp(-max_rolling, max_rolling)
            } else {
                0.0
            }
        };
        let mut fwd = rolling + wheel.engine_force * dt;

        let max_impulse = wheel.suspension_force * dt * spec.friction_slip;
        let x = fwd * FORWARD_SLIP_WEIGHT;
        let impulse_sq = x * x + side * side;
        if impulse_sq > max_impulse * max_impulse {
            wheel.sliding = true;
            wheel.skid = max_impulse / impulse_sq.sqrt();
            if side != 0.0 {
                fwd *= wheel.skid;
                side *= wheel.skid;
            }
        }
        wheel.forward_impulse = fwd;
        wheel.side_impulse = side;

        if fwd != 0.0 {
            out.push(PointImpulse {
                impulse: forward * fwd,
                point,
            });
        }
        if side != 0.0 {
            // Lower the lateral lever arm to limit body roll.
            let mut lever = chassis.vector_to_local(&(point - chassis.position));
            lever.z *= spec.roll_influence;
            out.push(PointImpulse {
                impulse: axle * side,
                point: chassis.position + chassis.vector_to_world(&lever),
            });
        }
    }

    fn advance_spin(spec: &WheelSpec, wheel: &mut WheelState, chassis: &ChassisState, dt: Real) {
        if wheel.in_contact {
            let normal = wheel.contact_normal;
            let forward = chassis.vector_to_world(&Vector3::x());
            let forward = forward - normal * forward.dot(&normal);
            let velocity = chassis.velocity_at_point(&wheel.connection_world);
            wheel.delta_rotation = forward.dot(&velocity) * dt / spec.radius;
        }
        if (wheel.sliding || !wheel.in_contact) && wheel.engine_force != 0.0 {
            wheel.delta_rotation =
                wheel.engine_force.signum() * spec.custom_sliding_rotational_speed * dt;
        }
        if wheel.brake.abs() > wheel.engine_force.abs() {
            wheel.delta_rotation = 0.0;
        }
        wheel.rotation += wheel.delta_rotation;
        wheel.delta_rotation *= SPIN_DECAY;
    }
}

impl SuspensionForceProvider for RaycastSuspension {
    fn wheel_count(&self) -> usize {
        WHEEL_COUNT
    }

    fn wheel_impulses(
        &mut self,
        wheel: usize,
        chassis: &ChassisState,
        ground: &dyn RayCaster,
        dt: Real,
        out: &mut Vec<PointImpulse>,
    ) {
        let spec = self.specs.get(wheel);
        let state = self.wheels.get_mut(wheel);
        let (Some(spec), Some(state)) = (spec, state) else {
            return;
        };

        Self::cast(spec, state, chassis, ground);
        state.suspension_force = Self::suspension_force(spec, state, chassis.mass());
        if state.suspension_force > 0.0 {
            out.push(PointImpulse {
                impulse: state.contact_normal * (state.suspension_force * dt),
                point: state.contact_point,
            });
        }
        Self::traction(spec, state, chassis, dt, out);
    }

    fn end_step(&mut self, chassis: &ChassisState, dt: Real) {
        for (spec, wheel) in self.specs.iter().zip(self.wheels.iter_mut()) {
            Self::advance_spin(spec, wheel, chassis, dt);
        }
    }
}
