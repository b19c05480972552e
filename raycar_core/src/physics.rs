// raycar_core/src/physics.rs

//! The seam between the vehicle model and whatever rigid body engine carries
//! the chassis.
//!
//! The engine hands the model a [`ChassisState`] copy once per fixed step and
//! a [`RayCaster`] over its static geometry. The model answers with point
//! impulses. It never integrates anything itself.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::types::{Pose, Real};

// =========================================================================
// == Chassis State ==
// =========================================================================

/// Kinematic state and mass properties of the chassis at the start of a step.
///
/// Position and orientation describe the centre of mass. `inertia` holds the
/// principal moments in the chassis frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisState {
    pub position: Vector3<Real>,
    pub orientation: UnitQuaternion<Real>,
    pub linear_velocity: Vector3<Real>,
    pub angular_velocity: Vector3<Real>,
    pub mass: Real,
    pub inertia: Vector3<Real>,
}

impl ChassisState {
    /// A chassis resting at `pose`.
    pub fn at_rest(pose: Pose, mass: Real, inertia: Vector3<Real>) -> Self {
        Self {
            position: pose.position,
            orientation: pose.orientation,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            mass,
            inertia,
        }
    }

    pub fn with_velocity(mut self, linear: Vector3<Real>, angular: Vector3<Real>) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }

    pub fn mass(&self) -> Real {
        self.mass
    }

    pub fn inv_mass(&self) -> Real {
        if self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }

    /// Speed across the ground plane. Vertical motion is not counted.
    pub fn planar_speed(&self) -> Real {
        self.linear_velocity.xy().norm()
    }

    // --- Frame helpers ---

    pub fn point_to_world(&self, local: &Vector3<Real>) -> Vector3<Real> {
        self.position + self.orientation * local
    }

    pub fn vector_to_world(&self, local: &Vector3<Real>) -> Vector3<Real> {
        self.orientation * local
    }

    pub fn vector_to_local(&self, world: &Vector3<Real>) -> Vector3<Real> {
        self.orientation.inverse_transform_vector(world)
    }

    /// World-space inverse inertia: `R * I^-1 * R^T`.
    pub fn inv_inertia_world(&self) -> Matrix3<Real> {
        let inv = self.inertia.map(|i| if i > 0.0 { 1.0 / i } else { 0.0 });
        let r = self.orientation.to_rotation_matrix();
        r.matrix() * Matrix3::from_diagonal(&inv) * r.matrix().transpose()
    }

    /// Velocity of the material point currently at `world_point`.
    pub fn velocity_at_point(&self, world_point: &Vector3<Real>) -> Vector3<Real> {
        self.linear_velocity + self.angular_velocity.cross(&(world_point - self.position))
    }

    /// Effective inverse mass seen by an impulse along `direction` at `world_point`.
    pub fn impulse_denominator(
        &self,
        world_point: &Vector3<Real>,
        direction: &Vector3<Real>,
    ) -> Real {
        let r = world_point - self.position;
        let c = r.cross(direction);
        let v = (self.inv_inertia_world() * c).cross(&r);
        self.inv_mass() + direction.dot(&v)
    }
}

/// Principal moments of a solid box of full extents `size` about its centre.
pub fn box_inertia(mass: Real, size: &Vector3<Real>) -> Vector3<Real> {
    let k = mass / 12.0;
    Vector3::new(
        k * (size.y * size.y + size.z * size.z),
        k * (size.x * size.x + size.z * size.z),
        k * (size.x * size.x + size.y * size.y),
    )
}

// =========================================================================
// == Seams ==
// =========================================================================

/// An impulse to be applied at a world-space point on the chassis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointImpulse {
    pub impulse: Vector3<Real>,
    pub point: Vector3<Real>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vector3<Real>,
    pub normal: Vector3<Real>,
    pub distance: Real,
}

/// Ray queries against static geometry.
pub trait RayCaster {
    /// Nearest hit along the unit direction `dir` within `max_distance`.
    fn cast_ray(
        &self,
        origin: &Vector3<Real>,
        dir: &Vector3<Real>,
        max_distance: Real,
    ) -> Option<RayHit>;
}

/// Per-wheel force hook, evaluated once per fixed step per wheel while the
/// engine prepares the step.
///
/// Implementors only see an immutable copy of the chassis and return point
/// impulses; the engine applies them. Nothing here depends on how the engine
/// integrates.
pub trait SuspensionForceProvider {
    fn wheel_count(&self) -> usize;

    /// Called once per step before any wheel is queried.
    fn begin_step(&mut self, _chassis: &ChassisState) {}

    fn wheel_impulses(
        &mut self,
        wheel: usize,
        chassis: &ChassisState,
        ground: &dyn RayCaster,
        dt: Real,
        out: &mut Vec<PointImpulse>,
    );

    /// Called once per step after the engine integrated the impulses.
    fn end_step(&mut self, _chassis: &ChassisState, _dt: Real) {}
}
