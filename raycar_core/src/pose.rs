// raycar_core/src/pose.rs

use nalgebra::Vector3;

use crate::physics::ChassisState;
use crate::suspension::RaycastSuspension;
use crate::types::{Pose, Real, WheelPosition, WHEEL_COUNT};

/// The read-only view handed to presentation after each tick.
#[cfg_attr(feature = "bevy", derive(bevy_ecs::prelude::Resource))]
#[derive(Debug, Clone, PartialEq)]
pub struct PoseSnapshot {
    pub tick: u64,
    /// Simulated world time in seconds.
    pub time: Real,
    /// Chassis centre of mass pose.
    pub chassis: Pose,
    /// Wheel poses in `[FL, FR, RL, RR]` order, tread correction included.
    pub wheels: [Pose; WHEEL_COUNT],
    /// Planar chassis speed in m/s.
    pub speed: Real,
    pub wheels_in_contact: usize,
}

/// Seven floats per transform: position `[x, y, z]` then orientation `[x, y, z, w]`.
pub type FlatPose = [f32; 7];

impl PoseSnapshot {
    pub fn capture(
        tick: u64,
        time: Real,
        chassis: &ChassisState,
        suspension: &RaycastSuspension,
    ) -> Self {
        Self {
            tick,
            time,
            chassis: chassis.pose(),
            wheels: suspension.wheels().each_ref().map(|w| w.world_pose),
            speed: chassis.planar_speed(),
            wheels_in_contact: suspension.wheels_in_contact(),
        }
    }

    pub fn wheel(&self, wheel: WheelPosition) -> &Pose {
        &self.wheels[wheel.index()]
    }

    /// Chassis pose shifted by a chassis-frame mounting offset, as drawn.
    pub fn chassis_visual_pose(&self, offset: &Vector3<Real>) -> Pose {
        Pose::new(
            self.chassis.transform_point(offset),
            self.chassis.orientation,
        )
    }

    /// Chassis followed by the four wheels, single precision.
    pub fn to_flat(&self) -> [FlatPose; 1 + WHEEL_COUNT] {
        let flatten = |pose: &Pose| {
            let mut flat: FlatPose = [0.0; 7];
            let values = pose.position_array().into_iter().chain(pose.orientation_array());
            for (slot, value) in flat.iter_mut().zip(values) {
                *slot = value as f32;
            }
            flat
        };
        let mut out = [[0.0; 7]; 1 + WHEEL_COUNT];
        out[0] = flatten(&self.chassis);
        for (slot, wheel) in out[1..].iter_mut().zip(&self.wheels) {
            *slot = flatten(wheel);
        }
        out
    }
}
