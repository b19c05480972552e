// raycar_sim/src/simulation/plugins/debugging/components.rs

use bevy::prelude::*;

/// Marks the camera that trails the chassis.
#[derive(Component, Debug)]
pub struct FollowCamera {
    /// Offset from the chassis in the chassis frame (Z-up), metres.
    pub offset: Vec3,
    /// Exponential smoothing rate, 1/s.
    pub stiffness: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            offset: Vec3::new(-4.0, 0.0, 2.0),
            stiffness: 4.0,
        }
    }
}

/// What the gizmo systems draw. Toggled with F1 (rays and contacts) and F2
/// (ground grid).
#[derive(Resource, Debug, Clone)]
pub struct DebugGizmoSettings {
    pub show_suspension: bool,
    pub show_grid: bool,
}

impl Default for DebugGizmoSettings {
    fn default() -> Self {
        Self {
            show_suspension: true,
            show_grid: true,
        }
    }
}
