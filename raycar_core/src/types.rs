// raycar_core/src/types.rs

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};

// --- Core Type Aliases ---
pub type Real = f64;

/// Number of wheels on every vehicle this crate simulates.
pub const WHEEL_COUNT: usize = 4;

/// The fixed wheel ordering shared by wheel specs, wheel states and pose snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WheelPosition {
    FrontLeft = 0,
    FrontRight = 1,
    RearLeft = 2,
    RearRight = 3,
}

impl WheelPosition {
    /// All wheels in slot order `[FL, FR, RL, RR]`.
    pub const ALL: [WheelPosition; WHEEL_COUNT] = [
        WheelPosition::FrontLeft,
        WheelPosition::FrontRight,
        WheelPosition::RearLeft,
        WheelPosition::RearRight,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn is_front(self) -> bool {
        matches!(self, WheelPosition::FrontLeft | WheelPosition::FrontRight)
    }

    /// Wheels on the right side carry the 180 degree tread correction.
    pub const fn is_right_side(self) -> bool {
        matches!(self, WheelPosition::FrontRight | WheelPosition::RearRight)
    }

    pub const fn label(self) -> &'static str {
        match self {
            WheelPosition::FrontLeft => "FL",
            WheelPosition::FrontRight => "FR",
            WheelPosition::RearLeft => "RL",
            WheelPosition::RearRight => "RR",
        }
    }
}

/// A world-space pose: position in metres plus a unit quaternion orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<Real>,
    pub orientation: UnitQuaternion<Real>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn new(position: Vector3<Real>, orientation: UnitQuaternion<Real>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    pub fn to_isometry(&self) -> Isometry3<Real> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    pub fn from_isometry(iso: &Isometry3<Real>) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }

    /// Maps a point given in this pose's local frame into the world frame.
    pub fn transform_point(&self, local: &Vector3<Real>) -> Vector3<Real> {
        (self.to_isometry() * Point3::from(*local)).coords
    }

    /// Position as `[x, y, z]`.
    pub fn position_array(&self) -> [Real; 3] {
        [self.position.x, self.position.y, self.position.z]
    }

    /// Orientation as `[x, y, z, w]`.
    pub fn orientation_array(&self) -> [Real; 4] {
        let q = self.orientation.coords;
        [q.x, q.y, q.z, q.w]
    }
}
