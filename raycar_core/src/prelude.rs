// raycar_core/src/prelude.rs

// --- Seams ---
pub use crate::physics::{RayCaster, SuspensionForceProvider};

// --- Inputs and configuration ---
pub use crate::actions::{Action, ActionState, InputEvent, SharedActionState};
pub use crate::error::TuningError;
pub use crate::tuning::{VehicleTuning, WorldSettings};

// --- Simulation ---
pub use crate::controller::{CarRuntime, ControlTuning, DriveCommand, VehicleController};
pub use crate::physics::{ChassisState, PointImpulse, RayHit};
pub use crate::pose::PoseSnapshot;
pub use crate::simulation::Simulation;
pub use crate::suspension::{RaycastSuspension, WheelSpec, WheelState};
pub use crate::types::{Pose, Real, WheelPosition, WHEEL_COUNT};
