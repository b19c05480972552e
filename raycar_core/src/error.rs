// raycar_core/src/error.rs

use thiserror::Error;

/// Rejections raised while validating construction-time configuration.
///
/// Nothing inside a simulation tick returns an error; out-of-range runtime
/// values are clamped instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TuningError {
    #[error("chassis mass must be positive, got {0}")]
    NonPositiveMass(f64),

    #[error("chassis dimensions must be positive, got {0:?}")]
    InvalidChassisDimensions([f64; 3]),

    #[error("wheel radius must be positive, got {0}")]
    InvalidWheelRadius(f64),

    #[error("suspension rest length must be positive, got {0}")]
    NonPositiveRestLength(f64),

    #[error("max suspension travel must not be negative, got {0}")]
    NegativeSuspensionTravel(f64),

    #[error("max suspension force must not be negative, got {0}")]
    NegativeSuspensionForce(f64),

    #[error("fixed time step must be positive, got {0}")]
    NonPositiveTimeStep(f64),

    #[error("the contact solver needs at least one iteration")]
    ZeroSolverIterations,

    #[error("the fixed loop needs at least one step per frame")]
    ZeroSubSteps,

    #[error("tuning value `{0}` is not finite")]
    NonFinite(&'static str),
}
