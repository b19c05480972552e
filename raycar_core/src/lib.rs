// raycar_core/src/lib.rs

// Vehicle dynamics for a four-wheeled raycast car on a flat plane.
pub mod actions;
pub mod controller;
pub mod error;
pub mod physics;
pub mod pose;
pub mod prelude;
pub mod simulation;
pub mod suspension;
pub mod tuning;
pub mod types;
