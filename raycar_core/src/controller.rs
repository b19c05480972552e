// raycar_core/src/controller.rs

use crate::actions::ActionState;
use crate::tuning::VehicleTuning;
use crate::types::{Real, WheelPosition, WHEEL_COUNT};

/// Steering and acceleration carried between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CarRuntime {
    /// Radians, positive toward the right.
    pub steering: Real,
    /// Engine command, positive forward.
    pub accelerating: Real,
}

/// Per-wheel commands for one tick, in `[FL, FR, RL, RR]` order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveCommand {
    pub steering: [Real; WHEEL_COUNT],
    pub engine_force: [Real; WHEEL_COUNT],
    pub brake: [Real; WHEEL_COUNT],
}

/// The subset of [`VehicleTuning`] the controller reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlTuning {
    pub steering_speed: Real,
    pub steering_max: Real,
    pub max_speed: Real,
    pub max_speed_boost: Real,
    pub accelerating_force: Real,
    pub accelerating_force_boost: Real,
    pub brake_strength: Real,
}

impl From<&VehicleTuning> for ControlTuning {
    fn from(t: &VehicleTuning) -> Self {
        Self {
            steering_speed: t.controls_steering_speed,
            steering_max: t.controls_steering_max,
            max_speed: t.controls_accelerating_max_speed,
            max_speed_boost: t.controls_accelerating_max_speed_boost,
            accelerating_force: t.controls_accelerating_speed,
            accelerating_force_boost: t.controls_accelerating_speed_boost,
            brake_strength: t.controls_brake_strength,
        }
    }
}

/// Advances steering by one tick: a constant-rate ramp toward the held side,
/// or a decay toward zero that snaps once less than one step remains.
pub fn step_steering(
    steering: Real,
    actions: &ActionState,
    delta: Real,
    tuning: &ControlTuning,
) -> Real {
    let step = delta * tuning.steering_speed;
    let next = if actions.steer_right {
        steering + step
    } else if actions.steer_left {
        steering - step
    } else if steering.abs() > step {
        steering - step * steering.signum()
    } else {
        0.0
    };
    let max = tuning.steering_max.abs();
    next.clamp(-max, max)
}

/// The speed limit in force while accelerate or reverse is held.
pub fn active_speed_cap(actions: &ActionState, tuning: &ControlTuning) -> Option<Real> {
    if !(actions.accelerate || actions.reverse) {
        return None;
    }
    Some(if actions.boost {
        tuning.max_speed_boost
    } else {
        tuning.max_speed
    })
}

/// Engine command for one tick. Zero at or above the active speed cap.
pub fn step_acceleration(actions: &ActionState, speed: Real, tuning: &ControlTuning) -> Real {
    let (force, max_speed) = if actions.boost {
        (tuning.accelerating_force_boost, tuning.max_speed_boost)
    } else {
        (tuning.accelerating_force, tuning.max_speed)
    };
    if actions.accelerate && speed < max_speed {
        force
    } else if actions.reverse && speed < max_speed {
        -force
    } else {
        0.0
    }
}

/// The pure per-tick control map:
/// `(actions, previous runtime, speed, delta) -> (runtime, wheel commands)`.
///
/// Front wheels share one steering axis and receive the runtime angle
/// negated (wheel angles are counter-clockwise). The rear wheels drive.
/// Every wheel brakes at the same strength while brake is held.
pub fn step_controls(
    actions: &ActionState,
    runtime: CarRuntime,
    speed: Real,
    delta: Real,
    tuning: &ControlTuning,
) -> (CarRuntime, DriveCommand) {
    let next = CarRuntime {
        steering: step_steering(runtime.steering, actions, delta, tuning),
        accelerating: step_acceleration(actions, speed, tuning),
    };

    let mut command = DriveCommand::default();
    for wheel in WheelPosition::ALL {
        let i = wheel.index();
        if wheel.is_front() {
            command.steering[i] = -next.steering;
        } else {
            command.engine_force[i] = next.accelerating;
        }
        command.brake[i] = if actions.brake {
            tuning.brake_strength
        } else {
            0.0
        };
    }
    (next, command)
}

/// Owns the [`CarRuntime`] between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleController {
    tuning: ControlTuning,
    runtime: CarRuntime,
}

impl VehicleController {
    pub fn new(tuning: ControlTuning) -> Self {
        Self {
            tuning,
            runtime: CarRuntime::default(),
        }
    }

    pub fn runtime(&self) -> CarRuntime {
        self.runtime
    }

    pub fn tuning(&self) -> &ControlTuning {
        &self.tuning
    }

    pub fn update(&mut self, actions: &ActionState, speed: Real, delta: Real) -> DriveCommand {
        let (runtime, command) = step_controls(actions, self.runtime, speed, delta, &self.tuning);
        self.runtime = runtime;
        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::Action;
    use approx::assert_abs_diff_eq;

    fn tuning() -> ControlTuning {
        ControlTuning::from(&VehicleTuning::default())
    }

    #[test]
    fn steering_ramps_and_clamps() {
        let t = tuning();
        let right = ActionState::idle().with(Action::SteerRight);
        let mut s = 0.0;
        for _ in 0..10_000 {
            s = step_steering(s, &right, 0.033, &t);
            assert!(s.abs() <= t.steering_max);
        }
        assert_abs_diff_eq!(s, t.steering_max);
    }

    #[test]
    fn released_steering_snaps_to_zero_without_overshoot() {
        let t = tuning();
        let dt = 1.0 / 60.0;
        let step = dt * t.steering_speed;
        let start = 2.5 * step;
        let mut s = start;
        let mut ticks = 0;
        while s != 0.0 {
            let next = step_steering(s, &ActionState::idle(), dt, &t);
            assert!(next >= 0.0 && next < s);
            s = next;
            ticks += 1;
        }
        assert_eq!(ticks, 3);
        assert!(ticks as Real <= (start / step).ceil());
    }

    #[test]
    fn right_wins_when_both_sides_are_held() {
        let t = tuning();
        let both = ActionState::idle()
            .with(Action::SteerLeft)
            .with(Action::SteerRight);
        assert!(step_steering(0.0, &both, 0.1, &t) > 0.0);
    }

    #[test]
    fn acceleration_respects_the_active_cap() {
        let t = tuning();
        let forward = ActionState::idle().with(Action::Accelerate);
        assert_eq!(step_acceleration(&forward, 0.0, &t), 22.0);
        assert_eq!(step_acceleration(&forward, 0.12, &t), 0.0);

        let boosted = forward.with(Action::Boost);
        assert_eq!(step_acceleration(&boosted, 0.12, &t), 32.0);
        assert_eq!(step_acceleration(&boosted, 0.3, &t), 0.0);

        let back = ActionState::idle().with(Action::Reverse);
        assert_eq!(step_acceleration(&back, 0.05, &t), -22.0);
        assert_eq!(step_acceleration(&ActionState::idle(), 0.0, &t), 0.0);
    }

    #[test]
    fn speed_cap_applies_only_while_driving() {
        let t = tuning();
        assert_eq!(active_speed_cap(&ActionState::idle(), &t), None);
        assert_eq!(
            active_speed_cap(&ActionState::idle().with(Action::Brake), &t),
            None
        );
        let forward = ActionState::idle().with(Action::Accelerate);
        assert_eq!(active_speed_cap(&forward, &t), Some(0.12));
        assert_eq!(active_speed_cap(&forward.with(Action::Boost), &t), Some(0.24));
        let back = ActionState::idle().with(Action::Reverse);
        assert_eq!(active_speed_cap(&back, &t), Some(0.12));
    }

    #[test]
    fn commands_route_to_the_right_wheels() {
        let t = tuning();
        let actions = ActionState::idle()
            .with(Action::Accelerate)
            .with(Action::SteerRight)
            .with(Action::Brake);
        let (runtime, command) = step_controls(&actions, CarRuntime::default(), 0.0, 0.5, &t);

        assert!(runtime.steering > 0.0);
        assert_eq!(command.steering[0], -runtime.steering);
        assert_eq!(command.steering[1], -runtime.steering);
        assert_eq!(command.steering[2], 0.0);
        assert_eq!(command.engine_force, [0.0, 0.0, 22.0, 22.0]);
        assert_eq!(command.brake, [0.6; 4]);
    }

    #[test]
    fn controller_keeps_runtime_between_updates() {
        let mut controller = VehicleController::new(tuning());
        let left = ActionState::idle().with(Action::SteerLeft);
        controller.update(&left, 0.0, 1.0);
        controller.update(&left, 0.0, 1.0);
        assert_abs_diff_eq!(controller.runtime().steering, -0.03, epsilon = 1e-12);
    }
}
