// raycar_core/tests/vehicle_dynamics.rs

use nalgebra::{UnitQuaternion, Vector3};
use raycar_core::controller::{step_steering, ControlTuning};
use raycar_core::prelude::*;

const DT: Real = 1.0 / 60.0;

/// The `z = 0` plane.
struct FlatGround;

impl RayCaster for FlatGround {
    fn cast_ray(
        &self,
        origin: &Vector3<Real>,
        dir: &Vector3<Real>,
        max_distance: Real,
    ) -> Option<RayHit> {
        if dir.z >= 0.0 {
            return None;
        }
        let distance = origin.z / -dir.z;
        (0.0..=max_distance).contains(&distance).then(|| RayHit {
            point: origin + dir * distance,
            normal: Vector3::z(),
            distance,
        })
    }
}

fn chassis(sim: &Simulation, height: Real, linear: Vector3<Real>) -> ChassisState {
    let mut state = sim.spawn_state().with_velocity(linear, Vector3::zeros());
    state.position.z = height;
    state
}

// --- Controller properties ---

#[test]
fn steering_never_exceeds_its_limit() {
    let tuning = ControlTuning::from(&VehicleTuning::default());
    let deltas = [0.001, 0.016, 0.033, 0.02, 0.0, 0.033];
    let right = ActionState::idle().with(Action::SteerRight);
    let left = ActionState::idle().with(Action::SteerLeft);

    let mut s = 0.0;
    for i in 0..20_000 {
        let actions = if (i / 3000) % 2 == 0 { &right } else { &left };
        s = step_steering(s, actions, deltas[i % deltas.len()], &tuning);
        assert!(s.abs() <= tuning.steering_max, "tick {i}: {s}");
    }
}

#[test]
fn released_steering_decays_to_zero_within_the_bound() {
    let tuning = ControlTuning::from(&VehicleTuning::default());
    for start in [tuning.steering_max, -0.2013, 0.0101, 1.0e-6] {
        let bound = (start.abs() / (tuning.steering_speed * DT)).ceil() as usize;
        let mut s = start;
        let mut ticks = 0;
        while s != 0.0 {
            let next = step_steering(s, &ActionState::idle(), DT, &tuning);
            assert!(next.abs() < s.abs());
            assert!(next == 0.0 || next.signum() == start.signum());
            s = next;
            ticks += 1;
            assert!(ticks <= bound, "start {start} took more than {bound} ticks");
        }
    }
}

#[test]
fn left_and_right_steering_mirror_each_other() {
    let tuning = ControlTuning::from(&VehicleTuning::default());
    let right = ActionState::idle().with(Action::SteerRight);
    let left = ActionState::idle().with(Action::SteerLeft);
    let idle = ActionState::idle();

    let (mut r, mut l) = (0.0, 0.0);
    for i in 0..3000 {
        let (ar, al) = if i < 2000 { (&right, &left) } else { (&idle, &idle) };
        r = step_steering(r, ar, DT, &tuning);
        l = step_steering(l, al, DT, &tuning);
        assert_eq!(r.abs(), l.abs());
        assert_eq!(r, -l);
    }
}

// --- Vehicle properties ---

#[test]
fn suspension_force_stays_in_range_and_vanishes_out_of_reach() {
    let mut sim = Simulation::with_defaults().expect("defaults are valid");
    let max_force = sim.tuning().wheel_max_suspension_force;
    let reach = sim.suspension().spec(WheelPosition::FrontLeft).ray_length();

    let mut impulses = Vec::new();
    for i in 0..200 {
        let height = 0.0525 + i as Real * 0.005;
        let vz = ((i % 9) as Real - 4.0) * 1.5;
        let state = chassis(&sim, height, Vector3::new(0.0, 0.1, vz));
        impulses.clear();
        sim.step_forces(&state, &FlatGround, DT, &mut impulses);

        for wheel in sim.suspension().wheels() {
            assert!((0.0..=max_force).contains(&wheel.suspension_force));
            if height > reach {
                assert!(!wheel.in_contact, "contact at {height}");
                assert_eq!(wheel.suspension_force, 0.0);
            }
        }
        if height > reach {
            assert!(impulses.is_empty());
        }
    }
}

#[test]
fn wheel_commands_only_keep_the_latest_frame() {
    let mut sim = Simulation::with_defaults().expect("defaults are valid");
    let spawn = sim.spawn_state();
    sim.drive(&ActionState::idle().with(Action::Accelerate), &spawn, DT);
    sim.drive(&ActionState::idle().with(Action::Brake), &spawn, DT);

    let rear = sim.suspension().wheel(WheelPosition::RearLeft);
    assert_eq!(rear.engine_force, 0.0);
    assert_eq!(rear.brake, sim.tuning().controls_brake_strength);
}

#[test]
fn reset_state_is_the_spawn_pose_at_rest() {
    let mut sim = Simulation::with_defaults().expect("defaults are valid");
    let tilted = UnitQuaternion::from_euler_angles(0.4, -0.3, 1.2);
    let mut wrecked = chassis(&sim, 0.1, Vector3::new(5.0, 5.0, 0.0));
    wrecked.position = Vector3::new(3.0, -2.0, 0.1);
    wrecked.orientation = tilted;
    wrecked.angular_velocity = Vector3::new(1.0, -2.0, 0.5);
    sim.publish(&wrecked);

    let state = sim.reset();
    let snap = sim.publish(&state).clone();
    assert_eq!(snap.chassis.position, Vector3::new(0.0, 0.0, 2.0));
    assert_eq!(snap.chassis.orientation, sim.tuning().spawn_pose().orientation);
    assert_eq!(snap.speed, 0.0);
    assert_eq!(state.linear_velocity, Vector3::zeros());
    assert_eq!(state.angular_velocity, Vector3::zeros());
}

#[test]
fn shared_reset_fires_once_per_press() {
    let shared = SharedActionState::new();
    let mut sim = Simulation::with_defaults().expect("defaults are valid");
    let spawn = sim.spawn_state();
    let frame = |sim: &mut Simulation| {
        let actions = shared.snapshot();
        sim.drive(&actions, &spawn, DT);
        if actions.reset {
            sim.reset();
        }
    };

    shared.press(Action::Reset);
    frame(&mut sim);
    assert_eq!(sim.resets(), 1);

    // Still held: no further resets.
    for _ in 0..10 {
        frame(&mut sim);
    }
    assert_eq!(sim.resets(), 1);

    shared.release(Action::Reset);
    shared.press(Action::Reset);
    frame(&mut sim);
    assert_eq!(sim.resets(), 2);
}

#[test]
fn independent_simulations_are_deterministic() {
    let mut a = Simulation::with_defaults().expect("defaults are valid");
    let mut b = Simulation::with_defaults().expect("defaults are valid");
    let script = |i: usize| {
        let mut state = ActionState::idle();
        if i > 20 {
            state = state.with(Action::Accelerate);
        }
        if i % 40 > 20 {
            state = state.with(Action::SteerLeft);
        }
        state
    };

    let (mut ia, mut ib) = (Vec::new(), Vec::new());
    for i in 0..120 {
        let actions = script(i);
        let state = chassis(&a, 0.25 + (i % 5) as Real * 0.02, Vector3::new(0.0, -0.05, 0.0));
        let delta = if i % 7 == 0 { 0.03 } else { DT };
        for (sim, out) in [(&mut a, &mut ia), (&mut b, &mut ib)] {
            out.clear();
            sim.drive(&actions, &state, delta);
            sim.step_forces(&state, &FlatGround, DT, out);
            sim.finish_step(&state, DT);
        }
        assert_eq!(ia, ib);
        assert_eq!(a.publish(&state), b.publish(&state));
    }
}
