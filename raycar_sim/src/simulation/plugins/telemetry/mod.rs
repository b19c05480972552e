// raycar_sim/src/simulation/plugins/telemetry/mod.rs

//! Periodic pose logging, run statistics and the run limit.

use crate::prelude::*;
use nalgebra::Vector3;

/// Simulated seconds after which the run ends. `None` runs until the window
/// is closed.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Default)]
pub struct RunLimit(pub Option<f64>);

/// Statistics accumulated over the run, printed when it finishes.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub sim_time: f64,
    /// Horizontal path length. Reset teleports are not counted.
    pub distance: f64,
    pub max_speed: f64,
    pub resets: u64,
    /// Ticks that ended with no wheel touching the ground.
    pub airborne_ticks: u64,
    last_position: Option<Vector3<Real>>,
    next_log_time: f64,
}

impl RunSummary {
    pub fn record(&mut self, snapshot: &PoseSnapshot, resets: u64) {
        let position = snapshot.chassis.position;
        if let Some(last) = self.last_position {
            if resets == self.resets {
                self.distance += (position.xy() - last.xy()).norm();
            }
        }
        self.last_position = Some(position);
        self.ticks = snapshot.tick;
        self.sim_time = snapshot.time;
        self.max_speed = self.max_speed.max(snapshot.speed);
        self.resets = resets;
        if snapshot.wheels_in_contact == 0 {
            self.airborne_ticks += 1;
        }
    }

    /// True once per `interval` of simulated time.
    fn pose_log_due(&mut self, time: f64, interval: f64) -> bool {
        if interval <= 0.0 || time < self.next_log_time {
            return false;
        }
        self.next_log_time = time + interval;
        true
    }
}

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RunSummary>()
            .init_resource::<RunLimit>()
            .add_systems(OnEnter(AppState::Running), configure_run_limit)
            .add_systems(
                Update,
                (record_run, log_pose, check_run_limit)
                    .chain()
                    .in_set(TickSet::Report)
                    .run_if(resource_exists::<Simulation>),
            )
            .add_systems(OnEnter(AppState::Finished), print_summary_and_exit);
    }
}

// --- SYSTEMS ---

fn configure_run_limit(
    cli: Option<Res<Cli>>,
    scenario: Res<ScenarioConfig>,
    mut limit: ResMut<RunLimit>,
) {
    let duration = scenario.simulation.duration;
    limit.0 = match cli {
        Some(cli) => cli.run_limit(duration),
        None => Some(duration),
    };
    match limit.0 {
        Some(seconds) => info!("Run limit: {:.2}s of simulated time.", seconds),
        None => info!("No run limit; close the window to exit."),
    }
}

fn record_run(latest: Res<LatestPose>, sim: Res<Simulation>, mut summary: ResMut<RunSummary>) {
    summary.record(&latest.0, sim.resets());
}

fn log_pose(
    latest: Res<LatestPose>,
    scenario: Res<ScenarioConfig>,
    mut summary: ResMut<RunSummary>,
) {
    let snap = &latest.0;
    if !summary.pose_log_due(snap.time, scenario.simulation.pose_log_interval) {
        return;
    }
    let p = snap.chassis.position;
    let forward = snap.chassis.orientation * Vector3::x();
    info!(
        "[POSE] t={:>6.2}s pos=({:>7.3}, {:>7.3}, {:>6.3}) heading={:>6.1}deg \
         speed={:.3} contacts={}",
        snap.time,
        p.x,
        p.y,
        p.z,
        forward.y.atan2(forward.x).to_degrees(),
        snap.speed,
        snap.wheels_in_contact
    );
    for wheel in WheelPosition::ALL {
        let w = snap.wheel(wheel).position;
        debug!("[POSE]   {} wheel at ({:.3}, {:.3}, {:.3})", wheel.label(), w.x, w.y, w.z);
    }
}

fn check_run_limit(
    sim: Res<Simulation>,
    limit: Res<RunLimit>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if let Some(seconds) = limit.0 {
        if sim.time() >= seconds {
            next_state.set(AppState::Finished);
        }
    }
}

fn print_summary_and_exit(summary: Res<RunSummary>, mut exit: EventWriter<AppExit>) {
    info!("==================== RUN SUMMARY ====================");
    info!("  ticks:          {}", summary.ticks);
    info!("  simulated time: {:.2}s", summary.sim_time);
    info!("  distance:       {:.3}", summary.distance);
    info!("  max speed:      {:.3}", summary.max_speed);
    info!("  resets:         {}", summary.resets);
    info!("  airborne ticks: {}", summary.airborne_ticks);
    info!("=====================================================");
    exit.write(AppExit::Success);
}
