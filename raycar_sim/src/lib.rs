// raycar_sim/src/lib.rs

use bevy::{
    app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*, scene::ScenePlugin,
    state::app::StatesPlugin,
};
use std::time::Duration;

use crate::simulation::config::ConfigPlugin;
use crate::simulation::core::simulation_setup::SimulationSetupPlugin;
use crate::simulation::plugins::debugging::DebuggingPlugin;
use crate::simulation::plugins::input::InputPlugin;
use crate::simulation::plugins::telemetry::TelemetryPlugin;
use crate::simulation::plugins::vehicles::raycast_car::RaycastCarPlugin;
use crate::simulation::plugins::world::WorldPlugin;

// This prelude is for convenience for other files WITHIN the raycar_sim crate.
pub mod prelude;

pub mod cli;
pub mod simulation;

/// Default log filter: our crates at debug, everything else at info.
pub const DEFAULT_LOG_FILTER: &str =
    "info,wgpu_core=error,wgpu_hal=error,raycar_sim=debug,raycar_core=debug";

/// The main plugin that brings together all the simulation parts.
/// `main.rs` adds the engine plugins, then this one.
pub struct RaycarSimulationPlugin {
    /// Adds the camera and gizmo drawing. Requires the render plugins.
    pub windowed: bool,
}

impl Plugin for RaycarSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            // Lifecycle state and the per-frame set chain.
            SimulationSetupPlugin,
            // Scenario and prefab catalog loading.
            ConfigPlugin,
            // Keyboard and scripted input collection.
            InputPlugin,
            // avian3d, the world settings and the ground.
            WorldPlugin,
            // The car itself.
            RaycastCarPlugin,
            // Pose logs, run statistics, run limit.
            TelemetryPlugin,
        ));
        if self.windowed {
            app.add_plugins(DebuggingPlugin);
        }
    }
}

/// Engine plugins for a run without a window. Physics needs transforms, the
/// scene and mesh asset types even when nothing is rendered.
pub fn add_headless_plugins(app: &mut App) -> &mut App {
    app.add_plugins((
        // No frame pacing: the frame delta is fixed, not measured.
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::ZERO)),
        StatesPlugin,
        TransformPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ))
    .init_asset::<Mesh>()
}

/// Log settings for a run. `--log-level` replaces the default filter with a
/// single level applied to every target.
pub fn log_plugin(log_level: Option<&str>) -> LogPlugin {
    match log_level.and_then(|l| l.parse::<bevy::log::Level>().ok()) {
        Some(level) => LogPlugin {
            level,
            filter: format!("{},wgpu_core=error,wgpu_hal=error", level.as_str().to_lowercase()),
            ..default()
        },
        None => LogPlugin {
            level: bevy::log::Level::INFO,
            filter: DEFAULT_LOG_FILTER.to_string(),
            ..default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_favours_our_crates() {
        let plugin = log_plugin(None);
        assert_eq!(plugin.level, bevy::log::Level::INFO);
        assert!(plugin.filter.contains("raycar_core=debug"));
    }

    #[test]
    fn log_level_flag_overrides_the_filter() {
        let plugin = log_plugin(Some("warn"));
        assert_eq!(plugin.level, bevy::log::Level::WARN);
        assert!(plugin.filter.starts_with("warn,"));

        // Unparseable levels fall back to the default.
        assert_eq!(log_plugin(Some("loud")).filter, DEFAULT_LOG_FILTER);
    }
}
