// raycar_sim/src/cli.rs

use bevy::prelude::Resource;
use clap::Parser;
use std::path::PathBuf;

/// Raycar: an arcade raycast-wheel vehicle on a flat plane.
///
/// Runs headless by default, replaying the scenario's scripted inputs for its
/// configured duration. `--windowed` opens a window with keyboard driving.
#[derive(Parser, Debug, Resource, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/default.toml")]
    pub scenario: PathBuf,

    /// Root of the prefab catalog that `from = "..."` keys refer to.
    #[arg(long, default_value = "assets/catalog")]
    pub catalog: PathBuf,

    /// Open a window and drive with the keyboard.
    #[arg(short, long, default_value_t = false)]
    pub windowed: bool,

    /// Simulated seconds to run before exiting. Overrides the scenario.
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Log level for every target (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print the resolved vehicle tuning as TOML and exit.
    #[arg(long, default_value_t = false)]
    pub print_tuning: bool,
}

impl Cli {
    /// Run length in simulated seconds, if the run has one. Windowed runs are
    /// unbounded unless `--duration` is given.
    pub fn run_limit(&self, scenario_duration: f64) -> Option<f64> {
        match (self.duration, self.windowed) {
            (Some(d), _) => Some(d),
            (None, false) => Some(scenario_duration),
            (None, true) => None,
        }
    }
}
