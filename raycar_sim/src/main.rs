// raycar_sim/src/main.rs

//! Headless by default: `MinimalPlugins`, a fixed frame delta, scripted inputs
//! and a summary once the run limit is reached.
//!
//! `cargo run -- --windowed` opens a window and drives with the keyboard.
//! `cargo run -- --print-tuning` dumps the resolved vehicle tuning and exits.

use bevy::prelude::*;
use clap::Parser;

use raycar_sim::cli::Cli;
use raycar_sim::simulation::config::load_from_cli;
use raycar_sim::{add_headless_plugins, log_plugin, RaycarSimulationPlugin};

fn main() -> AppExit {
    let cli = Cli::parse();

    if cli.print_tuning {
        return print_tuning(&cli);
    }

    let mut app = App::new();
    let log = log_plugin(cli.log_level.as_deref());

    // --- 1. Engine plugins ---
    if cli.windowed {
        app.add_plugins(DefaultPlugins.set(log));
    } else {
        add_headless_plugins(&mut app).add_plugins(log);
    }

    // --- 2. The simulation ---
    app.insert_resource(cli.clone())
        .add_plugins(RaycarSimulationPlugin {
            windowed: cli.windowed,
        });

    app.run()
}

fn print_tuning(cli: &Cli) -> AppExit {
    let tuning = match load_from_cli(cli) {
        Ok((_, scenario)) => scenario.vehicle,
        Err(e) => {
            eprintln!("Failed to load scenario {:?}: {}", cli.scenario, e);
            return AppExit::error();
        }
    };
    match toml::to_string_pretty(&tuning) {
        Ok(text) => {
            print!("{text}");
            AppExit::Success
        }
        Err(e) => {
            eprintln!("Failed to serialize tuning: {}", e);
            AppExit::error()
        }
    }
}
