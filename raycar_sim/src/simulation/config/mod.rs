// raycar_sim/src/simulation/config/mod.rs

//! Loading, resolving and validating the scenario, including the prefab
//! catalog that `[vehicle]` tables may inherit from.

mod catalog;
mod error;
mod resolver;

pub mod structs;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use std::path::Path;
use std::time::Duration;

use crate::cli::Cli;
use crate::prelude::AppState;
use structs::RawScenario;

pub use catalog::{load_catalog, PrefabCatalog};
pub use error::ConfigError;
pub use resolver::resolve_value;
pub use structs::{ScenarioConfig, ScriptedInput, SimulationSection};

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PrefabCatalog>()
            .init_resource::<ScenarioConfig>()
            .add_systems(OnEnter(AppState::Loading), load_configuration);
    }
}

/// Reads the scenario at `path` and resolves its `[vehicle]` table against
/// `catalog`. The returned tuning and world settings are validated.
pub fn load_scenario(path: &Path, catalog: &PrefabCatalog) -> Result<ScenarioConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::ScenarioNotFound(path.to_path_buf()));
    }
    let raw: RawScenario = Figment::new().merge(Toml::file(path)).extract()?;
    from_raw(raw, catalog)
}

/// Same as [`load_scenario`] for an in-memory TOML document.
pub fn parse_scenario(
    source: &str,
    catalog: &PrefabCatalog,
) -> Result<ScenarioConfig, ConfigError> {
    let raw: RawScenario = Figment::new().merge(Toml::string(source)).extract()?;
    from_raw(raw, catalog)
}

fn from_raw(raw: RawScenario, catalog: &PrefabCatalog) -> Result<ScenarioConfig, ConfigError> {
    let resolved = resolve_value(&raw.vehicle, catalog)?;
    let vehicle = resolved.deserialize()?;
    raw.world.validate()?;
    raw.simulation.validate()?;

    let mut inputs = raw.inputs;
    if let Some(bad) = inputs.iter().find(|i| !i.at.is_finite() || i.at < 0.0) {
        return Err(ConfigError::InvalidInputTime(bad.at));
    }
    // Stable, so events sharing a timestamp keep file order.
    inputs.sort_by(|a, b| a.at.total_cmp(&b.at));

    let config = ScenarioConfig {
        simulation: raw.simulation,
        world: raw.world,
        vehicle,
        inputs,
    };
    config.vehicle.validate()?;
    Ok(config)
}

/// Catalog plus scenario, as selected on the command line.
pub fn load_from_cli(cli: &Cli) -> Result<(PrefabCatalog, ScenarioConfig), ConfigError> {
    let catalog = load_catalog(&cli.catalog)?;
    let scenario = load_scenario(&cli.scenario, &catalog)?;
    Ok((catalog, scenario))
}

fn load_configuration(
    mut commands: Commands,
    cli: Res<Cli>,
    mut next_state: ResMut<NextState<AppState>>,
    mut exit: EventWriter<AppExit>,
) {
    info!("Loading scenario from: {:?}", cli.scenario);
    match load_from_cli(&cli) {
        Ok((catalog, scenario)) => {
            info!(
                "Scenario '{}' resolved: {} prefab(s) in catalog, {} scripted input(s).",
                scenario.simulation.name,
                catalog.len(),
                scenario.inputs.len()
            );
            debug!("Resolved vehicle tuning: {:?}", scenario.vehicle);
            if !cli.windowed {
                // Headless frames advance by a fixed delta, independent of wall time.
                commands.insert_resource(TimeUpdateStrategy::ManualDuration(
                    Duration::from_secs_f64(scenario.simulation.frame_delta),
                ));
            }
            commands.insert_resource(catalog);
            commands.insert_resource(scenario);
            next_state.set(AppState::Running);
        }
        Err(e) => {
            error!("Failed to load scenario {:?}: {}", cli.scenario, e);
            exit.write(AppExit::error());
        }
    }
}
