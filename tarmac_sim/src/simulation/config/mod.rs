// tarmac_sim/src/simulation/config/mod.rs

//! Loading vehicle configuration from disk: the catalog under
//! `assets/catalog`, single vehicle files, and environment overrides.

mod catalog;

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use tarmac_core::config::VehicleConfig;
use thiserror::Error;

use crate::cli::Cli;
use crate::simulation::core::app_state::AppState;
pub use catalog::{load_catalog_from_disk, VehicleCatalog, CATALOG_ROOT};

/// Environment variables with this prefix override fields of every loaded
/// vehicle. Nested fields are separated by `__`, e.g.
/// `TARMAC_VEHICLE_ENGINE__MAX_RPM=7500`.
pub const ENV_PREFIX: &str = "TARMAC_VEHICLE_";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("vehicle file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("'{0}' is neither a catalog entry nor a vehicle file")]
    UnknownVehicle(String),
    #[error("failed to parse vehicle configuration: {0}")]
    Parse(#[from] figment::Error),
}

/// Loads one vehicle TOML file, with `TARMAC_VEHICLE_*` environment overrides
/// merged on top. Missing fields take their defaults.
pub fn load_vehicle_file(path: &Path) -> Result<VehicleConfig, ConfigLoadError> {
    if !path.is_file() {
        return Err(ConfigLoadError::NotFound(path.to_path_buf()));
    }
    let config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Resolves a CLI vehicle argument: a catalog key first, then a file path.
pub fn resolve_vehicle(name: &str, catalog: &VehicleCatalog) -> Result<VehicleConfig, ConfigLoadError> {
    if let Some(config) = catalog.get(name) {
        return Ok(config.clone());
    }
    let path = Path::new(name);
    if path.extension().is_some_and(|ext| ext == "toml") {
        return load_vehicle_file(path);
    }
    Err(ConfigLoadError::UnknownVehicle(name.to_string()))
}

// =========================================================================
// == Resources ==
// =========================================================================

/// Run parameters, built from the command line.
#[derive(Resource, Debug, Clone)]
pub struct RunSettings {
    pub vehicle: String,
    /// Simulated seconds before the app exits.
    pub duration: f64,
    pub headless: bool,
    pub seed: Option<u64>,
    /// Fixed physics rate [Hz]. Assist gains are tuned per tick at 50 Hz.
    pub fixed_hz: f64,
    /// Standard deviation of the road-roughness noise added to each wheel's
    /// suspension force [N].
    pub roughness_stddev: f64,
    pub throttle: f64,
    pub steer: f64,
    pub print_config: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            vehicle: "vehicles.sedan".to_string(),
            duration: 20.0,
            headless: true,
            seed: None,
            fixed_hz: 50.0,
            roughness_stddev: 40.0,
            throttle: 0.6,
            steer: 0.0,
            print_config: false,
        }
    }
}

impl From<&Cli> for RunSettings {
    fn from(cli: &Cli) -> Self {
        Self {
            vehicle: cli.vehicle.clone(),
            duration: cli.duration,
            headless: cli.headless,
            seed: cli.seed,
            throttle: cli.throttle,
            steer: cli.steer,
            print_config: cli.print_config,
            ..Self::default()
        }
    }
}

/// The resolved configuration of the vehicle to spawn.
#[derive(Resource, Debug, Clone, Default)]
pub struct SelectedVehicle(pub Option<VehicleConfig>);

// =========================================================================
// == Plugin ==
// =========================================================================

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VehicleCatalog>()
            .init_resource::<SelectedVehicle>()
            .add_systems(
                OnEnter(AppState::AssetLoading),
                (
                    load_catalog_from_disk,
                    resolve_selected_vehicle,
                    transition_to_scene_building,
                )
                    .chain(),
            );
    }
}

fn resolve_selected_vehicle(
    settings: Res<RunSettings>,
    catalog: Res<VehicleCatalog>,
    mut selected: ResMut<SelectedVehicle>,
    mut exit: EventWriter<AppExit>,
) {
    match resolve_vehicle(&settings.vehicle, &catalog) {
        Ok(config) => {
            info!("Resolved vehicle '{}' as '{}'", settings.vehicle, config.name);
            if settings.print_config {
                match toml::to_string_pretty(&config) {
                    Ok(text) => info!("Resolved configuration:\n{}", text),
                    Err(e) => warn!("Cannot render configuration as TOML: {}", e),
                }
            }
            selected.0 = Some(config);
        }
        Err(e) => {
            let mut known: Vec<&str> = catalog.keys().collect();
            known.sort_unstable();
            error!("Cannot load vehicle: {}. Catalog entries: {:?}", e, known);
            exit.write(AppExit::error());
        }
    }
}

fn transition_to_scene_building(mut next_state: ResMut<NextState<AppState>>) {
    info!("Configuration loading complete. Transitioning to SceneBuilding state.");
    next_state.set(AppState::SceneBuilding);
}
