// tarmac_sim/src/simulation/config/catalog.rs

//! The `VehicleCatalog` resource: every vehicle TOML under `assets/catalog`,
//! keyed by its namespaced path.

use bevy::prelude::*;
use std::{collections::HashMap, path::Path};
use tarmac_core::config::VehicleConfig;
use walkdir::WalkDir;

use super::load_vehicle_file;

pub const CATALOG_ROOT: &str = "assets/catalog";

/// The key is a namespace string (e.g. "vehicles.sedan") derived from the
/// file's path relative to the catalog root.
#[derive(Resource, Default, Debug)]
pub struct VehicleCatalog(HashMap<String, VehicleConfig>);

impl VehicleCatalog {
    /// Walks `root`, parsing every `.toml` file. Files that fail to parse are
    /// logged and skipped.
    pub fn load(root: &Path) -> Self {
        let mut catalog = Self::default();
        for entry in WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| {
                !e.file_type().is_dir() && e.path().extension().is_some_and(|ext| ext == "toml")
            })
        {
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = relative
                .with_extension("")
                .to_string_lossy()
                .replace(std::path::MAIN_SEPARATOR, ".");

            match load_vehicle_file(path) {
                Ok(config) => {
                    info!("Loaded catalog vehicle: '{}'", key);
                    catalog.insert(&key, config);
                }
                Err(e) => {
                    error!("Failed to load catalog vehicle from {:?}: {}", path, e);
                }
            }
        }
        catalog
    }

    pub fn insert(&mut self, key: &str, config: VehicleConfig) {
        self.0.insert(key.to_string(), config);
    }

    pub fn get(&self, key: &str) -> Option<&VehicleConfig> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Populates the `VehicleCatalog` resource from [`CATALOG_ROOT`].
pub fn load_catalog_from_disk(mut catalog: ResMut<VehicleCatalog>) {
    let root = Path::new(CATALOG_ROOT);
    if !root.exists() {
        warn!(
            "Catalog directory not found at {:?}, only file paths can be driven.",
            root
        );
        return;
    }
    info!("Loading vehicle catalog from: {:?}", root);
    *catalog = VehicleCatalog::load(root);
}
