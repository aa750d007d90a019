// tarmac_sim/src/lib.rs

use bevy::prelude::*;

// Import the plugins defined within the simulation crate.
use crate::simulation::config::ConfigPlugin;
use crate::simulation::core::simulation_setup::SimulationSetupPlugin;
use crate::simulation::plugins::vehicles::car::TarmacCarPlugin;
use crate::simulation::plugins::world::spawner::WorldSpawnerPlugin;

// This prelude is for convenience for other files WITHIN the tarmac_sim crate.
pub mod prelude;

pub mod cli;
pub mod simulation;

/// The main plugin that brings together all the simulation parts.
///
/// Expects a [`RunSettings`](crate::simulation::config::RunSettings) resource
/// to be inserted before it is added.
pub struct TarmacSimulationPlugin;

impl Plugin for TarmacSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            // Loads the vehicle catalog and resolves the vehicle to drive.
            ConfigPlugin,
            // Fixed-step schedule, PRNG and state transitions.
            SimulationSetupPlugin,
            // Ground plane, lighting and camera.
            WorldSpawnerPlugin,
            // Raycast wheels around the tarmac_core vehicle.
            TarmacCarPlugin,
        ));
    }
}
