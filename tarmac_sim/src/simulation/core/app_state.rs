// tarmac_sim/src/simulation/core/app_state.rs

use bevy::{ecs::schedule::SystemSet, prelude::States};

/// Defines the major phases of the application's lifecycle.
#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum AppState {
    /// The initial state. The catalog and the selected vehicle are loaded here.
    #[default]
    AssetLoading,

    /// Configuration is resolved. The ground and the vehicle are spawned.
    SceneBuilding,

    /// The scene is built. The fixed-step loop is running.
    Running,
}

/// System sets to control the order of execution during the SceneBuilding state.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SceneBuildSet {
    /// Pass 1: Spawn the world and the vehicle shells with their logic components.
    Spawn,

    /// Pass 2: Attach rigid bodies and colliders.
    Physics,

    /// Pass 3: Move to `Running`.
    Finalize,
}

// =========================================================================
// == Main Simulation Sets (The per-tick data flow) ==
// =========================================================================

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Runs first: captures the chassis state the last physics step produced.
    StateSync,
    /// Writes this tick's driver input into each vehicle's controls.
    Input,
    /// Raycasts the wheels and builds contact reports.
    Contacts,
    /// Steps each `tarmac_core` vehicle.
    Vehicle,
    /// Turns the step output into forces on the rigid bodies.
    Actuation,
}
