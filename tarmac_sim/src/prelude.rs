// tarmac_sim/src/prelude.rs

// Re-export the entire Bevy prelude for convenience.
pub use bevy::prelude::*;

// Re-export the tarmac_core prelude so plugins can reach the pure vehicle
// types (`Vehicle`, `WheelContact`, `StepOutput`, ...) directly.
pub use tarmac_core::prelude::*;

// Common simulation-specific types.
pub use crate::simulation::config::{ConfigLoadError, RunSettings, SelectedVehicle, VehicleCatalog};
pub use crate::simulation::core::app_state::{AppState, SceneBuildSet, SimulationSet};
pub use crate::simulation::core::components::{DriverControls, VehicleStepOutput, WheelContacts};
pub use crate::simulation::core::prng::SimulationRng;
pub use crate::simulation::plugins::vehicles::car::TarmacCarPlugin;
