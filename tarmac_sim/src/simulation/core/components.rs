// tarmac_sim/src/simulation/core/components.rs

use bevy::prelude::Component;
use tarmac_core::types::{ChassisState, DriverInput, StepOutput, WheelContact};

// --- Wrapper Components for Core Data ---
// The `Vehicle` aggregate itself is a component (the core's `bevy` feature);
// these carry the per-tick data flowing around it.

/// A "mailbox" for driver input. A keyboard controller or a scripted driver
/// writes to this, and the vehicle step reads from it.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct DriverControls(pub DriverInput);

/// Contact reports built by the wheel raycasts this tick, in wheel order.
#[derive(Component, Debug, Default, Clone)]
pub struct WheelContacts(pub Vec<WheelContact>);

/// What the vehicle asked the host to apply on its last step.
#[derive(Component, Debug, Clone)]
pub struct VehicleStepOutput(pub StepOutput);

/// The chassis rigid-body state in core frames, refreshed after every physics step.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct ChassisKinematics(pub ChassisState);
