// tarmac_core/src/prelude.rs

// --- Host contract (what crosses the physics boundary every tick) ---
pub use crate::types::{
    AppliedForce, Axle, ChassisState, DriverInput, ForceMode, Side, StepOutput, WheelCommand,
    WheelContact, WheelPosition,
};

// --- The aggregate ---
pub use crate::context::VehicleContext;
pub use crate::vehicle::Vehicle;

// --- Configuration ---
pub use crate::config::{
    AntiRollConfig, AssistConfig, BehaviorKind, BehaviorProfile, BrakeConfig, BoostConfig,
    EngineConfig, FuelConfig, GearboxConfig, GroundMaterial, ShiftMode, SteeringConfig,
    VehicleConfig, WheelConfig,
};
pub use crate::drivetrain::DrivetrainMode;
pub use crate::error::{BuildError, ConfigIssue};

// --- Collaborators ---
pub use crate::assists::{AssistKind, AssistState};
pub use crate::drivetrain::GearState;
pub use crate::models::friction::FrictionCurve;
pub use crate::telemetry::{TelemetrySnapshot, VehicleEvent, VehicleObserver, WheelTelemetry};
