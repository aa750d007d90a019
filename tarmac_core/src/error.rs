// tarmac_core/src/error.rs

use crate::types::WheelPosition;
use thiserror::Error;

/// Structural problems that make a vehicle impossible to build.
///
/// Tuning mistakes are not errors; see [`ConfigIssue`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("a vehicle needs at least 4 wheels, got {0}")]
    TooFewWheels(usize),

    #[error("wheel position {0} is used more than once")]
    DuplicateWheel(WheelPosition),

    #[error("behavior profile {0:?} is not defined in the vehicle context")]
    UnknownBehavior(crate::config::BehaviorKind),

    #[error("the ground material table is empty")]
    NoGroundMaterials,
}

/// A tuning problem found by [`crate::config::VehicleConfig::validate`].
///
/// The simulation still runs with the offending values; these are meant to be
/// surfaced to content authors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigIssue {
    #[error("minimum engine RPM ({min}) must be lower than maximum engine RPM ({max})")]
    MinRpmAboveMax { min: f64, max: f64 },

    #[error("shift-up RPM ({up}) must be higher than shift-down RPM ({down})")]
    ShiftUpBelowShiftDown { up: f64, down: f64 },

    #[error("shift-up and shift-down RPM are only {gap} apart, keep at least {required}")]
    ShiftBandTooNarrow { gap: f64, required: f64 },

    #[error("engine RPM band ({min}..{max}) is narrower than {required}")]
    RpmBandTooNarrow { min: f64, max: f64, required: f64 },

    #[error("shift-up RPM ({up}) is above maximum engine RPM ({max}), the gearbox will never up-shift")]
    ShiftUpAboveMaxRpm { up: f64, max: f64 },

    #[error("peak torque RPM ({rpm}) is outside the engine RPM band ({min}..{max})")]
    PeakTorqueOutsideBand { rpm: f64, min: f64, max: f64 },

    #[error("gear count {0} is outside 1..=8")]
    GearCountOutOfRange(usize),

    #[error("top speed must be positive, got {0}")]
    NonPositiveTopSpeed(f64),

    #[error("no wheel is powered by the {0:?} drivetrain")]
    NoPoweredWheels(crate::drivetrain::DrivetrainMode),

    #[error("{name} = {value} is outside the supported range {min}..={max} and will be clamped")]
    GainOutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
