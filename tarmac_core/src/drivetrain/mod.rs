// tarmac_core/src/drivetrain/mod.rs

//! Engine, gearbox and clutch, plus the rule that splits engine torque across
//! the powered wheels.

pub mod clutch;
pub mod engine;
pub mod gearbox;

use serde::{Deserialize, Serialize};

use crate::types::Axle;

pub use clutch::{AutoClutch, ClutchInputs};
pub use engine::{BoostTank, Engine, EngineInputs, FuelTank, RPM_HEADROOM};
pub use gearbox::{Gear, GearChange, GearState, GearTable, GearTarget, Gearbox, GearboxInputs};

/// Which axles receive engine torque.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum DrivetrainMode {
    Fwd,
    #[default]
    Rwd,
    Awd,
    /// All wheels driven, with `rear_share` in [0, 1] of the torque going to the rear.
    Biased { rear_share: f64 },
}

impl DrivetrainMode {
    pub fn drives(&self, axle: Axle) -> bool {
        self.axle_share(axle) > 0.0
    }

    /// Multiplier applied to the torque of every powered wheel on `axle`.
    ///
    /// Plain modes use 1 for a driven axle. A biased split uses `2 * share`, so
    /// an even split is the same as `Awd`.
    pub fn axle_share(&self, axle: Axle) -> f64 {
        match (self, axle) {
            (DrivetrainMode::Fwd, Axle::Front) => 1.0,
            (DrivetrainMode::Fwd, Axle::Rear) => 0.0,
            (DrivetrainMode::Rwd, Axle::Front) => 0.0,
            (DrivetrainMode::Rwd, Axle::Rear) => 1.0,
            (DrivetrainMode::Awd, _) => 1.0,
            (DrivetrainMode::Biased { rear_share }, Axle::Front) => {
                2.0 * (1.0 - rear_share.clamp(0.0, 1.0))
            }
            (DrivetrainMode::Biased { rear_share }, Axle::Rear) => 2.0 * rear_share.clamp(0.0, 1.0),
        }
    }
}

/// Per-tick inputs to [`wheel_torque`].
#[derive(Debug, Clone, Copy)]
pub struct TorqueRequest {
    /// Engine torque from the curve at the current RPM [Nm].
    pub engine_torque: f64,
    /// +1 forward, -1 reverse, 0 neutral.
    pub direction: f64,
    pub clutch: f64,
    pub throttle: f64,
    pub boost: f64,
    pub powered_count: usize,
}

/// Motor torque for one powered wheel.
pub fn wheel_torque(request: &TorqueRequest, power_multiplier: f64, axle_share: f64) -> f64 {
    request.engine_torque
        * request.direction
        * power_multiplier
        * axle_share
        * (1.0 - request.clutch)
        * request.throttle
        * (1.0 + request.boost)
        / request.powered_count.max(1) as f64
}
