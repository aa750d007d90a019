// tarmac_core/src/telemetry.rs

use serde::{Deserialize, Serialize};

use crate::assists::{AssistKind, AssistState};
use crate::drivetrain::GearState;
use crate::types::WheelPosition;

/// Something that happened to a vehicle, delivered to every registered observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VehicleEvent {
    Spawned,
    GearChanged { from: GearState, to: GearState },
    EngineStarted,
    EngineStopped,
    WheelDeflated(WheelPosition),
    WheelInflated(WheelPosition),
    WheelEnabled(WheelPosition, bool),
    AssistEngaged(AssistKind),
    AssistReleased(AssistKind),
    /// The host reported a collision with the given impulse magnitude [N s].
    Collision { impulse: f64 },
    Repaired,
    Despawned,
}

/// Receives vehicle events. Implemented by audio, UI, damage and AI collaborators.
pub trait VehicleObserver: Send + Sync {
    fn on_event(&mut self, event: &VehicleEvent);
}

/// Any `Send + Sync` closure is an observer.
impl<F> VehicleObserver for F
where
    F: FnMut(&VehicleEvent) + Send + Sync,
{
    fn on_event(&mut self, event: &VehicleEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelTelemetry {
    pub position: WheelPosition,
    pub grounded: bool,
    pub enabled: bool,
    pub deflated: bool,
    pub forward_slip: f64,
    pub sideways_slip: f64,
    pub total_slip: f64,
    pub rpm: f64,
    pub motor_torque: f64,
    pub brake_torque: f64,
    /// [rad]
    pub steer_angle: f64,
}

/// Read-only view of a vehicle after its last step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub speed_kmh: f64,
    pub rpm: f64,
    pub raw_rpm: f64,
    pub gear: GearState,
    /// +1 forward, -1 reverse, 0 neutral.
    pub direction: i8,
    pub clutch: f64,
    pub throttle: f64,
    pub brake: f64,
    pub handbrake: f64,
    pub steer: f64,
    pub boost: f64,
    /// Remaining boost in the tank.
    pub boost_level: f64,
    pub fuel: f64,
    pub fuel_capacity: f64,
    /// Torque at the curve's peak [Nm].
    pub peak_torque: f64,
    pub engine_running: bool,
    pub cut_gas: bool,
    pub assists: AssistState,
    pub wheels: Vec<WheelTelemetry>,
}

impl TelemetrySnapshot {
    pub fn wheel(&self, position: WheelPosition) -> Option<&WheelTelemetry> {
        self.wheels.iter().find(|w| w.position == position)
    }
}
