// tarmac_core/src/types.rs

//! Plain data exchanged with the host physics engine every fixed tick.
//!
//! Frame convention: the chassis body frame is FLU (x forward, y left, z up),
//! world quantities are expressed in a right-handed z-up frame. Positive steer
//! input turns the vehicle left (counter-clockwise seen from above).

use nalgebra::{Isometry3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Wheel identity ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axle {
    Front,
    Rear,
}

/// Closed tag identifying where a wheel sits on the chassis.
///
/// Extra rear axles (trucks, buses) are numbered from 0 starting behind the
/// main rear axle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WheelPosition {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
    ExtraRear(u8, Side),
}

impl WheelPosition {
    pub fn axle(&self) -> Axle {
        match self {
            WheelPosition::FrontLeft | WheelPosition::FrontRight => Axle::Front,
            _ => Axle::Rear,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            WheelPosition::FrontLeft | WheelPosition::RearLeft => Side::Left,
            WheelPosition::FrontRight | WheelPosition::RearRight => Side::Right,
            WheelPosition::ExtraRear(_, side) => *side,
        }
    }

    pub fn is_front(&self) -> bool {
        self.axle() == Axle::Front
    }

    /// The wheel on the other end of the same axle.
    pub fn mirrored(&self) -> WheelPosition {
        match self {
            WheelPosition::FrontLeft => WheelPosition::FrontRight,
            WheelPosition::FrontRight => WheelPosition::FrontLeft,
            WheelPosition::RearLeft => WheelPosition::RearRight,
            WheelPosition::RearRight => WheelPosition::RearLeft,
            WheelPosition::ExtraRear(i, Side::Left) => WheelPosition::ExtraRear(*i, Side::Right),
            WheelPosition::ExtraRear(i, Side::Right) => WheelPosition::ExtraRear(*i, Side::Left),
        }
    }
}

impl fmt::Display for WheelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WheelPosition::FrontLeft => write!(f, "FL"),
            WheelPosition::FrontRight => write!(f, "FR"),
            WheelPosition::RearLeft => write!(f, "RL"),
            WheelPosition::RearRight => write!(f, "RR"),
            WheelPosition::ExtraRear(i, Side::Left) => write!(f, "X{i}L"),
            WheelPosition::ExtraRear(i, Side::Right) => write!(f, "X{i}R"),
        }
    }
}

// =========================================================================
// == Inbound ==
// =========================================================================

/// The raw driver-input tuple supplied by the input source each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverInput {
    /// Gas pedal, [0, 1].
    pub throttle: f64,
    /// Brake pedal, [0, 1].
    pub brake: f64,
    /// Steering, [-1, 1]. Positive turns left.
    pub steer: f64,
    /// Handbrake lever, [0, 1].
    pub handbrake: f64,
    /// Clutch pedal, [0, 1]. Only read when the automatic clutch is disabled.
    pub clutch: f64,
    /// Boost (NOS) button, [0, 1].
    pub boost: f64,
}

impl DriverInput {
    /// Clamps every channel to its documented range. NaN becomes 0.
    pub fn normalized(&self) -> Self {
        fn unit(v: f64) -> f64 {
            if v.is_nan() {
                0.0
            } else {
                v.clamp(0.0, 1.0)
            }
        }
        Self {
            throttle: unit(self.throttle),
            brake: unit(self.brake),
            steer: if self.steer.is_nan() { 0.0 } else { self.steer.clamp(-1.0, 1.0) },
            handbrake: unit(self.handbrake),
            clutch: unit(self.clutch),
            boost: unit(self.boost),
        }
    }
}

/// One wheel's contact report from the physics engine, sampled after its last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelContact {
    pub grounded: bool,
    /// Contact normal in world space.
    pub normal: Vector3<f64>,
    /// Contact point in world space.
    pub point: Point3<f64>,
    pub forward_slip: f64,
    pub sideways_slip: f64,
    /// Raw suspension force along the contact normal [N].
    pub suspension_force: f64,
    /// Axle angular speed [rev/min].
    pub rpm: f64,
    /// Index into the ground material table.
    pub ground_material: usize,
}

impl Default for WheelContact {
    fn default() -> Self {
        Self {
            grounded: false,
            normal: Vector3::z(),
            point: Point3::origin(),
            forward_slip: 0.0,
            sideways_slip: 0.0,
            suspension_force: 0.0,
            rpm: 0.0,
            ground_material: 0,
        }
    }
}

/// Kinematic state of the chassis rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisState {
    /// Body-to-world transform (FLU body frame).
    pub pose: Isometry3<f64>,
    /// World-space linear velocity [m/s].
    pub linear_velocity: Vector3<f64>,
    /// World-space angular velocity [rad/s].
    pub angular_velocity: Vector3<f64>,
}

impl Default for ChassisState {
    fn default() -> Self {
        Self {
            pose: Isometry3::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }
}

impl ChassisState {
    pub fn up(&self) -> Vector3<f64> {
        self.pose.rotation * Vector3::z()
    }

    pub fn forward(&self) -> Vector3<f64> {
        self.pose.rotation * Vector3::x()
    }

    /// Linear velocity expressed in the body frame.
    pub fn local_velocity(&self) -> Vector3<f64> {
        self.pose.rotation.inverse() * self.linear_velocity
    }

    /// Angular velocity expressed in the body frame.
    pub fn local_angular_velocity(&self) -> Vector3<f64> {
        self.pose.rotation.inverse() * self.angular_velocity
    }

    /// Speed magnitude in km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.linear_velocity.norm() * 3.6
    }

    /// Heading about the body up axis, in degrees within [0, 360).
    pub fn yaw_deg(&self) -> f64 {
        let (_, _, yaw) = self.pose.rotation.euler_angles();
        yaw.to_degrees().rem_euclid(360.0)
    }
}

// =========================================================================
// == Outbound ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceMode {
    /// A continuous force [N] integrated by the host over the step.
    Force,
    /// An instantaneous change of velocity, independent of mass.
    VelocityChange,
}

/// A world-space force applied at a world-space point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedForce {
    pub force: Vector3<f64>,
    pub point: Point3<f64>,
    pub mode: ForceMode,
}

/// What the host must write to one wheel for this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelCommand {
    pub position: WheelPosition,
    pub motor_torque: f64,
    pub brake_torque: f64,
    /// Steer angle about the body up axis [rad]. Positive turns left.
    pub steer_angle: f64,
    /// Effective radius (shrinks when deflated) [m].
    pub radius: f64,
    pub forward_friction: crate::models::friction::FrictionCurve,
    pub sideways_friction: crate::models::friction::FrictionCurve,
}

/// Everything one fixed tick asks the host to apply.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub wheels: Vec<WheelCommand>,
    pub forces: Vec<AppliedForce>,
    /// Body-frame torque in velocity-change mode (steering helper).
    pub relative_torque: Vector3<f64>,
    /// New world linear velocity, when the steering helper re-aimed it.
    pub linear_velocity_override: Option<Vector3<f64>>,
}

impl StepOutput {
    pub fn new(wheels: Vec<WheelCommand>) -> Self {
        Self {
            wheels,
            forces: Vec::new(),
            relative_torque: Vector3::zeros(),
            linear_velocity_override: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Translation3, UnitQuaternion};

    #[test]
    fn wheel_positions_know_their_axle_and_side() {
        assert_eq!(WheelPosition::FrontLeft.axle(), Axle::Front);
        assert_eq!(WheelPosition::RearRight.side(), Side::Right);
        assert_eq!(WheelPosition::ExtraRear(1, Side::Left).axle(), Axle::Rear);
        assert_eq!(
            WheelPosition::ExtraRear(1, Side::Left).mirrored(),
            WheelPosition::ExtraRear(1, Side::Right)
        );
        assert_eq!(WheelPosition::FrontRight.to_string(), "FR");
    }

    #[test]
    fn driver_input_normalization_clamps_and_drops_nan() {
        let input = DriverInput {
            throttle: 1.4,
            brake: -0.3,
            steer: f64::NAN,
            handbrake: 0.5,
            clutch: 2.0,
            boost: 0.2,
        }
        .normalized();
        assert_eq!(input.throttle, 1.0);
        assert_eq!(input.brake, 0.0);
        assert_eq!(input.steer, 0.0);
        assert_eq!(input.clutch, 1.0);
    }

    #[test]
    fn chassis_local_velocity_follows_heading() {
        let chassis = ChassisState {
            pose: Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2),
            ),
            // Moving along world +y while facing +y: pure forward motion.
            linear_velocity: Vector3::new(0.0, 10.0, 0.0),
            angular_velocity: Vector3::zeros(),
        };
        let local = chassis.local_velocity();
        assert_abs_diff_eq!(local.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(local.y, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(chassis.speed_kmh(), 36.0, epsilon = 1e-9);
        assert_abs_diff_eq!(chassis.yaw_deg(), 90.0, epsilon = 1e-9);
    }
}
