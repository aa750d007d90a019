// tarmac_core/src/assists/steering_helper.rs

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::types::ChassisState;
use crate::utils::math::{delta_angle_deg, lerp};

/// Largest heading change [deg] between ticks that still counts as steering
/// rather than a teleport or spin.
const MAX_TRACKED_YAW_DELTA: f64 = 10.0;
const MAX_VELOCITY_ANGLE: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringCorrection {
    /// Body-frame velocity-change torque.
    pub relative_torque: Vector3<f64>,
    /// Re-aimed world linear velocity, if the heading changed smoothly.
    pub linear_velocity: Option<Vector3<f64>>,
}

/// Nudges the chassis so its velocity follows where the front wheels point.
#[derive(Debug, Clone, Default)]
pub struct SteeringHelper {
    /// Heading of the velocity frame relative to the body [deg].
    velocity_angle: f64,
    last_yaw: Option<f64>,
}

impl SteeringHelper {
    pub fn update(
        &mut self,
        chassis: &ChassisState,
        steer_angle: f64,
        all_grounded: bool,
        linear_strength: f64,
        angular_strength: f64,
        dt: f64,
    ) -> Option<SteeringCorrection> {
        let yaw = chassis.yaw_deg();
        let yaw_delta = self.last_yaw.replace(yaw).map(|last| delta_angle_deg(last, yaw));

        if !all_grounded {
            return None;
        }

        let forward_velocity = chassis.local_velocity().x;
        let yaw_rate_deg = chassis.local_angular_velocity().z.to_degrees();
        let target = (yaw_rate_deg * forward_velocity.clamp(-1.0, 1.0) / 3.0)
            .clamp(-MAX_VELOCITY_ANGLE, MAX_VELOCITY_ANGLE);
        self.velocity_angle = lerp(self.velocity_angle, target, 20.0 * dt);

        let signed_angle = steer_angle.to_degrees() - self.velocity_angle;
        let yaw_torque = signed_angle * forward_velocity.clamp(-10.0, 10.0) / 1000.0 * angular_strength;
        if !yaw_torque.is_finite() {
            return None;
        }

        let linear_velocity = yaw_delta
            .filter(|delta| delta.abs() < MAX_TRACKED_YAW_DELTA)
            .and_then(|delta| {
                let angle = (delta * linear_strength / 2.0).to_radians();
                let up = Unit::try_new(chassis.up(), 1e-9)?;
                let rotated = UnitQuaternion::from_axis_angle(&up, angle) * chassis.linear_velocity;
                rotated.iter().all(|c| c.is_finite()).then_some(rotated)
            });

        Some(SteeringCorrection {
            relative_torque: Vector3::new(0.0, 0.0, yaw_torque),
            linear_velocity,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
