// tarmac_core/src/assists/traction_helper.rs

use crate::types::ChassisState;
use crate::utils::math::clamp01;
use crate::wheel::Wheel;

/// Below this ground speed [m/s] the slip angle is meaningless.
const MIN_GROUND_SPEED: f64 = 0.1;

/// Chassis slip angle [rad]: the angle between where the body points and
/// where it travels over the ground. Positive when the body slides to the
/// right of its heading.
pub fn slip_angle(chassis: &ChassisState) -> Option<f64> {
    let up = chassis.up();
    let velocity = chassis.linear_velocity;
    let ground = velocity - up * velocity.dot(&up);
    let speed = ground.norm();
    if speed < MIN_GROUND_SPEED || !speed.is_finite() {
        return None;
    }
    let direction = ground / speed;
    let sine = chassis.forward().cross(&direction).dot(&up).clamp(-1.0, 1.0);
    Some(-sine.asin())
}

/// Sideways grip multiplier for one front wheel. Counter-steering into a
/// slide keeps full grip; steering with it loses grip proportionally to yaw rate.
pub fn multiplier(slip_angle: f64, steer_angle: f64, yaw_rate: f64, strength: f64) -> f64 {
    if slip_angle * steer_angle < 0.0 {
        1.0 - clamp01(strength * yaw_rate.abs())
    } else {
        1.0
    }
}

/// Writes multipliers to the front wheels. Returns true if any grip was removed.
pub fn apply(wheels: &mut [Wheel], chassis: &ChassisState, strength: f64) -> bool {
    let angle = slip_angle(chassis);
    let yaw_rate = chassis.local_angular_velocity().z;
    let mut active = false;
    for wheel in wheels.iter_mut() {
        let value = match angle {
            Some(angle) if wheel.position().is_front() => {
                multiplier(angle, wheel.steer_angle(), yaw_rate, strength)
            }
            _ => 1.0,
        };
        active |= value < 1.0;
        wheel.set_sideways_multiplier(value);
    }
    active
}

/// Restores full sideways grip on every wheel.
pub fn reset(wheels: &mut [Wheel]) {
    for wheel in wheels.iter_mut() {
        wheel.set_sideways_multiplier(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Isometry3, Vector3};

    #[test]
    fn sliding_right_gives_a_positive_slip_angle() {
        let chassis = ChassisState {
            pose: Isometry3::identity(),
            // Forward and to the right (negative y in FLU).
            linear_velocity: Vector3::new(10.0, -10.0, 0.0),
            angular_velocity: Vector3::zeros(),
        };
        let angle = slip_angle(&chassis).expect("moving chassis has a slip angle");
        assert_abs_diff_eq!(angle, std::f64::consts::FRAC_PI_4, epsilon = 1e-9);
    }

    #[test]
    fn stationary_chassis_has_no_slip_angle() {
        assert!(slip_angle(&ChassisState::default()).is_none());
    }

    #[test]
    fn steering_with_the_slide_loses_grip() {
        assert_abs_diff_eq!(multiplier(0.3, -0.2, 2.0, 0.25), 0.5);
        assert_abs_diff_eq!(multiplier(0.3, 0.2, 2.0, 0.25), 1.0);
        assert_abs_diff_eq!(multiplier(0.3, -0.2, 10.0, 0.25), 0.0);
    }
}
