// tarmac_core/src/wheel/steering.rs

use crate::config::SteeringConfig;
use crate::types::Side;
use crate::utils::math::{lerp, move_towards};

/// Empirical Ackermann gain.
const ACKERMANN_GAIN: f64 = 2.55;

/// Maximum steer angle [deg] at the current speed.
pub fn speed_sensitive_angle(config: &SteeringConfig, speed_kmh: f64) -> f64 {
    let at_speed = config.high_speed_steer_angle_at_speed.max(1.0);
    lerp(
        config.steer_angle,
        config.high_speed_steer_angle,
        speed_kmh / at_speed,
    )
}

/// Ackermann steer angle [rad] for one wheel, toe excluded.
///
/// With positive (left) input the left wheel is on the inside of the turn and
/// gets the shorter Ackermann term, hence the larger angle.
pub fn ackermann_angle(config: &SteeringConfig, side: Side, input: f64, base_angle_deg: f64) -> f64 {
    if input == 0.0 {
        return 0.0;
    }
    let inside = match side {
        Side::Left => input > 0.0,
        Side::Right => input < 0.0,
    };
    let half_track = config.ackermann_track / 2.0;
    let term = if inside {
        config.ackermann_base - half_track
    } else {
        config.ackermann_base + half_track
    };
    base_angle_deg.to_radians() * ACKERMANN_GAIN * (ACKERMANN_GAIN / term).atan() * input
}

/// Static toe offset [rad]. Toe-in points both wheels toward the centerline.
pub fn toe_offset(side: Side, toe_deg: f64) -> f64 {
    match side {
        Side::Left => -toe_deg.to_radians(),
        Side::Right => toe_deg.to_radians(),
    }
}

/// Rate-limits the driver's steering request.
#[derive(Debug, Clone, Default)]
pub struct SteerSmoother {
    value: f64,
}

impl SteerSmoother {
    pub fn update(&mut self, requested: f64, rate: f64, dt: f64) -> f64 {
        self.value = if rate > 0.0 {
            move_towards(self.value, requested, rate * dt)
        } else {
            requested
        };
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}
