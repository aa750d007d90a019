// tarmac_core/src/assists/abs.rs

use crate::wheel::Wheel;

/// Handbrake position above which ABS stays out of the way.
const HANDBRAKE_OVERRIDE: f64 = 0.1;

/// Releases the brake on every wheel whose forward slip, weighted by the brake
/// pedal, reaches `threshold`. Returns true if any wheel was released.
///
/// Only wheels carrying brake torque are candidates. A wheel with no brake
/// torque (`can_brake` off, or disabled) has nothing to release and never
/// flags ABS as engaged.
pub fn apply(wheels: &mut [Wheel], brake: f64, handbrake: f64, threshold: f64) -> bool {
    if handbrake > HANDBRAKE_OVERRIDE {
        return false;
    }
    let mut engaged = false;
    for wheel in wheels.iter_mut() {
        if wheel.brake_torque() > 0.0 && wheel.forward_slip().abs() * brake >= threshold {
            wheel.release_brake_for_abs();
            engaged = true;
        }
    }
    engaged
}
