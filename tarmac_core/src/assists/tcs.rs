// tarmac_core/src/assists/tcs.rs

use crate::context::VehicleContext;
use crate::wheel::Wheel;

/// Wheels turning slower than this are considered stopped.
const MIN_WHEEL_RPM: f64 = 1.0;

/// Cuts motor torque on spinning powered wheels in proportion to their slip.
///
/// The cut is `torque * |slip| * strength`, capped so the torque can reach zero
/// but never change sign.
pub fn apply(wheels: &mut [Wheel], context: &VehicleContext, strength: f64) -> bool {
    let mut engaged = false;
    for wheel in wheels.iter_mut().filter(|w| w.is_powered() && w.is_grounded()) {
        if wheel.rpm().abs() < MIN_WHEEL_RPM {
            continue;
        }
        let threshold = context
            .ground(wheel.contact().ground_material)
            .map_or(f64::INFINITY, |g| g.slip_threshold);
        let slip = wheel.forward_slip().abs();
        if slip > threshold {
            let keep = (1.0 - slip * strength).max(0.0);
            wheel.set_motor_torque(wheel.motor_torque() * keep);
            engaged = true;
        }
    }
    engaged
}
