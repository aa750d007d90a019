// tarmac_core/src/assists/esp.rs

use crate::types::{Axle, WheelPosition};
use crate::wheel::Wheel;

/// ESP stands down while the driver is braking this hard.
const DRIVER_BRAKE_OVERRIDE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EspReading {
    /// Sum of sideways slip over the front axle.
    pub front_slip: f64,
    /// Sum of sideways slip over the main rear axle.
    pub rear_slip: f64,
    pub understeer: bool,
    pub oversteer: bool,
}

impl EspReading {
    pub fn engaged(&self) -> bool {
        self.understeer || self.oversteer
    }
}

pub fn read(wheels: &[Wheel], threshold: f64) -> EspReading {
    let axle_slip = |axle: Axle| -> f64 {
        wheels
            .iter()
            .filter(|w| {
                w.position().axle() == axle && !matches!(w.position(), WheelPosition::ExtraRear(..))
            })
            .map(Wheel::sideways_slip)
            .sum()
    };
    let front_slip = axle_slip(Axle::Front);
    let rear_slip = axle_slip(Axle::Rear);
    EspReading {
        front_slip,
        rear_slip,
        understeer: front_slip.abs() >= threshold,
        oversteer: rear_slip.abs() >= threshold,
    }
}

/// Brakes individual wheels against under- and oversteer.
///
/// Understeer is corrected on the front wheels from the rear slip sign and
/// oversteer on the rear wheels from the front slip sign. Wheels ABS released
/// this tick are left alone.
pub fn apply(
    wheels: &mut [Wheel],
    brake: f64,
    handbrake: f64,
    brake_torque: f64,
    threshold: f64,
    strength: f64,
) -> EspReading {
    let reading = read(wheels, threshold);
    if brake >= DRIVER_BRAKE_OVERRIDE || handbrake >= DRIVER_BRAKE_OVERRIDE {
        return reading;
    }

    let gain = brake_torque * strength;
    let (front, rear) = (reading.front_slip, reading.rear_slip);
    for wheel in wheels.iter_mut().filter(|w| !w.abs_released()) {
        let correction = match wheel.position() {
            WheelPosition::FrontLeft if reading.understeer => gain * (-rear).max(0.0),
            WheelPosition::FrontRight if reading.understeer => gain * rear.max(0.0),
            WheelPosition::RearLeft if reading.oversteer => gain * (-front).max(0.0),
            WheelPosition::RearRight if reading.oversteer => gain * front.max(0.0),
            _ => 0.0,
        };
        if correction > 0.0 {
            wheel.add_brake_torque(correction);
        }
    }
    reading
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WheelConfig;
    use crate::drivetrain::DrivetrainMode;
    use crate::types::WheelContact;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    fn car(slips: [f64; 4]) -> Vec<Wheel> {
        [
            WheelPosition::FrontLeft,
            WheelPosition::FrontRight,
            WheelPosition::RearLeft,
            WheelPosition::RearRight,
        ]
        .into_iter()
        .zip(slips)
        .map(|(position, sideways_slip)| {
            let mut wheel = Wheel::new(
                WheelConfig::for_position(position, Vector3::zeros()),
                DrivetrainMode::Rwd,
            );
            let contact = WheelContact {
                grounded: true,
                sideways_slip,
                ..WheelContact::default()
            };
            wheel.observe(Some(&contact), 0.02);
            wheel
        })
        .collect()
    }

    #[test]
    fn oversteer_only_brakes_the_rear() {
        // Rear sliding, front gripping but slightly positive.
        let mut wheels = car([0.01, 0.01, 0.4, 0.4]);
        let reading = apply(&mut wheels, 0.0, 0.0, 2000.0, 0.5, 0.25);
        assert!(reading.oversteer && !reading.understeer);

        for wheel in &wheels[..2] {
            assert_abs_diff_eq!(wheel.brake_torque(), 0.0);
        }
        assert_abs_diff_eq!(wheels[2].brake_torque(), 0.0);
        assert_abs_diff_eq!(wheels[3].brake_torque(), 2000.0 * 0.25 * 0.02, epsilon = 1e-9);
    }

    #[test]
    fn understeer_brakes_the_front() {
        let mut wheels = car([-0.3, -0.3, -0.1, -0.1]);
        let reading = apply(&mut wheels, 0.0, 0.0, 2000.0, 0.5, 0.25);
        assert!(reading.understeer && !reading.oversteer);
        assert_abs_diff_eq!(wheels[0].brake_torque(), 2000.0 * 0.25 * 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(wheels[1].brake_torque(), 0.0);
    }

    #[test]
    fn hard_driver_braking_suppresses_corrections() {
        let mut wheels = car([0.01, 0.01, 0.4, 0.4]);
        let reading = apply(&mut wheels, 0.8, 0.0, 2000.0, 0.5, 0.25);
        assert!(reading.oversteer);
        assert!(wheels.iter().all(|w| w.brake_torque() == 0.0));
    }
}
