// tarmac_core/src/drivetrain/clutch.rs

use crate::utils::math::{clamp01, lerp};

/// Throttle below this counts as "off" for the launch scalar.
const LAUNCH_THROTTLE: f64 = 0.1;
/// Launch scalar above which first gear starts biting.
const LAUNCH_BITE: f64 = 0.25;

#[derive(Debug, Clone, Copy)]
pub struct ClutchInputs {
    pub throttle: f64,
    pub handbrake: f64,
    pub speed_kmh: f64,
    /// Speed implied by the powered wheels' rotation [km/h].
    pub traction_speed: f64,
    /// Zero-based engaged gear.
    pub gear: usize,
    /// Target shift speed of the first gear [km/h].
    pub first_gear_shift_speed: f64,
    pub shifting: bool,
    pub neutral: bool,
    pub cut_gas: bool,
    pub dt: f64,
}

/// Automatic clutch. 1 means fully disengaged, 0 fully locked.
#[derive(Debug, Clone)]
pub struct AutoClutch {
    launch: f64,
    value: f64,
}

impl Default for AutoClutch {
    fn default() -> Self {
        Self {
            launch: 0.0,
            value: 1.0,
        }
    }
}

impl AutoClutch {
    pub fn update(&mut self, inputs: &ClutchInputs) -> f64 {
        let dt = inputs.dt;

        self.launch = if inputs.throttle >= LAUNCH_THROTTLE {
            clamp01(self.launch + inputs.throttle * dt)
        } else {
            clamp01(self.launch - dt)
        };

        if inputs.cut_gas || inputs.handbrake >= 0.1 || inputs.neutral {
            self.value = 1.0;
            return self.value;
        }

        let (target, rate) = if inputs.gear == 0 {
            let target = if self.launch >= LAUNCH_BITE {
                let progress = if inputs.first_gear_shift_speed > 0.0 {
                    inputs.traction_speed / inputs.first_gear_shift_speed
                } else {
                    1.0
                };
                lerp(1.0, lerp(0.25, 0.0, progress), inputs.throttle.abs())
            } else if inputs.speed_kmh > 0.0 {
                (1.0 / inputs.speed_kmh).min(1.0)
            } else {
                1.0
            };
            (target, 50.0 * dt)
        } else if inputs.shifting {
            (1.0, 10.0 * dt)
        } else {
            (0.0, 10.0 * dt)
        };

        self.value = clamp01(lerp(self.value, target, rate));
        self.value
    }

    /// Overrides the clutch with the driver's pedal.
    pub fn set_manual(&mut self, pedal: f64) -> f64 {
        self.value = clamp01(pedal);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn launch(&self) -> f64 {
        self.launch
    }
}
