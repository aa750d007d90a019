// tarmac_core/src/drivetrain/engine.rs

use tracing::debug;

use crate::config::{BoostConfig, EngineConfig, FuelConfig};
use crate::models::curve::TorqueCurve;
use crate::utils::math::{inverse_lerp, lerp, smooth_damp};

/// RPM the target may exceed the redline by, so the limiter has something to catch.
pub const RPM_HEADROOM: f64 = 500.0;

/// The limiter releases below this fraction of max RPM.
const LIMITER_RELEASE: f64 = 0.975;

/// Inertia starts widening above this fraction of max RPM.
const REDLINE_INERTIA_START: f64 = 0.9;

/// Everything the engine reads from the rest of the drivetrain each tick.
#[derive(Debug, Clone, Copy)]
pub struct EngineInputs {
    pub throttle: f64,
    /// Clutch from the previous tick: 1 disengaged, 0 locked.
    pub clutch: f64,
    /// 1 while running with fuel, 0 otherwise.
    pub fuel_input: f64,
    /// Sum of |rpm| over powered wheels.
    pub traction_rpm: f64,
    pub powered_count: usize,
    pub gear_ratio: f64,
    pub dt: f64,
}

#[derive(Debug, Clone)]
pub struct Engine {
    min_rpm: f64,
    max_rpm: f64,
    max_torque: f64,
    torque_at_rpm: f64,
    inertia: f64,
    final_drive_ratio: f64,
    start_delay: f64,
    curve: TorqueCurve,

    raw_rpm: f64,
    rpm: f64,
    /// smooth_damp filter state.
    rpm_velocity: f64,
    cut_gas: bool,
    running: bool,
    /// Seconds until a pending start completes.
    start_timer: Option<f64>,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            min_rpm: config.min_rpm,
            max_rpm: config.max_rpm,
            max_torque: config.max_torque,
            torque_at_rpm: config.torque_at_rpm,
            inertia: config.inertia,
            final_drive_ratio: config.final_drive_ratio,
            start_delay: config.start_delay,
            curve: TorqueCurve::new(
                config.min_rpm,
                config.torque_at_rpm,
                config.max_rpm,
                config.max_torque,
            ),
            raw_rpm: config.min_rpm,
            rpm: config.min_rpm,
            rpm_velocity: 0.0,
            cut_gas: false,
            running: config.start_running,
            start_timer: None,
        }
    }

    /// Re-reads tunables, rebuilding the torque curve only if one of its
    /// defining parameters changed.
    pub fn sync_config(&mut self, config: &EngineConfig) {
        self.min_rpm = config.min_rpm;
        self.max_rpm = config.max_rpm;
        self.max_torque = config.max_torque;
        self.torque_at_rpm = config.torque_at_rpm;
        self.inertia = config.inertia;
        self.final_drive_ratio = config.final_drive_ratio;
        self.start_delay = config.start_delay;
        if !self
            .curve
            .matches(self.min_rpm, self.torque_at_rpm, self.max_rpm, self.max_torque)
        {
            debug!(min = self.min_rpm, max = self.max_rpm, "rebuilding torque curve");
            self.curve =
                TorqueCurve::new(self.min_rpm, self.torque_at_rpm, self.max_rpm, self.max_torque);
        }
    }

    // --- Start / stop ---

    /// Arms the starter. The engine runs once the start delay has elapsed.
    pub fn start(&mut self) {
        if !self.running && self.start_timer.is_none() {
            self.start_timer = Some(self.start_delay.max(0.0));
        }
    }

    pub fn start_instant(&mut self) {
        self.start_timer = None;
        self.running = true;
    }

    pub fn kill(&mut self) {
        self.start_timer = None;
        self.running = false;
    }

    /// Advances the starter timer. Returns true on the tick the engine starts.
    pub fn tick_starter(&mut self, dt: f64) -> bool {
        let Some(remaining) = self.start_timer else {
            return false;
        };
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            self.start_timer = None;
            self.running = true;
            true
        } else {
            self.start_timer = Some(remaining);
            false
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_starting(&self) -> bool {
        self.start_timer.is_some()
    }

    // --- RPM ---

    /// Updates the rev limiter from the current RPM and returns whether gas is cut.
    pub fn update_limiter(&mut self) -> bool {
        if self.rpm >= self.max_rpm {
            self.cut_gas = true;
        } else if self.rpm < self.max_rpm * LIMITER_RELEASE {
            self.cut_gas = false;
        }
        self.cut_gas
    }

    pub fn target_rpm(&self, inputs: &EngineInputs) -> f64 {
        let free_rev = lerp(
            self.min_rpm,
            self.max_rpm + RPM_HEADROOM,
            inputs.clutch * inputs.throttle,
        );
        let wheel_rpm = inputs.traction_rpm / inputs.powered_count.max(1) as f64;
        let driven = wheel_rpm * self.final_drive_ratio * inputs.gear_ratio * (1.0 - inputs.clutch);
        (free_rev + driven) * inputs.fuel_input
    }

    pub fn update(&mut self, inputs: &EngineInputs) {
        let dt = inputs.dt;
        if dt <= 0.0 {
            return;
        }

        let target = self.target_rpm(inputs);
        let widening = 1.0
            + inverse_lerp(
                self.max_rpm * REDLINE_INERTIA_START,
                self.max_rpm,
                self.raw_rpm,
            );
        let smooth_time = self.inertia * widening;

        self.raw_rpm = smooth_damp(self.raw_rpm, target, &mut self.rpm_velocity, smooth_time, dt)
            .clamp(0.0, self.max_rpm + RPM_HEADROOM);

        let follow = lerp(5.0 * dt, 50.0 * dt, 1.0 - inputs.clutch);
        self.rpm = lerp(self.rpm, self.raw_rpm, follow);
    }

    /// Torque available at the current visible RPM [Nm].
    pub fn torque(&self) -> f64 {
        self.curve.evaluate(self.rpm)
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn raw_rpm(&self) -> f64 {
        self.raw_rpm
    }

    pub fn max_rpm(&self) -> f64 {
        self.max_rpm
    }

    pub fn is_cutting_gas(&self) -> bool {
        self.cut_gas
    }

    /// Torque the curve peaks at, at its `torque_at_rpm` [Nm].
    pub fn peak_torque(&self) -> f64 {
        self.curve.evaluate(self.torque_at_rpm)
    }
}

// =========================================================================
// == Tanks ==
// =========================================================================

#[derive(Debug, Clone)]
pub struct FuelTank {
    consumption: bool,
    capacity: f64,
    level: f64,
    rate: f64,
}

impl FuelTank {
    pub fn new(config: &FuelConfig) -> Self {
        Self {
            consumption: config.consumption,
            capacity: config.capacity.max(0.0),
            level: config.initial.clamp(0.0, config.capacity.max(0.0)),
            rate: config.consumption_rate,
        }
    }

    /// Burns fuel proportionally to RPM. A no-op when consumption is disabled.
    pub fn drain(&mut self, rpm: f64, dt: f64) {
        if !self.consumption {
            return;
        }
        self.level = (self.level - (rpm / 10_000.0) * self.rate * dt).clamp(0.0, self.capacity);
    }

    pub fn refuel(&mut self, amount: f64) {
        self.level = (self.level + amount.max(0.0)).min(self.capacity);
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Only meaningful with consumption enabled; a disabled tank never runs dry.
    pub fn is_empty(&self) -> bool {
        self.consumption && self.level <= 0.0
    }
}

#[derive(Debug, Clone)]
pub struct BoostTank {
    enabled: bool,
    capacity: f64,
    level: f64,
    consumption: f64,
    regeneration: f64,
}

impl BoostTank {
    pub fn new(config: &BoostConfig) -> Self {
        Self {
            enabled: config.enabled,
            capacity: config.capacity.max(0.0),
            level: config.capacity.max(0.0),
            consumption: config.consumption,
            regeneration: config.regeneration,
        }
    }

    /// Consumes or regenerates the tank and returns the boost that takes effect.
    pub fn update(&mut self, requested: f64, dt: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        if requested > 0.0 && self.level > 0.0 {
            self.level = (self.level - self.consumption * dt).max(0.0);
            requested
        } else {
            self.level = (self.level + self.regeneration * dt).min(self.capacity);
            0.0
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}
