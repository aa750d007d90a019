// tarmac_core/src/assists/mod.rs

//! Closed-loop driver assists. Each controller is a free function over the
//! wheel list so it can be tested alone; [`DriverAssists`] runs them in order
//! and keeps the little state they need between ticks.

pub mod abs;
pub mod anti_roll;
pub mod esp;
pub mod steering_helper;
pub mod tcs;
pub mod traction_helper;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::AssistConfig;
use crate::context::VehicleContext;
use crate::types::ChassisState;
use crate::wheel::Wheel;

pub use esp::EspReading;
pub use steering_helper::{SteeringCorrection, SteeringHelper};

/// The assists that intervene discretely and report engage/release events.
/// The helpers act continuously and only show up in [`AssistState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssistKind {
    Abs,
    Tcs,
    Esp,
}

/// Which assists intervened on the last tick. Read-only outside this module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistState {
    pub abs_engaged: bool,
    pub tcs_engaged: bool,
    pub esp_engaged: bool,
    pub understeer: bool,
    pub oversteer: bool,
    pub steering_helper_active: bool,
    pub traction_helper_active: bool,
}

impl AssistState {
    pub fn is_engaged(&self, kind: AssistKind) -> bool {
        match kind {
            AssistKind::Abs => self.abs_engaged,
            AssistKind::Tcs => self.tcs_engaged,
            AssistKind::Esp => self.esp_engaged,
        }
    }

    /// Assists whose engaged flag differs between `self` and `next`, with the new value.
    pub fn transitions(&self, next: &AssistState) -> Vec<(AssistKind, bool)> {
        [AssistKind::Abs, AssistKind::Tcs, AssistKind::Esp]
            .into_iter()
            .filter(|&kind| self.is_engaged(kind) != next.is_engaged(kind))
            .map(|kind| (kind, next.is_engaged(kind)))
            .collect()
    }
}

/// Effective driver inputs the assists read.
#[derive(Debug, Clone, Copy)]
pub struct AssistInputs {
    pub brake: f64,
    pub handbrake: f64,
    /// Full-pedal brake torque [Nm], scales ESP corrections.
    pub brake_torque: f64,
    pub dt: f64,
}

#[derive(Debug, Clone)]
pub struct DriverAssists {
    config: AssistConfig,
    steering_helper: SteeringHelper,
    state: AssistState,
}

impl DriverAssists {
    /// Gains are clamped into their supported ranges here.
    pub fn new(config: &AssistConfig) -> Self {
        Self {
            config: config.clamped(),
            steering_helper: SteeringHelper::default(),
            state: AssistState::default(),
        }
    }

    pub fn sync_config(&mut self, config: &AssistConfig) {
        self.config = config.clamped();
    }

    pub fn config(&self) -> &AssistConfig {
        &self.config
    }

    pub fn state(&self) -> &AssistState {
        &self.state
    }

    /// Runs ABS, TCS, ESP, the steering helper and the traction helper, in that
    /// order. Returns the steering helper's correction, if any.
    pub fn apply(
        &mut self,
        wheels: &mut [Wheel],
        chassis: &ChassisState,
        context: &VehicleContext,
        inputs: &AssistInputs,
    ) -> Option<SteeringCorrection> {
        let config = &self.config;
        let mut state = AssistState::default();

        if config.abs {
            state.abs_engaged = abs::apply(wheels, inputs.brake, inputs.handbrake, config.abs_threshold);
        }

        if config.tcs {
            state.tcs_engaged = tcs::apply(wheels, context, config.tcs_strength);
        }

        if config.esp {
            let reading = esp::apply(
                wheels,
                inputs.brake,
                inputs.handbrake,
                inputs.brake_torque,
                config.esp_threshold,
                config.esp_strength,
            );
            state.esp_engaged = reading.engaged();
            state.understeer = reading.understeer;
            state.oversteer = reading.oversteer;
        }

        let correction = if config.steering_helper {
            let all_grounded = wheels.iter().all(Wheel::is_grounded);
            let steer_angle = wheels
                .iter()
                .find(|w| w.position().is_front() && w.config().can_steer)
                .map_or(0.0, Wheel::steer_angle);
            self.steering_helper.update(
                chassis,
                steer_angle,
                all_grounded,
                config.steer_helper_linear_strength,
                config.steer_helper_angular_strength,
                inputs.dt,
            )
        } else {
            self.steering_helper.reset();
            None
        };
        state.steering_helper_active = correction.is_some();

        if config.traction_helper {
            state.traction_helper_active =
                traction_helper::apply(wheels, chassis, config.traction_helper_strength);
        } else {
            traction_helper::reset(wheels);
        }

        for (kind, engaged) in self.state.transitions(&state) {
            trace!(?kind, engaged, "assist state changed");
        }
        self.state = state;
        correction
    }
}
