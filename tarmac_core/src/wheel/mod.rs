// tarmac_core/src/wheel/mod.rs

//! One wheel: its last contact report, the torques and steer angle requested
//! this tick, and the friction curves handed back to the host.

pub mod friction;
pub mod steering;

use crate::config::{GroundMaterial, SteeringConfig, WheelConfig};
use crate::drivetrain::DrivetrainMode;
use crate::models::friction::FrictionCurve;
use crate::types::{WheelCommand, WheelContact, WheelPosition};
use crate::utils::math::lerp;

pub use friction::{DriftInputs, FrictionInputs};

/// RPM fraction above which a wheel past its gear's max speed stops taking torque.
const OVER_REV: f64 = 0.985;

/// Conditions under which no wheel may receive motor torque.
#[derive(Debug, Clone, Copy)]
pub struct TorqueGuard {
    pub speed_kmh: f64,
    pub top_speed: f64,
    pub engine_running: bool,
    pub gear_max_speed: f64,
    pub rpm: f64,
    pub max_rpm: f64,
}

impl TorqueGuard {
    pub fn blocks(&self) -> bool {
        self.speed_kmh > self.top_speed
            || !self.engine_running
            || (self.speed_kmh > self.gear_max_speed && self.rpm >= self.max_rpm * OVER_REV)
    }
}

#[derive(Debug, Clone)]
pub struct Wheel {
    config: WheelConfig,
    powered: bool,
    axle_share: f64,
    enabled: bool,
    deflated: bool,

    contact: WheelContact,
    total_slip: f64,

    motor_torque: f64,
    brake_torque: f64,
    steer_angle: f64,
    sideways_multiplier: f64,
    forward_friction: FrictionCurve,
    sideways_friction: FrictionCurve,
    /// ABS released this wheel's brake during the current tick.
    abs_released: bool,
}

impl Wheel {
    pub fn new(config: WheelConfig, drivetrain: DrivetrainMode) -> Self {
        let axle_share = drivetrain.axle_share(config.position.axle());
        Self {
            powered: config.can_power && axle_share > 0.0,
            axle_share,
            enabled: true,
            deflated: false,
            contact: WheelContact::default(),
            total_slip: 0.0,
            motor_torque: 0.0,
            brake_torque: 0.0,
            steer_angle: 0.0,
            sideways_multiplier: 1.0,
            forward_friction: config.forward_friction,
            sideways_friction: config.sideways_friction,
            abs_released: false,
            config,
        }
    }

    pub fn position(&self) -> WheelPosition {
        self.config.position
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    /// Driven by the drivetrain and configured to take power.
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn axle_share(&self) -> f64 {
        self.axle_share
    }

    // --- Damage hooks ---

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.contact = WheelContact::default();
            self.motor_torque = 0.0;
            self.brake_torque = 0.0;
        }
    }

    pub fn is_deflated(&self) -> bool {
        self.deflated
    }

    /// Returns true if the wheel was inflated before the call.
    pub fn deflate(&mut self) -> bool {
        !std::mem::replace(&mut self.deflated, true)
    }

    /// Returns true if the wheel was deflated before the call.
    pub fn inflate(&mut self) -> bool {
        std::mem::replace(&mut self.deflated, false)
    }

    pub fn radius(&self) -> f64 {
        if self.deflated {
            self.config.radius * self.config.deflated_radius_multiplier
        } else {
            self.config.radius
        }
    }

    fn deflation_stiffness(&self) -> f64 {
        if self.deflated {
            self.config.deflated_stiffness_multiplier
        } else {
            1.0
        }
    }

    // --- Contact ---

    /// Takes this tick's contact report. A disabled wheel or a missing report
    /// reads as ungrounded.
    pub fn observe(&mut self, contact: Option<&WheelContact>, dt: f64) {
        self.contact = match contact {
            Some(contact) if self.enabled => *contact,
            _ => WheelContact::default(),
        };
        self.abs_released = false;
        let combined = (self.contact.sideways_slip.abs() + self.contact.forward_slip.abs()) / 2.0;
        self.total_slip = lerp(self.total_slip, combined, 5.0 * dt);
    }

    pub fn contact(&self) -> &WheelContact {
        &self.contact
    }

    pub fn is_grounded(&self) -> bool {
        self.contact.grounded
    }

    pub fn forward_slip(&self) -> f64 {
        self.contact.forward_slip
    }

    pub fn sideways_slip(&self) -> f64 {
        self.contact.sideways_slip
    }

    pub fn total_slip(&self) -> f64 {
        self.total_slip
    }

    pub fn rpm(&self) -> f64 {
        self.contact.rpm
    }

    // --- Requests ---

    pub fn apply_motor_torque(&mut self, torque: f64, guard: &TorqueGuard) {
        self.motor_torque = if !self.enabled || !self.powered || guard.blocks() || !torque.is_finite() {
            0.0
        } else {
            torque
        };
    }

    pub fn apply_brake_torque(&mut self, torque: f64) {
        self.brake_torque = if self.enabled && torque.is_finite() {
            torque.max(0.0)
        } else {
            0.0
        };
    }

    /// Sets the steer angle from a normalized input in [-1, 1] and the current
    /// maximum angle in degrees. Non-steering wheels only keep their toe.
    pub fn apply_steering(&mut self, input: f64, base_angle_deg: f64, steering: &SteeringConfig) {
        let side = self.config.position.side();
        let ackermann = if self.config.can_steer {
            steering::ackermann_angle(
                steering,
                side,
                input * self.config.steer_multiplier,
                base_angle_deg,
            )
        } else {
            0.0
        };
        self.steer_angle = ackermann + steering::toe_offset(side, self.config.toe);
    }

    pub fn motor_torque(&self) -> f64 {
        self.motor_torque
    }

    pub fn brake_torque(&self) -> f64 {
        self.brake_torque
    }

    /// Steer angle [rad], positive left.
    pub fn steer_angle(&self) -> f64 {
        self.steer_angle
    }

    // --- Assist overrides ---

    pub(crate) fn set_motor_torque(&mut self, torque: f64) {
        self.motor_torque = torque;
    }

    pub(crate) fn release_brake_for_abs(&mut self) {
        self.brake_torque = 0.0;
        self.abs_released = true;
    }

    pub(crate) fn add_brake_torque(&mut self, torque: f64) {
        if self.enabled {
            self.brake_torque += torque.max(0.0);
        }
    }

    pub fn abs_released(&self) -> bool {
        self.abs_released
    }

    pub fn sideways_multiplier(&self) -> f64 {
        self.sideways_multiplier
    }

    pub(crate) fn set_sideways_multiplier(&mut self, multiplier: f64) {
        self.sideways_multiplier = multiplier;
    }

    // --- Friction ---

    /// Rebuilds this tick's friction curves from the configured ones.
    pub fn update_friction(
        &mut self,
        ground: Option<&GroundMaterial>,
        handbrake: f64,
        drift: Option<DriftInputs>,
    ) {
        let inputs = FrictionInputs {
            ground,
            handbrake,
            can_handbrake: self.config.can_handbrake,
            sideways_multiplier: self.sideways_multiplier,
            deflation: self.deflation_stiffness(),
            drift,
            is_front: self.config.position.is_front(),
        };
        let (forward, sideways) = friction::adapt(
            &self.config.forward_friction,
            &self.config.sideways_friction,
            &inputs,
        );
        self.forward_friction = forward;
        self.sideways_friction = sideways;
    }

    /// Replaces the configured curves the per-tick adaptation starts from.
    pub(crate) fn set_base_friction(&mut self, forward: FrictionCurve, sideways: FrictionCurve) {
        self.config.forward_friction = forward;
        self.config.sideways_friction = sideways;
    }

    pub fn forward_friction(&self) -> &FrictionCurve {
        &self.forward_friction
    }

    pub fn sideways_friction(&self) -> &FrictionCurve {
        &self.sideways_friction
    }

    pub fn command(&self) -> WheelCommand {
        WheelCommand {
            position: self.config.position,
            motor_torque: self.motor_torque,
            brake_torque: self.brake_torque,
            steer_angle: self.steer_angle,
            radius: self.radius(),
            forward_friction: self.forward_friction,
            sideways_friction: self.sideways_friction,
        }
    }
}
