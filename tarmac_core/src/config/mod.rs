// tarmac_core/src/config/mod.rs

//! The configuration surface of a vehicle.
//!
//! Everything here is plain serde data, loaded once when a vehicle is spawned and
//! never re-parsed per tick. Every struct is `#[serde(default)]` so a vehicle
//! file only needs to list what differs from the stock sedan.

pub mod behavior;
pub mod ground;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::drivetrain::DrivetrainMode;
use crate::error::ConfigIssue;
use crate::models::friction::FrictionCurve;
use crate::types::{Axle, WheelPosition};

pub use behavior::{BehaviorKind, BehaviorProfile};
pub use ground::GroundMaterial;

/// The smallest RPM gap the engine and gearbox bands must keep.
pub const MIN_RPM_BAND: f64 = 500.0;

// =========================================================================
// == Top-Level Vehicle Configuration ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub name: String,
    /// Chassis mass [kg]. Only the host uses it.
    pub mass: f64,
    /// Maximum speed [km/h]. Motor torque is cut above it.
    pub top_speed: f64,
    /// Optional speed limiter [km/h]. Throttle is cut above it.
    pub limit_speed: Option<f64>,
    /// Downforce coefficient [N per km/h].
    pub downforce: f64,
    /// Preset applied on top of the assist/friction settings at spawn.
    pub behavior: Option<BehaviorKind>,
    pub engine: EngineConfig,
    pub gearbox: GearboxConfig,
    pub drivetrain: DrivetrainMode,
    pub steering: SteeringConfig,
    pub brakes: BrakeConfig,
    pub assists: AssistConfig,
    pub anti_roll: AntiRollConfig,
    pub fuel: FuelConfig,
    pub boost: BoostConfig,
    pub wheels: Vec<WheelConfig>,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            name: "sedan".to_string(),
            mass: 1350.0,
            top_speed: 220.0,
            limit_speed: None,
            downforce: 25.0,
            behavior: None,
            engine: EngineConfig::default(),
            gearbox: GearboxConfig::default(),
            drivetrain: DrivetrainMode::Rwd,
            steering: SteeringConfig::default(),
            brakes: BrakeConfig::default(),
            assists: AssistConfig::default(),
            anti_roll: AntiRollConfig::default(),
            fuel: FuelConfig::default(),
            boost: BoostConfig::default(),
            wheels: WheelConfig::four_wheel_layout(1.3, 1.4, 0.8),
        }
    }
}

impl VehicleConfig {
    /// Checks the tuning for mistakes content authors should fix before shipping.
    /// An empty list means the configuration is clean.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let engine = &self.engine;
        let gearbox = &self.gearbox;

        if engine.min_rpm >= engine.max_rpm {
            issues.push(ConfigIssue::MinRpmAboveMax {
                min: engine.min_rpm,
                max: engine.max_rpm,
            });
        } else if engine.max_rpm - engine.min_rpm < MIN_RPM_BAND {
            issues.push(ConfigIssue::RpmBandTooNarrow {
                min: engine.min_rpm,
                max: engine.max_rpm,
                required: MIN_RPM_BAND,
            });
        }

        if engine.torque_at_rpm < engine.min_rpm || engine.torque_at_rpm > engine.max_rpm {
            issues.push(ConfigIssue::PeakTorqueOutsideBand {
                rpm: engine.torque_at_rpm,
                min: engine.min_rpm,
                max: engine.max_rpm,
            });
        }

        if gearbox.shift_up_rpm <= gearbox.shift_down_rpm {
            issues.push(ConfigIssue::ShiftUpBelowShiftDown {
                up: gearbox.shift_up_rpm,
                down: gearbox.shift_down_rpm,
            });
        } else if gearbox.shift_up_rpm - gearbox.shift_down_rpm < MIN_RPM_BAND {
            issues.push(ConfigIssue::ShiftBandTooNarrow {
                gap: gearbox.shift_up_rpm - gearbox.shift_down_rpm,
                required: MIN_RPM_BAND,
            });
        }

        if gearbox.shift_up_rpm > engine.max_rpm {
            issues.push(ConfigIssue::ShiftUpAboveMaxRpm {
                up: gearbox.shift_up_rpm,
                max: engine.max_rpm,
            });
        }

        if !(1..=8).contains(&gearbox.gear_count) {
            issues.push(ConfigIssue::GearCountOutOfRange(gearbox.gear_count));
        }

        if self.top_speed <= 0.0 {
            issues.push(ConfigIssue::NonPositiveTopSpeed(self.top_speed));
        }

        let powered = self
            .wheels
            .iter()
            .filter(|w| w.can_power && self.drivetrain.drives(w.position.axle()))
            .count();
        if powered == 0 {
            issues.push(ConfigIssue::NoPoweredWheels(self.drivetrain));
        }

        issues.extend(self.assists.range_issues());
        issues
    }

    /// Applies a behavior profile over this configuration's assist, steering
    /// and friction settings.
    pub fn apply_behavior(&mut self, profile: &BehaviorProfile) {
        let assists = &mut self.assists;
        assists.steering_helper = profile.steering_helper;
        assists.traction_helper = profile.traction_helper;
        assists.abs = profile.abs;
        assists.esp = profile.esp;
        assists.tcs = profile.tcs;
        assists.drift_mode = profile.drift_mode;
        assists.steer_helper_linear_strength = assists
            .steer_helper_linear_strength
            .clamp(profile.steer_helper_linear_strength.0, profile.steer_helper_linear_strength.1);
        assists.steer_helper_angular_strength = assists
            .steer_helper_angular_strength
            .clamp(profile.steer_helper_angular_strength.0, profile.steer_helper_angular_strength.1);
        assists.traction_helper_strength = assists
            .traction_helper_strength
            .clamp(profile.traction_helper_strength.0, profile.traction_helper_strength.1);

        self.anti_roll.front = self.anti_roll.front.max(profile.anti_roll_minimum);
        self.anti_roll.rear = self.anti_roll.rear.max(profile.anti_roll_minimum);
        self.gearbox.shift_threshold = profile.gear_shift_threshold;
        self.steering.high_speed_steer_angle = self
            .steering
            .high_speed_steer_angle
            .max(profile.high_speed_steer_angle_minimum);

        for wheel in &mut self.wheels {
            wheel.forward_friction = profile.forward_friction;
            wheel.sideways_friction = profile.sideways_friction;
        }
    }
}

// =========================================================================
// == Sub-Configurations ==
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Idle RPM.
    pub min_rpm: f64,
    /// Redline RPM. The rev limiter engages here.
    pub max_rpm: f64,
    /// Peak torque [Nm].
    pub max_torque: f64,
    /// RPM at which peak torque is produced.
    pub torque_at_rpm: f64,
    /// Time constant of the RPM low-pass filter [s].
    pub inertia: f64,
    pub final_drive_ratio: f64,
    /// Seconds between `start_engine` and the engine running.
    pub start_delay: f64,
    /// Spawn with the engine already running.
    pub start_running: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_rpm: 800.0,
            max_rpm: 7000.0,
            max_torque: 300.0,
            torque_at_rpm: 5500.0,
            inertia: 0.15,
            final_drive_ratio: 3.2,
            start_delay: 1.0,
            start_running: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShiftMode {
    #[default]
    Automatic,
    /// Automatic shifting, but never up-shifts while reversing.
    SemiAutomatic,
    /// Only explicit shift requests change gear.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GearboxConfig {
    pub gear_count: usize,
    /// Fraction of top speed, in [0, 1], at which the last gear's shift point sits.
    pub shift_threshold: f64,
    pub shift_up_rpm: f64,
    pub shift_down_rpm: f64,
    /// Seconds the clutch stays open during a shift.
    pub shift_delay: f64,
    pub mode: ShiftMode,
    /// When false, reverse is gated by the brake-release lockout.
    pub auto_reverse: bool,
    /// When false, the driver's clutch pedal is used instead.
    pub automatic_clutch: bool,
}

impl Default for GearboxConfig {
    fn default() -> Self {
        Self {
            gear_count: 6,
            shift_threshold: 0.8,
            shift_up_rpm: 6500.0,
            shift_down_rpm: 3500.0,
            shift_delay: 0.35,
            mode: ShiftMode::Automatic,
            auto_reverse: false,
            automatic_clutch: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Maximum steer angle at standstill [deg].
    pub steer_angle: f64,
    /// Maximum steer angle at `high_speed_steer_angle_at_speed` [deg].
    pub high_speed_steer_angle: f64,
    /// Speed at which the high-speed steer angle is fully reached [km/h].
    pub high_speed_steer_angle_at_speed: f64,
    /// How fast the steering input follows the driver, in full locks per second.
    pub steer_rate: f64,
    /// Ackermann wheelbase term.
    pub ackermann_base: f64,
    /// Ackermann track term; half of it is added/subtracted per side.
    pub ackermann_track: f64,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            steer_angle: 40.0,
            high_speed_steer_angle: 15.0,
            high_speed_steer_angle_at_speed: 120.0,
            steer_rate: 5.0,
            ackermann_base: 6.0,
            ackermann_track: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrakeConfig {
    /// Brake torque per wheel at full pedal [Nm].
    pub brake_torque: f64,
}

impl Default for BrakeConfig {
    fn default() -> Self {
        Self { brake_torque: 2000.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    pub abs: bool,
    pub abs_threshold: f64,
    pub tcs: bool,
    pub tcs_strength: f64,
    pub esp: bool,
    pub esp_threshold: f64,
    pub esp_strength: f64,
    pub steering_helper: bool,
    pub steer_helper_linear_strength: f64,
    pub steer_helper_angular_strength: f64,
    pub traction_helper: bool,
    pub traction_helper_strength: f64,
    pub drift_mode: bool,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            abs: true,
            abs_threshold: 0.35,
            tcs: true,
            tcs_strength: 0.5,
            esp: true,
            esp_threshold: 0.5,
            esp_strength: 0.25,
            steering_helper: true,
            steer_helper_linear_strength: 0.1,
            steer_helper_angular_strength: 0.1,
            traction_helper: true,
            traction_helper_strength: 0.1,
            drift_mode: false,
        }
    }
}

impl AssistConfig {
    pub const ABS_THRESHOLD_RANGE: (f64, f64) = (0.05, 0.5);
    pub const TCS_STRENGTH_RANGE: (f64, f64) = (0.05, 1.0);
    pub const ESP_THRESHOLD_RANGE: (f64, f64) = (0.05, 0.5);
    pub const ESP_STRENGTH_RANGE: (f64, f64) = (0.05, 1.0);
    pub const HELPER_STRENGTH_RANGE: (f64, f64) = (0.0, 1.0);

    fn gains(&self) -> [(&'static str, f64, (f64, f64)); 6] {
        [
            ("abs_threshold", self.abs_threshold, Self::ABS_THRESHOLD_RANGE),
            ("tcs_strength", self.tcs_strength, Self::TCS_STRENGTH_RANGE),
            ("esp_threshold", self.esp_threshold, Self::ESP_THRESHOLD_RANGE),
            ("esp_strength", self.esp_strength, Self::ESP_STRENGTH_RANGE),
            (
                "steer_helper_angular_strength",
                self.steer_helper_angular_strength,
                Self::HELPER_STRENGTH_RANGE,
            ),
            (
                "traction_helper_strength",
                self.traction_helper_strength,
                Self::HELPER_STRENGTH_RANGE,
            ),
        ]
    }

    fn range_issues(&self) -> Vec<ConfigIssue> {
        let mut issues: Vec<ConfigIssue> = self
            .gains()
            .into_iter()
            .filter(|(_, value, (min, max))| !(min..=max).contains(&value))
            .map(|(name, value, (min, max))| ConfigIssue::GainOutOfRange { name, value, min, max })
            .collect();

        let (min, max) = Self::HELPER_STRENGTH_RANGE;
        if !(min..=max).contains(&self.steer_helper_linear_strength) {
            issues.push(ConfigIssue::GainOutOfRange {
                name: "steer_helper_linear_strength",
                value: self.steer_helper_linear_strength,
                min,
                max,
            });
        }
        issues
    }

    /// A copy with every gain clamped into its supported range.
    pub fn clamped(&self) -> Self {
        let clamp = |v: f64, (min, max): (f64, f64)| v.clamp(min, max);
        Self {
            abs_threshold: clamp(self.abs_threshold, Self::ABS_THRESHOLD_RANGE),
            tcs_strength: clamp(self.tcs_strength, Self::TCS_STRENGTH_RANGE),
            esp_threshold: clamp(self.esp_threshold, Self::ESP_THRESHOLD_RANGE),
            esp_strength: clamp(self.esp_strength, Self::ESP_STRENGTH_RANGE),
            steer_helper_linear_strength: clamp(
                self.steer_helper_linear_strength,
                Self::HELPER_STRENGTH_RANGE,
            ),
            steer_helper_angular_strength: clamp(
                self.steer_helper_angular_strength,
                Self::HELPER_STRENGTH_RANGE,
            ),
            traction_helper_strength: clamp(self.traction_helper_strength, Self::HELPER_STRENGTH_RANGE),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntiRollConfig {
    /// Front axle anti-roll coefficient [N per unit travel difference].
    pub front: f64,
    pub rear: f64,
    /// Front-to-rear (pitch) coefficient. Usually 0.
    pub vertical: f64,
}

impl Default for AntiRollConfig {
    fn default() -> Self {
        Self {
            front: 1000.0,
            rear: 1000.0,
            vertical: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelConfig {
    /// Whether the tank drains at all.
    pub consumption: bool,
    /// Tank capacity [l].
    pub capacity: f64,
    /// Fuel at spawn [l].
    pub initial: f64,
    /// Litres per second at 10 000 RPM.
    pub consumption_rate: f64,
}

impl Default for FuelConfig {
    fn default() -> Self {
        Self {
            consumption: false,
            capacity: 62.0,
            initial: 62.0,
            consumption_rate: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    pub enabled: bool,
    /// Seconds of boost in a full tank.
    pub capacity: f64,
    /// Tank units drained per second of boosting.
    pub consumption: f64,
    /// Tank units regained per second while not boosting.
    pub regeneration: f64,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 5.0,
            consumption: 1.0,
            regeneration: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    pub position: WheelPosition,
    /// Suspension top anchor in the body frame [m].
    pub mount: Vector3<f64>,
    pub radius: f64,
    /// Full suspension travel [m].
    pub suspension_distance: f64,
    pub can_power: bool,
    pub power_multiplier: f64,
    pub can_brake: bool,
    pub brake_multiplier: f64,
    pub can_handbrake: bool,
    pub handbrake_multiplier: f64,
    pub can_steer: bool,
    pub steer_multiplier: f64,
    /// [deg]
    pub camber: f64,
    /// [deg]
    pub caster: f64,
    /// Toe-in [deg]. Positive points both wheels of an axle inward.
    pub toe: f64,
    pub forward_friction: FrictionCurve,
    pub sideways_friction: FrictionCurve,
    pub deflated_radius_multiplier: f64,
    pub deflated_stiffness_multiplier: f64,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            position: WheelPosition::FrontLeft,
            mount: Vector3::zeros(),
            radius: 0.35,
            suspension_distance: 0.2,
            can_power: true,
            power_multiplier: 1.0,
            can_brake: true,
            brake_multiplier: 1.0,
            can_handbrake: false,
            handbrake_multiplier: 2.5,
            can_steer: false,
            steer_multiplier: 1.0,
            camber: 0.0,
            caster: 0.0,
            toe: 0.0,
            forward_friction: FrictionCurve::forward(),
            sideways_friction: FrictionCurve::sideways(),
            deflated_radius_multiplier: 0.8,
            deflated_stiffness_multiplier: 0.5,
        }
    }
}

impl WheelConfig {
    /// A wheel at `position` with the capabilities a road car gives it:
    /// front wheels steer, rear wheels take the handbrake.
    pub fn for_position(position: WheelPosition, mount: Vector3<f64>) -> Self {
        let front = position.axle() == Axle::Front;
        Self {
            position,
            mount,
            can_steer: front,
            can_handbrake: !front,
            ..Self::default()
        }
    }

    /// Four wheels with the given half wheelbase, half track and mount height
    /// below the body origin.
    pub fn four_wheel_layout(half_wheelbase: f64, track: f64, drop: f64) -> Vec<Self> {
        let half_track = track / 2.0;
        vec![
            Self::for_position(
                WheelPosition::FrontLeft,
                Vector3::new(half_wheelbase, half_track, -drop + 0.5),
            ),
            Self::for_position(
                WheelPosition::FrontRight,
                Vector3::new(half_wheelbase, -half_track, -drop + 0.5),
            ),
            Self::for_position(
                WheelPosition::RearLeft,
                Vector3::new(-half_wheelbase, half_track, -drop + 0.5),
            ),
            Self::for_position(
                WheelPosition::RearRight,
                Vector3::new(-half_wheelbase, -half_track, -drop + 0.5),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_clean() {
        let issues = VehicleConfig::default().validate();
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn inverted_rpm_bands_are_reported() {
        let mut config = VehicleConfig::default();
        config.engine.min_rpm = 8000.0;
        config.gearbox.shift_up_rpm = 3000.0;
        config.gearbox.shift_down_rpm = 3200.0;

        let issues = config.validate();
        assert!(issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::MinRpmAboveMax { .. })));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ConfigIssue::ShiftUpBelowShiftDown { .. })));

        let message = issues[0].to_string();
        assert!(message.contains("minimum engine RPM"));
    }

    #[test]
    fn narrow_shift_band_is_reported() {
        let mut config = VehicleConfig::default();
        config.gearbox.shift_up_rpm = 5000.0;
        config.gearbox.shift_down_rpm = 4800.0;
        assert!(config
            .validate()
            .contains(&ConfigIssue::ShiftBandTooNarrow { gap: 200.0, required: MIN_RPM_BAND }));
    }

    #[test]
    fn front_drive_without_powered_front_wheels_is_reported() {
        let mut config = VehicleConfig::default();
        config.drivetrain = DrivetrainMode::Fwd;
        for wheel in config.wheels.iter_mut().filter(|w| w.position.is_front()) {
            wheel.can_power = false;
        }
        assert!(config
            .validate()
            .contains(&ConfigIssue::NoPoweredWheels(DrivetrainMode::Fwd)));
    }

    #[test]
    fn gains_are_clamped_and_reported() {
        let mut config = VehicleConfig::default();
        config.assists.tcs_strength = 3.0;
        assert!(config.validate().iter().any(|i| matches!(
            i,
            ConfigIssue::GainOutOfRange { name: "tcs_strength", .. }
        )));
        assert_eq!(config.assists.clamped().tcs_strength, 1.0);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: VehicleConfig = toml::from_str(
            r#"
            name = "hatchback"
            drivetrain = "Fwd"

            [engine]
            max_rpm = 6500.0
            "#,
        )
        .expect("partial vehicle file should parse");

        assert_eq!(config.name, "hatchback");
        assert_eq!(config.drivetrain, DrivetrainMode::Fwd);
        assert_eq!(config.engine.max_rpm, 6500.0);
        assert_eq!(config.engine.min_rpm, EngineConfig::default().min_rpm);
        assert_eq!(config.wheels.len(), 4);
    }

    #[test]
    fn applying_a_behavior_overrides_assists_and_friction() {
        let mut config = VehicleConfig::default();
        config.anti_roll.front = 100.0;
        let drift = BehaviorProfile::preset(BehaviorKind::Drift);
        config.apply_behavior(&drift);

        assert!(config.assists.drift_mode);
        assert_eq!(config.anti_roll.front, drift.anti_roll_minimum.max(100.0));
        assert_eq!(config.wheels[0].sideways_friction, drift.sideways_friction);
        assert_eq!(config.gearbox.shift_threshold, drift.gear_shift_threshold);
    }
}
