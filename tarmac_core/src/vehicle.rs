// tarmac_core/src/vehicle.rs

//! The vehicle aggregate and its fixed-step update.
//!
//! A [`Vehicle`] owns its engine, gearbox, clutch, wheels and assist state.
//! The host calls [`Vehicle::step`] once per fixed physics tick with the
//! driver input, one contact report per wheel and the chassis state, and
//! applies the returned [`StepOutput`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use nalgebra::Point3;
use tracing::{debug, warn};

use crate::assists::{anti_roll, AssistInputs, DriverAssists};
use crate::config::{BehaviorKind, EngineConfig, VehicleConfig};
use crate::context::VehicleContext;
use crate::drivetrain::{
    wheel_torque, AutoClutch, BoostTank, ClutchInputs, Engine, EngineInputs, FuelTank,
    GearboxInputs, Gearbox, TorqueRequest,
};
use crate::error::BuildError;
use crate::telemetry::{TelemetrySnapshot, VehicleEvent, VehicleObserver, WheelTelemetry};
use crate::types::{
    AppliedForce, ChassisState, DriverInput, ForceMode, StepOutput, WheelContact, WheelPosition,
};
use crate::wheel::steering::{speed_sensitive_angle, SteerSmoother};
use crate::wheel::{DriftInputs, TorqueGuard, Wheel};

/// Minimum wheel count for a drivable vehicle.
pub const MIN_WHEELS: usize = 4;

/// Driver inputs after normalization, pedal swap and every cut, as used on
/// the last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct EffectiveInputs {
    throttle: f64,
    brake: f64,
    handbrake: f64,
    steer: f64,
    boost: f64,
    clutch: f64,
}

#[cfg_attr(feature = "bevy", derive(bevy_ecs::component::Component))]
pub struct Vehicle {
    config: VehicleConfig,
    context: Arc<VehicleContext>,

    engine: Engine,
    fuel: FuelTank,
    boost: BoostTank,
    gearbox: Gearbox,
    clutch: AutoClutch,
    steer: SteerSmoother,
    wheels: Vec<Wheel>,
    assists: DriverAssists,

    observers: Vec<Box<dyn VehicleObserver>>,
    announced: bool,
    controllable: bool,

    speed_kmh: f64,
    forward_velocity: f64,
    inputs: EffectiveInputs,
}

impl fmt::Debug for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vehicle")
            .field("name", &self.config.name)
            .field("speed_kmh", &self.speed_kmh)
            .field("rpm", &self.engine.rpm())
            .field("gear", &self.gearbox.state())
            .field("wheels", &self.wheels.len())
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl Vehicle {
    /// Builds a vehicle, rejecting structurally impossible configurations.
    ///
    /// Tuning issues found by [`VehicleConfig::validate`] are logged, not rejected.
    pub fn new(mut config: VehicleConfig, context: Arc<VehicleContext>) -> Result<Self, BuildError> {
        if config.wheels.len() < MIN_WHEELS {
            return Err(BuildError::TooFewWheels(config.wheels.len()));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = config.wheels.iter().find(|w| !seen.insert(w.position)) {
            return Err(BuildError::DuplicateWheel(duplicate.position));
        }
        if context.ground_materials().is_empty() {
            return Err(BuildError::NoGroundMaterials);
        }
        if let Some(kind) = config.behavior {
            let profile = context.behavior(kind).ok_or(BuildError::UnknownBehavior(kind))?;
            config.apply_behavior(profile);
        }

        for issue in config.validate() {
            warn!(vehicle = %config.name, %issue, "vehicle configuration issue");
        }

        let wheels = config
            .wheels
            .iter()
            .map(|w| Wheel::new(w.clone(), config.drivetrain))
            .collect();

        debug!(vehicle = %config.name, wheels = config.wheels.len(), "vehicle built");
        Ok(Self {
            engine: Engine::new(&config.engine),
            fuel: FuelTank::new(&config.fuel),
            boost: BoostTank::new(&config.boost),
            gearbox: Gearbox::new(&config.gearbox, config.top_speed),
            clutch: AutoClutch::default(),
            steer: SteerSmoother::default(),
            wheels,
            assists: DriverAssists::new(&config.assists),
            observers: Vec::new(),
            announced: false,
            controllable: true,
            speed_kmh: 0.0,
            forward_velocity: 0.0,
            inputs: EffectiveInputs::default(),
            config,
            context,
        })
    }

    // =========================================================================
    // == Fixed Step ==
    // =========================================================================

    /// Runs one fixed tick. `contacts` is matched to wheels by index, in
    /// configuration order; missing entries read as ungrounded.
    pub fn step(
        &mut self,
        input: &DriverInput,
        contacts: &[WheelContact],
        chassis: &ChassisState,
        dt: f64,
    ) -> StepOutput {
        if !self.announced {
            self.announced = true;
            self.emit(VehicleEvent::Spawned);
        }
        if !(dt.is_finite() && dt > 0.0) {
            return self.hold();
        }

        // --- Chassis and contacts ---
        let local_velocity = chassis.local_velocity();
        let speed = chassis.speed_kmh();
        self.speed_kmh = if speed.is_finite() { speed } else { 0.0 };
        self.forward_velocity = if local_velocity.x.is_finite() { local_velocity.x } else { 0.0 };
        for (index, wheel) in self.wheels.iter_mut().enumerate() {
            wheel.observe(contacts.get(index), dt);
        }

        // --- Starter and fuel ---
        if self.engine.tick_starter(dt) {
            debug!(vehicle = %self.config.name, "engine started");
            self.emit(VehicleEvent::EngineStarted);
        }
        let running = self.engine.is_running();
        if running {
            self.fuel.drain(self.engine.rpm(), dt);
        }
        let fuel_input = if running && !self.fuel.is_empty() { 1.0 } else { 0.0 };

        // --- Inputs ---
        let raw = if self.controllable {
            input.normalized()
        } else {
            DriverInput::default()
        };
        let steer = self.steer.update(raw.steer, self.config.steering.steer_rate, dt);
        let (pedal_throttle, pedal_brake) = if self.gearbox.direction() == -1 {
            (raw.brake, raw.throttle)
        } else {
            (raw.throttle, raw.brake)
        };
        let boost = self.boost.update(raw.boost, dt);
        let cut_gas = self.engine.update_limiter();
        let over_limit = self.config.limit_speed.is_some_and(|limit| self.speed_kmh > limit);
        let mut throttle = if cut_gas || over_limit || self.gearbox.is_shifting() || fuel_input == 0.0 {
            0.0
        } else {
            pedal_throttle
        };

        // --- Engine ---
        let powered: Vec<&Wheel> = self
            .wheels
            .iter()
            .filter(|w| w.is_powered() && w.is_enabled())
            .collect();
        let powered_count = powered.len();
        let traction_rpm: f64 = powered.iter().map(|w| w.rpm().abs()).sum();
        let traction_speed = powered
            .iter()
            .map(|w| w.rpm().abs() * std::f64::consts::TAU * w.radius() * 60.0 / 1000.0)
            .sum::<f64>()
            / powered_count.max(1) as f64;

        let gear_ratio = self.gearbox.current_gear().ratio;
        self.engine.update(&EngineInputs {
            throttle,
            clutch: self.clutch.value(),
            fuel_input,
            traction_rpm,
            powered_count,
            gear_ratio,
            dt,
        });

        // --- Gearbox and clutch ---
        let change = self.gearbox.update(&GearboxInputs {
            speed_kmh: self.speed_kmh,
            forward_velocity: self.forward_velocity,
            rpm: self.engine.rpm(),
            throttle: pedal_throttle,
            brake: pedal_brake,
            dt,
        });
        if let Some(change) = change {
            debug!(vehicle = %self.config.name, from = ?change.from, to = ?change.to, "gear changed");
            self.emit(VehicleEvent::GearChanged {
                from: change.from,
                to: change.to,
            });
        }
        if self.gearbox.is_shifting() {
            throttle = 0.0;
        }

        let first_gear_shift_speed = self
            .gearbox
            .table()
            .gear(0)
            .map_or(0.0, |g| g.target_shift_speed);
        let clutch = if self.gearbox.is_neutral() {
            self.clutch.set_manual(1.0)
        } else if self.config.gearbox.automatic_clutch {
            self.clutch.update(&ClutchInputs {
                throttle,
                handbrake: raw.handbrake,
                speed_kmh: self.speed_kmh,
                traction_speed,
                gear: self.gearbox.gear(),
                first_gear_shift_speed,
                shifting: self.gearbox.is_shifting(),
                neutral: false,
                cut_gas,
                dt,
            })
        } else {
            self.clutch.set_manual(raw.clutch)
        };

        // --- Wheel requests ---
        let current_gear = self.gearbox.current_gear();
        let request = TorqueRequest {
            engine_torque: self.engine.torque(),
            direction: f64::from(self.gearbox.direction()),
            clutch,
            throttle,
            boost,
            powered_count,
        };
        let guard = TorqueGuard {
            speed_kmh: self.speed_kmh,
            top_speed: self.config.top_speed.max(1.0),
            engine_running: running,
            gear_max_speed: current_gear.max_speed,
            rpm: self.engine.rpm(),
            max_rpm: self.engine.max_rpm(),
        };
        let base_angle = speed_sensitive_angle(&self.config.steering, self.speed_kmh);
        let brake_torque = self.config.brakes.brake_torque;

        for wheel in &mut self.wheels {
            let wheel_config = wheel.config();
            let torque = wheel_torque(&request, wheel_config.power_multiplier, wheel.axle_share());

            let mut brake = if wheel_config.can_brake {
                brake_torque * pedal_brake * wheel_config.brake_multiplier
            } else {
                0.0
            };
            if wheel_config.can_handbrake {
                brake = brake.max(brake_torque * raw.handbrake * wheel_config.handbrake_multiplier);
            }

            wheel.apply_motor_torque(torque, &guard);
            wheel.apply_brake_torque(brake);
            wheel.apply_steering(steer, base_angle, &self.config.steering);
        }

        // --- Assists ---
        let previous = *self.assists.state();
        let correction = self.assists.apply(
            &mut self.wheels,
            chassis,
            &self.context,
            &AssistInputs {
                brake: pedal_brake,
                handbrake: raw.handbrake,
                brake_torque,
                dt,
            },
        );
        let transitions = previous.transitions(self.assists.state());
        for (kind, engaged) in transitions {
            self.emit(if engaged {
                VehicleEvent::AssistEngaged(kind)
            } else {
                VehicleEvent::AssistReleased(kind)
            });
        }

        // --- Friction ---
        let drift = self.assists.config().drift_mode;
        let context = Arc::clone(&self.context);
        for wheel in &mut self.wheels {
            let ground = context.ground(wheel.contact().ground_material);
            let drift_inputs = drift.then(|| DriftInputs {
                lateral_velocity: local_velocity.y,
                forward_slip: wheel.forward_slip(),
            });
            wheel.update_friction(ground, raw.handbrake, drift_inputs);
        }

        // --- Chassis forces ---
        let mut forces = anti_roll::forces(chassis, &self.wheels, &self.config.anti_roll);
        if self.config.downforce != 0.0 {
            forces.push(AppliedForce {
                force: -chassis.up() * self.config.downforce * self.speed_kmh,
                point: Point3::from(chassis.pose.translation.vector),
                mode: ForceMode::Force,
            });
        }

        self.inputs = EffectiveInputs {
            throttle,
            brake: pedal_brake,
            handbrake: raw.handbrake,
            steer,
            boost,
            clutch,
        };

        let mut output = StepOutput::new(self.wheels.iter().map(Wheel::command).collect());
        output.forces = forces;
        if let Some(correction) = correction {
            output.relative_torque = correction.relative_torque;
            output.linear_velocity_override = correction.linear_velocity;
        }
        output
    }

    /// Output for a skipped tick: the last wheel commands, no forces.
    fn hold(&self) -> StepOutput {
        StepOutput::new(self.wheels.iter().map(Wheel::command).collect())
    }

    // =========================================================================
    // == Driver and Host Hooks ==
    // =========================================================================

    pub fn start_engine(&mut self) {
        self.engine.start();
    }

    pub fn start_engine_instant(&mut self) {
        if !self.engine.is_running() {
            self.engine.start_instant();
            self.emit(VehicleEvent::EngineStarted);
        }
    }

    pub fn kill_engine(&mut self) {
        if self.engine.is_running() || self.engine.is_starting() {
            let was_running = self.engine.is_running();
            self.engine.kill();
            if was_running {
                debug!(vehicle = %self.config.name, "engine stopped");
                self.emit(VehicleEvent::EngineStopped);
            }
        }
    }

    pub fn refuel(&mut self, amount: f64) {
        self.fuel.refuel(amount);
    }

    pub fn shift_up(&mut self) -> bool {
        self.gearbox.shift_up()
    }

    pub fn shift_down(&mut self) -> bool {
        self.gearbox.shift_down()
    }

    pub fn shift_to_neutral(&mut self) -> bool {
        self.gearbox.shift_to_neutral()
    }

    /// While false, every driver input reads as released.
    pub fn set_controllable(&mut self, controllable: bool) {
        self.controllable = controllable;
    }

    pub fn notify_collision(&mut self, impulse: f64) {
        self.emit(VehicleEvent::Collision { impulse });
    }

    fn wheel_mut(&mut self, position: WheelPosition) -> Option<&mut Wheel> {
        self.wheels.iter_mut().find(|w| w.position() == position)
    }

    /// Returns false if no wheel sits at `position`.
    pub fn deflate_wheel(&mut self, position: WheelPosition) -> bool {
        let Some(wheel) = self.wheel_mut(position) else {
            return false;
        };
        if wheel.deflate() {
            self.emit(VehicleEvent::WheelDeflated(position));
        }
        true
    }

    pub fn inflate_wheel(&mut self, position: WheelPosition) -> bool {
        let Some(wheel) = self.wheel_mut(position) else {
            return false;
        };
        if wheel.inflate() {
            self.emit(VehicleEvent::WheelInflated(position));
        }
        true
    }

    pub fn set_wheel_enabled(&mut self, position: WheelPosition, enabled: bool) -> bool {
        let Some(wheel) = self.wheel_mut(position) else {
            return false;
        };
        if wheel.is_enabled() != enabled {
            wheel.set_enabled(enabled);
            self.emit(VehicleEvent::WheelEnabled(position, enabled));
        }
        true
    }

    /// Re-inflates and re-enables every wheel.
    pub fn repair(&mut self) {
        for wheel in &mut self.wheels {
            wheel.inflate();
            wheel.set_enabled(true);
        }
        self.emit(VehicleEvent::Repaired);
    }

    /// Applies a behavior profile from the context at runtime.
    pub fn apply_behavior(&mut self, kind: BehaviorKind) -> Result<(), BuildError> {
        let profile = self
            .context
            .behavior(kind)
            .ok_or(BuildError::UnknownBehavior(kind))?
            .clone();
        self.config.apply_behavior(&profile);
        self.config.behavior = Some(kind);
        self.assists.sync_config(&self.config.assists);
        self.gearbox.sync_config(&self.config.gearbox, self.config.top_speed);
        for wheel in &mut self.wheels {
            wheel.set_base_friction(profile.forward_friction, profile.sideways_friction);
        }
        debug!(vehicle = %self.config.name, ?kind, "behavior applied");
        Ok(())
    }

    /// Replaces the engine tunables at runtime. The torque curve is rebuilt
    /// only when one of its defining parameters changed.
    pub fn set_engine_config(&mut self, engine: EngineConfig) {
        self.config.engine = engine;
        for issue in self.config.validate() {
            warn!(vehicle = %self.config.name, %issue, "vehicle configuration issue");
        }
        self.engine.sync_config(&self.config.engine);
    }

    // --- Observers ---

    pub fn add_observer(&mut self, observer: Box<dyn VehicleObserver>) {
        self.observers.push(observer);
    }

    fn emit(&mut self, event: VehicleEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }

    // =========================================================================
    // == Accessors ==
    // =========================================================================

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<VehicleContext> {
        &self.context
    }

    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    pub fn wheel(&self, position: WheelPosition) -> Option<&Wheel> {
        self.wheels.iter().find(|w| w.position() == position)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn gearbox(&self) -> &Gearbox {
        &self.gearbox
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    pub fn direction(&self) -> i8 {
        self.gearbox.direction()
    }

    pub fn fuel(&self) -> f64 {
        self.fuel.level()
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            speed_kmh: self.speed_kmh,
            rpm: self.engine.rpm(),
            raw_rpm: self.engine.raw_rpm(),
            gear: self.gearbox.state(),
            direction: self.gearbox.direction(),
            clutch: self.inputs.clutch,
            throttle: self.inputs.throttle,
            brake: self.inputs.brake,
            handbrake: self.inputs.handbrake,
            steer: self.inputs.steer,
            boost: self.inputs.boost,
            boost_level: self.boost.level(),
            fuel: self.fuel.level(),
            fuel_capacity: self.fuel.capacity(),
            peak_torque: self.engine.peak_torque(),
            engine_running: self.engine.is_running(),
            cut_gas: self.engine.is_cutting_gas(),
            assists: *self.assists.state(),
            wheels: self
                .wheels
                .iter()
                .map(|w| WheelTelemetry {
                    position: w.position(),
                    grounded: w.is_grounded(),
                    enabled: w.is_enabled(),
                    deflated: w.is_deflated(),
                    forward_slip: w.forward_slip(),
                    sideways_slip: w.sideways_slip(),
                    total_slip: w.total_slip(),
                    rpm: w.rpm(),
                    motor_torque: w.motor_torque(),
                    brake_torque: w.brake_torque(),
                    steer_angle: w.steer_angle(),
                })
                .collect(),
        }
    }
}

impl Drop for Vehicle {
    fn drop(&mut self) {
        self.emit(VehicleEvent::Despawned);
    }
}
