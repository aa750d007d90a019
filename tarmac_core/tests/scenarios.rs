// tarmac_core/tests/scenarios.rs

//! End-to-end checks that drive a whole `Vehicle` through `step`.

use std::sync::{Arc, Mutex};

use approx::assert_abs_diff_eq;
use nalgebra::{Point3, Vector3};
use tarmac_core::assists::anti_roll;
use tarmac_core::prelude::*;

const DT: f64 = 0.02;

fn context() -> Arc<VehicleContext> {
    Arc::new(VehicleContext::default())
}

fn vehicle(config: VehicleConfig) -> Vehicle {
    Vehicle::new(config, context()).expect("valid vehicle")
}

/// A grounded contact sitting `drop` metres below the wheel's mount, with
/// the chassis at the origin.
fn contact_below(wheel: &WheelConfig, drop: f64) -> WheelContact {
    WheelContact {
        grounded: true,
        point: Point3::from(wheel.mount - Vector3::z() * drop),
        normal: Vector3::z(),
        ..WheelContact::default()
    }
}

fn resting_contacts(config: &VehicleConfig) -> Vec<WheelContact> {
    config
        .wheels
        .iter()
        .map(|w| contact_below(w, w.radius + w.suspension_distance / 2.0))
        .collect()
}

fn index_of(config: &VehicleConfig, position: WheelPosition) -> usize {
    config
        .wheels
        .iter()
        .position(|w| w.position == position)
        .expect("wheel present")
}

// =========================================================================
// == Scenarios ==
// =========================================================================

#[test]
fn engine_off_cuts_throttle_and_spins_down() {
    let config = VehicleConfig {
        engine: EngineConfig {
            start_running: false,
            ..EngineConfig::default()
        },
        ..VehicleConfig::default()
    };
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    let gas = DriverInput {
        throttle: 1.0,
        ..DriverInput::default()
    };

    car.step(&gas, &contacts, &ChassisState::default(), DT);
    assert_abs_diff_eq!(car.telemetry().throttle, 0.0);

    let mut last = car.telemetry().rpm;
    for _ in 0..200 {
        let output = car.step(&gas, &contacts, &ChassisState::default(), DT);
        assert!(output.wheels.iter().all(|w| w.motor_torque == 0.0));
        let rpm = car.telemetry().rpm;
        assert!(rpm <= last + 1e-9, "rpm rose from {last} to {rpm}");
        last = rpm;
    }
    assert!(last < 50.0);
}

#[test]
fn holding_the_brake_at_a_standstill_selects_reverse() {
    let config = VehicleConfig::default();
    let delay = config.gearbox.shift_delay;
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    let brake = DriverInput {
        brake: 0.95,
        ..DriverInput::default()
    };

    car.step(&brake, &contacts, &ChassisState::default(), DT);
    assert!(car.gearbox().is_shifting());

    let ticks = (delay / DT).ceil() as usize + 1;
    for _ in 0..ticks {
        car.step(&brake, &contacts, &ChassisState::default(), DT);
    }
    assert_eq!(car.telemetry().gear, GearState::Reverse);
    assert_eq!(car.direction(), -1);
}

#[test]
fn traction_control_trims_a_spinning_rear_wheel() {
    let mut ground = GroundMaterial::standard_set();
    ground[0].slip_threshold = 0.3;
    let context = Arc::new(VehicleContext::new(ground, BehaviorProfile::presets()));

    let mut config = VehicleConfig::default();
    config.assists.tcs_strength = 0.5;
    let rl = index_of(&config, WheelPosition::RearLeft);
    let rr = index_of(&config, WheelPosition::RearRight);

    let mut contacts = resting_contacts(&config);
    for index in [rl, rr] {
        contacts[index].rpm = 100.0;
    }
    contacts[rl].forward_slip = 0.6;

    let mut car = Vehicle::new(config, context).expect("valid vehicle");
    let gas = DriverInput {
        throttle: 1.0,
        ..DriverInput::default()
    };

    let mut driven_ticks = 0;
    for _ in 0..40 {
        let output = car.step(&gas, &contacts, &ChassisState::default(), DT);
        assert!(car.telemetry().assists.tcs_engaged);
        let requested = output.wheels[rr].motor_torque;
        let trimmed = output.wheels[rl].motor_torque;
        assert!(trimmed >= 0.0);
        assert!(trimmed <= requested * 0.7 + 1e-9);
        if requested > 0.0 {
            driven_ticks += 1;
            assert_abs_diff_eq!(trimmed, requested * 0.7, epsilon = 1e-9);
        }
    }
    assert!(driven_ticks > 0, "rear wheels were never driven");
    assert!(car.telemetry().assists.tcs_engaged);
}

#[test]
fn understeer_brakes_only_the_front_axle() {
    let config = VehicleConfig::default();
    let mut contacts = resting_contacts(&config);
    for (contact, wheel) in contacts.iter_mut().zip(&config.wheels) {
        contact.sideways_slip = if wheel.position.is_front() { 0.3 } else { -0.1 };
    }
    let fl = index_of(&config, WheelPosition::FrontLeft);
    let mut car = vehicle(config);

    let output = car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
    let assists = car.telemetry().assists;
    assert!(assists.understeer);
    assert!(!assists.oversteer);

    for wheel in output.wheels.iter().filter(|w| !w.position.is_front()) {
        assert_abs_diff_eq!(wheel.brake_torque, 0.0);
    }
    // Negative rear slip is corrected on the front-left wheel.
    assert!(output.wheels[fl].brake_torque > 0.0);
}

// =========================================================================
// == Invariants ==
// =========================================================================

#[test]
fn rpm_stays_in_bounds_under_arbitrary_inputs() {
    let config = VehicleConfig::default();
    let ceiling = config.engine.max_rpm + tarmac_core::drivetrain::RPM_HEADROOM;
    let mut contacts = resting_contacts(&config);
    let mut car = vehicle(config);

    for tick in 0..2000 {
        let phase = tick as f64 * 0.05;
        let input = DriverInput {
            throttle: phase.sin().abs(),
            brake: (phase * 0.3).cos().max(0.0) * 0.5,
            steer: (phase * 0.7).sin(),
            handbrake: if tick % 400 < 20 { 1.0 } else { 0.0 },
            ..DriverInput::default()
        };
        for contact in contacts.iter_mut() {
            contact.rpm = (phase * 1.3).sin() * 3000.0;
            contact.forward_slip = (phase * 2.1).sin() * 0.8;
        }
        let dt = if tick % 97 == 0 { 0.0 } else { DT * (1.0 + (phase * 3.0).sin() * 0.5) };
        car.step(&input, &contacts, &ChassisState::default(), dt);

        let telemetry = car.telemetry();
        assert!(telemetry.raw_rpm >= 0.0 && telemetry.raw_rpm <= ceiling);
        assert!(telemetry.rpm >= 0.0 && telemetry.rpm <= ceiling);
    }
}

#[test]
fn throttle_is_zero_and_gear_frozen_while_shifting() {
    let config = VehicleConfig::default();
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    let gas = DriverInput {
        throttle: 1.0,
        ..DriverInput::default()
    };

    assert!(car.shift_up());
    let mut shifting_ticks = 0;
    loop {
        let output = car.step(&gas, &contacts, &ChassisState::default(), DT);
        if !car.gearbox().is_shifting() {
            break;
        }
        shifting_ticks += 1;
        assert_eq!(car.gearbox().gear(), 0);
        assert_abs_diff_eq!(car.telemetry().throttle, 0.0);
        assert!(output.wheels.iter().all(|w| w.motor_torque == 0.0));
        assert!(shifting_ticks < 1000, "shift never committed");
    }
    assert!(shifting_ticks > 0);
    assert_eq!(car.gearbox().gear(), 1);
}

#[test]
fn abs_zeroes_the_brake_on_a_locked_wheel() {
    let config = VehicleConfig::default();
    let fl = index_of(&config, WheelPosition::FrontLeft);
    let mut contacts = resting_contacts(&config);
    contacts[fl].forward_slip = -0.5;
    let mut car = vehicle(config);

    let stop = DriverInput {
        brake: 1.0,
        ..DriverInput::default()
    };
    let output = car.step(&stop, &contacts, &ChassisState::default(), DT);
    assert_abs_diff_eq!(output.wheels[fl].brake_torque, 0.0);
    assert!(output
        .wheels
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != fl)
        .all(|(_, w)| w.brake_torque > 0.0));
    assert!(car.telemetry().assists.abs_engaged);
}

#[test]
fn level_chassis_has_no_anti_roll_force() {
    let config = VehicleConfig::default();
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);

    let forces = anti_roll::forces(&ChassisState::default(), car.wheels(), &car.config().anti_roll);
    assert!(!forces.is_empty());
    for force in forces {
        assert_abs_diff_eq!(force.force.norm(), 0.0, epsilon = 1e-9);
    }
}

#[test]
fn missing_contacts_read_as_airborne() {
    let config = VehicleConfig::default();
    let mut car = vehicle(config);
    let output = car.step(&DriverInput::default(), &[], &ChassisState::default(), DT);
    assert_eq!(output.wheels.len(), 4);
    assert!(car.wheels().iter().all(|w| !w.is_grounded()));
    // Airborne wheels disable the steering helper.
    assert!(output.linear_velocity_override.is_none());
    assert_abs_diff_eq!(output.relative_torque.norm(), 0.0);
}

#[test]
fn deflating_a_wheel_shrinks_its_command_radius() {
    let config = VehicleConfig::default();
    let rr = index_of(&config, WheelPosition::RearRight);
    let radius = config.wheels[rr].radius;
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);

    assert!(car.deflate_wheel(WheelPosition::RearRight));
    assert!(car.deflate_wheel(WheelPosition::RearRight));
    let output = car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
    assert_abs_diff_eq!(output.wheels[rr].radius, radius * 0.8);

    car.repair();
    let output = car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
    assert_abs_diff_eq!(output.wheels[rr].radius, radius);
}

#[test]
fn engine_start_waits_for_the_starter() {
    let config = VehicleConfig {
        engine: EngineConfig {
            start_running: false,
            start_delay: 1.0,
            ..EngineConfig::default()
        },
        ..VehicleConfig::default()
    };
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    car.start_engine();

    for _ in 0..45 {
        car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
        assert!(!car.telemetry().engine_running);
    }
    for _ in 0..10 {
        car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
    }
    assert!(car.telemetry().engine_running);
}

#[test]
fn instant_start_skips_the_starter() {
    let config = VehicleConfig {
        engine: EngineConfig {
            start_running: false,
            start_delay: 1.0,
            ..EngineConfig::default()
        },
        ..VehicleConfig::default()
    };
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    let events = record_events(&mut car);

    car.start_engine_instant();
    car.start_engine_instant();
    car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);

    assert!(car.telemetry().engine_running);
    let starts = recorded(&events)
        .iter()
        .filter(|e| **e == VehicleEvent::EngineStarted)
        .count();
    assert_eq!(starts, 1);
}

#[test]
fn empty_tank_makes_no_power() {
    let config = VehicleConfig {
        fuel: FuelConfig {
            consumption: true,
            capacity: 1.0,
            initial: 0.0,
            consumption_rate: 1.0,
        },
        ..VehicleConfig::default()
    };
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    let gas = DriverInput {
        throttle: 1.0,
        ..DriverInput::default()
    };
    for _ in 0..50 {
        let output = car.step(&gas, &contacts, &ChassisState::default(), DT);
        assert!(output.wheels.iter().all(|w| w.motor_torque == 0.0));
    }
    assert!(car.telemetry().engine_running);
    assert_abs_diff_eq!(car.telemetry().throttle, 0.0);
}

#[test]
fn positive_steer_turns_the_front_wheels_left() {
    let config = VehicleConfig::default();
    let contacts = resting_contacts(&config);
    let fl = index_of(&config, WheelPosition::FrontLeft);
    let fr = index_of(&config, WheelPosition::FrontRight);
    let mut car = vehicle(config);
    let left = DriverInput {
        steer: 1.0,
        ..DriverInput::default()
    };
    let mut output = car.step(&left, &contacts, &ChassisState::default(), DT);
    for _ in 0..50 {
        output = car.step(&left, &contacts, &ChassisState::default(), DT);
    }
    let (inner, outer) = (output.wheels[fl].steer_angle, output.wheels[fr].steer_angle);
    assert!(inner > outer && outer > 0.0);
}

// =========================================================================
// == Runtime hooks ==
// =========================================================================

fn record_events(car: &mut Vehicle) -> Arc<Mutex<Vec<VehicleEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    car.add_observer(Box::new(move |event: &VehicleEvent| {
        if let Ok(mut events) = sink.lock() {
            events.push(*event);
        }
    }));
    events
}

fn recorded(events: &Arc<Mutex<Vec<VehicleEvent>>>) -> Vec<VehicleEvent> {
    events.lock().expect("event sink").clone()
}

#[test]
fn drift_profile_applied_at_runtime_turns_abs_off() {
    let config = VehicleConfig::default();
    let fl = index_of(&config, WheelPosition::FrontLeft);
    let mut contacts = resting_contacts(&config);
    contacts[fl].forward_slip = -0.5;
    let mut car = vehicle(config);

    car.apply_behavior(BehaviorKind::Drift).expect("drift preset present");
    let profile = BehaviorProfile::preset(BehaviorKind::Drift);
    assert_eq!(car.config().behavior, Some(BehaviorKind::Drift));
    assert!(car.config().assists.drift_mode);
    assert!(!car.config().assists.abs);
    assert_abs_diff_eq!(car.config().gearbox.shift_threshold, profile.gear_shift_threshold);
    assert!(car.config().anti_roll.rear >= profile.anti_roll_minimum);

    let stop = DriverInput {
        brake: 1.0,
        ..DriverInput::default()
    };
    let output = car.step(&stop, &contacts, &ChassisState::default(), DT);
    assert!(output.wheels[fl].brake_torque > 0.0);
    assert!(!car.telemetry().assists.abs_engaged);
}

#[test]
fn unknown_behavior_is_rejected_and_leaves_the_config_alone() {
    let presets = BehaviorProfile::presets()
        .into_iter()
        .filter(|p| p.kind != BehaviorKind::Drift)
        .collect();
    let context = Arc::new(VehicleContext::new(GroundMaterial::standard_set(), presets));
    let mut car = Vehicle::new(VehicleConfig::default(), context).expect("valid vehicle");
    let before = car.config().clone();

    assert_eq!(
        car.apply_behavior(BehaviorKind::Drift),
        Err(BuildError::UnknownBehavior(BehaviorKind::Drift))
    );
    assert_eq!(car.config(), &before);
    assert!(car.apply_behavior(BehaviorKind::Racing).is_ok());
}

#[test]
fn disabled_wheel_gets_no_torque_and_leaves_the_powered_share() {
    let config = VehicleConfig::default();
    let rl = index_of(&config, WheelPosition::RearLeft);
    let rr = index_of(&config, WheelPosition::RearRight);
    let mut contacts = resting_contacts(&config);
    for index in [rl, rr] {
        contacts[index].rpm = 100.0;
    }

    let mut shared = vehicle(config.clone());
    let mut alone = vehicle(config);
    let events = record_events(&mut alone);
    assert!(alone.set_wheel_enabled(WheelPosition::RearLeft, false));
    assert!(alone.set_wheel_enabled(WheelPosition::RearLeft, false));
    assert_eq!(
        recorded(&events),
        vec![VehicleEvent::WheelEnabled(WheelPosition::RearLeft, false)]
    );

    let gas = DriverInput {
        throttle: 1.0,
        ..DriverInput::default()
    };
    let mut driven_ticks = 0;
    for _ in 0..40 {
        let both = shared.step(&gas, &contacts, &ChassisState::default(), DT);
        let one = alone.step(&gas, &contacts, &ChassisState::default(), DT);
        assert_abs_diff_eq!(one.wheels[rl].motor_torque, 0.0);
        if both.wheels[rr].motor_torque > 0.0 {
            driven_ticks += 1;
            assert_abs_diff_eq!(
                one.wheels[rr].motor_torque,
                2.0 * both.wheels[rr].motor_torque,
                epsilon = 1e-6
            );
        }
    }
    assert!(driven_ticks > 0, "rear wheels were never driven");

    let stop = DriverInput {
        brake: 1.0,
        ..DriverInput::default()
    };
    let output = alone.step(&stop, &contacts, &ChassisState::default(), DT);
    assert_abs_diff_eq!(output.wheels[rl].brake_torque, 0.0);
    assert!(output.wheels[rr].brake_torque > 0.0);
}

#[test]
fn inflating_restores_the_radius_once() {
    let config = VehicleConfig::default();
    let fr = index_of(&config, WheelPosition::FrontRight);
    let radius = config.wheels[fr].radius;
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    let events = record_events(&mut car);

    assert!(car.deflate_wheel(WheelPosition::FrontRight));
    let output = car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
    assert!(output.wheels[fr].radius < radius);

    assert!(car.inflate_wheel(WheelPosition::FrontRight));
    assert!(car.inflate_wheel(WheelPosition::FrontRight));
    let output = car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
    assert_abs_diff_eq!(output.wheels[fr].radius, radius);

    let inflated = recorded(&events)
        .into_iter()
        .filter(|e| *e == VehicleEvent::WheelInflated(WheelPosition::FrontRight))
        .count();
    assert_eq!(inflated, 1);
}

#[test]
fn collisions_reach_observers() {
    let mut car = vehicle(VehicleConfig::default());
    let events = record_events(&mut car);
    car.notify_collision(1250.0);
    assert!(recorded(&events).contains(&VehicleEvent::Collision { impulse: 1250.0 }));
}

#[test]
fn shifting_to_neutral_drops_the_drive_direction() {
    let config = VehicleConfig::default();
    let delay = config.gearbox.shift_delay;
    let contacts = resting_contacts(&config);
    let mut car = vehicle(config);
    assert_eq!(car.direction(), 1);

    assert!(car.shift_to_neutral());
    assert!(!car.shift_to_neutral(), "already shifting");
    let ticks = (delay / DT).ceil() as usize + 1;
    let mut output = car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
    for _ in 0..ticks {
        output = car.step(&DriverInput::default(), &contacts, &ChassisState::default(), DT);
    }
    assert_eq!(car.telemetry().gear, GearState::Neutral);
    assert_eq!(car.direction(), 0);
    assert!(output.wheels.iter().all(|w| w.motor_torque == 0.0));
}

#[test]
fn refuel_tops_up_to_capacity() {
    let config = VehicleConfig {
        fuel: FuelConfig {
            consumption: true,
            capacity: 10.0,
            initial: 1.0,
            consumption_rate: 1.0,
        },
        ..VehicleConfig::default()
    };
    let mut car = vehicle(config);

    car.refuel(3.0);
    assert_abs_diff_eq!(car.fuel(), 4.0);
    car.refuel(-5.0);
    assert_abs_diff_eq!(car.fuel(), 4.0);
    car.refuel(100.0);
    let telemetry = car.telemetry();
    assert_abs_diff_eq!(telemetry.fuel, 10.0);
    assert_abs_diff_eq!(telemetry.fuel, telemetry.fuel_capacity);
}

#[test]
fn engine_config_swapped_at_runtime_changes_the_torque() {
    let config = VehicleConfig::default();
    let max_torque = config.engine.max_torque;
    let mut car = vehicle(config);
    let idle = car.engine().torque();
    assert_abs_diff_eq!(car.telemetry().peak_torque, max_torque, epsilon = 1e-9);

    let engine = EngineConfig {
        max_torque: max_torque * 2.0,
        ..car.config().engine.clone()
    };
    car.set_engine_config(engine);
    assert_abs_diff_eq!(car.config().engine.max_torque, max_torque * 2.0);
    assert_abs_diff_eq!(car.telemetry().peak_torque, max_torque * 2.0, epsilon = 1e-9);
    assert_abs_diff_eq!(car.engine().torque(), idle * 2.0, epsilon = 1e-9);
}
