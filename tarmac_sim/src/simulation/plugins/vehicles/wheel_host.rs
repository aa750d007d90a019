// tarmac_sim/src/simulation/plugins/vehicles/wheel_host.rs

//! The host side of a raycast wheel: turns a ground hit into the contact
//! report `tarmac_core` expects, and turns the core's wheel command back into
//! suspension and tire forces on the chassis.
//!
//! Everything here is plain nalgebra in world (ENU) and body (FLU) frames so
//! it can be tested without an `App`.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use std::f64::consts::TAU;
use tarmac_core::config::WheelConfig;
use tarmac_core::types::{AppliedForce, ChassisState, ForceMode, WheelCommand, WheelContact};
use tarmac_core::utils::math::move_towards;

pub const GRAVITY: f64 = 9.81;

/// Rotational inertia of one wheel and its share of the driveline [kg m^2].
const WHEEL_INERTIA: f64 = 1.5;
/// Below this speed [m/s] slip is normalized by a constant instead.
const MIN_SLIP_SPEED: f64 = 1.0;
const DAMPING_RATIO: f64 = 0.4;

/// What the wheel's suspension ray hit this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    /// Distance from the mount along the ray [m].
    pub distance: f64,
    pub point: Point3<f64>,
    pub normal: Vector3<f64>,
    /// Index into the ground material table.
    pub material: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suspension {
    /// [N/m]
    pub stiffness: f64,
    /// [N s/m]
    pub damping: f64,
}

impl Suspension {
    /// A spring the static load compresses to half travel.
    pub fn for_vehicle(mass: f64, wheel_count: usize, travel: f64) -> Self {
        let load = mass.max(1.0) * GRAVITY / wheel_count.max(1) as f64;
        let stiffness = load / (travel.max(0.01) * 0.5);
        let damping = 2.0 * DAMPING_RATIO * (stiffness * load / GRAVITY).sqrt();
        Self { stiffness, damping }
    }
}

/// Forward and sideways slip of a tire.
///
/// Forward slip is the surface speed of the tread minus the ground speed,
/// sideways slip the lateral ground speed (positive to the left), both
/// normalized by the forward speed.
pub fn slip(forward_speed: f64, lateral_speed: f64, surface_speed: f64) -> (f64, f64) {
    let reference = forward_speed.abs().max(MIN_SLIP_SPEED);
    (
        (surface_speed - forward_speed) / reference,
        lateral_speed / reference,
    )
}

/// Rolling direction and left direction of a steered wheel, in the ground plane.
fn tire_axes(chassis: &ChassisState, steer_angle: f64, normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let steer = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), steer_angle);
    let heading = chassis.pose.rotation * (steer * Vector3::x());
    let flat = heading - normal * heading.dot(normal);
    let forward = flat.try_normalize(1e-9).unwrap_or(heading);
    let lateral = normal.cross(&forward);
    (forward, lateral)
}

fn point_velocity(chassis: &ChassisState, point: &Point3<f64>) -> Vector3<f64> {
    let arm = point.coords - chassis.pose.translation.vector;
    chassis.linear_velocity + chassis.angular_velocity.cross(&arm)
}

#[derive(Debug, Clone)]
pub struct HostWheel {
    /// Suspension top anchor in the body frame.
    mount: Vector3<f64>,
    travel: f64,
    radius: f64,
    /// [rad/s]
    spin: f64,
    /// Suspension compression on the previous tick [m].
    compression: f64,
    hit: Option<GroundHit>,
    /// Normal load carried by the tire this tick [N].
    load: f64,
}

impl HostWheel {
    pub fn new(config: &WheelConfig) -> Self {
        Self {
            mount: config.mount,
            travel: config.suspension_distance.max(0.0),
            radius: config.radius,
            spin: 0.0,
            compression: 0.0,
            hit: None,
            load: 0.0,
        }
    }

    /// World-space origin, direction and length of the suspension ray.
    pub fn ray(&self, chassis: &ChassisState) -> (Point3<f64>, Vector3<f64>, f64) {
        let origin = chassis.pose * Point3::from(self.mount);
        let direction = -(chassis.pose.rotation * Vector3::z());
        (origin, direction, self.travel + self.radius)
    }

    pub fn spin(&self) -> f64 {
        self.spin
    }

    pub fn load(&self) -> f64 {
        self.load
    }

    /// Builds this tick's contact report. `roughness` is added to the spring
    /// force before it is reported.
    pub fn sense(
        &mut self,
        hit: Option<GroundHit>,
        chassis: &ChassisState,
        steer_angle: f64,
        suspension: &Suspension,
        roughness: f64,
        dt: f64,
    ) -> WheelContact {
        self.hit = hit;
        let rpm = self.spin * 60.0 / TAU;
        let Some(hit) = hit else {
            self.compression = 0.0;
            self.load = 0.0;
            return WheelContact {
                rpm,
                ..WheelContact::default()
            };
        };

        let compression = (self.travel + self.radius - hit.distance).clamp(0.0, self.travel);
        let rate = if dt > 0.0 {
            (compression - self.compression) / dt
        } else {
            0.0
        };
        self.compression = compression;
        self.load = (suspension.stiffness * compression + suspension.damping * rate + roughness).max(0.0);

        let (forward, lateral) = tire_axes(chassis, steer_angle, &hit.normal);
        let velocity = point_velocity(chassis, &hit.point);
        let (forward_slip, sideways_slip) =
            slip(velocity.dot(&forward), velocity.dot(&lateral), self.spin * self.radius);

        WheelContact {
            grounded: true,
            normal: hit.normal,
            point: hit.point,
            forward_slip,
            sideways_slip,
            suspension_force: self.load,
            rpm,
            ground_material: hit.material,
        }
    }

    /// Integrates wheel spin under the commanded torques and returns the
    /// suspension plus tire force at the contact point, if grounded.
    /// `mass_share` is the chassis mass this wheel carries.
    pub fn actuate(
        &mut self,
        command: &WheelCommand,
        chassis: &ChassisState,
        mass_share: f64,
        dt: f64,
    ) -> Option<AppliedForce> {
        if dt <= 0.0 {
            return None;
        }
        self.radius = command.radius.max(0.01);
        if command.motor_torque.is_finite() {
            self.spin += command.motor_torque / WHEEL_INERTIA * dt;
        }

        let force = self.hit.map(|hit| {
            let (forward, lateral) = tire_axes(chassis, command.steer_angle, &hit.normal);
            let velocity = point_velocity(chassis, &hit.point);
            let (forward_speed, lateral_speed) = (velocity.dot(&forward), velocity.dot(&lateral));
            let (forward_slip, sideways_slip) =
                slip(forward_speed, lateral_speed, self.spin * self.radius);

            // Grip drags the tread toward rolling speed, never past it.
            let rolling = forward_speed / self.radius;
            let needed = ((self.spin - rolling) * WHEEL_INERTIA / (self.radius * dt)).abs();
            let longitudinal = (command.forward_friction.evaluate(forward_slip) * self.load)
                .clamp(-needed, needed);
            self.spin -= longitudinal * self.radius / WHEEL_INERTIA * dt;

            let lateral_limit = mass_share.max(0.0) * lateral_speed.abs() / dt;
            let side = (-command.sideways_friction.evaluate(sideways_slip) * self.load)
                .clamp(-lateral_limit, lateral_limit);

            AppliedForce {
                force: hit.normal * self.load + forward * longitudinal + lateral * side,
                point: hit.point,
                mode: ForceMode::Force,
            }
        });

        if command.brake_torque > 0.0 {
            self.spin = move_towards(self.spin, 0.0, command.brake_torque / WHEEL_INERTIA * dt);
        }
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use tarmac_core::models::friction::FrictionCurve;
    use tarmac_core::types::WheelPosition;

    const DT: f64 = 0.02;

    fn wheel() -> (WheelConfig, HostWheel) {
        let config = WheelConfig::for_position(WheelPosition::RearLeft, Vector3::new(-1.3, 0.7, -0.3));
        let host = HostWheel::new(&config);
        (config, host)
    }

    fn command(config: &WheelConfig) -> WheelCommand {
        WheelCommand {
            position: config.position,
            motor_torque: 0.0,
            brake_torque: 0.0,
            steer_angle: 0.0,
            radius: config.radius,
            forward_friction: FrictionCurve::forward(),
            sideways_friction: FrictionCurve::sideways(),
        }
    }

    /// Ground directly under the mount, compressing the spring to `compression`.
    fn ground_hit(config: &WheelConfig, compression: f64) -> GroundHit {
        let distance = config.suspension_distance + config.radius - compression;
        GroundHit {
            distance,
            point: Point3::from(config.mount - Vector3::z() * distance),
            normal: Vector3::z(),
            material: 2,
        }
    }

    #[test]
    fn free_rolling_tire_has_no_slip() {
        let (forward, sideways) = slip(20.0, 0.0, 20.0);
        assert_abs_diff_eq!(forward, 0.0);
        assert_abs_diff_eq!(sideways, 0.0);
    }

    #[test]
    fn locked_and_spinning_tires() {
        let (locked, _) = slip(10.0, 0.0, 0.0);
        assert_abs_diff_eq!(locked, -1.0);
        let (spinning, _) = slip(0.0, 0.0, 3.0);
        assert_abs_diff_eq!(spinning, 3.0);
        let (_, sliding_left) = slip(10.0, 2.0, 10.0);
        assert_abs_diff_eq!(sliding_left, 0.2);
    }

    #[test]
    fn static_load_sits_at_half_travel() {
        let suspension = Suspension::for_vehicle(1200.0, 4, 0.2);
        assert_abs_diff_eq!(suspension.stiffness * 0.1, 1200.0 * GRAVITY / 4.0, epsilon = 1e-9);
        assert!(suspension.damping > 0.0);
    }

    #[test]
    fn airborne_wheel_reports_only_its_spin() {
        let (_, mut host) = wheel();
        let suspension = Suspension::for_vehicle(1350.0, 4, 0.2);
        let contact = host.sense(None, &ChassisState::default(), 0.0, &suspension, 0.0, DT);
        assert!(!contact.grounded);
        assert_abs_diff_eq!(contact.suspension_force, 0.0);
        assert_abs_diff_eq!(host.load(), 0.0);
    }

    #[test]
    fn resting_wheel_reports_spring_load_and_material() {
        let (config, mut host) = wheel();
        let suspension = Suspension::for_vehicle(1350.0, 4, config.suspension_distance);
        let hit = ground_hit(&config, 0.1);
        let chassis = ChassisState::default();

        host.sense(Some(hit), &chassis, 0.0, &suspension, 0.0, DT);
        let contact = host.sense(Some(hit), &chassis, 0.0, &suspension, 0.0, DT);
        assert!(contact.grounded);
        assert_eq!(contact.ground_material, 2);
        assert_abs_diff_eq!(contact.suspension_force, suspension.stiffness * 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(contact.forward_slip, 0.0);
        assert_abs_diff_eq!(contact.sideways_slip, 0.0);

        let (origin, direction, length) = host.ray(&chassis);
        assert_abs_diff_eq!(origin.z, -0.3);
        assert_abs_diff_eq!(direction.z, -1.0);
        assert_abs_diff_eq!(length, config.suspension_distance + config.radius);
    }

    #[test]
    fn roughness_shifts_the_reported_load() {
        let (config, mut host) = wheel();
        let suspension = Suspension::for_vehicle(1350.0, 4, config.suspension_distance);
        let hit = ground_hit(&config, 0.1);
        host.sense(Some(hit), &ChassisState::default(), 0.0, &suspension, 0.0, DT);
        let contact = host.sense(Some(hit), &ChassisState::default(), 0.0, &suspension, 50.0, DT);
        assert_abs_diff_eq!(contact.suspension_force, suspension.stiffness * 0.1 + 50.0, epsilon = 1e-6);
    }

    #[test]
    fn motor_torque_spins_the_wheel_and_pushes_forward() {
        let (config, mut host) = wheel();
        let suspension = Suspension::for_vehicle(1350.0, 4, config.suspension_distance);
        let chassis = ChassisState::default();
        host.sense(Some(ground_hit(&config, 0.1)), &chassis, 0.0, &suspension, 0.0, DT);

        let drive = WheelCommand {
            motor_torque: 400.0,
            ..command(&config)
        };
        let force = host.actuate(&drive, &chassis, 1350.0 / 4.0, DT).expect("grounded");
        assert!(force.force.z > 0.0);
        // Plenty of grip: the whole drive torque reaches the road.
        assert_abs_diff_eq!(force.force.x, 400.0 / config.radius, epsilon = 1e-6);
        assert_abs_diff_eq!(host.spin(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn brakes_stop_the_wheel_without_reversing_it() {
        let (config, mut host) = wheel();
        let chassis = ChassisState::default();
        host.sense(None, &chassis, 0.0, &Suspension::for_vehicle(1350.0, 4, 0.2), 0.0, DT);
        host.actuate(
            &WheelCommand {
                motor_torque: 300.0,
                ..command(&config)
            },
            &chassis,
            300.0,
            DT,
        );
        assert!(host.spin() > 0.0);

        let stop = WheelCommand {
            brake_torque: 5000.0,
            ..command(&config)
        };
        for _ in 0..10 {
            host.actuate(&stop, &chassis, 300.0, DT);
        }
        assert_abs_diff_eq!(host.spin(), 0.0);
    }

    #[test]
    fn sideways_slide_is_resisted_but_not_reversed() {
        let (config, mut host) = wheel();
        let suspension = Suspension::for_vehicle(1350.0, 4, config.suspension_distance);
        let chassis = ChassisState {
            linear_velocity: Vector3::new(0.0, 0.5, 0.0),
            ..ChassisState::default()
        };
        host.sense(Some(ground_hit(&config, 0.1)), &chassis, 0.0, &suspension, 0.0, DT);
        let mass_share = 1350.0 / 4.0;
        let force = host.actuate(&command(&config), &chassis, mass_share, DT).expect("grounded");
        assert!(force.force.y < 0.0);
        assert!(force.force.y.abs() <= mass_share * 0.5 / DT + 1e-9);
    }
}
