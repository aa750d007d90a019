// tarmac_core/src/assists/anti_roll.rs

//! Anti-roll bars modelled as a force pair proportional to the travel
//! difference across an axle.

use nalgebra::{Isometry3, Point3, Translation3, Vector3};

use crate::config::AntiRollConfig;
use crate::types::{AppliedForce, Axle, ChassisState, ForceMode, Side, WheelPosition};
use crate::wheel::Wheel;

/// Normalized suspension extension: 1 fully extended (or airborne), 0 fully compressed.
pub fn travel(pose: &Isometry3<f64>, wheel: &Wheel) -> f64 {
    if !wheel.is_grounded() {
        return 1.0;
    }
    let config = wheel.config();
    let mount = pose * Translation3::from(config.mount);
    let local = mount.inverse_transform_point(&wheel.contact().point);
    let distance = config.suspension_distance.max(1e-6);
    (-local.z - wheel.radius()) / distance
}

/// World position of the wheel centre: the mount pushed down the body z axis
/// by the current suspension extension.
pub fn wheel_center(pose: &Isometry3<f64>, wheel: &Wheel) -> Point3<f64> {
    let config = wheel.config();
    let drop = travel(pose, wheel).clamp(0.0, 1.0) * config.suspension_distance;
    pose * Point3::from(config.mount - Vector3::z() * drop)
}

/// Forces for one left/right pair with coefficient `stiffness`, applied at
/// the wheel centres.
pub fn pair_forces(
    chassis: &ChassisState,
    left: &Wheel,
    right: &Wheel,
    stiffness: f64,
) -> Vec<AppliedForce> {
    if !left.is_enabled() || !right.is_enabled() || stiffness == 0.0 {
        return Vec::new();
    }
    let up = chassis.up();
    let force = (travel(&chassis.pose, left) - travel(&chassis.pose, right)) * stiffness;

    [(left, -force), (right, force)]
        .into_iter()
        .filter(|(wheel, _)| wheel.is_grounded())
        .map(|(wheel, magnitude)| AppliedForce {
            force: up * magnitude,
            point: wheel_center(&chassis.pose, wheel),
            mode: ForceMode::Force,
        })
        .collect()
}

/// Pitch term between the averaged front and rear travel.
fn vertical_forces(chassis: &ChassisState, wheels: &[Wheel], stiffness: f64) -> Vec<AppliedForce> {
    if stiffness == 0.0 {
        return Vec::new();
    }
    let mean_travel = |axle: Axle| {
        let travels: Vec<f64> = wheels
            .iter()
            .filter(|w| w.is_enabled() && w.position().axle() == axle)
            .map(|w| travel(&chassis.pose, w))
            .collect();
        (!travels.is_empty()).then(|| travels.iter().sum::<f64>() / travels.len() as f64)
    };
    let (Some(front), Some(rear)) = (mean_travel(Axle::Front), mean_travel(Axle::Rear)) else {
        return Vec::new();
    };

    let up = chassis.up();
    let force = (front - rear) * stiffness;
    wheels
        .iter()
        .filter(|w| w.is_enabled() && w.is_grounded())
        .map(|w| {
            let sign = if w.position().is_front() { -1.0 } else { 1.0 };
            AppliedForce {
                force: up * (sign * force / 2.0),
                point: wheel_center(&chassis.pose, w),
                mode: ForceMode::Force,
            }
        })
        .collect()
}

fn find(wheels: &[Wheel], position: WheelPosition) -> Option<&Wheel> {
    wheels.iter().find(|w| w.position() == position)
}

/// Anti-roll forces for every axle. Extra rear axles use the rear coefficient.
pub fn forces(chassis: &ChassisState, wheels: &[Wheel], config: &AntiRollConfig) -> Vec<AppliedForce> {
    let pairs = wheels
        .iter()
        .map(Wheel::position)
        .filter(|p| p.side() == Side::Left)
        .map(|left| {
            let stiffness = match left.axle() {
                Axle::Front => config.front,
                Axle::Rear => config.rear,
            };
            (left, left.mirrored(), stiffness)
        });

    let mut out: Vec<AppliedForce> = pairs
        .into_iter()
        .filter_map(|(l, r, k)| Some(pair_forces(chassis, find(wheels, l)?, find(wheels, r)?, k)))
        .flatten()
        .collect();
    out.extend(vertical_forces(chassis, wheels, config.vertical));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WheelConfig;
    use crate::drivetrain::DrivetrainMode;
    use crate::types::WheelContact;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Point3, Vector3};

    fn contact_point_at(pose: &Isometry3<f64>, mount: &Vector3<f64>, drop: f64) -> Point3<f64> {
        pose * Point3::from(mount - Vector3::z() * drop)
    }

    fn wheel_with_drop(position: WheelPosition, mount: Vector3<f64>, drop: Option<f64>) -> Wheel {
        let config = WheelConfig {
            radius: 0.3,
            suspension_distance: 0.2,
            ..WheelConfig::for_position(position, mount)
        };
        let mut wheel = Wheel::new(config, DrivetrainMode::Rwd);
        let contact = drop.map(|d| WheelContact {
            grounded: true,
            point: contact_point_at(&Isometry3::identity(), &mount, d),
            ..WheelContact::default()
        });
        wheel.observe(contact.as_ref(), 0.02);
        wheel
    }

    fn wheel_with_pose_drop(
        pose: &Isometry3<f64>,
        position: WheelPosition,
        mount: Vector3<f64>,
        drop: f64,
    ) -> Wheel {
        let config = WheelConfig {
            radius: 0.3,
            suspension_distance: 0.2,
            ..WheelConfig::for_position(position, mount)
        };
        let mut wheel = Wheel::new(config, DrivetrainMode::Rwd);
        let contact = WheelContact {
            grounded: true,
            point: contact_point_at(pose, &mount, drop),
            ..WheelContact::default()
        };
        wheel.observe(Some(&contact), 0.02);
        wheel
    }

    #[test]
    fn travel_is_normalized_extension() {
        let mount = Vector3::new(1.0, 0.7, 0.0);
        // radius 0.3 + half of 0.2 travel.
        let wheel = wheel_with_drop(WheelPosition::FrontLeft, mount, Some(0.4));
        assert_abs_diff_eq!(travel(&Isometry3::identity(), &wheel), 0.5, epsilon = 1e-9);

        let airborne = wheel_with_drop(WheelPosition::FrontLeft, mount, None);
        assert_abs_diff_eq!(travel(&Isometry3::identity(), &airborne), 1.0);
    }

    #[test]
    fn pair_forces_are_equal_and_opposite() {
        let chassis = ChassisState::default();
        let left = wheel_with_drop(WheelPosition::FrontLeft, Vector3::new(1.0, 0.7, 0.0), Some(0.5));
        let right = wheel_with_drop(WheelPosition::FrontRight, Vector3::new(1.0, -0.7, 0.0), Some(0.35));

        let forces = pair_forces(&chassis, &left, &right, 1000.0);
        assert_eq!(forces.len(), 2);
        assert_abs_diff_eq!(forces[0].force.z, -forces[1].force.z, epsilon = 1e-9);
        // Left is more extended, so it is pulled down.
        assert!(forces[0].force.z < 0.0);
        assert_abs_diff_eq!((forces[0].force + forces[1].force).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn pair_forces_act_at_the_wheel_centres() {
        let chassis = ChassisState {
            pose: Isometry3::translation(5.0, -2.0, 1.0),
            ..ChassisState::default()
        };
        let left_mount = Vector3::new(1.0, 0.7, 0.0);
        let right_mount = Vector3::new(1.0, -0.7, 0.0);
        let left = wheel_with_pose_drop(&chassis.pose, WheelPosition::FrontLeft, left_mount, 0.5);
        let right = wheel_with_pose_drop(&chassis.pose, WheelPosition::FrontRight, right_mount, 0.35);

        let forces = pair_forces(&chassis, &left, &right, 1000.0);
        assert_eq!(forces.len(), 2);
        // Fully extended left sits a whole travel below its mount, right a quarter.
        let expected_left = chassis.pose * Point3::new(1.0, 0.7, -0.2);
        let expected_right = chassis.pose * Point3::new(1.0, -0.7, -0.05);
        assert_abs_diff_eq!((forces[0].point - expected_left).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!((forces[1].point - expected_right).norm(), 0.0, epsilon = 1e-9);
        assert!((forces[0].point - left.contact().point).norm() > 0.2);
    }

    #[test]
    fn extra_rear_axles_pair_with_their_mirror() {
        let chassis = ChassisState::default();
        let wheels = vec![
            wheel_with_drop(WheelPosition::ExtraRear(0, Side::Left), Vector3::new(-2.0, 0.7, 0.0), Some(0.5)),
            wheel_with_drop(WheelPosition::ExtraRear(0, Side::Right), Vector3::new(-2.0, -0.7, 0.0), Some(0.35)),
        ];
        let config = AntiRollConfig {
            front: 0.0,
            rear: 1000.0,
            vertical: 0.0,
        };
        let forces = forces(&chassis, &wheels, &config);
        assert_eq!(forces.len(), 2);
        // travel 1.0 vs 0.25 at the rear coefficient.
        assert_abs_diff_eq!(forces[0].force.z, -750.0, epsilon = 1e-9);
        assert_abs_diff_eq!(forces[1].force.z, 750.0, epsilon = 1e-9);
    }

    #[test]
    fn airborne_side_gets_no_force() {
        let chassis = ChassisState::default();
        let left = wheel_with_drop(WheelPosition::RearLeft, Vector3::new(-1.0, 0.7, 0.0), None);
        let right = wheel_with_drop(WheelPosition::RearRight, Vector3::new(-1.0, -0.7, 0.0), Some(0.35));
        let forces = pair_forces(&chassis, &left, &right, 1000.0);
        assert_eq!(forces.len(), 1);
        assert!(forces[0].force.z > 0.0);
    }

    #[test]
    fn disabled_wheel_skips_its_axle() {
        let chassis = ChassisState::default();
        let mut left = wheel_with_drop(WheelPosition::FrontLeft, Vector3::new(1.0, 0.7, 0.0), Some(0.5));
        let right = wheel_with_drop(WheelPosition::FrontRight, Vector3::new(1.0, -0.7, 0.0), Some(0.35));
        left.set_enabled(false);
        assert!(pair_forces(&chassis, &left, &right, 1000.0).is_empty());
    }
}
