// tarmac_sim/src/simulation/core/transforms.rs

//! Conversions between Bevy's Y-up world and the z-up frames `tarmac_core`
//! works in.
//!
//! World quantities go through ENU (x east, y north, z up). The chassis body
//! frame is FLU (x forward, y left, z up); a Bevy model faces -Z, so the FLU
//! frame is the ENU-converted body frame turned +90 degrees about z.

use avian3d::prelude::{AngularVelocity, LinearVelocity};
use bevy::prelude::{Quat as BevyQuat, Transform as BevyTransform, Vec3 as BevyVec3};
use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use std::f64::consts::FRAC_PI_2;
use tarmac_core::types::ChassisState;

// --- ENU <-> BEVY Transformations ---

/// Rotation from the ENU frame to the Bevy frame: -90 degrees about X.
/// ENU's North (0,1,0) becomes Bevy -Z and ENU's Up becomes Bevy +Y.
fn q_enu_frame_to_bevy_frame() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
}

/// Turns the ENU-converted model frame into the FLU body frame.
fn q_model_to_body() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2)
}

/// Converts a 3D coordinate vector from ENU to Bevy world.
pub fn enu_vector_to_bevy_vector(enu_vec: &Vector3<f64>) -> BevyVec3 {
    BevyVec3::new(
        enu_vec.x as f32,  // East -> Bevy X
        enu_vec.z as f32,  // ENU Up -> Bevy Y
        -enu_vec.y as f32, // ENU North -> Bevy -Z
    )
}

/// Converts a 3D coordinate vector from Bevy world to ENU.
pub fn bevy_vector_to_enu_vector(bevy_vec: &BevyVec3) -> Vector3<f64> {
    Vector3::new(
        bevy_vec.x as f64,  // Bevy X -> ENU East
        -bevy_vec.z as f64, // Bevy -Z -> ENU North
        bevy_vec.y as f64,  // Bevy Y -> ENU Up
    )
}

/// Converts an object's orientation from ENU frame to Bevy world frame.
pub fn enu_quat_to_bevy_quat(enu_obj_quat: &UnitQuaternion<f64>) -> BevyQuat {
    let frame = q_enu_frame_to_bevy_frame();
    let q = frame * enu_obj_quat * frame.inverse();
    BevyQuat::from_xyzw(
        q.coords.x as f32,
        q.coords.y as f32,
        q.coords.z as f32,
        q.coords.w as f32,
    )
}

/// Converts an object's orientation from Bevy world frame to ENU frame.
pub fn bevy_quat_to_enu_quat(bevy_obj_quat: &BevyQuat) -> UnitQuaternion<f64> {
    let q = UnitQuaternion::from_quaternion(Quaternion::new(
        bevy_obj_quat.w as f64, // nalgebra Quaternion::new is w,x,y,z
        bevy_obj_quat.x as f64,
        bevy_obj_quat.y as f64,
        bevy_obj_quat.z as f64,
    ));
    let frame = q_enu_frame_to_bevy_frame();
    frame.inverse() * q * frame
}

pub fn enu_iso_to_bevy_transform(enu_pose: &Isometry3<f64>) -> BevyTransform {
    BevyTransform {
        translation: enu_vector_to_bevy_vector(&enu_pose.translation.vector),
        rotation: enu_quat_to_bevy_quat(&enu_pose.rotation),
        scale: BevyVec3::ONE,
    }
}

pub fn bevy_transform_to_enu_iso(bevy_transform: &BevyTransform) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::from(bevy_vector_to_enu_vector(&bevy_transform.translation)),
        bevy_quat_to_enu_quat(&bevy_transform.rotation),
    )
}

// --- Chassis (FLU) ---

/// Body-to-world pose of a chassis whose model faces Bevy -Z.
pub fn chassis_pose(bevy_transform: &BevyTransform) -> Isometry3<f64> {
    let mut pose = bevy_transform_to_enu_iso(bevy_transform);
    pose.rotation *= q_model_to_body();
    pose
}

/// Inverse of [`chassis_pose`].
pub fn chassis_pose_to_bevy_transform(pose: &Isometry3<f64>) -> BevyTransform {
    let mut model = *pose;
    model.rotation *= q_model_to_body().inverse();
    enu_iso_to_bevy_transform(&model)
}

/// A pose at `position` (ENU) facing `yaw_deg` counter-clockwise from east.
pub fn chassis_pose_from_yaw(position: Vector3<f64>, yaw_deg: f64) -> Isometry3<f64> {
    Isometry3::from_parts(
        Translation3::from(position),
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw_deg.to_radians()),
    )
}

/// Maps a body-frame (FLU) offset into the Bevy model's local frame.
pub fn body_vector_to_bevy_local(body: &Vector3<f64>) -> BevyVec3 {
    BevyVec3::new(-body.y as f32, body.z as f32, -body.x as f32)
}

/// Everything `Vehicle::step` needs to know about the rigid body.
pub fn chassis_state(
    bevy_transform: &BevyTransform,
    linear: &LinearVelocity,
    angular: &AngularVelocity,
) -> ChassisState {
    ChassisState {
        pose: chassis_pose(bevy_transform),
        linear_velocity: bevy_vector_to_enu_vector(&linear.0),
        angular_velocity: bevy_vector_to_enu_vector(&angular.0),
    }
}
