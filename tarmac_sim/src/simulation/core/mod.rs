// tarmac_sim/src/simulation/core/mod.rs

use avian3d::prelude::{AngularVelocity, LinearVelocity};
use bevy::prelude::*;

use crate::simulation::core::{components::ChassisKinematics, transforms::chassis_state};

/// Captures each chassis' pose and velocities in core frames, as left by the
/// previous physics step.
pub(crate) fn chassis_sync_system(
    mut query: Query<(
        &Transform,
        &LinearVelocity,
        &AngularVelocity,
        &mut ChassisKinematics,
    )>,
) {
    for (transform, linear, angular, mut kinematics) in &mut query {
        kinematics.0 = chassis_state(transform, linear, angular);
    }
}

pub mod app_state;
pub mod components;
pub mod prng;
pub mod simulation_setup;
pub mod transforms;
