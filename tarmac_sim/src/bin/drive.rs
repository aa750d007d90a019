// tarmac_sim/src/bin/drive.rs

//! Drives one vehicle on the test pad.
//!
//! With a window the car follows the keyboard: arrows for throttle, brake and
//! steering, space for the handbrake, shift for boost, `E` to start or stop
//! the engine and `Q`/`Z` to shift by hand. `--headless` swaps the keyboard
//! for a scripted driver and steps simulated time as fast as possible.
//!
//! `cargo run --bin tarmac_drive -- --headless --duration 10 --seed 7`

use std::time::Duration;

use avian3d::prelude::PhysicsPlugins;
use bevy::{
    asset::AssetPlugin, log::LogPlugin, scene::ScenePlugin, state::app::StatesPlugin,
    time::TimeUpdateStrategy,
};
use clap::Parser;

use tarmac_sim::cli::Cli;
use tarmac_sim::prelude::*;
use tarmac_sim::TarmacSimulationPlugin;

const LOG_FILTER: &str = "info,wgpu_core=error,wgpu_hal=error,tarmac_sim=debug,tarmac_core=debug";

fn main() -> AppExit {
    let cli = Cli::parse();
    let settings = RunSettings::from(&cli);

    let mut app = App::new();
    if settings.headless {
        app.add_plugins((
            MinimalPlugins,
            StatesPlugin,
            TransformPlugin,
            AssetPlugin::default(),
            ScenePlugin,
            LogPlugin {
                filter: LOG_FILTER.to_string(),
                ..default()
            },
        ))
        .init_asset::<Mesh>()
        // One fixed tick per update keeps runs reproducible under a seed.
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
            1.0 / settings.fixed_hz,
        )));
    } else {
        app.add_plugins(DefaultPlugins.set(LogPlugin {
            level: bevy::log::Level::INFO,
            filter: LOG_FILTER.to_string(),
            ..default()
        }))
        .add_systems(Update, (keyboard_controller, follow_camera));
    }

    app.add_plugins(PhysicsPlugins::default())
        .insert_resource(settings)
        .insert_resource(cli);

    app.init_state::<AppState>();
    app.add_plugins(TarmacSimulationPlugin);

    app.run()
}

/// Reads the keyboard into every vehicle's `DriverControls`.
fn keyboard_controller(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut query: Query<(&mut DriverControls, &mut Vehicle)>,
) {
    let axis = |positive: KeyCode, negative: KeyCode| {
        let mut value = 0.0;
        if keyboard_input.pressed(positive) {
            value += 1.0;
        }
        if keyboard_input.pressed(negative) {
            value -= 1.0;
        }
        value
    };
    let held = |key: KeyCode| if keyboard_input.pressed(key) { 1.0 } else { 0.0 };

    for (mut controls, mut vehicle) in &mut query {
        controls.0 = DriverInput {
            throttle: held(KeyCode::ArrowUp),
            brake: held(KeyCode::ArrowDown),
            steer: axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
            handbrake: held(KeyCode::Space),
            clutch: 0.0,
            boost: held(KeyCode::ShiftLeft),
        };

        if keyboard_input.just_pressed(KeyCode::KeyE) {
            if vehicle.engine().is_running() {
                vehicle.kill_engine();
            } else {
                vehicle.start_engine();
            }
        }
        if keyboard_input.just_pressed(KeyCode::KeyQ) {
            vehicle.shift_up();
        }
        if keyboard_input.just_pressed(KeyCode::KeyZ) {
            vehicle.shift_down();
        }
    }
}

/// Keeps the camera behind and above the first vehicle.
fn follow_camera(
    vehicles: Query<&Transform, (With<Vehicle>, Without<Camera3d>)>,
    mut cameras: Query<&mut Transform, With<Camera3d>>,
) {
    let Some(target) = vehicles.iter().next() else {
        return;
    };
    for mut camera in &mut cameras {
        // The model faces -Z, so "behind" is +Z in its local frame.
        let eye = target.translation + target.rotation * Vec3::new(0.0, 3.5, 9.0);
        *camera = Transform::from_translation(eye).looking_at(target.translation, Vec3::Y);
    }
}
