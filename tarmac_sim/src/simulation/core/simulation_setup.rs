// tarmac_sim/src/simulation/core/simulation_setup.rs

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::prelude::*;
use crate::simulation::core::chassis_sync_system;
use crate::simulation::core::prng::RoadRoughness;

pub struct SimulationSetupPlugin;

impl Plugin for SimulationSetupPlugin {
    fn build(&self, app: &mut App) {
        // This plugin's job is to read the run settings and add resources and schedules.
        let settings = app
            .world()
            .get_resource::<RunSettings>()
            .cloned()
            .unwrap_or_else(|| {
                warn!("RunSettings not inserted, using defaults.");
                RunSettings::default()
            });

        // --- 1. Add the Deterministic PRNG Resource ---
        let rng = match settings.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        app.insert_resource(SimulationRng(rng))
            .insert_resource(RoadRoughness::new(settings.roughness_stddev));

        let fixed_hz = if settings.fixed_hz.is_finite() && settings.fixed_hz > 0.0 {
            settings.fixed_hz
        } else {
            RunSettings::default().fixed_hz
        };
        app.insert_resource(Time::<Fixed>::from_hz(fixed_hz));
        app.insert_resource(settings);

        // --- Scene building pipeline ---
        app.configure_sets(
            OnEnter(AppState::SceneBuilding),
            (
                SceneBuildSet::Spawn,
                SceneBuildSet::Physics,
                SceneBuildSet::Finalize,
            )
                .chain(),
        )
        .add_systems(
            OnEnter(AppState::SceneBuilding),
            transition_to_running.in_set(SceneBuildSet::Finalize),
        );

        // --- Per-tick data flow ---
        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::StateSync,
                SimulationSet::Input,
                SimulationSet::Contacts,
                SimulationSet::Vehicle,
                SimulationSet::Actuation,
            )
                .chain(),
        )
        .add_systems(
            FixedUpdate,
            (
                chassis_sync_system.in_set(SimulationSet::StateSync),
                finish_after_duration.after(SimulationSet::Actuation),
            )
                .run_if(in_state(AppState::Running)),
        );
    }
}

/// Moves the app into the main `Running` state once the scene is built.
fn transition_to_running(mut next_state: ResMut<NextState<AppState>>) {
    info!("Scene building complete. Transitioning to Running state.");
    next_state.set(AppState::Running);
}

/// Logs a final telemetry line per vehicle and exits once the configured
/// duration of simulated time has elapsed.
fn finish_after_duration(
    time: Res<Time<Fixed>>,
    settings: Res<RunSettings>,
    vehicles: Query<(&Name, &Vehicle)>,
    mut exit: EventWriter<AppExit>,
    mut finished: Local<bool>,
) {
    if *finished || time.elapsed_secs_f64() < settings.duration {
        return;
    }
    *finished = true;
    for (name, vehicle) in &vehicles {
        let telemetry = vehicle.telemetry();
        info!(
            "[{}] finished after {:.1}s: {:.1} km/h, {:.0} rpm, gear {:?}, fuel {:.1}/{:.1}, boost {:.2}",
            name.as_str(),
            time.elapsed_secs_f64(),
            telemetry.speed_kmh,
            telemetry.rpm,
            telemetry.gear,
            telemetry.fuel,
            telemetry.fuel_capacity,
            telemetry.boost_level
        );
    }
    exit.write(AppExit::Success);
}
