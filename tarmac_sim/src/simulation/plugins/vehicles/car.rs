// tarmac_sim/src/simulation/plugins/vehicles/car.rs

use std::sync::Arc;

use avian3d::prelude::{
    AngularVelocity, Collider, ExternalForce, ExternalTorque, Friction, LinearVelocity, Mass,
    RigidBody, SleepingDisabled, SpatialQuery, SpatialQueryFilter,
};
use nalgebra::{Point3, Vector3};

use crate::{
    prelude::*,
    simulation::core::{
        components::ChassisKinematics,
        prng::RoadRoughness,
        transforms::{
            body_vector_to_bevy_local, bevy_vector_to_enu_vector, chassis_pose_from_yaw,
            chassis_pose_to_bevy_transform, enu_vector_to_bevy_vector,
        },
    },
    simulation::plugins::{
        vehicles::wheel_host::{GroundHit, HostWheel, Suspension},
        world::spawner::GroundSurface,
    },
};

/// Height of the chassis collider [m].
const BODY_HEIGHT: f32 = 0.5;
/// Extra drop above the resting ride height when spawning [m].
const SPAWN_CLEARANCE: f64 = 0.1;

// --- BEVY COMPONENTS for a raycast car ---

/// The host half of every wheel, in the vehicle's wheel order.
#[derive(Component, Debug, Clone)]
pub struct RaycastWheels {
    pub wheels: Vec<HostWheel>,
    pub suspension: Suspension,
    /// Chassis mass carried by each wheel [kg].
    pub mass_share: f64,
}

impl RaycastWheels {
    pub fn new(config: &VehicleConfig) -> Self {
        let count = config.wheels.len().max(1);
        let travel = config
            .wheels
            .iter()
            .map(|w| w.suspension_distance)
            .sum::<f64>()
            / count as f64;
        Self {
            wheels: config.wheels.iter().map(HostWheel::new).collect(),
            suspension: Suspension::for_vehicle(config.mass, count, travel),
            mass_share: config.mass / count as f64,
        }
    }
}

/// A resultant force and torque about a reference point, plus the
/// mass-independent velocity change, all in world (ENU) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wrench {
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
    pub velocity_change: Vector3<f64>,
}

impl Wrench {
    /// Sums forces applied at points into one wrench about `center`.
    pub fn about<'a>(center: &Point3<f64>, forces: impl IntoIterator<Item = &'a AppliedForce>) -> Self {
        let mut wrench = Self {
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            velocity_change: Vector3::zeros(),
        };
        for applied in forces {
            if !applied.force.iter().all(|c| c.is_finite()) {
                continue;
            }
            match applied.mode {
                ForceMode::Force => {
                    wrench.force += applied.force;
                    wrench.torque += (applied.point - center).cross(&applied.force);
                }
                ForceMode::VelocityChange => wrench.velocity_change += applied.force,
            }
        }
        wrench
    }
}

/// Overall (length, width) of the chassis box, spanning the wheel mounts.
pub fn chassis_extent(config: &VehicleConfig) -> (f64, f64) {
    let radius = config.wheels.iter().map(|w| w.radius).fold(0.3, f64::max);
    let span = |axis: fn(&WheelConfig) -> f64| {
        let (lo, hi) = config
            .wheels
            .iter()
            .map(axis)
            .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if hi >= lo { hi - lo } else { 0.0 }
    };
    let length = span(|w| w.mount.x) + 2.0 * radius;
    let width = span(|w| w.mount.y).max(1.0);
    (length, width)
}

/// Body height at which every spring sits at half travel.
fn ride_height(config: &VehicleConfig) -> f64 {
    config
        .wheels
        .iter()
        .map(|w| w.radius + 0.5 * w.suspension_distance - w.mount.z)
        .fold(0.0, f64::max)
}

/// Materials shared by every car spawned in one pass.
struct CarAssets {
    body_material: Handle<StandardMaterial>,
    wheel_material: Handle<StandardMaterial>,
}

// --- THE PLUGIN ---
pub struct TarmacCarPlugin;

impl Plugin for TarmacCarPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::SceneBuilding),
            (
                spawn_vehicle.in_set(SceneBuildSet::Spawn),
                attach_car_physics.in_set(SceneBuildSet::Physics),
            ),
        )
        .add_systems(
            FixedUpdate,
            (
                scripted_driver
                    .in_set(SimulationSet::Input)
                    .run_if(|settings: Res<RunSettings>| settings.headless),
                sense_wheel_contacts.in_set(SimulationSet::Contacts),
                step_vehicles.in_set(SimulationSet::Vehicle),
                actuate_vehicles.in_set(SimulationSet::Actuation),
            )
                .run_if(in_state(AppState::Running)),
        );
    }
}

// --- SYSTEMS ---

/// SPAWNING (LOGIC): Builds the `Vehicle` from the selected configuration.
fn spawn_vehicle(
    mut commands: Commands,
    selected: Res<SelectedVehicle>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(config) = selected.0.clone() else {
        warn!("No vehicle selected, nothing to spawn.");
        return;
    };

    let mut vehicle = match Vehicle::new(config, Arc::new(VehicleContext::default())) {
        Ok(vehicle) => vehicle,
        Err(e) => {
            error!("Cannot build vehicle: {}", e);
            exit.write(AppExit::error());
            return;
        }
    };

    let name = vehicle.config().name.clone();
    let tag = name.clone();
    vehicle.add_observer(Box::new(move |event: &VehicleEvent| {
        info!(vehicle = %tag, ?event, "vehicle event");
    }));

    let start = Vector3::new(0.0, 0.0, ride_height(vehicle.config()) + SPAWN_CLEARANCE);
    let transform = chassis_pose_to_bevy_transform(&chassis_pose_from_yaw(start, 90.0));
    let wheels = RaycastWheels::new(vehicle.config());
    let output = VehicleStepOutput(StepOutput::new(Vec::new()));

    info!("[SPAWN] '{}' at {:?}", name, transform.translation);
    commands.spawn((
        Name::new(name),
        transform,
        DriverControls::default(),
        WheelContacts::default(),
        ChassisKinematics::default(),
        wheels,
        output,
        vehicle,
    ));
}

/// SPAWNING (PHYSICS): Attaches the rigid body and, with a renderer, the meshes.
fn attach_car_physics(
    mut commands: Commands,
    query: Query<(Entity, &Name, &Vehicle), Without<RigidBody>>,
    settings: Res<RunSettings>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let mut render = match (settings.headless, meshes, materials) {
        (false, Some(meshes), Some(mut materials)) => {
            let assets = CarAssets {
                body_material: materials.add(Color::srgb(0.7, 0.2, 0.2)),
                wheel_material: materials.add(Color::srgb(0.1, 0.1, 0.1)),
            };
            Some((meshes, assets))
        }
        _ => None,
    };

    for (entity, name, vehicle) in &query {
        let config = vehicle.config();
        let (length, width) = chassis_extent(config);
        let (length, width) = (length as f32, width as f32);

        let mut entity_commands = commands.entity(entity);
        entity_commands.insert((
            RigidBody::Dynamic,
            Collider::cuboid(width, BODY_HEIGHT, length),
            Mass(config.mass as f32),
            Friction::new(0.7),
            // Sleeping would freeze a car waiting on its starter.
            SleepingDisabled,
            LinearVelocity::default(),
            AngularVelocity::default(),
            ExternalForce::default().with_persistence(false),
            ExternalTorque::default().with_persistence(false),
            InheritedVisibility::VISIBLE,
        ));

        let Some((meshes, assets)) = render.as_mut() else {
            continue;
        };
        let body_mesh = meshes.add(Cuboid::new(width, BODY_HEIGHT, length));
        let wheel_meshes: Vec<_> = config
            .wheels
            .iter()
            .map(|w| {
                let center = w.mount - Vector3::z() * (0.5 * w.suspension_distance);
                (
                    meshes.add(Cylinder::new(w.radius as f32, 0.25)),
                    body_vector_to_bevy_local(&center),
                    format!("{}_{:?}_Wheel", name, w.position),
                )
            })
            .collect();

        entity_commands.with_children(|parent| {
            parent.spawn((
                Mesh3d(body_mesh),
                MeshMaterial3d(assets.body_material.clone()),
                Name::new(format!("{}_Body", name)),
            ));
            for (mesh, translation, wheel_name) in wheel_meshes {
                parent.spawn((
                    Mesh3d(mesh),
                    MeshMaterial3d(assets.wheel_material.clone()),
                    Transform::from_translation(translation)
                        .with_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2)),
                    Name::new(wheel_name),
                ));
            }
        });
    }
}

/// RUNTIME (INPUT): Holds the throttle and steering given on the command line.
fn scripted_driver(settings: Res<RunSettings>, mut query: Query<&mut DriverControls>) {
    for mut controls in &mut query {
        controls.0 = DriverInput {
            throttle: settings.throttle,
            steer: settings.steer,
            ..DriverInput::default()
        };
    }
}

/// RUNTIME (CONTACTS): Casts each wheel's suspension ray and builds its contact report.
fn sense_wheel_contacts(
    spatial_query: SpatialQuery,
    surfaces: Query<&GroundSurface>,
    roughness: Res<RoadRoughness>,
    mut rng: ResMut<SimulationRng>,
    time: Res<Time>,
    mut query: Query<(
        Entity,
        &Vehicle,
        &ChassisKinematics,
        &mut RaycastWheels,
        &mut WheelContacts,
    )>,
) {
    let dt = time.delta_secs_f64();
    for (entity, vehicle, kinematics, mut raycast, mut contacts) in &mut query {
        let chassis = kinematics.0;
        let filter = SpatialQueryFilter::from_excluded_entities([entity]);
        let RaycastWheels {
            wheels, suspension, ..
        } = &mut *raycast;

        contacts.0.clear();
        for (index, host) in wheels.iter_mut().enumerate() {
            let (origin, direction, length) = host.ray(&chassis);
            let hit = Dir3::new(enu_vector_to_bevy_vector(&direction))
                .ok()
                .and_then(|dir| {
                    spatial_query.cast_ray(
                        enu_vector_to_bevy_vector(&origin.coords),
                        dir,
                        length as f32,
                        true,
                        &filter,
                    )
                })
                .map(|hit| {
                    let distance = hit.distance as f64;
                    GroundHit {
                        distance,
                        point: origin + direction * distance,
                        normal: bevy_vector_to_enu_vector(&hit.normal),
                        material: surfaces.get(hit.entity).map_or(0, |s| s.0),
                    }
                });

            let noise = if hit.is_some() {
                roughness.sample(&mut rng.0)
            } else {
                0.0
            };
            let steer_angle = vehicle.wheels().get(index).map_or(0.0, |w| w.steer_angle());
            contacts
                .0
                .push(host.sense(hit, &chassis, steer_angle, suspension, noise, dt));
        }
    }
}

/// RUNTIME (VEHICLE): Runs one fixed tick of every vehicle.
fn step_vehicles(
    time: Res<Time>,
    mut query: Query<(
        &mut Vehicle,
        &DriverControls,
        &WheelContacts,
        &ChassisKinematics,
        &mut VehicleStepOutput,
    )>,
) {
    let dt = time.delta_secs_f64();
    for (mut vehicle, controls, contacts, kinematics, mut output) in &mut query {
        output.0 = vehicle.step(&controls.0, &contacts.0, &kinematics.0, dt);
    }
}

/// RUNTIME (ACTUATION): Spins the wheels and hands the resulting forces to Avian.
fn actuate_vehicles(
    time: Res<Time>,
    mut query: Query<(
        &VehicleStepOutput,
        &ChassisKinematics,
        &mut RaycastWheels,
        &mut ExternalForce,
        &mut ExternalTorque,
        &mut LinearVelocity,
        &mut AngularVelocity,
    )>,
) {
    let dt = time.delta_secs_f64();
    for (output, kinematics, mut raycast, mut force, mut torque, mut linear, mut angular) in
        &mut query
    {
        let chassis = kinematics.0;
        let output = &output.0;
        let mass_share = raycast.mass_share;

        let tire_forces: Vec<AppliedForce> = raycast
            .wheels
            .iter_mut()
            .zip(&output.wheels)
            .filter_map(|(host, command)| host.actuate(command, &chassis, mass_share, dt))
            .collect();

        let center = Point3::from(chassis.pose.translation.vector);
        let wrench = Wrench::about(&center, tire_forces.iter().chain(&output.forces));

        force.set_force(enu_vector_to_bevy_vector(&wrench.force));
        torque.set_torque(enu_vector_to_bevy_vector(&wrench.torque));

        if let Some(velocity) = output.linear_velocity_override {
            linear.0 = enu_vector_to_bevy_vector(&velocity);
        }
        linear.0 += enu_vector_to_bevy_vector(&wrench.velocity_change);
        angular.0 += enu_vector_to_bevy_vector(&(chassis.pose.rotation * output.relative_torque));
    }
}
