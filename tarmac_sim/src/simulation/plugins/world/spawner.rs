// tarmac_sim/src/simulation/plugins/world/spawner.rs

use crate::prelude::*;
use avian3d::prelude::{Collider, Friction, RigidBody};

/// Half the side of the square test pad [m].
const PAD_HALF_EXTENT: f32 = 200.0;
const PAD_THICKNESS: f32 = 1.0;

/// Tags a ground collider with its index into the vehicle context's ground
/// material table. Colliders without it read as material 0 (asphalt).
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroundSurface(pub usize);

pub struct WorldSpawnerPlugin;

impl Plugin for WorldSpawnerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::SceneBuilding),
            (
                spawn_ground.in_set(SceneBuildSet::Physics),
                spawn_lighting_and_camera
                    .in_set(SceneBuildSet::Spawn)
                    .run_if(|settings: Res<RunSettings>| !settings.headless),
            ),
        );
    }
}

/// Spawns a flat asphalt pad whose top face is the ENU z = 0 plane.
fn spawn_ground(
    mut commands: Commands,
    settings: Res<RunSettings>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    info!("[SCENE] Spawning ground pad.");
    let size = 2.0 * PAD_HALF_EXTENT;
    let mut ground = commands.spawn((
        Name::new("Ground"),
        RigidBody::Static,
        Collider::cuboid(size, PAD_THICKNESS, size),
        Friction::new(0.9),
        GroundSurface(0),
        Transform::from_xyz(0.0, -0.5 * PAD_THICKNESS, 0.0),
    ));

    if let (false, Some(mut meshes), Some(mut materials)) = (settings.headless, meshes, materials) {
        ground.insert((
            Mesh3d(meshes.add(Cuboid::new(size, PAD_THICKNESS, size))),
            MeshMaterial3d(materials.add(Color::srgb(0.25, 0.25, 0.27))),
        ));
    }
}

fn spawn_lighting_and_camera(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 15_000.0,
            ..default()
        },
        Transform::from_xyz(10.0, 30.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-12.0, 8.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
        Name::new("ChaseCamera"),
    ));
}
