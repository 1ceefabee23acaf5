//! Static environment: sky dome, ground, roads, buildings, trees, rocks,
//! boundary walls and lighting.

use avian3d::prelude::*;
use bevy::{
    light::{NotShadowCaster, light_consts::lux},
    mesh::VertexAttributeValues,
    prelude::*,
    render::render_resource::Face,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::launch_params::LaunchParams;

/// Side length of the square play area.
const WORLD_SIZE: f32 = 100.0;
/// Width of the two crossing roads.
const ROAD_WIDTH: f32 = 6.0;
const TREE_COUNT: usize = 40;
const ROCK_COUNT: usize = 15;
/// Trees keep out of this half-extent around the spawn point.
const CLEAR_RADIUS: f32 = 8.0;
const WALL_HEIGHT: f32 = 10.0;

/// Radius of the sky dome; inside the camera's far plane.
const SKY_RADIUS: f32 = 200.0;
/// Sky dome spin in radians per second.
const SKY_SPIN: f32 = 0.006;
const SKY_HORIZON: Srgba = Srgba::rgb(1.0, 0.42, 0.208);
const SKY_ZENITH: Srgba = Srgba::rgb(0.176, 0.106, 0.306);
/// Shifts the gradient so the horizon colour reaches above eye level.
const SKY_OFFSET: f32 = 20.0;
const SKY_EXPONENT: f32 = 0.6;

/// The slowly turning sky dome.
#[derive(Component)]
pub struct SkyDome;

/// Building footprint centre, height and colour.
const BUILDINGS: [(Vec2, f32, [u8; 3]); 8] = [
    (Vec2::new(15.0, 15.0), 8.0, [0xe8, 0xd4, 0xc4]),
    (Vec2::new(-15.0, 15.0), 6.0, [0xd4, 0xc4, 0xb4]),
    (Vec2::new(15.0, -15.0), 10.0, [0xc4, 0xb4, 0xa4]),
    (Vec2::new(-15.0, -15.0), 7.0, [0xf0, 0xe0, 0xd0]),
    (Vec2::new(25.0, 0.0), 5.0, [0xdd, 0xdd, 0xdd]),
    (Vec2::new(-25.0, 0.0), 9.0, [0xcc, 0xcc, 0xcc]),
    (Vec2::new(0.0, 25.0), 6.0, [0xe0, 0xd0, 0xc0]),
    (Vec2::new(0.0, -25.0), 8.0, [0xd0, 0xc0, 0xb0]),
];

/// Plugin for the static environment.
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (spawn_sky, spawn_lights, spawn_ground, spawn_props))
            .add_systems(Update, rotate_sky);
    }
}

/// Sky colour seen along `position` from the dome centre.
fn sky_gradient(position: Vec3) -> Srgba {
    let height = (position + Vec3::splat(SKY_OFFSET))
        .normalize_or_zero()
        .y
        .max(0.0);
    SKY_HORIZON.mix(&SKY_ZENITH, height.powf(SKY_EXPONENT))
}

/// Inward-facing sphere with the gradient baked into vertex colours.
fn sky_mesh() -> Mesh {
    let mut mesh = Sphere::new(SKY_RADIUS).mesh().uv(32, 16);
    let colors: Option<Vec<[f32; 4]>> = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
        Some(VertexAttributeValues::Float32x3(positions)) => Some(
            positions
                .iter()
                .map(|&p| LinearRgba::from(sky_gradient(Vec3::from(p))).to_f32_array())
                .collect(),
        ),
        _ => None,
    };
    if let Some(colors) = colors {
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    }
    mesh
}

fn spawn_sky(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("Sky"),
        SkyDome,
        Mesh3d(meshes.add(sky_mesh())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            unlit: true,
            // Distance fog ends well inside the dome.
            fog_enabled: false,
            cull_mode: Some(Face::Front),
            ..default()
        })),
        Transform::default(),
        NotShadowCaster,
    ));
}

fn rotate_sky(time: Res<Time>, mut sky_query: Query<&mut Transform, With<SkyDome>>) {
    for mut transform in &mut sky_query {
        transform.rotate_y(SKY_SPIN * time.delta_secs());
    }
}

fn spawn_lights(mut commands: Commands) {
    // Sun.
    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            color: Color::srgb_u8(0xff, 0xf5, 0xe6),
            illuminance: lux::AMBIENT_DAYLIGHT,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(30.0, 50.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Cool fill light from the opposite side.
    commands.spawn((
        Name::new("Fill light"),
        DirectionalLight {
            color: Color::srgb_u8(0xa0, 0xc4, 0xff),
            illuminance: lux::AMBIENT_DAYLIGHT * 0.2,
            ..default()
        },
        Transform::from_xyz(-20.0, 30.0, -10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

fn spawn_ground(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("Ground"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(WORLD_SIZE, WORLD_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb_u8(0x4a, 0x7c, 0x4e),
            perceptual_roughness: 0.9,
            ..default()
        })),
        Transform::default(),
        RigidBody::Static,
        Collider::half_space(Vec3::Y),
    ));

    let road_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x33, 0x33, 0x33),
        perceptual_roughness: 0.8,
        ..default()
    });
    for size in [
        Vec2::new(ROAD_WIDTH, WORLD_SIZE),
        Vec2::new(WORLD_SIZE, ROAD_WIDTH),
    ] {
        commands.spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(size.x, size.y))),
            MeshMaterial3d(road_material.clone()),
            Transform::from_xyz(0.0, 0.01, 0.0),
        ));
    }

    // Dashed centre lines.
    let marking_material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        unlit: true,
        ..default()
    });
    let along_x = meshes.add(Plane3d::default().mesh().size(2.0, 0.2));
    let along_z = meshes.add(Plane3d::default().mesh().size(0.2, 2.0));
    for i in 0..20u8 {
        let offset = -45.0 + f32::from(i) * 5.0;
        commands.spawn((
            Mesh3d(along_x.clone()),
            MeshMaterial3d(marking_material.clone()),
            Transform::from_xyz(offset, 0.02, 0.0),
        ));
        commands.spawn((
            Mesh3d(along_z.clone()),
            MeshMaterial3d(marking_material.clone()),
            Transform::from_xyz(0.0, 0.02, offset),
        ));
    }

    // Invisible boundary walls.
    let half = WORLD_SIZE / 2.0;
    for (position, size) in [
        (Vec3::new(0.0, 5.0, -half), Vec3::new(WORLD_SIZE, WALL_HEIGHT, 1.0)),
        (Vec3::new(0.0, 5.0, half), Vec3::new(WORLD_SIZE, WALL_HEIGHT, 1.0)),
        (Vec3::new(-half, 5.0, 0.0), Vec3::new(1.0, WALL_HEIGHT, WORLD_SIZE)),
        (Vec3::new(half, 5.0, 0.0), Vec3::new(1.0, WALL_HEIGHT, WORLD_SIZE)),
    ] {
        commands.spawn((
            Name::new("Boundary wall"),
            Transform::from_translation(position),
            RigidBody::Static,
            Collider::cuboid(size.x, size.y, size.z),
        ));
    }
}

/// Random tree position outside the clear area around the spawn point.
fn tree_position(rng: &mut impl Rng) -> Vec3 {
    let extent = WORLD_SIZE * 0.4;
    loop {
        let x = rng.random_range(-extent..extent);
        let z = rng.random_range(-extent..extent);
        if x.abs() >= CLEAR_RADIUS || z.abs() >= CLEAR_RADIUS {
            return Vec3::new(x, 0.0, z);
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn spawn_props(
    mut commands: Commands,
    params: Res<LaunchParams>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Offset from the marker seed so props and markers draw different numbers.
    let mut rng = SmallRng::seed_from_u64(params.seed.wrapping_add(1));

    // Buildings.
    let roof_mesh = meshes.add(Cuboid::new(3.2, 0.3, 3.2));
    let roof_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x55, 0x55, 0x55),
        perceptual_roughness: 0.7,
        ..default()
    });
    let window_mesh = meshes.add(Cuboid::new(0.02, 0.8, 0.6));
    let window_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x87, 0xce, 0xeb),
        emissive: Color::srgb_u8(0x4a, 0x90, 0xd9).to_linear() * 0.2,
        ..default()
    });

    for (centre, height, [r, g, b]) in BUILDINGS {
        commands
            .spawn((
                Name::new("Building"),
                Transform::from_xyz(centre.x, 0.0, centre.y),
                Visibility::default(),
            ))
            .with_children(|building| {
                building.spawn((
                    Mesh3d(meshes.add(Cuboid::new(3.0, height, 3.0))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgb_u8(r, g, b),
                        perceptual_roughness: 0.6,
                        ..default()
                    })),
                    Transform::from_xyz(0.0, height / 2.0, 0.0),
                    RigidBody::Static,
                    Collider::cuboid(3.0, height, 3.0),
                ));
                building.spawn((
                    Mesh3d(roof_mesh.clone()),
                    MeshMaterial3d(roof_material.clone()),
                    Transform::from_xyz(0.0, height + 0.5, 0.0),
                ));
                // Two windows per floor on opposite walls.
                for floor in 0..(height / 2.0).floor() as u8 {
                    let y = 1.5 + f32::from(floor) * 2.0;
                    for x in [1.51, -1.51] {
                        building.spawn((
                            Mesh3d(window_mesh.clone()),
                            MeshMaterial3d(window_material.clone()),
                            Transform::from_xyz(x, y, 0.0),
                        ));
                    }
                }
            });
    }

    // Trees: trunk plus three stacked cones.
    let trunk_mesh = meshes.add(ConicalFrustum {
        radius_top: 0.15,
        radius_bottom: 0.2,
        height: 2.0,
    });
    let trunk_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x8b, 0x45, 0x13),
        perceptual_roughness: 0.9,
        ..default()
    });
    let foliage = [
        (1.2, 2.0, 2.5, [0x22, 0x8b, 0x22]),
        (0.9, 1.5, 3.5, [0x2e, 0x8b, 0x2e]),
        (0.5, 1.0, 4.3, [0x32, 0xcd, 0x32]),
    ]
    .map(|(radius, height, y, [r, g, b])| {
        (
            meshes.add(Cone { radius, height }),
            materials.add(StandardMaterial {
                base_color: Color::srgb_u8(r, g, b),
                perceptual_roughness: 0.8,
                ..default()
            }),
            y,
        )
    });

    for _ in 0..TREE_COUNT {
        let scale = rng.random_range(0.8..1.4);
        commands
            .spawn((
                Name::new("Tree"),
                Transform::from_translation(tree_position(&mut rng))
                    .with_scale(Vec3::splat(scale)),
                Visibility::default(),
            ))
            .with_children(|tree| {
                tree.spawn((
                    Mesh3d(trunk_mesh.clone()),
                    MeshMaterial3d(trunk_material.clone()),
                    Transform::from_xyz(0.0, 1.0, 0.0),
                ));
                for (mesh, material, y) in &foliage {
                    tree.spawn((
                        Mesh3d(mesh.clone()),
                        MeshMaterial3d(material.clone()),
                        Transform::from_xyz(0.0, *y, 0.0),
                    ));
                }
            });
    }

    // Rocks.
    let rock_mesh = meshes.add(Sphere::new(1.0).mesh().uv(5, 3));
    let rock_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x77, 0x77, 0x77),
        perceptual_roughness: 0.9,
        ..default()
    });
    let rock_extent = WORLD_SIZE * 0.35;
    for _ in 0..ROCK_COUNT {
        let scale = rng.random_range(0.3..0.8);
        let x = rng.random_range(-rock_extent..rock_extent);
        let z = rng.random_range(-rock_extent..rock_extent);
        commands.spawn((
            Name::new("Rock"),
            Mesh3d(rock_mesh.clone()),
            MeshMaterial3d(rock_material.clone()),
            Transform::from_xyz(x, 0.5, z).with_scale(Vec3::splat(scale)),
            RigidBody::Static,
            Collider::sphere(1.0),
        ));
    }

    tracing::info!(
        "Spawned {} buildings, {TREE_COUNT} trees and {ROCK_COUNT} rocks",
        BUILDINGS.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trees_avoid_spawn_area() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..500 {
            let position = tree_position(&mut rng);
            assert!(position.x.abs() >= CLEAR_RADIUS || position.z.abs() >= CLEAR_RADIUS);
            assert!(position.x.abs() <= WORLD_SIZE / 2.0);
        }
    }

    #[test]
    fn test_sky_fades_from_horizon_to_zenith() {
        let below = sky_gradient(Vec3::new(0.0, -SKY_RADIUS, 0.0));
        assert_eq!(below, SKY_HORIZON);

        let zenith = sky_gradient(Vec3::new(0.0, SKY_RADIUS, 0.0));
        let horizon = sky_gradient(Vec3::new(SKY_RADIUS, 0.0, 0.0));
        // Blue rises and red falls towards the top of the dome.
        assert!(zenith.blue > horizon.blue);
        assert!(zenith.red < horizon.red);
        assert!(horizon.red < SKY_HORIZON.red + 1e-6);
    }

    #[test]
    fn test_sky_mesh_has_vertex_colours() {
        let mesh = sky_mesh();
        let positions = mesh.attribute(Mesh::ATTRIBUTE_POSITION).map(VertexAttributeValues::len);
        let colors = mesh.attribute(Mesh::ATTRIBUTE_COLOR).map(VertexAttributeValues::len);
        assert!(positions.is_some());
        assert_eq!(positions, colors);
    }

    #[test]
    fn test_buildings_stay_off_zones() {
        let layout = folio_sim::ZoneLayout::default();
        for (centre, _, _) in BUILDINGS {
            let position = Vec3::new(centre.x, 0.0, centre.y);
            assert!(layout.zone_at(position).is_none());
        }
    }
}
