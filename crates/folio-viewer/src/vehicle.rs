//! The player car: an Avian rigid body with a low-poly body, cabin and
//! wheels.
//!
//! The body never rotates physically (all rotation axes are locked); heading
//! is purely visual and applied to the [`CarVisual`] child each frame, along
//! with wheel steering and spin.

use std::f32::consts::FRAC_PI_2;

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::drive::{Drive, DriveSystems};

/// Bounding box of the car model; also the collider.
const CAR_EXTENTS: Vec3 = Vec3::new(1.35, 1.05, 2.1);

/// Offset from the collider centre to the model origin (wheel contact plane).
const MODEL_OFFSET: Vec3 = Vec3::new(0.0, -0.475, 0.0);

const WHEEL_WIDTH: f32 = 0.15;

/// Wheel positions in model space. Front wheels (negative z) steer.
const WHEEL_POSITIONS: [Vec3; 4] = [
    Vec3::new(-0.6, 0.15, -0.6),
    Vec3::new(0.6, 0.15, -0.6),
    Vec3::new(-0.6, 0.15, 0.6),
    Vec3::new(0.6, 0.15, 0.6),
];

/// Marker for the car's rigid body.
#[derive(Component)]
pub struct Car;

/// Child entity holding the car model; rotated by heading.
#[derive(Component)]
pub struct CarVisual;

/// A wheel of the car model.
#[derive(Component)]
pub struct Wheel {
    pub steers: bool,
}

/// Plugin for the car entity.
pub struct VehiclePlugin;

impl Plugin for VehiclePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_car)
            .add_systems(Update, update_car_visuals.in_set(DriveSystems::Present));
    }
}

fn spawn_car(
    mut commands: Commands,
    drive: Res<Drive>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let tuning = drive.0.vehicle().tuning();

    let body_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0xff, 0x6b, 0x35),
        metallic: 0.6,
        perceptual_roughness: 0.3,
        ..default()
    });
    let cabin_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0xff, 0x8c, 0x5a),
        metallic: 0.5,
        perceptual_roughness: 0.4,
        ..default()
    });
    let glass_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x87, 0xce, 0xeb),
        metallic: 0.8,
        perceptual_roughness: 0.1,
        ..default()
    });
    let wheel_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0x33, 0x33, 0x33),
        metallic: 0.3,
        perceptual_roughness: 0.8,
        ..default()
    });
    let headlight_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0xff, 0xff, 0x99),
        emissive: LinearRgba::rgb(1.0, 1.0, 0.0) * 0.5,
        ..default()
    });
    let taillight_material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(0xff, 0x00, 0x00),
        emissive: LinearRgba::rgb(1.0, 0.0, 0.0) * 0.3,
        ..default()
    });

    let body_mesh = meshes.add(Cuboid::new(1.2, 0.5, 2.0));
    let cabin_mesh = meshes.add(Cuboid::new(1.0, 0.4, 1.0));
    let window_mesh = meshes.add(Cuboid::new(0.9, 0.3, 0.05));
    let wheel_mesh = meshes.add(Cylinder::new(tuning.wheel_radius, WHEEL_WIDTH));
    let headlight_mesh = meshes.add(Sphere::new(0.1));
    let taillight_mesh = meshes.add(Cuboid::new(0.15, 0.1, 0.05));

    commands
        .spawn((
            Name::new("Car"),
            Car,
            Transform::from_translation(tuning.spawn),
            Visibility::default(),
            RigidBody::Dynamic,
            Collider::cuboid(CAR_EXTENTS.x, CAR_EXTENTS.y, CAR_EXTENTS.z),
            LockedAxes::ROTATION_LOCKED,
            LinearDamping(0.5),
            AngularDamping(0.5),
            SleepingDisabled,
        ))
        .with_children(|car| {
            car.spawn((
                CarVisual,
                Transform::from_translation(MODEL_OFFSET),
                Visibility::default(),
            ))
            .with_children(|model| {
                model.spawn((
                    Mesh3d(body_mesh),
                    MeshMaterial3d(body_material),
                    Transform::from_xyz(0.0, 0.4, 0.0),
                ));
                model.spawn((
                    Mesh3d(cabin_mesh),
                    MeshMaterial3d(cabin_material),
                    Transform::from_xyz(0.0, 0.8, 0.2),
                ));
                for z in [-0.3, 0.7] {
                    model.spawn((
                        Mesh3d(window_mesh.clone()),
                        MeshMaterial3d(glass_material.clone()),
                        Transform::from_xyz(0.0, 0.85, z),
                    ));
                }
                for position in WHEEL_POSITIONS {
                    model.spawn((
                        Wheel {
                            steers: position.z < 0.0,
                        },
                        Mesh3d(wheel_mesh.clone()),
                        MeshMaterial3d(wheel_material.clone()),
                        Transform::from_translation(position)
                            .with_rotation(Quat::from_rotation_z(FRAC_PI_2)),
                    ));
                }
                for x in [-0.35, 0.35] {
                    model.spawn((
                        Mesh3d(headlight_mesh.clone()),
                        MeshMaterial3d(headlight_material.clone()),
                        Transform::from_xyz(x, 0.4, -1.0),
                    ));
                }
                for x in [-0.4, 0.4] {
                    model.spawn((
                        Mesh3d(taillight_mesh.clone()),
                        MeshMaterial3d(taillight_material.clone()),
                        Transform::from_xyz(x, 0.4, 1.0),
                    ));
                }
            });
        });

    tracing::info!("Spawned car at {}", tuning.spawn);
}

/// Rotation of a wheel: laid on its side, spun about the axle, then steered.
fn wheel_rotation(steer: f32, spin: f32) -> Quat {
    Quat::from_rotation_y(steer) * Quat::from_rotation_x(spin) * Quat::from_rotation_z(FRAC_PI_2)
}

fn update_car_visuals(
    drive: Res<Drive>,
    mut visual_query: Query<&mut Transform, (With<CarVisual>, Without<Wheel>)>,
    mut wheel_query: Query<(&Wheel, &mut Transform), Without<CarVisual>>,
) {
    let state = drive.0.vehicle().state();

    for mut transform in &mut visual_query {
        transform.rotation = Quat::from_rotation_y(state.heading);
    }

    // Forward is -z, so a wheel rolling forward spins negatively about x.
    let spin = -state.wheel_phase;
    for (wheel, mut transform) in &mut wheel_query {
        let steer = if wheel.steers {
            state.steering_angle
        } else {
            0.0
        };
        transform.rotation = wheel_rotation(steer, spin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_sits_on_collider_floor() {
        // Wheel bottoms touch the bottom face of the collider.
        let wheel_bottom = MODEL_OFFSET.y + WHEEL_POSITIONS[0].y - 0.2;
        assert!((wheel_bottom + CAR_EXTENTS.y / 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_wheel_axle_follows_steering() {
        let axle = wheel_rotation(0.0, 1.3) * Vec3::Y;
        assert!((axle - Vec3::NEG_X).length() < 1e-5 || (axle - Vec3::X).length() < 1e-5);

        let steered = wheel_rotation(0.5, 0.0) * Vec3::Y;
        assert!(steered.y.abs() < 1e-5);
        assert!(steered.z.abs() > 0.4);
    }
}
