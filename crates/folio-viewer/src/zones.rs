//! Zone markers: a glowing ground decal with pulsing rings and a floating
//! crystal above each point of interest.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use bevy::prelude::*;
use folio_sim::{ZoneId, portfolio};
use rand::{Rng, SeedableRng, rngs::SmallRng};

use crate::{
    drive::{Drive, DriveSystems},
    launch_params::LaunchParams,
};

/// Resting height of the floating crystal.
const MARKER_HEIGHT: f32 = 2.2;
/// Bob amplitude of the floating crystal.
const MARKER_BOB: f32 = 0.4;
/// Crystal spin in radians per second.
const MARKER_SPIN: f32 = 0.48;
/// Outer ring spin in radians per second.
const RING_SPIN: f32 = 0.3;
/// Scale of the crystal while the car is inside its zone.
const ACTIVE_SCALE: f32 = 1.1;
/// Glow light intensity at the bottom of its pulse.
const GLOW_LUMENS: f32 = 60_000.0;

/// Floating crystal of a zone.
#[derive(Component)]
pub struct ZoneMarker {
    pub zone: ZoneId,
    /// Animation phase so markers do not bob in lockstep.
    pub phase: f32,
}

/// Pulsing ground ring.
#[derive(Component)]
pub struct ZoneRing {
    pub phase: f32,
    pub outer: bool,
}

/// Pulsing point light above a zone.
#[derive(Component)]
pub struct ZoneGlow {
    pub phase: f32,
}

/// Plugin for zone markers.
pub struct ZoneMarkerPlugin;

impl Plugin for ZoneMarkerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_zone_markers).add_systems(
            Update,
            (animate_markers, animate_rings, animate_glow).in_set(DriveSystems::Present),
        );
    }
}

fn translucent(color: Color, alpha: f32) -> StandardMaterial {
    StandardMaterial {
        base_color: color.with_alpha(alpha),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        cull_mode: None,
        ..default()
    }
}

/// A flat mesh transform lying on the ground at `height`.
fn on_ground(height: f32) -> Transform {
    Transform::from_xyz(0.0, height, 0.0).with_rotation(Quat::from_rotation_x(-FRAC_PI_2))
}

fn spawn_zone_markers(
    mut commands: Commands,
    drive: Res<Drive>,
    params: Res<LaunchParams>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut rng = SmallRng::seed_from_u64(params.seed);

    let decal_mesh = meshes.add(Circle::new(1.0));
    let inner_ring_mesh = meshes.add(Annulus::new(2.2, 2.8));
    let outer_ring_mesh = meshes.add(Annulus::new(3.2, 3.6));
    let spoke_mesh = meshes.add(Rectangle::new(0.05, 3.5));
    // Four sectors and two stacks make an octahedron.
    let crystal_mesh = meshes.add(Sphere::new(0.8).mesh().uv(4, 2));
    let core_mesh = meshes.add(Sphere::new(0.35));

    for zone in &drive.0.zones().layout().zones {
        let panel = portfolio::panel(zone.id);
        let [r, g, b] = panel.color;
        let color = Color::srgb_u8(r, g, b);
        let phase = rng.random_range(0.0..TAU);

        commands
            .spawn((
                Name::new(format!("Zone {}", zone.id)),
                Transform::from_translation(zone.position),
                Visibility::default(),
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh3d(decal_mesh.clone()),
                    MeshMaterial3d(materials.add(translucent(color, 0.1))),
                    on_ground(0.02).with_scale(Vec3::splat(zone.radius)),
                ));
                parent.spawn((
                    ZoneRing {
                        phase,
                        outer: false,
                    },
                    Mesh3d(inner_ring_mesh.clone()),
                    MeshMaterial3d(materials.add(translucent(color, 0.5))),
                    on_ground(0.03),
                ));
                parent.spawn((
                    ZoneRing { phase, outer: true },
                    Mesh3d(outer_ring_mesh.clone()),
                    MeshMaterial3d(materials.add(translucent(color, 0.3))),
                    on_ground(0.025),
                ));
                let spoke_material = materials.add(translucent(color, 0.3));
                for i in 0..6u8 {
                    parent.spawn((
                        Mesh3d(spoke_mesh.clone()),
                        MeshMaterial3d(spoke_material.clone()),
                        on_ground(0.04).with_rotation(
                            Quat::from_rotation_y(f32::from(i) * PI / 3.0)
                                * Quat::from_rotation_x(-FRAC_PI_2),
                        ),
                    ));
                }

                parent
                    .spawn((
                        ZoneMarker {
                            zone: zone.id,
                            phase,
                        },
                        Transform::from_xyz(0.0, MARKER_HEIGHT, 0.0),
                        Visibility::default(),
                    ))
                    .with_children(|marker| {
                        marker.spawn((
                            Mesh3d(crystal_mesh.clone()),
                            MeshMaterial3d(materials.add(StandardMaterial {
                                base_color: color.with_alpha(0.9),
                                emissive: color.to_linear() * 0.5,
                                metallic: 0.6,
                                perceptual_roughness: 0.2,
                                alpha_mode: AlphaMode::Blend,
                                ..default()
                            })),
                        ));
                        marker.spawn((
                            Mesh3d(core_mesh.clone()),
                            MeshMaterial3d(materials.add(translucent(color, 0.8))),
                        ));
                    });

                parent.spawn((
                    ZoneGlow { phase },
                    PointLight {
                        color,
                        intensity: GLOW_LUMENS,
                        range: 12.0,
                        ..default()
                    },
                    Transform::from_xyz(0.0, 2.0, 0.0),
                ));
            });
    }

    tracing::info!(
        "Spawned {} zone markers",
        drive.0.zones().layout().zones.len()
    );
}

/// Pulse in `[0, 1]`.
fn pulse(elapsed: f32, rate: f32, phase: f32) -> f32 {
    (elapsed * rate + phase).sin() * 0.5 + 0.5
}

fn animate_markers(
    time: Res<Time>,
    drive: Res<Drive>,
    mut marker_query: Query<(&ZoneMarker, &mut Transform)>,
) {
    let elapsed = time.elapsed_secs();
    let active = drive.0.zones().active();

    for (marker, mut transform) in &mut marker_query {
        transform.translation.y = MARKER_HEIGHT + (elapsed * 2.0 + marker.phase).sin() * MARKER_BOB;
        transform.rotate_y(MARKER_SPIN * time.delta_secs());
        let scale = if active == Some(marker.zone) {
            ACTIVE_SCALE
        } else {
            1.0
        };
        transform.scale = Vec3::splat(scale);
    }
}

fn animate_rings(
    time: Res<Time>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut ring_query: Query<(&ZoneRing, &mut Transform, &MeshMaterial3d<StandardMaterial>)>,
) {
    let elapsed = time.elapsed_secs();

    for (ring, mut transform, material) in &mut ring_query {
        let (amount, alpha) = if ring.outer {
            let amount = pulse(elapsed, 2.0, ring.phase + 1.0);
            transform.rotate_local_z(RING_SPIN * time.delta_secs());
            (amount * 0.2, 0.2 + amount * 0.2)
        } else {
            let amount = pulse(elapsed, 3.0, ring.phase);
            (amount * 0.15, 0.4 + amount * 0.3)
        };
        transform.scale = Vec3::splat(1.0 + amount);

        if let Some(material) = materials.get_mut(&material.0) {
            material.base_color.set_alpha(alpha);
        }
    }
}

fn animate_glow(time: Res<Time>, mut glow_query: Query<(&ZoneGlow, &mut PointLight)>) {
    let elapsed = time.elapsed_secs();
    for (glow, mut light) in &mut glow_query {
        light.intensity = GLOW_LUMENS * (1.0 + pulse(elapsed, 4.0, glow.phase));
    }
}
