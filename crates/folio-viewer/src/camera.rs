//! Chase camera entity.
//!
//! All placement, smoothing and effects are computed by the session's camera
//! rig; this module only writes the resulting frame onto the Bevy camera.

use bevy::prelude::*;
use folio_sim::CameraFrame;

use crate::drive::{Drive, DriveSystems};

/// Background and fog colour.
pub const SKY_COLOR: Color = Color::srgb_u8(0x1a, 0x15, 0x20);

/// Marker for the chase camera.
#[derive(Component)]
pub struct ChaseCamera;

/// Plugin for the chase camera.
pub struct ChaseCameraPlugin;

impl Plugin for ChaseCameraPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(SKY_COLOR))
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, apply_camera_frame.in_set(DriveSystems::Present));
    }
}

fn spawn_camera(mut commands: Commands, drive: Res<Drive>) {
    let frame = drive.0.camera().frame();

    commands.spawn((
        Name::new("Chase camera"),
        ChaseCamera,
        Camera3d::default(),
        camera_transform(&frame),
        Projection::Perspective(PerspectiveProjection {
            fov: frame.fov.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..Default::default()
        }),
        DistanceFog {
            color: SKY_COLOR,
            falloff: FogFalloff::Linear {
                start: 30.0,
                end: 80.0,
            },
            ..default()
        },
        AmbientLight {
            color: Color::srgb_u8(0xff, 0xee, 0xdd),
            brightness: 400.0,
            ..default()
        },
    ));
}

/// Transform looking from the frame position at its target, rolled about the
/// view axis.
pub fn camera_transform(frame: &CameraFrame) -> Transform {
    let mut transform = Transform::from_translation(frame.position);
    if frame.look_at != frame.position {
        transform.look_at(frame.look_at, Vec3::Y);
    }
    transform.rotate_local_z(frame.roll);
    transform
}

fn apply_camera_frame(
    drive: Res<Drive>,
    mut camera_query: Query<(&mut Transform, &mut Projection), With<ChaseCamera>>,
) {
    let frame = drive.0.camera().frame();

    for (mut transform, mut projection) in &mut camera_query {
        *transform = camera_transform(&frame);
        if let Projection::Perspective(perspective) = &mut *projection {
            perspective.fov = frame.fov.to_radians();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(roll: f32) -> CameraFrame {
        CameraFrame {
            position: Vec3::new(0.0, 8.0, 12.0),
            look_at: Vec3::ZERO,
            fov: 60.0,
            roll,
        }
    }

    #[test]
    fn test_camera_looks_at_target() {
        let transform = camera_transform(&frame(0.0));
        let expected = (Vec3::ZERO - Vec3::new(0.0, 8.0, 12.0)).normalize();
        assert!((transform.forward().as_vec3() - expected).length() < 1e-5);
        assert!(transform.right().y.abs() < 1e-5);
    }

    #[test]
    fn test_roll_tilts_horizon_only() {
        let level = camera_transform(&frame(0.0));
        let rolled = camera_transform(&frame(0.02));
        assert!((level.forward().as_vec3() - rolled.forward().as_vec3()).length() < 1e-5);
        assert!(rolled.right().y.abs() > 0.01);
    }

    #[test]
    fn test_degenerate_frame_keeps_orientation() {
        let mut degenerate = frame(0.0);
        degenerate.look_at = degenerate.position;
        let transform = camera_transform(&degenerate);
        assert!(transform.rotation.is_finite());
    }
}
