//! Smoothed third-person chase camera.
//!
//! Every tick computes a desired frame on a circle around the vehicle (azimuth
//! and height from the orbit offset), then eases the previous frame toward it.
//! Position and look-at use a frame-rate-independent exponential factor.
//! Shake, roll and field of view are layered on top.

use glam::Vec3;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::{
    error::{self, ConfigError, check_positive, check_range},
    orbit::OrbitOffset,
};

/// Reference tick rate the per-tick effect rates were tuned at.
const REFERENCE_HZ: f32 = 60.0;

// ============================================================================
// Tuning
// ============================================================================

/// Camera placement, smoothing and effect constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraTuning {
    /// Frame shown before the first tick.
    pub initial_position: Vec3,
    pub initial_look_at: Vec3,
    /// Horizontal distance from the vehicle.
    pub distance: f32,
    /// Height above the vehicle at zero pitch.
    pub base_height: f32,
    /// Height added per radian of orbit pitch.
    pub pitch_height_scale: f32,

    /// Position smoothing: `(1 - base^dt) * response`.
    pub position_base: f32,
    pub position_response: f32,
    /// Look-at smoothing: `(1 - base^dt) * response`.
    pub look_base: f32,
    pub look_response: f32,

    /// Rate the lagged heading follows the real heading (per reference tick).
    pub tilt_rate: f32,
    /// Multiplier on the heading lag before taking its sine.
    pub roll_frequency: f32,
    /// Maximum roll in radians.
    pub roll_amplitude: f32,
    /// Rate roll follows its target (per reference tick).
    pub roll_rate: f32,

    /// Speed above which the camera shakes continuously.
    pub shake_speed_threshold: f32,
    pub shake_speed_intensity: f32,
    /// Per-tick speed change above which the camera jolts.
    pub shake_delta_threshold: f32,
    pub shake_delta_intensity: f32,
    /// Vertical jitter relative to horizontal.
    pub shake_vertical_scale: f32,
    /// Rate the shake offset follows fresh jitter (per reference tick).
    pub shake_rate: f32,

    /// Field of view at rest (degrees).
    pub base_fov: f32,
    /// Degrees added per unit of speed.
    pub fov_per_speed: f32,
    /// Upper bound for the field of view (degrees).
    pub max_fov: f32,
    /// Rate FOV follows its target (per reference tick).
    pub fov_rate: f32,
}

impl Default for CameraTuning {
    fn default() -> Self {
        Self {
            initial_position: Vec3::new(0.0, 8.0, 12.0),
            initial_look_at: Vec3::ZERO,
            distance: 14.0,
            base_height: 7.0,
            pitch_height_scale: 10.0,
            position_base: 0.0005,
            position_response: 4.0,
            look_base: 0.0001,
            look_response: 6.0,
            tilt_rate: 0.1,
            roll_frequency: 10.0,
            roll_amplitude: 0.02,
            roll_rate: 0.1,
            shake_speed_threshold: 10.0,
            shake_speed_intensity: 0.05,
            shake_delta_threshold: 3.0,
            shake_delta_intensity: 0.08,
            shake_vertical_scale: 0.5,
            shake_rate: 0.3,
            base_fov: 60.0,
            fov_per_speed: 0.5,
            max_fov: 75.0,
            fov_rate: 0.05,
        }
    }
}

impl CameraTuning {
    pub(crate) fn validate(&self) -> error::Result<()> {
        if !(self.initial_position.is_finite() && self.initial_look_at.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "camera.initial_position",
                value: f32::NAN,
                expected: "finite",
            });
        }
        check_positive("camera.distance", self.distance)?;
        check_range("camera.base_height", self.base_height, .., "finite")?;
        check_range(
            "camera.pitch_height_scale",
            self.pitch_height_scale,
            ..,
            "finite",
        )?;
        for (field, base) in [
            ("camera.position_base", self.position_base),
            ("camera.look_base", self.look_base),
        ] {
            check_range(field, base, 0.0..1.0, "[0, 1)")?;
        }
        check_positive("camera.position_response", self.position_response)?;
        check_positive("camera.look_response", self.look_response)?;
        for (field, rate) in [
            ("camera.tilt_rate", self.tilt_rate),
            ("camera.roll_rate", self.roll_rate),
            ("camera.shake_rate", self.shake_rate),
            ("camera.fov_rate", self.fov_rate),
        ] {
            check_range(field, rate, 0.0..=1.0, "[0, 1]")?;
        }
        check_range("camera.roll_amplitude", self.roll_amplitude, 0.0.., ">= 0")?;
        check_range(
            "camera.shake_vertical_scale",
            self.shake_vertical_scale,
            0.0..,
            ">= 0",
        )?;
        check_range("camera.base_fov", self.base_fov, 1.0..179.0, "[1, 179)")?;
        if !(self.max_fov.is_finite() && self.max_fov >= self.base_fov && self.max_fov < 179.0) {
            return Err(ConfigError::InvertedRange {
                min_field: "camera.base_fov",
                max_field: "camera.max_fov",
            });
        }
        Ok(())
    }
}

/// Toggles for the secondary camera effects.
///
/// Constrained devices run with [`CameraEffects::reduced`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraEffects {
    pub shake: bool,
    pub roll: bool,
    pub dynamic_fov: bool,
}

impl Default for CameraEffects {
    fn default() -> Self {
        Self {
            shake: true,
            roll: true,
            dynamic_fov: true,
        }
    }
}

impl CameraEffects {
    /// No shake or roll; the speed-driven FOV stays.
    pub fn reduced() -> Self {
        Self {
            shake: false,
            roll: false,
            dynamic_fov: true,
        }
    }
}

// ============================================================================
// Frame
// ============================================================================

/// What the renderer applies to the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Rotation about the view axis in radians.
    pub roll: f32,
}

/// Vehicle state the rig follows.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CameraInput {
    pub target: Vec3,
    pub heading: f32,
    pub speed: f32,
    pub orbit: OrbitOffset,
}

/// Position or look-at lerp factor for a tick of `dt` seconds.
///
/// Clamped to 1 so a long frame lands on the target instead of past it.
pub fn smoothing_factor(base: f32, response: f32, dt: f32) -> f32 {
    ((1.0 - base.powf(dt)) * response).clamp(0.0, 1.0)
}

/// Convert a per-reference-tick lerp rate into a factor for `dt` seconds.
pub fn damp(rate: f32, dt: f32) -> f32 {
    1.0 - (1.0 - rate.clamp(0.0, 1.0)).powf(dt * REFERENCE_HZ)
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

// ============================================================================
// Rig
// ============================================================================

/// Chase camera state carried between ticks.
#[derive(Clone, Debug)]
pub struct CameraRig {
    tuning: CameraTuning,
    effects: CameraEffects,
    frame: CameraFrame,
    shake: Vec3,
    lagged_heading: Option<f32>,
    last_speed: f32,
    rng: SmallRng,
}

impl CameraRig {
    pub fn new(tuning: CameraTuning, effects: CameraEffects, seed: u64) -> Self {
        let frame = CameraFrame {
            position: tuning.initial_position,
            look_at: tuning.initial_look_at,
            fov: tuning.base_fov,
            roll: 0.0,
        };
        Self {
            tuning,
            effects,
            frame,
            shake: Vec3::ZERO,
            lagged_heading: None,
            last_speed: 0.0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// The current frame. Before the first tick this is the initial frame.
    pub fn frame(&self) -> CameraFrame {
        self.frame
    }

    pub fn effects(&self) -> CameraEffects {
        self.effects
    }

    pub fn set_effects(&mut self, effects: CameraEffects) {
        self.effects = effects;
    }

    /// Current shake offset.
    pub fn shake(&self) -> Vec3 {
        self.shake
    }

    /// Position the camera is easing toward, without shake.
    pub fn desired_position(&self, input: &CameraInput) -> Vec3 {
        let tuning = &self.tuning;
        let yaw = input.orbit.yaw;
        let height = tuning.base_height + input.orbit.pitch * tuning.pitch_height_scale;
        input.target
            + Vec3::new(
                yaw.sin() * tuning.distance,
                height,
                yaw.cos() * tuning.distance,
            )
    }

    /// Advance one tick and return the new frame.
    pub fn update(&mut self, input: &CameraInput, dt: f32) -> CameraFrame {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let roll_target = self.update_roll_target(input.heading, dt);
        self.update_shake(input.speed, dt);

        let desired = self.desired_position(input) + self.shake;
        let tuning = &self.tuning;
        let position_alpha = smoothing_factor(tuning.position_base, tuning.position_response, dt);
        let look_alpha = smoothing_factor(tuning.look_base, tuning.look_response, dt);
        self.frame.position = self.frame.position.lerp(desired, position_alpha);
        self.frame.look_at = self.frame.look_at.lerp(input.target, look_alpha);

        self.frame.roll = lerp(self.frame.roll, roll_target, damp(tuning.roll_rate, dt));

        let fov_target = if self.effects.dynamic_fov {
            (tuning.base_fov + input.speed.abs() * tuning.fov_per_speed).min(tuning.max_fov)
        } else {
            tuning.base_fov
        };
        self.frame.fov = lerp(self.frame.fov, fov_target, damp(tuning.fov_rate, dt))
            .min(tuning.max_fov)
            .max(tuning.base_fov);

        self.frame
    }

    /// Advance the lagged heading and return the roll the camera leans toward.
    fn update_roll_target(&mut self, heading: f32, dt: f32) -> f32 {
        let lagged = self.lagged_heading.unwrap_or(heading);
        let lag = heading - lagged;
        self.lagged_heading = Some(lerp(lagged, heading, damp(self.tuning.tilt_rate, dt)));

        if self.effects.roll {
            (lag * self.tuning.roll_frequency).sin() * self.tuning.roll_amplitude
        } else {
            0.0
        }
    }

    /// Move the shake offset toward fresh jitter scaled by the current
    /// intensity.
    fn update_shake(&mut self, speed: f32, dt: f32) {
        let tuning = &self.tuning;
        let speed_delta = (speed - self.last_speed).abs();
        self.last_speed = speed;

        let intensity = if !self.effects.shake {
            0.0
        } else if speed > tuning.shake_speed_threshold {
            tuning.shake_speed_intensity
        } else if speed_delta > tuning.shake_delta_threshold {
            tuning.shake_delta_intensity
        } else {
            0.0
        };

        let jitter = if intensity > 0.0 {
            Vec3::new(
                self.rng.random_range(-0.5..0.5),
                self.rng.random_range(-0.5..0.5) * tuning.shake_vertical_scale,
                self.rng.random_range(-0.5..0.5),
            ) * intensity
        } else {
            Vec3::ZERO
        };

        self.shake = self.shake.lerp(jitter, damp(tuning.shake_rate, dt));
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn rig() -> CameraRig {
        CameraRig::new(CameraTuning::default(), CameraEffects::default(), 7)
    }

    #[test]
    fn test_initial_frame() {
        let frame = rig().frame();
        assert_eq!(frame.position, Vec3::new(0.0, 8.0, 12.0));
        assert_eq!(frame.look_at, Vec3::ZERO);
        assert!((frame.fov - 60.0).abs() < f32::EPSILON);
        assert!(frame.roll.abs() < f32::EPSILON);
    }

    #[test]
    fn test_desired_position_on_orbit_circle() {
        let rig = rig();
        let input = CameraInput {
            target: Vec3::new(1.0, 0.5, -2.0),
            orbit: OrbitOffset {
                yaw: std::f32::consts::FRAC_PI_2,
                pitch: 0.2,
            },
            ..Default::default()
        };
        let desired = rig.desired_position(&input);
        assert!(desired.abs_diff_eq(Vec3::new(15.0, 9.5, -2.0), 1e-4));
    }

    #[test]
    fn test_smoothing_factor_values() {
        let alpha = smoothing_factor(0.0005, 4.0, DT);
        assert!((alpha - (1.0 - 0.0005f32.powf(DT)) * 4.0).abs() < 1e-6);
        assert!(alpha > 0.0 && alpha < 1.0);

        // A long hitch clamps instead of overshooting.
        assert!((smoothing_factor(0.0005, 4.0, 2.0) - 1.0).abs() < f32::EPSILON);
        assert!(smoothing_factor(0.0005, 4.0, 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_damp_matches_rate_at_reference_tick() {
        assert!((damp(0.1, DT) - 0.1).abs() < 1e-5);
        // Two half-length ticks compose to one full tick.
        let half = damp(0.1, DT / 2.0);
        let composed = 1.0 - (1.0 - half) * (1.0 - half);
        assert!((composed - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_first_tick_does_not_teleport() {
        let mut rig = rig();
        let input = CameraInput {
            target: Vec3::new(100.0, 0.0, 100.0),
            ..Default::default()
        };
        let frame = rig.update(&input, DT);
        let desired = rig.desired_position(&input);
        let start = CameraTuning::default().initial_position;
        assert!(frame.position.distance(desired) > 0.4 * start.distance(desired));
    }

    #[test]
    fn test_fov_rises_with_speed_and_clamps() {
        let mut rig = rig();
        let input = CameraInput {
            speed: 5.0,
            ..Default::default()
        };
        let frame = rig.update(&input, DT);
        assert!(frame.fov > 60.0);
        assert!(frame.fov < 62.5);

        let fast = CameraInput {
            speed: 200.0,
            ..Default::default()
        };
        for _ in 0..600 {
            let frame = rig.update(&fast, DT);
            assert!((60.0..=75.0).contains(&frame.fov));
        }
        assert!((rig.frame().fov - 75.0).abs() < 1e-3);
    }

    #[test]
    fn test_fixed_fov_when_dynamic_disabled() {
        let effects = CameraEffects {
            dynamic_fov: false,
            ..Default::default()
        };
        let mut rig = CameraRig::new(CameraTuning::default(), effects, 1);
        let input = CameraInput {
            speed: 30.0,
            ..Default::default()
        };
        let frame = rig.update(&input, DT);
        assert!((frame.fov - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_roll_follows_turns_and_settles() {
        let mut rig = rig();
        let mut input = CameraInput::default();
        // A gentle turn keeps the heading lag inside the first lobe of the sine.
        for _ in 0..30 {
            input.heading += 0.005;
            rig.update(&input, DT);
        }
        assert!(rig.frame().roll > 0.0);
        assert!(rig.frame().roll <= 0.02);

        for _ in 0..600 {
            rig.update(&input, DT);
        }
        assert!(rig.frame().roll.abs() < 1e-4);
    }

    #[test]
    fn test_no_roll_when_reduced() {
        let mut rig = CameraRig::new(CameraTuning::default(), CameraEffects::reduced(), 1);
        let mut input = CameraInput::default();
        for _ in 0..30 {
            input.heading += 2.5 * DT;
            input.speed = 20.0;
            let frame = rig.update(&input, DT);
            assert!(frame.roll.abs() < f32::EPSILON);
        }
        assert_eq!(rig.shake(), Vec3::ZERO);
    }

    #[test]
    fn test_shake_at_high_speed_then_settles() {
        let mut rig = rig();
        let fast = CameraInput {
            speed: 15.0,
            ..Default::default()
        };
        let mut max_shake: f32 = 0.0;
        for _ in 0..30 {
            rig.update(&fast, DT);
            max_shake = max_shake.max(rig.shake().length());
            assert!(rig.shake().x.abs() <= 0.025 + 1e-6);
            assert!(rig.shake().y.abs() <= 0.0125 + 1e-6);
        }
        assert!(max_shake > 0.0);

        // Slow down gradually so the speed delta never triggers a jolt.
        let mut speed = 15.0;
        while speed > 0.0 {
            speed = f32::max(speed - 1.0, 0.0);
            rig.update(
                &CameraInput {
                    speed,
                    ..Default::default()
                },
                DT,
            );
        }
        for _ in 0..300 {
            rig.update(&CameraInput::default(), DT);
        }
        assert!(rig.shake().length() < 1e-6);
    }

    #[test]
    fn test_speed_jolt_shakes() {
        let mut rig = rig();
        rig.update(
            &CameraInput {
                speed: 5.0,
                ..Default::default()
            },
            DT,
        );
        assert!(rig.shake().length() > 0.0);
    }

    #[test]
    fn test_same_seed_same_shake() {
        let input = CameraInput {
            speed: 12.0,
            ..Default::default()
        };
        let mut a = rig();
        let mut b = rig();
        for _ in 0..10 {
            assert_eq!(a.update(&input, DT), b.update(&input, DT));
        }
    }

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(CameraTuning::default().validate().is_ok());
        let bad = CameraTuning {
            max_fov: 50.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    proptest! {
        #[test]
        fn test_converges_monotonically_to_stationary_target(
            x in -200.0f32..200.0,
            z in -200.0f32..200.0,
            yaw in -10.0f32..10.0,
            pitch in -0.5f32..0.5,
            dt in 0.001f32..0.1,
        ) {
            let mut rig = rig();
            let input = CameraInput {
                target: Vec3::new(x, 0.0, z),
                heading: 0.0,
                speed: 0.0,
                orbit: OrbitOffset { yaw, pitch },
            };
            let desired = rig.desired_position(&input);
            let mut distance = rig.frame().position.distance(desired);
            let mut look_distance = rig.frame().look_at.distance(input.target);
            for _ in 0..200 {
                let frame = rig.update(&input, dt);
                let next = frame.position.distance(desired);
                let next_look = frame.look_at.distance(input.target);
                prop_assert!(next <= distance + 1e-4);
                prop_assert!(next_look <= look_distance + 1e-4);
                if distance > 0.1 {
                    prop_assert!(next < distance);
                }
                distance = next;
                look_distance = next_look;
            }
        }
    }
}
