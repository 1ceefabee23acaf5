//! Arcade vehicle dynamics layered over an external rigid body.
//!
//! The simulator owns heading, thrust, friction and the jump decision; the
//! rigid body owns gravity, collisions and the resulting position. Each tick
//! reads the body's velocity, writes a new target velocity and reads back the
//! position the body reports.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    error::{self, ConfigError, check_positive, check_range},
    input::ControlIntent,
};

/// The subset of a rigid body the simulator talks to.
///
/// Orientation and angular velocity are never touched: rotation is locked on
/// the body and heading lives entirely in [`VehicleState`].
pub trait RigidBodyHandle {
    fn linear_velocity(&self) -> Vec3;
    fn set_linear_velocity(&mut self, velocity: Vec3, wake: bool);
    fn position(&self) -> Vec3;
}

// ============================================================================
// Tuning
// ============================================================================

/// Vehicle handling constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuning {
    /// Forward thrust speed without boost.
    pub base_speed: f32,
    /// Multiplier applied to both speed and turn rate while boosting.
    pub boost_multiplier: f32,
    /// Heading change at full authority (rad/s).
    pub turn_rate: f32,
    /// Reverse thrust as a fraction of forward thrust.
    pub reverse_factor: f32,
    /// Thrust-to-velocity gain.
    pub thrust_scale: f32,
    /// Horizontal velocity retained per tick. Not scaled by dt.
    pub friction: f32,
    /// Horizontal speed below which the vehicle cannot turn.
    pub min_turn_speed: f32,
    /// Horizontal speed at and above which turning has full authority.
    pub full_turn_speed: f32,
    /// Vertical launch speed.
    pub jump_speed: f32,
    /// Vertical speeds within this band count as resting.
    pub jump_epsilon: f32,
    /// How long a rising vehicle must rest before it counts as grounded (s).
    pub rest_time: f32,
    /// Visual front-wheel angle at full lock (radians).
    pub max_steering_angle: f32,
    /// Rate at which the visual steering angle follows input (1/s).
    pub steering_rate: f32,
    /// Wheel radius used to derive spin from forward speed.
    pub wheel_radius: f32,
    /// Where the rigid body is created.
    pub spawn: Vec3,
}

impl Default for VehicleTuning {
    fn default() -> Self {
        Self {
            base_speed: 6.0,
            boost_multiplier: 2.0,
            turn_rate: 2.5,
            reverse_factor: 0.5,
            thrust_scale: 10.0,
            friction: 0.95,
            min_turn_speed: 0.1,
            full_turn_speed: 3.0,
            jump_speed: 8.0,
            jump_epsilon: 0.1,
            rest_time: 0.05,
            max_steering_angle: 0.5,
            steering_rate: 8.0,
            wheel_radius: 0.2,
            spawn: Vec3::new(0.0, 2.0, 0.0),
        }
    }
}

impl VehicleTuning {
    pub(crate) fn validate(&self) -> error::Result<()> {
        check_positive("vehicle.base_speed", self.base_speed)?;
        check_range(
            "vehicle.boost_multiplier",
            self.boost_multiplier,
            1.0..,
            ">= 1",
        )?;
        check_range("vehicle.turn_rate", self.turn_rate, 0.0.., ">= 0")?;
        check_range(
            "vehicle.reverse_factor",
            self.reverse_factor,
            0.0..=1.0,
            "[0, 1]",
        )?;
        check_positive("vehicle.thrust_scale", self.thrust_scale)?;
        check_range("vehicle.friction", self.friction, 0.0..1.0, "[0, 1)")?;
        check_range("vehicle.min_turn_speed", self.min_turn_speed, 0.0.., ">= 0")?;
        if !(self.full_turn_speed.is_finite() && self.full_turn_speed > self.min_turn_speed) {
            return Err(ConfigError::InvertedRange {
                min_field: "vehicle.min_turn_speed",
                max_field: "vehicle.full_turn_speed",
            });
        }
        check_positive("vehicle.jump_speed", self.jump_speed)?;
        check_positive("vehicle.jump_epsilon", self.jump_epsilon)?;
        check_range("vehicle.rest_time", self.rest_time, 0.0.., ">= 0")?;
        check_range(
            "vehicle.max_steering_angle",
            self.max_steering_angle,
            0.0..std::f32::consts::FRAC_PI_2,
            "[0, pi/2)",
        )?;
        check_positive("vehicle.steering_rate", self.steering_rate)?;
        check_positive("vehicle.wheel_radius", self.wheel_radius)?;
        if !self.spawn.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "vehicle.spawn",
                value: f32::NAN,
                expected: "finite",
            });
        }
        Ok(())
    }

    /// Fraction of the turn rate available at `speed`.
    pub fn turn_authority(&self, speed: f32) -> f32 {
        ((speed - self.min_turn_speed) / (self.full_turn_speed - self.min_turn_speed))
            .clamp(0.0, 1.0)
    }

    /// Horizontal speed the vehicle settles at under constant thrust at a
    /// fixed tick length.
    pub fn steady_state_speed(&self, boost: bool, dt: f32) -> f32 {
        let speed = if boost {
            self.base_speed * self.boost_multiplier
        } else {
            self.base_speed
        };
        let gain = speed * dt * self.thrust_scale;
        gain * self.friction / (1.0 - self.friction)
    }
}

/// Unit vector the vehicle faces at `heading`. Heading 0 faces -Z.
pub fn forward_vector(heading: f32) -> Vec3 {
    Vec3::new(-heading.sin(), 0.0, -heading.cos())
}

// ============================================================================
// State
// ============================================================================

/// Vertical state used to forbid re-launching while airborne.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JumpPhase {
    #[default]
    Grounded,
    Rising,
    Falling,
}

/// Everything the simulator remembers between ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleState {
    /// Last position reported by the rigid body.
    pub position: Vec3,
    /// Last velocity written to the rigid body.
    pub velocity: Vec3,
    /// Yaw in radians. Accumulates without wrapping.
    pub heading: f32,
    /// Visual front-wheel angle.
    pub steering_angle: f32,
    /// Visual wheel rotation in `[0, 2π)`.
    pub wheel_phase: f32,
    /// Length of the horizontal velocity written last tick.
    pub horizontal_speed: f32,
    pub jump_phase: JumpPhase,
    /// Time spent resting while in [`JumpPhase::Rising`].
    rest_timer: f32,
    /// Consecutive ticks spent resting while in [`JumpPhase::Rising`].
    rest_ticks: u32,
}

impl VehicleState {
    fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            heading: 0.0,
            steering_angle: 0.0,
            wheel_phase: 0.0,
            horizontal_speed: 0.0,
            jump_phase: JumpPhase::Grounded,
            rest_timer: 0.0,
            rest_ticks: 0,
        }
    }

    fn clear_rest(&mut self) {
        self.rest_timer = 0.0;
        self.rest_ticks = 0;
    }
}

/// What one tick published.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleTick {
    pub position: Vec3,
    pub velocity: Vec3,
    pub heading: f32,
    pub horizontal_speed: f32,
    /// Whether this tick launched a jump.
    pub jumped: bool,
}

// ============================================================================
// Simulator
// ============================================================================

/// Advances a [`VehicleState`] from control intent.
#[derive(Clone, Debug)]
pub struct VehicleSimulator {
    tuning: VehicleTuning,
    state: VehicleState,
}

impl Default for VehicleSimulator {
    fn default() -> Self {
        Self::new(VehicleTuning::default())
    }
}

impl VehicleSimulator {
    pub fn new(tuning: VehicleTuning) -> Self {
        let state = VehicleState::at(tuning.spawn);
        Self { tuning, state }
    }

    pub fn tuning(&self) -> &VehicleTuning {
        &self.tuning
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Advance one tick.
    ///
    /// Returns `None` without touching any state when there is no rigid body
    /// yet.
    pub fn tick<B: RigidBodyHandle + ?Sized>(
        &mut self,
        intent: &ControlIntent,
        dt: f32,
        body: Option<&mut B>,
    ) -> Option<VehicleTick> {
        let body = body?;
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let tuning = &self.tuning;
        let state = &mut self.state;

        let reported = body.linear_velocity();
        let horizontal = Vec2::new(reported.x, reported.z);

        let multiplier = if intent.boost {
            tuning.boost_multiplier
        } else {
            1.0
        };
        let speed = tuning.base_speed * multiplier;

        // Thrust follows the heading the vehicle had at the start of the tick.
        let forward = forward_vector(state.heading);

        // Turning.
        let authority = tuning.turn_authority(horizontal.length());
        state.heading += intent.steer_axis() * tuning.turn_rate * multiplier * authority * dt;

        // Thrust and friction.
        let mut thrust = 0.0;
        if intent.forward {
            thrust += speed;
        }
        if intent.backward {
            thrust -= speed * tuning.reverse_factor;
        }
        let push = Vec2::new(forward.x, forward.z) * thrust * dt * tuning.thrust_scale;
        let new_horizontal = (horizontal + push) * tuning.friction;

        // Jump.
        let mut vertical = reported.y;
        let still = (body.position().y - state.position.y).abs() < STILL_EPSILON;
        advance_jump_phase(tuning, state, vertical, still, dt);
        let jumped = intent.jump
            && state.jump_phase == JumpPhase::Grounded
            && vertical.abs() < tuning.jump_epsilon;
        if jumped {
            vertical = tuning.jump_speed;
            state.jump_phase = JumpPhase::Rising;
            state.clear_rest();
            tracing::debug!("Jump launched at {:?}", state.position);
        }

        let velocity = Vec3::new(new_horizontal.x, vertical, new_horizontal.y);
        body.set_linear_velocity(velocity, true);

        // Visual steering and wheel spin.
        let steer_target = intent.steer_axis() * tuning.max_steering_angle;
        let steer_lerp = 1.0 - (-tuning.steering_rate * dt).exp();
        state.steering_angle += (steer_target - state.steering_angle) * steer_lerp;

        let facing = forward_vector(state.heading);
        let signed_speed = new_horizontal.dot(Vec2::new(facing.x, facing.z));
        state.wheel_phase =
            (state.wheel_phase + signed_speed / tuning.wheel_radius * dt).rem_euclid(TAU);

        state.position = body.position();
        state.velocity = velocity;
        state.horizontal_speed = new_horizontal.length();

        Some(VehicleTick {
            position: state.position,
            velocity,
            heading: state.heading,
            horizontal_speed: state.horizontal_speed,
            jumped,
        })
    }

    /// Put the vehicle back at the spawn point, facing forward.
    pub fn reset(&mut self) {
        self.state = VehicleState::at(self.tuning.spawn);
    }
}

/// Ticks a launch must rest before it counts as blocked. A single long frame
/// at the top of an arc must never satisfy the rest condition on its own.
const REST_TICKS: u32 = 3;

/// Largest height change between ticks that still counts as resting.
const STILL_EPSILON: f32 = 1e-4;

/// Update the jump phase from the vertical velocity the body reported.
///
/// `still` is whether the body's height is unchanged since the last tick.
fn advance_jump_phase(
    tuning: &VehicleTuning,
    state: &mut VehicleState,
    vertical: f32,
    still: bool,
    dt: f32,
) {
    let epsilon = tuning.jump_epsilon;
    state.jump_phase = match state.jump_phase {
        JumpPhase::Grounded if vertical < -epsilon => JumpPhase::Falling,
        JumpPhase::Grounded if vertical > epsilon => {
            state.clear_rest();
            JumpPhase::Rising
        }
        JumpPhase::Grounded => JumpPhase::Grounded,
        JumpPhase::Rising if vertical < -epsilon => JumpPhase::Falling,
        JumpPhase::Rising if vertical.abs() < epsilon && still => {
            // A launch blocked by a ceiling never falls; let it settle.
            state.rest_timer += dt;
            state.rest_ticks += 1;
            if state.rest_ticks >= REST_TICKS && state.rest_timer >= tuning.rest_time {
                JumpPhase::Grounded
            } else {
                JumpPhase::Rising
            }
        }
        JumpPhase::Rising => {
            state.clear_rest();
            JumpPhase::Rising
        }
        JumpPhase::Falling if vertical.abs() < epsilon => JumpPhase::Grounded,
        JumpPhase::Falling => JumpPhase::Falling,
    };
}
