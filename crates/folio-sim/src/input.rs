//! Control intent aggregation.
//!
//! Keyboard, the virtual joystick and the on-screen touch buttons each keep
//! their own [`ControlIntent`]; the intent the vehicle sees is their logical
//! OR. Touches are partitioned by where they start: the left part of the
//! viewport drives the joystick, the rest is a free-look drag whose deltas are
//! handed back to the caller for the orbit controller.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{self, check_positive, check_range};

/// Identifier the platform assigns to a touch point.
pub type TouchId = u64;

// ============================================================================
// Actions and intent
// ============================================================================

/// One of the six binary driving controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlAction {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
    Boost,
}

impl ControlAction {
    /// Every action, in declaration order.
    pub const ALL: [ControlAction; 6] = [
        ControlAction::Forward,
        ControlAction::Backward,
        ControlAction::Left,
        ControlAction::Right,
        ControlAction::Jump,
        ControlAction::Boost,
    ];

    /// Map a browser-style key name (`KeyboardEvent.key`) to an action.
    ///
    /// Matching is case-insensitive so a held shift does not break WASD.
    pub fn from_key_name(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "w" | "arrowup" => Some(ControlAction::Forward),
            "s" | "arrowdown" => Some(ControlAction::Backward),
            "a" | "arrowleft" => Some(ControlAction::Left),
            "d" | "arrowright" => Some(ControlAction::Right),
            " " | "space" => Some(ControlAction::Jump),
            "shift" => Some(ControlAction::Boost),
            _ => None,
        }
    }
}

/// Discrete driving intent for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ControlIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub boost: bool,
}

impl ControlIntent {
    /// Read a single flag.
    pub fn get(&self, action: ControlAction) -> bool {
        match action {
            ControlAction::Forward => self.forward,
            ControlAction::Backward => self.backward,
            ControlAction::Left => self.left,
            ControlAction::Right => self.right,
            ControlAction::Jump => self.jump,
            ControlAction::Boost => self.boost,
        }
    }

    /// Write a single flag.
    pub fn set(&mut self, action: ControlAction, value: bool) {
        let flag = match action {
            ControlAction::Forward => &mut self.forward,
            ControlAction::Backward => &mut self.backward,
            ControlAction::Left => &mut self.left,
            ControlAction::Right => &mut self.right,
            ControlAction::Jump => &mut self.jump,
            ControlAction::Boost => &mut self.boost,
        };
        *flag = value;
    }

    /// Logical OR of two intents.
    #[must_use]
    pub fn merge(self, other: ControlIntent) -> ControlIntent {
        ControlIntent {
            forward: self.forward || other.forward,
            backward: self.backward || other.backward,
            left: self.left || other.left,
            right: self.right || other.right,
            jump: self.jump || other.jump,
            boost: self.boost || other.boost,
        }
    }

    /// Whether no flag is asserted.
    pub fn is_neutral(&self) -> bool {
        *self == ControlIntent::default()
    }

    /// Signed steering input: +1 for left, -1 for right, 0 for both or neither.
    pub fn steer_axis(&self) -> f32 {
        f32::from(i8::from(self.left) - i8::from(self.right))
    }
}

// ============================================================================
// Tuning
// ============================================================================

/// Touch layout and joystick tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputTuning {
    /// Per-axis deflection that must be exceeded before a direction registers.
    pub joystick_deadzone: f32,
    /// Finger travel in pixels that maps to full deflection.
    pub joystick_radius: f32,
    /// Fraction of the viewport width, from the left, that starts the joystick.
    pub joystick_region: f32,
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            joystick_deadzone: 0.3,
            joystick_radius: 64.0,
            joystick_region: 0.4,
        }
    }
}

impl InputTuning {
    pub(crate) fn validate(&self) -> error::Result<()> {
        check_range(
            "input.joystick_deadzone",
            self.joystick_deadzone,
            0.0..1.0,
            "[0, 1)",
        )?;
        check_positive("input.joystick_radius", self.joystick_radius)?;
        check_range(
            "input.joystick_region",
            self.joystick_region,
            0.0..=1.0,
            "[0, 1]",
        )
    }
}

// ============================================================================
// Touch routing
// ============================================================================

/// On-screen buttons shown on touch devices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TouchButton {
    Jump,
    Boost,
}

impl TouchButton {
    fn action(self) -> ControlAction {
        match self {
            TouchButton::Jump => ControlAction::Jump,
            TouchButton::Boost => ControlAction::Boost,
        }
    }
}

/// What a touch point was assigned to when it started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchRole {
    /// Drives the virtual joystick.
    Joystick,
    /// Drags the free-look camera.
    Look,
    /// Not tracked (its region already has an active touch, or unknown id).
    Ignored,
}

/// Result of routing a touch move.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TouchMotion {
    /// The joystick touch moved; the deflection was updated.
    Joystick,
    /// The free-look touch moved by this many pixels.
    Look(Vec2),
    /// Not a tracked touch.
    Ignored,
}

#[derive(Clone, Copy, Debug)]
struct JoystickTouch {
    id: TouchId,
    origin: Vec2,
}

#[derive(Clone, Copy, Debug)]
struct LookTouch {
    id: TouchId,
    last: Vec2,
}

/// Derive direction flags from a normalized joystick deflection.
///
/// Screen coordinates: negative y is up, which means forward.
pub fn joystick_intent(deflection: Vec2, deadzone: f32) -> ControlIntent {
    ControlIntent {
        forward: deflection.y < -deadzone,
        backward: deflection.y > deadzone,
        left: deflection.x < -deadzone,
        right: deflection.x > deadzone,
        ..Default::default()
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Merges every input source into one [`ControlIntent`].
#[derive(Clone, Debug, Default)]
pub struct InputAggregator {
    tuning: InputTuning,
    keyboard: ControlIntent,
    joystick: ControlIntent,
    buttons: ControlIntent,
    deflection: Vec2,
    joystick_touch: Option<JoystickTouch>,
    look_touch: Option<LookTouch>,
}

impl InputAggregator {
    pub fn new(tuning: InputTuning) -> Self {
        Self {
            tuning,
            ..Default::default()
        }
    }

    pub fn tuning(&self) -> &InputTuning {
        &self.tuning
    }

    /// Current merged intent.
    pub fn intent(&self) -> ControlIntent {
        self.keyboard.merge(self.joystick).merge(self.buttons)
    }

    /// Current normalized joystick deflection, for drawing the knob.
    pub fn joystick_deflection(&self) -> Vec2 {
        self.deflection
    }

    /// Screen position where the joystick touch landed.
    pub fn joystick_origin(&self) -> Option<Vec2> {
        self.joystick_touch.as_ref().map(|touch| touch.origin)
    }

    /// Whether a touch currently owns the joystick.
    pub fn joystick_active(&self) -> bool {
        self.joystick_touch.is_some()
    }

    /// Whether a touch currently owns the free-look drag.
    pub fn look_active(&self) -> bool {
        self.look_touch.is_some()
    }

    /// Keyboard press.
    pub fn press(&mut self, action: ControlAction) {
        self.keyboard.set(action, true);
    }

    /// Keyboard release.
    pub fn release(&mut self, action: ControlAction) {
        self.keyboard.set(action, false);
    }

    /// Drop every held key, e.g. when the window loses focus and key-up
    /// events will never arrive.
    pub fn release_keyboard(&mut self) {
        self.keyboard = ControlIntent::default();
    }

    /// On-screen button pressed.
    pub fn button_down(&mut self, button: TouchButton) {
        self.buttons.set(button.action(), true);
    }

    /// On-screen button released.
    pub fn button_up(&mut self, button: TouchButton) {
        self.buttons.set(button.action(), false);
    }

    /// Set the joystick from a raw deflection in stick-radius units.
    ///
    /// Deflections outside the unit circle are projected back onto it.
    pub fn set_joystick(&mut self, raw: Vec2) {
        let deflection = if raw.is_finite() {
            raw.clamp_length_max(1.0)
        } else {
            Vec2::ZERO
        };
        self.deflection = deflection;
        self.joystick = joystick_intent(deflection, self.tuning.joystick_deadzone);
    }

    fn reset_joystick(&mut self) {
        self.joystick_touch = None;
        self.set_joystick(Vec2::ZERO);
    }

    /// A touch began at `position` in a viewport `viewport_width` pixels wide.
    pub fn touch_start(&mut self, id: TouchId, position: Vec2, viewport_width: f32) -> TouchRole {
        if position.x < viewport_width * self.tuning.joystick_region {
            if self.joystick_touch.is_some() {
                return TouchRole::Ignored;
            }
            self.joystick_touch = Some(JoystickTouch {
                id,
                origin: position,
            });
            self.set_joystick(Vec2::ZERO);
            TouchRole::Joystick
        } else {
            if self.look_touch.is_some() {
                return TouchRole::Ignored;
            }
            self.look_touch = Some(LookTouch { id, last: position });
            TouchRole::Look
        }
    }

    /// A touch moved to `position`.
    pub fn touch_move(&mut self, id: TouchId, position: Vec2) -> TouchMotion {
        if let Some(stick) = self.joystick_touch
            && stick.id == id
        {
            let raw = (position - stick.origin) / self.tuning.joystick_radius;
            self.set_joystick(raw);
            return TouchMotion::Joystick;
        }

        match self.look_touch.as_mut() {
            Some(look) if look.id == id => {
                let delta = position - look.last;
                look.last = position;
                TouchMotion::Look(delta)
            }
            _ => TouchMotion::Ignored,
        }
    }

    /// A touch ended or was cancelled. Returns the role it had.
    pub fn touch_end(&mut self, id: TouchId) -> TouchRole {
        if self.joystick_touch.is_some_and(|stick| stick.id == id) {
            self.reset_joystick();
            return TouchRole::Joystick;
        }
        if self.look_touch.is_some_and(|look| look.id == id) {
            self.look_touch = None;
            return TouchRole::Look;
        }
        TouchRole::Ignored
    }

    /// End any tracked gesture whose touch is no longer in `active`.
    ///
    /// Returns the roles that were ended.
    pub fn sync_touches(&mut self, active: &[TouchId]) -> Vec<TouchRole> {
        let mut ended = Vec::new();
        if let Some(stick) = self.joystick_touch
            && !active.contains(&stick.id)
        {
            self.reset_joystick();
            ended.push(TouchRole::Joystick);
        }
        if let Some(look) = self.look_touch
            && !active.contains(&look.id)
        {
            self.look_touch = None;
            ended.push(TouchRole::Look);
        }
        ended
    }

    /// Return every source to neutral.
    pub fn reset(&mut self) {
        let tuning = std::mem::take(&mut self.tuning);
        *self = Self::new(tuning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> InputAggregator {
        InputAggregator::new(InputTuning::default())
    }

    #[test]
    fn test_key_names() {
        assert_eq!(ControlAction::from_key_name("W"), Some(ControlAction::Forward));
        assert_eq!(
            ControlAction::from_key_name("ArrowLeft"),
            Some(ControlAction::Left)
        );
        assert_eq!(ControlAction::from_key_name(" "), Some(ControlAction::Jump));
        assert_eq!(ControlAction::from_key_name("Shift"), Some(ControlAction::Boost));
        assert_eq!(ControlAction::from_key_name("q"), None);
    }

    #[test]
    fn test_keyboard_edges() {
        let mut input = aggregator();
        input.press(ControlAction::Forward);
        input.press(ControlAction::Boost);
        assert!(input.intent().forward);
        assert!(input.intent().boost);

        input.release(ControlAction::Forward);
        assert!(!input.intent().forward);
        assert!(input.intent().boost);
    }

    #[test]
    fn test_sources_compose_with_or() {
        let mut input = aggregator();
        input.press(ControlAction::Forward);
        input.set_joystick(Vec2::new(0.0, -1.0));
        assert!(input.intent().forward);

        // Releasing one source keeps the flag while the other still asserts it.
        input.release(ControlAction::Forward);
        assert!(input.intent().forward);

        input.set_joystick(Vec2::ZERO);
        assert!(!input.intent().forward);
    }

    #[test]
    fn test_joystick_deadzone_is_strict() {
        let intent = joystick_intent(Vec2::new(0.3, -0.3), 0.3);
        assert!(intent.is_neutral());

        let intent = joystick_intent(Vec2::new(0.31, 0.31), 0.3);
        assert!(intent.right);
        assert!(intent.backward);
        assert!(!intent.left);
        assert!(!intent.forward);
    }

    #[test]
    fn test_joystick_clamped_to_unit_circle() {
        let mut input = aggregator();
        input.set_joystick(Vec2::new(3.0, 4.0));
        assert!((input.joystick_deflection().length() - 1.0).abs() < 1e-5);

        input.set_joystick(Vec2::new(f32::NAN, 0.0));
        assert_eq!(input.joystick_deflection(), Vec2::ZERO);
    }

    #[test]
    fn test_touch_partition_by_region() {
        let mut input = aggregator();
        assert_eq!(
            input.touch_start(1, Vec2::new(100.0, 500.0), 1000.0),
            TouchRole::Joystick
        );
        assert_eq!(input.joystick_origin(), Some(Vec2::new(100.0, 500.0)));
        assert_eq!(
            input.touch_start(2, Vec2::new(700.0, 300.0), 1000.0),
            TouchRole::Look
        );
        // A second finger in an occupied region is ignored.
        assert_eq!(
            input.touch_start(3, Vec2::new(50.0, 50.0), 1000.0),
            TouchRole::Ignored
        );
    }

    #[test]
    fn test_joystick_and_look_touches_do_not_interfere() {
        let mut input = aggregator();
        input.touch_start(1, Vec2::new(100.0, 500.0), 1000.0);
        input.touch_start(2, Vec2::new(700.0, 300.0), 1000.0);

        // Moving the joystick finger up drives forward and yields no look delta.
        assert_eq!(
            input.touch_move(1, Vec2::new(100.0, 436.0)),
            TouchMotion::Joystick
        );
        assert!(input.intent().forward);

        // Moving the look finger yields a delta and leaves the joystick alone.
        let motion = input.touch_move(2, Vec2::new(710.0, 295.0));
        assert_eq!(motion, TouchMotion::Look(Vec2::new(10.0, -5.0)));
        assert!(input.intent().forward);

        // Ending the look touch keeps the joystick held.
        assert_eq!(input.touch_end(2), TouchRole::Look);
        assert!(input.intent().forward);

        assert_eq!(input.touch_end(1), TouchRole::Joystick);
        assert!(input.intent().is_neutral());
        assert_eq!(input.joystick_deflection(), Vec2::ZERO);
    }

    #[test]
    fn test_unknown_touch_is_ignored() {
        let mut input = aggregator();
        assert_eq!(input.touch_move(42, Vec2::ZERO), TouchMotion::Ignored);
        assert_eq!(input.touch_end(42), TouchRole::Ignored);
    }

    #[test]
    fn test_lost_touch_ends_gesture() {
        let mut input = aggregator();
        input.touch_start(1, Vec2::new(100.0, 500.0), 1000.0);
        input.touch_move(1, Vec2::new(30.0, 500.0));
        assert!(input.intent().left);

        let ended = input.sync_touches(&[7]);
        assert_eq!(ended, vec![TouchRole::Joystick]);
        assert!(input.intent().is_neutral());
        assert!(!input.joystick_active());
    }

    #[test]
    fn test_touch_buttons() {
        let mut input = aggregator();
        input.button_down(TouchButton::Jump);
        input.button_down(TouchButton::Boost);
        assert!(input.intent().jump);
        assert!(input.intent().boost);
        input.button_up(TouchButton::Jump);
        assert!(!input.intent().jump);
        assert!(input.intent().boost);
    }

    #[test]
    fn test_steer_axis() {
        let mut intent = ControlIntent::default();
        assert!(intent.steer_axis().abs() < f32::EPSILON);
        intent.left = true;
        assert!((intent.steer_axis() - 1.0).abs() < f32::EPSILON);
        intent.right = true;
        assert!(intent.steer_axis().abs() < f32::EPSILON);
    }

    #[test]
    fn test_reset_keeps_tuning() {
        let tuning = InputTuning {
            joystick_radius: 100.0,
            ..Default::default()
        };
        let mut input = InputAggregator::new(tuning.clone());
        input.press(ControlAction::Jump);
        input.reset();
        assert!(input.intent().is_neutral());
        assert_eq!(input.tuning, tuning);
    }
}
