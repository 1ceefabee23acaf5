//! Drag-driven orbit offset for the chase camera.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{self, check_positive, check_range};

/// Device class a drag delta came from; selects the sensitivity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// Per-pixel drag sensitivities and the pitch limit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitTuning {
    pub mouse_yaw: f32,
    pub mouse_pitch: f32,
    pub touch_yaw: f32,
    pub touch_pitch: f32,
    /// Pitch is clamped to `[-pitch_limit, pitch_limit]`.
    pub pitch_limit: f32,
}

impl Default for OrbitTuning {
    fn default() -> Self {
        Self {
            mouse_yaw: 0.005,
            mouse_pitch: 0.003,
            // Touch gestures cover less distance, so they turn faster.
            touch_yaw: 0.008,
            touch_pitch: 0.004,
            pitch_limit: 0.5,
        }
    }
}

impl OrbitTuning {
    fn sensitivity(&self, kind: PointerKind) -> Vec2 {
        match kind {
            PointerKind::Mouse => Vec2::new(self.mouse_yaw, self.mouse_pitch),
            PointerKind::Touch => Vec2::new(self.touch_yaw, self.touch_pitch),
        }
    }

    pub(crate) fn validate(&self) -> error::Result<()> {
        check_positive("orbit.mouse_yaw", self.mouse_yaw)?;
        check_positive("orbit.mouse_pitch", self.mouse_pitch)?;
        check_positive("orbit.touch_yaw", self.touch_yaw)?;
        check_positive("orbit.touch_pitch", self.touch_pitch)?;
        check_range(
            "orbit.pitch_limit",
            self.pitch_limit,
            0.0..std::f32::consts::FRAC_PI_2,
            "[0, pi/2)",
        )
    }
}

/// Angular offset applied around the vehicle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbitOffset {
    /// Azimuth in radians. Unbounded.
    pub yaw: f32,
    /// Elevation in radians. Always within the pitch limit.
    pub pitch: f32,
}

/// Accumulates drag deltas into an [`OrbitOffset`] while a drag is held.
///
/// There is no momentum: releasing freezes the offset where it is.
#[derive(Clone, Debug, Default)]
pub struct OrbitController {
    tuning: OrbitTuning,
    offset: OrbitOffset,
    dragging: Option<PointerKind>,
}

impl OrbitController {
    pub fn new(tuning: OrbitTuning) -> Self {
        Self {
            tuning,
            ..Default::default()
        }
    }

    pub fn offset(&self) -> OrbitOffset {
        self.offset
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging.is_some()
    }

    /// Device driving the active drag.
    pub fn drag_kind(&self) -> Option<PointerKind> {
        self.dragging
    }

    pub fn begin_drag(&mut self, kind: PointerKind) {
        self.dragging = Some(kind);
    }

    pub fn end_drag(&mut self) {
        self.dragging = None;
    }

    /// Apply a pixel delta. Ignored unless a drag is active.
    ///
    /// Returns whether the offset changed.
    pub fn drag(&mut self, delta: Vec2) -> bool {
        let Some(kind) = self.dragging else {
            return false;
        };
        if !delta.is_finite() || delta == Vec2::ZERO {
            return false;
        }

        let scaled = delta * self.tuning.sensitivity(kind);
        let limit = self.tuning.pitch_limit;
        self.offset.yaw += scaled.x;
        self.offset.pitch = (self.offset.pitch - scaled.y).clamp(-limit, limit);
        true
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_motion_without_drag_is_ignored() {
        let mut orbit = OrbitController::default();
        assert!(!orbit.drag(Vec2::new(100.0, 100.0)));
        assert_eq!(orbit.offset(), OrbitOffset::default());
    }

    #[test]
    fn test_mouse_sensitivity() {
        let mut orbit = OrbitController::default();
        orbit.begin_drag(PointerKind::Mouse);
        assert!(orbit.drag(Vec2::new(-100.0, -50.0)));

        let offset = orbit.offset();
        assert!((offset.yaw + 0.5).abs() < 1e-6);
        assert!((offset.pitch - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_touch_is_more_sensitive() {
        let mut mouse = OrbitController::default();
        mouse.begin_drag(PointerKind::Mouse);
        mouse.drag(Vec2::new(10.0, 0.0));

        let mut touch = OrbitController::default();
        touch.begin_drag(PointerKind::Touch);
        touch.drag(Vec2::new(10.0, 0.0));

        assert!(touch.offset().yaw.abs() > mouse.offset().yaw.abs());
    }

    #[test]
    fn test_release_freezes_offset() {
        let mut orbit = OrbitController::default();
        orbit.begin_drag(PointerKind::Mouse);
        orbit.drag(Vec2::new(40.0, 20.0));
        orbit.end_drag();

        let frozen = orbit.offset();
        orbit.drag(Vec2::new(500.0, 500.0));
        assert_eq!(orbit.offset(), frozen);
    }

    #[test]
    fn test_yaw_is_unbounded() {
        let mut orbit = OrbitController::default();
        orbit.begin_drag(PointerKind::Mouse);
        for _ in 0..10 {
            orbit.drag(Vec2::new(1000.0, 0.0));
        }
        assert!(orbit.offset().yaw > std::f32::consts::TAU);
    }

    #[test]
    fn test_non_finite_delta_is_ignored() {
        let mut orbit = OrbitController::default();
        orbit.begin_drag(PointerKind::Touch);
        assert!(!orbit.drag(Vec2::new(f32::NAN, 1.0)));
        assert_eq!(orbit.offset(), OrbitOffset::default());
    }

    proptest! {
        #[test]
        fn test_pitch_stays_clamped(
            deltas in prop::collection::vec(
                (-5000.0f32..5000.0, -5000.0f32..5000.0, any::<bool>()),
                1..64,
            )
        ) {
            let mut orbit = OrbitController::default();
            for (dx, dy, touch) in deltas {
                orbit.begin_drag(if touch { PointerKind::Touch } else { PointerKind::Mouse });
                orbit.drag(Vec2::new(dx, dy));
                let pitch = orbit.offset().pitch;
                prop_assert!((-0.5..=0.5).contains(&pitch));
            }
        }
    }
}
