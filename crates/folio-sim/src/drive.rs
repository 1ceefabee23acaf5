//! The per-frame drive loop.
//!
//! [`DriveSession`] owns every simulation component. Raw input events are
//! routed through [`DriveSession::handle`] between frames; once per frame
//! [`DriveSession::tick`] reads the merged intent and runs vehicle, camera,
//! zones and UI speed in that order.

use glam::Vec2;

use crate::{
    camera::{CameraFrame, CameraInput, CameraRig},
    config::DriveConfig,
    input::{
        ControlAction, ControlIntent, InputAggregator, TouchButton, TouchId, TouchMotion,
        TouchRole,
    },
    orbit::{OrbitController, OrbitOffset, PointerKind},
    session::UiSink,
    vehicle::{RigidBodyHandle, VehicleSimulator, VehicleTick},
    zones::{ZoneDetector, ZoneTransition},
};

// ============================================================================
// Events
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

/// A raw, device-level input event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    ActionPressed(ControlAction),
    ActionReleased(ControlAction),
    MouseDown(MouseButton),
    MouseUp(MouseButton),
    /// Relative pointer motion in pixels.
    MouseMove {
        delta: Vec2,
    },
    TouchStart {
        id: TouchId,
        position: Vec2,
        viewport_width: f32,
    },
    TouchMove {
        id: TouchId,
        position: Vec2,
    },
    /// The touch lifted or was cancelled.
    TouchEnd {
        id: TouchId,
    },
    TouchButtonDown(TouchButton),
    TouchButtonUp(TouchButton),
    ContextMenu,
    /// The window lost focus; held keys will never report a release.
    FocusLost,
}

/// What the caller should do with the platform event after routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventDisposition {
    Handled,
    /// Handled, and the platform default (e.g. a context menu) must not run.
    PreventDefault,
    Ignored,
}

/// Event sources a session subscribes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    KeyDown,
    KeyUp,
    MouseDown,
    MouseUp,
    MouseMove,
    ContextMenu,
    Blur,
    TouchStart,
    TouchMove,
    TouchEnd,
}

impl ListenerKind {
    /// Listeners every session needs.
    pub const DESKTOP: [ListenerKind; 7] = [
        ListenerKind::KeyDown,
        ListenerKind::KeyUp,
        ListenerKind::MouseDown,
        ListenerKind::MouseUp,
        ListenerKind::MouseMove,
        ListenerKind::ContextMenu,
        ListenerKind::Blur,
    ];

    /// Listeners added when touch input is enabled.
    pub const TOUCH: [ListenerKind; 3] = [
        ListenerKind::TouchStart,
        ListenerKind::TouchMove,
        ListenerKind::TouchEnd,
    ];

    /// The listener an event arrives through.
    pub fn for_event(event: &InputEvent) -> ListenerKind {
        match event {
            InputEvent::ActionPressed(_) => ListenerKind::KeyDown,
            InputEvent::ActionReleased(_) => ListenerKind::KeyUp,
            InputEvent::MouseDown(_) => ListenerKind::MouseDown,
            InputEvent::MouseUp(_) => ListenerKind::MouseUp,
            InputEvent::MouseMove { .. } => ListenerKind::MouseMove,
            InputEvent::ContextMenu => ListenerKind::ContextMenu,
            InputEvent::FocusLost => ListenerKind::Blur,
            InputEvent::TouchStart { .. } | InputEvent::TouchButtonDown(_) => {
                ListenerKind::TouchStart
            }
            InputEvent::TouchMove { .. } => ListenerKind::TouchMove,
            InputEvent::TouchEnd { .. } | InputEvent::TouchButtonUp(_) => ListenerKind::TouchEnd,
        }
    }
}

/// Opaque handle returned by a [`ListenerRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Platform hook for subscribing to and unsubscribing from event sources.
pub trait ListenerRegistry {
    fn register(&mut self, kind: ListenerKind) -> ListenerId;
    fn unregister(&mut self, id: ListenerId);
}

// ============================================================================
// Session
// ============================================================================

/// Output of one drive tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriveFrame {
    pub vehicle: VehicleTick,
    pub camera: CameraFrame,
    pub zone_transition: Option<ZoneTransition>,
}

/// Input, vehicle, camera and zone state for one scene.
#[derive(Debug)]
pub struct DriveSession {
    input: InputAggregator,
    orbit: OrbitController,
    vehicle: VehicleSimulator,
    camera: CameraRig,
    zones: ZoneDetector,
    listeners: Vec<(ListenerKind, ListenerId)>,
    touch_enabled: bool,
}

impl DriveSession {
    /// Build a session from a configuration. `seed` drives camera shake.
    pub fn new(config: DriveConfig, seed: u64) -> Self {
        let DriveConfig {
            vehicle,
            camera,
            effects,
            orbit,
            input,
            zones,
        } = config;
        Self {
            input: InputAggregator::new(input),
            orbit: OrbitController::new(orbit),
            vehicle: VehicleSimulator::new(vehicle),
            camera: CameraRig::new(camera, effects, seed),
            zones: ZoneDetector::new(zones),
            listeners: Vec::new(),
            touch_enabled: false,
        }
    }

    pub fn vehicle(&self) -> &VehicleSimulator {
        &self.vehicle
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn zones(&self) -> &ZoneDetector {
        &self.zones
    }

    pub fn input(&self) -> &InputAggregator {
        &self.input
    }

    pub fn orbit_offset(&self) -> OrbitOffset {
        self.orbit.offset()
    }

    /// Merged control intent as of now.
    pub fn intent(&self) -> ControlIntent {
        self.input.intent()
    }

    pub fn touch_enabled(&self) -> bool {
        self.touch_enabled
    }

    /// Whether touch listeners are registered on the next [`Self::start`].
    pub fn set_touch_enabled(&mut self, enabled: bool) {
        self.touch_enabled = enabled;
    }

    pub fn is_listening(&self) -> bool {
        !self.listeners.is_empty()
    }

    fn listens_to(&self, kind: ListenerKind) -> bool {
        self.listeners.iter().any(|(registered, _)| *registered == kind)
    }

    /// Subscribe to every event source the session needs.
    ///
    /// Calling this while already listening does nothing.
    pub fn start<R: ListenerRegistry + ?Sized>(&mut self, registry: &mut R) {
        if self.is_listening() {
            tracing::warn!("Drive session already listening; ignoring start");
            return;
        }

        let touch: &[ListenerKind] = if self.touch_enabled {
            &ListenerKind::TOUCH
        } else {
            &[]
        };
        for &kind in ListenerKind::DESKTOP.iter().chain(touch) {
            let id = registry.register(kind);
            self.listeners.push((kind, id));
        }
        tracing::info!(
            "Drive session listening ({} listeners, touch {})",
            self.listeners.len(),
            if self.touch_enabled { "on" } else { "off" }
        );
    }

    /// Unsubscribe exactly what [`Self::start`] registered and return all
    /// input to neutral.
    pub fn stop<R: ListenerRegistry + ?Sized>(&mut self, registry: &mut R) {
        for (_, id) in self.listeners.drain(..) {
            registry.unregister(id);
        }
        self.input.reset();
        self.orbit.end_drag();
        tracing::info!("Drive session stopped");
    }

    /// Route one raw input event.
    pub fn handle(&mut self, event: InputEvent) -> EventDisposition {
        if !self.listens_to(ListenerKind::for_event(&event)) {
            return EventDisposition::Ignored;
        }

        match event {
            InputEvent::ActionPressed(action) => {
                self.input.press(action);
                EventDisposition::Handled
            }
            InputEvent::ActionReleased(action) => {
                self.input.release(action);
                EventDisposition::Handled
            }
            InputEvent::MouseDown(MouseButton::Primary | MouseButton::Secondary) => {
                self.orbit.begin_drag(PointerKind::Mouse);
                EventDisposition::Handled
            }
            InputEvent::MouseDown(MouseButton::Middle) => EventDisposition::Ignored,
            InputEvent::MouseUp(_) => {
                if self.orbit.drag_kind() == Some(PointerKind::Mouse) {
                    self.orbit.end_drag();
                    EventDisposition::Handled
                } else {
                    EventDisposition::Ignored
                }
            }
            InputEvent::MouseMove { delta } => {
                if self.orbit.drag_kind() == Some(PointerKind::Mouse) && self.orbit.drag(delta) {
                    EventDisposition::Handled
                } else {
                    EventDisposition::Ignored
                }
            }
            InputEvent::TouchStart {
                id,
                position,
                viewport_width,
            } => match self.input.touch_start(id, position, viewport_width) {
                TouchRole::Joystick => EventDisposition::Handled,
                TouchRole::Look => {
                    self.orbit.begin_drag(PointerKind::Touch);
                    EventDisposition::Handled
                }
                TouchRole::Ignored => EventDisposition::Ignored,
            },
            InputEvent::TouchMove { id, position } => match self.input.touch_move(id, position) {
                TouchMotion::Joystick => EventDisposition::Handled,
                TouchMotion::Look(delta) => {
                    self.orbit.drag(delta);
                    EventDisposition::Handled
                }
                TouchMotion::Ignored => EventDisposition::Ignored,
            },
            InputEvent::TouchEnd { id } => match self.input.touch_end(id) {
                TouchRole::Joystick => EventDisposition::Handled,
                TouchRole::Look => {
                    self.end_touch_drag();
                    EventDisposition::Handled
                }
                TouchRole::Ignored => EventDisposition::Ignored,
            },
            InputEvent::TouchButtonDown(button) => {
                self.input.button_down(button);
                EventDisposition::Handled
            }
            InputEvent::TouchButtonUp(button) => {
                self.input.button_up(button);
                EventDisposition::Handled
            }
            InputEvent::ContextMenu => EventDisposition::PreventDefault,
            InputEvent::FocusLost => {
                self.input.release_keyboard();
                if self.orbit.drag_kind() == Some(PointerKind::Mouse) {
                    self.orbit.end_drag();
                }
                EventDisposition::Handled
            }
        }
    }

    /// End gestures whose touch is no longer reported by the platform.
    pub fn sync_touches(&mut self, active: &[TouchId]) {
        if !self.listens_to(ListenerKind::TouchEnd) {
            return;
        }
        for role in self.input.sync_touches(active) {
            if role == TouchRole::Look {
                self.end_touch_drag();
            }
        }
    }

    fn end_touch_drag(&mut self) {
        if self.orbit.drag_kind() == Some(PointerKind::Touch) {
            self.orbit.end_drag();
        }
    }

    /// Run one frame: vehicle, then camera, then zones, then UI speed.
    ///
    /// Without a rigid body nothing runs and nothing is written to `ui`.
    pub fn tick<B, U>(&mut self, dt: f32, body: Option<&mut B>, ui: &mut U) -> Option<DriveFrame>
    where
        B: RigidBodyHandle + ?Sized,
        U: UiSink + ?Sized,
    {
        let intent = self.input.intent();
        let vehicle = self.vehicle.tick(&intent, dt, body)?;

        let camera = self.camera.update(
            &CameraInput {
                target: vehicle.position,
                heading: vehicle.heading,
                speed: vehicle.horizontal_speed,
                orbit: self.orbit.offset(),
            },
            dt,
        );

        let zone_transition = self.zones.update(vehicle.position);
        if let Some(transition) = zone_transition {
            ui.set_active_zone(transition.entered);
        }
        ui.set_car_speed(vehicle.horizontal_speed);

        Some(DriveFrame {
            vehicle,
            camera,
            zone_transition,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use glam::Vec3;

    use super::*;
    use crate::{session::tests::RecordingUi, vehicle::tests::FakeBody, zones::ZoneId};

    const DT: f32 = 1.0 / 60.0;

    #[derive(Debug, Default)]
    struct FakeRegistry {
        next: u64,
        live: HashSet<ListenerId>,
        kinds: Vec<ListenerKind>,
    }

    impl ListenerRegistry for FakeRegistry {
        fn register(&mut self, kind: ListenerKind) -> ListenerId {
            self.next += 1;
            let id = ListenerId(self.next);
            self.live.insert(id);
            self.kinds.push(kind);
            id
        }

        fn unregister(&mut self, id: ListenerId) {
            assert!(self.live.remove(&id), "unregistered unknown listener");
        }
    }

    fn started(touch: bool) -> (DriveSession, FakeRegistry) {
        let mut session = DriveSession::new(DriveConfig::default(), 3);
        session.set_touch_enabled(touch);
        let mut registry = FakeRegistry::default();
        session.start(&mut registry);
        (session, registry)
    }

    #[test]
    fn test_start_registers_desktop_listeners() {
        let (session, registry) = started(false);
        assert!(session.is_listening());
        assert_eq!(registry.kinds, ListenerKind::DESKTOP);
    }

    #[test]
    fn test_start_registers_touch_listeners_when_enabled() {
        let (_, registry) = started(true);
        assert_eq!(registry.live.len(), 10);
        for kind in ListenerKind::TOUCH {
            assert!(registry.kinds.contains(&kind));
        }
    }

    #[test]
    fn test_start_twice_registers_once() {
        let (mut session, mut registry) = started(false);
        session.start(&mut registry);
        assert_eq!(registry.live.len(), ListenerKind::DESKTOP.len());
    }

    #[test]
    fn test_stop_unregisters_everything_and_neutralizes() {
        let (mut session, mut registry) = started(true);
        session.handle(InputEvent::ActionPressed(ControlAction::Forward));
        session.handle(InputEvent::TouchButtonDown(TouchButton::Boost));
        assert!(!session.intent().is_neutral());

        session.stop(&mut registry);
        assert!(registry.live.is_empty());
        assert!(!session.is_listening());
        assert!(session.intent().is_neutral());

        // Events after stop are ignored.
        assert_eq!(
            session.handle(InputEvent::ActionPressed(ControlAction::Forward)),
            EventDisposition::Ignored
        );
        assert!(session.intent().is_neutral());
    }

    #[test]
    fn test_restart_after_stop() {
        let (mut session, mut registry) = started(false);
        session.stop(&mut registry);
        session.start(&mut registry);
        assert_eq!(registry.live.len(), ListenerKind::DESKTOP.len());
        assert_eq!(
            session.handle(InputEvent::ActionPressed(ControlAction::Jump)),
            EventDisposition::Handled
        );
    }

    #[test]
    fn test_context_menu_is_suppressed() {
        let (mut session, _) = started(false);
        assert_eq!(
            session.handle(InputEvent::ContextMenu),
            EventDisposition::PreventDefault
        );
    }

    #[test]
    fn test_touch_ignored_without_touch_listeners() {
        let (mut session, _) = started(false);
        let disposition = session.handle(InputEvent::TouchStart {
            id: 1,
            position: Vec2::new(10.0, 10.0),
            viewport_width: 800.0,
        });
        assert_eq!(disposition, EventDisposition::Ignored);
        assert!(!session.input().joystick_active());
    }

    #[test]
    fn test_mouse_drag_orbits() {
        let (mut session, _) = started(false);
        assert_eq!(
            session.handle(InputEvent::MouseMove {
                delta: Vec2::new(50.0, 0.0)
            }),
            EventDisposition::Ignored
        );

        session.handle(InputEvent::MouseDown(MouseButton::Secondary));
        session.handle(InputEvent::MouseMove {
            delta: Vec2::new(50.0, 0.0),
        });
        session.handle(InputEvent::MouseUp(MouseButton::Secondary));
        session.handle(InputEvent::MouseMove {
            delta: Vec2::new(50.0, 0.0),
        });
        assert!((session.orbit_offset().yaw - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_middle_button_does_not_orbit() {
        let (mut session, _) = started(false);
        session.handle(InputEvent::MouseDown(MouseButton::Middle));
        session.handle(InputEvent::MouseMove {
            delta: Vec2::new(50.0, 0.0),
        });
        assert_eq!(session.orbit_offset(), OrbitOffset::default());
    }

    #[test]
    fn test_touch_look_and_joystick_together() {
        let (mut session, _) = started(true);
        session.handle(InputEvent::TouchStart {
            id: 1,
            position: Vec2::new(100.0, 400.0),
            viewport_width: 1000.0,
        });
        session.handle(InputEvent::TouchStart {
            id: 2,
            position: Vec2::new(800.0, 400.0),
            viewport_width: 1000.0,
        });
        session.handle(InputEvent::TouchMove {
            id: 1,
            position: Vec2::new(100.0, 300.0),
        });
        session.handle(InputEvent::TouchMove {
            id: 2,
            position: Vec2::new(900.0, 400.0),
        });

        assert!(session.intent().forward);
        assert!((session.orbit_offset().yaw - 0.8).abs() < 1e-5);

        session.handle(InputEvent::TouchEnd { id: 2 });
        assert!(session.intent().forward);
        session.sync_touches(&[]);
        assert!(session.intent().is_neutral());
    }

    #[test]
    fn test_focus_lost_releases_keys() {
        let (mut session, _) = started(false);
        session.handle(InputEvent::ActionPressed(ControlAction::Left));
        session.handle(InputEvent::FocusLost);
        assert!(session.intent().is_neutral());
    }

    #[test]
    fn test_tick_without_body_touches_nothing() {
        let (mut session, _) = started(false);
        session.handle(InputEvent::ActionPressed(ControlAction::Forward));
        let mut ui = RecordingUi::default();
        let frame = session.tick::<FakeBody, _>(DT, None, &mut ui);
        assert!(frame.is_none());
        assert!(ui.speeds.is_empty());
        assert!(ui.zones.is_empty());
        assert_eq!(
            session.camera().frame().position,
            Vec3::new(0.0, 8.0, 12.0)
        );
    }

    #[test]
    fn test_driving_forward_reports_rising_speed() {
        let (mut session, _) = started(false);
        session.handle(InputEvent::ActionPressed(ControlAction::Forward));
        let mut body = FakeBody::flat();
        let mut ui = RecordingUi::default();
        for _ in 0..60 {
            session.tick(DT, Some(&mut body), &mut ui);
            body.step(DT);
        }
        assert_eq!(ui.speeds.len(), 60);
        assert!(ui.speeds.windows(2).all(|pair| pair[1] > pair[0]));
        // Forward is -Z at heading zero.
        assert!(body.position.z < -5.0);
        assert!(session.camera().frame().look_at.z < 0.0);
    }

    #[test]
    fn test_zone_entry_and_exit_reach_ui() {
        let (mut session, _) = started(false);
        let mut body = FakeBody::flat();
        let mut ui = RecordingUi::default();

        body.position = Vec3::new(10.0, 0.5, 1.0);
        let frame = session.tick(DT, Some(&mut body), &mut ui).unwrap();
        assert_eq!(
            frame.zone_transition.map(|transition| transition.entered),
            Some(Some(ZoneId::About))
        );

        // Staying inside writes nothing new.
        session.tick(DT, Some(&mut body), &mut ui);

        body.position = Vec3::new(0.0, 0.5, 0.0);
        session.tick(DT, Some(&mut body), &mut ui);
        assert_eq!(ui.zones, vec![Some(ZoneId::About), None]);
    }
}
