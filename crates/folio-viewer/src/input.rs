//! Input action definitions and routing into the drive session.
//!
//! Keyboard driving goes through `leafwing-input-manager` so bindings live in
//! one input map. Mouse, touch and window focus come straight from Bevy's
//! input resources. Everything ends up as a [`folio_sim::InputEvent`] handed
//! to [`Drive`].

use std::collections::HashMap;

use bevy::{
    input::{mouse::MouseMotion, touch::Touches},
    prelude::*,
    window::{PrimaryWindow, WindowFocused},
};
use bevy_egui::EguiContexts;
use folio_sim::{
    ControlAction, InputEvent, ListenerId, ListenerKind, ListenerRegistry, TouchButton, TouchId,
    drive::MouseButton as PointerButton,
};
use leafwing_input_manager::{plugin::InputManagerSystem, prelude::*};

use crate::drive::{Drive, DriveSystems, Ui};

// ============================================================================
// Action enums
// ============================================================================

/// Keyboard actions while driving.
#[derive(Actionlike, PartialEq, Eq, Hash, Clone, Copy, Debug, Reflect)]
pub enum DriveAction {
    /// W / Up.
    Forward,
    /// S / Down.
    Backward,
    /// A / Left.
    Left,
    /// D / Right.
    Right,
    /// Space.
    Jump,
    /// Shift.
    Boost,
    /// Close the open portfolio panel (Escape).
    ClosePanel,
}

impl DriveAction {
    const ALL: [DriveAction; 7] = [
        DriveAction::Forward,
        DriveAction::Backward,
        DriveAction::Left,
        DriveAction::Right,
        DriveAction::Jump,
        DriveAction::Boost,
        DriveAction::ClosePanel,
    ];

    /// The control this action drives, if it drives one.
    pub fn control(self) -> Option<ControlAction> {
        match self {
            DriveAction::Forward => Some(ControlAction::Forward),
            DriveAction::Backward => Some(ControlAction::Backward),
            DriveAction::Left => Some(ControlAction::Left),
            DriveAction::Right => Some(ControlAction::Right),
            DriveAction::Jump => Some(ControlAction::Jump),
            DriveAction::Boost => Some(ControlAction::Boost),
            DriveAction::ClosePanel => None,
        }
    }
}

// ============================================================================
// Input maps
// ============================================================================

/// Create the default input map for drive actions.
pub fn default_drive_input_map() -> InputMap<DriveAction> {
    InputMap::default()
        .with(DriveAction::Forward, KeyCode::KeyW)
        .with(DriveAction::Forward, KeyCode::ArrowUp)
        .with(DriveAction::Backward, KeyCode::KeyS)
        .with(DriveAction::Backward, KeyCode::ArrowDown)
        .with(DriveAction::Left, KeyCode::KeyA)
        .with(DriveAction::Left, KeyCode::ArrowLeft)
        .with(DriveAction::Right, KeyCode::KeyD)
        .with(DriveAction::Right, KeyCode::ArrowRight)
        .with(DriveAction::Jump, KeyCode::Space)
        .with(DriveAction::Boost, KeyCode::ShiftLeft)
        .with(DriveAction::Boost, KeyCode::ShiftRight)
        .with(DriveAction::ClosePanel, KeyCode::Escape)
}

// ============================================================================
// Listener registry
// ============================================================================

/// Which event sources the drive session is subscribed to.
///
/// Routing systems poll a Bevy input resource only while the matching
/// listener is registered.
#[derive(Resource, Debug, Default)]
pub struct InputListeners {
    next_id: u64,
    active: HashMap<ListenerId, ListenerKind>,
}

impl InputListeners {
    pub fn is_registered(&self, kind: ListenerKind) -> bool {
        self.active.values().any(|registered| *registered == kind)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl ListenerRegistry for InputListeners {
    fn register(&mut self, kind: ListenerKind) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.active.insert(id, kind);
        tracing::trace!("Registered {kind:?} listener {id:?}");
        id
    }

    fn unregister(&mut self, id: ListenerId) {
        if self.active.remove(&id).is_none() {
            tracing::warn!("Unregistering unknown listener {id:?}");
        }
    }
}

fn listening(kind: ListenerKind) -> impl Fn(Res<InputListeners>) -> bool {
    move |listeners: Res<InputListeners>| listeners.is_registered(kind)
}

// ============================================================================
// On-screen buttons
// ============================================================================

/// Radius of the on-screen jump and boost buttons in logical pixels.
pub const TOUCH_BUTTON_RADIUS: f32 = 36.0;

/// Centres of the on-screen buttons for a viewport of `size` logical pixels.
pub fn touch_button_layout(size: Vec2) -> [(TouchButton, Vec2); 2] {
    [
        (TouchButton::Jump, Vec2::new(size.x - 72.0, size.y - 120.0)),
        (TouchButton::Boost, Vec2::new(size.x - 160.0, size.y - 64.0)),
    ]
}

/// The on-screen button under `position`, if any.
pub fn touch_button_at(position: Vec2, size: Vec2) -> Option<TouchButton> {
    touch_button_layout(size)
        .into_iter()
        .find(|(_, centre)| centre.distance(position) <= TOUCH_BUTTON_RADIUS)
        .map(|(button, _)| button)
}

/// Touches currently holding an on-screen button.
#[derive(Resource, Debug, Default)]
pub struct HeldTouchButtons(HashMap<TouchId, TouchButton>);

impl HeldTouchButtons {
    pub fn hold(&mut self, id: TouchId, button: TouchButton) {
        self.0.insert(id, button);
    }

    /// Stop tracking `id`, returning the button it held.
    pub fn release(&mut self, id: TouchId) -> Option<TouchButton> {
        self.0.remove(&id)
    }

    pub fn is_holding(&self, id: TouchId) -> bool {
        self.0.contains_key(&id)
    }

    /// Forget every held button; their releases will never be routed once
    /// the touch layout is gone.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Plugin
// ============================================================================

/// Plugin that registers the drive actions and routes raw input into the
/// session.
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<DriveAction>::default())
            .init_resource::<InputListeners>()
            .init_resource::<HeldTouchButtons>()
            .add_systems(Startup, spawn_input_map)
            .add_systems(
                PreUpdate,
                (manage_input_focus, route_keyboard)
                    .chain()
                    .after(InputManagerSystem::Update),
            )
            .add_systems(
                Update,
                (
                    route_focus,
                    route_mouse.run_if(listening(ListenerKind::MouseDown)),
                    route_touches.run_if(listening(ListenerKind::TouchStart)),
                )
                    .in_set(DriveSystems::Input),
            );
    }
}

fn spawn_input_map(mut commands: Commands) {
    commands.spawn((
        Name::new("Drive input"),
        default_drive_input_map(),
        ActionState::<DriveAction>::default(),
    ));
}

// ============================================================================
// Input focus management
// ============================================================================

/// Disable driving while egui has keyboard focus.
///
/// Keys held when focus moves to a text field never report a release, so
/// the session is told focus was lost.
fn manage_input_focus(
    mut action_query: Query<&mut ActionState<DriveAction>>,
    mut contexts: EguiContexts,
    mut drive: ResMut<Drive>,
    mut had_focus: Local<bool>,
) {
    let egui_wants_kb = contexts
        .ctx_mut()
        .ok()
        .is_some_and(|ctx| ctx.wants_keyboard_input());

    for mut action_state in &mut action_query {
        if egui_wants_kb {
            action_state.disable_all_actions();
        } else {
            action_state.enable_all_actions();
        }
    }

    if egui_wants_kb && !*had_focus {
        drive.0.handle(InputEvent::FocusLost);
    }
    *had_focus = egui_wants_kb;
}

// ============================================================================
// Routing
// ============================================================================

/// Forward key edges as action events.
fn route_keyboard(
    action_query: Query<&ActionState<DriveAction>>,
    mut drive: ResMut<Drive>,
    mut ui: ResMut<Ui>,
) {
    let Ok(action_state) = action_query.single() else {
        return;
    };

    for action in DriveAction::ALL {
        match action.control() {
            Some(control) => {
                if action_state.just_pressed(&action) {
                    drive.0.handle(InputEvent::ActionPressed(control));
                }
                if action_state.just_released(&action) {
                    drive.0.handle(InputEvent::ActionReleased(control));
                }
            }
            None => {
                if action_state.just_pressed(&action) {
                    ui.0.dismiss_panel();
                }
            }
        }
    }
}

/// Window blur drops every held key.
fn route_focus(mut focus_events: MessageReader<WindowFocused>, mut drive: ResMut<Drive>) {
    for event in focus_events.read() {
        if !event.focused {
            tracing::debug!("Window lost focus; releasing held keys");
            drive.0.handle(InputEvent::FocusLost);
        }
    }
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

/// Mouse buttons start and end orbit drags; motion feeds them.
///
/// Presses over an egui area belong to the UI.
fn route_mouse(
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: MessageReader<MouseMotion>,
    mut contexts: EguiContexts,
    mut drive: ResMut<Drive>,
) {
    let over_ui = contexts
        .ctx_mut()
        .ok()
        .is_some_and(|ctx| ctx.is_pointer_over_area());

    if !over_ui {
        for button in buttons.get_just_pressed().copied().filter_map(pointer_button) {
            drive.0.handle(InputEvent::MouseDown(button));
        }
    }
    for button in buttons.get_just_released().copied().filter_map(pointer_button) {
        drive.0.handle(InputEvent::MouseUp(button));
    }

    let delta: Vec2 = motion.read().map(|event| event.delta).sum();
    if delta != Vec2::ZERO {
        drive.0.handle(InputEvent::MouseMove { delta });
    }
}

/// Route touches to the on-screen buttons, the joystick or free look.
fn route_touches(
    touches: Res<Touches>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut held: ResMut<HeldTouchButtons>,
    mut drive: ResMut<Drive>,
) {
    let size = window.size();

    for touch in touches.iter_just_pressed() {
        let id = touch.id();
        if let Some(button) = touch_button_at(touch.position(), size) {
            held.hold(id, button);
            drive.0.handle(InputEvent::TouchButtonDown(button));
        } else {
            drive.0.handle(InputEvent::TouchStart {
                id,
                position: touch.position(),
                viewport_width: size.x,
            });
        }
    }

    for touch in touches.iter() {
        if touch.delta() != Vec2::ZERO && !held.is_holding(touch.id()) {
            drive.0.handle(InputEvent::TouchMove {
                id: touch.id(),
                position: touch.position(),
            });
        }
    }

    for touch in touches.iter_just_released().chain(touches.iter_just_canceled()) {
        let id = touch.id();
        if let Some(button) = held.release(id) {
            drive.0.handle(InputEvent::TouchButtonUp(button));
        } else {
            drive.0.handle(InputEvent::TouchEnd { id });
        }
    }

    let active: Vec<TouchId> = touches.iter().map(|touch| touch.id()).collect();
    drive.0.sync_touches(&active);
}
