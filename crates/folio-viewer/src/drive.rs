//! Drive session lifecycle and the per-frame tick.
//!
//! The simulation core lives in `folio_sim`; this module owns it as Bevy
//! resources, feeds it the car's Avian rigid body each frame and keeps the
//! listener registrations in step with the window.

use avian3d::prelude::*;
use bevy::{
    app::AppExit,
    prelude::*,
    window::{PrimaryWindow, WindowResized},
};
use folio_sim::{DriveSession, RigidBodyHandle, UiSession, is_mobile_viewport};

use crate::{
    device,
    input::{HeldTouchButtons, InputListeners},
    launch_params::LaunchParams,
    vehicle::Car,
};

/// Drive session: input, vehicle, camera and zones.
#[derive(Resource, Debug)]
pub struct Drive(pub DriveSession);

/// UI state rendered by the HUD and written by the drive tick.
#[derive(Resource, Debug, Default)]
pub struct Ui(pub UiSession);

/// Ordering of the per-frame drive work within `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveSystems {
    /// Raw mouse, touch and window events are routed into the session.
    Input,
    /// The session ticks once.
    Tick,
    /// Entities are updated from the new session state.
    Present,
}

/// Plugin for the drive session.
pub struct DrivePlugin;

impl Plugin for DrivePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Ui>()
            .configure_sets(
                Update,
                (
                    DriveSystems::Input,
                    DriveSystems::Tick,
                    DriveSystems::Present,
                )
                    .chain(),
            )
            .add_systems(Startup, start_drive_session)
            .add_systems(
                Update,
                (
                    relayout_on_resize.before(DriveSystems::Input),
                    (tick_loading, drive_tick_system).in_set(DriveSystems::Tick),
                ),
            )
            .add_systems(Last, stop_on_exit);
    }
}

/// Build the session resource from the launch parameters.
pub fn build_session(params: &LaunchParams) -> Drive {
    Drive(DriveSession::new(params.drive_config(), params.seed))
}

fn wants_touch_layout(params: &LaunchParams, window: &Window) -> bool {
    params.force_touch
        || is_mobile_viewport(window.width(), device::has_touch(), &device::user_agent())
}

/// Pick the layout and subscribe to input.
fn start_drive_session(
    params: Res<LaunchParams>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut drive: ResMut<Drive>,
    mut ui: ResMut<Ui>,
    mut listeners: ResMut<InputListeners>,
) {
    let touch = wants_touch_layout(&params, &window);
    ui.0.set_is_mobile(touch);
    drive.0.set_touch_enabled(touch);
    drive.0.start(&mut *listeners);

    if params.skip_intro {
        ui.0.finish_loading();
        ui.0.set_show_instructions(false);
    }
}

/// Switch between the desktop and touch layouts when the window changes size.
fn relayout_on_resize(
    mut resized: MessageReader<WindowResized>,
    params: Res<LaunchParams>,
    window: Single<&Window, With<PrimaryWindow>>,
    mut drive: ResMut<Drive>,
    mut ui: ResMut<Ui>,
    mut listeners: ResMut<InputListeners>,
    mut held: ResMut<HeldTouchButtons>,
) {
    if resized.read().count() == 0 {
        return;
    }

    let touch = wants_touch_layout(&params, &window);
    if touch == drive.0.touch_enabled() {
        return;
    }

    tracing::info!(
        "Switching to {} layout",
        if touch { "touch" } else { "desktop" }
    );
    switch_layout(&mut drive.0, &mut ui.0, &mut listeners, &mut held, touch);
}

/// Restart the session with the touch layout on or off.
///
/// Touch listeners are only registered on start, so a layout change restarts
/// the session. Buttons held under the old layout are forgotten.
fn switch_layout(
    drive: &mut DriveSession,
    ui: &mut UiSession,
    listeners: &mut InputListeners,
    held: &mut HeldTouchButtons,
    touch: bool,
) {
    ui.set_is_mobile(touch);
    drive.stop(listeners);
    held.clear();
    drive.set_touch_enabled(touch);
    drive.start(listeners);
}

fn stop_on_exit(
    mut exit: MessageReader<AppExit>,
    mut drive: ResMut<Drive>,
    mut listeners: ResMut<InputListeners>,
) {
    if exit.read().count() > 0 && drive.0.is_listening() {
        drive.0.stop(&mut *listeners);
    }
}

fn tick_loading(time: Res<Time>, mut ui: ResMut<Ui>) {
    if ui.0.loading() {
        ui.0.tick_loading(time.delta_secs());
    }
}

// ============================================================================
// Rigid body adapter
// ============================================================================

/// The car's Avian body seen through [`RigidBodyHandle`].
///
/// The car carries [`SleepingDisabled`], so every write already lands on an
/// awake body and the wake flag needs no extra work.
struct AvianBody<'a> {
    position: Vec3,
    velocity: Mut<'a, LinearVelocity>,
}

impl RigidBodyHandle for AvianBody<'_> {
    fn linear_velocity(&self) -> glam::Vec3 {
        self.velocity.0
    }

    fn set_linear_velocity(&mut self, velocity: glam::Vec3, _wake: bool) {
        self.velocity.0 = velocity;
    }

    fn position(&self) -> glam::Vec3 {
        self.position
    }
}

/// Run one drive tick against the car's rigid body.
///
/// Avian integrates the written velocity in the fixed-step schedule; the tick
/// itself runs at frame rate with the frame delta.
fn drive_tick_system(
    time: Res<Time>,
    mut drive: ResMut<Drive>,
    mut ui: ResMut<Ui>,
    mut car_query: Query<(&Position, &mut LinearVelocity), With<Car>>,
) {
    let dt = time.delta_secs();
    let mut body = car_query
        .single_mut()
        .ok()
        .map(|(position, velocity)| AvianBody {
            position: position.0,
            velocity,
        });

    let Some(frame) = drive.0.tick(dt, body.as_mut(), &mut ui.0) else {
        return;
    };

    if let Some(transition) = frame.zone_transition {
        for event in transition.events() {
            tracing::info!("Zone {event:?}");
        }
    }
}
