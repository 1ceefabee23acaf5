//! Driveable 3D portfolio built with Bevy.
//!
//! A small car drives around a stylised town; parking inside one of the
//! glowing zones opens the matching portfolio panel. The simulation itself
//! lives in `folio-sim`; this binary supplies rendering, physics, input and UI.

mod camera;
mod device;
mod drive;
mod input;
mod launch_params;
mod scene;
mod ui;
mod vehicle;
mod zones;

use avian3d::prelude::*;
use bevy::prelude::*;
use camera::ChaseCameraPlugin;
use drive::DrivePlugin;
use input::InputPlugin;
use scene::ScenePlugin;
use ui::PortfolioUiPlugin;
use vehicle::VehiclePlugin;
use zones::ZoneMarkerPlugin;

/// Downward acceleration in m/s².
const GRAVITY: f32 = 20.0;

/// Plugin for the main application.
pub struct AppPlugin;

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PhysicsPlugins::default())
            .insert_resource(Gravity(Vec3::NEG_Y * GRAVITY))
            .add_plugins((
                DrivePlugin,
                InputPlugin,
                VehiclePlugin,
                ChaseCameraPlugin,
                ZoneMarkerPlugin,
                ScenePlugin,
                PortfolioUiPlugin,
            ));
    }
}

fn main() {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let params = launch_params::parse();
    tracing::info!("Launching with {params:?}");

    let mut app = App::new();
    app.insert_resource(drive::build_session(&params))
        .insert_resource(params);

    #[allow(unused_mut)]
    let mut window = Window {
        title: "folio".to_string(),
        resolution: (1280, 720).into(),
        position: WindowPosition::Centered(MonitorSelection::Primary),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..Default::default()
    }));

    app.add_plugins(AppPlugin).run();
}
