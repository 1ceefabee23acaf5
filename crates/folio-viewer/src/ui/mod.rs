//! egui overlays: loading screen, instructions, HUD, zone labels, portfolio
//! panels and touch controls.
//!
//! Everything reads [`Ui`](crate::drive::Ui) and the drive session; buttons
//! write back through the session's setters.

mod hud;
mod overlays;
mod panel;

use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass, egui};

/// Plugin for the egui overlays.
pub struct PortfolioUiPlugin;

impl Plugin for PortfolioUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default()).add_systems(
            EguiPrimaryContextPass,
            (
                overlays::loading_screen_system,
                overlays::instructions_system,
                hud::hud_system,
                hud::zone_labels_system,
                panel::panel_system,
                overlays::touch_controls_system,
            )
                .chain(),
        );
    }
}

/// Accent colour as an egui colour.
fn accent(color: [u8; 3]) -> egui::Color32 {
    let [r, g, b] = color;
    egui::Color32::from_rgb(r, g, b)
}

/// Translucent dark fill used behind overlay text.
const GLASS: egui::Color32 = egui::Color32::from_rgba_premultiplied(12, 10, 16, 200);

fn glass_frame() -> egui::Frame {
    egui::Frame::NONE
        .fill(GLASS)
        .corner_radius(12.0)
        .inner_margin(12.0)
}
