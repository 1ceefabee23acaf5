//! Full-screen overlays and touch control drawing.

use bevy::{prelude::*, window::PrimaryWindow};
use bevy_egui::{EguiContexts, egui};
use folio_sim::{ControlAction, TouchButton};

use super::glass_frame;
use crate::{
    drive::{Drive, Ui},
    input::{TOUCH_BUTTON_RADIUS, touch_button_layout},
};

const HIGHLIGHT: egui::Color32 = egui::Color32::from_rgb(0xff, 0x8c, 0x5a);

// ============================================================================
// Loading and instructions
// ============================================================================

pub(super) fn loading_screen_system(mut contexts: EguiContexts, ui_state: Res<Ui>) -> Result {
    if !ui_state.0.loading() {
        return Ok(());
    }
    let ctx = contexts.ctx_mut()?;
    let progress = ui_state.0.loading_progress();

    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.fill(egui::Color32::from_rgb(0x1a, 0x15, 0x20)))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.35);
                ui.label(egui::RichText::new("🚗").size(64.0));
                ui.label(
                    egui::RichText::new("Loading Portfolio...")
                        .size(28.0)
                        .strong()
                        .color(HIGHLIGHT),
                );
                ui.label(egui::RichText::new("Preparing your adventure").weak());
                ui.add_space(16.0);
                ui.add(
                    egui::ProgressBar::new(progress / 100.0)
                        .desired_width(240.0)
                        .fill(HIGHLIGHT),
                );
                ui.label(format!("{progress:.0}%"));
            });
        });
    Ok(())
}

pub(super) fn instructions_system(mut contexts: EguiContexts, mut ui_state: ResMut<Ui>) -> Result {
    if ui_state.0.loading() || !ui_state.0.show_instructions() {
        return Ok(());
    }
    let ctx = contexts.ctx_mut()?;

    let controls: &[(&str, &str)] = if ui_state.0.is_mobile() {
        &[
            ("Left stick", "Drive and steer"),
            ("⬆ button", "Jump"),
            ("⚡ button", "Boost"),
            ("Drag right side", "Look around"),
        ]
    } else {
        &[
            ("W A S D / Arrows", "Drive and steer"),
            ("Space", "Jump"),
            ("Shift", "Boost"),
            ("Mouse drag", "Look around"),
            ("Esc", "Close panel"),
        ]
    };

    egui::Window::new("instructions")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .frame(glass_frame().stroke(egui::Stroke::new(2.0, HIGHLIGHT)))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("Welcome to My Portfolio")
                        .size(26.0)
                        .strong()
                        .color(HIGHLIGHT),
                );
                ui.label("Drive into the glowing zones to learn more about me.");
            });
            ui.add_space(12.0);

            egui::Grid::new("instructions_controls")
                .num_columns(2)
                .spacing([24.0, 6.0])
                .show(ui, |ui| {
                    for (keys, action) in controls {
                        ui.monospace(*keys);
                        ui.label(*action);
                        ui.end_row();
                    }
                });

            ui.add_space(12.0);
            ui.vertical_centered(|ui| {
                let start = egui::Button::new(egui::RichText::new("Start Exploring 🚀").size(18.0))
                    .fill(HIGHLIGHT.gamma_multiply(0.6));
                if ui.add(start).clicked() {
                    ui_state.0.set_show_instructions(false);
                }
            });
        });
    Ok(())
}

// ============================================================================
// Touch controls
// ============================================================================

/// Where the joystick base rests while no finger is on it, in stick radii from
/// the bottom-left corner.
const JOYSTICK_REST_OFFSET: f32 = 1.75;

fn pos(v: Vec2) -> egui::Pos2 {
    egui::pos2(v.x, v.y)
}

pub(super) fn touch_controls_system(
    mut contexts: EguiContexts,
    ui_state: Res<Ui>,
    drive: Res<Drive>,
    window: Single<&Window, With<PrimaryWindow>>,
) -> Result {
    if !drive.0.touch_enabled() || !ui_state.0.hud_visible() {
        return Ok(());
    }
    let ctx = contexts.ctx_mut()?;
    let size = window.size();
    let input = drive.0.input();
    let radius = input.tuning().joystick_radius;
    let intent = drive.0.intent();

    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("touch_controls"),
    ));

    let base = input.joystick_origin().unwrap_or(Vec2::new(
        radius * JOYSTICK_REST_OFFSET,
        size.y - radius * JOYSTICK_REST_OFFSET,
    ));
    let knob = base + input.joystick_deflection() * radius;
    let rim = if input.joystick_active() {
        HIGHLIGHT
    } else {
        egui::Color32::from_white_alpha(90)
    };
    painter.circle(
        pos(base),
        radius,
        egui::Color32::from_black_alpha(80),
        egui::Stroke::new(2.0, rim),
    );
    painter.circle_filled(pos(knob), radius * 0.4, egui::Color32::from_white_alpha(160));

    for (button, centre) in touch_button_layout(size) {
        let (label, action) = match button {
            TouchButton::Jump => ("⬆", ControlAction::Jump),
            TouchButton::Boost => ("⚡", ControlAction::Boost),
        };
        let fill = if intent.get(action) {
            HIGHLIGHT
        } else {
            egui::Color32::from_black_alpha(100)
        };
        painter.circle(
            pos(centre),
            TOUCH_BUTTON_RADIUS,
            fill,
            egui::Stroke::new(2.0, egui::Color32::from_white_alpha(120)),
        );
        painter.text(
            pos(centre),
            egui::Align2::CENTER_CENTER,
            label,
            egui::FontId::proportional(24.0),
            egui::Color32::WHITE,
        );
    }
    Ok(())
}
