//! In-game HUD: title, help and mute buttons, controls hint, speed gauge and
//! floating zone labels.

use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use folio_sim::portfolio;

use super::{accent, glass_frame};
use crate::{
    camera::ChaseCamera,
    drive::{Drive, Ui},
    zones::ZoneMarker,
};

/// Height of a zone label above its crystal.
const LABEL_HEIGHT: f32 = 1.6;

pub(super) fn hud_system(
    mut contexts: EguiContexts,
    mut ui_state: ResMut<Ui>,
    drive: Res<Drive>,
) -> Result {
    if !ui_state.0.hud_visible() {
        return Ok(());
    }
    let ctx = contexts.ctx_mut()?;

    egui::Area::new(egui::Id::new("hud_title"))
        .anchor(egui::Align2::LEFT_TOP, [24.0, 24.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new("Developer Portfolio")
                    .size(24.0)
                    .strong()
                    .color(egui::Color32::from_rgb(0xff, 0x8c, 0x5a)),
            );
            ui.label(egui::RichText::new("Explore & Discover").weak());
        });

    egui::Area::new(egui::Id::new("hud_buttons"))
        .anchor(egui::Align2::RIGHT_TOP, [-24.0, 24.0])
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("❓").on_hover_text("Show instructions").clicked() {
                    ui_state.0.set_show_instructions(true);
                }
                let (icon, hint) = if ui_state.0.muted() {
                    ("🔇", "Unmute")
                } else {
                    ("🔊", "Mute")
                };
                if ui.button(icon).on_hover_text(hint).clicked() {
                    ui_state.0.toggle_mute();
                }
            });
        });

    if !drive.0.touch_enabled() {
        egui::Area::new(egui::Id::new("hud_hint"))
            .anchor(egui::Align2::LEFT_BOTTOM, [24.0, -24.0])
            .show(ctx, |ui| {
                glass_frame().show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.monospace("W A S D");
                        ui.label("Move");
                        ui.separator();
                        ui.monospace("Space");
                        ui.label("Jump");
                        ui.separator();
                        ui.monospace("Shift");
                        ui.label("Boost");
                    });
                });
            });
    }

    // Touch controls occupy the bottom corners; the gauge moves to the top.
    let gauge_anchor = if drive.0.touch_enabled() {
        (egui::Align2::CENTER_TOP, [0.0, 24.0])
    } else {
        (egui::Align2::RIGHT_BOTTOM, [-24.0, -24.0])
    };
    egui::Area::new(egui::Id::new("hud_speed"))
        .anchor(gauge_anchor.0, gauge_anchor.1)
        .show(ctx, |ui| {
            glass_frame().show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(ui_state.0.speed_display().to_string())
                            .size(28.0)
                            .strong()
                            .monospace(),
                    );
                    ui.label("km/h");
                });
            });
        });

    Ok(())
}

/// Icon and label floating above each zone crystal.
pub(super) fn zone_labels_system(
    mut contexts: EguiContexts,
    ui_state: Res<Ui>,
    drive: Res<Drive>,
    camera_query: Query<(&Camera, &GlobalTransform), With<ChaseCamera>>,
    marker_query: Query<(&ZoneMarker, &GlobalTransform)>,
) -> Result {
    if ui_state.0.loading() {
        return Ok(());
    }
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return Ok(());
    };
    let ctx = contexts.ctx_mut()?;
    let active = drive.0.zones().active();

    for (marker, transform) in &marker_query {
        let world = transform.translation() + Vec3::Y * LABEL_HEIGHT;
        let Ok(screen) = camera.world_to_viewport(camera_transform, world) else {
            continue;
        };

        let panel = portfolio::panel(marker.zone);
        let color = accent(panel.color);
        let size = if active == Some(marker.zone) { 18.0 } else { 15.0 };

        egui::Area::new(egui::Id::new(("zone_label", marker.zone.key())))
            .order(egui::Order::Background)
            .interactable(false)
            .pivot(egui::Align2::CENTER_BOTTOM)
            .fixed_pos([screen.x, screen.y])
            .show(ctx, |ui| {
                egui::Frame::NONE
                    .fill(color.gamma_multiply(0.35))
                    .stroke(egui::Stroke::new(1.0, color))
                    .corner_radius(10.0)
                    .inner_margin(6.0)
                    .show(ui, |ui| {
                        ui.label(
                            egui::RichText::new(format!("{} {}", panel.icon, marker.zone.label()))
                                .size(size)
                                .strong()
                                .color(egui::Color32::WHITE),
                        );
                    });
            });
    }

    Ok(())
}
