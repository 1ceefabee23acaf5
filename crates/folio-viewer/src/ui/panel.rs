//! Portfolio panel for the zone the car is parked in.

use bevy::{prelude::*, window::PrimaryWindow};
use bevy_egui::{EguiContexts, egui};
use folio_sim::portfolio::{self, Panel, PanelBody};

use super::{accent, glass_frame};
use crate::drive::Ui;

const PANEL_WIDTH: f32 = 420.0;

pub(super) fn panel_system(
    mut contexts: EguiContexts,
    mut ui_state: ResMut<Ui>,
    window: Single<&Window, With<PrimaryWindow>>,
) -> Result {
    let Some(zone) = ui_state.0.active_zone() else {
        return Ok(());
    };
    let ctx = contexts.ctx_mut()?;
    let panel = portfolio::panel(zone);
    let color = accent(panel.color);

    let mut open = true;
    egui::Window::new(
        egui::RichText::new(format!("{} {}", panel.icon, panel.title))
            .size(20.0)
            .strong()
            .color(color),
    )
    .id(egui::Id::new(("portfolio_panel", zone.key())))
    .open(&mut open)
    .collapsible(false)
    .resizable(false)
    .default_width(PANEL_WIDTH)
    .max_height(window.height() * 0.7)
    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
    .frame(glass_frame().stroke(egui::Stroke::new(2.0, color)))
    .show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            panel_body(ui, panel, color);
        });
    });

    if !open {
        ui_state.0.dismiss_panel();
    }
    Ok(())
}

fn panel_body(ui: &mut egui::Ui, panel: &Panel, color: egui::Color32) {
    match panel.body {
        PanelBody::About { paragraphs, traits } => {
            for paragraph in paragraphs {
                ui.label(*paragraph);
                ui.add_space(6.0);
            }
            ui.horizontal_wrapped(|ui| {
                for badge in traits {
                    ui.label(
                        egui::RichText::new(format!("{} {}", badge.emoji, badge.label))
                            .background_color(color.gamma_multiply(0.25)),
                    );
                }
            });
        }
        PanelBody::Skills(skills) => {
            for skill in skills {
                ui.horizontal(|ui| {
                    ui.label(skill.name);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(format!("{}%", skill.level));
                    });
                });
                ui.add(
                    egui::ProgressBar::new(f32::from(skill.level) / 100.0)
                        .fill(color)
                        .desired_height(6.0),
                );
                ui.add_space(4.0);
            }
        }
        PanelBody::Projects(projects) => {
            for project in projects {
                ui.group(|ui| {
                    ui.label(egui::RichText::new(project.name).strong().color(color));
                    ui.label(project.description);
                    ui.horizontal_wrapped(|ui| {
                        for tech in project.tech {
                            ui.small(*tech);
                        }
                    });
                });
                ui.add_space(4.0);
            }
        }
        PanelBody::Experience(roles) => {
            for role in roles {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new("●").color(color));
                    ui.vertical(|ui| {
                        ui.label(egui::RichText::new(role.title).strong());
                        ui.label(role.company);
                        ui.small(role.period);
                    });
                });
                ui.add_space(6.0);
            }
        }
        PanelBody::Contact { intro, channels } => {
            ui.label(intro);
            ui.add_space(6.0);
            for channel in channels {
                ui.horizontal(|ui| {
                    ui.label(channel.icon);
                    ui.label(egui::RichText::new(channel.label).strong());
                    ui.label(channel.value);
                });
            }
        }
    }
}
