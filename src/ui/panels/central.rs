use eframe::egui;

use crate::osx::open_privacy_settings;
use crate::style::ACCENT;
use crate::types::Theme;
use crate::ui::icon::{secondary_text, theme_icon};
use crate::ui::{tasks, ThemeSwitcherApp};

/// Render the central panel: current theme, actions, autostart and permission help.
pub fn show(ctx: &egui::Context, app: &mut ThemeSwitcherApp) {
    let ThemeSwitcherApp {
        state,
        controller,
        agent,
    } = app;

    egui::CentralPanel::default().show(ctx, |ui| {
        ui.add_space(12.0);
        ui.vertical_centered(|ui| {
            theme_icon(ui, state.theme, 64.0);
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new(format!("Current theme: {}", state.theme.label()))
                    .strong()
                    .size(18.0),
            );
        });

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            let toggle = ui.add_enabled(
                !state.toggling,
                egui::Button::new(egui::RichText::new("🎨 Toggle Theme").color(egui::Color32::WHITE))
                    .fill(ACCENT),
            );
            if toggle.clicked() {
                tasks::spawn_toggle(controller, state);
            }

            let check = ui.add_enabled(
                !state.checking_permission,
                egui::Button::new("🔑 Check Permission"),
            );
            if check.clicked() {
                tasks::spawn_permission_check(controller, state);
            }

            if ui.button("❓ Permission help").clicked() {
                state.open_permission_help(controller.permission_help().clone());
            }
        });

        ui.horizontal(|ui| {
            for target in [Theme::Light, Theme::Dark] {
                let selected = state.theme == target;
                let button = ui.add_enabled(!state.toggling && !selected, egui::Button::new(target.label()));
                if button.clicked() {
                    tasks::spawn_set_theme(controller, state, target);
                }
            }
        });

        ui.add_space(8.0);

        if let Some(agent) = agent.as_ref() {
            let mut enabled = state.autostart_enabled;
            if ui
                .checkbox(&mut enabled, "🚀 Launch at login")
                .on_hover_text(agent.path().display().to_string())
                .changed()
            {
                match agent.set_enabled(enabled) {
                    Ok(()) => {
                        state.autostart_enabled = enabled;
                        state.push_status(if enabled {
                            "Autostart enabled"
                        } else {
                            "Autostart disabled"
                        });
                    }
                    Err(e) => {
                        // leave the checkbox where the file system says it is
                        state.autostart_enabled = agent.is_enabled();
                        state.push_status(format!("Error: {e}"));
                    }
                }
            }
        }

        if let Some(help) = state.permission_help.clone() {
            ui.add_space(12.0);
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.label(
                    egui::RichText::new("Permission required")
                        .strong()
                        .color(egui::Color32::from_rgb(220, 68, 68)),
                );
                ui.label(format!(
                    "{} needs {} access to \"{}\" to switch the theme.",
                    help.requesting_app, help.category, help.target
                ));
                for (i, step) in help.steps().iter().enumerate() {
                    ui.label(format!("{}. {}", i + 1, step));
                }
                ui.horizontal(|ui| {
                    if ui.button("Open Settings").clicked() {
                        open_privacy_settings(&help.settings_url);
                    }
                    if ui.button("Copy reset command").clicked() {
                        ui.ctx().copy_text(help.reset_command.clone());
                    }
                    if ui.button("Dismiss").clicked() {
                        state.dismiss_permission_help();
                    }
                });
            });
        }

        ui.add_space(8.0);
        ui.label(
            egui::RichText::new("Changes made in System Settings show up here automatically.")
                .small()
                .color(secondary_text(state.theme)),
        );
    });
}
