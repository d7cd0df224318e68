//! AppKit-inspired visuals for egui, following the system theme.

use eframe::{egui, epaint};

use crate::types::Theme;

/// Accent used for the drawn icon and active widgets.
pub const ACCENT: epaint::Color32 = epaint::Color32::from_rgb(0, 122, 255);

/// Apply a macOS-like light or dark look to the current egui Context.
pub fn set_appkit_style(ctx: &egui::Context, theme: Theme) {
    use egui::Visuals;

    let mut visuals = match theme {
        Theme::Light => {
            let mut v = Visuals::light();
            v.window_fill = epaint::Color32::from_rgb(236, 236, 236); // like System Settings
            v.panel_fill = epaint::Color32::from_rgb(255, 255, 255);
            v.widgets.hovered.bg_fill = epaint::Color32::from_rgb(245, 245, 247);
            v.widgets.noninteractive.bg_fill = epaint::Color32::from_rgb(255, 255, 255);
            v
        }
        Theme::Dark => {
            let mut v = Visuals::dark();
            v.window_fill = epaint::Color32::from_rgb(40, 40, 42);
            v.panel_fill = epaint::Color32::from_rgb(30, 30, 32);
            v.widgets.hovered.bg_fill = epaint::Color32::from_rgb(58, 58, 60);
            v.widgets.noninteractive.bg_fill = epaint::Color32::from_rgb(30, 30, 32);
            v
        }
    };
    visuals.widgets.active.bg_fill = ACCENT;
    visuals.widgets.active.fg_stroke = epaint::Stroke::new(1.0, epaint::Color32::WHITE);
    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    ctx.set_style(style);
}
