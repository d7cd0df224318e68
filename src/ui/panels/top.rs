use eframe::egui;

use crate::ui::icon::theme_icon;
use crate::ui::GuiState;

/// Render the top header panel.
pub fn show(ctx: &egui::Context, state: &GuiState) {
    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            theme_icon(ui, state.theme, 24.0);
            ui.heading(format!("Theme Switcher v{}", env!("CARGO_PKG_VERSION")));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if state.toggling {
                    ui.spinner();
                }
            });
        });
        ui.add_space(6.0);
    });
}
