use eframe::egui;

use crate::ui::icon::secondary_text;
use crate::ui::GuiState;

/// Render the bottom status bar with the latest status line.
pub fn show(ctx: &egui::Context, state: &GuiState) {
    egui::TopBottomPanel::bottom("bottom_status")
        .resizable(false)
        .show(ctx, |ui| {
            let last = state.status_msgs.last().map(String::as_str).unwrap_or("Ready");
            ui.horizontal(|ui| {
                ui.set_height(28.0);
                ui.centered_and_justified(|ui| {
                    ui.label(
                        egui::RichText::new(last)
                            .color(secondary_text(state.theme))
                            .monospace(),
                    );
                });
            });
        });
}
