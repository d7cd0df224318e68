use eframe::emath::{Pos2, Vec2};
use eframe::epaint::{Color32, Stroke};
use egui::{Response, Sense, Ui};

use crate::style::ACCENT;
use crate::types::Theme;

/// Side of the reference artwork; geometry below is in these units.
const ARTWORK: f32 = 18.0;

/// Paint a sun (light) or crescent moon (dark) into a `side`-sized square.
pub fn theme_icon(ui: &mut Ui, theme: Theme, side: f32) -> Response {
    let (rect, response) = ui.allocate_exact_size(Vec2::splat(side), Sense::hover());

    if ui.is_rect_visible(rect) {
        let scale = side / ARTWORK;
        let center = rect.center();
        let at = |x: f32, y: f32| center + Vec2::new(x - 9.0, 9.0 - y) * scale;
        let painter = ui.painter();

        match theme {
            Theme::Light => {
                painter.circle_filled(center, 5.0 * scale, ACCENT);
                let stroke = Stroke::new(2.0 * scale, ACCENT);
                for i in 0..8 {
                    let angle = i as f32 * std::f32::consts::FRAC_PI_4;
                    let (sin, cos) = angle.sin_cos();
                    let from: Pos2 = at(9.0 + cos * 7.0, 9.0 + sin * 7.0);
                    let to: Pos2 = at(9.0 + cos * 9.0, 9.0 + sin * 9.0);
                    painter.line_segment([from, to], stroke);
                }
            }
            Theme::Dark => {
                // crescent: full disc, then a bite in the panel colour
                let bg = ui.visuals().panel_fill;
                painter.circle_filled(center, 7.0 * scale, ACCENT);
                painter.circle_filled(at(12.0, 12.0), 5.0 * scale, bg);
            }
        }
    }

    response.on_hover_text(match theme {
        Theme::Light => "Light appearance",
        Theme::Dark => "Dark appearance",
    })
}

/// Text colour that reads well on the current panel.
pub fn secondary_text(theme: Theme) -> Color32 {
    match theme {
        Theme::Light => Color32::from_rgb(110, 112, 124),
        Theme::Dark => Color32::from_rgb(160, 162, 170),
    }
}
