//! Chart Viewer Widget
//! Bottom panel card holding the monthly history chart.

use crate::charts::ChartPlotter;
use egui::{Color32, RichText};

const CARD_BORDER: Color32 = Color32::from_rgb(46, 139, 87);
const STALE_OPACITY: f32 = 0.45;

pub struct ChartViewer;

impl ChartViewer {
    /// `analyzed_on` is the date of the charted analysis. A chart that is not
    /// `current` is dimmed and captioned as the previous analysis.
    pub fn show(
        ui: &mut egui::Ui,
        plotter: &ChartPlotter,
        analyzed_on: Option<&str>,
        current: bool,
    ) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.5, CARD_BORDER))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(
                    RichText::new("Histórico da área")
                        .size(16.0)
                        .strong()
                        .color(CARD_BORDER),
                );
                if let Some(caption) = caption(analyzed_on, current) {
                    ui.label(RichText::new(caption).size(12.0).weak());
                }
                ui.add_space(6.0);
                if !current && analyzed_on.is_some() {
                    ui.multiply_opacity(STALE_OPACITY);
                }
                plotter.show(ui);
            });
    }
}

fn caption(analyzed_on: Option<&str>, current: bool) -> Option<String> {
    let date = analyzed_on?;
    Some(if current {
        format!("Análise de {date}")
    } else {
        format!("Análise anterior, de {date}")
    })
}
