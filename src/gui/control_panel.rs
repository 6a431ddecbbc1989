//! Control Panel Widget
//! Left side panel with the coordinate fields, the analyze button and the
//! analysis result.

use crate::gui::AppController;
use egui::{Color32, RichText};

const ACCENT: Color32 = Color32::from_rgb(46, 139, 87);
const ERROR_RED: Color32 = Color32::from_rgb(220, 53, 69);

/// Left side control panel.
#[derive(Default)]
pub struct ControlPanel;

impl ControlPanel {
    pub fn new() -> Self {
        Self
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, controller: &mut AppController) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(RichText::new("🌳 Forest Watch").size(22.0).color(ACCENT));
            ui.label(
                RichText::new("Monitoramento de desmatamento")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Coordinates =====
        ui.label(RichText::new("📍 Coordenadas").size(14.0).strong());
        ui.add_space(5.0);

        let label_width = 80.0;
        {
            let (lat, lon) = controller.fields_mut();
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Latitude:"));
                ui.add(egui::TextEdit::singleline(lat).desired_width(160.0));
            });
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Longitude:"));
                ui.add(egui::TextEdit::singleline(lon).desired_width(160.0));
            });
        }

        ui.add_space(15.0);

        // ===== Action =====
        let visibility = controller.visibility();
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!visibility.loading, |ui| {
                let button = egui::Button::new(RichText::new("🔍 Analisar").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Analyze;
                }
            });
        });

        ui.add_space(10.0);
        ui.label(RichText::new(controller.banner()).size(12.0).color(Color32::GRAY));

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status =====
        if visibility.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Analisando imagem de satélite...");
            });
        }

        if visibility.error {
            if let Some(message) = controller.state().error_text() {
                ui.label(RichText::new(message).size(12.0).color(ERROR_RED));
            }
        }

        if visibility.result {
            Self::draw_result(ui, controller);
        }

        action
    }

    fn draw_result(ui: &mut egui::Ui, controller: &AppController) {
        let Some(result) = controller.state().result() else {
            return;
        };

        ui.label(RichText::new("📊 Resultado").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("result_grid")
                    .num_columns(2)
                    .spacing([12.0, 6.0])
                    .show(ui, |ui| {
                        ui.label("Status:");
                        ui.label(RichText::new(&result.status).strong());
                        ui.end_row();

                        ui.label("Confiança:");
                        ui.label(RichText::new(result.confidence_text()).strong());
                        ui.end_row();

                        if let Some([lat, lon]) = result.coordinates {
                            ui.label("Local:");
                            ui.label(format!("{:.6}, {:.6}", lat, lon));
                            ui.end_row();
                        }

                        if let Some(date) = controller.last_analysis_text() {
                            ui.label("Última análise:");
                            ui.label(date);
                            ui.end_row();
                        }
                    });
            });
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Analyze,
}
