//! Forest Watch Main Application
//! Main window with control panel, map and history chart.

use crate::api::HttpPredictionService;
use crate::charts::ChartPlotter;
use crate::controller::{Submission, UiController};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, MapView};
use egui::{Align2, RichText, SidePanel, TopBottomPanel, Vec2};

/// Controller wired to the real widgets and HTTP client.
pub type AppController = UiController<MapView, ChartPlotter, HttpPredictionService>;

/// Main application window.
pub struct ForestWatchApp {
    controller: AppController,
    control_panel: ControlPanel,
}

impl ForestWatchApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, controller: AppController) -> Self {
        Self {
            controller,
            control_panel: ControlPanel::new(),
        }
    }

    fn handle_analyze(&mut self) {
        match self.controller.submit() {
            Ok(Submission::Sent) => tracing::info!(
                lat = %self.controller.lat_text(),
                lon = %self.controller.lon_text(),
                "Analysis requested"
            ),
            Ok(Submission::InFlight) => {}
            Err(e) => tracing::info!("Analysis blocked: {}", e),
        }
    }

    /// Modal alert; the rest of the window is disabled while it is open.
    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.controller.alert().map(str::to_owned) else {
            return;
        };

        egui::Window::new("Aviso")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(RichText::new(message).size(14.0));
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        self.controller.dismiss_alert();
                    }
                });
            });
    }
}

impl eframe::App for ForestWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for a finished request
        self.controller.poll();

        // Keep polling while a request is in flight
        if self.controller.state().is_loading() {
            ctx.request_repaint();
        }

        let blocked = self.controller.alert().is_some();

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                ui.add_enabled_ui(!blocked, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        let action = self.control_panel.show(ui, &mut self.controller);
                        match action {
                            ControlPanelAction::Analyze => self.handle_analyze(),
                            ControlPanelAction::None => {}
                        }
                    });
                });
            });

        // Bottom panel - history chart
        TopBottomPanel::bottom("chart_panel")
            .resizable(true)
            .default_height(360.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                let analyzed_on = self.controller.last_analysis_text();
                ChartViewer::show(
                    ui,
                    self.controller.charts(),
                    analyzed_on.as_deref(),
                    self.controller.chart_is_current(),
                );
            });

        // Central panel - Map
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(!blocked, |ui| {
                if let Some(point) = self.controller.map_mut().show(ui) {
                    self.controller.handle_map_click(point);
                }
            });
        });

        self.show_alert(ctx);
    }
}
