//! Forest Watch - Deforestation Risk Viewer
//!
//! Pick a point on the map, send it to the prediction service and show the
//! verdict with its monthly history.

mod api;
mod charts;
mod config;
mod controller;
mod gui;
mod logging;
mod map;

use anyhow::Context as _;
use api::HttpPredictionService;
use charts::ChartPlotter;
use config::AppConfig;
use controller::UiController;
use eframe::egui;
use gui::{ForestWatchApp, MapView};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    if let Err(e) = logging::init() {
        eprintln!("Logging disabled: {e}");
    }

    let config = AppConfig::load().context("Failed to load configuration")?;

    let service = HttpPredictionService::new(&config.endpoint);
    tracing::info!(endpoint = %service.url(), "Prediction endpoint configured");

    let controller = UiController::new(
        MapView::new(&config.map),
        ChartPlotter::new(),
        Arc::new(service),
    );

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title("Forest Watch"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Forest Watch",
        options,
        Box::new(|cc| Ok(Box::new(ForestWatchApp::new(cc, controller)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {e}"))
}
