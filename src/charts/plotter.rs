//! Chart Plotter Module
//! Draws bar charts with egui_plot and owns the live chart instances.

use crate::charts::{BarChartConfig, ChartBackend, ChartHandle};
use egui::RichText;
use egui_plot::{Bar, BarChart, Legend, Plot};
use std::collections::BTreeMap;

const CHART_HEIGHT: f32 = 280.0;

/// `ChartBackend` that keeps chart configs and draws them every frame.
#[derive(Default)]
pub struct ChartPlotter {
    charts: BTreeMap<ChartHandle, BarChartConfig>,
    next_id: u64,
}

impl ChartPlotter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of charts currently alive.
    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.charts.len()
    }

    /// Draw every live chart.
    pub fn show(&self, ui: &mut egui::Ui) {
        if self.charts.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("Nenhuma análise ainda").size(16.0));
            });
            return;
        }

        for (handle, config) in &self.charts {
            Self::draw_bar_chart(ui, *handle, config);
        }
    }

    fn draw_bar_chart(ui: &mut egui::Ui, handle: ChartHandle, config: &BarChartConfig) {
        let x_labels = config.labels.clone();
        let bar_width = config.bar_width();

        let mut plot = Plot::new(format!("bar_chart_{}", handle.0))
            .height(CHART_HEIGHT)
            .legend(Legend::default())
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_formatter(move |mark, _range| {
                let v = mark.value;
                // Only label whole category ticks.
                if v.fract().abs() > f64::EPSILON || v < 0.0 {
                    return String::new();
                }
                x_labels.get(v as usize).cloned().unwrap_or_default()
            });

        if config.begin_at_zero {
            plot = plot.include_y(0.0);
        }

        plot.show(ui, |plot_ui| {
            for (dataset_idx, dataset) in config.datasets.iter().enumerate() {
                let bars: Vec<Bar> = dataset
                    .data
                    .iter()
                    .enumerate()
                    .map(|(category, &value)| {
                        Bar::new(config.bar_position(category, dataset_idx), value)
                            .width(bar_width)
                            .fill(dataset.fill)
                            .stroke(egui::Stroke::new(dataset.border_width, dataset.border))
                            .name(config.labels.get(category).cloned().unwrap_or_default())
                    })
                    .collect();

                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(&dataset.label)
                        .color(dataset.border),
                );
            }
        });
    }
}

impl ChartBackend for ChartPlotter {
    fn create(&mut self, config: BarChartConfig) -> ChartHandle {
        let handle = ChartHandle(self.next_id);
        self.next_id += 1;
        self.charts.insert(handle, config);
        tracing::debug!(chart = handle.0, "Chart created");
        handle
    }

    fn destroy(&mut self, handle: ChartHandle) {
        if self.charts.remove(&handle).is_some() {
            tracing::debug!(chart = handle.0, "Chart destroyed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TimeSeries;

    fn config() -> BarChartConfig {
        BarChartConfig::from_time_series(&TimeSeries {
            labels: vec!["Jan".into()],
            deforestation: vec![1.0],
            risk: vec![2.0],
            vegetation: vec![3.0],
        })
    }

    #[test]
    fn create_and_destroy_track_live_charts() {
        let mut plotter = ChartPlotter::new();
        let first = plotter.create(config());
        assert_eq!(plotter.live_count(), 1);

        plotter.destroy(first);
        let second = plotter.create(config());

        assert_ne!(first, second);
        assert_eq!(plotter.live_count(), 1);
    }

    #[test]
    fn destroying_unknown_handle_is_harmless() {
        let mut plotter = ChartPlotter::new();
        plotter.create(config());
        plotter.destroy(ChartHandle(42));
        assert_eq!(plotter.live_count(), 1);
    }
}
