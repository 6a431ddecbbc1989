//! Grouped Bar Chart Model
//! Chart configuration built from a prediction's time series, and the
//! create/destroy contract a chart surface offers.

use crate::api::TimeSeries;
use egui::Color32;

/// Fraction of a category slot covered by its group of bars.
const GROUP_WIDTH: f64 = 0.8;

/// One bar series sharing the chart's category labels.
#[derive(Debug, Clone, PartialEq)]
pub struct BarDataset {
    pub label: String,
    pub data: Vec<f64>,
    pub fill: Color32,
    pub border: Color32,
    pub border_width: f32,
}

/// Everything needed to draw one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartConfig {
    pub labels: Vec<String>,
    pub datasets: Vec<BarDataset>,
    pub begin_at_zero: bool,
}

/// (label, rgb) for each series, in drawing order.
const SERIES_STYLE: [(&str, [u8; 3]); 3] = [
    ("Desmatamento", [255, 99, 132]),
    ("Risco", [255, 206, 86]),
    ("Vegetação", [75, 192, 192]),
];

impl BarChartConfig {
    /// Deforestation, risk and vegetation as three bar series over the same months.
    pub fn from_time_series(series: &TimeSeries) -> Self {
        let data = [
            &series.deforestation,
            &series.risk,
            &series.vegetation,
        ];

        let datasets = SERIES_STYLE
            .iter()
            .zip(data)
            .map(|(&(label, [r, g, b]), values)| BarDataset {
                label: label.to_string(),
                data: values.clone(),
                // 50% alpha fill, opaque border
                fill: Color32::from_rgba_unmultiplied(r, g, b, 128),
                border: Color32::from_rgb(r, g, b),
                border_width: 1.0,
            })
            .collect();

        Self {
            labels: series.labels.clone(),
            datasets,
            begin_at_zero: true,
        }
    }

    /// Width of a single bar when every series shares a category slot.
    pub fn bar_width(&self) -> f64 {
        GROUP_WIDTH / self.datasets.len().max(1) as f64
    }

    /// X position of the bar for `dataset` in category `category`.
    pub fn bar_position(&self, category: usize, dataset: usize) -> f64 {
        let width = self.bar_width();
        category as f64 - GROUP_WIDTH / 2.0 + width * (dataset as f64 + 0.5)
    }
}

/// Identifies one live chart on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChartHandle(pub u64);

/// A surface that can hold charts.
///
/// Charts are immutable once created. Updating means destroying the old
/// handle and creating a new chart.
pub trait ChartBackend {
    fn create(&mut self, config: BarChartConfig) -> ChartHandle;
    fn destroy(&mut self, handle: ChartHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series() -> TimeSeries {
        TimeSeries {
            labels: vec!["Jan".into(), "Fev".into()],
            deforestation: vec![12.0, 30.0],
            risk: vec![44.0, 5.0],
            vegetation: vec![80.0, 61.0],
        }
    }

    #[test]
    fn builds_three_series_in_fixed_order() {
        let config = BarChartConfig::from_time_series(&series());

        assert_eq!(config.labels, vec!["Jan", "Fev"]);
        assert!(config.begin_at_zero);

        let labels: Vec<&str> = config.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Desmatamento", "Risco", "Vegetação"]);
        assert_eq!(config.datasets[0].data, vec![12.0, 30.0]);
        assert_eq!(config.datasets[1].data, vec![44.0, 5.0]);
        assert_eq!(config.datasets[2].data, vec![80.0, 61.0]);
    }

    #[test]
    fn series_colors_match_palette() {
        let config = BarChartConfig::from_time_series(&series());
        let risk = &config.datasets[1];

        assert_eq!(risk.fill, Color32::from_rgba_unmultiplied(255, 206, 86, 128));
        assert_eq!(risk.border, Color32::from_rgb(255, 206, 86));
        assert!(config.datasets.iter().all(|d| d.border_width == 1.0));
    }

    #[test]
    fn bars_are_grouped_around_category_center() {
        let config = BarChartConfig::from_time_series(&series());
        let width = config.bar_width();

        assert!((width - 0.8 / 3.0).abs() < 1e-12);
        // Middle series sits on the category tick.
        assert!((config.bar_position(1, 1) - 1.0).abs() < 1e-12);
        assert!(config.bar_position(1, 0) < 1.0);
        assert!(config.bar_position(1, 2) > 1.0);
        // Group stays inside its slot.
        assert!(config.bar_position(1, 0) - width / 2.0 >= 0.6 - 1e-12);
        assert!(config.bar_position(1, 2) + width / 2.0 <= 1.4 + 1e-12);
    }
}
