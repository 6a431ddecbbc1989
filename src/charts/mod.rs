//! Charts module - Bar chart model and rendering

mod bar_chart;
mod plotter;

pub use bar_chart::{BarChartConfig, ChartBackend, ChartHandle};
pub use plotter::ChartPlotter;
