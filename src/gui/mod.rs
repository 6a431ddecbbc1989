//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;
mod map_view;

pub use app::{AppController, ForestWatchApp};
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use map_view::MapView;
