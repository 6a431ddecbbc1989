//! Analysis Controller
//! Connects map clicks, the coordinate fields, the prediction request and
//! the result chart.

use crate::api::{
    Coordinate, PredictError, PredictionRequest, PredictionResult, PredictionService, TimeSeries,
};
use crate::charts::{BarChartConfig, ChartBackend, ChartHandle};
use crate::controller::state::{
    UiState, Visibility, INITIAL_BANNER, MISSING_COORDINATE_ALERT, SUCCESS_BANNER,
};
use crate::map::MapSurface;
use chrono::{Local, NaiveDate};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use thiserror::Error;

/// Request outcome from the background thread
type Settled = Result<PredictionResult, PredictError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Por favor, selecione uma área no mapa.")]
    MissingCoordinate,
}

/// What `submit` did with a valid request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Sent,
    /// A request is already in flight; nothing was sent.
    InFlight,
}

/// Owns all analysis state and the three collaborators it drives.
pub struct UiController<M, C, S> {
    map: M,
    charts: C,
    service: Arc<S>,

    lat_text: String,
    lon_text: String,
    state: UiState,
    banner: String,
    last_analysis: Option<NaiveDate>,
    alert: Option<String>,
    chart: Option<ChartHandle>,

    tx: Sender<Settled>,
    rx: Receiver<Settled>,
}

impl<M, C, S> UiController<M, C, S>
where
    M: MapSurface,
    C: ChartBackend,
    S: PredictionService,
{
    pub fn new(map: M, charts: C, service: Arc<S>) -> Self {
        let (tx, rx) = channel();
        Self {
            map,
            charts,
            service,
            lat_text: String::new(),
            lon_text: String::new(),
            state: UiState::Idle,
            banner: INITIAL_BANNER.to_string(),
            last_analysis: None,
            alert: None,
            chart: None,
            tx,
            rx,
        }
    }

    /// Move the single marker to `at` and echo it into the coordinate fields.
    pub fn handle_map_click(&mut self, at: Coordinate) {
        self.map.remove_marker();
        self.map.place_marker(at);
        self.lat_text = at.latitude_text();
        self.lon_text = at.longitude_text();
        tracing::debug!(lat = %self.lat_text, lon = %self.lon_text, "Map point selected");
    }

    /// Send the typed coordinates for analysis.
    ///
    /// Empty fields raise the blocking alert and leave the state untouched.
    pub fn submit(&mut self) -> Result<Submission, ValidationError> {
        if self.lat_text.is_empty() || self.lon_text.is_empty() {
            self.alert = Some(MISSING_COORDINATE_ALERT.to_string());
            return Err(ValidationError::MissingCoordinate);
        }
        if self.state.is_loading() {
            tracing::debug!("Submit ignored; a request is already in flight");
            return Ok(Submission::InFlight);
        }

        self.state = UiState::Loading;

        let request = PredictionRequest {
            lat: self.lat_text.clone(),
            lon: self.lon_text.clone(),
        };
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let outcome = service.predict(&request);
            let _ = tx.send(outcome);
        });

        Ok(Submission::Sent)
    }

    /// Apply a finished request, if any. Returns true when the state changed.
    pub fn poll(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.settle(outcome, Local::now().date_naive());
                true
            }
            Err(_) => false,
        }
    }

    /// Move from `Loading` to the settled state for `outcome`.
    pub fn settle(&mut self, outcome: Settled, today: NaiveDate) {
        self.state = UiState::settled(outcome);

        if let UiState::Success(result) = &self.state {
            let series = result.time_series.clone();
            tracing::info!(
                status = %result.status,
                confidence = result.confidence,
                months = series.len(),
                "Analysis complete"
            );
            self.last_analysis = Some(today);
            self.banner = SUCCESS_BANNER.to_string();
            self.render_chart(&series);
        }
    }

    /// Replace the current chart with one for `series`.
    pub fn render_chart(&mut self, series: &TimeSeries) {
        if let Some(old) = self.chart.take() {
            self.charts.destroy(old);
        }
        self.chart = Some(self.charts.create(BarChartConfig::from_time_series(series)));
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn visibility(&self) -> Visibility {
        self.state.visibility()
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    /// Last successful analysis as `dd/mm/yyyy`.
    pub fn last_analysis_text(&self) -> Option<String> {
        self.last_analysis
            .map(|date| date.format("%d/%m/%Y").to_string())
    }

    /// True when the live chart belongs to the result on screen. During a
    /// new request or after a failure it still shows the previous analysis.
    pub fn chart_is_current(&self) -> bool {
        self.chart.is_some() && self.state.result().is_some()
    }

    pub fn lat_text(&self) -> &str {
        &self.lat_text
    }

    pub fn lon_text(&self) -> &str {
        &self.lon_text
    }

    /// Coordinate fields, editable from the control panel.
    pub fn fields_mut(&mut self) -> (&mut String, &mut String) {
        (&mut self.lat_text, &mut self.lon_text)
    }

    pub fn map_mut(&mut self) -> &mut M {
        &mut self.map
    }

    pub fn charts(&self) -> &C {
        &self.charts
    }
}
