//! API module - Prediction service schemas and HTTP client

mod client;
mod types;

pub use client::{HttpPredictionService, PredictError, PredictionService};
pub use types::{Coordinate, PredictionRequest, PredictionResult, TimeSeries};
