//! UI State
//! The four mutually exclusive states of the analysis panel and what each
//! one shows.

use crate::api::{PredictError, PredictionResult};

pub const MISSING_COORDINATE_ALERT: &str = "Por favor, selecione uma área no mapa.";
pub const CONNECTION_ERROR: &str = "Ocorreu um erro ao conectar com o servidor.";
pub const SUCCESS_BANNER: &str = "Análise concluída!";
pub const INITIAL_BANNER: &str = "Clique no mapa para escolher uma área.";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Success(PredictionResult),
    /// Message exactly as displayed.
    Failure(String),
}

/// Which panel elements are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub loading: bool,
    pub result: bool,
    pub error: bool,
}

impl UiState {
    /// Build the settled state for a finished request.
    ///
    /// Transport and decoding failures are logged and replaced by a generic
    /// message; service errors are shown as `Erro: <message>`.
    pub fn settled(outcome: Result<PredictionResult, PredictError>) -> Self {
        match outcome {
            Ok(result) => UiState::Success(result),
            Err(PredictError::Application(message)) => {
                tracing::warn!("Prediction rejected by service: {}", message);
                UiState::Failure(format!("Erro: {}", message))
            }
            Err(e) => {
                tracing::error!("Prediction request failed: {}", e);
                UiState::Failure(CONNECTION_ERROR.to_string())
            }
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            UiState::Idle => Visibility {
                loading: false,
                result: false,
                error: false,
            },
            UiState::Loading => Visibility {
                loading: true,
                result: false,
                error: false,
            },
            UiState::Success(_) => Visibility {
                loading: false,
                result: true,
                error: false,
            },
            UiState::Failure(_) => Visibility {
                loading: false,
                result: false,
                error: true,
            },
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading)
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            UiState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_text(&self) -> Option<&str> {
        match self {
            UiState::Failure(message) => Some(message),
            _ => None,
        }
    }
}
