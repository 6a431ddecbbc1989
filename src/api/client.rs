//! Prediction Client
//! Sends a coordinate to the prediction service and decodes its reply.

use crate::api::types::{ErrorBody, PredictionRequest, PredictionResult};
use crate::config::EndpointConfig;
use std::io::{self, Read};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictError {
    /// The service answered with a non-2xx status and an error message.
    #[error("Service error: {0}")]
    Application(String),
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Anything that can turn a coordinate request into a prediction.
pub trait PredictionService: Send + Sync + 'static {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError>;
}

/// `PredictionService` backed by a blocking `ureq` agent.
pub struct HttpPredictionService {
    agent: ureq::Agent,
    url: String,
    max_response_bytes: usize,
}

impl HttpPredictionService {
    pub fn new(config: &EndpointConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(config.connect_timeout_secs))
            .timeout_read(Duration::from_secs(config.read_timeout_secs))
            .build();

        Self {
            agent,
            url: config.predict_url(),
            max_response_bytes: config.max_response_bytes,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PredictionService for HttpPredictionService {
    fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, PredictError> {
        tracing::info!(url = %self.url, lat = %request.lat, lon = %request.lon, "Requesting prediction");
        let started = Instant::now();

        let response = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_json(request);

        // Non-2xx still carries a JSON body worth reading.
        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(PredictError::Transport(err.to_string()));
            }
        };

        let status = response.status();
        let body = read_body(response, self.max_response_bytes)
            .map_err(|e| PredictError::Transport(e.to_string()))?;

        tracing::info!(
            status,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction response received"
        );

        decode_response(status, &body)
    }
}

/// Read a response body, refusing anything larger than `max_bytes`.
fn read_body(response: ureq::Response, max_bytes: usize) -> Result<Vec<u8>, io::Error> {
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut bytes)?;

    if bytes.len() > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response exceeded {max_bytes} bytes"),
        ));
    }
    Ok(bytes)
}

/// Decode a response body according to its HTTP status.
///
/// 2xx bodies must be a full prediction. Other statuses are expected to carry
/// `{"error": "..."}`; a JSON body without that field still counts as an
/// application error, named by its status code.
pub fn decode_response(status: u16, body: &[u8]) -> Result<PredictionResult, PredictError> {
    if (200..300).contains(&status) {
        let mut result: PredictionResult =
            serde_json::from_slice(body).map_err(|e| PredictError::Malformed(e.to_string()))?;

        if !result.time_series.is_aligned() {
            tracing::warn!(
                labels = result.time_series.labels.len(),
                deforestation = result.time_series.deforestation.len(),
                risk = result.time_series.risk.len(),
                vegetation = result.time_series.vegetation.len(),
                "Time series lengths differ; truncating to the shortest"
            );
            result.time_series.truncate_to_shortest();
        }
        return Ok(result);
    }

    let error_body: ErrorBody =
        serde_json::from_slice(body).map_err(|e| PredictError::Malformed(e.to_string()))?;

    Err(PredictError::Application(
        error_body
            .error
            .unwrap_or_else(|| format!("HTTP {}", status)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    const SUCCESS_BODY: &str = r#"{
        "status": "Alert",
        "confidence": 0.8734,
        "coordinates": [-10.5, -55.25],
        "time_series": {
            "labels": ["Jan", "Fev", "Mar"],
            "deforestation": [10, 20, 30],
            "risk": [40, 50, 60],
            "vegetation": [70, 80, 90]
        }
    }"#;

    /// Serve one canned HTTP response and hand back the raw request text.
    fn serve_once(response: String) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let raw = read_request(&mut stream);
                let _ = tx.send(raw);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        (format!("http://{}", addr), rx)
    }

    /// Read headers plus `Content-Length` bytes of body.
    fn read_request(stream: &mut impl Read) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap_or(0);
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
    }

    fn service_for(base_url: &str) -> HttpPredictionService {
        HttpPredictionService::new(&EndpointConfig {
            base_url: base_url.to_string(),
            ..EndpointConfig::default()
        })
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            lat: "-10.000000".to_string(),
            lon: "-55.000000".to_string(),
        }
    }

    #[test]
    fn decodes_success_body() {
        let result = decode_response(200, SUCCESS_BODY.as_bytes()).unwrap();
        assert_eq!(result.status, "Alert");
        assert_eq!(result.confidence_text(), "87.34%");
        assert_eq!(result.coordinates, Some([-10.5, -55.25]));
        assert_eq!(result.time_series.labels.len(), 3);
        assert_eq!(result.time_series.risk, vec![40.0, 50.0, 60.0]);
    }

    #[test]
    fn non_success_status_yields_application_error() {
        let err = decode_response(400, br#"{"error":"invalid region"}"#).unwrap_err();
        assert_eq!(err, PredictError::Application("invalid region".to_string()));
    }

    #[test]
    fn error_body_without_message_names_status() {
        let err = decode_response(503, br#"{}"#).unwrap_err();
        assert_eq!(err, PredictError::Application("HTTP 503".to_string()));
    }

    #[test]
    fn invalid_json_is_malformed_for_any_status() {
        assert!(matches!(
            decode_response(200, b"<html>oops</html>"),
            Err(PredictError::Malformed(_))
        ));
        assert!(matches!(
            decode_response(500, b"Internal Server Error"),
            Err(PredictError::Malformed(_))
        ));
    }

    #[test]
    fn success_missing_fields_is_malformed() {
        let err = decode_response(200, br#"{"status":"Alert"}"#).unwrap_err();
        assert!(matches!(err, PredictError::Malformed(_)));
    }

    #[test]
    fn mismatched_series_are_truncated() {
        let body = r#"{
            "status": "Normal",
            "confidence": 0.5,
            "time_series": {
                "labels": ["Jan", "Fev", "Mar"],
                "deforestation": [1, 2],
                "risk": [1, 2, 3],
                "vegetation": [1, 2, 3, 4]
            }
        }"#;
        let result = decode_response(200, body.as_bytes()).unwrap();
        assert!(result.time_series.is_aligned());
        assert_eq!(result.time_series.len(), 2);
    }

    #[test]
    fn posts_json_and_decodes_success() {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            SUCCESS_BODY.len(),
            SUCCESS_BODY
        );
        let (url, requests) = serve_once(response);
        let service = service_for(&url);

        let result = service.predict(&request()).unwrap();
        assert_eq!(result.status, "Alert");

        let raw = requests.recv().unwrap();
        assert!(raw.starts_with("POST /predict HTTP/1.1"));
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.contains(r#"{"lat":"-10.000000","lon":"-55.000000"}"#));
    }

    #[test]
    fn reads_error_body_from_failed_status() {
        let body = r#"{"error":"invalid region"}"#;
        let response = format!(
            "HTTP/1.1 400 Bad Request\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let (url, _requests) = serve_once(response);

        let err = service_for(&url).predict(&request()).unwrap_err();
        assert_eq!(err, PredictError::Application("invalid region".to_string()));
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let err = service_for(&format!("http://{}", addr))
            .predict(&request())
            .unwrap_err();
        assert!(matches!(err, PredictError::Transport(_)));
    }

    #[test]
    fn oversized_body_is_rejected() {
        let body = "x".repeat(64);
        let response = format!("HTTP/1.0 200 OK\r\n\r\n{body}");
        let (url, _requests) = serve_once(response);
        let service = HttpPredictionService::new(&EndpointConfig {
            base_url: url,
            max_response_bytes: 16,
            ..EndpointConfig::default()
        });

        let err = service.predict(&request()).unwrap_err();
        assert!(matches!(err, PredictError::Transport(_)));
    }
}
