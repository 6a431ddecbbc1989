//! Prediction API Schemas
//! Typed request and response bodies for the prediction endpoint.

use serde::{Deserialize, Serialize};

/// A point of interest in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude as shown in the coordinate field (6 decimals).
    pub fn latitude_text(&self) -> String {
        to_fixed(self.latitude, 6)
    }

    /// Longitude as shown in the coordinate field (6 decimals).
    pub fn longitude_text(&self) -> String {
        to_fixed(self.longitude, 6)
    }
}

/// Body of `POST /predict`. Values are sent exactly as typed in the fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub lat: String,
    pub lon: String,
}

/// Monthly history returned with a prediction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimeSeries {
    pub labels: Vec<String>,
    pub deforestation: Vec<f64>,
    pub risk: Vec<f64>,
    pub vegetation: Vec<f64>,
}

impl TimeSeries {
    /// Length shared by every series.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True when all three series are as long as `labels`.
    pub fn is_aligned(&self) -> bool {
        let n = self.labels.len();
        self.deforestation.len() == n && self.risk.len() == n && self.vegetation.len() == n
    }

    /// Truncate every sequence to the shortest one so indices stay parallel.
    pub fn truncate_to_shortest(&mut self) {
        let n = [
            self.labels.len(),
            self.deforestation.len(),
            self.risk.len(),
            self.vegetation.len(),
        ]
        .into_iter()
        .min()
        .unwrap_or(0);

        self.labels.truncate(n);
        self.deforestation.truncate(n);
        self.risk.truncate(n);
        self.vegetation.truncate(n);
    }
}

/// Successful prediction body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictionResult {
    pub status: String,
    pub confidence: f64,
    pub time_series: TimeSeries,
    /// `[lat, lon]` echoed back by the service as floats.
    #[serde(default)]
    pub coordinates: Option<[f64; 2]>,
}

impl PredictionResult {
    /// Confidence as a percentage with two decimals, e.g. `87.34%`.
    pub fn confidence_text(&self) -> String {
        format!("{}%", to_fixed(self.confidence * 100.0, 2))
    }
}

/// Fixed-point text with `digits` decimals. Exact halves round away from zero.
fn to_fixed(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    // `{:.N}` breaks exact ties to even. A tie needs at most `digits + 1`
    // decimals, which holds exactly when scaling by 2^(digits + 1) is whole.
    let wider = format!("{:.*}", digits + 1, magnitude);
    let scaled = magnitude * 2f64.powi(digits as i32 + 1);
    if scaled.fract() == 0.0 && wider.ends_with('5') {
        let kept = wider[..wider.len() - 1].trim_end_matches('.');
        return format!("{sign}{}", increment_last_digit(kept));
    }

    format!("{sign}{magnitude:.digits$}")
}

/// Add one unit in the last place of a plain decimal string.
fn increment_last_digit(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    for b in bytes.iter_mut().rev() {
        match *b {
            b'.' => continue,
            b'9' => *b = b'0',
            _ => {
                *b += 1;
                return String::from_utf8_lossy(&bytes).into_owned();
            }
        }
    }
    format!("1{}", String::from_utf8_lossy(&bytes))
}

/// Failure body sent with any non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_text_uses_six_decimals() {
        let c = Coordinate::new(-3.1234567, -60.9876543);
        assert_eq!(c.latitude_text(), "-3.123457");
        assert_eq!(c.longitude_text(), "-60.987654");

        let whole = Coordinate::new(-10.0, -55.0);
        assert_eq!(whole.latitude_text(), "-10.000000");
    }

    #[test]
    fn confidence_is_rendered_as_percentage() {
        let result = PredictionResult {
            status: "Alert".to_string(),
            confidence: 0.8734,
            time_series: TimeSeries::default(),
            coordinates: None,
        };
        assert_eq!(result.confidence_text(), "87.34%");

        let full = PredictionResult {
            confidence: 1.0,
            ..result.clone()
        };
        assert_eq!(full.confidence_text(), "100.00%");

        let zero = PredictionResult {
            confidence: 0.0,
            ..result
        };
        assert_eq!(zero.confidence_text(), "0.00%");
    }

    #[test]
    fn exact_halves_round_away_from_zero() {
        let result = PredictionResult {
            status: "Alert".to_string(),
            confidence: 0.12125,
            time_series: TimeSeries::default(),
            coordinates: None,
        };
        assert_eq!(result.confidence_text(), "12.13%");

        assert_eq!(Coordinate::new(0.0078125, 0.0).latitude_text(), "0.007813");
        assert_eq!(Coordinate::new(0.0, -0.0078125).longitude_text(), "-0.007813");
    }

    #[test]
    fn fixed_text_carries_and_leaves_near_halves_alone() {
        assert_eq!(to_fixed(9.995, 2), "9.99");
        assert_eq!(to_fixed(0.5, 0), "1");
        assert_eq!(to_fixed(9.5, 0), "10");
        assert_eq!(to_fixed(99.875, 2), "99.88");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(-0.0, 2), "0.00");
    }

    #[test]
    fn request_serializes_strings_verbatim() {
        let req = PredictionRequest {
            lat: "-10.123456".to_string(),
            lon: "abc".to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"lat":"-10.123456","lon":"abc"}"#);
    }

    #[test]
    fn truncate_to_shortest_keeps_series_parallel() {
        let mut ts = TimeSeries {
            labels: vec!["Jan".into(), "Fev".into(), "Mar".into()],
            deforestation: vec![1.0, 2.0, 3.0, 4.0],
            risk: vec![5.0, 6.0],
            vegetation: vec![7.0, 8.0, 9.0],
        };
        assert!(!ts.is_aligned());

        ts.truncate_to_shortest();

        assert!(ts.is_aligned());
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.labels, vec!["Jan", "Fev"]);
        assert_eq!(ts.deforestation, vec![1.0, 2.0]);
        assert_eq!(ts.vegetation, vec![7.0, 8.0]);
    }
}
