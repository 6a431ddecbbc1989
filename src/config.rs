//! Application Configuration
//! Endpoint and map settings read from an optional TOML file, with
//! environment overrides for the values that change between deployments.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "forest_watch.toml";
pub const CONFIG_PATH_ENV: &str = "FOREST_WATCH_CONFIG";
pub const ENDPOINT_ENV: &str = "FOREST_WATCH_ENDPOINT";
pub const TILE_URL_ENV: &str = "FOREST_WATCH_TILE_URL";

pub const MIN_ZOOM: u8 = 2;
pub const MAX_ZOOM: u8 = 18;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Zoom {0} is outside 2..=18")]
    InvalidZoom(u8),
    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },
}

/// Prediction endpoint settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
    pub predict_path: String,
    pub connect_timeout_secs: u64,
    /// Model inference can be slow; this only bounds a stalled socket.
    pub read_timeout_secs: u64,
    pub max_response_bytes: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            predict_path: "/predict".to_string(),
            connect_timeout_secs: 10,
            read_timeout_secs: 120,
            max_response_bytes: 1024 * 1024,
        }
    }
}

impl EndpointConfig {
    /// Full URL of the prediction route.
    pub fn predict_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.predict_path.trim_start_matches('/')
        )
    }
}

/// Map view and tile layer settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    pub tiles_enabled: bool,
    /// Template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    pub attribution: String,
    pub user_agent: String,
    pub max_tile_fetches: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // Brazilian Amazon
            center_lat: -10.0,
            center_lon: -55.0,
            zoom: 5,
            tiles_enabled: true,
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
            user_agent: concat!("forest_watch/", env!("CARGO_PKG_VERSION")).to_string(),
            max_tile_fetches: 6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: EndpointConfig,
    pub map: MapConfig,
}

impl AppConfig {
    /// Load configuration for this launch.
    ///
    /// Reads `.env` if present, then the file named by `FOREST_WATCH_CONFIG`
    /// (or `forest_watch.toml` when it exists), then applies env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(TILE_URL_ENV).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, tile_url: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|v| !v.trim().is_empty()) {
            self.endpoint.base_url = endpoint.trim().to_string();
        }
        if let Some(tile_url) = tile_url.filter(|v| !v.trim().is_empty()) {
            self.map.tile_url = tile_url.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.map.zoom) {
            return Err(ConfigError::InvalidZoom(self.map.zoom));
        }
        if !is_http_url(&self.endpoint.base_url) {
            return Err(ConfigError::InvalidUrl {
                field: "endpoint.base_url",
                value: self.endpoint.base_url.clone(),
            });
        }
        if self.map.tiles_enabled && !is_http_url(&self.map.tile_url) {
            return Err(ConfigError::InvalidUrl {
                field: "map.tile_url",
                value: self.map.tile_url.clone(),
            });
        }
        Ok(())
    }
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.map.zoom, 5);
        assert_eq!(config.endpoint.predict_url(), "http://127.0.0.1:5000/predict");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [endpoint]
            base_url = "https://monitor.example.org/"

            [map]
            zoom = 7
            tiles_enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(
            config.endpoint.predict_url(),
            "https://monitor.example.org/predict"
        );
        assert_eq!(config.endpoint.connect_timeout_secs, 10);
        assert_eq!(config.map.zoom, 7);
        assert!(!config.map.tiles_enabled);
        assert_eq!(config.map.center_lat, -10.0);
    }

    #[test]
    fn env_overrides_replace_urls() {
        let mut config = AppConfig::default();
        config.apply_overrides(
            Some(" http://10.0.0.5:8000 ".to_string()),
            Some(String::new()),
        );
        assert_eq!(config.endpoint.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.map.tile_url, MapConfig::default().tile_url);
    }

    #[test]
    fn validate_rejects_bad_zoom_and_urls() {
        let mut config = AppConfig::default();
        config.map.zoom = 19;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidZoom(19))));

        let mut config = AppConfig::default();
        config.endpoint.base_url = "localhost:5000".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { field: "endpoint.base_url", .. })
        ));

        let mut config = AppConfig::default();
        config.map.tile_url = "tiles/{z}/{x}/{y}.png".to_string();
        config.map.tiles_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_file_reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[map]\nzoom = \"five\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_file_reads_valid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[endpoint]\npredict_path = \"/api/predict\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(
            config.endpoint.predict_url(),
            "http://127.0.0.1:5000/api/predict"
        );
    }
}
