use serde::Deserialize;
use std::path::Path;

use crate::orientation::DeviceOrientation;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub stream: StreamConfig,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub url: String,
    #[serde(default = "default_quality")]
    pub quality: u32,
    #[serde(default = "default_fps")]
    pub fps: f64,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_orientation")]
    pub orientation: DeviceOrientation,
}

/// Tuning for the stability evaluator. The threshold applies to the Manhattan
/// distance of the displacement *sum* over the window, so its effective
/// sensitivity scales with `history_len`.
#[derive(Debug, Clone, Deserialize)]
pub struct StabilityConfig {
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    #[serde(default = "default_manhattan_threshold")]
    pub manhattan_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_downsample")]
    pub downsample: u32,
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassificationConfig {
    pub endpoint: String,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresentationConfig {
    #[serde(default = "default_review_hold")]
    pub review_hold_secs: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            history_len: default_history_len(),
            manhattan_threshold: default_manhattan_threshold(),
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            downsample: default_downsample(),
            search_radius: default_search_radius(),
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            review_hold_secs: default_review_hold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// Default value functions
fn default_quality() -> u32 {
    80
}
fn default_fps() -> f64 {
    10.0
}
fn default_mode() -> String {
    "mjpeg".into()
}
fn default_orientation() -> DeviceOrientation {
    DeviceOrientation::Portrait
}
fn default_history_len() -> usize {
    15
}
fn default_manhattan_threshold() -> f64 {
    20.0
}
fn default_downsample() -> u32 {
    64
}
fn default_search_radius() -> u32 {
    8
}
fn default_min_confidence() -> f32 {
    0.9
}
fn default_request_timeout() -> u64 {
    10
}
fn default_review_hold() -> f64 {
    2.0
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let toml = r#"
            [stream]
            url = "http://camera.local:8080/stream"

            [classification]
            endpoint = "http://inference.local:9000/classify"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.stability.history_len, 15);
        assert_eq!(config.stability.manhattan_threshold, 20.0);
        assert_eq!(config.classification.min_confidence, 0.9);
        assert_eq!(config.stream.mode, "mjpeg");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn orientation_parses_from_snake_case() {
        let toml = r#"
            [stream]
            url = "http://camera.local:8080/stream"
            orientation = "landscape_left"

            [classification]
            endpoint = "http://inference.local:9000/classify"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.stream.orientation,
            DeviceOrientation::LandscapeLeft
        );
    }
}
