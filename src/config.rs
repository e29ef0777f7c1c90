//! # Configuration
//!
//! Small serde-backed configuration structs with documented defaults and
//! environment-variable overrides.

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration for the REST task boundary
#[derive(Debug, Clone, Deserialize)]
pub struct BoundaryConfig {
    /// Base URL of the task-list service API
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tasks.googleapis.com/tasks/v1".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl BoundaryConfig {
    /// Apply `QUADRANT_TASKS_BASE_URL` / `QUADRANT_TASKS_TIMEOUT_MS`
    /// overrides on top of the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("QUADRANT_TASKS_BASE_URL") {
            config.base_url = url;
        }
        if let Some(timeout) = env_u64("QUADRANT_TASKS_TIMEOUT_MS") {
            config.timeout_ms = timeout;
        }
        config
    }
}

/// Configuration for the note-export boundary
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Base URL of the export proxy
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl ExportConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("QUADRANT_EXPORT_BASE_URL") {
            config.base_url = url;
        }
        if let Some(timeout) = env_u64("QUADRANT_EXPORT_TIMEOUT_MS") {
            config.timeout_ms = timeout;
        }
        config
    }
}

/// Configuration for the offline demo boundary
#[derive(Debug, Clone, Deserialize)]
pub struct DemoConfig {
    /// Directory holding the persisted demo task file
    pub data_dir: PathBuf,
    /// Optional artificial latency for boundary calls, in milliseconds
    pub latency_ms: Option<u64>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            data_dir: std::env::temp_dir().join("quadrant-demo"),
            latency_ms: None,
        }
    }
}

impl DemoConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("QUADRANT_DEMO_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        config.latency_ms = env_u64("QUADRANT_DEMO_LATENCY_MS").or(config.latency_ms);
        config
    }
}

/// Aggregate application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuadrantConfig {
    #[serde(default)]
    pub boundary: BoundaryConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

impl QuadrantConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            boundary: BoundaryConfig::from_env(),
            export: ExportConfig::from_env(),
            demo: DemoConfig::from_env(),
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_defaults() {
        let config = BoundaryConfig::default();
        assert_eq!(config.base_url, "https://tasks.googleapis.com/tasks/v1");
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn test_config_deserialization() {
        let toml_like = serde_json::json!({
            "boundary": { "base_url": "http://localhost:9090", "timeout_ms": 5000 },
            "export": { "base_url": "http://localhost:9091/api", "timeout_ms": 5000 },
            "demo": { "data_dir": "/tmp/q", "latency_ms": 100 }
        });
        let config: QuadrantConfig = serde_json::from_value(toml_like).unwrap();
        assert_eq!(config.boundary.base_url, "http://localhost:9090");
        assert_eq!(config.demo.latency_ms, Some(100));
    }
}
