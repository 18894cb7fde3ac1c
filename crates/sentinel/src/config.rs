//! Daemon configuration

use anyhow::Result;
use serde::Deserialize;

/// Daemon configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SentinelConfig {
    /// Minutes between risk sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,

    /// Minimum winning probability before an alert is emitted
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,

    /// Directory holding the model artifact and its metadata
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Base search root for CSV training data
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_alert_threshold() -> f64 {
    sentinel_lib::DEFAULT_ALERT_THRESHOLD
}

fn default_model_dir() -> String {
    "models".to_string()
}

fn default_data_dir() -> String {
    ".".to_string()
}

impl SentinelConfig {
    /// Load configuration from environment variables (SENTINEL_ prefix)
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SENTINEL"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| SentinelConfig {
            sweep_interval_minutes: default_sweep_interval(),
            alert_threshold: default_alert_threshold(),
            model_dir: default_model_dir(),
            data_dir: default_data_dir(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SentinelConfig::load().unwrap();
        assert_eq!(config.sweep_interval_minutes, 60);
        assert!((config.alert_threshold - 0.70).abs() < f64::EPSILON);
        assert_eq!(config.model_dir, "models");
    }
}
