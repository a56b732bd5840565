//! Configuration management for the churn risk pipeline

use crate::explain::RiskThresholds;
use crate::models::ScorerKind;
use anyhow::{ensure, Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Configuration file read when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration; only `[artifacts]` is required
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Tier boundaries on churn probability
    #[serde(default)]
    pub risk_levels: RiskThresholds,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Locations of the artifacts produced by offline training
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Fitted statistics JSON (segment medians and percentiles)
    pub statistics_path: String,
    /// Logistic regression JSON with its standard scaler
    #[serde(default)]
    pub linear_model_path: Option<String>,
    /// Gradient-boosted tree ensemble exported to ONNX
    #[serde(default)]
    pub tree_model_path: Option<String>,
    /// Number of threads for ONNX inference (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Scorer selection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringConfig {
    /// Scorer used when the caller does not pick one
    #[serde(default)]
    pub default_scorer: ScorerKind,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Worker threads for batch scoring; 0 lets rayon decide
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is unset
    pub level: String,
    /// "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold pairs that would make a tier unreachable
    pub fn validate(&self) -> Result<()> {
        let t = &self.risk_levels;
        ensure!(
            (0.0..=1.0).contains(&t.medium) && (0.0..=1.0).contains(&t.high),
            "risk thresholds must lie in [0, 1] (medium={}, high={})",
            t.medium,
            t.high
        );
        ensure!(
            t.medium < t.high,
            "medium risk threshold {} must be below high threshold {}",
            t.medium,
            t.high
        );
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                statistics_path: "models/fitted_statistics.json".to_string(),
                linear_model_path: Some("models/logistic_regression.json".to_string()),
                tree_model_path: Some("models/xgboost.onnx".to_string()),
                onnx_threads: 1,
            },
            scoring: ScoringConfig::default(),
            risk_levels: RiskThresholds::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scoring.default_scorer, ScorerKind::Tree);
        assert_eq!(config.risk_levels.high, 0.50);
        assert_eq!(config.risk_levels.medium, 0.35);
        assert_eq!(config.pipeline.workers, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
            [artifacts]
            statistics_path = "artifacts/stats.json"
            linear_model_path = "artifacts/lr.json"
            onnx_threads = 2

            [scoring]
            default_scorer = "linear"

            [risk_levels]
            high = 0.6
            medium = 0.3

            [pipeline]
            workers = 8

            [logging]
            level = "debug"
            format = "json"
            "#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.artifacts.statistics_path, "artifacts/stats.json");
        assert_eq!(config.artifacts.tree_model_path, None);
        assert_eq!(config.artifacts.onnx_threads, 2);
        assert_eq!(config.scoring.default_scorer, ScorerKind::Linear);
        assert_eq!(config.risk_levels.high, 0.6);
        assert_eq!(config.pipeline.workers, 8);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file = write_config(
            r#"
            [artifacts]
            statistics_path = "stats.json"
            "#,
        );

        let config = AppConfig::load_from_path(file.path()).unwrap();

        assert_eq!(config.artifacts.onnx_threads, 1);
        assert_eq!(config.scoring.default_scorer, ScorerKind::Tree);
        assert_eq!(config.risk_levels, RiskThresholds::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let file = write_config(
            r#"
            [artifacts]
            statistics_path = "stats.json"

            [risk_levels]
            high = 0.3
            medium = 0.5
            "#,
        );

        assert!(AppConfig::load_from_path(file.path()).is_err());
    }
}
