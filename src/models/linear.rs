//! Logistic regression artifact exported by the training run.
//!
//! The artifact bundles the fitted standard scaler with the classifier so the
//! two always come from the same training run.

use crate::feature_extractor::FeatureSet;
use crate::models::scorer::{FeatureScaler, Scorer};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
struct ScalerParams {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct LinearArtifact {
    #[serde(default = "default_model_name")]
    name: String,
    /// Feature layout version the model was trained against
    layout_version: u32,
    feature_names: Vec<String>,
    scaler: ScalerParams,
    coefficients: Vec<f64>,
    intercept: f64,
}

fn default_model_name() -> String {
    "logistic_regression".to_string()
}

/// `(x - mean) / scale` per feature
#[derive(Debug, Clone)]
pub struct StandardScaler {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FeatureScaler for StandardScaler {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != self.mean.len() {
            bail!(
                "scaler fitted on {} features, got {}",
                self.mean.len(),
                features.len()
            );
        }

        Ok(features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}

/// Logistic regression over standardized features
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    name: String,
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    /// The `n` largest coefficients by magnitude, sign kept.
    ///
    /// Inputs are standardized, so magnitudes are comparable across features.
    pub fn top_coefficients(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .map(String::as_str)
            .zip(self.coefficients.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked.truncate(n);
        ranked
    }
}

impl Scorer for LogisticRegression {
    fn name(&self) -> &str {
        &self.name
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            bail!(
                "model has {} coefficients, got {} features",
                self.coefficients.len(),
                features.len()
            );
        }

        let logit = self.intercept
            + features
                .iter()
                .zip(&self.coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        Ok(sigmoid(logit))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Parse the artifact into its scaler and classifier halves
pub fn from_json(raw: &str) -> Result<(StandardScaler, LogisticRegression)> {
    let artifact: LinearArtifact =
        serde_json::from_str(raw).context("Failed to deserialize linear model artifact")?;

    if artifact.layout_version != FeatureSet::VERSION {
        bail!(
            "linear artifact targets feature layout v{}, this build derives v{}",
            artifact.layout_version,
            FeatureSet::VERSION
        );
    }

    let n = artifact.feature_names.len();
    if artifact.scaler.mean.len() != n
        || artifact.scaler.scale.len() != n
        || artifact.coefficients.len() != n
    {
        bail!(
            "linear artifact is inconsistent: {} names, {} means, {} scales, {} coefficients",
            n,
            artifact.scaler.mean.len(),
            artifact.scaler.scale.len(),
            artifact.coefficients.len()
        );
    }

    // zero-variance features are left unscaled
    let scale = artifact
        .scaler
        .scale
        .iter()
        .map(|s| if *s == 0.0 { 1.0 } else { *s })
        .collect();

    let scaler = StandardScaler {
        feature_names: artifact.feature_names.clone(),
        mean: artifact.scaler.mean,
        scale,
    };
    let model = LogisticRegression {
        name: artifact.name,
        feature_names: artifact.feature_names,
        coefficients: artifact.coefficients,
        intercept: artifact.intercept,
    };

    Ok((scaler, model))
}

/// Load the artifact from disk
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<(StandardScaler, LogisticRegression)> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read linear model from {}", path.display()))?;
    let (scaler, model) = from_json(&raw)?;

    info!(
        model = %model.name,
        path = %path.display(),
        features = model.feature_names.len(),
        "Linear model loaded"
    );

    Ok((scaler, model))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTIFACT: &str = r#"{
        "layout_version": 1,
        "feature_names": ["a", "b"],
        "scaler": {"mean": [1.0, 0.0], "scale": [2.0, 0.0]},
        "coefficients": [0.5, -1.0],
        "intercept": 0.25
    }"#;

    #[test]
    fn test_scaler_transform() {
        let (scaler, _) = from_json(ARTIFACT).unwrap();

        let scaled = scaler.transform(&[5.0, 3.0]).unwrap();
        assert_eq!(scaled, vec![2.0, 3.0]);
    }

    #[test]
    fn test_logistic_probability() {
        let (_, model) = from_json(ARTIFACT).unwrap();

        // logit = 0.25 + 0.5*2 - 1*3 = -1.75
        let p = model.predict_proba(&[2.0, 3.0]).unwrap();
        assert!((p - 1.0 / (1.0 + 1.75f64.exp())).abs() < 1e-12);
        assert_eq!(model.name(), "logistic_regression");
    }

    #[test]
    fn test_zero_logit_is_even_odds() {
        assert_eq!(sigmoid(0.0), 0.5);
    }

    #[test]
    fn test_inconsistent_artifact_is_rejected() {
        let bad = r#"{
            "layout_version": 1,
            "feature_names": ["a", "b"],
            "scaler": {"mean": [1.0], "scale": [2.0, 1.0]},
            "coefficients": [0.5, -1.0],
            "intercept": 0.0
        }"#;
        assert!(from_json(bad).is_err());
    }

    #[test]
    fn test_layout_version_must_match() {
        let stale = ARTIFACT.replace(r#""layout_version": 1"#, r#""layout_version": 0"#);
        let err = from_json(&stale).unwrap_err();
        assert!(err.to_string().contains("layout v0"));

        let unversioned = ARTIFACT.replace(r#""layout_version": 1,"#, "");
        assert!(from_json(&unversioned).is_err());
    }

    #[test]
    fn test_top_coefficients_rank_by_magnitude() {
        let raw = r#"{
            "layout_version": 1,
            "feature_names": ["a", "b", "c", "d"],
            "scaler": {"mean": [0, 0, 0, 0], "scale": [1, 1, 1, 1]},
            "coefficients": [0.2, -1.5, 0.9, 0.0],
            "intercept": 0.0
        }"#;
        let (_, model) = from_json(raw).unwrap();

        assert_eq!(model.top_coefficients(3), vec![("b", -1.5), ("c", 0.9), ("a", 0.2)]);
        assert_eq!(model.top_coefficients(10).len(), 4);
        assert!(model.top_coefficients(0).is_empty());
    }

    #[test]
    fn test_arity_mismatch_fails() {
        let (scaler, model) = from_json(ARTIFACT).unwrap();
        assert!(scaler.transform(&[1.0]).is_err());
        assert!(model.predict_proba(&[1.0, 2.0, 3.0]).is_err());
    }
}
