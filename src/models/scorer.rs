//! Scorer capabilities consumed by the dispatcher.
//!
//! Models are opaque: the pipeline only sees a declared input layout and a
//! `vector -> probability` (or `vector -> vector` for scalers) function.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scorer family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScorerKind {
    /// Scaled logistic regression - interpretable coefficients
    Linear,
    /// Gradient-boosted tree ensemble - higher accuracy
    #[default]
    Tree,
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScorerKind::Linear => f.write_str("linear"),
            ScorerKind::Tree => f.write_str("tree"),
        }
    }
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "logistic_regression" | "lr" => Ok(ScorerKind::Linear),
            "tree" | "xgboost" => Ok(ScorerKind::Tree),
            other => Err(format!("unknown scorer '{other}' (expected linear or tree)")),
        }
    }
}

/// Probability model over an ordered feature vector
pub trait Scorer: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    /// Feature names the model was trained on, in input order
    fn feature_names(&self) -> &[String];

    /// Probability of the positive (churn) class
    fn predict_proba(&self, features: &[f64]) -> Result<f64>;
}

/// Per-feature transform fitted alongside a model (e.g. standard scaling)
pub trait FeatureScaler: Send + Sync {
    fn feature_names(&self) -> &[String];

    fn transform(&self, features: &[f64]) -> Result<Vec<f64>>;
}
