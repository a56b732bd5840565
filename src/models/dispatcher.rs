//! Routes derived features to the registered scorer family.

use crate::feature_extractor::{DerivedFeatures, FeatureSet, FeatureVector};
use crate::models::scorer::{FeatureScaler, Scorer, ScorerKind};
use std::sync::Arc;
use tracing::debug;

/// Scoring failures. None of these are retried: identical input fails identically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("{0} scorer is not registered")]
    ModelUnavailable(ScorerKind),
    #[error("{scorer} scorer expects {expected} features, got {actual}: {detail}")]
    FeatureShapeMismatch {
        scorer: ScorerKind,
        expected: usize,
        actual: usize,
        detail: String,
    },
    #[error("{scorer} scorer failed: {message}")]
    Inference { scorer: ScorerKind, message: String },
    #[error("{scorer} scorer returned non-finite probability {value}")]
    InvalidProbability { scorer: ScorerKind, value: f64 },
}

/// Registry of scorer capabilities, one per family
#[derive(Clone, Default)]
pub struct ScoringDispatcher {
    linear_model: Option<Arc<dyn Scorer>>,
    linear_scaler: Option<Arc<dyn FeatureScaler>>,
    tree_model: Option<Arc<dyn Scorer>>,
}

impl ScoringDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_linear_model(mut self, model: Arc<dyn Scorer>) -> Self {
        self.linear_model = Some(model);
        self
    }

    pub fn with_linear_scaler(mut self, scaler: Arc<dyn FeatureScaler>) -> Self {
        self.linear_scaler = Some(scaler);
        self
    }

    pub fn with_tree_model(mut self, model: Arc<dyn Scorer>) -> Self {
        self.tree_model = Some(model);
        self
    }

    /// Whether every capability the family needs is registered
    pub fn is_available(&self, kind: ScorerKind) -> bool {
        match kind {
            ScorerKind::Linear => self.linear_model.is_some() && self.linear_scaler.is_some(),
            ScorerKind::Tree => self.tree_model.is_some(),
        }
    }

    /// Feature layout consumed by a scorer family
    pub fn feature_set(kind: ScorerKind) -> FeatureSet {
        match kind {
            ScorerKind::Linear => FeatureSet::Linear,
            ScorerKind::Tree => FeatureSet::Tree,
        }
    }

    /// Project derived features for the family and score them
    pub fn score(&self, features: &DerivedFeatures, kind: ScorerKind) -> Result<f64, ScoringError> {
        let vector = features.project(Self::feature_set(kind));
        self.score_vector(&vector, kind)
    }

    /// Score an already projected vector
    pub fn score_vector(&self, vector: &FeatureVector, kind: ScorerKind) -> Result<f64, ScoringError> {
        let (model, raw) = match kind {
            ScorerKind::Linear => {
                let model = self
                    .linear_model
                    .as_ref()
                    .ok_or(ScoringError::ModelUnavailable(kind))?;
                let scaler = self
                    .linear_scaler
                    .as_ref()
                    .ok_or(ScoringError::ModelUnavailable(kind))?;

                check_layout(kind, scaler.feature_names(), vector)?;
                check_layout(kind, model.feature_names(), vector)?;

                let scaled = scaler
                    .transform(&vector.values)
                    .map_err(|e| inference_error(kind, e))?;
                if scaled.len() != vector.len() {
                    return Err(ScoringError::FeatureShapeMismatch {
                        scorer: kind,
                        expected: vector.len(),
                        actual: scaled.len(),
                        detail: "scaler changed vector arity".to_string(),
                    });
                }
                let raw = model
                    .predict_proba(&scaled)
                    .map_err(|e| inference_error(kind, e))?;
                (model, raw)
            }
            ScorerKind::Tree => {
                let model = self
                    .tree_model
                    .as_ref()
                    .ok_or(ScoringError::ModelUnavailable(kind))?;

                check_layout(kind, model.feature_names(), vector)?;

                let raw = model
                    .predict_proba(&vector.values)
                    .map_err(|e| inference_error(kind, e))?;
                (model, raw)
            }
        };

        if !raw.is_finite() {
            return Err(ScoringError::InvalidProbability {
                scorer: kind,
                value: raw,
            });
        }

        let probability = raw.clamp(0.0, 1.0);
        debug!(
            scorer = %kind,
            model = %model.name(),
            probability,
            "Scored feature vector"
        );
        Ok(probability)
    }
}

fn inference_error(scorer: ScorerKind, err: anyhow::Error) -> ScoringError {
    ScoringError::Inference {
        scorer,
        message: format!("{err:#}"),
    }
}

/// Names and order must match exactly; positional drift is a versioning bug
fn check_layout(
    scorer: ScorerKind,
    declared: &[String],
    vector: &FeatureVector,
) -> Result<(), ScoringError> {
    let actual = vector.names();

    if declared.len() != actual.len() || declared.len() != vector.len() {
        return Err(ScoringError::FeatureShapeMismatch {
            scorer,
            expected: declared.len(),
            actual: vector.len(),
            detail: format!("{} layout has {} names", vector.set, actual.len()),
        });
    }

    if let Some((position, (want, got))) = declared
        .iter()
        .zip(actual.iter())
        .enumerate()
        .find(|(_, (want, got))| want.as_str() != **got)
    {
        return Err(ScoringError::FeatureShapeMismatch {
            scorer,
            expected: declared.len(),
            actual: vector.len(),
            detail: format!("position {position}: expected '{want}', found '{got}'"),
        });
    }

    Ok(())
}
