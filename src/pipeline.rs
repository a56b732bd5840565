//! End-to-end churn assessment: clean, derive, score, classify, explain.

use crate::cleaning;
use crate::explain::{drivers, recommendations, RiskThresholds};
use crate::feature_extractor::{DerivedFeatures, FeatureExtractor};
use crate::models::{ScorerKind, ScoringDispatcher, ScoringError};
use crate::stats::FittedStatistics;
use crate::types::{CleanedRecord, ContractType, PredictionResult, RawCustomerRecord, RiskTier};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Assessment pipeline over shared, read-only statistics and scorers.
///
/// Every call is a pure function of its record, so a pipeline can be shared
/// across threads without locking.
#[derive(Clone)]
pub struct ChurnPipeline {
    stats: Arc<FittedStatistics>,
    dispatcher: ScoringDispatcher,
    thresholds: RiskThresholds,
}

impl ChurnPipeline {
    pub fn new(stats: Arc<FittedStatistics>, dispatcher: ScoringDispatcher) -> Self {
        Self {
            stats,
            dispatcher,
            thresholds: RiskThresholds::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: RiskThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Normalize, impute and flag a raw record
    pub fn clean(&self, raw: &RawCustomerRecord) -> CleanedRecord {
        cleaning::clean(raw, &self.stats)
    }

    pub fn derive(&self, cleaned: &CleanedRecord) -> DerivedFeatures {
        FeatureExtractor::new(&self.stats).derive(cleaned)
    }

    /// Assess a single raw record
    pub fn assess(
        &self,
        raw: &RawCustomerRecord,
        scorer: ScorerKind,
    ) -> Result<PredictionResult, ScoringError> {
        let cleaned = self.clean(raw);
        self.assess_cleaned(&cleaned, scorer)
    }

    /// Assess a record that has already been cleaned
    pub fn assess_cleaned(
        &self,
        cleaned: &CleanedRecord,
        scorer: ScorerKind,
    ) -> Result<PredictionResult, ScoringError> {
        let features = self.derive(cleaned);
        let churn_probability = self.dispatcher.score(&features, scorer)?;
        let risk_tier = self.thresholds.classify(churn_probability);

        let record = &cleaned.record;
        let drivers = drivers::explain(record, churn_probability);
        let recommendations =
            recommendations::recommend(record, churn_probability, &self.thresholds);

        debug!(
            customer_id = %record.customer_id,
            scorer = %scorer,
            churn_probability,
            risk_tier = %risk_tier,
            drivers = drivers.len(),
            recommendations = recommendations.len(),
            "Customer assessed"
        );

        Ok(PredictionResult {
            customer_id: record.customer_id.clone(),
            contract_type: record.contract_type,
            scorer,
            churn_probability,
            risk_tier,
            drivers,
            recommendations,
        })
    }

    /// Assess records in parallel; results keep input order and match
    /// per-record `assess` exactly
    pub fn assess_batch(
        &self,
        records: &[RawCustomerRecord],
        scorer: ScorerKind,
    ) -> Vec<Result<PredictionResult, ScoringError>> {
        records
            .par_iter()
            .map(|raw| self.assess(raw, scorer))
            .collect()
    }
}

/// Aggregate view over a scored batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub scored: usize,
    pub failed: usize,
    pub tier_counts: BTreeMap<RiskTier, usize>,
    pub mean_probability: Option<f64>,
    pub mean_probability_by_contract: BTreeMap<ContractType, f64>,
}

impl BatchSummary {
    /// Summarize batch results; contract means use each prediction's
    /// cleaned contract
    pub fn from_results(results: &[Result<PredictionResult, ScoringError>]) -> Self {
        let mut tier_counts: BTreeMap<RiskTier, usize> =
            RiskTier::ALL.iter().map(|tier| (*tier, 0)).collect();
        let mut by_contract: BTreeMap<ContractType, (f64, usize)> = BTreeMap::new();
        let mut sum = 0.0;
        let mut scored = 0;

        for prediction in results.iter().filter_map(|r| r.as_ref().ok()) {

            scored += 1;
            sum += prediction.churn_probability;
            *tier_counts.entry(prediction.risk_tier).or_insert(0) += 1;

            let entry = by_contract
                .entry(prediction.contract_type)
                .or_insert((0.0, 0));
            entry.0 += prediction.churn_probability;
            entry.1 += 1;
        }

        Self {
            generated_at: Utc::now(),
            total: results.len(),
            scored,
            failed: results.len() - scored,
            tier_counts,
            mean_probability: (scored > 0).then(|| sum / scored as f64),
            mean_probability_by_contract: by_contract
                .into_iter()
                .map(|(contract, (total, count))| (contract, total / count as f64))
                .collect(),
        }
    }

    pub fn count(&self, tier: RiskTier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }
}

/// Results in the requested tiers, highest churn probability first
pub fn rank_by_probability<'a>(
    results: &'a [PredictionResult],
    tiers: &[RiskTier],
) -> Vec<&'a PredictionResult> {
    let mut ranked: Vec<&PredictionResult> = results
        .iter()
        .filter(|r| tiers.is_empty() || tiers.contains(&r.risk_tier))
        .collect();
    ranked.sort_by(|a, b| b.churn_probability.total_cmp(&a.churn_probability));
    ranked
}
