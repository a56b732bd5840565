//! Probability to risk tier mapping

use crate::types::RiskTier;
use serde::{Deserialize, Serialize};

/// Probabilities strictly above this are HIGH risk
pub const HIGH_RISK_THRESHOLD: f64 = 0.50;
/// Probabilities strictly above this (and not HIGH) are MEDIUM risk
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.35;

/// Tier boundaries; both comparisons are strict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            high: HIGH_RISK_THRESHOLD,
            medium: MEDIUM_RISK_THRESHOLD,
        }
    }
}

impl RiskThresholds {
    pub fn classify(&self, probability: f64) -> RiskTier {
        if probability > self.high {
            RiskTier::High
        } else if probability > self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }
}

impl RiskTier {
    /// Classify using the default thresholds
    pub fn from_probability(probability: f64) -> Self {
        RiskThresholds::default().classify(probability)
    }
}
