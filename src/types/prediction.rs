//! Churn assessment output structures

use crate::models::ScorerKind;
use crate::types::ContractType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal churn risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::High, RiskTier::Medium, RiskTier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskTier::Low),
            "MEDIUM" => Ok(RiskTier::Medium),
            "HIGH" => Ok(RiskTier::High),
            other => Err(format!("unknown risk tier '{other}'")),
        }
    }
}

/// Weight of a churn driver; `Positive` marks factors that lower churn risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DriverPriority {
    High,
    Medium,
    Low,
    Positive,
}

/// One explanation line for a customer's churn risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverFact {
    pub label: &'static str,
    pub priority: DriverPriority,
    pub impact: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionPriority {
    Urgent,
    High,
    Medium,
}

/// Retention action suggested for a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendedAction {
    pub priority: ActionPriority,
    pub action: &'static str,
    pub impact: &'static str,
}

/// Complete churn assessment for one customer record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub customer_id: String,
    /// Canonical contract after cleaning
    pub contract_type: ContractType,
    /// Scorer family that produced the probability
    pub scorer: ScorerKind,
    /// Churn probability (0.0 - 1.0)
    pub churn_probability: f64,
    pub risk_tier: RiskTier,
    pub drivers: Vec<DriverFact>,
    pub recommendations: Vec<RecommendedAction>,
}
