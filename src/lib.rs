//! Churn Risk Pipeline Library
//!
//! Scores telecom customers for churn risk: raw records are normalized,
//! imputed and checked for billing anomalies, turned into engineered
//! features, scored by a logistic regression or a gradient-boosted tree
//! ensemble, and explained with rule-based drivers and retention actions.

pub mod cleaning;
pub mod config;
pub mod explain;
pub mod feature_extractor;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use explain::RiskThresholds;
pub use feature_extractor::{DerivedFeatures, FeatureExtractor, FeatureSet, FeatureVector};
pub use models::{ScorerKind, ScoringDispatcher, ScoringError};
pub use pipeline::{BatchSummary, ChurnPipeline};
pub use stats::FittedStatistics;
pub use types::{CleanedRecord, CustomerRecord, PredictionResult, RawCustomerRecord, RiskTier};
