//! Data cleaning: categorical normalization, imputation and anomaly flags

pub mod anomaly;
pub mod imputer;
pub mod normalizer;

use crate::stats::FittedStatistics;
use crate::types::{CleanedRecord, RawCustomerRecord};

/// Run normalization, imputation and anomaly detection in order
pub fn clean(raw: &RawCustomerRecord, stats: &FittedStatistics) -> CleanedRecord {
    let normalized = normalizer::normalize(raw);
    let imputed = imputer::impute(&normalized, stats);
    anomaly::flag(imputed)
}
