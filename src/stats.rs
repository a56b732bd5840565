//! Fitted reference statistics produced by the offline training run.
//!
//! Loaded once at startup and shared read-only (behind `Arc`) by every
//! cleaning and feature-derivation call.

use crate::types::ServiceType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Segment medians and global percentiles computed on the training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedStatistics {
    /// Median monthly charges keyed by service type
    #[serde(default)]
    pub service_type_median_charges: HashMap<String, f64>,
    /// Median data usage (GB) keyed by service type
    #[serde(default)]
    pub service_type_median_usage: HashMap<String, f64>,
    /// 75th percentile of monthly charges
    pub monthly_charges_p75: f64,
    /// 25th percentile of data usage (GB)
    pub data_usage_p25: f64,
}

impl FittedStatistics {
    /// Load statistics from a JSON artifact
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fitted statistics from {}", path.display()))?;
        let stats = Self::from_json(&raw)
            .with_context(|| format!("Invalid fitted statistics in {}", path.display()))?;

        info!(
            path = %path.display(),
            segments = stats.service_type_median_charges.len(),
            monthly_charges_p75 = stats.monthly_charges_p75,
            data_usage_p25 = stats.data_usage_p25,
            "Fitted statistics loaded"
        );

        Ok(stats)
    }

    /// Parse statistics from a JSON string
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to deserialize fitted statistics")
    }

    /// Median monthly charges for a segment, if the segment was seen in training
    pub fn median_charges(&self, service: ServiceType) -> Option<f64> {
        self.service_type_median_charges
            .get(service.as_str())
            .copied()
    }

    /// Median data usage for a segment, if the segment was seen in training
    pub fn median_usage(&self, service: ServiceType) -> Option<f64> {
        self.service_type_median_usage.get(service.as_str()).copied()
    }
}
