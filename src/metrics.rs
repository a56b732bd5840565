//! Throughput and outcome counters for batch scoring runs.

use crate::models::ScoringError;
use crate::types::RiskTier;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};
use tracing::info;

const PROBABILITY_BUCKETS: usize = 10;
const MAX_SAMPLES: usize = 10_000;

/// Metrics collector shared by scoring workers
pub struct PipelineMetrics {
    /// Records that produced a prediction
    pub assessed: AtomicU64,
    /// Records whose scoring failed
    pub failed: AtomicU64,
    by_tier: RwLock<BTreeMap<RiskTier, u64>>,
    /// Keyed by `ScoringError` variant
    failures_by_reason: RwLock<BTreeMap<&'static str, u64>>,
    /// Per-record latencies in microseconds
    latencies: RwLock<Vec<u64>>,
    /// Probability histogram in tenths; 1.0 lands in the last bucket
    probability_buckets: RwLock<[u64; PROBABILITY_BUCKETS]>,
    /// Throughput is measured from here
    start_time: Instant,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            assessed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            by_tier: RwLock::new(BTreeMap::new()),
            failures_by_reason: RwLock::new(BTreeMap::new()),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; PROBABILITY_BUCKETS]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful assessment
    pub fn record_assessment(&self, elapsed: Duration, probability: f64, tier: RiskTier) {
        self.assessed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(elapsed.as_micros() as u64);
            if latencies.len() > MAX_SAMPLES {
                latencies.drain(0..MAX_SAMPLES / 2);
            }
        }

        let bucket = ((probability * PROBABILITY_BUCKETS as f64) as usize).min(PROBABILITY_BUCKETS - 1);
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Ok(mut by_tier) = self.by_tier.write() {
            *by_tier.entry(tier).or_insert(0) += 1;
        }
    }

    pub fn record_failure(&self, error: &ScoringError) {
        self.failed.fetch_add(1, Ordering::Relaxed);

        let reason = match error {
            ScoringError::ModelUnavailable(_) => "model_unavailable",
            ScoringError::FeatureShapeMismatch { .. } => "feature_shape_mismatch",
            ScoringError::Inference { .. } => "inference",
            ScoringError::InvalidProbability { .. } => "invalid_probability",
        };
        if let Ok(mut failures) = self.failures_by_reason.write() {
            *failures.entry(reason).or_insert(0) += 1;
        }
    }

    pub fn latency_stats(&self) -> LatencyStats {
        let latencies = read(&self.latencies);
        if latencies.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted = latencies.clone();
        sorted.sort_unstable();
        let count = sorted.len();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sorted.iter().sum::<u64>() / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Assessments per second since the collector was created
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.assessed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn tier_count(&self, tier: RiskTier) -> u64 {
        read(&self.by_tier).get(&tier).copied().unwrap_or(0)
    }

    pub fn failure_counts(&self) -> BTreeMap<&'static str, u64> {
        read(&self.failures_by_reason).clone()
    }

    pub fn probability_distribution(&self) -> [u64; PROBABILITY_BUCKETS] {
        *read(&self.probability_buckets)
    }

    /// Log a summary of the run
    pub fn print_summary(&self) {
        let assessed = self.assessed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let latency = self.latency_stats();

        info!(
            assessed,
            failed,
            throughput = format!("{:.1} rec/s", self.throughput()),
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            p99_us = latency.p99_us,
            "Scoring run complete"
        );

        for tier in RiskTier::ALL {
            let count = self.tier_count(tier);
            let pct = if assessed > 0 {
                count as f64 / assessed as f64 * 100.0
            } else {
                0.0
            };
            info!(tier = %tier, count, "{:>6} {:>6} ({:>5.1}%)", tier, count, pct);
        }

        for (reason, count) in self.failure_counts() {
            info!(reason, count, "Scoring failures");
        }

        let distribution = self.probability_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            let pct = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            let bar = "█".repeat(((pct / 2.0) as usize).min(20));
            info!(
                "  {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct LatencyStats {
    /// Samples recorded
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScorerKind;

    #[test]
    fn test_assessment_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_assessment(Duration::from_micros(100), 0.62, RiskTier::High);
        metrics.record_assessment(Duration::from_micros(300), 0.40, RiskTier::Medium);
        metrics.record_assessment(Duration::from_micros(200), 1.0, RiskTier::High);

        assert_eq!(metrics.assessed.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.tier_count(RiskTier::High), 2);
        assert_eq!(metrics.tier_count(RiskTier::Low), 0);

        let distribution = metrics.probability_distribution();
        assert_eq!(distribution[6], 1);
        assert_eq!(distribution[4], 1);
        assert_eq!(distribution[9], 1);

        let latency = metrics.latency_stats();
        assert_eq!(latency.count, 3);
        assert_eq!(latency.mean_us, 200);
        assert_eq!(latency.p50_us, 200);
        assert_eq!(latency.max_us, 300);
    }

    #[test]
    fn test_failure_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_failure(&ScoringError::ModelUnavailable(ScorerKind::Linear));
        metrics.record_failure(&ScoringError::ModelUnavailable(ScorerKind::Tree));

        assert_eq!(metrics.failed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.failure_counts().get("model_unavailable"), Some(&2));
    }

    #[test]
    fn test_empty_latency_stats() {
        assert_eq!(PipelineMetrics::new().latency_stats(), LatencyStats::default());
    }
}
