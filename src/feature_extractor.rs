//! Feature derivation for churn model inference.
//!
//! Computes the engineered features from a cleaned record and the fitted
//! statistics, then projects them into the ordered layout each scorer
//! family was trained on.

use crate::stats::FittedStatistics;
use crate::types::{CleanedRecord, ContractType, LocationType, PaymentMethod, ServiceType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear (scaled logistic regression) input layout.
const LINEAR_FEATURES: [&str; 32] = [
    "tenure_log",
    "is_new_customer",
    "is_established",
    "service_encoded",
    "avg_monthly_revenue",
    "is_high_value",
    "price_sensitivity",
    "financial_stress",
    "support_intensity",
    "is_heavy_support",
    "usage_efficiency",
    "usage_tier_ratio",
    "autopay_binary",
    "referral_flag",
    "loyalty_score",
    "contract_risk",
    "contract_tenure_mismatch",
    "payment_friction",
    "is_mpesa",
    "high_value_mtm",
    "new_no_autopay",
    "support_late_combo",
    "premium_low_usage",
    "bundled_loyal",
    "pay_bank",
    "pay_credit",
    "pay_debit",
    "pay_cash",
    "loc_suburban",
    "loc_rural",
    "num_services",
    "charges_anomaly_flag",
];

/// Tree-ensemble input layout (unscaled).
const TREE_FEATURES: [&str; 35] = [
    "tenure_bin",
    "is_new_customer",
    "is_established",
    "tenure_log",
    "avg_monthly_revenue",
    "is_high_value",
    "price_sensitivity",
    "monthly_charges_log",
    "support_intensity",
    "is_heavy_support",
    "late_payment_flag",
    "financial_stress",
    "usage_efficiency",
    "usage_tier_ratio",
    "autopay_binary",
    "referral_flag",
    "loyalty_score",
    "contract_risk",
    "contract_tenure_mismatch",
    "payment_friction",
    "is_mpesa",
    "high_value_mtm",
    "new_no_autopay",
    "support_late_combo",
    "premium_low_usage",
    "bundled_loyal",
    "service_encoded",
    "pay_bank",
    "pay_credit",
    "pay_debit",
    "pay_cash",
    "loc_suburban",
    "loc_rural",
    "num_services",
    "charges_anomaly_flag",
];

/// Named, versioned feature layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureSet {
    Linear,
    Tree,
}

impl FeatureSet {
    /// Layout version; bump when a feature list changes
    pub const VERSION: u32 = 1;

    /// Feature names in scorer input order
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            FeatureSet::Linear => &LINEAR_FEATURES,
            FeatureSet::Tree => &TREE_FEATURES,
        }
    }

    pub fn len(&self) -> usize {
        self.names().len()
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureSet::Linear => f.write_str("linear"),
            FeatureSet::Tree => f.write_str("tree"),
        }
    }
}

/// Ordered feature values tagged with the layout they follow
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub set: FeatureSet,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn names(&self) -> &'static [&'static str] {
        self.set.names()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature, if it is part of this layout
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names()
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Every engineered feature for one customer. Flags are 0.0 / 1.0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFeatures {
    // Tenure
    pub tenure_bin: f64,
    pub is_new_customer: f64,
    pub is_established: f64,
    pub tenure_log: f64,
    // Financial
    pub avg_monthly_revenue: f64,
    pub is_high_value: f64,
    pub price_sensitivity: f64,
    pub monthly_charges_log: f64,
    // Behavioral
    pub support_intensity: f64,
    pub is_heavy_support: f64,
    pub late_payment_flag: f64,
    pub financial_stress: f64,
    pub usage_efficiency: f64,
    pub usage_tier_ratio: f64,
    // Engagement
    pub autopay_binary: f64,
    pub referral_flag: f64,
    pub loyalty_score: f64,
    // Contract and payment
    pub contract_risk: f64,
    pub contract_tenure_mismatch: f64,
    pub payment_friction: f64,
    pub is_mpesa: f64,
    // Interactions
    pub high_value_mtm: f64,
    pub new_no_autopay: f64,
    pub support_late_combo: f64,
    pub premium_low_usage: f64,
    pub bundled_loyal: f64,
    // Encodings
    pub service_encoded: f64,
    pub pay_bank: f64,
    pub pay_credit: f64,
    pub pay_debit: f64,
    pub pay_cash: f64,
    pub loc_suburban: f64,
    pub loc_rural: f64,
    pub num_services: f64,
    pub charges_anomaly_flag: f64,
}

impl DerivedFeatures {
    /// Look up a feature by its training-time name
    pub fn get(&self, name: &str) -> Option<f64> {
        let value = match name {
            "tenure_bin" => self.tenure_bin,
            "is_new_customer" => self.is_new_customer,
            "is_established" => self.is_established,
            "tenure_log" => self.tenure_log,
            "avg_monthly_revenue" => self.avg_monthly_revenue,
            "is_high_value" => self.is_high_value,
            "price_sensitivity" => self.price_sensitivity,
            "monthly_charges_log" => self.monthly_charges_log,
            "support_intensity" => self.support_intensity,
            "is_heavy_support" => self.is_heavy_support,
            "late_payment_flag" => self.late_payment_flag,
            "financial_stress" => self.financial_stress,
            "usage_efficiency" => self.usage_efficiency,
            "usage_tier_ratio" => self.usage_tier_ratio,
            "autopay_binary" => self.autopay_binary,
            "referral_flag" => self.referral_flag,
            "loyalty_score" => self.loyalty_score,
            "contract_risk" => self.contract_risk,
            "contract_tenure_mismatch" => self.contract_tenure_mismatch,
            "payment_friction" => self.payment_friction,
            "is_mpesa" => self.is_mpesa,
            "high_value_mtm" => self.high_value_mtm,
            "new_no_autopay" => self.new_no_autopay,
            "support_late_combo" => self.support_late_combo,
            "premium_low_usage" => self.premium_low_usage,
            "bundled_loyal" => self.bundled_loyal,
            "service_encoded" => self.service_encoded,
            "pay_bank" => self.pay_bank,
            "pay_credit" => self.pay_credit,
            "pay_debit" => self.pay_debit,
            "pay_cash" => self.pay_cash,
            "loc_suburban" => self.loc_suburban,
            "loc_rural" => self.loc_rural,
            "num_services" => self.num_services,
            "charges_anomaly_flag" => self.charges_anomaly_flag,
            _ => return None,
        };
        Some(value)
    }

    /// Project into the ordered layout of a scorer family
    pub fn project(&self, set: FeatureSet) -> FeatureVector {
        // Every layout name is a DerivedFeatures field; covered by test_layouts_resolve
        let values = set
            .names()
            .iter()
            .map(|name| self.get(name).unwrap_or(f64::NAN))
            .collect();
        FeatureVector { set, values }
    }
}

fn flag(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// (−∞,5] → 0, (5,12] → 1, (12,24] → 2, (24,∞) → 3
pub fn tenure_bin(tenure_months: i64) -> f64 {
    match tenure_months {
        i64::MIN..=5 => 0.0,
        6..=12 => 1.0,
        13..=24 => 2.0,
        _ => 3.0,
    }
}

/// (−∞,0] → 0, (0,2] → 1, (2,∞) → 2
pub fn financial_stress(late_payment_count: i64) -> f64 {
    match late_payment_count {
        i64::MIN..=0 => 0.0,
        1..=2 => 1.0,
        _ => 2.0,
    }
}

/// Feature deriver bound to the fitted statistics of one training run
pub struct FeatureExtractor<'a> {
    stats: &'a FittedStatistics,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(stats: &'a FittedStatistics) -> Self {
        Self { stats }
    }

    /// Derive every engineered feature for a cleaned record
    pub fn derive(&self, cleaned: &CleanedRecord) -> DerivedFeatures {
        let r = &cleaned.record;
        let tenure = r.tenure_months;
        let tenure_floor = tenure.max(1) as f64;
        let is_mtm = r.contract_type == ContractType::MonthToMonth;

        let is_new_customer = tenure < 6;
        let is_established = tenure > 24;
        let is_high_value = r.monthly_charges > self.stats.monthly_charges_p75;
        let autopay = r.autopay_enabled.is_enabled();

        let price_divisor = self
            .stats
            .median_charges(r.service_type)
            .unwrap_or(r.monthly_charges);
        let usage_divisor = self
            .stats
            .median_usage(r.service_type)
            .unwrap_or_else(|| r.data_usage_gb.max(1.0));

        DerivedFeatures {
            tenure_bin: tenure_bin(tenure),
            is_new_customer: flag(is_new_customer),
            is_established: flag(is_established),
            tenure_log: (tenure as f64).ln_1p(),

            avg_monthly_revenue: r.total_charges / tenure_floor,
            is_high_value: flag(is_high_value),
            price_sensitivity: r.monthly_charges / price_divisor,
            monthly_charges_log: r.monthly_charges.max(1.0).ln(),

            support_intensity: r.support_calls as f64 / tenure_floor,
            is_heavy_support: flag(r.support_calls > 5),
            late_payment_flag: flag(r.late_payment_count > 0),
            financial_stress: financial_stress(r.late_payment_count),
            usage_efficiency: r.data_usage_gb / (r.num_services + 1) as f64,
            usage_tier_ratio: r.data_usage_gb / usage_divisor,

            autopay_binary: flag(autopay),
            referral_flag: flag(r.referral_count > 0),
            loyalty_score: r.referral_count as f64 + flag(is_established) + flag(autopay),

            contract_risk: match r.contract_type {
                ContractType::MonthToMonth => 2.0,
                ContractType::OneYear => 1.0,
                ContractType::TwoYear => 0.0,
            },
            contract_tenure_mismatch: flag(is_mtm && tenure > 12),
            payment_friction: flag(r.payment_method == PaymentMethod::Cash && !autopay),
            is_mpesa: flag(r.payment_method == PaymentMethod::MPesa),

            high_value_mtm: flag(is_high_value && is_mtm),
            new_no_autopay: flag(is_new_customer && !autopay),
            support_late_combo: flag(r.support_calls > 3 && r.late_payment_count > 1),
            premium_low_usage: flag(
                r.service_type == ServiceType::Premium
                    && r.data_usage_gb < self.stats.data_usage_p25,
            ),
            bundled_loyal: flag(r.num_services >= 3 && tenure > 12),

            service_encoded: match r.service_type {
                ServiceType::Basic => 0.0,
                ServiceType::Standard => 1.0,
                ServiceType::Premium => 2.0,
            },
            pay_bank: flag(r.payment_method == PaymentMethod::BankTransfer),
            pay_credit: flag(r.payment_method == PaymentMethod::CreditCard),
            pay_debit: flag(r.payment_method == PaymentMethod::DebitCard),
            pay_cash: flag(r.payment_method == PaymentMethod::Cash),
            loc_suburban: flag(r.location_type == LocationType::Suburban),
            loc_rural: flag(r.location_type == LocationType::Rural),
            num_services: r.num_services as f64,
            charges_anomaly_flag: flag(cleaned.charges_anomaly_flag),
        }
    }

    /// Derive features and project them for one scorer family
    pub fn extract(&self, cleaned: &CleanedRecord, set: FeatureSet) -> FeatureVector {
        self.derive(cleaned).project(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Autopay, CustomerRecord};
    use std::collections::HashMap;

    fn stats() -> FittedStatistics {
        FittedStatistics {
            service_type_median_charges: HashMap::from([
                ("Basic".to_string(), 2500.0),
                ("Standard".to_string(), 4000.0),
            ]),
            service_type_median_usage: HashMap::from([("Standard".to_string(), 50.0)]),
            monthly_charges_p75: 6200.0,
            data_usage_p25: 30.0,
        }
    }

    fn cleaned(tenure: i64) -> CleanedRecord {
        CleanedRecord {
            record: CustomerRecord {
                customer_id: "C1".to_string(),
                tenure_months: tenure,
                contract_type: ContractType::MonthToMonth,
                service_type: ServiceType::Standard,
                monthly_charges: 3000.0,
                total_charges: 500.0,
                payment_method: PaymentMethod::Cash,
                location_type: LocationType::Rural,
                num_services: 3,
                data_usage_gb: 100.0,
                support_calls: 4,
                autopay_enabled: Autopay::No,
                late_payment_count: 2,
                referral_count: 1,
            },
            charges_anomaly_flag: true,
        }
    }

    #[test]
    fn test_layout_sizes() {
        assert_eq!(FeatureSet::Linear.len(), 32);
        assert_eq!(FeatureSet::Tree.len(), 35);
    }

    #[test]
    fn test_layouts_resolve() {
        let stats = stats();
        let features = FeatureExtractor::new(&stats).derive(&cleaned(3));

        for set in [FeatureSet::Linear, FeatureSet::Tree] {
            for name in set.names() {
                assert!(features.get(name).is_some(), "{set} feature {name} unresolved");
            }
        }
    }

    #[test]
    fn test_tree_only_features() {
        let linear = FeatureSet::Linear.names();
        for name in ["tenure_bin", "monthly_charges_log", "late_payment_flag"] {
            assert!(FeatureSet::Tree.names().contains(&name));
            assert!(!linear.contains(&name));
        }
    }

    #[test]
    fn test_tenure_log() {
        let stats = stats();
        let extractor = FeatureExtractor::new(&stats);

        assert_eq!(extractor.derive(&cleaned(0)).tenure_log, 0.0);
        let log11 = extractor.derive(&cleaned(11)).tenure_log;
        assert!((log11 - 12f64.ln()).abs() < 1e-6);
        assert!((log11 - 2.4849).abs() < 1e-4);
    }

    #[test]
    fn test_avg_monthly_revenue_with_zero_tenure() {
        let stats = stats();
        let features = FeatureExtractor::new(&stats).derive(&cleaned(0));

        assert_eq!(features.avg_monthly_revenue, 500.0);
        assert_eq!(features.support_intensity, 4.0);
    }

    #[test]
    fn test_bins() {
        assert_eq!(tenure_bin(0), 0.0);
        assert_eq!(tenure_bin(5), 0.0);
        assert_eq!(tenure_bin(6), 1.0);
        assert_eq!(tenure_bin(12), 1.0);
        assert_eq!(tenure_bin(24), 2.0);
        assert_eq!(tenure_bin(25), 3.0);

        assert_eq!(financial_stress(0), 0.0);
        assert_eq!(financial_stress(2), 1.0);
        assert_eq!(financial_stress(3), 2.0);
    }

    #[test]
    fn test_derived_values() {
        let stats = stats();
        let f = FeatureExtractor::new(&stats).derive(&cleaned(14));

        assert_eq!(f.is_new_customer, 0.0);
        assert_eq!(f.contract_risk, 2.0);
        assert_eq!(f.contract_tenure_mismatch, 1.0);
        assert_eq!(f.payment_friction, 1.0);
        assert_eq!(f.pay_cash, 1.0);
        assert_eq!(f.is_mpesa, 0.0);
        assert_eq!(f.loc_rural, 1.0);
        assert_eq!(f.loc_suburban, 0.0);
        assert_eq!(f.price_sensitivity, 0.75);
        assert_eq!(f.usage_tier_ratio, 2.0);
        assert_eq!(f.usage_efficiency, 25.0);
        assert_eq!(f.loyalty_score, 1.0);
        assert_eq!(f.support_late_combo, 1.0);
        assert_eq!(f.bundled_loyal, 1.0);
        assert_eq!(f.financial_stress, 1.0);
        assert_eq!(f.charges_anomaly_flag, 1.0);
        assert!((f.monthly_charges_log - 3000f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_unseen_segment_fallbacks() {
        let stats = stats();
        let mut record = cleaned(10);
        record.record.service_type = ServiceType::Premium;
        record.record.data_usage_gb = 0.5;

        let f = FeatureExtractor::new(&stats).derive(&record);

        // divisor falls back to the customer's own charges
        assert_eq!(f.price_sensitivity, 1.0);
        // divisor falls back to max(usage, 1)
        assert_eq!(f.usage_tier_ratio, 0.5);
        assert_eq!(f.premium_low_usage, 1.0);
        assert_eq!(f.service_encoded, 2.0);
    }

    #[test]
    fn test_zero_charges_in_unseen_segment_give_nan_price_sensitivity() {
        let stats = stats();
        let mut record = cleaned(10);
        record.record.service_type = ServiceType::Premium;
        record.record.monthly_charges = 0.0;

        let f = FeatureExtractor::new(&stats).derive(&record);

        // 0 / 0 once the divisor falls back to the customer's own charges
        assert!(f.price_sensitivity.is_nan());
        let vector = f.project(FeatureSet::Linear);
        assert!(vector.get("price_sensitivity").is_some_and(f64::is_nan));

        // a fitted segment median keeps the ratio finite
        record.record.service_type = ServiceType::Basic;
        let f = FeatureExtractor::new(&stats).derive(&record);
        assert_eq!(f.price_sensitivity, 0.0);
    }

    #[test]
    fn test_projection_order() {
        let stats = stats();
        let vector = FeatureExtractor::new(&stats).extract(&cleaned(3), FeatureSet::Tree);

        assert_eq!(vector.len(), 35);
        assert_eq!(vector.values[0], 0.0); // tenure_bin
        assert_eq!(vector.get("num_services"), Some(3.0));
        assert_eq!(vector.values[34], 1.0); // charges_anomaly_flag
    }
}
