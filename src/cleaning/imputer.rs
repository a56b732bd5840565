//! Missing-value imputation against fitted statistics.
//!
//! Steps run in a fixed order: total charges are derived from the
//! already-imputed monthly charges.

use crate::stats::FittedStatistics;
use crate::types::{CustomerRecord, NormalizedRecord};
use tracing::warn;

/// Monthly charges used when the customer's segment has no fitted median
pub const DEFAULT_MONTHLY_CHARGES: f64 = 5000.0;
/// Data usage (GB) used when the customer's segment has no fitted median
pub const DEFAULT_DATA_USAGE_GB: f64 = 70.0;

/// Fill every missing numeric field of a normalized record
pub fn impute(record: &NormalizedRecord, stats: &FittedStatistics) -> CustomerRecord {
    let segment = record.service_type;

    let monthly_charges = record.monthly_charges.unwrap_or_else(|| {
        stats.median_charges(segment).unwrap_or_else(|| {
            warn!(
                customer_id = %record.customer_id,
                segment = %segment,
                "No median charges for segment, using default"
            );
            DEFAULT_MONTHLY_CHARGES
        })
    });

    let data_usage_gb = record.data_usage_gb.unwrap_or_else(|| {
        stats.median_usage(segment).unwrap_or_else(|| {
            warn!(
                customer_id = %record.customer_id,
                segment = %segment,
                "No median usage for segment, using default"
            );
            DEFAULT_DATA_USAGE_GB
        })
    });

    let total_charges = record
        .total_charges
        .unwrap_or_else(|| monthly_charges * record.tenure_months.unwrap_or(0).max(1) as f64);

    let tenure_months = record.tenure_months.unwrap_or(0).max(0);
    let support_calls = record.support_calls.unwrap_or(0).max(0);

    CustomerRecord {
        customer_id: record.customer_id.clone(),
        tenure_months,
        contract_type: record.contract_type,
        service_type: record.service_type,
        monthly_charges,
        total_charges,
        payment_method: record.payment_method,
        location_type: record.location_type,
        num_services: record.num_services.unwrap_or(0),
        data_usage_gb,
        support_calls,
        autopay_enabled: record.autopay_enabled,
        late_payment_count: record.late_payment_count.unwrap_or(0),
        referral_count: record.referral_count.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::normalizer::normalize;
    use crate::types::{RawCustomerRecord, ServiceType};
    use std::collections::HashMap;

    fn stats() -> FittedStatistics {
        FittedStatistics {
            service_type_median_charges: HashMap::from([
                ("Basic".to_string(), 2500.0),
                ("Premium".to_string(), 8200.0),
            ]),
            service_type_median_usage: HashMap::from([("Premium".to_string(), 140.0)]),
            monthly_charges_p75: 6200.0,
            data_usage_p25: 30.0,
        }
    }

    #[test]
    fn test_missing_charges_use_segment_median() {
        let raw = RawCustomerRecord {
            service_type: Some("Premium".to_string()),
            tenure_months: Some(3),
            ..RawCustomerRecord::new("C1")
        };

        let record = impute(&normalize(&raw), &stats());

        assert_eq!(record.service_type, ServiceType::Premium);
        assert_eq!(record.monthly_charges, 8200.0);
        assert_eq!(record.data_usage_gb, 140.0);
        assert_eq!(record.total_charges, 8200.0 * 3.0);
    }

    #[test]
    fn test_unseen_segment_uses_defaults() {
        // Standard has no fitted medians in this fixture
        let raw = RawCustomerRecord::new("C2");

        let record = impute(&normalize(&raw), &stats());

        assert_eq!(record.monthly_charges, DEFAULT_MONTHLY_CHARGES);
        assert_eq!(record.data_usage_gb, DEFAULT_DATA_USAGE_GB);
        // tenure missing counts as zero, clamped to one month for the total
        assert_eq!(record.total_charges, DEFAULT_MONTHLY_CHARGES);
        assert_eq!(record.tenure_months, 0);
        assert_eq!(record.num_services, 0);
        assert_eq!(record.referral_count, 0);
    }

    #[test]
    fn test_total_charges_use_imputed_monthly() {
        let raw = RawCustomerRecord {
            service_type: Some("Basic".to_string()),
            tenure_months: Some(10),
            ..RawCustomerRecord::new("C3")
        };

        let record = impute(&normalize(&raw), &stats());
        assert_eq!(record.total_charges, 25000.0);
    }

    #[test]
    fn test_negative_tenure_and_support_are_clipped() {
        let raw = RawCustomerRecord {
            tenure_months: Some(-4),
            support_calls: Some(-2),
            monthly_charges: Some(1000.0),
            late_payment_count: Some(-1),
            ..RawCustomerRecord::new("C4")
        };

        let record = impute(&normalize(&raw), &stats());

        assert_eq!(record.tenure_months, 0);
        assert_eq!(record.support_calls, 0);
        assert_eq!(record.total_charges, 1000.0);
        // only tenure and support calls are clipped
        assert_eq!(record.late_payment_count, -1);
    }

    #[test]
    fn test_imputation_is_a_fixed_point() {
        let raw = RawCustomerRecord {
            service_type: Some("Premium".to_string()),
            tenure_months: Some(-3),
            support_calls: Some(4),
            ..RawCustomerRecord::new("C5")
        };

        let first = impute(&normalize(&raw), &stats());
        let second = impute(&NormalizedRecord::from(&first), &stats());

        assert_eq!(first, second);
    }
}
