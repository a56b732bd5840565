//! Billing consistency checks.

use crate::types::{CleanedRecord, CustomerRecord};

/// Total charges below a single month's charges cannot be a real billing history
pub fn charges_anomaly(record: &CustomerRecord) -> bool {
    record.total_charges < record.monthly_charges
}

/// Attach the anomaly flag to a cleaned record
pub fn flag(record: CustomerRecord) -> CleanedRecord {
    let charges_anomaly_flag = charges_anomaly(&record);
    CleanedRecord {
        record,
        charges_anomaly_flag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Autopay, ContractType, LocationType, PaymentMethod, ServiceType};

    fn record(monthly: f64, total: f64) -> CustomerRecord {
        CustomerRecord {
            customer_id: "C1".to_string(),
            tenure_months: 2,
            contract_type: ContractType::MonthToMonth,
            service_type: ServiceType::Standard,
            monthly_charges: monthly,
            total_charges: total,
            payment_method: PaymentMethod::MPesa,
            location_type: LocationType::Urban,
            num_services: 1,
            data_usage_gb: 50.0,
            support_calls: 0,
            autopay_enabled: Autopay::No,
            late_payment_count: 0,
            referral_count: 0,
        }
    }

    #[test]
    fn test_total_below_monthly_is_flagged() {
        assert!(flag(record(150.0, 100.0)).charges_anomaly_flag);
    }

    #[test]
    fn test_consistent_billing_is_not_flagged() {
        assert!(!flag(record(150.0, 300.0)).charges_anomaly_flag);
        assert!(!flag(record(150.0, 150.0)).charges_anomaly_flag);
    }
}
