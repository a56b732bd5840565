//! Churn driver explanations.
//!
//! Rules are evaluated in table order and the first [`MAX_DRIVERS`] matches
//! are kept. With all eight rules satisfied the two positive factors at the
//! end of the table are dropped.

use crate::explain::{HIGH_SUPPORT_CALLS, HIGH_VALUE_MONTHLY_CHARGES, NEW_CUSTOMER_MONTHS};
use crate::types::{Autopay, ContractType, CustomerRecord, DriverFact, DriverPriority};

pub const MAX_DRIVERS: usize = 6;

/// Customers past this tenure count as established
pub const ESTABLISHED_MONTHS: i64 = 24;

struct DriverRule {
    applies: fn(&CustomerRecord) -> bool,
    fact: DriverFact,
}

const DRIVER_RULES: [DriverRule; 8] = [
    DriverRule {
        applies: |r| r.contract_type == ContractType::MonthToMonth,
        fact: DriverFact {
            label: "Month-to-Month Contract",
            priority: DriverPriority::High,
            impact: "+75% churn odds",
        },
    },
    DriverRule {
        applies: |r| r.tenure_months < NEW_CUSTOMER_MONTHS,
        fact: DriverFact {
            label: "New Customer (<6 months)",
            priority: DriverPriority::High,
            impact: "+25% churn odds",
        },
    },
    DriverRule {
        applies: |r| r.monthly_charges > HIGH_VALUE_MONTHLY_CHARGES,
        fact: DriverFact {
            label: "High-Value Customer",
            priority: DriverPriority::Medium,
            impact: "+27% churn odds",
        },
    },
    DriverRule {
        applies: |r| r.support_calls > HIGH_SUPPORT_CALLS,
        fact: DriverFact {
            label: "High Support Usage",
            priority: DriverPriority::Medium,
            impact: "+14% churn odds",
        },
    },
    DriverRule {
        applies: |r| r.late_payment_count > 0,
        fact: DriverFact {
            label: "Late Payments",
            priority: DriverPriority::Medium,
            impact: "+16% churn odds",
        },
    },
    DriverRule {
        applies: |r| r.autopay_enabled == Autopay::No,
        fact: DriverFact {
            label: "No Autopay",
            priority: DriverPriority::Low,
            impact: "+8% churn odds",
        },
    },
    DriverRule {
        applies: |r| r.tenure_months > ESTABLISHED_MONTHS,
        fact: DriverFact {
            label: "Established Customer",
            priority: DriverPriority::Positive,
            impact: "-8% churn odds",
        },
    },
    DriverRule {
        applies: |r| r.referral_count > 0,
        fact: DriverFact {
            label: "Has Made Referrals",
            priority: DriverPriority::Positive,
            impact: "-15% churn odds",
        },
    },
];

/// Top churn drivers for a cleaned record.
///
/// The probability is accepted so callers hand every explainer the same
/// inputs; no current rule reads it.
pub fn explain(record: &CustomerRecord, _probability: f64) -> Vec<DriverFact> {
    DRIVER_RULES
        .iter()
        .filter(|rule| (rule.applies)(record))
        .map(|rule| rule.fact.clone())
        .take(MAX_DRIVERS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::tests::baseline_record;

    fn labels(facts: &[DriverFact]) -> Vec<&'static str> {
        facts.iter().map(|f| f.label).collect()
    }

    #[test]
    fn test_no_matching_rules_is_empty() {
        let record = baseline_record();
        assert!(explain(&record, 0.1).is_empty());
    }

    #[test]
    fn test_new_month_to_month_customer() {
        let mut record = baseline_record();
        record.contract_type = ContractType::MonthToMonth;
        record.tenure_months = 3;

        assert_eq!(
            labels(&explain(&record, 0.6)),
            vec!["Month-to-Month Contract", "New Customer (<6 months)"]
        );
    }

    #[test]
    fn test_positive_factors() {
        let mut record = baseline_record();
        record.tenure_months = 36;
        record.referral_count = 2;

        let facts = explain(&record, 0.1);
        assert_eq!(labels(&facts), vec!["Established Customer", "Has Made Referrals"]);
        assert!(facts.iter().all(|f| f.priority == DriverPriority::Positive));
    }

    #[test]
    fn test_truncation_drops_trailing_positive_facts() {
        let mut record = baseline_record();
        record.contract_type = ContractType::MonthToMonth;
        record.monthly_charges = 7000.0;
        record.support_calls = 5;
        record.late_payment_count = 1;
        record.autopay_enabled = Autopay::No;
        record.tenure_months = 30;
        record.referral_count = 1;

        let facts = explain(&record, 0.8);

        assert_eq!(facts.len(), MAX_DRIVERS);
        assert_eq!(facts[0].label, "Month-to-Month Contract");
        assert_eq!(facts[4].label, "No Autopay");
        assert_eq!(facts[5].label, "Established Customer");
        assert!(!labels(&facts).contains(&"Has Made Referrals"));
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut record = baseline_record();
        record.monthly_charges = HIGH_VALUE_MONTHLY_CHARGES;
        record.support_calls = HIGH_SUPPORT_CALLS;
        record.tenure_months = ESTABLISHED_MONTHS;

        assert!(explain(&record, 0.2).is_empty());
    }
}
