//! Retention action recommendations

use crate::explain::risk::RiskThresholds;
use crate::explain::{HIGH_SUPPORT_CALLS, HIGH_VALUE_MONTHLY_CHARGES, NEW_CUSTOMER_MONTHS};
use crate::types::{ActionPriority, Autopay, ContractType, CustomerRecord, RecommendedAction};

/// Late payments above this warrant a payment plan
pub const PAYMENT_PLAN_LATE_PAYMENTS: i64 = 2;

struct RuleInput<'a> {
    record: &'a CustomerRecord,
    probability: f64,
    thresholds: &'a RiskThresholds,
}

struct RecommendationRule {
    applies: fn(&RuleInput<'_>) -> bool,
    action: RecommendedAction,
}

const RECOMMENDATION_RULES: [RecommendationRule; 7] = [
    RecommendationRule {
        applies: |i| i.probability > i.thresholds.high,
        action: RecommendedAction {
            priority: ActionPriority::Urgent,
            action: "Schedule immediate retention call",
            impact: "Direct intervention for high-risk customer",
        },
    },
    RecommendationRule {
        applies: |i| i.record.contract_type == ContractType::MonthToMonth,
        action: RecommendedAction {
            priority: ActionPriority::High,
            action: "Offer 12-month contract with 15% discount",
            impact: "Reduces churn odds by ~75%",
        },
    },
    RecommendationRule {
        applies: |i| i.record.tenure_months < NEW_CUSTOMER_MONTHS,
        action: RecommendedAction {
            priority: ActionPriority::High,
            action: "Assign dedicated onboarding specialist",
            impact: "New customers have +25% churn risk",
        },
    },
    RecommendationRule {
        applies: |i| i.record.autopay_enabled == Autopay::No,
        action: RecommendedAction {
            priority: ActionPriority::Medium,
            action: "Enable autopay with KES 500 credit incentive",
            impact: "Reduces churn odds by ~8%",
        },
    },
    RecommendationRule {
        applies: |i| i.record.support_calls > HIGH_SUPPORT_CALLS,
        action: RecommendedAction {
            priority: ActionPriority::High,
            action: "Escalate to customer success manager",
            impact: "Heavy support users have +15% churn risk",
        },
    },
    RecommendationRule {
        applies: |i| i.record.monthly_charges > HIGH_VALUE_MONTHLY_CHARGES,
        action: RecommendedAction {
            priority: ActionPriority::High,
            action: "VIP retention call + loyalty reward program",
            impact: "High-value customers need special attention",
        },
    },
    RecommendationRule {
        applies: |i| i.record.late_payment_count > PAYMENT_PLAN_LATE_PAYMENTS,
        action: RecommendedAction {
            priority: ActionPriority::Medium,
            action: "Offer flexible payment plan",
            impact: "Financial stress increases churn risk",
        },
    },
];

/// Every matching retention action, in table order
pub fn recommend(
    record: &CustomerRecord,
    probability: f64,
    thresholds: &RiskThresholds,
) -> Vec<RecommendedAction> {
    let input = RuleInput {
        record,
        probability,
        thresholds,
    };

    RECOMMENDATION_RULES
        .iter()
        .filter(|rule| (rule.applies)(&input))
        .map(|rule| rule.action.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explain::tests::baseline_record;

    fn actions(recs: &[RecommendedAction]) -> Vec<&'static str> {
        recs.iter().map(|r| r.action).collect()
    }

    #[test]
    fn test_low_risk_clean_record_has_no_actions() {
        let recs = recommend(&baseline_record(), 0.2, &RiskThresholds::default());
        assert!(recs.is_empty());
    }

    #[test]
    fn test_urgent_only_above_high_threshold() {
        let thresholds = RiskThresholds::default();
        let record = baseline_record();

        assert!(recommend(&record, 0.50, &thresholds).is_empty());

        let recs = recommend(&record, 0.51, &thresholds);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].priority, ActionPriority::Urgent);
    }

    #[test]
    fn test_all_rules_fire_in_order_without_truncation() {
        let mut record = baseline_record();
        record.contract_type = ContractType::MonthToMonth;
        record.tenure_months = 2;
        record.autopay_enabled = Autopay::No;
        record.support_calls = 4;
        record.monthly_charges = 6500.0;
        record.late_payment_count = 3;

        let recs = recommend(&record, 0.9, &RiskThresholds::default());

        assert_eq!(
            actions(&recs),
            vec![
                "Schedule immediate retention call",
                "Offer 12-month contract with 15% discount",
                "Assign dedicated onboarding specialist",
                "Enable autopay with KES 500 credit incentive",
                "Escalate to customer success manager",
                "VIP retention call + loyalty reward program",
                "Offer flexible payment plan",
            ]
        );
    }

    #[test]
    fn test_payment_plan_needs_more_than_two_late_payments() {
        let mut record = baseline_record();
        record.late_payment_count = 2;
        assert!(recommend(&record, 0.1, &RiskThresholds::default()).is_empty());
    }
}
