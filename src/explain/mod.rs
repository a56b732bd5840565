//! Risk tiers, churn drivers and retention recommendations

pub mod drivers;
pub mod recommendations;
pub mod risk;

pub use risk::{RiskThresholds, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD};

/// Customers below this tenure are treated as new
pub const NEW_CUSTOMER_MONTHS: i64 = 6;
/// Monthly charges above this mark a high-value customer
pub const HIGH_VALUE_MONTHLY_CHARGES: f64 = 6200.0;
/// Support calls above this mark heavy support usage
pub const HIGH_SUPPORT_CALLS: i64 = 3;
