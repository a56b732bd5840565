//! Type definitions for the churn risk pipeline

pub mod customer;
pub mod prediction;

pub use customer::{
    Autopay, CleanedRecord, ContractType, CustomerRecord, LocationType, NormalizedRecord,
    PaymentMethod, RawCustomerRecord, RawFlag, ServiceType,
};
pub use prediction::{
    ActionPriority, DriverFact, DriverPriority, PredictionResult, RecommendedAction, RiskTier,
};
