//! Canonicalization of free-form categorical inputs.
//!
//! Every lookup is total: unrecognized or missing values resolve to the
//! documented default for the field.

use crate::types::{
    Autopay, ContractType, LocationType, NormalizedRecord, PaymentMethod, RawCustomerRecord,
    RawFlag, ServiceType,
};

pub const DEFAULT_CONTRACT: ContractType = ContractType::MonthToMonth;
pub const DEFAULT_PAYMENT: PaymentMethod = PaymentMethod::MPesa;
pub const DEFAULT_AUTOPAY: Autopay = Autopay::No;
pub const DEFAULT_SERVICE: ServiceType = ServiceType::Standard;
pub const DEFAULT_LOCATION: LocationType = LocationType::Urban;

const CONTRACT_SYNONYMS: &[(&str, ContractType)] = &[
    ("Month-to-Month", ContractType::MonthToMonth),
    ("month-to-month", ContractType::MonthToMonth),
    ("MTM", ContractType::MonthToMonth),
    ("Monthly", ContractType::MonthToMonth),
    ("Month to Month", ContractType::MonthToMonth),
    ("month to month", ContractType::MonthToMonth),
    ("One Year", ContractType::OneYear),
    ("One year", ContractType::OneYear),
    ("one year", ContractType::OneYear),
    ("1 Year", ContractType::OneYear),
    ("1-Year", ContractType::OneYear),
    ("12 Months", ContractType::OneYear),
    ("Two Year", ContractType::TwoYear),
    ("Two year", ContractType::TwoYear),
    ("two year", ContractType::TwoYear),
    ("2 Year", ContractType::TwoYear),
    ("2-Year", ContractType::TwoYear),
    ("24 Months", ContractType::TwoYear),
];

const PAYMENT_SYNONYMS: &[(&str, PaymentMethod)] = &[
    ("M-Pesa", PaymentMethod::MPesa),
    ("M-pesa", PaymentMethod::MPesa),
    ("MPESA", PaymentMethod::MPesa),
    ("mpesa", PaymentMethod::MPesa),
    ("Mpesa", PaymentMethod::MPesa),
    ("Bank Transfer", PaymentMethod::BankTransfer),
    ("Bank transfer", PaymentMethod::BankTransfer),
    ("bank transfer", PaymentMethod::BankTransfer),
    ("Bank_Transfer", PaymentMethod::BankTransfer),
    ("Credit Card", PaymentMethod::CreditCard),
    ("Credit card", PaymentMethod::CreditCard),
    ("credit card", PaymentMethod::CreditCard),
    ("Debit Card", PaymentMethod::DebitCard),
    ("Debit card", PaymentMethod::DebitCard),
    ("debit card", PaymentMethod::DebitCard),
    ("Cash", PaymentMethod::Cash),
    ("cash", PaymentMethod::Cash),
    ("CASH", PaymentMethod::Cash),
];

const AUTOPAY_SYNONYMS: &[(&str, Autopay)] = &[
    ("Yes", Autopay::Yes),
    ("yes", Autopay::Yes),
    ("YES", Autopay::Yes),
    ("Y", Autopay::Yes),
    ("True", Autopay::Yes),
    ("true", Autopay::Yes),
    ("1", Autopay::Yes),
    ("No", Autopay::No),
    ("no", Autopay::No),
    ("NO", Autopay::No),
    ("N", Autopay::No),
    ("False", Autopay::No),
    ("false", Autopay::No),
    ("0", Autopay::No),
];

fn lookup<T: Copy>(table: &[(&str, T)], value: &str) -> Option<T> {
    table
        .iter()
        .find(|(synonym, _)| *synonym == value)
        .map(|(_, canonical)| *canonical)
}

pub fn normalize_contract(value: Option<&str>) -> ContractType {
    value
        .and_then(|v| lookup(CONTRACT_SYNONYMS, v.trim()))
        .unwrap_or(DEFAULT_CONTRACT)
}

pub fn normalize_payment(value: Option<&str>) -> PaymentMethod {
    value
        .and_then(|v| lookup(PAYMENT_SYNONYMS, v.trim()))
        .unwrap_or(DEFAULT_PAYMENT)
}

pub fn normalize_autopay(value: Option<&RawFlag>) -> Autopay {
    let resolved = match value {
        Some(RawFlag::Bool(true)) => Some(Autopay::Yes),
        Some(RawFlag::Bool(false)) => Some(Autopay::No),
        Some(RawFlag::Int(1)) => Some(Autopay::Yes),
        Some(RawFlag::Int(0)) => Some(Autopay::No),
        Some(RawFlag::Float(f)) if *f == 1.0 => Some(Autopay::Yes),
        Some(RawFlag::Float(f)) if *f == 0.0 => Some(Autopay::No),
        Some(RawFlag::Text(text)) => lookup(AUTOPAY_SYNONYMS, text.trim()),
        _ => None,
    };
    resolved.unwrap_or(DEFAULT_AUTOPAY)
}

/// Service type must match a canonical label exactly
pub fn normalize_service(value: Option<&str>) -> ServiceType {
    match value {
        Some("Basic") => ServiceType::Basic,
        Some("Standard") => ServiceType::Standard,
        Some("Premium") => ServiceType::Premium,
        _ => DEFAULT_SERVICE,
    }
}

/// Location type must match a canonical label exactly
pub fn normalize_location(value: Option<&str>) -> LocationType {
    match value {
        Some("Urban") => LocationType::Urban,
        Some("Suburban") => LocationType::Suburban,
        Some("Rural") => LocationType::Rural,
        _ => DEFAULT_LOCATION,
    }
}

/// Canonicalize every categorical field of a raw record.
///
/// Numeric fields pass through untouched, missing values included.
pub fn normalize(raw: &RawCustomerRecord) -> NormalizedRecord {
    NormalizedRecord {
        customer_id: raw.customer_id.clone(),
        tenure_months: raw.tenure_months,
        contract_type: normalize_contract(raw.contract_type.as_deref()),
        service_type: normalize_service(raw.service_type.as_deref()),
        monthly_charges: raw.monthly_charges,
        total_charges: raw.total_charges,
        payment_method: normalize_payment(raw.payment_method.as_deref()),
        location_type: normalize_location(raw.location_type.as_deref()),
        num_services: raw.num_services,
        data_usage_gb: raw.data_usage_gb,
        support_calls: raw.support_calls,
        autopay_enabled: normalize_autopay(raw.autopay_enabled.as_ref()),
        late_payment_count: raw.late_payment_count,
        referral_count: raw.referral_count,
    }
}
