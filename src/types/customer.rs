//! Customer record data structures for churn risk assessment

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Contract commitment held by the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContractType {
    #[serde(rename = "Month-to-Month")]
    MonthToMonth,
    #[serde(rename = "One Year")]
    OneYear,
    #[serde(rename = "Two Year")]
    TwoYear,
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::MonthToMonth => "Month-to-Month",
            ContractType::OneYear => "One Year",
            ContractType::TwoYear => "Two Year",
        }
    }
}

/// Service tier; also the segment key for fitted statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    Basic,
    Standard,
    Premium,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Basic => "Basic",
            ServiceType::Standard => "Standard",
            ServiceType::Premium => "Premium",
        }
    }
}

/// How the customer settles their bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Mobile money
    #[serde(rename = "M-Pesa")]
    MPesa,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::MPesa => "M-Pesa",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::DebitCard => "Debit Card",
            PaymentMethod::Cash => "Cash",
        }
    }
}

/// Settlement type of the service address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationType {
    Urban,
    Suburban,
    Rural,
}

impl LocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationType::Urban => "Urban",
            LocationType::Suburban => "Suburban",
            LocationType::Rural => "Rural",
        }
    }
}

/// Whether the bill is charged automatically each cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Autopay {
    Yes,
    No,
}

impl Autopay {
    pub fn as_str(&self) -> &'static str {
        match self {
            Autopay::Yes => "Yes",
            Autopay::No => "No",
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Autopay::Yes)
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(ContractType, ServiceType, PaymentMethod, LocationType, Autopay);

/// Autopay flag as it arrives from upstream systems: text, number or boolean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawFlag {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for RawFlag {
    fn from(value: &str) -> Self {
        RawFlag::Text(value.to_string())
    }
}

/// Numeric cell as exported by spreadsheets and dataframe tools
#[derive(Deserialize)]
#[serde(untagged)]
enum NumericCell {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumericCell {
    /// `None` for a blank cell
    fn to_f64(&self) -> Result<Option<f64>, String> {
        let value = match self {
            NumericCell::Int(i) => *i as f64,
            NumericCell::Float(f) => *f,
            NumericCell::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<f64>()
                    .map_err(|_| format!("invalid number '{text}'"))?
            }
        };
        if !value.is_finite() {
            return Err(format!("non-finite number {value}"));
        }
        Ok(Some(value))
    }
}

/// Count column: accepts "12", " 12 " and "12.0", rejects "12.5"
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(cell) = Option::<NumericCell>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let NumericCell::Int(value) = cell {
        return Ok(Some(value));
    }
    match cell.to_f64().map_err(D::Error::custom)? {
        None => Ok(None),
        Some(value) if value.fract() == 0.0 && value.abs() <= i64::MAX as f64 => {
            Ok(Some(value as i64))
        }
        Some(value) => Err(D::Error::custom(format!(
            "expected a whole number, got {value}"
        ))),
    }
}

/// Decimal column: accepts surrounding whitespace
fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumericCell>::deserialize(deserializer)? {
        Some(cell) => cell.to_f64().map_err(D::Error::custom),
        None => Ok(None),
    }
}

/// Customer row before cleaning. Only `customer_id` is guaranteed present.
///
/// Numeric cells tolerate padding and integral floats such as "12.0";
/// anything else unparseable fails the row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCustomerRecord {
    pub customer_id: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub tenure_months: Option<i64>,
    #[serde(default)]
    pub contract_type: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub monthly_charges: Option<f64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_charges: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_services: Option<i64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub data_usage_gb: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub support_calls: Option<i64>,
    #[serde(default)]
    pub autopay_enabled: Option<RawFlag>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub late_payment_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub referral_count: Option<i64>,
}

impl RawCustomerRecord {
    /// Create a raw record with only the identifier set
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            ..Default::default()
        }
    }
}

/// Record with canonical categoricals whose numeric fields may still be missing
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// Identifier carried through from the input row
    pub customer_id: String,
    /// Months since activation
    pub tenure_months: Option<i64>,
    pub contract_type: ContractType,
    pub service_type: ServiceType,
    /// Current monthly bill
    pub monthly_charges: Option<f64>,
    /// Lifetime billed amount
    pub total_charges: Option<f64>,
    pub payment_method: PaymentMethod,
    pub location_type: LocationType,
    /// Active products on the account
    pub num_services: Option<i64>,
    /// Monthly data consumption in gigabytes
    pub data_usage_gb: Option<f64>,
    /// Support tickets raised
    pub support_calls: Option<i64>,
    pub autopay_enabled: Autopay,
    /// Bills settled after the due date
    pub late_payment_count: Option<i64>,
    /// Customers referred by this account
    pub referral_count: Option<i64>,
}

/// Fully cleaned customer record: canonical categoricals, no missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    /// Identifier carried through from the input row
    pub customer_id: String,
    /// Months since activation, zero when unknown
    pub tenure_months: i64,
    pub contract_type: ContractType,
    pub service_type: ServiceType,
    /// Monthly bill, imputed from the segment median when missing
    pub monthly_charges: f64,
    /// Lifetime billed amount, at least one month of charges when imputed
    pub total_charges: f64,
    pub payment_method: PaymentMethod,
    pub location_type: LocationType,
    /// Active products on the account
    pub num_services: i64,
    /// Monthly data consumption in gigabytes
    pub data_usage_gb: f64,
    /// Support tickets raised
    pub support_calls: i64,
    pub autopay_enabled: Autopay,
    /// Bills settled after the due date
    pub late_payment_count: i64,
    /// Customers referred by this account
    pub referral_count: i64,
}

impl From<&CustomerRecord> for NormalizedRecord {
    fn from(record: &CustomerRecord) -> Self {
        Self {
            customer_id: record.customer_id.clone(),
            tenure_months: Some(record.tenure_months),
            contract_type: record.contract_type,
            service_type: record.service_type,
            monthly_charges: Some(record.monthly_charges),
            total_charges: Some(record.total_charges),
            payment_method: record.payment_method,
            location_type: record.location_type,
            num_services: Some(record.num_services),
            data_usage_gb: Some(record.data_usage_gb),
            support_calls: Some(record.support_calls),
            autopay_enabled: record.autopay_enabled,
            late_payment_count: Some(record.late_payment_count),
            referral_count: Some(record.referral_count),
        }
    }
}

/// Cleaned record together with its billing anomaly flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedRecord {
    #[serde(flatten)]
    pub record: CustomerRecord,
    pub charges_anomaly_flag: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_record_missing_fields_deserialize_as_none() {
        let raw: RawCustomerRecord =
            serde_json::from_str(r#"{"customer_id": "C001", "tenure_months": 4}"#).unwrap();

        assert_eq!(raw.customer_id, "C001");
        assert_eq!(raw.tenure_months, Some(4));
        assert!(raw.monthly_charges.is_none());
        assert!(raw.autopay_enabled.is_none());
    }

    #[test]
    fn test_raw_flag_accepts_mixed_types() {
        let raw: RawCustomerRecord =
            serde_json::from_str(r#"{"customer_id": "C1", "autopay_enabled": true}"#).unwrap();
        assert_eq!(raw.autopay_enabled, Some(RawFlag::Bool(true)));

        let raw: RawCustomerRecord =
            serde_json::from_str(r#"{"customer_id": "C2", "autopay_enabled": 0}"#).unwrap();
        assert_eq!(raw.autopay_enabled, Some(RawFlag::Int(0)));

        let raw: RawCustomerRecord =
            serde_json::from_str(r#"{"customer_id": "C3", "autopay_enabled": "Y"}"#).unwrap();
        assert_eq!(raw.autopay_enabled, Some(RawFlag::Text("Y".to_string())));
    }

    #[test]
    fn test_numeric_cells_tolerate_padding_and_integral_floats() {
        let raw: RawCustomerRecord = serde_json::from_str(
            r#"{"customer_id": "C1", "tenure_months": "12.0", "support_calls": " 3 ",
                "monthly_charges": " 4500.5 ", "referral_count": 2.0}"#,
        )
        .unwrap();

        assert_eq!(raw.tenure_months, Some(12));
        assert_eq!(raw.support_calls, Some(3));
        assert_eq!(raw.monthly_charges, Some(4500.5));
        assert_eq!(raw.referral_count, Some(2));
    }

    #[test]
    fn test_fractional_count_is_rejected() {
        let result: Result<RawCustomerRecord, _> =
            serde_json::from_str(r#"{"customer_id": "C1", "tenure_months": "12.5"}"#);
        assert!(result.is_err());

        let result: Result<RawCustomerRecord, _> =
            serde_json::from_str(r#"{"customer_id": "C1", "support_calls": "many"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_numeric_text_is_missing() {
        let raw: RawCustomerRecord = serde_json::from_str(
            r#"{"customer_id": "C1", "tenure_months": "  ", "data_usage_gb": null}"#,
        )
        .unwrap();

        assert_eq!(raw.tenure_months, None);
        assert_eq!(raw.data_usage_gb, None);
    }

    #[test]
    fn test_canonical_labels_serialize() {
        assert_eq!(
            serde_json::to_string(&ContractType::MonthToMonth).unwrap(),
            "\"Month-to-Month\""
        );
        assert_eq!(PaymentMethod::BankTransfer.to_string(), "Bank Transfer");
    }
}
