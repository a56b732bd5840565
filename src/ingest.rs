//! CSV ingestion of raw customer records.
//!
//! Cells are kept verbatim apart from header trimming; empty cells become
//! missing values and are left to the cleaning stage. Rows that cannot be
//! parsed are set aside with their line number while the rest of the file
//! is still read.

use crate::types::RawCustomerRecord;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Columns every customer file must carry
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "customer_id",
    "tenure_months",
    "contract_type",
    "service_type",
    "monthly_charges",
    "total_charges",
    "payment_method",
    "location_type",
    "num_services",
    "data_usage_gb",
    "support_calls",
    "autopay_enabled",
    "late_payment_count",
    "referral_count",
];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },
}

/// A row that was skipped during ingestion
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    /// 1-based line number, header included
    pub line: u64,
    pub reason: String,
}

/// Parsed customer rows plus the rows that were set aside
#[derive(Debug, Default)]
pub struct CustomerBatch {
    pub records: Vec<RawCustomerRecord>,
    pub rejected: Vec<RejectedRow>,
}

/// Read every customer record from a CSV file
pub fn read_customers_from_path<P: AsRef<Path>>(path: P) -> Result<CustomerBatch, IngestError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let batch = read_customers(file)?;
    info!(
        path = %path.display(),
        records = batch.records.len(),
        rejected = batch.rejected.len(),
        "Customer file loaded"
    );
    Ok(batch)
}

/// Read customer records from CSV with a header row.
///
/// A missing column or an I/O failure aborts the read. A malformed row is
/// logged and recorded in `rejected`.
pub fn read_customers<R: Read>(reader: R) -> Result<CustomerBatch, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    check_columns(&headers)?;

    let mut batch = CustomerBatch::default();
    for row in rdr.records() {
        let parsed = match row {
            Ok(row) => {
                let line = row.position().map(|p| p.line()).unwrap_or_default();
                parse_row(&row, &headers, line)
            }
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(IngestError::InvalidRecord {
                line: e.position().map(|p| p.line()).unwrap_or_default(),
                reason: e.to_string(),
            }),
        };

        match parsed {
            Ok(record) => batch.records.push(record),
            Err(IngestError::InvalidRecord { line, reason }) => {
                warn!(line, %reason, "Skipping customer row");
                batch.rejected.push(RejectedRow { line, reason });
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        records = batch.records.len(),
        rejected = batch.rejected.len(),
        "Parsed customer rows"
    );
    Ok(batch)
}

fn check_columns(headers: &StringRecord) -> Result<(), IngestError> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(IngestError::MissingColumn(column));
        }
    }
    Ok(())
}

fn parse_row(
    row: &StringRecord,
    headers: &StringRecord,
    line: u64,
) -> Result<RawCustomerRecord, IngestError> {
    let record: RawCustomerRecord =
        row.deserialize(Some(headers))
            .map_err(|e| IngestError::InvalidRecord {
                line,
                reason: e.to_string(),
            })?;

    if record.customer_id.trim().is_empty() {
        return Err(IngestError::InvalidRecord {
            line,
            reason: "empty customer_id".to_string(),
        });
    }

    Ok(record)
}
