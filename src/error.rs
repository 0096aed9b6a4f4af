//! Typed errors for transaction loading and RFM analysis

use thiserror::Error;

/// Errors raised by the RFM analyzer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RfmError {
    #[error("No transactions supplied; a snapshot date cannot be derived")]
    EmptyInput,

    #[error("Customer '{customer}' has no transaction with a valid order date")]
    UndefinedRecency { customer: String },

    #[error("Total spend for customer '{customer}' exceeds the decimal range")]
    AmountOverflow { customer: String },

    #[error("Spend quartiles exceed the decimal range")]
    QuantileOverflow,

    #[error("No snapshot date exists after the latest order date {last_order}")]
    SnapshotOutOfRange { last_order: chrono::NaiveDate },

    #[error("Snapshot date {snapshot} is earlier than the latest order date {last_order}")]
    SnapshotBeforeLastOrder {
        snapshot: chrono::NaiveDate,
        last_order: chrono::NaiveDate,
    },
}

/// Errors raised while aggregating dashboard figures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KpiError {
    #[error("Sum for '{metric}' exceeds the decimal range")]
    AmountOverflow { metric: String },
}

/// Errors raised while reading transactions from CSV
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{0}' not found in header")]
    MissingColumn(String),

    #[error("Invalid UTF-8 at line {line}")]
    InvalidEncoding { line: u64 },

    #[error("Malformed transaction at line {line}: {reason}")]
    MalformedTransaction { line: u64, reason: String },
}
