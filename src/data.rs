//! Transaction records and CSV loading
//!
//! Sales exports are read as raw bytes and decoded per field so that
//! ISO-8859-1 files (the common encoding for retail exports) load without a
//! transcoding pass. Order dates that fail to parse are coerced to `None`.

use crate::error::DataError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// A single order line from the sales export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub customer_name: String,
    pub order_id: String,
    /// `None` when the source date could not be parsed
    pub order_date: Option<NaiveDate>,
    /// May be negative (returns) or zero
    pub sales: Decimal,
    pub region: Option<String>,
    pub profit: Option<Decimal>,
    pub category: Option<String>,
}

impl Transaction {
    pub fn new(
        customer_name: impl Into<String>,
        order_id: impl Into<String>,
        order_date: Option<NaiveDate>,
        sales: Decimal,
    ) -> Self {
        Transaction {
            customer_name: customer_name.into(),
            order_id: order_id.into(),
            order_date,
            sales,
            region: None,
            profit: None,
            category: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_profit(mut self, profit: Decimal) -> Self {
        self.profit = Some(profit);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Character encoding of the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// ISO-8859-1: every byte maps to the code point of the same value
    #[default]
    Latin1,
    Utf8,
}

/// What to do with rows missing a customer name or a usable sales amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    #[default]
    Reject,
    Skip,
}

/// Header names for each field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub customer_name: String,
    pub order_id: String,
    pub order_date: String,
    pub sales: String,
    pub region: String,
    pub profit: String,
    pub category: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap {
            customer_name: "Customer Name".to_string(),
            order_id: "Order ID".to_string(),
            order_date: "Order Date".to_string(),
            sales: "Sales".to_string(),
            region: "Region".to_string(),
            profit: "Profit".to_string(),
            category: "Product Category".to_string(),
        }
    }
}

/// Options controlling how a sales CSV is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub encoding: Encoding,
    /// `chrono` format string for the order date column
    pub date_format: String,
    pub malformed: MalformedPolicy,
    pub columns: ColumnMap,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            encoding: Encoding::default(),
            date_format: "%m/%d/%Y".to_string(),
            malformed: MalformedPolicy::default(),
            columns: ColumnMap::default(),
        }
    }
}

/// Result of loading a CSV file
#[derive(Debug, Clone, Default)]
pub struct LoadedData {
    pub transactions: Vec<Transaction>,
    /// Rows dropped under `MalformedPolicy::Skip`
    pub skipped_rows: usize,
}

/// Resolved column positions for one header
struct ColumnIndex {
    customer_name: usize,
    order_id: usize,
    order_date: usize,
    sales: usize,
    region: Option<usize>,
    profit: Option<usize>,
    category: Option<usize>,
}

impl ColumnIndex {
    fn resolve(header: &[String], columns: &ColumnMap) -> Result<Self, DataError> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);
        let require =
            |name: &str| find(name).ok_or_else(|| DataError::MissingColumn(name.to_string()));

        Ok(ColumnIndex {
            customer_name: require(&columns.customer_name)?,
            order_id: require(&columns.order_id)?,
            order_date: require(&columns.order_date)?,
            sales: require(&columns.sales)?,
            region: find(&columns.region),
            profit: find(&columns.profit),
            category: find(&columns.category),
        })
    }
}

/// Load transactions from a CSV file on disk
///
/// # Arguments
/// * `path` - Path to the sales CSV
/// * `options` - Encoding, date format, column names and malformed-row policy
///
/// # Returns
/// * `LoadedData` with every parsed transaction and the number of skipped rows
pub fn load_transactions(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<LoadedData, DataError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_transactions(file, options)
}

/// Read transactions from any CSV source
pub fn read_transactions<R: Read>(
    reader: R,
    options: &LoadOptions,
) -> Result<LoadedData, DataError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = csv_reader
        .byte_headers()?
        .iter()
        .map(|field| decode(field, options.encoding, 1))
        .collect::<Result<Vec<_>, _>>()?;
    let index = ColumnIndex::resolve(&header, &options.columns)?;

    let mut loaded = LoadedData::default();
    for result in csv_reader.byte_records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match parse_record(&record, &index, options, line)? {
            Ok(transaction) => loaded.transactions.push(transaction),
            Err(reason) => match options.malformed {
                MalformedPolicy::Reject => {
                    return Err(DataError::MalformedTransaction { line, reason });
                }
                MalformedPolicy::Skip => {
                    tracing::warn!(line, %reason, "Skipping malformed row");
                    loaded.skipped_rows += 1;
                }
            },
        }
    }

    tracing::debug!(
        rows = loaded.transactions.len(),
        skipped = loaded.skipped_rows,
        "Loaded transactions"
    );
    Ok(loaded)
}

/// Parse one record. The outer error is fatal (bad encoding); the inner
/// `Err` carries the reason a row is malformed.
fn parse_record(
    record: &csv::ByteRecord,
    index: &ColumnIndex,
    options: &LoadOptions,
    line: u64,
) -> Result<Result<Transaction, String>, DataError> {
    let field = |idx: usize| -> Result<Option<String>, DataError> {
        match record.get(idx) {
            Some(bytes) => decode(bytes, options.encoding, line).map(Some),
            None => Ok(None),
        }
    };
    let optional = |idx: Option<usize>| -> Result<Option<String>, DataError> {
        Ok(match idx {
            Some(i) => field(i)?.filter(|value| !value.trim().is_empty()),
            None => None,
        })
    };

    let customer_name = match field(index.customer_name)? {
        Some(name) if !name.is_empty() => name,
        _ => return Ok(Err("missing customer name".to_string())),
    };

    let sales = match field(index.sales)? {
        Some(raw) => match parse_decimal(&raw) {
            Some(amount) => amount,
            None => return Ok(Err(format!("invalid sales amount '{}'", raw))),
        },
        None => return Ok(Err("missing sales amount".to_string())),
    };

    let order_id = field(index.order_id)?.unwrap_or_default();
    let order_date = field(index.order_date)?
        .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), &options.date_format).ok());
    let profit = optional(index.profit)?.and_then(|raw| parse_decimal(&raw));

    Ok(Ok(Transaction {
        customer_name,
        order_id,
        order_date,
        sales,
        region: optional(index.region)?,
        profit,
        category: optional(index.category)?,
    }))
}

fn decode(bytes: &[u8], encoding: Encoding, line: u64) -> Result<String, DataError> {
    match encoding {
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        Encoding::Utf8 => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| DataError::InvalidEncoding { line }),
    }
}

/// Parse a decimal amount, accepting plain and scientific notation
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}
