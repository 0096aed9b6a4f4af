//! RFM (Recency, Frequency, Monetary) segmentation
//!
//! Customers are grouped by exact name, scored against a snapshot date one day
//! after the latest order, and tiered by where their total spend falls
//! relative to the 25th and 75th percentiles of all customers' spend.

use crate::data::Transaction;
use crate::error::RfmError;
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Spend tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    Gold,
    Silver,
    Bronze,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::Gold, Segment::Silver, Segment::Bronze];

    /// Label shown on charts and in reports
    pub fn label(&self) -> &'static str {
        match self {
            Segment::Gold => "Gold (Top Spender)",
            Segment::Silver => "Silver (Average)",
            Segment::Bronze => "Bronze (Low Spender)",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Gold => "Gold",
            Segment::Silver => "Silver",
            Segment::Bronze => "Bronze",
        };
        f.write_str(name)
    }
}

/// How to treat a customer none of whose orders carry a valid date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecencyPolicy {
    /// Fail the whole computation with `RfmError::UndefinedRecency`
    #[default]
    Reject,
    /// Leave the customer out of tiering and report them in `RfmReport::undated`
    Exclude,
}

/// Analyzer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RfmConfig {
    pub recency_policy: RecencyPolicy,
    /// Explicit reference date; defaults to the latest order date plus one day
    pub snapshot: Option<NaiveDate>,
}

/// Scores and tier for one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRfm {
    pub recency_days: i64,
    pub frequency: usize,
    pub monetary: Decimal,
    pub segment: Segment,
}

/// A customer excluded from tiering because no order had a usable date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndatedCustomer {
    pub frequency: usize,
    pub monetary: Decimal,
}

/// Tier boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quartiles {
    pub p25: Decimal,
    pub p75: Decimal,
}

impl Quartiles {
    /// Compute p25/p75 over a set of spend totals; `None` when empty
    pub fn from_monetary(values: &[Decimal]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort();
        Some(Quartiles {
            p25: quantile(&sorted, dec!(0.25))?,
            p75: quantile(&sorted, dec!(0.75))?,
        })
    }

    /// Tier a spend value. The Gold check runs first, so a value sitting on
    /// both boundaries (p25 == p75) is Gold.
    pub fn classify(&self, monetary: Decimal) -> Segment {
        if monetary >= self.p75 {
            Segment::Gold
        } else if monetary <= self.p25 {
            Segment::Bronze
        } else {
            Segment::Silver
        }
    }
}

/// Linear-interpolation quantile over an ascending slice
///
/// Interpolates at rank `p * (n - 1)`. Returns `None` for an empty slice,
/// `p` outside `[0, 1]`, or when the interpolation leaves the decimal range.
pub fn quantile(sorted: &[Decimal], p: Decimal) -> Option<Decimal> {
    if sorted.is_empty() || p < Decimal::ZERO || p > Decimal::ONE {
        return None;
    }

    let rank = p * Decimal::from(sorted.len() - 1);
    let lower = rank.floor();
    let fraction = rank - lower;
    let lo = lower.to_usize()?;
    let hi = (lo + 1).min(sorted.len() - 1);
    if fraction.is_zero() || lo == hi {
        return Some(sorted[lo]);
    }

    let spread = sorted[hi].checked_sub(sorted[lo])?;
    sorted[lo].checked_add(fraction.checked_mul(spread)?)
}

/// Segmentation result for one transaction set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfmReport {
    /// Reference date recency is measured against; `None` only when no order is dated
    pub snapshot: Option<NaiveDate>,
    /// `None` when no customer could be tiered
    pub quartiles: Option<Quartiles>,
    pub customers: BTreeMap<String, CustomerRfm>,
    pub undated: BTreeMap<String, UndatedCustomer>,
}

impl RfmReport {
    /// Number of customers in each tier, in Gold, Silver, Bronze order
    pub fn segment_counts(&self) -> [(Segment, usize); 3] {
        Segment::ALL.map(|segment| {
            let count = self
                .customers
                .values()
                .filter(|c| c.segment == segment)
                .count();
            (segment, count)
        })
    }

    pub fn get(&self, customer: &str) -> Option<&CustomerRfm> {
        self.customers.get(customer)
    }
}

/// Per-customer running totals
#[derive(Default)]
struct Accumulator {
    last_order: Option<NaiveDate>,
    frequency: usize,
    monetary: Decimal,
}

/// Stateless RFM calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct RfmAnalyzer {
    config: RfmConfig,
}

impl RfmAnalyzer {
    pub fn new(config: RfmConfig) -> Self {
        RfmAnalyzer { config }
    }

    /// Segment every customer in `transactions`
    ///
    /// # Arguments
    /// * `transactions` - The already-filtered order lines
    ///
    /// # Returns
    /// * `RfmReport` keyed by customer name, or the first error encountered
    pub fn analyze(&self, transactions: &[Transaction]) -> Result<RfmReport, RfmError> {
        if transactions.is_empty() {
            return Err(RfmError::EmptyInput);
        }

        let latest_order = transactions.iter().filter_map(|tx| tx.order_date).max();
        let snapshot = self.resolve_snapshot(latest_order)?;

        let mut groups: BTreeMap<&str, Accumulator> = BTreeMap::new();
        for tx in transactions {
            let acc = groups.entry(tx.customer_name.as_str()).or_default();
            acc.frequency += 1;
            acc.monetary = acc.monetary.checked_add(tx.sales).ok_or_else(|| {
                RfmError::AmountOverflow {
                    customer: tx.customer_name.clone(),
                }
            })?;
            acc.last_order = acc.last_order.max(tx.order_date);
        }

        let mut dated = Vec::with_capacity(groups.len());
        let mut undated = BTreeMap::new();
        for (name, acc) in groups {
            match (snapshot, acc.last_order) {
                (Some(snapshot), Some(last_order)) => {
                    let recency_days = (snapshot - last_order).num_days();
                    dated.push((name, recency_days, acc));
                }
                _ => match self.config.recency_policy {
                    RecencyPolicy::Reject => {
                        return Err(RfmError::UndefinedRecency {
                            customer: name.to_string(),
                        });
                    }
                    RecencyPolicy::Exclude => {
                        tracing::warn!(
                            customer = name,
                            "Excluding customer with no dated orders"
                        );
                        undated.insert(
                            name.to_string(),
                            UndatedCustomer {
                                frequency: acc.frequency,
                                monetary: acc.monetary,
                            },
                        );
                    }
                },
            }
        }

        let spend: Vec<Decimal> = dated.iter().map(|(_, _, acc)| acc.monetary).collect();
        let quartiles = if spend.is_empty() {
            None
        } else {
            Some(Quartiles::from_monetary(&spend).ok_or(RfmError::QuantileOverflow)?)
        };

        let mut customers = BTreeMap::new();
        if let Some(bounds) = quartiles {
            for (name, recency_days, acc) in dated {
                customers.insert(
                    name.to_string(),
                    CustomerRfm {
                        recency_days,
                        frequency: acc.frequency,
                        monetary: acc.monetary,
                        segment: bounds.classify(acc.monetary),
                    },
                );
            }
        }

        tracing::debug!(
            customers = customers.len(),
            undated = undated.len(),
            snapshot = ?snapshot,
            "Computed RFM segments"
        );

        Ok(RfmReport {
            snapshot,
            quartiles,
            customers,
            undated,
        })
    }

    fn resolve_snapshot(
        &self,
        latest_order: Option<NaiveDate>,
    ) -> Result<Option<NaiveDate>, RfmError> {
        match (self.config.snapshot, latest_order) {
            (Some(snapshot), Some(last_order)) if snapshot < last_order => {
                Err(RfmError::SnapshotBeforeLastOrder {
                    snapshot,
                    last_order,
                })
            }
            (Some(snapshot), _) => Ok(Some(snapshot)),
            (None, Some(last_order)) => last_order
                .checked_add_days(Days::new(1))
                .map(Some)
                .ok_or(RfmError::SnapshotOutOfRange { last_order }),
            (None, None) => Ok(None),
        }
    }
}

/// Segment customers with the default configuration
pub fn compute_segments(transactions: &[Transaction]) -> Result<RfmReport, RfmError> {
    RfmAnalyzer::default().analyze(transactions)
}
