//! TierForge: a retail sales dashboard with RFM customer tiering
//!
//! Loads a sales CSV, applies a region filter, computes revenue/profit KPIs
//! and chart series, and segments customers into Gold, Silver and Bronze
//! tiers by Recency, Frequency and Monetary value.

pub mod cli;
pub mod data;
pub mod error;
pub mod filter;
pub mod kpi;
pub mod model;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_transactions, read_transactions, LoadOptions, LoadedData, Transaction};
pub use error::{DataError, KpiError, RfmError};
pub use filter::{available_regions, RegionFilter};
pub use kpi::{compute_kpis, monthly_sales, profit_by_category, DashboardKpis};
pub use model::{
    compute_segments, quantile, CustomerRfm, Quartiles, RecencyPolicy, RfmAnalyzer, RfmConfig,
    RfmReport, Segment,
};
pub use viz::generate_dashboard_report;

/// Common result type used by the application layer
pub type Result<T> = anyhow::Result<T>;
