//! Headline metrics and chart series for the sales dashboard

use crate::data::Transaction;
use crate::error::KpiError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label for rows with no product category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Top-of-page figures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardKpis {
    pub total_revenue: Decimal,
    /// Rows without a profit figure count as zero
    pub total_profit: Decimal,
    /// Mean sales per order line; `None` for an empty set
    pub average_order_value: Option<Decimal>,
    pub order_lines: usize,
}

/// Total sales for one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySales {
    /// Last day of the month
    pub month_end: NaiveDate,
    pub sales: Decimal,
}

/// Total profit for one product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProfit {
    pub category: String,
    pub profit: Decimal,
}

/// Add `amount` into `total`, naming `metric` if the sum leaves the decimal range
fn accumulate(total: &mut Decimal, amount: Decimal, metric: &str) -> Result<(), KpiError> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| KpiError::AmountOverflow {
            metric: metric.to_string(),
        })?;
    Ok(())
}

pub fn compute_kpis(transactions: &[Transaction]) -> Result<DashboardKpis, KpiError> {
    let mut total_revenue = Decimal::ZERO;
    let mut total_profit = Decimal::ZERO;
    for tx in transactions {
        accumulate(&mut total_revenue, tx.sales, "total revenue")?;
        if let Some(profit) = tx.profit {
            accumulate(&mut total_profit, profit, "total profit")?;
        }
    }
    let order_lines = transactions.len();
    let average_order_value = if order_lines == 0 {
        None
    } else {
        Some(total_revenue / Decimal::from(order_lines))
    };

    Ok(DashboardKpis {
        total_revenue,
        total_profit,
        average_order_value,
        order_lines,
    })
}

/// Sales summed per month, from the first to the last dated order
///
/// Months with no orders appear with zero sales. Undated rows are ignored.
pub fn monthly_sales(transactions: &[Transaction]) -> Result<Vec<MonthlySales>, KpiError> {
    let mut buckets: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    for tx in transactions {
        if let Some(date) = tx.order_date {
            let bucket = buckets.entry((date.year(), date.month())).or_default();
            accumulate(bucket, tx.sales, "monthly sales")?;
        }
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Ok(Vec::new());
    };

    let mut series = Vec::new();
    let mut current = first;
    while current <= last {
        if let Some(month_end) = month_end(current.0, current.1) {
            series.push(MonthlySales {
                month_end,
                sales: buckets.get(&current).copied().unwrap_or_default(),
            });
        }
        current = next_month(current);
    }
    Ok(series)
}

/// Profit summed per product category, ordered by category name
pub fn profit_by_category(transactions: &[Transaction]) -> Result<Vec<CategoryProfit>, KpiError> {
    let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
    for tx in transactions {
        let category = tx.category.as_deref().unwrap_or(UNCATEGORIZED);
        let total = totals.entry(category).or_default();
        accumulate(total, tx.profit.unwrap_or_default(), "category profit")?;
    }

    Ok(totals
        .into_iter()
        .map(|(category, profit)| CategoryProfit {
            category: category.to_string(),
            profit,
        })
        .collect())
}

fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next) = next_month((year, month));
    NaiveDate::from_ymd_opt(next_year, next, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new("Ann", "1", date(2023, 11, 3), dec!(100))
                .with_profit(dec!(20))
                .with_category("Furniture"),
            Transaction::new("Ben", "2", date(2023, 11, 28), dec!(50))
                .with_profit(dec!(-5))
                .with_category("Technology"),
            Transaction::new("Cy", "3", date(2024, 2, 14), dec!(30)).with_category("Furniture"),
            Transaction::new("Dee", "4", None, dec!(20)).with_profit(dec!(4)),
        ]
    }

    #[test]
    fn test_compute_kpis() {
        let kpis = compute_kpis(&sample()).unwrap();
        assert_eq!(kpis.total_revenue, dec!(200));
        assert_eq!(kpis.total_profit, dec!(19));
        assert_eq!(kpis.average_order_value, Some(dec!(50)));
        assert_eq!(kpis.order_lines, 4);
    }

    #[test]
    fn test_kpis_empty() {
        let kpis = compute_kpis(&[]).unwrap();
        assert_eq!(kpis.total_revenue, Decimal::ZERO);
        assert_eq!(kpis.average_order_value, None);
    }

    #[test]
    fn test_monthly_sales_fills_gaps() {
        let series = monthly_sales(&sample()).unwrap();
        let months: Vec<NaiveDate> = series.iter().map(|m| m.month_end).collect();
        assert_eq!(
            months,
            vec![
                NaiveDate::from_ymd_opt(2023, 11, 30).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            ]
        );
        assert_eq!(series[0].sales, dec!(150));
        assert_eq!(series[1].sales, Decimal::ZERO);
        assert_eq!(series[3].sales, dec!(30));
    }

    #[test]
    fn test_monthly_sales_without_dates() {
        let undated = vec![Transaction::new("Ann", "1", None, dec!(10))];
        assert!(monthly_sales(&undated).unwrap().is_empty());
    }

    #[test]
    fn test_profit_by_category() {
        let series = profit_by_category(&sample()).unwrap();
        assert_eq!(
            series,
            vec![
                CategoryProfit {
                    category: "Furniture".to_string(),
                    profit: dec!(20)
                },
                CategoryProfit {
                    category: "Technology".to_string(),
                    profit: dec!(-5)
                },
                CategoryProfit {
                    category: UNCATEGORIZED.to_string(),
                    profit: dec!(4)
                },
            ]
        );
    }

    #[test]
    fn test_overflowing_sums_return_error() {
        let huge = Decimal::from_str_exact("50000000000000000000000000000").unwrap();
        let day = date(2024, 1, 1);
        let transactions = vec![
            Transaction::new("Ann", "1", day, huge)
                .with_profit(huge)
                .with_category("Furniture"),
            Transaction::new("Ann", "2", day, huge)
                .with_profit(huge)
                .with_category("Furniture"),
        ];

        assert_eq!(
            compute_kpis(&transactions),
            Err(KpiError::AmountOverflow {
                metric: "total revenue".to_string()
            })
        );
        assert_eq!(
            monthly_sales(&transactions),
            Err(KpiError::AmountOverflow {
                metric: "monthly sales".to_string()
            })
        );
        assert_eq!(
            profit_by_category(&transactions),
            Err(KpiError::AmountOverflow {
                metric: "category profit".to_string()
            })
        );
    }
}
