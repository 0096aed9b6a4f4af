//! Region selection applied before any aggregation

use crate::data::Transaction;
use std::collections::BTreeSet;

/// Which regions to keep
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegionFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl RegionFilter {
    /// Build a filter from a list of selected regions; an empty list keeps everything
    pub fn from_selection<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let selected: BTreeSet<String> = regions.into_iter().map(Into::into).collect();
        if selected.is_empty() {
            RegionFilter::All
        } else {
            RegionFilter::Only(selected)
        }
    }

    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Only(regions) => transaction
                .region
                .as_ref()
                .is_some_and(|region| regions.contains(region)),
        }
    }

    pub fn apply(&self, transactions: &[Transaction]) -> Vec<Transaction> {
        let kept: Vec<Transaction> = transactions
            .iter()
            .filter(|tx| self.matches(tx))
            .cloned()
            .collect();
        tracing::debug!(
            before = transactions.len(),
            after = kept.len(),
            "Applied region filter"
        );
        kept
    }
}

/// Sorted distinct regions present in the data
pub fn available_regions(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .filter_map(|tx| tx.region.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new("Ann", "1", None, dec!(10)).with_region("East"),
            Transaction::new("Ben", "2", None, dec!(20)).with_region("West"),
            Transaction::new("Cy", "3", None, dec!(30)).with_region("east"),
            Transaction::new("Dee", "4", None, dec!(40)),
        ]
    }

    #[test]
    fn test_all_keeps_everything() {
        let filter = RegionFilter::from_selection(Vec::<String>::new());
        assert_eq!(filter, RegionFilter::All);
        assert_eq!(filter.apply(&sample()).len(), 4);
    }

    #[test]
    fn test_only_is_exact_match() {
        let filter = RegionFilter::from_selection(["East"]);
        let kept = filter.apply(&sample());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].customer_name, "Ann");
    }

    #[test]
    fn test_rows_without_region_dropped_by_selection() {
        let filter = RegionFilter::from_selection(["East", "West", "east"]);
        let kept = filter.apply(&sample());
        assert!(kept.iter().all(|tx| tx.region.is_some()));
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_available_regions_sorted() {
        assert_eq!(available_regions(&sample()), vec!["East", "West", "east"]);
    }
}
