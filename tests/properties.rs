//! Property-based tests for RFM segmentation invariants

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use tierforge::{compute_segments, Segment, Transaction};

// =============================================================================
// Strategies
// =============================================================================

/// A small pool of names so that customers repeat
fn arb_customer() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Ann", "Ben", "Cy", "Dee", "Eve", "ann", "Fay "])
        .prop_map(str::to_string)
}

/// Sales in cents, including returns and zero
fn arb_sales() -> impl Strategy<Value = Decimal> {
    (-50_000i64..=500_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..1_500).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Days::new(offset)
    })
}

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (arb_customer(), 0u32..10_000, arb_date(), arb_sales()).prop_map(|(name, id, date, sales)| {
        Transaction::new(name, format!("ORD-{}", id), Some(date), sales)
    })
}

fn arb_transactions() -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(arb_transaction(), 1..60)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn segmentation_is_deterministic(transactions in arb_transactions()) {
        prop_assert_eq!(compute_segments(&transactions), compute_segments(&transactions));
    }

    #[test]
    fn every_customer_is_covered(transactions in arb_transactions()) {
        let report = compute_segments(&transactions).unwrap();
        let expected: BTreeSet<&str> =
            transactions.iter().map(|t| t.customer_name.as_str()).collect();
        let actual: BTreeSet<&str> = report.customers.keys().map(String::as_str).collect();
        prop_assert_eq!(actual, expected);
        prop_assert!(report.undated.is_empty());
    }

    #[test]
    fn aggregates_match_hand_totals(transactions in arb_transactions()) {
        let report = compute_segments(&transactions).unwrap();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
        for tx in &transactions {
            *counts.entry(&tx.customer_name).or_default() += 1;
            *sums.entry(&tx.customer_name).or_default() += tx.sales;
        }

        for (name, customer) in &report.customers {
            prop_assert_eq!(customer.frequency, counts[name.as_str()]);
            prop_assert_eq!(customer.monetary, sums[name.as_str()]);
            prop_assert!(customer.frequency >= 1);
        }
    }

    #[test]
    fn recency_is_non_negative(transactions in arb_transactions()) {
        let report = compute_segments(&transactions).unwrap();
        let latest = transactions.iter().filter_map(|t| t.order_date).max().unwrap();
        prop_assert_eq!(report.snapshot, latest.succ_opt());

        for customer in report.customers.values() {
            prop_assert!(customer.recency_days >= 1);
        }
    }

    #[test]
    fn tiers_follow_quartiles(transactions in arb_transactions()) {
        let report = compute_segments(&transactions).unwrap();
        let quartiles = report.quartiles.unwrap();
        prop_assert!(quartiles.p25 <= quartiles.p75);

        for customer in report.customers.values() {
            let expected = if customer.monetary >= quartiles.p75 {
                Segment::Gold
            } else if customer.monetary <= quartiles.p25 {
                Segment::Bronze
            } else {
                Segment::Silver
            };
            prop_assert_eq!(customer.segment, expected);
        }

        // Gold and Bronze only overlap in value when the boundaries coincide
        if quartiles.p25 < quartiles.p75 {
            let gold_min = report.customers.values()
                .filter(|c| c.segment == Segment::Gold)
                .map(|c| c.monetary)
                .min();
            let bronze_max = report.customers.values()
                .filter(|c| c.segment == Segment::Bronze)
                .map(|c| c.monetary)
                .max();
            if let (Some(gold), Some(bronze)) = (gold_min, bronze_max) {
                prop_assert!(gold > bronze);
            }
        }
    }

    #[test]
    fn single_customer_is_gold(
        sales in prop::collection::vec(arb_sales(), 1..10),
        date in arb_date(),
    ) {
        let transactions: Vec<Transaction> = sales
            .into_iter()
            .enumerate()
            .map(|(i, amount)| Transaction::new("Solo", i.to_string(), Some(date), amount))
            .collect();
        let report = compute_segments(&transactions).unwrap();
        prop_assert_eq!(report.customers.len(), 1);
        prop_assert_eq!(report.customers["Solo"].segment, Segment::Gold);
    }
}
