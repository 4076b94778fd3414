//! Property tests for trial balance aggregation.

use chrono::NaiveDate;
use ledgerwise_shared::types::{CurrencyCode, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::ReportService;
use crate::chart::{AccountType, ChartOfAccounts, NewAccount};
use crate::ledger::{JournalEntry, JournalLine, LedgerPosting, NewJournalEntry};

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any sequence of balanced entries yields a balanced trial balance at every cut-off,
    /// and the per-account balances sum to zero under a debit-positive view.
    #[test]
    fn prop_balanced_entries_give_balanced_trial_balance(
        entries in prop::collection::vec((0usize..4, 0usize..4, amount(), 1u32..28), 1..40),
        cut_off in 1u32..28,
    ) {
        let mut chart = ChartOfAccounts::new();
        let types = [AccountType::Asset, AccountType::Liability, AccountType::Income, AccountType::Expense];
        let ids: Vec<_> = types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                chart
                    .create_account(NewAccount::root(format!("{}", 1000 + i), format!("A{i}"), *t), |_| false)
                    .unwrap()
                    .id
            })
            .collect();

        let mut postings: Vec<LedgerPosting> = Vec::new();
        for (seq, (from, to, value, day)) in entries.into_iter().enumerate() {
            let date = NaiveDate::from_ymd_opt(2025, 2, day).unwrap();
            let entry = NewJournalEntry::new(
                date,
                "p",
                UserId::new(),
                vec![JournalLine::debit(ids[from], value), JournalLine::credit(ids[to], value)],
            );
            postings.extend(JournalEntry::posted(entry, seq as u64 + 1).postings());
        }

        let as_of = NaiveDate::from_ymd_opt(2025, 2, cut_off).unwrap();
        let report = ReportService::trial_balance(&chart, &postings, as_of, CurrencyCode::new("INR").unwrap())
            .unwrap();
        prop_assert!(report.totals.is_balanced);

        let net: Decimal = report
            .accounts
            .iter()
            .map(|line| line.debit_total - line.credit_total)
            .sum();
        prop_assert_eq!(net, Decimal::ZERO);
    }
}
