//! Property tests for the posting engine.

use std::sync::Arc;

use chrono::NaiveDate;
use ledgerwise_core::chart::{AccountType, NewAccount};
use ledgerwise_core::ledger::{JournalLine, NewJournalEntry};
use ledgerwise_shared::types::{AccountId, CurrencyCode, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::chart::ChartRegistry;
use crate::consistency::ConsistencyChecker;
use crate::journal::PostingEngine;

const ACCOUNTS: [(&str, AccountType); 4] = [
    ("1001", AccountType::Asset),
    ("2000", AccountType::Liability),
    ("4001", AccountType::Income),
    ("5001", AccountType::Expense),
];

fn engine() -> (Arc<PostingEngine>, Vec<AccountId>) {
    let chart = Arc::new(ChartRegistry::new());
    let ids = ACCOUNTS
        .iter()
        .map(|&(code, account_type)| {
            chart
                .create_account(NewAccount::root(code, code, account_type))
                .unwrap()
                .id
        })
        .collect();
    (Arc::new(PostingEngine::new(chart, 2)), ids)
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
}

/// (debit account, credit account, amount in cents, day of month)
fn transfer() -> impl Strategy<Value = (usize, usize, i64, u32)> {
    (0..ACCOUNTS.len(), 1..ACCOUNTS.len(), 1i64..10_000_000i64, 1u32..=28)
        .prop_map(|(debit, offset, cents, day)| (debit, (debit + offset) % ACCOUNTS.len(), cents, day))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Maintained balances agree with a recomputation at every cut-off.
    #[test]
    fn prop_maintained_balances_match_postings(
        transfers in prop::collection::vec(transfer(), 1..30),
        cut_off in 1u32..=28,
    ) {
        let (engine, ids) = engine();
        for (n, &(debit, credit, cents, day)) in transfers.iter().enumerate() {
            let amount = Decimal::new(cents, 2);
            let entry = NewJournalEntry::new(
                date(day),
                "transfer",
                UserId::new(),
                vec![JournalLine::debit(ids[debit], amount), JournalLine::credit(ids[credit], amount)],
            );
            engine.post(entry, &format!("prop-{n}")).unwrap();
        }

        let checker = ConsistencyChecker::new(Arc::clone(&engine), CurrencyCode::new("INR").unwrap());
        let report = checker.verify(date(cut_off));
        prop_assert!(report.is_ok());

        let trial = checker.trial_balance(date(cut_off)).unwrap();
        prop_assert!(trial.totals.is_balanced);
        prop_assert_eq!(trial.totals.total_debit, trial.totals.total_credit);
    }

    /// Reversing every entry returns all balances to zero.
    #[test]
    fn prop_reversals_net_to_zero(transfers in prop::collection::vec(transfer(), 1..15)) {
        let (engine, ids) = engine();
        let mut posted = Vec::new();
        for (n, &(debit, credit, cents, day)) in transfers.iter().enumerate() {
            let amount = Decimal::new(cents, 2);
            let entry = NewJournalEntry::new(
                date(day),
                "transfer",
                UserId::new(),
                vec![JournalLine::debit(ids[debit], amount), JournalLine::credit(ids[credit], amount)],
            );
            posted.push(engine.post(entry, &format!("prop-{n}")).unwrap().entry.id);
        }
        for id in posted {
            engine.reverse(id, UserId::new()).unwrap();
        }

        for id in ids {
            let balance = engine.chart().balance(id, date(28)).unwrap();
            prop_assert_eq!(balance.balance, Decimal::ZERO);
        }
    }
}
