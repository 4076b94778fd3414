//! Property tests for entry validation.

use chrono::NaiveDate;
use ledgerwise_shared::types::{AccountId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::{LedgerError, LineViolation};
use super::types::{JournalLine, NewJournalEntry};
use super::validation::validate_entry;

fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn candidate(lines: Vec<JournalLine>) -> NewJournalEntry {
    NewJournalEntry::new(
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        "prop",
        UserId::new(),
        lines,
    )
}

fn postable(_: AccountId) -> Result<(), LedgerError> {
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any set of debits offset by a single credit of their sum validates.
    #[test]
    fn prop_split_debits_balance(amounts in prop::collection::vec(positive_amount(), 1..8)) {
        let total: Decimal = amounts.iter().copied().sum();
        let mut lines: Vec<JournalLine> = amounts
            .iter()
            .map(|a| JournalLine::debit(AccountId::new(), *a))
            .collect();
        lines.push(JournalLine::credit(AccountId::new(), total));

        let totals = validate_entry(&candidate(lines), 2, postable);
        prop_assert!(totals.is_ok());
        let totals = totals.unwrap();
        prop_assert_eq!(totals.debit, total);
        prop_assert_eq!(totals.credit, total);
    }

    /// Off by one minor unit is always rejected.
    #[test]
    fn prop_one_cent_difference_rejected(amount in positive_amount()) {
        let lines = vec![
            JournalLine::debit(AccountId::new(), amount + Decimal::new(1, 2)),
            JournalLine::credit(AccountId::new(), amount),
        ];
        let result = validate_entry(&candidate(lines), 2, postable);
        let is_unbalanced = matches!(result, Err(LedgerError::UnbalancedEntry { .. }));
        prop_assert!(is_unbalanced);
    }

    /// Negative amounts are rejected regardless of side.
    #[test]
    fn prop_negative_amount_rejected(amount in positive_amount(), debit_side in any::<bool>()) {
        let bad = if debit_side {
            JournalLine::debit(AccountId::new(), -amount)
        } else {
            JournalLine::credit(AccountId::new(), -amount)
        };
        let lines = vec![bad, JournalLine::credit(AccountId::new(), amount)];
        prop_assert_eq!(
            validate_entry(&candidate(lines), 2, postable),
            Err(LedgerError::InvalidLine { line: 0, violation: LineViolation::NegativeAmount })
        );
    }

    /// Zero lines are rejected wherever they appear.
    #[test]
    fn prop_zero_line_rejected(amount in positive_amount(), position in 0usize..3) {
        let mut lines = vec![
            JournalLine::debit(AccountId::new(), amount),
            JournalLine::credit(AccountId::new(), amount),
        ];
        lines.insert(position, JournalLine::debit(AccountId::new(), Decimal::ZERO));
        prop_assert_eq!(
            validate_entry(&candidate(lines), 2, postable),
            Err(LedgerError::InvalidLine { line: position, violation: LineViolation::ZeroAmount })
        );
    }
}
