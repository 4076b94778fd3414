//! Property tests for normal-balance conventions.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::NormalBalance;

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Debit-normal and credit-normal changes are exact negations.
    #[test]
    fn prop_normal_sides_are_mirrored(debit in amount(), credit in amount()) {
        let debit_side = NormalBalance::Debit.balance_change(debit, credit);
        let credit_side = NormalBalance::Credit.balance_change(debit, credit);
        prop_assert_eq!(debit_side, -credit_side);
    }

    /// A posting and its swapped counterpart cancel out.
    #[test]
    fn prop_swapped_posting_cancels(debit in amount(), credit in amount()) {
        for normal in [NormalBalance::Debit, NormalBalance::Credit] {
            let forward = normal.balance_change(debit, credit);
            let backward = normal.balance_change(credit, debit);
            prop_assert_eq!(forward + backward, Decimal::ZERO);
        }
    }

    /// The checked variant agrees with the unchecked one for ledger-sized amounts.
    #[test]
    fn prop_checked_matches_unchecked(debit in amount(), credit in amount()) {
        for normal in [NormalBalance::Debit, NormalBalance::Credit] {
            prop_assert_eq!(
                normal.checked_balance_change(debit, credit),
                Some(normal.balance_change(debit, credit))
            );
        }
    }
}
