//! Account balance calculations.

use chrono::NaiveDate;
use ledgerwise_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The side that increases an account's balance.
///
/// - Asset/Expense: balance += debit - credit (debit-normal)
/// - Liability/Income/Equity: balance += credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Income, Equity).
    Credit,
}

impl NormalBalance {
    /// Calculates the balance change for one posting.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }

    /// Checked variant of [`Self::balance_change`].
    #[must_use]
    pub fn checked_balance_change(self, debit: Decimal, credit: Decimal) -> Option<Decimal> {
        match self {
            Self::Debit => debit.checked_sub(credit),
            Self::Credit => credit.checked_sub(debit),
        }
    }
}

/// Account balance at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Balance date (inclusive cut-off).
    pub as_of: NaiveDate,
    /// Total debit amount.
    pub debit_total: Decimal,
    /// Total credit amount.
    pub credit_total: Decimal,
    /// Net balance under the account's normal-balance convention.
    pub balance: Decimal,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub fn new(account_id: AccountId, as_of: NaiveDate) -> Self {
        Self {
            account_id,
            as_of,
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Applies one posting whose totals are already known to fit.
    pub fn apply(&mut self, normal: NormalBalance, debit: Decimal, credit: Decimal) {
        self.debit_total += debit;
        self.credit_total += credit;
        self.balance += normal.balance_change(debit, credit);
    }

    /// Applies one posting; `None` leaves the balance untouched on overflow.
    #[must_use]
    pub fn checked_apply(
        &mut self,
        normal: NormalBalance,
        debit: Decimal,
        credit: Decimal,
    ) -> Option<()> {
        let debit_total = self.debit_total.checked_add(debit)?;
        let credit_total = self.credit_total.checked_add(credit)?;
        let balance = self
            .balance
            .checked_add(normal.checked_balance_change(debit, credit)?)?;
        self.debit_total = debit_total;
        self.credit_total = credit_total;
        self.balance = balance;
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_debit_normal_balance_change() {
        let normal = NormalBalance::Debit;
        assert_eq!(normal.balance_change(dec!(100), dec!(0)), dec!(100));
        assert_eq!(normal.balance_change(dec!(0), dec!(50)), dec!(-50));
        assert_eq!(normal.balance_change(dec!(100), dec!(30)), dec!(70));
    }

    #[test]
    fn test_credit_normal_balance_change() {
        let normal = NormalBalance::Credit;
        assert_eq!(normal.balance_change(dec!(0), dec!(100)), dec!(100));
        assert_eq!(normal.balance_change(dec!(50), dec!(0)), dec!(-50));
        assert_eq!(normal.balance_change(dec!(30), dec!(100)), dec!(70));
    }

    #[test]
    fn test_checked_balance_change_overflow() {
        assert_eq!(
            NormalBalance::Debit.checked_balance_change(Decimal::MIN, Decimal::MAX),
            None
        );
    }

    #[test]
    fn test_account_balance_apply() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let mut balance = AccountBalance::new(AccountId::new(), as_of);
        balance.apply(NormalBalance::Credit, dec!(0), dec!(1000));
        balance.apply(NormalBalance::Credit, dec!(250), dec!(0));
        assert_eq!(balance.debit_total, dec!(250));
        assert_eq!(balance.credit_total, dec!(1000));
        assert_eq!(balance.balance, dec!(750));
    }

    #[test]
    fn test_checked_apply_rejects_overflow_without_change() {
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let mut balance = AccountBalance::new(AccountId::new(), as_of);
        assert_eq!(balance.checked_apply(NormalBalance::Debit, Decimal::MAX, dec!(0)), Some(()));
        assert_eq!(balance.checked_apply(NormalBalance::Debit, dec!(1), dec!(0)), None);
        assert_eq!(balance.debit_total, Decimal::MAX);
        assert_eq!(balance.balance, Decimal::MAX);
    }
}
