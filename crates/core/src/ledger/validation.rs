//! Journal entry validation.
//!
//! Pure checks with no side effects. Balance is compared in integer minor
//! units at the configured precision.

use ledgerwise_shared::types::{AccountId, to_minor_units};
use rust_decimal::Decimal;

use super::error::{LedgerError, LineViolation};
use super::types::{EntryTotals, JournalLine, NewJournalEntry};

/// Validates a candidate entry.
///
/// Checks, in order:
/// 1. at least two lines
/// 2. every line has exactly one positive side at the configured precision
/// 3. every account is postable (existing leaf), via `postable`
/// 4. debit total equals credit total in minor units
///
/// # Errors
///
/// Returns the first violated rule as a `LedgerError`.
pub fn validate_entry<A>(
    entry: &NewJournalEntry,
    precision: u32,
    postable: A,
) -> Result<EntryTotals, LedgerError>
where
    A: Fn(AccountId) -> Result<(), LedgerError>,
{
    if entry.lines.len() < 2 {
        return Err(LedgerError::InsufficientLines {
            count: entry.lines.len(),
        });
    }

    let mut debit_minor: i128 = 0;
    let mut credit_minor: i128 = 0;
    for (index, line) in entry.lines.iter().enumerate() {
        let (debit, credit) = line_minor_units(line, precision)
            .map_err(|violation| LedgerError::InvalidLine {
                line: index,
                violation,
            })?;
        debit_minor = debit_minor
            .checked_add(debit)
            .ok_or(LedgerError::BalanceOverflow(line.account_id))?;
        credit_minor = credit_minor
            .checked_add(credit)
            .ok_or(LedgerError::BalanceOverflow(line.account_id))?;
    }

    for account in entry.touched_accounts() {
        postable(account)?;
    }

    let totals = EntryTotals::from_lines(&entry.lines);
    if debit_minor != credit_minor {
        return Err(LedgerError::UnbalancedEntry {
            debit: totals.debit,
            credit: totals.credit,
        });
    }
    Ok(totals)
}

fn line_minor_units(line: &JournalLine, precision: u32) -> Result<(i128, i128), LineViolation> {
    if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
        return Err(LineViolation::NegativeAmount);
    }
    match (line.debit.is_zero(), line.credit.is_zero()) {
        (true, true) => return Err(LineViolation::ZeroAmount),
        (false, false) => return Err(LineViolation::BothSides),
        _ => {}
    }
    let debit = to_minor_units(line.debit, precision)
        .ok_or(LineViolation::ExcessPrecision { precision })?;
    let credit = to_minor_units(line.credit, precision)
        .ok_or(LineViolation::ExcessPrecision { precision })?;
    Ok((debit, credit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::error::NotPostableReason;
    use chrono::NaiveDate;
    use ledgerwise_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn entry(lines: Vec<JournalLine>) -> NewJournalEntry {
        NewJournalEntry::new(
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            "test",
            UserId::new(),
            lines,
        )
    }

    fn all_postable(_: AccountId) -> Result<(), LedgerError> {
        Ok(())
    }

    #[test]
    fn test_balanced_entry_passes() {
        let candidate = entry(vec![
            JournalLine::debit(AccountId::new(), dec!(1000)),
            JournalLine::credit(AccountId::new(), dec!(1000)),
        ]);
        let totals = validate_entry(&candidate, 2, all_postable).unwrap();
        assert_eq!(totals.debit, dec!(1000));
        assert!(totals.is_balanced());
    }

    #[test]
    fn test_single_line_rejected() {
        let candidate = entry(vec![JournalLine::debit(AccountId::new(), dec!(10))]);
        assert_eq!(
            validate_entry(&candidate, 2, all_postable),
            Err(LedgerError::InsufficientLines { count: 1 })
        );
    }

    #[test]
    fn test_unbalanced_rejected() {
        let candidate = entry(vec![
            JournalLine::debit(AccountId::new(), dec!(100.00)),
            JournalLine::credit(AccountId::new(), dec!(99.99)),
        ]);
        assert_eq!(
            validate_entry(&candidate, 2, all_postable),
            Err(LedgerError::UnbalancedEntry {
                debit: dec!(100.00),
                credit: dec!(99.99),
            })
        );
    }

    #[test]
    fn test_line_with_both_sides_rejected() {
        let mut both = JournalLine::debit(AccountId::new(), dec!(5));
        both.credit = dec!(5);
        let candidate = entry(vec![both, JournalLine::credit(AccountId::new(), dec!(0.01))]);
        assert_eq!(
            validate_entry(&candidate, 2, all_postable),
            Err(LedgerError::InvalidLine {
                line: 0,
                violation: LineViolation::BothSides,
            })
        );
    }

    #[test]
    fn test_sub_minor_unit_amount_rejected() {
        let candidate = entry(vec![
            JournalLine::debit(AccountId::new(), dec!(10.005)),
            JournalLine::credit(AccountId::new(), dec!(10.005)),
        ]);
        assert_eq!(
            validate_entry(&candidate, 2, all_postable),
            Err(LedgerError::InvalidLine {
                line: 0,
                violation: LineViolation::ExcessPrecision { precision: 2 },
            })
        );
        assert!(validate_entry(&candidate, 3, all_postable).is_ok());
    }

    #[test]
    fn test_not_postable_account_rejected() {
        let parent = AccountId::new();
        let candidate = entry(vec![
            JournalLine::debit(parent, dec!(10)),
            JournalLine::credit(AccountId::new(), dec!(10)),
        ]);
        let result = validate_entry(&candidate, 2, |id| {
            if id == parent {
                Err(LedgerError::AccountNotPostable {
                    account_id: id,
                    reason: NotPostableReason::HasChildren,
                })
            } else {
                Ok(())
            }
        });
        assert_eq!(
            result,
            Err(LedgerError::AccountNotPostable {
                account_id: parent,
                reason: NotPostableReason::HasChildren,
            })
        );
    }

    #[test]
    fn test_trailing_zero_scale_is_not_excess_precision() {
        let candidate = entry(vec![
            JournalLine::debit(AccountId::new(), dec!(10.5000)),
            JournalLine::credit(AccountId::new(), dec!(10.50)),
        ]);
        assert!(validate_entry(&candidate, 2, all_postable).is_ok());
    }
}
