//! Report generation service.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ledgerwise_shared::types::{AccountId, CurrencyCode};
use rust_decimal::Decimal;

use super::error::ConsistencyError;
use super::types::{BalanceDrift, TrialBalanceLine, TrialBalanceReport, TrialBalanceTotals};
use crate::chart::ChartOfAccounts;
use crate::ledger::{AccountBalance, LedgerPosting};

/// Stateless report builders.
pub struct ReportService;

impl ReportService {
    /// Recomputes every account's balance from postings dated on or before `as_of`.
    ///
    /// Postings against accounts missing from `chart` are ignored.
    ///
    /// # Errors
    ///
    /// `BalanceOverflow` if an account's totals do not fit.
    pub fn recompute_balances(
        chart: &ChartOfAccounts,
        postings: &[LedgerPosting],
        as_of: NaiveDate,
    ) -> Result<BTreeMap<AccountId, AccountBalance>, ConsistencyError> {
        let mut balances = BTreeMap::new();
        for posting in postings.iter().filter(|p| p.date <= as_of) {
            let Some(account) = chart.get(posting.account_id) else {
                continue;
            };
            balances
                .entry(posting.account_id)
                .or_insert_with(|| AccountBalance::new(posting.account_id, as_of))
                .checked_apply(
                    account.account_type.normal_balance(),
                    posting.debit,
                    posting.credit,
                )
                .ok_or(ConsistencyError::BalanceOverflow(posting.account_id))?;
        }
        Ok(balances)
    }

    /// Builds a trial balance from postings dated on or before `as_of`.
    ///
    /// # Errors
    ///
    /// `BalanceOverflow` if an account total or a grand total does not fit.
    pub fn trial_balance(
        chart: &ChartOfAccounts,
        postings: &[LedgerPosting],
        as_of: NaiveDate,
        currency: CurrencyCode,
    ) -> Result<TrialBalanceReport, ConsistencyError> {
        let balances = Self::recompute_balances(chart, postings, as_of)?;

        let mut accounts: Vec<TrialBalanceLine> = balances
            .values()
            .filter_map(|balance| {
                chart.get(balance.account_id).map(|account| TrialBalanceLine {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    debit_total: balance.debit_total,
                    credit_total: balance.credit_total,
                    balance: balance.balance,
                })
            })
            .collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));

        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        for line in &accounts {
            total_debit = total_debit
                .checked_add(line.debit_total)
                .ok_or(ConsistencyError::BalanceOverflow(line.account_id))?;
            total_credit = total_credit
                .checked_add(line.credit_total)
                .ok_or(ConsistencyError::BalanceOverflow(line.account_id))?;
        }

        Ok(TrialBalanceReport {
            as_of,
            currency,
            accounts,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        })
    }

    /// Fails `Unbalanced` when grand totals differ.
    ///
    /// # Errors
    ///
    /// `ConsistencyError::Unbalanced`.
    pub fn check_balanced(report: &TrialBalanceReport) -> Result<(), ConsistencyError> {
        if report.totals.is_balanced {
            Ok(())
        } else {
            Err(ConsistencyError::Unbalanced {
                as_of: report.as_of,
                debit: report.totals.total_debit,
                credit: report.totals.total_credit,
            })
        }
    }

    /// Compares maintained balances against a recomputation.
    ///
    /// Accounts absent from `recomputed` are expected to be zero.
    #[must_use]
    pub fn find_drift<I>(
        chart: &ChartOfAccounts,
        maintained: I,
        recomputed: &BTreeMap<AccountId, AccountBalance>,
    ) -> Vec<BalanceDrift>
    where
        I: IntoIterator<Item = (AccountId, Decimal)>,
    {
        maintained
            .into_iter()
            .filter_map(|(account_id, maintained)| {
                let expected = recomputed
                    .get(&account_id)
                    .map_or(Decimal::ZERO, |b| b.balance);
                (expected != maintained).then(|| BalanceDrift {
                    account_id,
                    code: chart
                        .get(account_id)
                        .map(|a| a.code.clone())
                        .unwrap_or_default(),
                    maintained,
                    recomputed: expected,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{AccountType, NewAccount};
    use crate::ledger::{JournalEntry, JournalLine, NewJournalEntry};
    use ledgerwise_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn inr() -> CurrencyCode {
        CurrencyCode::new("INR").unwrap()
    }

    fn setup() -> (ChartOfAccounts, AccountId, AccountId) {
        let mut chart = ChartOfAccounts::new();
        let cash = chart
            .create_account(NewAccount::root("1001", "Cash", AccountType::Asset), |_| false)
            .unwrap()
            .id;
        let sales = chart
            .create_account(NewAccount::root("4001", "Sales", AccountType::Income), |_| false)
            .unwrap()
            .id;
        (chart, cash, sales)
    }

    fn posted(day: u32, lines: Vec<JournalLine>, seq: u64) -> Vec<LedgerPosting> {
        JournalEntry::posted(NewJournalEntry::new(date(day), "t", UserId::new(), lines), seq)
            .postings()
    }

    #[test]
    fn test_cash_sale_trial_balance() {
        let (chart, cash, sales) = setup();
        let postings = posted(
            5,
            vec![
                JournalLine::debit(cash, dec!(1000)),
                JournalLine::credit(sales, dec!(1000)),
            ],
            1,
        );
        let report = ReportService::trial_balance(&chart, &postings, date(31), inr()).unwrap();

        assert_eq!(report.accounts.len(), 2);
        assert_eq!(report.accounts[0].code, "1001");
        assert_eq!(report.accounts[0].balance, dec!(1000));
        assert_eq!(report.accounts[1].balance, dec!(1000));
        assert_eq!(report.totals.total_debit, dec!(1000));
        assert_eq!(report.totals.total_credit, dec!(1000));
        assert!(ReportService::check_balanced(&report).is_ok());
    }

    #[test]
    fn test_cut_off_excludes_later_postings() {
        let (chart, cash, sales) = setup();
        let mut postings = posted(
            5,
            vec![JournalLine::debit(cash, dec!(10)), JournalLine::credit(sales, dec!(10))],
            1,
        );
        postings.extend(posted(
            20,
            vec![JournalLine::debit(cash, dec!(5)), JournalLine::credit(sales, dec!(5))],
            2,
        ));
        let report = ReportService::trial_balance(&chart, &postings, date(10), inr()).unwrap();
        assert_eq!(report.totals.total_debit, dec!(10));
        assert!(ReportService::trial_balance(&chart, &postings, date(4), inr())
            .unwrap()
            .accounts
            .is_empty());
    }

    #[test]
    fn test_unbalanced_report_is_flagged() {
        let (chart, cash, _) = setup();
        let postings = posted(1, vec![JournalLine::debit(cash, dec!(3))], 1);
        let report = ReportService::trial_balance(&chart, &postings, date(31), inr()).unwrap();
        assert_eq!(
            ReportService::check_balanced(&report),
            Err(ConsistencyError::Unbalanced {
                as_of: date(31),
                debit: dec!(3),
                credit: dec!(0),
            })
        );
    }

    #[test]
    fn test_find_drift() {
        let (chart, cash, sales) = setup();
        let postings = posted(
            5,
            vec![JournalLine::debit(cash, dec!(10)), JournalLine::credit(sales, dec!(10))],
            1,
        );
        let recomputed = ReportService::recompute_balances(&chart, &postings, date(31)).unwrap();
        assert!(ReportService::find_drift(&chart, [(cash, dec!(10)), (sales, dec!(10))], &recomputed)
            .is_empty());

        let drift = ReportService::find_drift(&chart, [(cash, dec!(11))], &recomputed);
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].code, "1001");
        assert_eq!(drift[0].recomputed, dec!(10));
    }

    #[test]
    fn test_grand_total_overflow_is_reported() {
        let (chart, cash, sales) = setup();
        let mut postings = posted(
            2,
            vec![JournalLine::debit(cash, Decimal::MAX), JournalLine::credit(sales, Decimal::MAX)],
            1,
        );
        postings.extend(posted(
            3,
            vec![JournalLine::debit(sales, dec!(1)), JournalLine::credit(cash, dec!(1))],
            2,
        ));
        assert!(matches!(
            ReportService::trial_balance(&chart, &postings, date(31), inr()),
            Err(ConsistencyError::BalanceOverflow(_))
        ));
    }
}
