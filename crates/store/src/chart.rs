//! Chart of accounts registry.
//!
//! Holds the account tree behind a reader/writer lock and one balance state
//! per account behind its own mutex. Postings hold the tree's read lock for
//! their whole commit, so leaf status cannot change under them; tree
//! mutations take the write lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use ledgerwise_core::chart::{Account, ChartError, ChartOfAccounts, NewAccount};
use ledgerwise_core::ledger::{AccountBalance, NormalBalance};
use ledgerwise_shared::types::AccountId;
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rust_decimal::Decimal;
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
struct DayTotals {
    debit: Decimal,
    credit: Decimal,
}

/// Incrementally maintained balance of one account.
///
/// Totals are bucketed per accounting date so `balance_at` can answer for any
/// cut-off without replaying postings.
#[derive(Debug)]
pub(crate) struct AccountState {
    normal: NormalBalance,
    daily: BTreeMap<NaiveDate, DayTotals>,
    debit_total: Decimal,
    credit_total: Decimal,
    posting_count: u64,
    last_seq: u64,
}

/// Checked result of adding one entry's lines to an account, not yet applied.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PendingUpdate {
    date: NaiveDate,
    day: DayTotals,
    debit_total: Decimal,
    credit_total: Decimal,
    postings: u64,
}

impl AccountState {
    fn new(normal: NormalBalance) -> Self {
        Self {
            normal,
            daily: BTreeMap::new(),
            debit_total: Decimal::ZERO,
            credit_total: Decimal::ZERO,
            posting_count: 0,
            last_seq: 0,
        }
    }

    pub(crate) fn has_postings(&self) -> bool {
        self.posting_count > 0
    }

    pub(crate) fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Returns `None` if any running total would overflow.
    pub(crate) fn prepare(
        &self,
        date: NaiveDate,
        debit: Decimal,
        credit: Decimal,
        postings: u64,
    ) -> Option<PendingUpdate> {
        let day = self.daily.get(&date).copied().unwrap_or_default();
        let update = PendingUpdate {
            date,
            day: DayTotals {
                debit: day.debit.checked_add(debit)?,
                credit: day.credit.checked_add(credit)?,
            },
            debit_total: self.debit_total.checked_add(debit)?,
            credit_total: self.credit_total.checked_add(credit)?,
            postings,
        };
        self.normal
            .checked_balance_change(update.debit_total, update.credit_total)?;
        Some(update)
    }

    pub(crate) fn commit(&mut self, update: PendingUpdate, sequence: u64) {
        self.daily.insert(update.date, update.day);
        self.debit_total = update.debit_total;
        self.credit_total = update.credit_total;
        self.posting_count += update.postings;
        self.last_seq = sequence;
    }

    pub(crate) fn balance_at(&self, account_id: AccountId, as_of: NaiveDate) -> AccountBalance {
        let mut balance = AccountBalance::new(account_id, as_of);
        let covers_all = self.daily.keys().next_back().is_none_or(|last| *last <= as_of);
        if covers_all {
            balance.apply(self.normal, self.debit_total, self.credit_total);
        } else {
            for day in self.daily.range(..=as_of).map(|(_, totals)| totals) {
                balance.apply(self.normal, day.debit, day.credit);
            }
        }
        balance
    }
}

/// Thread-safe chart of accounts.
#[derive(Debug, Default)]
pub struct ChartRegistry {
    chart: RwLock<ChartOfAccounts>,
    states: DashMap<AccountId, Arc<Mutex<AccountState>>>,
}

impl ChartRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an account.
    ///
    /// # Errors
    ///
    /// `DuplicateCode`, `UnknownParent`, `ParentHasPostings` or `InvalidAccount`.
    pub fn create_account(&self, input: NewAccount) -> Result<Account, ChartError> {
        let mut chart = self.chart.write();
        let account = chart.create_account(input, |id| self.has_postings(id))?;
        self.states.insert(
            account.id,
            Arc::new(Mutex::new(AccountState::new(
                account.account_type.normal_balance(),
            ))),
        );
        info!(account_id = %account.id, code = %account.code, account_type = %account.account_type, "Account created");
        Ok(account)
    }

    /// Re-parents an account; `None` makes it a root.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, `UnknownParent`, `CycleDetected` or `ParentHasPostings`.
    pub fn move_account(
        &self,
        id: AccountId,
        new_parent: Option<AccountId>,
    ) -> Result<Account, ChartError> {
        let mut chart = self.chart.write();
        let account = chart.move_account(id, new_parent, |candidate| self.has_postings(candidate))?;
        info!(account_id = %id, parent_id = ?new_parent, "Account moved");
        Ok(account)
    }

    /// Deletes a leaf account without posting history.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, `HasPostings` or `HasChildren`.
    pub fn delete_account(&self, id: AccountId) -> Result<Account, ChartError> {
        let mut chart = self.chart.write();
        let account = chart.remove_account(id, |candidate| self.has_postings(candidate))?;
        self.states.remove(&id);
        info!(account_id = %id, code = %account.code, "Account deleted");
        Ok(account)
    }

    /// Ancestor chain, root first, ending with the account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`.
    pub fn resolve_path(&self, id: AccountId) -> Result<Vec<Account>, ChartError> {
        self.chart.read().resolve_path(id)
    }

    /// Looks up an account by id.
    #[must_use]
    pub fn account(&self, id: AccountId) -> Option<Account> {
        self.chart.read().get(id).cloned()
    }

    /// Looks up an account by code.
    #[must_use]
    pub fn account_by_code(&self, code: &str) -> Option<Account> {
        self.chart.read().find_by_code(code).cloned()
    }

    /// All accounts, sorted by code.
    #[must_use]
    pub fn accounts(&self) -> Vec<Account> {
        self.chart.read().accounts().into_iter().cloned().collect()
    }

    /// True if the account exists and has no children.
    #[must_use]
    pub fn is_leaf(&self, id: AccountId) -> bool {
        let chart = self.chart.read();
        chart.get(id).is_some() && chart.is_leaf(id)
    }

    /// Maintained balance as of a date.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`.
    pub fn balance(&self, id: AccountId, as_of: NaiveDate) -> Result<AccountBalance, ChartError> {
        self.state(id)
            .map(|state| state.lock().balance_at(id, as_of))
            .ok_or(ChartError::AccountNotFound(id))
    }

    /// A copy of the tree.
    #[must_use]
    pub fn snapshot(&self) -> ChartOfAccounts {
        self.chart.read().clone()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, ChartOfAccounts> {
        self.chart.read()
    }

    pub(crate) fn state(&self, id: AccountId) -> Option<Arc<Mutex<AccountState>>> {
        self.states.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Maintained balance and last applied commit sequence.
    pub(crate) fn maintained(&self, id: AccountId, as_of: NaiveDate) -> Option<(AccountBalance, u64)> {
        self.state(id).map(|state| {
            let state = state.lock();
            (state.balance_at(id, as_of), state.last_seq())
        })
    }

    fn has_postings(&self, id: AccountId) -> bool {
        self.state(id).is_some_and(|state| state.lock().has_postings())
    }
}
