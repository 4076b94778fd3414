//! Consistency checker.
//!
//! Reads never block writers for longer than one snapshot copy. Findings are
//! logged and returned; nothing is corrected.

use std::sync::Arc;

use chrono::NaiveDate;
use ledgerwise_core::reports::{
    ConsistencyError, ConsistencyReport, ReportService, TrialBalanceReport,
};
use ledgerwise_shared::types::{AccountId, CurrencyCode};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::chart::ChartRegistry;
use crate::journal::{JournalSnapshot, PostingEngine};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Trial balance and invariant verification over a consistent snapshot.
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    chart: Arc<ChartRegistry>,
    engine: Arc<PostingEngine>,
    currency: CurrencyCode,
    max_attempts: u32,
}

impl ConsistencyChecker {
    /// Creates a checker reporting in `currency`.
    #[must_use]
    pub fn new(engine: Arc<PostingEngine>, currency: CurrencyCode) -> Self {
        Self {
            chart: Arc::clone(engine.chart()),
            engine,
            currency,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides how many snapshots `verify` may take before giving up.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Per-account totals of postings dated on or before `as_of`.
    ///
    /// # Errors
    ///
    /// `BalanceOverflow` if the totals do not fit.
    pub fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalanceReport, ConsistencyError> {
        let snapshot = self.engine.postings_snapshot();
        self.report(&snapshot, as_of)
    }

    /// Verifies the trial balance and every maintained account balance.
    ///
    /// # Errors
    ///
    /// `Unbalanced`, `BalanceDrift`, `BalanceOverflow`, or `SnapshotUnstable`
    /// when writers kept committing through every attempt.
    pub fn verify(&self, as_of: NaiveDate) -> Result<ConsistencyReport, ConsistencyError> {
        for attempt in 1..=self.max_attempts {
            let snapshot = self.engine.postings_snapshot();
            let Some(maintained) = self.stable_balances(&snapshot, as_of) else {
                debug!(attempt, high_water = snapshot.high_water, "Snapshot moved, retrying");
                std::thread::yield_now();
                continue;
            };

            let trial_balance = self.report(&snapshot, as_of)?;
            ReportService::check_balanced(&trial_balance).inspect_err(|err| {
                error!(error = %err, "Trial balance invariant violated");
            })?;

            let chart = self.chart.snapshot();
            let recomputed = ReportService::recompute_balances(&chart, &snapshot.postings, as_of)?;
            let accounts_checked = maintained.len();
            let drift = ReportService::find_drift(&chart, maintained, &recomputed);
            if !drift.is_empty() {
                for finding in &drift {
                    error!(
                        account_id = %finding.account_id,
                        code = %finding.code,
                        maintained = %finding.maintained,
                        recomputed = %finding.recomputed,
                        "Account balance drifted from postings"
                    );
                }
                return Err(ConsistencyError::BalanceDrift(drift));
            }

            info!(
                %as_of,
                high_water = snapshot.high_water,
                accounts_checked,
                "Ledger verified"
            );
            return Ok(ConsistencyReport {
                as_of,
                high_water: snapshot.high_water,
                accounts_checked,
                trial_balance,
            });
        }
        warn!(attempts = self.max_attempts, "No stable snapshot");
        Err(ConsistencyError::SnapshotUnstable {
            attempts: self.max_attempts,
        })
    }

    fn report(
        &self,
        snapshot: &JournalSnapshot,
        as_of: NaiveDate,
    ) -> Result<TrialBalanceReport, ConsistencyError> {
        ReportService::trial_balance(
            &self.chart.snapshot(),
            &snapshot.postings,
            as_of,
            self.currency.clone(),
        )
    }

    /// Maintained balances, or `None` if any account has applied a commit
    /// the snapshot does not contain or is missing one it does.
    fn stable_balances(
        &self,
        snapshot: &JournalSnapshot,
        as_of: NaiveDate,
    ) -> Option<Vec<(AccountId, Decimal)>> {
        let expected = snapshot.last_sequence_by_account();
        let mut balances = Vec::new();
        for account in self.chart.accounts() {
            let Some((balance, last_seq)) = self.chart.maintained(account.id, as_of) else {
                continue;
            };
            if last_seq != expected.get(&account.id).copied().unwrap_or(0) {
                return None;
            }
            balances.push((account.id, balance.balance));
        }
        Some(balances)
    }
}
