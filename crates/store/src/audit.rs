//! Background audit task.
//!
//! Rebuilds every stock balance from its movements and verifies the journal
//! without holding any lock for longer than one card copy. Runs on the tokio
//! runtime; the recomputation itself runs on rayon inside the blocking pool.

use std::sync::Arc;

use chrono::NaiveDate;
use ledgerwise_core::inventory::StockCard;
use ledgerwise_core::reports::{ConsistencyError, ConsistencyReport, StockDrift};
use rayon::prelude::*;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::consistency::ConsistencyChecker;
use crate::inventory::InventoryLedger;

/// What one audit run found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOutcome {
    /// Cut-off for the journal verification.
    pub as_of: NaiveDate,
    /// Products whose cards were rebuilt.
    pub products_checked: usize,
    /// Products whose balance disagrees with their movements.
    pub stock_drift: Vec<StockDrift>,
    /// Journal verification, unless the run was cancelled before it.
    pub ledger: Option<Result<ConsistencyReport, ConsistencyError>>,
    /// True if the run stopped early.
    pub cancelled: bool,
}

impl AuditOutcome {
    fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            products_checked: 0,
            stock_drift: Vec::new(),
            ledger: None,
            cancelled: false,
        }
    }

    /// True if the run completed and found nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.stock_drift.is_empty() && matches!(self.ledger, Some(Ok(_)))
    }

    /// The stock findings as an error, if any.
    #[must_use]
    pub fn stock_error(&self) -> Option<ConsistencyError> {
        (!self.stock_drift.is_empty()).then(|| ConsistencyError::StockDrift(self.stock_drift.clone()))
    }
}

/// Cancellable background audit.
#[derive(Debug, Clone)]
pub struct AuditTask {
    inventory: Arc<InventoryLedger>,
    checker: ConsistencyChecker,
    cancel: CancellationToken,
}

impl AuditTask {
    /// Creates a task with its own cancellation token.
    #[must_use]
    pub fn new(inventory: Arc<InventoryLedger>, checker: ConsistencyChecker) -> Self {
        Self {
            inventory,
            checker,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops every run of this task.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Starts a run on the current runtime.
    #[must_use]
    pub fn spawn(&self, as_of: NaiveDate) -> JoinHandle<AuditOutcome> {
        let task = self.clone();
        tokio::spawn(async move { task.run(as_of).await })
    }

    /// Runs one audit to completion or cancellation.
    pub async fn run(&self, as_of: NaiveDate) -> AuditOutcome {
        let mut outcome = AuditOutcome::new(as_of);
        info!(%as_of, "Audit started");

        let mut cards: Vec<StockCard> = Vec::new();
        for product_id in self.inventory.product_ids() {
            if self.cancel.is_cancelled() {
                return stopped(outcome);
            }
            if let Ok(card) = self.inventory.card(product_id) {
                let copy = card.lock().clone();
                cards.push(copy);
            }
            tokio::task::yield_now().await;
        }
        outcome.products_checked = cards.len();

        let rebuild = tokio::task::spawn_blocking(move || rebuild_stock(&cards));
        tokio::select! {
            () = self.cancel.cancelled() => return stopped(outcome),
            joined = rebuild => match joined {
                Ok(drift) => outcome.stock_drift = drift,
                Err(err) => error!(error = %err, "Stock rebuild failed"),
            },
        }
        for finding in &outcome.stock_drift {
            error!(
                product_id = %finding.product_id,
                maintained = %finding.maintained,
                recomputed = %finding.recomputed,
                "Stock balance drifted from movements"
            );
        }

        let checker = self.checker.clone();
        let verify = tokio::task::spawn_blocking(move || checker.verify(as_of));
        tokio::select! {
            () = self.cancel.cancelled() => return stopped(outcome),
            joined = verify => match joined {
                Ok(result) => outcome.ledger = Some(result),
                Err(err) => error!(error = %err, "Ledger verification failed"),
            },
        }

        info!(
            %as_of,
            products_checked = outcome.products_checked,
            stock_drift = outcome.stock_drift.len(),
            clean = outcome.is_clean(),
            "Audit finished"
        );
        outcome
    }

}

fn stopped(mut outcome: AuditOutcome) -> AuditOutcome {
    warn!(as_of = %outcome.as_of, "Audit cancelled");
    outcome.cancelled = true;
    outcome
}

fn rebuild_stock(cards: &[StockCard]) -> Vec<StockDrift> {
    let mut drift: Vec<StockDrift> = cards
        .par_iter()
        .filter_map(|card| {
            let maintained = card.balance();
            let recomputed = card.recomputed();
            (maintained != recomputed).then(|| StockDrift {
                product_id: card.product_id(),
                maintained,
                recomputed,
            })
        })
        .collect();
    drift.sort_by_key(|d| d.product_id);
    drift
}
