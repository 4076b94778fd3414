//! The exposed bookkeeping operations.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use ledgerwise_core::currency::ForexTransaction;
use ledgerwise_core::document::{Document, DocumentTranslator, PostingAccountIds};
use ledgerwise_core::inventory::StockMovement;
use ledgerwise_core::ledger::{JournalEntry, NewJournalEntry, PostingReceipt};
use ledgerwise_core::reports::{ConsistencyReport, TrialBalanceReport};
use ledgerwise_shared::LedgerSettings;
use ledgerwise_shared::types::{
    AccountId, CurrencyCode, DocumentId, JournalEntryId, Money, ProductId, UserId,
};
use ledgerwise_store::{
    AuditTask, ChartRegistry, ConsistencyChecker, InventoryLedger, PostingEngine, SettingsStore,
    ValuationService,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::BookkeeperError;
use crate::source::DocumentSource;

/// Result of posting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPosting {
    /// Source document.
    pub document_id: DocumentId,
    /// Journal entry; `None` for stock adjustments.
    pub journal_entry_id: Option<JournalEntryId>,
    /// Stock movements applied with the entry.
    pub stock_movements: Vec<StockMovement>,
    /// Forex record for foreign-currency documents.
    pub forex: Option<ForexTransaction>,
    /// True if the document had already been posted.
    pub replayed: bool,
}

type PostingSlot = Arc<Mutex<Option<DocumentPosting>>>;

/// One ledger instance: its settings, stores and document source.
pub struct Bookkeeper {
    settings: Arc<SettingsStore>,
    chart: Arc<ChartRegistry>,
    engine: Arc<PostingEngine>,
    valuation: Arc<ValuationService>,
    inventory: Arc<InventoryLedger>,
    checker: ConsistencyChecker,
    source: Arc<dyn DocumentSource>,
    /// One slot per posted document. Failed posts remove their slot.
    documents: DashMap<DocumentId, PostingSlot>,
}

impl std::fmt::Debug for Bookkeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bookkeeper")
            .field("home_currency", &self.home_currency())
            .field("commit_sequence", &self.engine.commit_sequence())
            .field("documents", &self.documents.len())
            .finish_non_exhaustive()
    }
}

impl Bookkeeper {
    /// Builds empty stores for `settings`.
    ///
    /// # Errors
    ///
    /// `Settings` if the settings fail validation.
    pub fn new(
        settings: LedgerSettings,
        source: Arc<dyn DocumentSource>,
    ) -> Result<Self, BookkeeperError> {
        let home = settings.home_currency.clone();
        let precision = settings.precision;
        let backorders = settings.inventory.allow_backorders_by_default;
        let settings = Arc::new(SettingsStore::new(settings)?);

        let chart = Arc::new(ChartRegistry::new());
        let engine = Arc::new(PostingEngine::new(Arc::clone(&chart), precision));
        let checker = ConsistencyChecker::new(Arc::clone(&engine), home.clone());
        info!(home_currency = %home, precision, "Bookkeeper ready");
        Ok(Self {
            settings,
            chart,
            engine,
            valuation: Arc::new(ValuationService::new(home, precision)),
            inventory: Arc::new(InventoryLedger::new(backorders)),
            checker,
            source,
            documents: DashMap::new(),
        })
    }

    /// Settings revisions.
    #[must_use]
    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Chart of accounts.
    #[must_use]
    pub fn chart(&self) -> &Arc<ChartRegistry> {
        &self.chart
    }

    /// Posting engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<PostingEngine> {
        &self.engine
    }

    /// Rates and forex records.
    #[must_use]
    pub fn valuation(&self) -> &Arc<ValuationService> {
        &self.valuation
    }

    /// Stock ledger.
    #[must_use]
    pub fn inventory(&self) -> &Arc<InventoryLedger> {
        &self.inventory
    }

    /// Document source.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn DocumentSource> {
        &self.source
    }

    /// Background audit over this ledger.
    #[must_use]
    pub fn audit_task(&self) -> AuditTask {
        AuditTask::new(Arc::clone(&self.inventory), self.checker.clone())
    }

    /// Home currency.
    #[must_use]
    pub fn home_currency(&self) -> CurrencyCode {
        self.valuation.home_currency()
    }

    /// Fetches a document, derives its ledger effects and commits them.
    ///
    /// The journal entry and stock movements commit together; on any error
    /// neither is visible. Posting the same document again returns the first
    /// result with `replayed = true`. A document that failed to post leaves
    /// nothing behind and may be posted again once corrected.
    ///
    /// # Errors
    ///
    /// `DocumentNotFound`, `Source`, `Document`, `Ledger` or `Inventory`.
    pub async fn derive_and_post(
        &self,
        document_id: DocumentId,
    ) -> Result<DocumentPosting, BookkeeperError> {
        loop {
            let slot = Arc::clone(self.documents.entry(document_id).or_default().value());
            let mut guard = slot.lock().await;
            // A failed post may have evicted this slot while we waited on it.
            let current = self
                .documents
                .get(&document_id)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &slot));
            if !current {
                continue;
            }

            if let Some(posting) = guard.as_ref() {
                warn!(document_id = %document_id, "Document already posted");
                return Ok(DocumentPosting {
                    replayed: true,
                    ..posting.clone()
                });
            }

            return match self.fetch_and_commit(document_id).await {
                Ok(posting) => {
                    *guard = Some(posting.clone());
                    Ok(posting)
                }
                Err(err) => {
                    self.documents
                        .remove_if(&document_id, |_, held| Arc::ptr_eq(held, &slot));
                    Err(err)
                }
            };
        }
    }

    async fn fetch_and_commit(
        &self,
        document_id: DocumentId,
    ) -> Result<DocumentPosting, BookkeeperError> {
        let document = self
            .source
            .fetch(document_id)
            .await?
            .ok_or(BookkeeperError::DocumentNotFound(document_id))?;

        let posting = self.commit_document(&document).inspect_err(|err| {
            warn!(
                document_id = %document_id,
                number = %document.number,
                code = err.error_code(),
                error = %err,
                "Document rejected"
            );
        })?;
        info!(
            document_id = %document_id,
            number = %document.number,
            kind = %document.kind(),
            journal_entry_id = ?posting.journal_entry_id,
            movements = posting.stock_movements.len(),
            "Document posted"
        );
        Ok(posting)
    }

    fn commit_document(
        &self,
        document: &Document,
    ) -> Result<DocumentPosting, BookkeeperError> {
        let codes = self.settings.current().settings.posting_accounts;
        let accounts = PostingAccountIds::resolve(&codes, &self.chart.snapshot())?;
        let translator = DocumentTranslator::new(self.engine.precision(), accounts);
        let derivation = {
            let rates = self.valuation.rates();
            translator.derive(document, &*rates)?
        };

        let key = format!("document:{}", document.id);
        let entry = derivation.entry;
        let (receipt, stock_movements) =
            self.inventory
                .apply_batch_with(&derivation.movements, || -> Result<_, BookkeeperError> {
                    entry
                        .map(|entry| self.engine.post(entry, &key))
                        .transpose()
                        .map_err(BookkeeperError::from)
                })?;

        Ok(DocumentPosting {
            document_id: document.id,
            journal_entry_id: receipt.map(|r| r.entry.id),
            stock_movements,
            forex: derivation.forex.map(|record| self.valuation.store_forex(record)),
            replayed: false,
        })
    }

    /// Posts a manual journal entry.
    ///
    /// # Errors
    ///
    /// Any `LedgerError`.
    pub fn post_entry(
        &self,
        entry: NewJournalEntry,
        idempotency_key: &str,
    ) -> Result<PostingReceipt, BookkeeperError> {
        Ok(self.engine.post(entry, idempotency_key)?)
    }

    /// Posts the reversal of an entry.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, or any posting error.
    pub fn reverse_entry(
        &self,
        entry_id: JournalEntryId,
        reversed_by: UserId,
    ) -> Result<JournalEntry, BookkeeperError> {
        Ok(self.engine.reverse(entry_id, reversed_by)?.entry)
    }

    /// Balance of an account as of a date, in the home currency.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`.
    pub fn account_balance(
        &self,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<Money, BookkeeperError> {
        let balance = self.chart.balance(account_id, as_of)?;
        Ok(Money::new(balance.balance, self.home_currency()))
    }

    /// Trial balance as of a date.
    ///
    /// # Errors
    ///
    /// `Consistency` if the totals overflow.
    pub fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalanceReport, BookkeeperError> {
        Ok(self.checker.trial_balance(as_of)?)
    }

    /// Current stock balance of a product.
    ///
    /// # Errors
    ///
    /// `ProductNotFound`.
    pub fn stock_balance(&self, product_id: ProductId) -> Result<Decimal, BookkeeperError> {
        Ok(self.inventory.stock_balance(product_id)?)
    }

    /// Converts money at the rates effective at `as_of`.
    ///
    /// # Errors
    ///
    /// `NoRateAvailable` or `ConversionOverflow`.
    pub fn convert_amount(
        &self,
        amount: &Money,
        to: &CurrencyCode,
        as_of: DateTime<Utc>,
    ) -> Result<Money, BookkeeperError> {
        Ok(self.valuation.convert_money(amount, to, as_of)?)
    }

    /// Verifies the ledger as of a date.
    ///
    /// # Errors
    ///
    /// `Consistency` with the finding.
    pub fn verify(&self, as_of: NaiveDate) -> Result<ConsistencyReport, BookkeeperError> {
        Ok(self.checker.verify(as_of)?)
    }
}
