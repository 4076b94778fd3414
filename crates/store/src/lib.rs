//! Stateful, concurrency-safe bookkeeping components for Ledgerwise.
//!
//! Every component here wraps pure rules from `ledgerwise-core` with the
//! locking needed to keep them correct under concurrent callers:
//!
//! - `chart` - chart of accounts registry and per-account balance state
//! - `journal` - posting engine with an append-only commit log
//! - `valuation` - rate history and forex records
//! - `inventory` - per-product stock ledgers
//! - `consistency` - trial balance and drift checks on stable snapshots
//! - `settings` - revisioned ledger settings
//! - `audit` - cancellable background recomputation
//!
//! Lock order, outermost first: product stock cards, idempotency slot, chart
//! (shared), account states in ascending id order, commit log.

pub mod audit;
pub mod chart;
pub mod consistency;
pub mod inventory;
pub mod journal;
pub mod settings;
pub mod valuation;

#[cfg(test)]
mod journal_props;

pub use audit::{AuditOutcome, AuditTask};
pub use chart::ChartRegistry;
pub use consistency::ConsistencyChecker;
pub use inventory::InventoryLedger;
pub use journal::{JournalSnapshot, PostingEngine};
pub use settings::{SettingsError, SettingsRevision, SettingsStore};
pub use valuation::ValuationService;
