//! Trial balance and consistency checks.
//!
//! Everything here works on snapshots: a chart, a slice of postings and an
//! as-of date. Callers are responsible for taking a consistent snapshot.

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod props;

pub use error::ConsistencyError;
pub use service::ReportService;
pub use types::{
    BalanceDrift, ConsistencyReport, StockDrift, TrialBalanceLine, TrialBalanceReport,
    TrialBalanceTotals,
};
