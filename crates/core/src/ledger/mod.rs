//! Double-entry bookkeeping logic.
//!
//! This module implements the pure side of the journal posting engine:
//! - Journal entry, line and posting types
//! - Normal-balance sign conventions
//! - Entry validation in integer minor units
//! - Construction of reversing entries

pub mod balance;
pub mod error;
pub mod reversal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, NormalBalance};
pub use error::{LedgerError, LineViolation, NotPostableReason};
pub use reversal::build_reversal;
pub use types::{
    EntrySide, EntryTotals, JournalEntry, JournalLine, LedgerPosting, NewJournalEntry,
    PostingReceipt,
};
pub use validation::validate_entry;
