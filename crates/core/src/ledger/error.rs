//! Ledger error types for validation and state errors.
//!
//! Validation errors are raised before any mutation; concurrency errors ask
//! the caller to retry the whole operation.

use ledgerwise_shared::ErrorKind;
use ledgerwise_shared::types::{AccountId, JournalEntryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a journal line is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineViolation {
    /// Debit and credit are both zero.
    ZeroAmount,
    /// Debit or credit is negative.
    NegativeAmount,
    /// Debit and credit are both non-zero.
    BothSides,
    /// Amount has digits below the minor unit.
    ExcessPrecision {
        /// Configured minor-unit precision.
        precision: u32,
    },
}

impl std::fmt::Display for LineViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroAmount => f.write_str("debit and credit are both zero"),
            Self::NegativeAmount => f.write_str("amounts must not be negative"),
            Self::BothSides => f.write_str("exactly one of debit or credit may be non-zero"),
            Self::ExcessPrecision { precision } => {
                write!(f, "amount has more than {precision} decimal places")
            }
        }
    }
}

/// Why an account cannot receive postings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotPostableReason {
    /// The account does not exist.
    Missing,
    /// The account has children.
    HasChildren,
}

impl std::fmt::Display for NotPostableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("account does not exist"),
            Self::HasChildren => f.write_str("account is not a leaf"),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines, got {count}")]
    InsufficientLines {
        /// Number of lines supplied.
        count: usize,
    },

    /// A line violates the debit/credit rules.
    #[error("Line {line} is invalid: {violation}")]
    InvalidLine {
        /// Zero-based line index.
        line: usize,
        /// The violated rule.
        violation: LineViolation,
    },

    /// Entry is not balanced (debits != credits).
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// A referenced account is missing or not a leaf.
    #[error("Account {account_id} cannot receive postings: {reason}")]
    AccountNotPostable {
        /// The account ID.
        account_id: AccountId,
        /// Why it is not postable.
        reason: NotPostableReason,
    },

    /// The idempotency key is blank.
    #[error("Idempotency key must not be blank")]
    BlankIdempotencyKey,

    /// The idempotency key was already used for a different entry.
    #[error("Idempotency key {0:?} was already used for a different entry")]
    IdempotencyKeyReused(String),

    // ========== Not Found ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(JournalEntryId),

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry: {0}")]
    ConcurrencyConflict(String),

    // ========== Internal Errors ==========
    /// Balance arithmetic overflowed.
    #[error("Balance overflow on account {0}")]
    BalanceOverflow(AccountId),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines { .. } => "INSUFFICIENT_LINES",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::AccountNotPostable { .. } => "ACCOUNT_NOT_POSTABLE",
            Self::BlankIdempotencyKey => "BLANK_IDEMPOTENCY_KEY",
            Self::IdempotencyKeyReused(_) => "IDEMPOTENCY_KEY_REUSED",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InsufficientLines { .. }
            | Self::InvalidLine { .. }
            | Self::UnbalancedEntry { .. }
            | Self::AccountNotPostable { .. }
            | Self::BlankIdempotencyKey
            | Self::IdempotencyKeyReused(_) => ErrorKind::Validation,
            Self::EntryNotFound(_) => ErrorKind::NotFound,
            Self::ConcurrencyConflict(_) => ErrorKind::Conflict,
            Self::BalanceOverflow(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
