//! Chart of accounts error types.

use ledgerwise_shared::ErrorKind;
use ledgerwise_shared::types::AccountId;
use thiserror::Error;

/// Errors raised by chart-of-accounts maintenance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    /// Another account already uses the code.
    #[error("Account code already in use: {0}")]
    DuplicateCode(String),

    /// The requested parent does not exist.
    #[error("Parent account not found: {0}")]
    UnknownParent(AccountId),

    /// The change would make an account its own ancestor.
    #[error("Placing account {account} under {parent} would create a cycle")]
    CycleDetected {
        /// Account being placed.
        account: AccountId,
        /// Requested parent.
        parent: AccountId,
    },

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Code or name is blank.
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// The parent already has postings and cannot gain children.
    #[error("Account {0} has posting history and cannot gain children")]
    ParentHasPostings(AccountId),

    /// The account has postings and cannot be deleted.
    #[error("Account {0} has posting history and cannot be deleted")]
    HasPostings(AccountId),

    /// The account still has children.
    #[error("Account {0} still has child accounts")]
    HasChildren(AccountId),
}

impl ChartError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::UnknownParent(_) => "UNKNOWN_PARENT",
            Self::CycleDetected { .. } => "CYCLE_DETECTED",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InvalidAccount(_) => "INVALID_ACCOUNT",
            Self::ParentHasPostings(_) => "PARENT_HAS_POSTINGS",
            Self::HasPostings(_) => "ACCOUNT_HAS_POSTINGS",
            Self::HasChildren(_) => "ACCOUNT_HAS_CHILDREN",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownParent(_) | Self::AccountNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}
