//! Bookkeeper errors and their boundary form.

use ledgerwise_core::chart::ChartError;
use ledgerwise_core::currency::CurrencyError;
use ledgerwise_core::document::DocumentError;
use ledgerwise_core::inventory::InventoryError;
use ledgerwise_core::ledger::LedgerError;
use ledgerwise_core::reports::ConsistencyError;
use ledgerwise_shared::types::DocumentId;
use ledgerwise_shared::{AppError, ErrorKind};
use ledgerwise_store::SettingsError;
use thiserror::Error;

use crate::source::SourceError;

/// Any failure of a bookkeeping operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookkeeperError {
    /// The document source does not know the document.
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// The document source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Chart of accounts error.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Posting error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Document translation error.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Stock error.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Rate or conversion error.
    #[error(transparent)]
    Currency(#[from] CurrencyError),

    /// Audit finding.
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// Settings error.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl BookkeeperError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::Source(SourceError::Unavailable(_)) => "SOURCE_UNAVAILABLE",
            Self::Source(SourceError::Malformed { .. }) => "MALFORMED_DOCUMENT",
            Self::Chart(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Document(e) => e.error_code(),
            Self::Inventory(e) => e.error_code(),
            Self::Currency(e) => e.error_code(),
            Self::Consistency(e) => e.error_code(),
            Self::Settings(e) => e.error_code(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::DocumentNotFound(_) => ErrorKind::NotFound,
            Self::Source(SourceError::Unavailable(_)) => ErrorKind::Internal,
            Self::Source(SourceError::Malformed { .. }) => ErrorKind::Validation,
            Self::Chart(e) => e.kind(),
            Self::Ledger(e) => e.kind(),
            Self::Document(e) => e.kind(),
            Self::Inventory(e) => e.kind(),
            Self::Currency(e) => e.kind(),
            Self::Consistency(e) => e.kind(),
            Self::Settings(e) => e.kind(),
        }
    }

    /// Conflicts and source outages are worth another attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Source(SourceError::Unavailable(_))) || self.kind().is_retryable()
    }
}

impl From<BookkeeperError> for AppError {
    fn from(err: BookkeeperError) -> Self {
        Self::new(err.kind(), err.error_code(), err.to_string())
    }
}
