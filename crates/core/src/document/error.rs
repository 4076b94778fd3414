//! Document translation errors.

use ledgerwise_shared::ErrorKind;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::currency::CurrencyError;

/// Errors raised while translating a document. None of them leaves a ledger effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Declared total differs from the recomputed one.
    #[error("Document total {declared} does not match computed total {computed}")]
    DocumentNotBalanced {
        /// Total stated on the document.
        declared: Decimal,
        /// Sum of item amounts and taxes.
        computed: Decimal,
    },

    /// The document has no items.
    #[error("Document has no items")]
    EmptyDocument,

    /// Every amount on the document is zero.
    #[error("Document has no monetary value")]
    ZeroValue,

    /// An item is malformed.
    #[error("Item {index} is invalid: {reason}")]
    InvalidItem {
        /// Zero-based item index.
        index: usize,
        /// What is wrong.
        reason: String,
    },

    /// A header field is malformed.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A configured posting-account code is not in the chart.
    #[error("Posting account code {0:?} is not in the chart of accounts")]
    UnmappedAccount(String),

    /// Rate lookup or conversion failed.
    #[error(transparent)]
    Rate(#[from] CurrencyError),
}

impl DocumentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::DocumentNotBalanced { .. } => "DOCUMENT_NOT_BALANCED",
            Self::EmptyDocument => "EMPTY_DOCUMENT",
            Self::ZeroValue => "ZERO_VALUE_DOCUMENT",
            Self::InvalidItem { .. } => "INVALID_ITEM",
            Self::InvalidDocument(_) => "INVALID_DOCUMENT",
            Self::UnmappedAccount(_) => "UNMAPPED_ACCOUNT",
            Self::Rate(inner) => inner.error_code(),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Rate(inner) => inner.kind(),
            _ => ErrorKind::Validation,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ledgerwise_shared::types::CurrencyCode;
    use rust_decimal_macros::dec;

    #[test]
    fn test_not_balanced_message() {
        let err = DocumentError::DocumentNotBalanced {
            declared: dec!(118000),
            computed: dec!(108000),
        };
        assert_eq!(
            err.to_string(),
            "Document total 118000 does not match computed total 108000"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_rate_errors_keep_their_kind() {
        let err: DocumentError = CurrencyError::NoRateAvailable {
            currency: CurrencyCode::new("USD").unwrap(),
            as_of: Utc::now(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.error_code(), "NO_RATE_AVAILABLE");
    }
}
