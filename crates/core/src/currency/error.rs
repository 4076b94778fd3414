//! Currency error types.

use chrono::{DateTime, Utc};
use ledgerwise_shared::ErrorKind;
use ledgerwise_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by rate recording and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    /// No rate is effective at or before the requested instant.
    #[error("No {currency} rate available as of {as_of}")]
    NoRateAvailable {
        /// Requested currency.
        currency: CurrencyCode,
        /// Requested instant.
        as_of: DateTime<Utc>,
    },

    /// Rates must be strictly positive.
    #[error("Rate for {currency} must be positive, got {rate}")]
    NonPositiveRate {
        /// Currency.
        currency: CurrencyCode,
        /// Rejected rate.
        rate: Decimal,
    },

    /// An observation with the same effective timestamp already exists.
    #[error("A {currency} rate effective at {effective_at} is already recorded")]
    DuplicateObservation {
        /// Currency.
        currency: CurrencyCode,
        /// Effective timestamp.
        effective_at: DateTime<Utc>,
    },

    /// The home currency has the fixed rate 1.
    #[error("Cannot record a rate for the home currency {0}")]
    HomeCurrencyRate(CurrencyCode),

    /// Decimal arithmetic overflowed.
    #[error("Conversion of {amount} {currency} overflowed")]
    ConversionOverflow {
        /// Source amount.
        amount: Decimal,
        /// Source currency.
        currency: CurrencyCode,
    },
}

impl CurrencyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoRateAvailable { .. } => "NO_RATE_AVAILABLE",
            Self::NonPositiveRate { .. } => "NON_POSITIVE_RATE",
            Self::DuplicateObservation { .. } => "DUPLICATE_RATE_OBSERVATION",
            Self::HomeCurrencyRate(_) => "HOME_CURRENCY_RATE",
            Self::ConversionOverflow { .. } => "CONVERSION_OVERFLOW",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoRateAvailable { .. } => ErrorKind::NotFound,
            Self::NonPositiveRate { .. }
            | Self::DuplicateObservation { .. }
            | Self::HomeCurrencyRate(_) => ErrorKind::Validation,
            Self::ConversionOverflow { .. } => ErrorKind::Internal,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
