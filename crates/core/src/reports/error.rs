//! Consistency errors.

use chrono::NaiveDate;
use ledgerwise_shared::ErrorKind;
use ledgerwise_shared::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{BalanceDrift, StockDrift};

/// Audit findings. These are reported, never corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// Grand-total debits differ from grand-total credits.
    #[error("Trial balance as of {as_of} is unbalanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Cut-off date.
        as_of: NaiveDate,
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// Maintained account balances disagree with postings.
    #[error("{} account balance(s) drifted from their postings", .0.len())]
    BalanceDrift(Vec<BalanceDrift>),

    /// Maintained stock balances disagree with movements.
    #[error("{} stock balance(s) drifted from their movements", .0.len())]
    StockDrift(Vec<StockDrift>),

    /// Summing an account's postings or the grand totals overflowed.
    #[error("Balance overflow while aggregating account {0}")]
    BalanceOverflow(AccountId),

    /// Writers kept committing while the snapshot was taken.
    #[error("Could not take a stable snapshot after {attempts} attempts")]
    SnapshotUnstable {
        /// Attempts made.
        attempts: u32,
    },
}

impl ConsistencyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unbalanced { .. } => "TRIAL_BALANCE_UNBALANCED",
            Self::BalanceDrift(_) => "BALANCE_DRIFT",
            Self::StockDrift(_) => "STOCK_DRIFT",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::SnapshotUnstable { .. } => "SNAPSHOT_UNSTABLE",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SnapshotUnstable { .. } => ErrorKind::Conflict,
            Self::BalanceOverflow(_) => ErrorKind::Internal,
            _ => ErrorKind::Consistency,
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
    use rust_decimal_macros::dec;

    #[test]
    fn test_only_unstable_snapshot_is_retryable() {
        assert!(ConsistencyError::SnapshotUnstable { attempts: 3 }.is_retryable());
        let unbalanced = ConsistencyError::Unbalanced {
            as_of: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            debit: dec!(10),
            credit: dec!(9),
        };
        assert!(!unbalanced.is_retryable());
        assert_eq!(unbalanced.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn test_drift_message_counts() {
        let err = ConsistencyError::BalanceDrift(vec![]);
        assert_eq!(err.to_string(), "0 account balance(s) drifted from their postings");
    }
}
