//! Report data types.

use chrono::NaiveDate;
use ledgerwise_shared::types::{AccountId, CurrencyCode, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chart::AccountType;

/// One account in a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Total debits up to the cut-off.
    pub debit_total: Decimal,
    /// Total credits up to the cut-off.
    pub credit_total: Decimal,
    /// Net balance under the normal-balance convention.
    pub balance: Decimal,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceReport {
    /// Inclusive cut-off date.
    pub as_of: NaiveDate,
    /// Home currency.
    pub currency: CurrencyCode,
    /// Accounts with activity, by code.
    pub accounts: Vec<TrialBalanceLine>,
    /// Grand totals.
    pub totals: TrialBalanceTotals,
}

/// Trial balance grand totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// An account whose maintained balance disagrees with its postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDrift {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Incrementally maintained balance.
    pub maintained: Decimal,
    /// Balance recomputed from postings.
    pub recomputed: Decimal,
}

/// A product whose current balance disagrees with its movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDrift {
    /// Product ID.
    pub product_id: ProductId,
    /// Current balance.
    pub maintained: Decimal,
    /// Opening stock plus all movements.
    pub recomputed: Decimal,
}

/// Outcome of a clean consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    /// Inclusive cut-off date.
    pub as_of: NaiveDate,
    /// Last commit sequence included in the snapshot.
    pub high_water: u64,
    /// Number of accounts compared.
    pub accounts_checked: usize,
    /// The trial balance the check was run on.
    pub trial_balance: TrialBalanceReport,
}
