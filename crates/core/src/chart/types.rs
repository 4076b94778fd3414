//! Account types.

use chrono::{DateTime, Utc};
use ledgerwise_shared::types::AccountId;
use serde::{Deserialize, Serialize};

use crate::ledger::balance::NormalBalance;

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned (cash, bank, receivables, stock).
    Asset,
    /// Obligations owed (payables, tax payable).
    Liability,
    /// Revenue and gains.
    Income,
    /// Costs and losses.
    Expense,
    /// Owner's equity.
    Equity,
}

impl AccountType {
    /// The side that increases an account of this type.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Income | Self::Equity => NormalBalance::Credit,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Equity => "equity",
        };
        f.write_str(name)
    }
}

/// A node of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Unique account code (e.g. "1001").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Type classification.
    pub account_type: AccountType,
    /// Parent account, `None` for roots.
    pub parent_id: Option<AccountId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for creating an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Type classification.
    pub account_type: AccountType,
    /// Optional parent.
    pub parent_id: Option<AccountId>,
}

impl NewAccount {
    /// Creates input for a root account.
    #[must_use]
    pub fn root(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            parent_id: None,
        }
    }

    /// Places the new account under `parent`.
    #[must_use]
    pub fn under(mut self, parent: AccountId) -> Self {
        self.parent_id = Some(parent);
        self
    }
}
