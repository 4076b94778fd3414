//! Chart of accounts.
//!
//! The account tree, its type classification and the structural rules:
//! unique codes, acyclic parent chains, leaf-only posting, and no structural
//! change to accounts that already carry postings.

pub mod error;
pub mod tree;
pub mod types;

pub use error::ChartError;
pub use tree::ChartOfAccounts;
pub use types::{Account, AccountType, NewAccount};
