//! The account tree.
//!
//! `ChartOfAccounts` is a plain, single-owner structure. Whether an account
//! already carries postings is ledger state, so the mutating operations take a
//! `has_postings` predicate supplied by the caller.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use ledgerwise_shared::types::AccountId;

use super::error::ChartError;
use super::types::{Account, NewAccount};
use crate::ledger::error::{LedgerError, NotPostableReason};

/// Chart of accounts: accounts indexed by id and code, plus child links.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: HashMap<AccountId, Account>,
    codes: HashMap<String, AccountId>,
    children: HashMap<AccountId, BTreeSet<AccountId>>,
}

impl ChartOfAccounts {
    /// Creates an empty chart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart has no accounts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Looks up an account by id.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Looks up an account by code.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Account> {
        self.codes.get(code.trim()).and_then(|id| self.accounts.get(id))
    }

    /// Returns true if the account exists and has no children.
    #[must_use]
    pub fn is_leaf(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id) && self.children.get(&id).is_none_or(BTreeSet::is_empty)
    }

    /// Direct children of an account, in id order.
    pub fn children(&self, id: AccountId) -> impl Iterator<Item = &Account> {
        self.children
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|child| self.accounts.get(child))
    }

    /// All accounts ordered by code.
    #[must_use]
    pub fn accounts(&self) -> Vec<&Account> {
        let mut all: Vec<&Account> = self.accounts.values().collect();
        all.sort_by(|a, b| a.code.cmp(&b.code));
        all
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// - `InvalidAccount` for a blank code or name
    /// - `DuplicateCode` if the code is taken
    /// - `UnknownParent` if the parent does not exist
    /// - `ParentHasPostings` if the parent already carries postings
    pub fn create_account<P>(&mut self, input: NewAccount, has_postings: P) -> Result<Account, ChartError>
    where
        P: Fn(AccountId) -> bool,
    {
        let code = input.code.trim().to_string();
        let name = input.name.trim().to_string();
        if code.is_empty() {
            return Err(ChartError::InvalidAccount("code must not be blank".to_string()));
        }
        if name.is_empty() {
            return Err(ChartError::InvalidAccount("name must not be blank".to_string()));
        }
        if self.codes.contains_key(&code) {
            return Err(ChartError::DuplicateCode(code));
        }

        let account = Account {
            id: AccountId::new(),
            code,
            name,
            account_type: input.account_type,
            parent_id: input.parent_id,
            created_at: Utc::now(),
        };
        if let Some(parent) = input.parent_id {
            self.check_parent(account.id, parent, &has_postings)?;
        }

        self.insert(account.clone());
        Ok(account)
    }

    /// Moves an account under a new parent (or to the root with `None`).
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account does not exist
    /// - `UnknownParent`, `CycleDetected` or `ParentHasPostings` for a bad parent
    pub fn move_account<P>(
        &mut self,
        id: AccountId,
        new_parent: Option<AccountId>,
        has_postings: P,
    ) -> Result<Account, ChartError>
    where
        P: Fn(AccountId) -> bool,
    {
        let current_parent = self
            .accounts
            .get(&id)
            .ok_or(ChartError::AccountNotFound(id))?
            .parent_id;
        if current_parent == new_parent {
            return self.get(id).cloned().ok_or(ChartError::AccountNotFound(id));
        }
        if let Some(parent) = new_parent {
            self.check_parent(id, parent, &has_postings)?;
        }

        if let Some(old) = current_parent
            && let Some(siblings) = self.children.get_mut(&old)
        {
            siblings.remove(&id);
        }
        if let Some(parent) = new_parent {
            self.children.entry(parent).or_default().insert(id);
        }
        let account = self.accounts.get_mut(&id).ok_or(ChartError::AccountNotFound(id))?;
        account.parent_id = new_parent;
        Ok(account.clone())
    }

    /// Removes an account.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account does not exist
    /// - `HasPostings` if it carries postings
    /// - `HasChildren` if it still has child accounts
    pub fn remove_account<P>(&mut self, id: AccountId, has_postings: P) -> Result<Account, ChartError>
    where
        P: Fn(AccountId) -> bool,
    {
        if !self.accounts.contains_key(&id) {
            return Err(ChartError::AccountNotFound(id));
        }
        if has_postings(id) {
            return Err(ChartError::HasPostings(id));
        }
        if !self.is_leaf(id) {
            return Err(ChartError::HasChildren(id));
        }

        let account = self.accounts.remove(&id).ok_or(ChartError::AccountNotFound(id))?;
        self.codes.remove(&account.code);
        self.children.remove(&id);
        if let Some(parent) = account.parent_id
            && let Some(siblings) = self.children.get_mut(&parent)
        {
            siblings.remove(&id);
        }
        Ok(account)
    }

    /// Returns the ancestor chain of an account, root first, ending with the account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account does not exist.
    pub fn resolve_path(&self, id: AccountId) -> Result<Vec<Account>, ChartError> {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let account = self
                .accounts
                .get(&current)
                .ok_or(ChartError::AccountNotFound(current))?;
            path.push(account.clone());
            if path.len() > self.accounts.len() {
                return Err(ChartError::CycleDetected {
                    account: id,
                    parent: current,
                });
            }
            cursor = account.parent_id;
        }
        path.reverse();
        Ok(path)
    }

    /// Checks that an account exists and is a leaf.
    ///
    /// # Errors
    ///
    /// `AccountNotPostable` naming why the account cannot take postings.
    pub fn ensure_postable(&self, id: AccountId) -> Result<&Account, LedgerError> {
        let account = self.accounts.get(&id).ok_or(LedgerError::AccountNotPostable {
            account_id: id,
            reason: NotPostableReason::Missing,
        })?;
        if self.is_leaf(id) {
            Ok(account)
        } else {
            Err(LedgerError::AccountNotPostable {
                account_id: id,
                reason: NotPostableReason::HasChildren,
            })
        }
    }

    fn check_parent<P>(&self, account: AccountId, parent: AccountId, has_postings: &P) -> Result<(), ChartError>
    where
        P: Fn(AccountId) -> bool,
    {
        if !self.accounts.contains_key(&parent) {
            return Err(ChartError::UnknownParent(parent));
        }
        if self.is_ancestor_or_self(account, parent) {
            return Err(ChartError::CycleDetected { account, parent });
        }
        if has_postings(parent) {
            return Err(ChartError::ParentHasPostings(parent));
        }
        Ok(())
    }

    /// True if `account` is `start` or one of `start`'s ancestors.
    fn is_ancestor_or_self(&self, account: AccountId, start: AccountId) -> bool {
        let mut cursor = Some(start);
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == account {
                return true;
            }
            steps += 1;
            if steps > self.accounts.len() {
                return true;
            }
            cursor = self.accounts.get(&current).and_then(|a| a.parent_id);
        }
        false
    }

    fn insert(&mut self, account: Account) {
        if let Some(parent) = account.parent_id {
            self.children.entry(parent).or_default().insert(account.id);
        }
        self.codes.insert(account.code.clone(), account.id);
        self.accounts.insert(account.id, account);
    }
}
