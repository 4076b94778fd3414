//! Journal entry domain types.

use chrono::{DateTime, NaiveDate, Utc};
use ledgerwise_shared::types::{AccountId, DocumentId, JournalEntryId, PostingId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    /// Debit side.
    Debit,
    /// Credit side.
    Credit,
}

/// One line of a journal entry. Exactly one of `debit`/`credit` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Target account.
    pub account_id: AccountId,
    /// Debit amount (0 if credit).
    pub debit: Decimal,
    /// Credit amount (0 if debit).
    pub credit: Decimal,
    /// Optional memo.
    pub memo: Option<String>,
}

impl JournalLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    /// The non-zero side, if the line is well formed.
    #[must_use]
    pub fn side(&self) -> Option<EntrySide> {
        match (self.debit.is_zero(), self.credit.is_zero()) {
            (false, true) => Some(EntrySide::Debit),
            (true, false) => Some(EntrySide::Credit),
            _ => None,
        }
    }

    /// The same line with debit and credit swapped.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            account_id: self.account_id,
            debit: self.credit,
            credit: self.debit,
            memo: self.memo.clone(),
        }
    }
}

/// An unposted journal entry as submitted to the posting engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    /// Accounting date.
    pub date: NaiveDate,
    /// Ordered lines.
    pub lines: Vec<JournalLine>,
    /// Narration.
    pub narration: String,
    /// Creator.
    pub created_by: UserId,
    /// Document this entry was derived from.
    pub source_document: Option<DocumentId>,
    /// Entry this one reverses.
    pub reverses: Option<JournalEntryId>,
}

impl NewJournalEntry {
    /// Creates a manual entry.
    #[must_use]
    pub fn new(
        date: NaiveDate,
        narration: impl Into<String>,
        created_by: UserId,
        lines: Vec<JournalLine>,
    ) -> Self {
        Self {
            date,
            lines,
            narration: narration.into(),
            created_by,
            source_document: None,
            reverses: None,
        }
    }

    /// Distinct accounts touched by the entry, in ascending id order.
    #[must_use]
    pub fn touched_accounts(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.lines.iter().map(|l| l.account_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// A posted, immutable journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Entry ID.
    pub id: JournalEntryId,
    /// Accounting date.
    pub date: NaiveDate,
    /// Ordered lines.
    pub lines: Vec<JournalLine>,
    /// Narration.
    pub narration: String,
    /// Creator.
    pub created_by: UserId,
    /// Document this entry was derived from.
    pub source_document: Option<DocumentId>,
    /// Entry this one reverses.
    pub reverses: Option<JournalEntryId>,
    /// Always true for stored entries.
    pub posted: bool,
    /// Commit timestamp.
    pub posted_at: DateTime<Utc>,
    /// Position in the global commit log.
    pub commit_sequence: u64,
}

impl JournalEntry {
    /// Marks a validated candidate as posted.
    #[must_use]
    pub fn posted(candidate: NewJournalEntry, commit_sequence: u64) -> Self {
        Self {
            id: JournalEntryId::new(),
            date: candidate.date,
            lines: candidate.lines,
            narration: candidate.narration,
            created_by: candidate.created_by,
            source_document: candidate.source_document,
            reverses: candidate.reverses,
            posted: true,
            posted_at: Utc::now(),
            commit_sequence,
        }
    }

    /// One posting per line, in line order.
    #[must_use]
    pub fn postings(&self) -> Vec<LedgerPosting> {
        self.lines
            .iter()
            .enumerate()
            .map(|(line_number, line)| LedgerPosting {
                id: PostingId::new(),
                entry_id: self.id,
                line_number,
                account_id: line.account_id,
                date: self.date,
                debit: line.debit,
                credit: line.credit,
                commit_sequence: self.commit_sequence,
            })
            .collect()
    }

    /// Debit and credit totals.
    #[must_use]
    pub fn totals(&self) -> EntryTotals {
        EntryTotals::from_lines(&self.lines)
    }
}

/// Append-only materialisation of one entry line against one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPosting {
    /// Posting ID.
    pub id: PostingId,
    /// Owning entry.
    pub entry_id: JournalEntryId,
    /// Zero-based line index within the entry.
    pub line_number: usize,
    /// Target account.
    pub account_id: AccountId,
    /// Accounting date.
    pub date: NaiveDate,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Commit sequence of the owning entry.
    pub commit_sequence: u64,
}

/// Entry totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
}

impl EntryTotals {
    /// Sums the lines.
    #[must_use]
    pub fn from_lines(lines: &[JournalLine]) -> Self {
        Self {
            debit: lines.iter().map(|l| l.debit).sum(),
            credit: lines.iter().map(|l| l.credit).sum(),
        }
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.debit == self.credit
    }
}

/// Result of a posting call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingReceipt {
    /// The stored entry.
    pub entry: JournalEntry,
    /// True when the idempotency key had already been used.
    pub replayed: bool,
}
