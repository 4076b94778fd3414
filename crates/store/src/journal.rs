//! Journal posting engine.
//!
//! A post runs as one unit:
//! 1. take the idempotency slot for the key
//! 2. validate under the chart's read lock
//! 3. lock every touched account in ascending id order
//! 4. compute the new balances with checked arithmetic
//! 5. append the entry and its postings to the commit log
//! 6. publish the balances and release
//!
//! Readers of the commit log therefore never see part of an entry, and a
//! balance is never computed from a stale read.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use ledgerwise_core::ledger::{
    JournalEntry, LedgerError, LedgerPosting, NewJournalEntry, NotPostableReason, PostingReceipt,
    build_reversal, validate_entry,
};
use ledgerwise_shared::types::{AccountId, JournalEntryId, UserId};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::chart::ChartRegistry;

#[derive(Debug, Default)]
struct CommitLog {
    entries: Vec<JournalEntry>,
    index: HashMap<JournalEntryId, usize>,
    postings: Vec<LedgerPosting>,
    reversals: HashMap<JournalEntryId, JournalEntryId>,
    sequence: u64,
}

#[derive(Debug, Clone)]
struct IdempotencyRecord {
    candidate: NewJournalEntry,
    entry_id: JournalEntryId,
}

type IdempotencySlot = Arc<Mutex<Option<IdempotencyRecord>>>;

/// Postings and the last commit sequence they include.
#[derive(Debug, Clone, Serialize)]
pub struct JournalSnapshot {
    /// Every posting with `commit_sequence <= high_water`.
    pub postings: Vec<LedgerPosting>,
    /// Last commit sequence in the snapshot.
    pub high_water: u64,
}

impl JournalSnapshot {
    /// Highest commit sequence per account in this snapshot.
    #[must_use]
    pub fn last_sequence_by_account(&self) -> HashMap<AccountId, u64> {
        let mut last = HashMap::new();
        for posting in &self.postings {
            let seq = last.entry(posting.account_id).or_insert(0);
            *seq = posting.commit_sequence.max(*seq);
        }
        last
    }
}

/// Validates and posts journal entries.
#[derive(Debug)]
pub struct PostingEngine {
    chart: Arc<ChartRegistry>,
    precision: u32,
    log: RwLock<CommitLog>,
    /// One slot per committed key. Failed posts remove their slot.
    idempotency: DashMap<String, IdempotencySlot>,
}

impl PostingEngine {
    /// Creates an engine posting against `chart` at `precision` decimal places.
    #[must_use]
    pub fn new(chart: Arc<ChartRegistry>, precision: u32) -> Self {
        Self {
            chart,
            precision,
            log: RwLock::new(CommitLog::default()),
            idempotency: DashMap::new(),
        }
    }

    /// The chart this engine posts against.
    #[must_use]
    pub fn chart(&self) -> &Arc<ChartRegistry> {
        &self.chart
    }

    /// Minor-unit precision entries are validated at.
    #[must_use]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Checks an entry without posting it.
    ///
    /// # Errors
    ///
    /// `InsufficientLines`, `InvalidLine`, `AccountNotPostable` or `UnbalancedEntry`.
    pub fn validate(&self, entry: &NewJournalEntry) -> Result<(), LedgerError> {
        let chart = self.chart.read();
        validate_entry(entry, self.precision, |id| {
            chart.ensure_postable(id).map(|_| ())
        })
        .map(|_| ())
    }

    /// Posts an entry exactly once per idempotency key.
    ///
    /// Replaying a key with the same entry returns the stored entry with
    /// `replayed = true`. Keys are kept for every committed entry; a key whose
    /// post failed is released so the map only grows with the journal.
    ///
    /// # Errors
    ///
    /// Validation errors, `BlankIdempotencyKey`, `IdempotencyKeyReused` or
    /// `BalanceOverflow`. Nothing is written on error.
    pub fn post(
        &self,
        candidate: NewJournalEntry,
        idempotency_key: &str,
    ) -> Result<PostingReceipt, LedgerError> {
        let key = idempotency_key.trim();
        if key.is_empty() {
            return Err(LedgerError::BlankIdempotencyKey);
        }
        loop {
            let slot = Arc::clone(
                self.idempotency
                    .entry(key.to_string())
                    .or_default()
                    .value(),
            );
            let mut guard = slot.lock();
            // A failed post may have evicted this slot while we waited on it.
            let current = self
                .idempotency
                .get(key)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), &slot));
            if !current {
                continue;
            }

            if let Some(record) = guard.as_ref() {
                if !same_effect(&record.candidate, &candidate) {
                    warn!(key, "Idempotency key reused with a different entry");
                    return Err(LedgerError::IdempotencyKeyReused(key.to_string()));
                }
                let entry = self
                    .entry(record.entry_id)
                    .ok_or(LedgerError::EntryNotFound(record.entry_id))?;
                warn!(key, entry_id = %entry.id, "Idempotent replay");
                return Ok(PostingReceipt {
                    entry,
                    replayed: true,
                });
            }

            return match self.commit(candidate.clone()) {
                Ok(entry) => {
                    *guard = Some(IdempotencyRecord {
                        candidate,
                        entry_id: entry.id,
                    });
                    Ok(PostingReceipt {
                        entry,
                        replayed: false,
                    })
                }
                Err(err) => {
                    self.idempotency
                        .remove_if(key, |_, held| Arc::ptr_eq(held, &slot));
                    Err(err)
                }
            };
        }
    }

    /// Posts the reversal of an entry, dated like the original.
    ///
    /// Idempotent under the key `reversal:<entry id>`.
    ///
    /// # Errors
    ///
    /// `EntryNotFound`, or any posting error.
    pub fn reverse(
        &self,
        entry_id: JournalEntryId,
        reversed_by: UserId,
    ) -> Result<PostingReceipt, LedgerError> {
        let original = self
            .entry(entry_id)
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let reversal = build_reversal(&original, reversed_by);
        self.post(reversal, &format!("reversal:{entry_id}"))
    }

    /// Looks up a posted entry.
    #[must_use]
    pub fn entry(&self, id: JournalEntryId) -> Option<JournalEntry> {
        let log = self.log.read();
        log.index.get(&id).map(|&i| log.entries[i].clone())
    }

    /// All posted entries in commit order.
    #[must_use]
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.log.read().entries.clone()
    }

    /// The entry that reverses `id`, if any.
    #[must_use]
    pub fn reversal_of(&self, id: JournalEntryId) -> Option<JournalEntryId> {
        self.log.read().reversals.get(&id).copied()
    }

    /// Last assigned commit sequence.
    #[must_use]
    pub fn commit_sequence(&self) -> u64 {
        self.log.read().sequence
    }

    /// Every posting committed so far, with the sequence it stops at.
    #[must_use]
    pub fn postings_snapshot(&self) -> JournalSnapshot {
        let log = self.log.read();
        JournalSnapshot {
            postings: log.postings.clone(),
            high_water: log.sequence,
        }
    }

    fn commit(&self, candidate: NewJournalEntry) -> Result<JournalEntry, LedgerError> {
        let chart = self.chart.read();
        let totals = validate_entry(&candidate, self.precision, |id| {
            chart.ensure_postable(id).map(|_| ())
        })?;

        let touched = candidate.touched_accounts();
        let states = touched
            .iter()
            .map(|&id| {
                self.chart.state(id).ok_or(LedgerError::AccountNotPostable {
                    account_id: id,
                    reason: NotPostableReason::Missing,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut guards: Vec<_> = states.iter().map(|state| state.lock()).collect();

        let mut updates = Vec::with_capacity(touched.len());
        for (account_id, guard) in touched.iter().zip(guards.iter()) {
            let (debit, credit, count) = candidate
                .lines
                .iter()
                .filter(|line| line.account_id == *account_id)
                .fold((Decimal::ZERO, Decimal::ZERO, 0_u64), |(d, c, n), line| {
                    (d + line.debit, c + line.credit, n + 1)
                });
            let update = guard
                .prepare(candidate.date, debit, credit, count)
                .ok_or(LedgerError::BalanceOverflow(*account_id))?;
            updates.push(update);
        }

        let entry = {
            let mut log = self.log.write();
            let sequence = log.sequence + 1;
            let entry = JournalEntry::posted(candidate, sequence);
            let postings = entry.postings();
            let position = log.entries.len();
            log.sequence = sequence;
            log.index.insert(entry.id, position);
            if let Some(original) = entry.reverses {
                log.reversals.insert(original, entry.id);
            }
            log.entries.push(entry.clone());
            log.postings.extend(postings);
            entry
        };

        for (guard, update) in guards.iter_mut().zip(updates) {
            guard.commit(update, entry.commit_sequence);
        }
        drop(guards);
        drop(chart);

        info!(
            entry_id = %entry.id,
            sequence = entry.commit_sequence,
            lines = entry.lines.len(),
            amount = %totals.debit,
            "Journal entry posted"
        );
        Ok(entry)
    }
}

/// Replays compare everything except the author.
fn same_effect(stored: &NewJournalEntry, candidate: &NewJournalEntry) -> bool {
    stored.date == candidate.date
        && stored.lines == candidate.lines
        && stored.narration == candidate.narration
        && stored.source_document == candidate.source_document
        && stored.reverses == candidate.reverses
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgerwise_core::chart::{AccountType, NewAccount};
    use ledgerwise_core::ledger::JournalLine;
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn setup() -> (PostingEngine, AccountId, AccountId) {
        let chart = Arc::new(ChartRegistry::new());
        let cash = chart
            .create_account(NewAccount::root("1001", "Cash", AccountType::Asset))
            .unwrap()
            .id;
        let sales = chart
            .create_account(NewAccount::root("4001", "Sales", AccountType::Income))
            .unwrap()
            .id;
        (PostingEngine::new(chart, 2), cash, sales)
    }

    fn sale(cash: AccountId, sales: AccountId, amount: Decimal) -> NewJournalEntry {
        NewJournalEntry::new(
            date(),
            "cash sale",
            UserId::new(),
            vec![JournalLine::debit(cash, amount), JournalLine::credit(sales, amount)],
        )
    }

    #[test]
    fn test_post_updates_both_normal_balances() {
        let (engine, cash, sales) = setup();
        let receipt = engine.post(sale(cash, sales, dec!(1000)), "k1").unwrap();

        assert!(!receipt.replayed);
        assert!(receipt.entry.posted);
        assert_eq!(receipt.entry.commit_sequence, 1);
        let chart = engine.chart();
        assert_eq!(chart.balance(cash, date()).unwrap().balance, dec!(1000));
        assert_eq!(chart.balance(sales, date()).unwrap().balance, dec!(1000));
        assert_eq!(engine.postings_snapshot().postings.len(), 2);
    }

    #[test]
    fn test_replay_returns_original() {
        let (engine, cash, sales) = setup();
        let first = engine.post(sale(cash, sales, dec!(10)), "k").unwrap();
        let second = engine.post(sale(cash, sales, dec!(10)), "k").unwrap();
        assert!(second.replayed);
        assert_eq!(first.entry.id, second.entry.id);
        assert_eq!(engine.entries().len(), 1);
        assert_eq!(engine.chart().balance(cash, date()).unwrap().balance, dec!(10));
    }

    #[test]
    fn test_key_reuse_with_different_entry_rejected() {
        let (engine, cash, sales) = setup();
        engine.post(sale(cash, sales, dec!(10)), "k").unwrap();
        assert_eq!(
            engine.post(sale(cash, sales, dec!(11)), "k"),
            Err(LedgerError::IdempotencyKeyReused("k".into()))
        );
        assert_eq!(
            engine.post(sale(cash, sales, dec!(11)), "  "),
            Err(LedgerError::BlankIdempotencyKey)
        );
    }

    #[test]
    fn test_failed_post_leaves_no_trace_and_key_stays_usable() {
        let (engine, cash, sales) = setup();
        let mut bad = sale(cash, sales, dec!(10));
        bad.lines[1].credit = dec!(9);
        assert!(matches!(
            engine.post(bad, "k"),
            Err(LedgerError::UnbalancedEntry { .. })
        ));
        assert_eq!(engine.commit_sequence(), 0);
        assert_eq!(engine.chart().balance(cash, date()).unwrap().balance, Decimal::ZERO);
        assert!(engine.idempotency.is_empty());

        assert!(engine.post(sale(cash, sales, dec!(10)), "k").is_ok());
        assert_eq!(engine.idempotency.len(), 1);
    }

    #[test]
    fn test_failed_posts_release_their_keys() {
        let (engine, cash, sales) = setup();
        for n in 0..50 {
            let mut bad = sale(cash, sales, dec!(10));
            bad.lines[1].credit = dec!(9);
            assert!(engine.post(bad, &format!("bad-{n}")).is_err());
        }
        assert!(engine.idempotency.is_empty());
    }

    #[test]
    fn test_racing_retries_after_failure_commit_once() {
        let (engine, cash, sales) = setup();
        let engine = Arc::new(engine);
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let engine = Arc::clone(&engine);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    let mut candidate = sale(cash, sales, dec!(10));
                    if n % 2 == 0 {
                        candidate.lines[1].credit = dec!(9);
                    }
                    engine.post(candidate, "shared")
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let fresh = results
            .iter()
            .filter(|r| r.as_ref().is_ok_and(|receipt| !receipt.replayed))
            .count();
        assert_eq!(fresh, 1);
        assert_eq!(engine.commit_sequence(), 1);
        assert_eq!(engine.chart().balance(cash, date()).unwrap().balance, dec!(10));
        assert_eq!(engine.idempotency.len(), 1);
    }

    #[test]
    fn test_reverse_nets_to_zero_and_is_idempotent() {
        let (engine, cash, sales) = setup();
        let original = engine.post(sale(cash, sales, dec!(250)), "k").unwrap().entry;
        let reversal = engine.reverse(original.id, UserId::new()).unwrap();

        assert_eq!(reversal.entry.reverses, Some(original.id));
        assert_eq!(reversal.entry.date, original.date);
        assert_eq!(engine.reversal_of(original.id), Some(reversal.entry.id));
        assert_eq!(engine.chart().balance(cash, date()).unwrap().balance, Decimal::ZERO);
        assert_eq!(engine.chart().balance(sales, date()).unwrap().balance, Decimal::ZERO);

        let again = engine.reverse(original.id, UserId::new()).unwrap();
        assert!(again.replayed);
        assert_eq!(again.entry.id, reversal.entry.id);
        assert_eq!(engine.entries().len(), 2);
        // The original is untouched.
        assert_eq!(engine.entry(original.id), Some(original));
    }

    #[test]
    fn test_reverse_unknown_entry() {
        let (engine, _, _) = setup();
        let missing = JournalEntryId::new();
        assert_eq!(
            engine.reverse(missing, UserId::new()),
            Err(LedgerError::EntryNotFound(missing))
        );
    }

    #[test]
    fn test_parent_account_not_postable() {
        let (engine, cash, sales) = setup();
        let petty = engine
            .chart()
            .create_account(NewAccount::root("1010", "Petty cash", AccountType::Asset).under(cash))
            .unwrap();
        let result = engine.post(sale(cash, sales, dec!(5)), "k");
        assert_eq!(
            result,
            Err(LedgerError::AccountNotPostable {
                account_id: cash,
                reason: NotPostableReason::HasChildren,
            })
        );
        assert!(engine.post(sale(petty.id, sales, dec!(5)), "k").is_ok());
    }

    #[test]
    fn test_accounts_with_postings_cannot_gain_children_or_be_deleted() {
        let (engine, cash, sales) = setup();
        engine.post(sale(cash, sales, dec!(5)), "k").unwrap();
        let chart = engine.chart();
        assert!(matches!(
            chart.create_account(NewAccount::root("1010", "Till", AccountType::Asset).under(cash)),
            Err(ledgerwise_core::chart::ChartError::ParentHasPostings(id)) if id == cash
        ));
        assert!(matches!(
            chart.delete_account(sales),
            Err(ledgerwise_core::chart::ChartError::HasPostings(_))
        ));
    }
}
