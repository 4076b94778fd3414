//! Reversal entries.

use ledgerwise_shared::types::UserId;

use super::types::{JournalEntry, JournalLine, NewJournalEntry};

/// Builds the entry that cancels `original`: same date, same accounts, sides swapped.
#[must_use]
pub fn build_reversal(original: &JournalEntry, reversed_by: UserId) -> NewJournalEntry {
    let lines: Vec<JournalLine> = original
        .lines
        .iter()
        .map(|line| {
            let mut swapped = line.swapped();
            swapped.memo = line.memo.as_ref().map(|memo| format!("Reversal: {memo}"));
            swapped
        })
        .collect();

    NewJournalEntry {
        date: original.date,
        lines,
        narration: format!("Reversal of {}: {}", original.id, original.narration),
        created_by: reversed_by,
        source_document: original.source_document,
        reverses: Some(original.id),
    }
}
