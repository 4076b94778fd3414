//! Document listener.
//!
//! Posts documents as their ids arrive on a channel and, when configured,
//! as the document source reports them pending. Retryable failures are
//! retried; everything else is reported once and acknowledged.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ledgerwise_shared::config::{NotificationEvent, WorkerConfig};
use ledgerwise_shared::types::{DocumentId, JournalEntryId};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::bookkeeper::{Bookkeeper, DocumentPosting};
use crate::error::BookkeeperError;

/// Something the listener reports to its subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    /// A document was posted.
    DocumentPosted {
        /// Document ID.
        document_id: DocumentId,
        /// Journal entry, if the document has one.
        journal_entry_id: Option<JournalEntryId>,
        /// True if it had been posted before.
        replayed: bool,
    },
    /// A document was rejected.
    DocumentRejected {
        /// Document ID.
        document_id: DocumentId,
        /// Error code.
        code: String,
        /// Error message.
        message: String,
    },
    /// The ledger failed verification.
    ConsistencyViolation {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
    },
}

impl WorkerEvent {
    /// The notification category of this event.
    #[must_use]
    pub const fn category(&self) -> NotificationEvent {
        match self {
            Self::DocumentPosted { .. } => NotificationEvent::DocumentPosted,
            Self::DocumentRejected { .. } => NotificationEvent::DocumentRejected,
            Self::ConsistencyViolation { .. } => NotificationEvent::ConsistencyViolation,
        }
    }
}

/// Counters of one listener run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerStats {
    /// Documents posted for the first time.
    pub posted: u64,
    /// Documents that had already been posted.
    pub replayed: u64,
    /// Documents rejected.
    pub rejected: u64,
    /// Polls of the document source.
    pub polls: u64,
}

/// Background worker feeding documents to a [`Bookkeeper`].
#[derive(Debug, Clone)]
pub struct DocumentListener {
    bookkeeper: Arc<Bookkeeper>,
    config: WorkerConfig,
    notifications: BTreeSet<NotificationEvent>,
    cancel: CancellationToken,
}

impl DocumentListener {
    /// Creates a listener reporting the notification set of the current settings.
    #[must_use]
    pub fn new(bookkeeper: Arc<Bookkeeper>, config: WorkerConfig) -> Self {
        let notifications = bookkeeper.settings().current().settings.notifications;
        Self {
            bookkeeper,
            config,
            notifications,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that stops the listener.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Starts the listener; returns the id sender, the event receiver and the task.
    #[must_use]
    pub fn spawn(
        self,
    ) -> (
        mpsc::Sender<DocumentId>,
        mpsc::Receiver<WorkerEvent>,
        JoinHandle<ListenerStats>,
    ) {
        let capacity = self.config.channel_capacity.max(1);
        let (id_tx, id_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let handle = tokio::spawn(async move { self.run(id_rx, event_tx).await });
        (id_tx, event_rx, handle)
    }

    /// Runs until cancelled, or until the id channel closes when polling is off.
    pub async fn run(
        &self,
        mut documents: mpsc::Receiver<DocumentId>,
        events: mpsc::Sender<WorkerEvent>,
    ) -> ListenerStats {
        let mut stats = ListenerStats::default();
        let mut poll = (self.config.poll_interval_secs > 0).then(|| {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.poll_interval_secs));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        let mut open = true;
        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            max_retries = self.config.max_retries,
            "Document listener started"
        );

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    info!("Document listener received shutdown signal");
                    break;
                }
                received = documents.recv(), if open => match received {
                    Some(id) => self.handle(id, &events, &mut stats).await,
                    None => {
                        debug!("Document channel closed");
                        open = false;
                        if poll.is_none() {
                            break;
                        }
                    }
                },
                () = tick(poll.as_mut()) => {
                    self.poll(&events, &mut stats).await;
                }
            }
        }

        info!(
            posted = stats.posted,
            replayed = stats.replayed,
            rejected = stats.rejected,
            "Document listener stopped"
        );
        stats
    }

    async fn poll(&self, events: &mpsc::Sender<WorkerEvent>, stats: &mut ListenerStats) {
        stats.polls += 1;
        let pending = match self.bookkeeper.source().pending().await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "Could not list pending documents");
                return;
            }
        };
        debug!(pending = pending.len(), "Polled document source");
        for id in pending {
            if self.cancel.is_cancelled() {
                return;
            }
            self.handle(id, events, stats).await;
        }

        let as_of = Utc::now().date_naive();
        let bookkeeper = Arc::clone(&self.bookkeeper);
        match tokio::task::spawn_blocking(move || bookkeeper.verify(as_of)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => {
                self.emit(
                    events,
                    WorkerEvent::ConsistencyViolation {
                        code: err.error_code().to_string(),
                        message: err.to_string(),
                    },
                )
                .await;
            }
            Err(err) => error!(error = %err, "Verification task failed"),
        }
    }

    async fn handle(
        &self,
        id: DocumentId,
        events: &mpsc::Sender<WorkerEvent>,
        stats: &mut ListenerStats,
    ) {
        match self.post_with_retry(id).await {
            Ok(posting) => {
                if posting.replayed {
                    stats.replayed += 1;
                } else {
                    stats.posted += 1;
                }
                self.acknowledge(id).await;
                self.emit(
                    events,
                    WorkerEvent::DocumentPosted {
                        document_id: id,
                        journal_entry_id: posting.journal_entry_id,
                        replayed: posting.replayed,
                    },
                )
                .await;
            }
            Err(err) => {
                stats.rejected += 1;
                if !err.is_retryable() {
                    self.acknowledge(id).await;
                }
                self.emit(
                    events,
                    WorkerEvent::DocumentRejected {
                        document_id: id,
                        code: err.error_code().to_string(),
                        message: err.to_string(),
                    },
                )
                .await;
            }
        }
    }

    async fn post_with_retry(&self, id: DocumentId) -> Result<DocumentPosting, BookkeeperError> {
        let attempts = self.config.max_retries.max(1);
        let mut backoff = Duration::from_millis(50);
        let mut attempt = 1;
        loop {
            match self.bookkeeper.derive_and_post(id).await {
                Err(err) if err.is_retryable() && attempt < attempts => {
                    debug!(document_id = %id, attempt, error = %err, "Retrying document");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(Duration::from_secs(5));
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn acknowledge(&self, id: DocumentId) {
        if let Err(err) = self.bookkeeper.source().acknowledge(id).await {
            warn!(document_id = %id, error = %err, "Could not acknowledge document");
        }
    }

    async fn emit(&self, events: &mpsc::Sender<WorkerEvent>, event: WorkerEvent) {
        if !self.notifications.contains(&event.category()) {
            return;
        }
        if events.send(event).await.is_err() {
            debug!("Event receiver dropped");
        }
    }
}

async fn tick(interval: Option<&mut Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_tag() {
        let event = WorkerEvent::DocumentRejected {
            document_id: DocumentId::new(),
            code: "DOCUMENT_NOT_BALANCED".into(),
            message: "declared 118000, computed 108000".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "document_rejected");
        assert_eq!(json["code"], "DOCUMENT_NOT_BALANCED");

        let back: WorkerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_categories() {
        let posted = WorkerEvent::DocumentPosted {
            document_id: DocumentId::new(),
            journal_entry_id: None,
            replayed: false,
        };
        assert_eq!(posted.category(), NotificationEvent::DocumentPosted);
        let violation = WorkerEvent::ConsistencyViolation {
            code: "UNBALANCED".into(),
            message: "debits 10 credits 9".into(),
        };
        assert_eq!(violation.category(), NotificationEvent::ConsistencyViolation);
    }

    #[tokio::test]
    async fn test_tick_without_interval_never_fires() {
        let fired = tokio::time::timeout(Duration::from_millis(20), tick(None)).await;
        assert!(fired.is_err());
    }
}
