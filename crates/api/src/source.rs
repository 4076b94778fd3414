//! Document source collaborator.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use ledgerwise_core::document::Document;
use ledgerwise_shared::types::DocumentId;
use thiserror::Error;
use tokio::sync::RwLock;

/// Failures of the external document store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The store could not be reached.
    #[error("Document source unavailable: {0}")]
    Unavailable(String),

    /// The store returned something that is not a document.
    #[error("Malformed document {id}: {reason}")]
    Malformed {
        /// Document ID.
        id: DocumentId,
        /// What was wrong.
        reason: String,
    },
}

/// Read-only access to invoices, bills, bank transactions and adjustments.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetches a document by id.
    async fn fetch(&self, id: DocumentId) -> Result<Option<Document>, SourceError>;

    /// Documents that still need posting.
    async fn pending(&self) -> Result<Vec<DocumentId>, SourceError>;

    /// Marks a document as handled so `pending` stops returning it.
    async fn acknowledge(&self, _id: DocumentId) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Document store held in memory, used by the seeder and tests.
#[derive(Debug, Default)]
pub struct InMemoryDocumentSource {
    documents: RwLock<BTreeMap<DocumentId, Document>>,
    pending: RwLock<BTreeSet<DocumentId>>,
}

impl InMemoryDocumentSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a document and marks it pending.
    pub async fn insert(&self, document: Document) -> DocumentId {
        let id = document.id;
        self.documents.write().await.insert(id, document);
        self.pending.write().await.insert(id);
        id
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn fetch(&self, id: DocumentId) -> Result<Option<Document>, SourceError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn pending(&self) -> Result<Vec<DocumentId>, SourceError> {
        Ok(self.pending.read().await.iter().copied().collect())
    }

    async fn acknowledge(&self, id: DocumentId) -> Result<(), SourceError> {
        self.pending.write().await.remove(&id);
        Ok(())
    }
}
