//! Exposed bookkeeping operations for Ledgerwise.
//!
//! This crate provides:
//! - `Bookkeeper`: derive-and-post, balances, trial balance, stock and conversion
//! - `DocumentSource`: the external document store collaborator
//! - `DocumentListener`: the notification worker that feeds documents in
//! - `BookkeeperError`: every failure, convertible to the boundary `AppError`

pub mod bookkeeper;
pub mod error;
pub mod listener;
pub mod source;

pub use bookkeeper::{Bookkeeper, DocumentPosting};
pub use error::BookkeeperError;
pub use listener::{DocumentListener, ListenerStats, WorkerEvent};
pub use source::{DocumentSource, InMemoryDocumentSource, SourceError};
