//! Business documents and their translation into ledger effects.
//!
//! Translation is pure: it produces a candidate journal entry, the stock
//! movements and the forex record for a document, or an error. Nothing is
//! posted here.

pub mod error;
pub mod translator;
pub mod types;
pub mod valuation;

pub use error::DocumentError;
pub use translator::{Derivation, DocumentTranslator, PostingAccountIds};
pub use types::{
    AdjustmentItem, BankTransaction, BankTransactionKind, Document, DocumentBody, DocumentKind,
    LineItem, PaymentStatus, StockAdjustment, TradeDocument,
};
pub use valuation::TradeValuation;
