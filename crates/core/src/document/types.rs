//! Document domain types.

use chrono::{DateTime, Utc};
use ledgerwise_shared::types::{AccountId, CurrencyCode, DocumentId, ProductId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A document as fetched from the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID.
    pub id: DocumentId,
    /// Human-facing number, e.g. `INV-0001`.
    pub number: String,
    /// Issue instant; drives the accounting date and the transaction rate.
    pub issued_at: DateTime<Utc>,
    /// Author.
    pub created_by: UserId,
    /// Kind-specific payload.
    pub body: DocumentBody,
}

impl Document {
    /// The document kind.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        self.body.kind()
    }
}

/// Kind-specific document payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentBody {
    /// Sale to a customer.
    SalesInvoice(TradeDocument),
    /// Purchase from a supplier.
    PurchaseBill(TradeDocument),
    /// Movement through a bank account.
    BankTransaction(BankTransaction),
    /// Stock correction with no monetary effect.
    StockAdjustment(StockAdjustment),
}

impl DocumentBody {
    /// The document kind.
    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        match self {
            Self::SalesInvoice(_) => DocumentKind::SalesInvoice,
            Self::PurchaseBill(_) => DocumentKind::PurchaseBill,
            Self::BankTransaction(_) => DocumentKind::BankTransaction,
            Self::StockAdjustment(_) => DocumentKind::StockAdjustment,
        }
    }
}

/// Document kind tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Sales invoice.
    SalesInvoice,
    /// Purchase bill.
    PurchaseBill,
    /// Bank transaction.
    BankTransaction,
    /// Stock adjustment.
    StockAdjustment,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::SalesInvoice => "Sales invoice",
            Self::PurchaseBill => "Purchase bill",
            Self::BankTransaction => "Bank transaction",
            Self::StockAdjustment => "Stock adjustment",
        })
    }
}

/// Invoice or bill header with items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeDocument {
    /// Customer or supplier name.
    pub counterparty: String,
    /// Document currency.
    pub currency: CurrencyCode,
    /// Items in document order.
    pub items: Vec<LineItem>,
    /// Total as stated on the document. Never trusted.
    pub declared_total: Decimal,
    /// Payment status.
    pub status: PaymentStatus,
    /// Settlement instant for paid documents; defaults to `issued_at`.
    pub settled_at: Option<DateTime<Utc>>,
}

impl TradeDocument {
    /// True if the document is settled in full.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// One priced item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalogue product; services have none.
    pub product_id: Option<ProductId>,
    /// Description.
    pub description: String,
    /// Quantity, strictly positive.
    pub quantity: Decimal,
    /// Unit price in document currency.
    pub rate: Decimal,
    /// Tax amount in document currency.
    pub tax: Decimal,
}

/// Payment status of a trade document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Settled in full.
    Paid,
    /// Open.
    Unpaid,
    /// Partly settled; booked as open.
    PartiallyPaid,
}

/// A bank deposit, withdrawal or transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    /// Bank account; the configured default bank when absent.
    pub bank_account: Option<AccountId>,
    /// Account on the other side.
    pub counter_account: AccountId,
    /// Direction.
    pub kind: BankTransactionKind,
    /// Transaction currency.
    pub currency: CurrencyCode,
    /// Amount, strictly positive.
    pub amount: Decimal,
    /// Free text.
    pub description: String,
}

/// Bank transaction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankTransactionKind {
    /// Money in.
    Deposit,
    /// Money out.
    Withdrawal,
    /// Money out to another own account.
    Transfer,
}

impl std::fmt::Display for BankTransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Deposit => "Deposit",
            Self::Withdrawal => "Withdrawal",
            Self::Transfer => "Transfer",
        })
    }
}

/// Stock correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    /// Adjusted products.
    pub items: Vec<AdjustmentItem>,
}

/// One adjusted product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentItem {
    /// Product.
    pub product_id: ProductId,
    /// Signed quantity change.
    pub quantity: Decimal,
    /// Reason, e.g. "damaged".
    pub reason: String,
}
