//! Inventory types.

use chrono::NaiveDate;
use ledgerwise_shared::types::{DocumentId, ProductId, StockMovementId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stock-relevant attributes of a catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
    /// Product ID.
    pub product_id: ProductId,
    /// Stock keeping unit.
    pub sku: String,
    /// Stock on hand before the first movement.
    pub opening_stock: Decimal,
    /// Whether the balance may go below zero.
    pub allow_backorder: bool,
}

/// Why stock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Initial stock take.
    Opening,
    /// Goods sold.
    Sale,
    /// Goods purchased.
    Purchase,
    /// Manual correction.
    Adjustment,
}

/// A requested stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    /// Product.
    pub product_id: ProductId,
    /// Reason.
    pub kind: MovementKind,
    /// Signed quantity change.
    pub quantity: Decimal,
    /// Movement date.
    pub date: NaiveDate,
    /// Source document.
    pub document_id: Option<DocumentId>,
    /// Document number or free-text reference.
    pub reference: String,
}

/// A recorded stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    /// Movement ID.
    pub id: StockMovementId,
    /// Product.
    pub product_id: ProductId,
    /// Reason.
    pub kind: MovementKind,
    /// Signed quantity change.
    pub quantity: Decimal,
    /// Movement date.
    pub date: NaiveDate,
    /// Per-product sequence number, starting at 1.
    pub sequence: u64,
    /// Source document.
    pub document_id: Option<DocumentId>,
    /// Reference.
    pub reference: String,
    /// Balance after this movement.
    pub balance: Decimal,
}
