//! Inventory errors.

use ledgerwise_shared::ErrorKind;
use ledgerwise_shared::types::ProductId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by stock movements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    /// The movement would take stock below zero.
    #[error("Insufficient stock for product {product_id}: balance {balance}, movement {delta}")]
    NegativeStock {
        /// Product.
        product_id: ProductId,
        /// Balance before the movement.
        balance: Decimal,
        /// Requested change.
        delta: Decimal,
    },

    /// Unknown product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Product already registered.
    #[error("Product already registered: {0}")]
    DuplicateProduct(ProductId),

    /// Zero movement or negative opening stock.
    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity {
        /// Product.
        product_id: ProductId,
        /// Rejected quantity.
        quantity: Decimal,
    },
}

impl InventoryError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeStock { .. } => "NEGATIVE_STOCK",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::DuplicateProduct(_) => "DUPLICATE_PRODUCT",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ProductNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
