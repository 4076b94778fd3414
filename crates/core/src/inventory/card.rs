//! Per-product stock card.

use ledgerwise_shared::types::{ProductId, StockMovementId};
use rust_decimal::Decimal;

use super::error::InventoryError;
use super::types::{MovementRequest, ProductStock, StockMovement};

/// Opening stock plus the append-only movement history of one product.
#[derive(Debug, Clone)]
pub struct StockCard {
    product: ProductStock,
    movements: Vec<StockMovement>,
}

impl StockCard {
    /// Opens a card.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for a negative opening stock.
    pub fn open(product: ProductStock) -> Result<Self, InventoryError> {
        if product.opening_stock < Decimal::ZERO {
            return Err(InventoryError::InvalidQuantity {
                product_id: product.product_id,
                quantity: product.opening_stock,
            });
        }
        Ok(Self {
            product,
            movements: Vec::new(),
        })
    }

    /// Product ID.
    #[must_use]
    pub fn product_id(&self) -> ProductId {
        self.product.product_id
    }

    /// Product policy.
    #[must_use]
    pub fn product(&self) -> &ProductStock {
        &self.product
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.movements
            .last()
            .map_or(self.product.opening_stock, |m| m.balance)
    }

    /// Sequence number of the last movement; 0 when there is none.
    #[must_use]
    pub fn last_sequence(&self) -> u64 {
        self.movements.last().map_or(0, |m| m.sequence)
    }

    /// Recorded movements, oldest first.
    #[must_use]
    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    /// Checks a sequence of requests against the current balance without applying them.
    ///
    /// Returns the balance after the last request.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` or `NegativeStock` for the first offending request.
    pub fn preview<'a, I>(&self, requests: I) -> Result<Decimal, InventoryError>
    where
        I: IntoIterator<Item = &'a MovementRequest>,
    {
        let mut balance = self.balance();
        for request in requests {
            balance = self.check(balance, request)?;
        }
        Ok(balance)
    }

    /// Appends one movement.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` or `NegativeStock`; the card is unchanged on error.
    pub fn apply(&mut self, request: &MovementRequest) -> Result<StockMovement, InventoryError> {
        let balance = self.check(self.balance(), request)?;
        let movement = StockMovement {
            id: StockMovementId::new(),
            product_id: self.product.product_id,
            kind: request.kind,
            quantity: request.quantity,
            date: request.date,
            sequence: self.last_sequence() + 1,
            document_id: request.document_id,
            reference: request.reference.clone(),
            balance,
        };
        self.movements.push(movement.clone());
        Ok(movement)
    }

    /// `opening_stock + sum(quantity)` over movements with `sequence <= seq`.
    #[must_use]
    pub fn balance_at_sequence(&self, seq: u64) -> Decimal {
        self.movements
            .iter()
            .take_while(|m| m.sequence <= seq)
            .fold(self.product.opening_stock, |acc, m| acc + m.quantity)
    }

    /// Balance recomputed from the opening stock and every movement.
    #[must_use]
    pub fn recomputed(&self) -> Decimal {
        self.balance_at_sequence(u64::MAX)
    }

    /// Balance after applying `request` on top of `balance`.
    ///
    /// # Errors
    ///
    /// `ProductNotFound` for a request aimed at another product, `InvalidQuantity`
    /// for a zero change, `NegativeStock` when backorders are not allowed.
    pub fn check(
        &self,
        balance: Decimal,
        request: &MovementRequest,
    ) -> Result<Decimal, InventoryError> {
        let product_id = self.product.product_id;
        if request.product_id != product_id {
            return Err(InventoryError::ProductNotFound(request.product_id));
        }
        if request.quantity.is_zero() {
            return Err(InventoryError::InvalidQuantity {
                product_id,
                quantity: request.quantity,
            });
        }
        let negative = InventoryError::NegativeStock {
            product_id,
            balance,
            delta: request.quantity,
        };
        let next = balance.checked_add(request.quantity).ok_or_else(|| negative.clone())?;
        if next < Decimal::ZERO && !self.product.allow_backorder {
            return Err(negative);
        }
        Ok(next)
    }
}
