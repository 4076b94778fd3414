//! Inventory ledger.
//!
//! One stock card per product, each behind its own mutex. A batch locks its
//! products in ascending id order, so batches touching overlapping products
//! cannot deadlock and never compute a balance from a stale read.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ledgerwise_core::inventory::{
    InventoryError, MovementRequest, ProductStock, StockCard, StockMovement,
};
use ledgerwise_shared::types::ProductId;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{info, warn};

/// Thread-safe stock ledger.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    cards: DashMap<ProductId, Arc<Mutex<StockCard>>>,
    default_backorder: bool,
}

impl InventoryLedger {
    /// Creates an empty ledger; `default_backorder` applies to [`Self::register`].
    #[must_use]
    pub fn new(default_backorder: bool) -> Self {
        Self {
            cards: DashMap::new(),
            default_backorder,
        }
    }

    /// Registers a product under the ledger's default backorder policy.
    ///
    /// # Errors
    ///
    /// `DuplicateProduct` or `InvalidQuantity`.
    pub fn register(
        &self,
        product_id: ProductId,
        sku: impl Into<String>,
        opening_stock: Decimal,
    ) -> Result<(), InventoryError> {
        self.register_product(ProductStock {
            product_id,
            sku: sku.into(),
            opening_stock,
            allow_backorder: self.default_backorder,
        })
    }

    /// Registers a product with an explicit policy.
    ///
    /// # Errors
    ///
    /// `DuplicateProduct` or `InvalidQuantity`.
    pub fn register_product(&self, product: ProductStock) -> Result<(), InventoryError> {
        let product_id = product.product_id;
        match self.cards.entry(product_id) {
            Entry::Occupied(_) => Err(InventoryError::DuplicateProduct(product_id)),
            Entry::Vacant(slot) => {
                let card = StockCard::open(product)?;
                info!(
                    product_id = %product_id,
                    sku = %card.product().sku,
                    opening_stock = %card.balance(),
                    "Product registered"
                );
                slot.insert(Arc::new(Mutex::new(card)));
                Ok(())
            }
        }
    }

    /// Applies one movement.
    ///
    /// # Errors
    ///
    /// `ProductNotFound`, `InvalidQuantity` or `NegativeStock`.
    pub fn apply_movement(&self, request: MovementRequest) -> Result<StockMovement, InventoryError> {
        let card = self.card(request.product_id)?;
        let movement = card.lock().apply(&request).inspect_err(|err| {
            warn!(product_id = %request.product_id, error = %err, "Stock movement rejected");
        })?;
        info!(
            product_id = %movement.product_id,
            quantity = %movement.quantity,
            balance = %movement.balance,
            sequence = movement.sequence,
            "Stock movement applied"
        );
        Ok(movement)
    }

    /// Applies a batch of movements together with another commit.
    ///
    /// Every touched product stays locked while the batch is validated in
    /// request order and `before_commit` runs. The movements are appended only
    /// if `before_commit` succeeds; on any error nothing is appended.
    ///
    /// # Errors
    ///
    /// An inventory error for the first offending request, or the error of
    /// `before_commit`.
    pub fn apply_batch_with<T, E, F>(
        &self,
        requests: &[MovementRequest],
        before_commit: F,
    ) -> Result<(T, Vec<StockMovement>), E>
    where
        E: From<InventoryError>,
        F: FnOnce() -> Result<T, E>,
    {
        let mut cards = BTreeMap::new();
        for request in requests {
            if !cards.contains_key(&request.product_id) {
                cards.insert(request.product_id, self.card(request.product_id)?);
            }
        }
        let mut guards: HashMap<ProductId, _> = cards
            .iter()
            .map(|(id, card)| (*id, card.lock()))
            .collect();

        let mut running: HashMap<ProductId, Decimal> = HashMap::new();
        for request in requests {
            let card = &guards[&request.product_id];
            let from = running
                .get(&request.product_id)
                .copied()
                .unwrap_or_else(|| card.balance());
            let next = card.check(from, request).inspect_err(|err| {
                warn!(product_id = %request.product_id, error = %err, "Stock batch rejected");
            })?;
            running.insert(request.product_id, next);
        }

        let value = before_commit()?;

        let mut movements = Vec::with_capacity(requests.len());
        for request in requests {
            if let Some(card) = guards.get_mut(&request.product_id) {
                movements.push(card.apply(request)?);
            }
        }
        drop(guards);
        for movement in &movements {
            info!(
                product_id = %movement.product_id,
                quantity = %movement.quantity,
                balance = %movement.balance,
                sequence = movement.sequence,
                "Stock movement applied"
            );
        }
        Ok((value, movements))
    }

    /// Current balance.
    ///
    /// # Errors
    ///
    /// `ProductNotFound`.
    pub fn stock_balance(&self, product_id: ProductId) -> Result<Decimal, InventoryError> {
        Ok(self.card(product_id)?.lock().balance())
    }

    /// Balance after the movement with sequence `seq`; the opening stock for 0.
    ///
    /// # Errors
    ///
    /// `ProductNotFound`.
    pub fn balance_at_sequence(
        &self,
        product_id: ProductId,
        seq: u64,
    ) -> Result<Decimal, InventoryError> {
        Ok(self.card(product_id)?.lock().balance_at_sequence(seq))
    }

    /// Movements of a product, oldest first.
    ///
    /// # Errors
    ///
    /// `ProductNotFound`.
    pub fn movements(&self, product_id: ProductId) -> Result<Vec<StockMovement>, InventoryError> {
        Ok(self.card(product_id)?.lock().movements().to_vec())
    }

    /// Registered products in ascending id order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.cards.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub(crate) fn card(&self, product_id: ProductId) -> Result<Arc<Mutex<StockCard>>, InventoryError> {
        self.cards
            .get(&product_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(InventoryError::ProductNotFound(product_id))
    }
}
