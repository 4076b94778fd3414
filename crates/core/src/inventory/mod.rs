//! Inventory stock cards.
//!
//! A stock card holds a product's opening stock and its append-only movement
//! history. The balance after every movement is `previous + delta`; it is
//! never set directly.

pub mod card;
pub mod error;
pub mod types;

#[cfg(test)]
mod card_props;

pub use card::StockCard;
pub use error::InventoryError;
pub use types::{MovementKind, MovementRequest, ProductStock, StockMovement};
