//! Multi-currency valuation.
//!
//! Rates are stored as "units of home currency per one unit of foreign
//! currency". History is append-only; lookups pick the latest observation
//! effective at or before the requested instant.

pub mod error;
pub mod forex;
pub mod rate;
pub mod service;

#[cfg(test)]
mod props;

pub use error::CurrencyError;
pub use forex::{ForexSettlement, ForexTransaction};
pub use rate::{CurrencyRate, RateBook, RateHistory, RateSource};
pub use service::CurrencyService;
