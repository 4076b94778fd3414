//! Core bookkeeping logic for Ledgerwise.
//!
//! This crate contains pure business logic with ZERO storage or runtime dependencies.
//! All domain types, validation rules, and calculations live here; the stateful,
//! concurrency-safe components in `ledgerwise-store` call into it.
//!
//! # Modules
//!
//! - `chart` - Chart of accounts tree rules
//! - `ledger` - Double-entry journal validation, postings and reversals
//! - `currency` - Rate history, conversion and forex gain/loss
//! - `document` - Translation of business documents into ledger effects
//! - `inventory` - Stock cards and movement arithmetic
//! - `reports` - Trial balance aggregation and consistency checks

pub mod chart;
pub mod currency;
pub mod document;
pub mod inventory;
pub mod ledger;
pub mod reports;
