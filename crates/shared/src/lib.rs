//! Shared types, errors, and configuration for Ledgerwise.
//!
//! This crate provides common types used across all other crates:
//! - Money and currency codes with fixed-point precision
//! - Typed IDs for type-safe entity references
//! - Error categories and the boundary error type
//! - Configuration management, including the ledger settings aggregate

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LedgerSettings};
pub use error::{AppError, AppResult, ErrorKind};
