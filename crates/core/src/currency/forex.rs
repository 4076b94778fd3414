//! Foreign-exchange records derived from trade documents.
//!
//! These are always computed from the document and the rate history; callers
//! never supply gain/loss figures.

use chrono::{DateTime, Utc};
use ledgerwise_shared::types::{CurrencyCode, DocumentId, ForexTransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::DocumentKind;

/// Valuation of one foreign-currency document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForexTransaction {
    /// Record ID.
    pub id: ForexTransactionId,
    /// Source document.
    pub document_id: DocumentId,
    /// Sales invoice or purchase bill.
    pub document_kind: DocumentKind,
    /// Document number.
    pub reference: String,
    /// Customer or supplier.
    pub counterparty: String,
    /// Document currency.
    pub original_currency: CurrencyCode,
    /// Document total in its own currency.
    pub original_amount: Decimal,
    /// Rate to home at issue time.
    pub transaction_rate: Decimal,
    /// Home amount booked at the transaction rate.
    pub home_amount: Decimal,
    /// Present once the document is settled.
    pub settlement: Option<ForexSettlement>,
}

impl ForexTransaction {
    /// Realised gain (positive) or loss (negative) from the holder's point of view.
    ///
    /// For receivables a higher settlement value is a gain; for payables it is a loss.
    #[must_use]
    pub fn realised_gain(&self) -> Decimal {
        let Some(settlement) = &self.settlement else {
            return Decimal::ZERO;
        };
        match self.document_kind {
            DocumentKind::PurchaseBill => -settlement.gain_loss,
            _ => settlement.gain_loss,
        }
    }
}

/// Settlement leg of a foreign-currency document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForexSettlement {
    /// Settlement instant.
    pub settled_at: DateTime<Utc>,
    /// Rate to home at settlement.
    pub settlement_rate: Decimal,
    /// Document total valued at the settlement rate.
    pub settlement_home_amount: Decimal,
    /// `settlement_home_amount - home_amount`.
    pub gain_loss: Decimal,
}

impl ForexSettlement {
    /// Builds a settlement against the transaction-rate home amount.
    #[must_use]
    pub fn new(
        settled_at: DateTime<Utc>,
        settlement_rate: Decimal,
        settlement_home_amount: Decimal,
        home_amount: Decimal,
    ) -> Self {
        Self {
            settled_at,
            settlement_rate,
            settlement_home_amount,
            gain_loss: settlement_home_amount - home_amount,
        }
    }
}
