//! Multi-currency valuation service.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ledgerwise_core::currency::{
    CurrencyError, CurrencyRate, ForexTransaction, RateBook, RateSource,
};
use ledgerwise_core::document::{Document, DocumentBody, DocumentError, TradeValuation};
use ledgerwise_shared::types::{CurrencyCode, DocumentId, Money};
use parking_lot::{RwLock, RwLockReadGuard};
use rust_decimal::Decimal;
use tracing::{debug, info};

/// Rate history plus the forex records derived from documents.
///
/// The rate history is append-only, so a conversion as of a past instant
/// gives the same answer after later rates are recorded.
#[derive(Debug)]
pub struct ValuationService {
    rates: RwLock<RateBook>,
    precision: u32,
    forex: DashMap<DocumentId, ForexTransaction>,
}

impl ValuationService {
    /// Creates a service for `home` with no rates recorded.
    #[must_use]
    pub fn new(home: CurrencyCode, precision: u32) -> Self {
        Self {
            rates: RwLock::new(RateBook::new(home)),
            precision,
            forex: DashMap::new(),
        }
    }

    /// The home currency.
    #[must_use]
    pub fn home_currency(&self) -> CurrencyCode {
        self.rates.read().home_currency().clone()
    }

    /// Appends a rate observation.
    ///
    /// # Errors
    ///
    /// `NonPositiveRate`, `DuplicateObservation` or `HomeCurrencyRate`.
    pub fn record_rate(
        &self,
        currency: CurrencyCode,
        rate_to_home: Decimal,
        effective_at: DateTime<Utc>,
    ) -> Result<CurrencyRate, CurrencyError> {
        let observation = CurrencyRate::new(currency, rate_to_home, effective_at);
        self.rates.write().record(observation.clone())?;
        info!(
            currency = %observation.currency,
            rate = %observation.rate_to_home,
            effective_at = %observation.effective_at,
            "Exchange rate recorded"
        );
        Ok(observation)
    }

    /// Rate to home effective at `as_of`.
    ///
    /// # Errors
    ///
    /// `NoRateAvailable`.
    pub fn rate_at(
        &self,
        currency: &CurrencyCode,
        as_of: DateTime<Utc>,
    ) -> Result<Decimal, CurrencyError> {
        self.rates.read().rate_to_home(currency, as_of)
    }

    /// Converts an amount at the rates effective at `as_of`.
    ///
    /// # Errors
    ///
    /// `NoRateAvailable` or `ConversionOverflow`.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
        as_of: DateTime<Utc>,
    ) -> Result<Decimal, CurrencyError> {
        self.rates
            .read()
            .convert(amount, from, to, as_of, self.precision)
    }

    /// Converts tagged money into `to`.
    ///
    /// # Errors
    ///
    /// `NoRateAvailable` or `ConversionOverflow`.
    pub fn convert_money(
        &self,
        money: &Money,
        to: &CurrencyCode,
        as_of: DateTime<Utc>,
    ) -> Result<Money, CurrencyError> {
        let amount = self.convert(money.amount, &money.currency, to, as_of)?;
        Ok(Money::new(amount, to.clone()))
    }

    /// Read access to the rate book, for translating documents.
    pub fn rates(&self) -> RwLockReadGuard<'_, RateBook> {
        self.rates.read()
    }

    /// Values a trade document and stores its forex record.
    ///
    /// Returns `None` for home-currency and non-trade documents. A document
    /// already recorded returns the stored record.
    ///
    /// # Errors
    ///
    /// Any valuation error of the document.
    pub fn record_forex(
        &self,
        document: &Document,
    ) -> Result<Option<ForexTransaction>, DocumentError> {
        let (DocumentBody::SalesInvoice(trade) | DocumentBody::PurchaseBill(trade)) =
            &document.body
        else {
            return Ok(None);
        };
        if let Some(existing) = self.forex_for(document.id) {
            return Ok(Some(existing));
        }
        let valuation = {
            let rates = self.rates.read();
            TradeValuation::value(document, trade, self.precision, &*rates)?
        };
        Ok(valuation
            .forex_transaction(document, trade)
            .map(|record| self.store_forex(record)))
    }

    /// Stores a forex record unless one exists for its document; returns the stored one.
    pub fn store_forex(&self, record: ForexTransaction) -> ForexTransaction {
        match self.forex.entry(record.document_id) {
            Entry::Occupied(existing) => {
                debug!(document_id = %record.document_id, "Forex record already stored");
                existing.get().clone()
            }
            Entry::Vacant(slot) => {
                info!(
                    document_id = %record.document_id,
                    currency = %record.original_currency,
                    home_amount = %record.home_amount,
                    gain_loss = %record
                        .settlement
                        .as_ref()
                        .map_or(Decimal::ZERO, |s| s.gain_loss),
                    "Forex transaction recorded"
                );
                slot.insert(record).clone()
            }
        }
    }

    /// Forex record for a document.
    #[must_use]
    pub fn forex_for(&self, document_id: DocumentId) -> Option<ForexTransaction> {
        self.forex.get(&document_id).map(|record| record.clone())
    }

    /// All forex records, ordered by document number.
    #[must_use]
    pub fn forex_transactions(&self) -> Vec<ForexTransaction> {
        let mut records: Vec<_> = self.forex.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.reference.cmp(&b.reference));
        records
    }
}
