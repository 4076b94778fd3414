//! Rate history and lookup.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ledgerwise_shared::types::CurrencyCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::CurrencyError;
use super::service::CurrencyService;

/// One rate observation: one unit of `currency` is worth `rate_to_home` home units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRate {
    /// Foreign currency.
    pub currency: CurrencyCode,
    /// Home units per foreign unit.
    pub rate_to_home: Decimal,
    /// Instant from which the rate applies.
    pub effective_at: DateTime<Utc>,
    /// Instant the observation was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl CurrencyRate {
    /// Creates an observation recorded now.
    #[must_use]
    pub fn new(currency: CurrencyCode, rate_to_home: Decimal, effective_at: DateTime<Utc>) -> Self {
        Self {
            currency,
            rate_to_home,
            effective_at,
            recorded_at: Utc::now(),
        }
    }
}

/// Append-only observations for one currency, ordered by `effective_at`.
#[derive(Debug, Clone, Default)]
pub struct RateHistory {
    observations: Vec<CurrencyRate>,
}

impl RateHistory {
    /// Inserts an observation, keeping effective order.
    ///
    /// # Errors
    ///
    /// `NonPositiveRate` or `DuplicateObservation`.
    pub fn record(&mut self, rate: CurrencyRate) -> Result<(), CurrencyError> {
        if rate.rate_to_home <= Decimal::ZERO {
            return Err(CurrencyError::NonPositiveRate {
                currency: rate.currency,
                rate: rate.rate_to_home,
            });
        }
        match self
            .observations
            .binary_search_by(|held| held.effective_at.cmp(&rate.effective_at))
        {
            Ok(_) => Err(CurrencyError::DuplicateObservation {
                currency: rate.currency,
                effective_at: rate.effective_at,
            }),
            Err(position) => {
                self.observations.insert(position, rate);
                Ok(())
            }
        }
    }

    /// Latest observation effective at or before `as_of`.
    #[must_use]
    pub fn rate_at(&self, as_of: DateTime<Utc>) -> Option<&CurrencyRate> {
        let upto = self
            .observations
            .partition_point(|held| held.effective_at <= as_of);
        upto.checked_sub(1).map(|index| &self.observations[index])
    }

    /// All observations in effective order.
    #[must_use]
    pub fn observations(&self) -> &[CurrencyRate] {
        &self.observations
    }
}

/// Something that can answer "how many home units is one unit of `currency` worth at `as_of`".
pub trait RateSource {
    /// Home currency of the ledger.
    fn home_currency(&self) -> &CurrencyCode;

    /// Rate to home effective at `as_of`; 1 for the home currency.
    ///
    /// # Errors
    ///
    /// `NoRateAvailable` when no observation is effective yet.
    fn rate_to_home(
        &self,
        currency: &CurrencyCode,
        as_of: DateTime<Utc>,
    ) -> Result<Decimal, CurrencyError>;
}

/// Rate histories for every foreign currency of one ledger.
#[derive(Debug, Clone)]
pub struct RateBook {
    home: CurrencyCode,
    histories: HashMap<CurrencyCode, RateHistory>,
}

impl RateBook {
    /// Creates an empty book for `home`.
    #[must_use]
    pub fn new(home: CurrencyCode) -> Self {
        Self {
            home,
            histories: HashMap::new(),
        }
    }

    /// Appends an observation.
    ///
    /// # Errors
    ///
    /// `HomeCurrencyRate`, `NonPositiveRate` or `DuplicateObservation`.
    pub fn record(&mut self, rate: CurrencyRate) -> Result<(), CurrencyError> {
        if rate.currency == self.home {
            return Err(CurrencyError::HomeCurrencyRate(rate.currency));
        }
        self.histories
            .entry(rate.currency.clone())
            .or_default()
            .record(rate)
    }

    /// History for one currency.
    #[must_use]
    pub fn history(&self, currency: &CurrencyCode) -> Option<&RateHistory> {
        self.histories.get(currency)
    }

    /// Currencies with at least one observation, sorted.
    #[must_use]
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut codes: Vec<CurrencyCode> = self.histories.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Converts `amount` from one currency to another at the rates effective at `as_of`,
    /// rounding once to `precision`.
    ///
    /// # Errors
    ///
    /// `NoRateAvailable` for either leg, or `ConversionOverflow`.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
        as_of: DateTime<Utc>,
        precision: u32,
    ) -> Result<Decimal, CurrencyError> {
        if from == to {
            return Ok(CurrencyService::round(amount, precision));
        }
        let from_rate = self.rate_to_home(from, as_of)?;
        let to_rate = self.rate_to_home(to, as_of)?;
        CurrencyService::cross_convert(amount, from_rate, to_rate, precision).ok_or_else(|| {
            CurrencyError::ConversionOverflow {
                amount,
                currency: from.clone(),
            }
        })
    }
}

impl RateSource for RateBook {
    fn home_currency(&self) -> &CurrencyCode {
        &self.home
    }

    fn rate_to_home(
        &self,
        currency: &CurrencyCode,
        as_of: DateTime<Utc>,
    ) -> Result<Decimal, CurrencyError> {
        if *currency == self.home {
            return Ok(Decimal::ONE);
        }
        self.histories
            .get(currency)
            .and_then(|history| history.rate_at(as_of))
            .map(|rate| rate.rate_to_home)
            .ok_or_else(|| CurrencyError::NoRateAvailable {
                currency: currency.clone(),
                as_of,
            })
    }
}
