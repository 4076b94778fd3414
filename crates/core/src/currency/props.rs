//! Property-based tests for rate lookup and conversion.

use chrono::{DateTime, Duration, TimeZone, Utc};
use ledgerwise_shared::types::CurrencyCode;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::rate::{CurrencyRate, RateBook, RateSource};
use super::service::CurrencyService;

/// Amounts from 0.01 to 1,000,000.00.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Rates from 0.0001 to 10,000.0000.
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

fn usd() -> CurrencyCode {
    CurrencyCode::new("USD").unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Converted amounts carry at most `precision` decimal places.
    #[test]
    fn prop_convert_respects_precision(
        amount in positive_amount(),
        rate in positive_rate(),
        precision in 0u32..=4,
    ) {
        let result = CurrencyService::convert(amount, rate, precision).unwrap();
        prop_assert!(result.scale() <= precision);
    }

    /// Rounding never moves a value by more than half a minor unit.
    #[test]
    fn prop_rounding_error_bounded(amount in positive_amount(), rate in positive_rate()) {
        let exact = amount * rate;
        let rounded = CurrencyService::convert(amount, rate, 2).unwrap();
        prop_assert!((exact - rounded).abs() <= Decimal::new(5, 3));
    }

    /// The rate used is the latest one effective at or before the lookup instant,
    /// regardless of the order observations were recorded in.
    #[test]
    fn prop_lookup_picks_latest_effective(
        offsets in prop::collection::btree_set(0i64..1_000, 1..20),
        hour in 0i64..1_100,
        reverse_insert in any::<bool>(),
    ) {
        let mut offsets: Vec<i64> = offsets.into_iter().collect();
        if reverse_insert {
            offsets.reverse();
        }
        let mut book = RateBook::new(CurrencyCode::new("INR").unwrap());
        for offset in &offsets {
            let rate = Decimal::from(offset + 1);
            book.record(CurrencyRate::new(usd(), rate, epoch() + Duration::hours(*offset)))
                .unwrap();
        }

        let expected = offsets.iter().copied().filter(|o| *o <= hour).max();
        let found = book.rate_to_home(&usd(), epoch() + Duration::hours(hour)).ok();
        prop_assert_eq!(found, expected.map(|o| Decimal::from(o + 1)));
    }

    /// Recording a newer rate never changes a conversion as of an earlier instant.
    #[test]
    fn prop_history_is_reproducible(
        amount in positive_amount(),
        first in positive_rate(),
        second in positive_rate(),
    ) {
        let inr = CurrencyCode::new("INR").unwrap();
        let mut book = RateBook::new(inr.clone());
        book.record(CurrencyRate::new(usd(), first, epoch())).unwrap();
        let before = book.convert(amount, &usd(), &inr, epoch(), 2).unwrap();

        book.record(CurrencyRate::new(usd(), second, epoch() + Duration::days(1))).unwrap();
        let after = book.convert(amount, &usd(), &inr, epoch(), 2).unwrap();
        prop_assert_eq!(before, after);
    }
}
