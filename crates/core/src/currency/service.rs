//! Conversion arithmetic.
//!
//! All rounding uses Banker's Rounding (`MidpointNearestEven`) so repeated
//! conversions do not drift in one direction.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Stateless conversion helpers.
pub struct CurrencyService;

impl CurrencyService {
    /// Round a value to `precision` decimal places using Banker's Rounding.
    ///
    /// - 2.5 → 2
    /// - 3.5 → 4
    /// - 2.25 → 2.2 (at 1 decimal)
    #[must_use]
    pub fn round(value: Decimal, precision: u32) -> Decimal {
        value.round_dp_with_strategy(precision, RoundingStrategy::MidpointNearestEven)
    }

    /// Convert `amount` by `rate`, rounding the product once.
    ///
    /// Returns `None` on overflow.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use ledgerwise_core::currency::CurrencyService;
    ///
    /// assert_eq!(CurrencyService::convert(dec!(100), dec!(83.25), 2), Some(dec!(8325.00)));
    /// ```
    #[must_use]
    pub fn convert(amount: Decimal, rate: Decimal, precision: u32) -> Option<Decimal> {
        amount.checked_mul(rate).map(|v| Self::round(v, precision))
    }

    /// Convert between two foreign currencies via their rates to home:
    /// `amount * from_rate / to_rate`, rounded once.
    ///
    /// Returns `None` on overflow or a zero `to_rate`.
    #[must_use]
    pub fn cross_convert(
        amount: Decimal,
        from_rate: Decimal,
        to_rate: Decimal,
        precision: u32,
    ) -> Option<Decimal> {
        amount
            .checked_mul(from_rate)?
            .checked_div(to_rate)
            .map(|v| Self::round(v, precision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(2.5), 0, dec!(2))]
    #[case(dec!(3.5), 0, dec!(4))]
    #[case(dec!(2.25), 1, dec!(2.2))]
    #[case(dec!(2.35), 1, dec!(2.4))]
    #[case(dec!(-2.5), 0, dec!(-2))]
    fn test_bankers_rounding(#[case] value: Decimal, #[case] precision: u32, #[case] expected: Decimal) {
        assert_eq!(CurrencyService::round(value, precision), expected);
    }

    #[test]
    fn test_convert_rounds_once() {
        // 12.345 * 1.1 = 13.5795
        assert_eq!(CurrencyService::convert(dec!(12.345), dec!(1.1), 2), Some(dec!(13.58)));
    }

    #[test]
    fn test_cross_convert() {
        // 100 USD at 83.25 into GBP at 105.8: 8325 / 105.8 = 78.6862...
        assert_eq!(
            CurrencyService::cross_convert(dec!(100), dec!(83.25), dec!(105.8), 2),
            Some(dec!(78.69))
        );
    }

    #[test]
    fn test_cross_convert_zero_rate_is_none() {
        assert_eq!(CurrencyService::cross_convert(dec!(1), dec!(1), dec!(0), 2), None);
    }

    #[test]
    fn test_convert_overflow_is_none() {
        assert_eq!(CurrencyService::convert(Decimal::MAX, dec!(2), 2), None);
    }
}
