//! Recomputation and home-currency valuation of trade documents.

use ledgerwise_shared::types::{ForexTransactionId, ProductId, to_minor_units};
use rust_decimal::Decimal;

use super::error::DocumentError;
use super::types::{Document, TradeDocument};
use crate::currency::{
    CurrencyError, CurrencyService, ForexSettlement, ForexTransaction, RateSource,
};

/// One item valued in home currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuedItem {
    /// Catalogue product, if any.
    pub product_id: Option<ProductId>,
    /// Item description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// `quantity * rate` in home currency.
    pub home_amount: Decimal,
    /// Tax in home currency.
    pub home_tax: Decimal,
}

/// A trade document after its total has been recomputed and its lines valued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeValuation {
    /// Recomputed total in document currency.
    pub document_total: Decimal,
    /// Rate to home at issue.
    pub transaction_rate: Decimal,
    /// Items in document order.
    pub items: Vec<ValuedItem>,
    /// Sum of converted item amounts and taxes.
    pub home_total: Decimal,
    /// Settlement leg for paid foreign-currency documents.
    pub settlement: Option<ForexSettlement>,
    foreign: bool,
}

impl TradeValuation {
    /// Validates items, recomputes the total and values every line in home currency.
    ///
    /// # Errors
    ///
    /// `EmptyDocument`, `InvalidItem`, `DocumentNotBalanced`, `ZeroValue`,
    /// `InvalidDocument` or a rate error.
    pub fn value<R: RateSource>(
        document: &Document,
        trade: &TradeDocument,
        precision: u32,
        rates: &R,
    ) -> Result<Self, DocumentError> {
        if trade.counterparty.trim().is_empty() {
            return Err(DocumentError::InvalidDocument(
                "counterparty must not be blank".into(),
            ));
        }
        if trade.items.is_empty() {
            return Err(DocumentError::EmptyDocument);
        }

        let mut amounts = Vec::with_capacity(trade.items.len());
        let mut computed = Decimal::ZERO;
        for (index, item) in trade.items.iter().enumerate() {
            let invalid = |reason: String| DocumentError::InvalidItem { index, reason };
            if item.quantity <= Decimal::ZERO {
                return Err(invalid("quantity must be positive".into()));
            }
            if item.rate < Decimal::ZERO {
                return Err(invalid("rate must not be negative".into()));
            }
            if item.tax < Decimal::ZERO {
                return Err(invalid("tax must not be negative".into()));
            }
            if to_minor_units(item.tax, precision).is_none() {
                return Err(invalid(format!(
                    "tax has more than {precision} decimal places"
                )));
            }
            let amount = CurrencyService::convert(item.quantity, item.rate, precision)
                .ok_or_else(|| invalid("amount overflows".into()))?;
            computed = computed
                .checked_add(amount)
                .and_then(|sum| sum.checked_add(item.tax))
                .ok_or_else(|| invalid("total overflows".into()))?;
            amounts.push(amount);
        }

        if computed != trade.declared_total {
            return Err(DocumentError::DocumentNotBalanced {
                declared: trade.declared_total,
                computed,
            });
        }
        if computed.is_zero() {
            return Err(DocumentError::ZeroValue);
        }

        let home = rates.home_currency().clone();
        let foreign = trade.currency != home;
        let transaction_rate = rates.rate_to_home(&trade.currency, document.issued_at)?;
        let (converted, home_total) =
            convert_lines(trade, &amounts, transaction_rate, precision)?;
        let items = trade
            .items
            .iter()
            .zip(converted)
            .map(|(item, (home_amount, home_tax))| ValuedItem {
                product_id: item.product_id,
                description: item.description.clone(),
                quantity: item.quantity,
                home_amount,
                home_tax,
            })
            .collect();

        let settlement = if foreign && trade.is_settled() {
            let settled_at = trade.settled_at.unwrap_or(document.issued_at);
            if settled_at < document.issued_at {
                return Err(DocumentError::InvalidDocument(
                    "settlement precedes issue".into(),
                ));
            }
            let settlement_rate = rates.rate_to_home(&trade.currency, settled_at)?;
            // Both legs are valued line by line so equal rates give no difference.
            let (_, settlement_home) = convert_lines(trade, &amounts, settlement_rate, precision)?;
            Some(ForexSettlement::new(
                settled_at,
                settlement_rate,
                settlement_home,
                home_total,
            ))
        } else {
            None
        };

        Ok(Self {
            document_total: computed,
            transaction_rate,
            items,
            home_total,
            settlement,
            foreign,
        })
    }

    /// Home amount of the receivable, payable or cash line.
    #[must_use]
    pub fn counter_amount(&self) -> Decimal {
        self.settlement
            .as_ref()
            .map_or(self.home_total, |s| s.settlement_home_amount)
    }

    /// Settlement value minus transaction value; zero when there is no settlement.
    #[must_use]
    pub fn forex_difference(&self) -> Decimal {
        self.settlement.as_ref().map_or(Decimal::ZERO, |s| s.gain_loss)
    }

    /// Forex record for foreign-currency documents.
    #[must_use]
    pub fn forex_transaction(
        &self,
        document: &Document,
        trade: &TradeDocument,
    ) -> Option<ForexTransaction> {
        if !self.foreign {
            return None;
        }
        Some(ForexTransaction {
            id: ForexTransactionId::new(),
            document_id: document.id,
            document_kind: document.kind(),
            reference: document.number.clone(),
            counterparty: trade.counterparty.clone(),
            original_currency: trade.currency.clone(),
            original_amount: self.document_total,
            transaction_rate: self.transaction_rate,
            home_amount: self.home_total,
            settlement: self.settlement.clone(),
        })
    }
}

/// Converts each item amount and tax at `rate`; returns the lines and their sum.
fn convert_lines(
    trade: &TradeDocument,
    amounts: &[Decimal],
    rate: Decimal,
    precision: u32,
) -> Result<(Vec<(Decimal, Decimal)>, Decimal), CurrencyError> {
    let overflow = |amount: Decimal| CurrencyError::ConversionOverflow {
        amount,
        currency: trade.currency.clone(),
    };
    let to_home =
        |value: Decimal| CurrencyService::convert(value, rate, precision).ok_or_else(|| overflow(value));

    let mut lines = Vec::with_capacity(amounts.len());
    let mut total = Decimal::ZERO;
    for (item, &amount) in trade.items.iter().zip(amounts) {
        let home_amount = to_home(amount)?;
        let home_tax = to_home(item.tax)?;
        total = total
            .checked_add(home_amount)
            .and_then(|sum| sum.checked_add(home_tax))
            .ok_or_else(|| overflow(amount))?;
        lines.push((home_amount, home_tax));
    }
    Ok((lines, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::{CurrencyRate, RateBook};
    use crate::document::types::{DocumentBody, LineItem, PaymentStatus};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ledgerwise_shared::types::{CurrencyCode, DocumentId, UserId};
    use rust_decimal_macros::dec;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()
    }

    fn rates() -> RateBook {
        let mut book = RateBook::new(code("INR"));
        book.record(CurrencyRate::new(code("USD"), dec!(83), issued() - Duration::days(1)))
            .unwrap();
        book.record(CurrencyRate::new(code("USD"), dec!(85), issued() + Duration::days(5)))
            .unwrap();
        book
    }

    fn item(quantity: Decimal, rate: Decimal, tax: Decimal) -> LineItem {
        LineItem {
            product_id: None,
            description: "widget".into(),
            quantity,
            rate,
            tax,
        }
    }

    fn trade(currency: &str, items: Vec<LineItem>, declared: Decimal) -> TradeDocument {
        TradeDocument {
            counterparty: "Acme".into(),
            currency: code(currency),
            items,
            declared_total: declared,
            status: PaymentStatus::Unpaid,
            settled_at: None,
        }
    }

    fn document(trade: &TradeDocument) -> Document {
        Document {
            id: DocumentId::new(),
            number: "INV-0001".into(),
            issued_at: issued(),
            created_by: UserId::new(),
            body: DocumentBody::SalesInvoice(trade.clone()),
        }
    }

    #[test]
    fn test_declared_total_is_recomputed() {
        let trade = trade("INR", vec![item(dec!(3), dec!(30000), dec!(18000))], dec!(118000));
        let result = TradeValuation::value(&document(&trade), &trade, 2, &rates());
        assert_eq!(
            result,
            Err(DocumentError::DocumentNotBalanced {
                declared: dec!(118000),
                computed: dec!(108000),
            })
        );
    }

    #[test]
    fn test_home_currency_valuation() {
        let trade = trade(
            "INR",
            vec![item(dec!(2), dec!(45000), dec!(16200)), item(dec!(1), dec!(0.5), dec!(0))],
            dec!(106200.50),
        );
        let valuation = TradeValuation::value(&document(&trade), &trade, 2, &rates()).unwrap();
        assert_eq!(valuation.home_total, dec!(106200.50));
        assert_eq!(valuation.transaction_rate, Decimal::ONE);
        assert!(valuation.forex_transaction(&document(&trade), &trade).is_none());
    }

    #[test]
    fn test_item_amount_uses_bankers_rounding() {
        // 3 * 0.125 = 0.375 -> 0.38, 1 * 0.125 = 0.125 -> 0.12
        let trade = trade(
            "INR",
            vec![item(dec!(3), dec!(0.125), dec!(0)), item(dec!(1), dec!(0.125), dec!(0))],
            dec!(0.50),
        );
        let valuation = TradeValuation::value(&document(&trade), &trade, 2, &rates()).unwrap();
        assert_eq!(valuation.items[0].home_amount, dec!(0.38));
        assert_eq!(valuation.items[1].home_amount, dec!(0.12));
    }

    #[test]
    fn test_settled_foreign_document_has_settlement() {
        let mut trade = trade("USD", vec![item(dec!(1), dec!(100), dec!(0))], dec!(100));
        trade.status = PaymentStatus::Paid;
        trade.settled_at = Some(issued() + Duration::days(6));
        let doc = document(&trade);
        let valuation = TradeValuation::value(&doc, &trade, 2, &rates()).unwrap();

        assert_eq!(valuation.home_total, dec!(8300));
        assert_eq!(valuation.counter_amount(), dec!(8500));
        assert_eq!(valuation.forex_difference(), dec!(200));
        let fx = valuation.forex_transaction(&doc, &trade).unwrap();
        assert_eq!(fx.original_amount, dec!(100));
        assert_eq!(fx.transaction_rate, dec!(83));
        assert_eq!(fx.settlement.unwrap().settlement_rate, dec!(85));
    }

    #[test]
    fn test_same_rate_settlement_has_no_rounding_difference() {
        // Each 0.01 USD line converts to 0.83 at 83.25; the document total alone would give 2.50.
        let mut book = RateBook::new(code("INR"));
        book.record(CurrencyRate::new(code("USD"), dec!(83.25), issued() - Duration::days(1)))
            .unwrap();
        book.record(CurrencyRate::new(code("USD"), dec!(84.10), issued() + Duration::days(5)))
            .unwrap();
        let items = vec![
            item(dec!(1), dec!(0.01), dec!(0)),
            item(dec!(1), dec!(0.01), dec!(0)),
            item(dec!(1), dec!(0.01), dec!(0)),
        ];
        let mut trade = trade("USD", items, dec!(0.03));
        trade.status = PaymentStatus::Paid;

        let unsettled_time = TradeValuation::value(&document(&trade), &trade, 2, &book).unwrap();
        assert_eq!(unsettled_time.home_total, dec!(2.49));
        assert_eq!(unsettled_time.counter_amount(), dec!(2.49));
        assert_eq!(unsettled_time.forex_difference(), Decimal::ZERO);

        trade.settled_at = Some(issued() + Duration::days(6));
        let later = TradeValuation::value(&document(&trade), &trade, 2, &book).unwrap();
        assert_eq!(later.counter_amount(), dec!(2.52));
        assert_eq!(later.forex_difference(), dec!(0.03));
    }

    #[test]
    fn test_unsettled_foreign_document_records_without_settlement() {
        let trade = trade("USD", vec![item(dec!(2), dec!(10), dec!(1))], dec!(21));
        let doc = document(&trade);
        let valuation = TradeValuation::value(&doc, &trade, 2, &rates()).unwrap();
        assert_eq!(valuation.counter_amount(), dec!(1743));
        let fx = valuation.forex_transaction(&doc, &trade).unwrap();
        assert!(fx.settlement.is_none());
    }

    #[test]
    fn test_settlement_before_issue_rejected() {
        let mut trade = trade("USD", vec![item(dec!(1), dec!(1), dec!(0))], dec!(1));
        trade.status = PaymentStatus::Paid;
        trade.settled_at = Some(issued() - Duration::hours(1));
        let result = TradeValuation::value(&document(&trade), &trade, 2, &rates());
        assert!(matches!(result, Err(DocumentError::InvalidDocument(_))));
    }

    #[test]
    fn test_item_rules() {
        let cases = [
            item(dec!(0), dec!(1), dec!(0)),
            item(dec!(1), dec!(-1), dec!(0)),
            item(dec!(1), dec!(1), dec!(-1)),
            item(dec!(1), dec!(1), dec!(0.001)),
        ];
        for bad in cases {
            let trade = trade("INR", vec![bad], dec!(1));
            let result = TradeValuation::value(&document(&trade), &trade, 2, &rates());
            assert!(
                matches!(result, Err(DocumentError::InvalidItem { index: 0, .. })),
                "{result:?}"
            );
        }
    }

    #[test]
    fn test_empty_and_zero_value_documents() {
        let empty = trade("INR", vec![], dec!(0));
        assert_eq!(
            TradeValuation::value(&document(&empty), &empty, 2, &rates()),
            Err(DocumentError::EmptyDocument)
        );
        let free = trade("INR", vec![item(dec!(1), dec!(0), dec!(0))], dec!(0));
        assert_eq!(
            TradeValuation::value(&document(&free), &free, 2, &rates()),
            Err(DocumentError::ZeroValue)
        );
    }

    #[test]
    fn test_missing_rate_propagates() {
        let trade = trade("GBP", vec![item(dec!(1), dec!(1), dec!(0))], dec!(1));
        let result = TradeValuation::value(&document(&trade), &trade, 2, &rates());
        assert!(matches!(
            result,
            Err(DocumentError::Rate(CurrencyError::NoRateAvailable { .. }))
        ));
    }
}
