//! Property tests for stock card arithmetic.

use chrono::NaiveDate;
use ledgerwise_shared::types::ProductId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::card::StockCard;
use super::types::{MovementKind, MovementRequest, ProductStock};

fn delta() -> impl Strategy<Value = Decimal> {
    (-50i64..=50i64)
        .prop_filter("non-zero", |v| *v != 0)
        .prop_map(Decimal::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Balance at every sequence equals opening stock plus the movements up to it,
    /// and no accepted movement ever takes the balance below zero.
    #[test]
    fn prop_balance_matches_opening_plus_movements(
        opening in 0i64..200,
        deltas in prop::collection::vec(delta(), 0..60),
    ) {
        let product_id = ProductId::new();
        let mut card = StockCard::open(ProductStock {
            product_id,
            sku: "P".into(),
            opening_stock: Decimal::from(opening),
            allow_backorder: false,
        }).unwrap();

        let mut applied = Vec::new();
        for quantity in deltas {
            let request = MovementRequest {
                product_id,
                kind: MovementKind::Adjustment,
                quantity,
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                document_id: None,
                reference: String::new(),
            };
            if let Ok(movement) = card.apply(&request) {
                prop_assert!(movement.balance >= Decimal::ZERO);
                applied.push(quantity);
            }
        }

        for (index, movement) in card.movements().iter().enumerate() {
            let expected: Decimal =
                Decimal::from(opening) + applied[..=index].iter().copied().sum::<Decimal>();
            prop_assert_eq!(movement.sequence, index as u64 + 1);
            prop_assert_eq!(card.balance_at_sequence(movement.sequence), expected);
            prop_assert_eq!(movement.balance, expected);
        }
        prop_assert_eq!(card.recomputed(), card.balance());
    }
}
