//! Property checks for the snapshot-price arithmetic shared by carts and
//! orders.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use storefront_api::entities::cart_item;
use storefront_api::services::carts::items_total;
use uuid::Uuid;

fn line(price_cents: i64, quantity: i32) -> cart_item::Model {
    let now = Utc::now();
    cart_item::Model {
        id: Uuid::new_v4(),
        cart_id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        quantity,
        price: Decimal::new(price_cents, 2),
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    #[test]
    fn total_equals_sum_of_line_totals(
        lines in prop::collection::vec((0i64..1_000_000, 1i32..100), 0..20)
    ) {
        let models: Vec<cart_item::Model> =
            lines.iter().map(|(cents, qty)| line(*cents, *qty)).collect();

        let expected: Decimal = lines
            .iter()
            .map(|(cents, qty)| Decimal::new(*cents, 2) * Decimal::from(*qty))
            .sum();

        prop_assert_eq!(items_total(&models), expected);
        for model in &models {
            prop_assert_eq!(model.line_total(), model.price * Decimal::from(model.quantity));
        }
    }

    #[test]
    fn total_is_order_independent(
        lines in prop::collection::vec((0i64..1_000_000, 1i32..100), 0..20)
    ) {
        let models: Vec<cart_item::Model> =
            lines.iter().map(|(cents, qty)| line(*cents, *qty)).collect();
        let mut reversed = models.clone();
        reversed.reverse();

        prop_assert_eq!(items_total(&models), items_total(&reversed));
    }
}
