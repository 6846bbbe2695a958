use axum_storefront_api::cart::CartLine;
use axum_storefront_api::pricing::{FLAT_SHIPPING_FEE, Quote, quote};
use uuid::Uuid;

fn line(unit_price: i64, quantity: i32) -> CartLine {
    CartLine {
        product_id: Uuid::new_v4(),
        title: "Gown".to_string(),
        unit_price,
        image: None,
        size: Some("M".to_string()),
        quantity,
    }
}

#[test]
fn worked_example_two_at_three_thousand() {
    let q = quote(&[line(3_000, 2)]);
    assert_eq!(q.items_price, 6_000);
    assert_eq!(q.shipping_price, 0);
    assert_eq!(q.tax_price, 1_080);
    assert_eq!(q.total_price, 7_080);
}

#[test]
fn free_shipping_is_strictly_above_threshold() {
    // 5000 exactly still pays the flat fee.
    let at = Quote::from_items_price(5_000);
    assert_eq!(at.shipping_price, FLAT_SHIPPING_FEE);

    let above = Quote::from_items_price(5_001);
    assert_eq!(above.shipping_price, 0);
}

#[test]
fn tax_rounds_half_up() {
    // 25 * 18% = 4.5 -> 5
    assert_eq!(Quote::from_items_price(25).tax_price, 5);
    // 24 * 18% = 4.32 -> 4
    assert_eq!(Quote::from_items_price(24).tax_price, 4);
    // 26 * 18% = 4.68 -> 5
    assert_eq!(Quote::from_items_price(26).tax_price, 5);
}

#[test]
fn total_is_sum_of_parts() {
    for items_price in [1, 499, 500, 4_999, 5_000, 5_001, 123_456] {
        let q = Quote::from_items_price(items_price);
        assert_eq!(
            q.total_price,
            q.items_price + q.tax_price + q.shipping_price,
            "items_price {items_price}"
        );
    }
}

#[test]
fn multi_line_subtotal() {
    let q = quote(&[line(1_200, 1), line(800, 3)]);
    assert_eq!(q.items_price, 3_600);
    assert_eq!(q.shipping_price, FLAT_SHIPPING_FEE);
    assert_eq!(q.tax_price, 648);
    assert_eq!(q.total_price, 3_600 + 648 + 500);
}
