use axum_storefront_api::cart::{Cart, CartLine};
use axum_storefront_api::models::Product;
use chrono::Utc;
use uuid::Uuid;

fn gown(price: i64) -> Product {
    Product {
        id: Uuid::new_v4(),
        title: "Duchess Satin Gown".to_string(),
        slug: "duchess-satin-gown".to_string(),
        sku: "CT-001".to_string(),
        description: None,
        price,
        categories: Vec::new(),
        images: Vec::new(),
        variants: Vec::new(),
        sizes: vec!["S".to_string(), "M".to_string()],
        colors: Vec::new(),
        fabric: None,
        is_made_to_order: false,
        published: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn adding_same_product_and_size_twice_merges_into_one_line() {
    let product = gown(3_000);
    let mut cart = Cart::default();

    cart.add(&product, Some("M"));
    cart.add(&product, Some("M"));

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].quantity, 2);
}

#[test]
fn same_product_in_two_sizes_is_two_lines() {
    let product = gown(3_000);
    let mut cart = Cart::default();

    cart.add(&product, Some("S"));
    cart.add(&product, Some("M"));

    assert_eq!(cart.lines().len(), 2);
    assert!(cart.lines().iter().all(|line| line.quantity == 1));
}

#[test]
fn remove_only_touches_the_matching_size() {
    let product = gown(3_000);
    let mut cart = Cart::default();
    cart.add(&product, Some("S"));
    cart.add(&product, Some("M"));

    cart.remove(product.id, Some("S"));

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].size.as_deref(), Some("M"));
}

#[test]
fn clear_empties_the_cart() {
    let product = gown(3_000);
    let mut cart = Cart::default();
    cart.add(&product, Some("M"));

    cart.clear();

    assert!(cart.is_empty());
}

#[test]
fn from_lines_collapses_duplicate_snapshot_entries() {
    let product_id = Uuid::new_v4();
    let line = |qty: i32| CartLine {
        product_id,
        title: "Gown".to_string(),
        unit_price: 3_000,
        image: None,
        size: Some("M".to_string()),
        quantity: qty,
    };

    let cart = Cart::from_lines(vec![line(1), line(1)]);

    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.lines()[0].quantity, 2);
}
