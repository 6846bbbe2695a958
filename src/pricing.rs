//! Order totals, in whole rupees.

use serde::Serialize;
use utoipa::ToSchema;

use crate::cart::CartLine;

/// Orders strictly above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 5_000;
pub const FLAT_SHIPPING_FEE: i64 = 500;
/// GST, applied to the items subtotal.
pub const TAX_RATE_PERCENT: i64 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Quote {
    pub items_price: i64,
    pub tax_price: i64,
    pub shipping_price: i64,
    pub total_price: i64,
}

impl Quote {
    pub fn from_items_price(items_price: i64) -> Self {
        let shipping_price = if items_price > FREE_SHIPPING_THRESHOLD {
            0
        } else {
            FLAT_SHIPPING_FEE
        };
        // Round half up; matches the storefront's Math.round for non-negative subtotals.
        let tax_price = (items_price * TAX_RATE_PERCENT + 50) / 100;
        Self {
            items_price,
            tax_price,
            shipping_price,
            total_price: items_price + tax_price + shipping_price,
        }
    }
}

pub fn quote(lines: &[CartLine]) -> Quote {
    let items_price = lines
        .iter()
        .map(|line| line.unit_price * i64::from(line.quantity))
        .sum();
    Quote::from_items_price(items_price)
}
