//! Cart semantics. The storefront keeps the cart in the browser's local
//! storage; the server only ever sees a snapshot of it at checkout. This
//! module is the canonical form of that collection: lines are keyed by
//! (product, size), so the same gown in two sizes is two lines.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub title: String,
    pub unit_price: i64,
    pub image: Option<String>,
    pub size: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Rebuild from a checkout snapshot, collapsing duplicate
    /// (product, size) pairs into one line.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Cart::default();
        for line in lines {
            match cart.find_mut(line.product_id, line.size.as_deref()) {
                Some(existing) => existing.quantity += line.quantity,
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// Add one unit of (product, size); an existing line is incremented
    /// rather than duplicated.
    pub fn add(&mut self, product: &Product, size: Option<&str>) {
        if let Some(existing) = self.find_mut(product.id, size) {
            existing.quantity += 1;
            return;
        }
        self.lines.push(CartLine {
            product_id: product.id,
            title: product.title.clone(),
            unit_price: product.price,
            image: product.images.first().map(|img| img.url.clone()),
            size: size.map(str::to_string),
            quantity: 1,
        });
    }

    /// Drop the line matching (product, size), if any.
    pub fn remove(&mut self, product_id: Uuid, size: Option<&str>) {
        self.lines
            .retain(|line| !(line.product_id == product_id && line.size.as_deref() == size));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    fn find_mut(&mut self, product_id: Uuid, size: Option<&str>) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id && line.size.as_deref() == size)
    }
}
