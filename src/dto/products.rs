use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Product, ProductColor, ProductImage, ProductVariant};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    pub slug: Option<String>,
    pub sku: String,
    pub description: Option<String>,
    pub price: i64,
    pub categories: Option<Vec<Uuid>>,
    pub images: Option<Vec<ProductImage>>,
    pub variants: Option<Vec<ProductVariant>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<ProductColor>>,
    pub fabric: Option<String>,
    pub is_made_to_order: Option<bool>,
    pub published: Option<bool>,
}

/// Absent fields keep their stored value; present fields overwrite it,
/// including explicit `false` and `0`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub categories: Option<Vec<Uuid>>,
    pub images: Option<Vec<ProductImage>>,
    pub variants: Option<Vec<ProductVariant>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<ProductColor>>,
    pub fabric: Option<String>,
    pub is_made_to_order: Option<bool>,
    pub published: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
