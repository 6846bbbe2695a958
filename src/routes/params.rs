use serde::Deserialize;
use utoipa::ToSchema;

/// The storefront grid is a fixed 12 per page.
pub const PAGE_SIZE: i64 = 12;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductListQuery {
    pub keyword: Option<String>,
    /// Category id or slug.
    pub category: Option<String>,
    #[serde(rename = "pageNumber")]
    pub page_number: Option<u64>,
}

impl ProductListQuery {
    pub fn page(&self) -> i64 {
        self.page_number.unwrap_or(1).max(1) as i64
    }
}
