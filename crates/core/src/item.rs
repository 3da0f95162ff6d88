//! Catalog item: the single document type stored in the search engine.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::ItemId;

/// Document field names, shared by mappings, queries and aggregations.
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const CATEGORY: &str = "category";
    pub const BRAND: &str = "brand";
    pub const PRICE: &str = "price";
    pub const IMAGES: &str = "images";
}

/// Product-catalog record.
///
/// `title` is analysed for full-text search; `category` and `brand` are
/// exact-match fields; `price` is range- and sort-queryable; `images` is an
/// opaque URL that is stored but not searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub category: String,
    pub brand: String,
    pub price: f64,
    #[serde(default)]
    pub images: String,
}

impl Item {
    pub fn new(
        id: impl Into<ItemId>,
        title: impl Into<String>,
        category: impl Into<String>,
        brand: impl Into<String>,
        price: f64,
        images: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            brand: brand.into(),
            price,
            images: images.into(),
        }
    }

    /// Reject obviously bad input before it is sent to the engine.
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }
        if !self.price.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        if self.price < 0.0 {
            return Err(DomainError::validation("price must not be negative"));
        }
        Ok(())
    }
}

/// Demo catalog used to seed an empty index.
pub fn sample_catalog() -> Vec<Item> {
    const IMAGE: &str = "http://image.baidu.com/13123.jpg";
    vec![
        Item::new(1, "小米手机7", "手机", "小米", 3299.00, IMAGE),
        Item::new(2, "坚果手机R1", "手机", "锤子", 3699.00, IMAGE),
        Item::new(3, "华为META10", "手机", "华为", 4499.00, IMAGE),
        Item::new(4, "小米Mix2S", "手机", "小米", 4299.00, IMAGE),
        Item::new(5, "荣耀V10", "手机", "华为", 2799.00, IMAGE),
    ]
}
