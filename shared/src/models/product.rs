//! Product Model

use serde::{Deserialize, Serialize};

/// Product sale status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "kebab-case"))]
pub enum ProductStatus {
    #[default]
    Active,
    Inactive,
    OutOfStock,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::OutOfStock => "out-of-stock",
        }
    }
}

/// Product entity
///
/// `rating` and `review_count` are derived from approved reviews and are
/// written only by the review subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub compare_price: Option<f64>,
    pub stock: i64,
    /// Cumulative units sold
    pub sales: i64,
    pub status: ProductStatus,
    /// Image URLs, first one is the cover
    #[cfg_attr(feature = "db", sqlx(json))]
    pub images: Vec<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub tags: Vec<String>,
    pub sku: Option<String>,
    pub rating: f64,
    pub review_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Cover image used for order line snapshots
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub compare_price: Option<f64>,
    pub stock: i64,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub sku: Option<String>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub compare_price: Option<f64>,
    pub stock: Option<i64>,
    pub category_id: Option<i64>,
    pub status: Option<ProductStatus>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub sku: Option<String>,
}

/// Product list filters (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQuery {
    pub category_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub status: Option<ProductStatus>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Case-insensitive title search
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
