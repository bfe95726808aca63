//! Review Model

use serde::{Deserialize, Serialize};

/// Moderation status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Review entity (one per user and product)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    /// 1..=5
    pub rating: i64,
    pub title: Option<String>,
    pub comment: String,
    /// Reviewer has a delivered order containing the product
    pub verified_purchase: bool,
    pub status: ReviewStatus,
    /// User IDs that marked the review helpful
    #[cfg_attr(feature = "db", sqlx(json))]
    pub helpful: Vec<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create review payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCreate {
    pub product_id: i64,
    pub rating: i64,
    pub title: Option<String>,
    pub comment: String,
}

/// Update review payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub rating: Option<i64>,
    pub title: Option<String>,
    pub comment: Option<String>,
}

/// Admin moderation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewModerate {
    pub status: ReviewStatus,
}

/// Sort order for product review listings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewSort {
    #[default]
    Newest,
    RatingHigh,
    RatingLow,
    Helpful,
}

/// Review list filters (query string)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewQuery {
    pub rating: Option<i64>,
    pub verified: Option<bool>,
    #[serde(default)]
    pub sort: ReviewSort,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Denormalized rating written back to the product
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Average of approved ratings, one decimal
    pub rating: f64,
    pub review_count: i64,
}
