//! Coupon Model

use serde::{Deserialize, Serialize};

/// Discount type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum DiscountType {
    /// `value` is a percentage of the order amount (10 = 10%)
    Percentage,
    /// `value` is a flat currency amount
    Fixed,
}

/// Coupon entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Coupon {
    pub id: i64,
    /// Unique, stored uppercased
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_purchase_amount: f64,
    /// Ceiling for percentage discounts
    pub max_discount_amount: Option<f64>,
    pub start_date: i64,
    pub expiry_date: i64,
    /// None = unlimited
    pub usage_limit: Option<i64>,
    pub used_count: i64,
    pub user_usage_limit: i64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub applicable_categories: Vec<i64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub applicable_products: Vec<i64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub excluded_products: Vec<i64>,
    pub is_active: bool,
    pub created_by: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Per-user usage counter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CouponUsage {
    pub coupon_id: i64,
    pub user_id: i64,
    pub usage_count: i64,
    pub last_used: i64,
}

/// Create coupon payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponCreate {
    pub code: String,
    pub description: String,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_purchase_amount: Option<f64>,
    pub max_discount_amount: Option<f64>,
    pub start_date: Option<i64>,
    pub expiry_date: i64,
    pub usage_limit: Option<i64>,
    pub user_usage_limit: Option<i64>,
    #[serde(default)]
    pub applicable_categories: Vec<i64>,
    #[serde(default)]
    pub applicable_products: Vec<i64>,
    #[serde(default)]
    pub excluded_products: Vec<i64>,
}

/// Update coupon payload (code is immutable)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CouponUpdate {
    pub description: Option<String>,
    pub discount_value: Option<f64>,
    pub min_purchase_amount: Option<f64>,
    pub max_discount_amount: Option<f64>,
    pub start_date: Option<i64>,
    pub expiry_date: Option<i64>,
    pub usage_limit: Option<i64>,
    pub user_usage_limit: Option<i64>,
    pub applicable_categories: Option<Vec<i64>>,
    pub applicable_products: Option<Vec<i64>>,
    pub excluded_products: Option<Vec<i64>>,
    pub is_active: Option<bool>,
}

/// Validate coupon request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponValidate {
    pub code: String,
    pub order_amount: f64,
    #[serde(default)]
    pub product_ids: Vec<i64>,
}

/// Result of a successful coupon check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponQuote {
    pub coupon_id: i64,
    pub code: String,
    pub discount: f64,
    pub final_amount: f64,
}
