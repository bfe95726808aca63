//! Account Model (users, addresses, cart, wishlist)

use serde::{Deserialize, Serialize};

/// User role
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum UserRole {
    #[default]
    Buyer,
    Seller,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buyer" => Some(Self::Buyer),
            "seller" => Some(Self::Seller),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Account status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
    Deactivated,
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Stored lowercased
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub account_status: AccountStatus,
    pub shop_name: Option<String>,
    pub shop_description: Option<String>,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    /// `buyer` (default) or `seller`; admins are never self-registered
    pub role: Option<UserRole>,
    pub shop_name: Option<String>,
}

/// Profile update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub shop_name: Option<String>,
    pub shop_description: Option<String>,
}

/// Seller onboarding state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum SellerApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Paid seller application; one per user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SellerApplication {
    pub user_id: i64,
    pub fee_amount: f64,
    pub payment_method: String,
    pub transaction_id: String,
    pub status: SellerApplicationStatus,
    pub paid_at: i64,
}

/// Apply-for-seller payload (fee payment reference)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerApplicationCreate {
    pub payment_method: String,
    pub transaction_id: String,
}

/// Application state returned to the applicant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerApplicationState {
    pub role: UserRole,
    pub fee_paid: bool,
    pub fee_amount: f64,
    pub paid_at: Option<i64>,
    pub status: SellerApplicationStatus,
}

/// Postal address, embedded in orders and stored per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Saved address of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Address {
    pub id: i64,
    pub user_id: i64,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

/// Create/replace address payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressInput {
    #[serde(flatten)]
    pub address: PostalAddress,
    #[serde(default)]
    pub is_default: bool,
}

/// Cart line joined with live product data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartItem {
    pub product_id: i64,
    pub quantity: i64,
    pub added_at: i64,
    pub title: String,
    pub price: f64,
    pub stock: i64,
    pub status: super::ProductStatus,
}

/// Cart view returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,
    /// Sum over active products only
    pub subtotal: f64,
}

/// Add-to-cart payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartAdd {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// Update-cart-quantity payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUpdate {
    pub quantity: i64,
}
