//! Data models
//!
//! Shared between market-server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are epoch millis.

pub mod account;
pub mod category;
pub mod coupon;
pub mod message;
pub mod notification;
pub mod order;
pub mod product;
pub mod review;

// Re-exports
pub use account::*;
pub use category::*;
pub use coupon::*;
pub use message::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use review::*;
