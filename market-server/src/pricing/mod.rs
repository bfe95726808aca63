//! Pricing: money helpers, order totals and the coupon calculator

pub mod coupon;
pub mod money;
pub mod totals;

pub use coupon::{CartProduct, CouponRejection};
pub use totals::{OrderTotals, PricingPolicy, line_total};
