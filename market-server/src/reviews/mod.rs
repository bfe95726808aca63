//! Reviews
//!
//! One review per user and product. Every write recomputes the product's
//! rating aggregate from approved reviews inside the same transaction, so a
//! committed review is always reflected in `product.rating` /
//! `product.review_count`.

pub mod aggregate;
pub mod service;

pub use aggregate::summarize;
pub use service::{HelpfulToggle, ProductRatingStats, ReviewService};
