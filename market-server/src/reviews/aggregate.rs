//! Rating aggregate

use rust_decimal::prelude::*;
use shared::models::RatingSummary;
use sqlx::SqliteConnection;

use crate::db::repository::{RepoResult, product, review};

/// Build the product aggregate from `AVG(rating)` and `COUNT(*)` over
/// approved reviews; the average is rounded to one decimal, half away from
/// zero. No approved reviews gives 0 / 0.
pub fn summarize(average: Option<f64>, count: i64) -> RatingSummary {
    let rating = match average {
        Some(avg) if count > 0 => Decimal::from_f64(avg)
            .unwrap_or_default()
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            .to_f64()
            .unwrap_or_default(),
        _ => 0.0,
    };
    RatingSummary {
        rating,
        review_count: if average.is_some() { count } else { 0 },
    }
}

/// Recompute and store the aggregate of `product_id` on an open transaction
pub async fn refresh(conn: &mut SqliteConnection, product_id: i64) -> RepoResult<RatingSummary> {
    let (average, count) = review::approved_stats(&mut *conn, product_id).await?;
    let summary = summarize(average, count);
    product::set_rating(&mut *conn, product_id, summary).await?;
    Ok(summary)
}
