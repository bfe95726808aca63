//! Review Service

use serde::Serialize;
use shared::models::{Review, ReviewCreate, ReviewModerate, ReviewQuery, ReviewStatus, ReviewUpdate};
use sqlx::SqlitePool;

use super::aggregate;
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::db::repository::review::NewReview;
use crate::db::repository::{RepoError, order, product, review};
use crate::notifications;
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode, Page, PageWindow};

/// Compare-and-set attempts for the helpful toggle
const HELPFUL_RETRIES: usize = 5;

/// Rating aggregate plus per-star counts of a product
#[derive(Debug, Clone, Serialize)]
pub struct ProductRatingStats {
    pub product_id: i64,
    pub rating: f64,
    pub review_count: i64,
    /// Index 0 = one star
    pub distribution: [i64; 5],
}

/// Result of toggling the helpful mark
#[derive(Debug, Clone, Serialize)]
pub struct HelpfulToggle {
    pub helpful: bool,
    pub helpful_count: usize,
}

fn validate_rating(rating: i64) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::validation(format!(
            "rating must be between 1 and 5, got {rating}"
        )));
    }
    Ok(())
}

fn review_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ReviewNotFound, format!("Review {id} not found"))
        .with_detail("review_id", id)
}

#[derive(Debug, Clone)]
pub struct ReviewService {
    pool: SqlitePool,
}

impl ReviewService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn load(&self, id: i64) -> AppResult<Review> {
        review::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| review_not_found(id))
    }

    async fn load_product(&self, product_id: i64) -> AppResult<shared::models::Product> {
        product::find_by_id(&self.pool, product_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProductNotFound,
                    format!("Product {product_id} not found"),
                )
            })
    }

    /// New reviews start `pending` and count toward the aggregate once
    /// approved
    pub async fn create(&self, author: &CurrentUser, input: ReviewCreate) -> AppResult<Review> {
        validate_rating(input.rating)?;
        validate_optional_text(&input.title, "title", MAX_NAME_LEN)?;
        validate_required_text(&input.comment, "comment", MAX_DESCRIPTION_LEN)?;

        let product = self.load_product(input.product_id).await?;
        let verified_purchase =
            order::has_delivered_purchase(&self.pool, author.id, product.id).await?;

        let new_review = NewReview {
            id: shared::util::snowflake_id(),
            product_id: product.id,
            user_id: author.id,
            rating: input.rating,
            title: input.title,
            comment: input.comment,
            verified_purchase,
        };

        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        review::insert(&mut *tx, &new_review, now)
            .await
            .map_err(|e| match e {
                RepoError::Duplicate(_) => AppError::with_message(
                    ErrorCode::ReviewAlreadyExists,
                    "You have already reviewed this product",
                ),
                other => other.into(),
            })?;
        aggregate::refresh(&mut *tx, product.id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            review_id = new_review.id,
            product_id = product.id,
            user_id = author.id,
            verified_purchase,
            "Review created"
        );

        let created = self.load(new_review.id).await?;
        notifications::review_received(&self.pool, product.seller_id, &product.title, &created)
            .await;
        Ok(created)
    }

    /// Owner edit; moderation status is kept
    pub async fn update(
        &self,
        author: &CurrentUser,
        id: i64,
        input: ReviewUpdate,
    ) -> AppResult<Review> {
        if let Some(rating) = input.rating {
            validate_rating(rating)?;
        }
        validate_optional_text(&input.title, "title", MAX_NAME_LEN)?;
        if let Some(comment) = &input.comment {
            validate_required_text(comment, "comment", MAX_DESCRIPTION_LEN)?;
        }

        let existing = self.load(id).await?;
        if existing.user_id != author.id {
            return Err(AppError::forbidden("Not authorized to update this review"));
        }

        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        if !review::update_content(
            &mut *tx,
            id,
            input.rating,
            input.title.as_deref(),
            input.comment.as_deref(),
            now,
        )
        .await?
        {
            return Err(review_not_found(id));
        }
        aggregate::refresh(&mut *tx, existing.product_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        self.load(id).await
    }

    /// Admin approve / reject
    pub async fn moderate(
        &self,
        admin: &CurrentUser,
        id: i64,
        input: ReviewModerate,
    ) -> AppResult<Review> {
        if input.status == ReviewStatus::Pending {
            return Err(AppError::validation(
                "status must be approved or rejected",
            ));
        }
        let existing = self.load(id).await?;

        let now = shared::util::now_millis();
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        if !review::set_status(&mut *tx, id, input.status, now).await? {
            return Err(review_not_found(id));
        }
        let summary = aggregate::refresh(&mut *tx, existing.product_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            review_id = id,
            product_id = existing.product_id,
            status = ?input.status,
            rating = summary.rating,
            review_count = summary.review_count,
            "Review moderated"
        );
        audit_log!(admin.id, "review_moderate", id);

        self.load(id).await
    }

    /// Owner or admin
    pub async fn delete(&self, actor: &CurrentUser, id: i64) -> AppResult<()> {
        let existing = self.load(id).await?;
        if existing.user_id != actor.id && !actor.is_admin() {
            return Err(AppError::forbidden("Not authorized to delete this review"));
        }

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        if !review::delete(&mut *tx, id).await? {
            return Err(review_not_found(id));
        }
        aggregate::refresh(&mut *tx, existing.product_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        if actor.is_admin() && existing.user_id != actor.id {
            audit_log!(actor.id, "review_delete", id);
        }
        Ok(())
    }

    /// Add or remove the caller from the helpful set
    pub async fn toggle_helpful(&self, user: &CurrentUser, id: i64) -> AppResult<HelpfulToggle> {
        for _ in 0..HELPFUL_RETRIES {
            let current = self.load(id).await?;
            let mut helpful = current.helpful.clone();
            let marked = match helpful.iter().position(|&u| u == user.id) {
                Some(pos) => {
                    helpful.remove(pos);
                    false
                }
                None => {
                    helpful.push(user.id);
                    true
                }
            };
            if review::replace_helpful(&self.pool, id, &current.helpful, &helpful).await? {
                return Ok(HelpfulToggle {
                    helpful: marked,
                    helpful_count: helpful.len(),
                });
            }
        }
        Err(AppError::conflict("Review was modified concurrently, please retry"))
    }

    /// Approved reviews are public; pending or rejected ones only to their
    /// author and admins
    pub async fn get(&self, id: i64, viewer: Option<&CurrentUser>) -> AppResult<Review> {
        let found = self.load(id).await?;
        let visible = found.status == ReviewStatus::Approved
            || viewer.is_some_and(|v| v.is_admin() || v.id == found.user_id);
        if !visible {
            return Err(review_not_found(id));
        }
        Ok(found)
    }

    pub async fn list_for_product(
        &self,
        product_id: i64,
        query: &ReviewQuery,
    ) -> AppResult<Page<Review>> {
        self.load_product(product_id).await?;
        let window = PageWindow::new(query.page, query.limit);
        let (reviews, total) =
            review::list_for_product(&self.pool, product_id, query, window.limit, window.offset())
                .await?;
        Ok(Page::new(reviews, total, window))
    }

    pub async fn rating_stats(&self, product_id: i64) -> AppResult<ProductRatingStats> {
        let product = self.load_product(product_id).await?;
        let distribution = review::rating_distribution(&self.pool, product_id).await?;
        Ok(ProductRatingStats {
            product_id,
            rating: product.rating,
            review_count: product.review_count,
            distribution,
        })
    }

    pub async fn list_mine(&self, user_id: i64) -> AppResult<Vec<Review>> {
        Ok(review::list_by_user(&self.pool, user_id).await?)
    }

    pub async fn list_pending(&self) -> AppResult<Vec<Review>> {
        Ok(review::list_pending(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(validate_rating(0).is_err());
        assert!(validate_rating(6).is_err());
    }

    #[test]
    fn test_not_found_code() {
        assert_eq!(review_not_found(3).code, ErrorCode::ReviewNotFound);
    }
}
