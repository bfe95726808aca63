//! 评价聚合集成测试
//!
//! 商品 rating / review_count 只统计已审核通过的评价，
//! 每次创建、修改、审核、删除都在同一事务里重新计算。

mod common;

use common::*;
use market_server::{AppError, ErrorCode};
use shared::models::{ReviewCreate, ReviewModerate, ReviewStatus, ReviewUpdate, UserRole};

fn review_of(product_id: i64, rating: i64) -> ReviewCreate {
    ReviewCreate {
        product_id,
        rating,
        title: None,
        comment: "Works as described".into(),
    }
}

fn approve() -> ReviewModerate {
    ReviewModerate {
        status: ReviewStatus::Approved,
    }
}

#[tokio::test]
async fn test_aggregate_counts_only_approved_reviews() {
    let env = setup().await;
    let state = &env.state;
    let reviews = state.review_service();
    let seller = create_user(state, UserRole::Seller).await;
    let admin = current(&create_user(state, UserRole::Admin).await);
    let product = create_product(state, seller.id, 20.0, 5).await;

    let mut ids = Vec::new();
    for rating in [5, 4, 4] {
        let author = current(&create_user(state, UserRole::Buyer).await);
        let review = reviews.create(&author, review_of(product.id, rating)).await.unwrap();
        assert_eq!(review.status, ReviewStatus::Pending);
        assert!(!review.verified_purchase);
        ids.push(review.id);
    }

    let pending = reload_product(state, product.id).await;
    assert_eq!(pending.rating, 0.0);
    assert_eq!(pending.review_count, 0);

    for &id in &ids {
        reviews.moderate(&admin, id, approve()).await.unwrap();
    }
    let approved = reload_product(state, product.id).await;
    assert_eq!(approved.rating, 4.3);
    assert_eq!(approved.review_count, 3);

    let stats = reviews.rating_stats(product.id).await.unwrap();
    assert_eq!(stats.distribution, [0, 0, 0, 2, 1]);

    reviews
        .moderate(
            &admin,
            ids[0],
            ReviewModerate {
                status: ReviewStatus::Rejected,
            },
        )
        .await
        .unwrap();
    let after_reject = reload_product(state, product.id).await;
    assert_eq!(after_reject.rating, 4.0);
    assert_eq!(after_reject.review_count, 2);

    reviews.delete(&admin, ids[1]).await.unwrap();
    let after_delete = reload_product(state, product.id).await;
    assert_eq!(after_delete.rating, 4.0);
    assert_eq!(after_delete.review_count, 1);

    reviews.delete(&admin, ids[2]).await.unwrap();
    let empty = reload_product(state, product.id).await;
    assert_eq!(empty.rating, 0.0);
    assert_eq!(empty.review_count, 0);
}

#[tokio::test]
async fn test_editing_an_approved_review_updates_the_aggregate() {
    let env = setup().await;
    let state = &env.state;
    let reviews = state.review_service();
    let seller = create_user(state, UserRole::Seller).await;
    let admin = current(&create_user(state, UserRole::Admin).await);
    let author = current(&create_user(state, UserRole::Buyer).await);
    let product = create_product(state, seller.id, 20.0, 5).await;

    let review = reviews.create(&author, review_of(product.id, 2)).await.unwrap();
    reviews.moderate(&admin, review.id, approve()).await.unwrap();
    assert_eq!(reload_product(state, product.id).await.rating, 2.0);

    let edited = reviews
        .update(
            &author,
            review.id,
            ReviewUpdate {
                rating: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.status, ReviewStatus::Approved);
    assert_eq!(reload_product(state, product.id).await.rating, 5.0);
}

#[tokio::test]
async fn test_one_review_per_user_and_product() {
    let env = setup().await;
    let state = &env.state;
    let reviews = state.review_service();
    let seller = create_user(state, UserRole::Seller).await;
    let author = current(&create_user(state, UserRole::Buyer).await);
    let product = create_product(state, seller.id, 20.0, 5).await;

    reviews.create(&author, review_of(product.id, 4)).await.unwrap();
    let err = reviews
        .create(&author, review_of(product.id, 5))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ReviewAlreadyExists);

    let err = reviews
        .create(&author, review_of(product.id, 6))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn test_pending_review_visible_to_author_only() {
    let env = setup().await;
    let state = &env.state;
    let reviews = state.review_service();
    let seller = create_user(state, UserRole::Seller).await;
    let author = current(&create_user(state, UserRole::Buyer).await);
    let stranger = current(&create_user(state, UserRole::Buyer).await);
    let product = create_product(state, seller.id, 20.0, 5).await;

    let review = reviews.create(&author, review_of(product.id, 3)).await.unwrap();

    assert!(reviews.get(review.id, Some(&author)).await.is_ok());
    let err: AppError = reviews.get(review.id, None).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ReviewNotFound);
    assert!(reviews.get(review.id, Some(&stranger)).await.is_err());

    let err = reviews.delete(&stranger, review.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_helpful_toggle() {
    let env = setup().await;
    let state = &env.state;
    let reviews = state.review_service();
    let seller = create_user(state, UserRole::Seller).await;
    let author = current(&create_user(state, UserRole::Buyer).await);
    let reader = current(&create_user(state, UserRole::Buyer).await);
    let product = create_product(state, seller.id, 20.0, 5).await;

    let review = reviews.create(&author, review_of(product.id, 5)).await.unwrap();

    let marked = reviews.toggle_helpful(&reader, review.id).await.unwrap();
    assert!(marked.helpful);
    assert_eq!(marked.helpful_count, 1);

    let unmarked = reviews.toggle_helpful(&reader, review.id).await.unwrap();
    assert!(!unmarked.helpful);
    assert_eq!(unmarked.helpful_count, 0);
}
