use crate::db::repository::RepoError;
use crate::pricing::CouponRejection;
use crate::utils::{AppError, ErrorCode};
use shared::models::OrderStatus;
use thiserror::Error;

/// Order engine errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order must contain at least one item")]
    Empty,

    #[error("{0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    #[error("Product is not available: {title}")]
    ProductUnavailable { product_id: i64, title: String },

    #[error("Insufficient stock for product: {title}")]
    InsufficientStock {
        product_id: i64,
        title: String,
        available: i64,
        requested: i64,
    },

    /// Conditional decrement lost a race after validation passed
    #[error("Stock changed while placing the order for product: {title}")]
    StockConflict { product_id: i64, title: String },

    #[error("Coupon not found: {0}")]
    CouponNotFound(String),

    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    #[error("Order not found: {0}")]
    NotFound(i64),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order cannot be cancelled in status {0}")]
    NotCancellable(OrderStatus),

    #[error("Order creation timed out")]
    Timeout,

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::Empty => AppError::new(ErrorCode::OrderEmpty),
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::ProductNotFound(id) => {
                AppError::with_message(ErrorCode::ProductNotFound, message).with_detail("product_id", id)
            }
            OrderError::ProductUnavailable { product_id, .. } => {
                AppError::with_message(ErrorCode::ProductUnavailable, message)
                    .with_detail("product_id", product_id)
            }
            OrderError::InsufficientStock {
                product_id,
                available,
                requested,
                ..
            } => AppError::with_message(ErrorCode::ProductOutOfStock, message)
                .with_detail("product_id", product_id)
                .with_detail("available", available)
                .with_detail("requested", requested),
            OrderError::StockConflict { product_id, .. } => {
                AppError::with_message(ErrorCode::StockConflict, message)
                    .with_detail("product_id", product_id)
            }
            OrderError::CouponNotFound(code) => {
                AppError::with_message(ErrorCode::CouponNotFound, message).with_detail("code", code)
            }
            OrderError::Coupon(rejection) => rejection.into(),
            OrderError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, message).with_detail("order_id", id)
            }
            OrderError::Forbidden(msg) => AppError::forbidden(msg),
            OrderError::InvalidStatus(_) => AppError::with_message(ErrorCode::OrderInvalidStatus, message),
            OrderError::InvalidTransition { from, to } => {
                AppError::with_message(ErrorCode::OrderInvalidTransition, message)
                    .with_detail("from", from.as_str())
                    .with_detail("to", to.as_str())
            }
            OrderError::NotCancellable(status) => {
                AppError::with_message(ErrorCode::OrderNotCancellable, message)
                    .with_detail("status", status.as_str())
            }
            OrderError::Timeout => AppError::timeout(message),
            OrderError::Repo(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[test]
    fn test_insufficient_stock_is_bad_request_with_product_name() {
        let err: AppError = OrderError::InsufficientStock {
            product_id: 1,
            title: "Desk Lamp".into(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(err.code, ErrorCode::ProductOutOfStock);
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Insufficient stock for product: Desk Lamp");
    }

    #[test]
    fn test_stock_conflict_is_409() {
        let err: AppError = OrderError::StockConflict {
            product_id: 1,
            title: "Desk Lamp".into(),
        }
        .into();
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_transition_errors_are_bad_request() {
        let err: AppError = OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        }
        .into();
        assert_eq!(err.code, ErrorCode::OrderInvalidTransition);
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);

        let err: AppError = OrderError::NotCancellable(OrderStatus::Cancelled).into();
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timeout_is_503() {
        let err: AppError = OrderError::Timeout.into();
        assert_eq!(err.http_status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_not_found_codes() {
        let err: AppError = OrderError::ProductNotFound(9).into();
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
        let err: AppError = OrderError::NotFound(9).into();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }
}
