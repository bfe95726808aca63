//! Coupon discount calculator
//!
//! Pure checks over a loaded [`Coupon`]; persistence of usage counters lives
//! in `db::repository::coupon`.

use super::money::{round_money, to_decimal, to_f64};
use crate::utils::AppError;
use rust_decimal::Decimal;
use shared::error::ErrorCode;
use shared::models::{Coupon, CouponQuote, CouponUsage, DiscountType};
use thiserror::Error;

/// One product in the cart, as seen by the applicability predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartProduct {
    pub product_id: i64,
    pub category_id: Option<i64>,
}

/// Why a coupon cannot be applied
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CouponRejection {
    #[error("This coupon is inactive")]
    Inactive,
    #[error("This coupon is not yet valid")]
    NotStarted,
    #[error("This coupon has expired")]
    Expired,
    #[error("This coupon has reached its usage limit")]
    Exhausted,
    #[error("You have exceeded the usage limit for this coupon")]
    UserLimitReached,
    #[error("Minimum purchase amount of {0:.2} required")]
    BelowMinimum(f64),
    #[error("Some products in your cart are excluded from this coupon")]
    Excluded(i64),
    #[error("This coupon is not applicable to the products in your cart")]
    NotApplicable,
}

impl From<CouponRejection> for AppError {
    fn from(rejection: CouponRejection) -> Self {
        let code = match &rejection {
            CouponRejection::Inactive
            | CouponRejection::NotStarted
            | CouponRejection::Expired
            | CouponRejection::Exhausted => ErrorCode::CouponInvalid,
            CouponRejection::UserLimitReached => ErrorCode::CouponUserLimitReached,
            CouponRejection::BelowMinimum(_)
            | CouponRejection::Excluded(_)
            | CouponRejection::NotApplicable => ErrorCode::CouponNotApplicable,
        };
        let err = AppError::with_message(code, rejection.to_string());
        match rejection {
            CouponRejection::Excluded(product_id) => err.with_detail("product_id", product_id),
            _ => err,
        }
    }
}

/// Active, inside its date window, and below its global usage limit
pub fn check_validity(coupon: &Coupon, now: i64) -> Result<(), CouponRejection> {
    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }
    if now < coupon.start_date {
        return Err(CouponRejection::NotStarted);
    }
    if now > coupon.expiry_date {
        return Err(CouponRejection::Expired);
    }
    if let Some(limit) = coupon.usage_limit
        && coupon.used_count >= limit
    {
        return Err(CouponRejection::Exhausted);
    }
    Ok(())
}

/// Per-user limit; a user with no usage row has never used the coupon
pub fn check_user_usage(
    coupon: &Coupon,
    usage: Option<&CouponUsage>,
) -> Result<(), CouponRejection> {
    match usage {
        Some(u) if u.usage_count >= coupon.user_usage_limit => {
            Err(CouponRejection::UserLimitReached)
        }
        _ => Ok(()),
    }
}

/// Exclusions reject outright; allow-lists need at least one matching product.
///
/// An empty cart skips the allow-list check (quote without products).
pub fn check_applicability(
    coupon: &Coupon,
    products: &[CartProduct],
) -> Result<(), CouponRejection> {
    if let Some(p) = products
        .iter()
        .find(|p| coupon.excluded_products.contains(&p.product_id))
    {
        return Err(CouponRejection::Excluded(p.product_id));
    }

    let has_allow_list =
        !coupon.applicable_products.is_empty() || !coupon.applicable_categories.is_empty();
    if has_allow_list && !products.is_empty() {
        let matches = products.iter().any(|p| {
            coupon.applicable_products.contains(&p.product_id)
                || p
                    .category_id
                    .is_some_and(|c| coupon.applicable_categories.contains(&c))
        });
        if !matches {
            return Err(CouponRejection::NotApplicable);
        }
    }
    Ok(())
}

/// Discount for an order amount.
///
/// Zero below the minimum purchase; percentage discounts are capped by a
/// positive `max_discount_amount`; the result never exceeds the amount.
pub fn calculate_discount(coupon: &Coupon, order_amount: Decimal) -> Decimal {
    if order_amount < to_decimal(coupon.min_purchase_amount) {
        return Decimal::ZERO;
    }

    let value = to_decimal(coupon.discount_value);
    let discount = match coupon.discount_type {
        DiscountType::Percentage => {
            let raw = order_amount * value / Decimal::ONE_HUNDRED;
            // A cap of zero (or none) leaves the percentage uncapped
            match coupon.max_discount_amount.filter(|max| *max > 0.0) {
                Some(max) => raw.min(to_decimal(max)),
                None => raw,
            }
        }
        DiscountType::Fixed => value,
    };

    round_money(discount.min(order_amount).max(Decimal::ZERO))
}

/// Run every check and price the coupon against `order_amount`
pub fn quote(
    coupon: &Coupon,
    usage: Option<&CouponUsage>,
    order_amount: Decimal,
    products: &[CartProduct],
    now: i64,
) -> Result<CouponQuote, CouponRejection> {
    check_validity(coupon, now)?;
    check_user_usage(coupon, usage)?;
    if order_amount < to_decimal(coupon.min_purchase_amount) {
        return Err(CouponRejection::BelowMinimum(coupon.min_purchase_amount));
    }
    check_applicability(coupon, products)?;

    let discount = calculate_discount(coupon, order_amount);
    Ok(CouponQuote {
        coupon_id: coupon.id,
        code: coupon.code.clone(),
        discount: to_f64(discount),
        final_amount: to_f64(order_amount - discount),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_750_000_000_000;
    const DAY: i64 = 86_400_000;

    fn coupon(discount_type: DiscountType, value: f64) -> Coupon {
        Coupon {
            id: 1,
            code: "SAVE10".into(),
            description: "test".into(),
            discount_type,
            discount_value: value,
            min_purchase_amount: 0.0,
            max_discount_amount: None,
            start_date: NOW - DAY,
            expiry_date: NOW + DAY,
            usage_limit: None,
            used_count: 0,
            user_usage_limit: 1,
            applicable_categories: vec![],
            applicable_products: vec![],
            excluded_products: vec![],
            is_active: true,
            created_by: 9,
            created_at: NOW - DAY,
            updated_at: NOW - DAY,
        }
    }

    fn usage(count: i64) -> CouponUsage {
        CouponUsage {
            coupon_id: 1,
            user_id: 7,
            usage_count: count,
            last_used: NOW,
        }
    }

    fn product(product_id: i64, category_id: Option<i64>) -> CartProduct {
        CartProduct {
            product_id,
            category_id,
        }
    }

    #[test]
    fn test_percentage_clamped_by_max_discount() {
        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.max_discount_amount = Some(5.0);
        let q = quote(&c, None, Decimal::from(100), &[], NOW).unwrap();
        assert_eq!(q.discount, 5.0);
        assert_eq!(q.final_amount, 95.0);
    }

    #[test]
    fn test_percentage_without_cap() {
        let c = coupon(DiscountType::Percentage, 15.0);
        assert_eq!(calculate_discount(&c, Decimal::from(80)), Decimal::from(12));
    }

    #[test]
    fn test_zero_max_discount_means_uncapped() {
        let mut c = coupon(DiscountType::Percentage, 10.0);
        c.max_discount_amount = Some(0.0);
        let q = quote(&c, None, Decimal::from(100), &[], NOW).unwrap();
        assert_eq!(q.discount, 10.0);
        assert_eq!(q.final_amount, 90.0);
    }

    #[test]
    fn test_fixed_never_exceeds_amount() {
        let c = coupon(DiscountType::Fixed, 25.0);
        assert_eq!(calculate_discount(&c, Decimal::from(100)), Decimal::from(25));
        assert_eq!(calculate_discount(&c, Decimal::from(20)), Decimal::from(20));
    }

    #[test]
    fn test_below_minimum_discount_is_zero() {
        let mut c = coupon(DiscountType::Fixed, 10.0);
        c.min_purchase_amount = 50.0;
        assert_eq!(calculate_discount(&c, Decimal::from(49)), Decimal::ZERO);
        assert_eq!(
            quote(&c, None, Decimal::from(49), &[], NOW),
            Err(CouponRejection::BelowMinimum(50.0))
        );
    }

    #[test]
    fn test_validity_window_and_limits() {
        let mut c = coupon(DiscountType::Fixed, 1.0);
        assert!(check_validity(&c, NOW).is_ok());
        assert_eq!(check_validity(&c, NOW + 2 * DAY), Err(CouponRejection::Expired));
        assert_eq!(check_validity(&c, NOW - 2 * DAY), Err(CouponRejection::NotStarted));

        c.usage_limit = Some(3);
        c.used_count = 3;
        assert_eq!(check_validity(&c, NOW), Err(CouponRejection::Exhausted));

        c.usage_limit = None;
        c.is_active = false;
        assert_eq!(check_validity(&c, NOW), Err(CouponRejection::Inactive));
    }

    #[test]
    fn test_user_usage_limit() {
        let mut c = coupon(DiscountType::Fixed, 1.0);
        assert!(check_user_usage(&c, None).is_ok());
        assert_eq!(
            check_user_usage(&c, Some(&usage(1))),
            Err(CouponRejection::UserLimitReached)
        );
        c.user_usage_limit = 2;
        assert!(check_user_usage(&c, Some(&usage(1))).is_ok());
    }

    #[test]
    fn test_excluded_product_rejects() {
        let mut c = coupon(DiscountType::Fixed, 1.0);
        c.excluded_products = vec![42];
        assert_eq!(
            check_applicability(&c, &[product(1, None), product(42, None)]),
            Err(CouponRejection::Excluded(42))
        );
    }

    #[test]
    fn test_allow_list_matches_product_or_category() {
        let mut c = coupon(DiscountType::Fixed, 1.0);
        c.applicable_products = vec![5];
        c.applicable_categories = vec![77];
        assert!(check_applicability(&c, &[product(5, None)]).is_ok());
        assert!(check_applicability(&c, &[product(8, Some(77))]).is_ok());
        assert_eq!(
            check_applicability(&c, &[product(8, Some(1))]),
            Err(CouponRejection::NotApplicable)
        );
    }

    #[test]
    fn test_rejection_maps_to_error_codes() {
        let err: AppError = CouponRejection::Expired.into();
        assert_eq!(err.code, ErrorCode::CouponInvalid);
        let err: AppError = CouponRejection::Excluded(3).into();
        assert_eq!(err.code, ErrorCode::CouponNotApplicable);
        assert_eq!(err.details.unwrap().get("product_id").unwrap(), 3);
    }
}
