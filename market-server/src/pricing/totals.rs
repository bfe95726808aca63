//! Order totals
//!
//! Computes the money fields of a new order exactly once. The result always
//! satisfies `total_amount = subtotal + tax + shipping_cost - discount`,
//! with every term rounded to cents before the total is formed.

use super::money::{round_money, to_decimal, to_f64};
use rust_decimal::Decimal;
use serde::Serialize;

/// Tax and shipping parameters applied at checkout
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    /// Fraction, e.g. 0.05
    tax_rate: Decimal,
    free_shipping_threshold: Decimal,
    flat_shipping_cost: Decimal,
}

impl PricingPolicy {
    pub fn new(tax_rate_percent: f64, free_shipping_threshold: f64, flat_shipping_cost: f64) -> Self {
        Self {
            tax_rate: to_decimal(tax_rate_percent) / Decimal::ONE_HUNDRED,
            free_shipping_threshold: to_decimal(free_shipping_threshold),
            flat_shipping_cost: to_decimal(flat_shipping_cost),
        }
    }

    /// Shipping is free once the subtotal reaches the threshold
    pub fn shipping_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.flat_shipping_cost
        }
    }

    /// Price an order from its line subtotal and an already-clamped discount
    pub fn calculate(&self, subtotal: Decimal, discount: Decimal) -> OrderTotals {
        let subtotal = round_money(subtotal);
        let tax = round_money(subtotal * self.tax_rate);
        let shipping = round_money(self.shipping_for(subtotal));
        let discount = round_money(discount.clamp(Decimal::ZERO, subtotal));
        let total = subtotal + tax + shipping - discount;

        OrderTotals {
            subtotal: to_f64(subtotal),
            tax: to_f64(tax),
            shipping_cost: to_f64(shipping),
            discount: to_f64(discount),
            total_amount: to_f64(total),
        }
    }
}

impl Default for PricingPolicy {
    /// 5% tax, free shipping from 50, flat 10 otherwise
    fn default() -> Self {
        Self::new(5.0, 50.0, 10.0)
    }
}

/// Money fields of an order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderTotals {
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_cost: f64,
    pub discount: f64,
    pub total_amount: f64,
}

/// `price * quantity` for one line
pub fn line_total(price: f64, quantity: i64) -> Decimal {
    to_decimal(price) * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(v: f64) -> Decimal {
        to_decimal(v)
    }

    #[test]
    fn test_under_threshold_pays_flat_shipping() {
        let totals = PricingPolicy::default().calculate(line_total(20.0, 2), Decimal::ZERO);
        assert_eq!(totals.subtotal, 40.0);
        assert_eq!(totals.tax, 2.0);
        assert_eq!(totals.shipping_cost, 10.0);
        assert_eq!(totals.discount, 0.0);
        assert_eq!(totals.total_amount, 52.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let totals = PricingPolicy::default().calculate(dec(50.0), Decimal::ZERO);
        assert_eq!(totals.shipping_cost, 0.0);
        assert_eq!(totals.total_amount, 52.5);
    }

    #[test]
    fn test_discount_is_subtracted_after_tax() {
        let totals = PricingPolicy::default().calculate(dec(100.0), dec(5.0));
        assert_eq!(totals.tax, 5.0);
        assert_eq!(totals.discount, 5.0);
        assert_eq!(totals.total_amount, 100.0);
    }

    #[test]
    fn test_discount_never_exceeds_subtotal() {
        let totals = PricingPolicy::default().calculate(dec(30.0), dec(45.0));
        assert_eq!(totals.discount, 30.0);
        assert_eq!(totals.total_amount, 11.5);
    }

    #[test]
    fn test_total_is_sum_of_rounded_parts() {
        let policy = PricingPolicy::default();
        for cents in [1_i64, 333, 4999, 5001, 12345] {
            let subtotal = Decimal::new(cents, 2);
            let t = policy.calculate(subtotal, Decimal::new(cents / 7, 2));
            let expected = dec(t.subtotal) + dec(t.tax) + dec(t.shipping_cost) - dec(t.discount);
            assert_eq!(dec(t.total_amount), expected, "subtotal {subtotal}");
        }
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy::new(10.0, 100.0, 7.5);
        let totals = policy.calculate(dec(80.0), Decimal::ZERO);
        assert_eq!(totals.tax, 8.0);
        assert_eq!(totals.shipping_cost, 7.5);
        assert_eq!(totals.total_amount, 95.5);
    }
}
