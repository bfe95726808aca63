//! Order status transition table
//!
//! | From       | Allowed next            |
//! |------------|-------------------------|
//! | pending    | processing, cancelled   |
//! | processing | shipped, cancelled      |
//! | shipped    | delivered               |
//! | delivered  | (terminal)              |
//! | cancelled  | (terminal)              |

use super::error::OrderError;
use shared::models::{NotificationKind, OrderStatus};

/// States reachable in one step from `from`
pub fn allowed_next(from: OrderStatus) -> &'static [OrderStatus] {
    use OrderStatus::*;
    match from {
        Pending => &[Processing, Cancelled],
        Processing => &[Shipped, Cancelled],
        Shipped => &[Delivered],
        Delivered | Cancelled => &[],
    }
}

pub fn is_terminal(status: OrderStatus) -> bool {
    allowed_next(status).is_empty()
}

/// Same-state moves are rejected like any other illegal transition
pub fn check_transition(from: OrderStatus, to: OrderStatus) -> Result<(), OrderError> {
    if allowed_next(from).contains(&to) {
        Ok(())
    } else {
        Err(OrderError::InvalidTransition { from, to })
    }
}

/// Buyer-side cancellation window
pub fn buyer_can_cancel(status: OrderStatus) -> bool {
    status == OrderStatus::Pending
}

/// Notification sent to the buyer after moving into `to`
pub fn notification_kind(to: OrderStatus) -> Option<NotificationKind> {
    match to {
        OrderStatus::Processing => Some(NotificationKind::OrderConfirmed),
        OrderStatus::Shipped => Some(NotificationKind::OrderShipped),
        OrderStatus::Delivered => Some(NotificationKind::OrderDelivered),
        OrderStatus::Cancelled => Some(NotificationKind::OrderCancelled),
        OrderStatus::Pending => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL: [OrderStatus; 5] = [Pending, Processing, Shipped, Delivered, Cancelled];

    #[test]
    fn test_forward_path_is_allowed() {
        assert!(check_transition(Pending, Processing).is_ok());
        assert!(check_transition(Processing, Shipped).is_ok());
        assert!(check_transition(Shipped, Delivered).is_ok());
    }

    #[test]
    fn test_cancel_only_before_shipment() {
        assert!(check_transition(Pending, Cancelled).is_ok());
        assert!(check_transition(Processing, Cancelled).is_ok());
        assert!(check_transition(Shipped, Cancelled).is_err());
        assert!(check_transition(Delivered, Cancelled).is_err());
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        assert!(matches!(
            check_transition(Pending, Delivered),
            Err(OrderError::InvalidTransition { from: Pending, to: Delivered })
        ));
        assert!(check_transition(Pending, Shipped).is_err());
        assert!(check_transition(Shipped, Processing).is_err());
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        for to in ALL {
            assert!(check_transition(Delivered, to).is_err());
            assert!(check_transition(Cancelled, to).is_err());
        }
        assert!(is_terminal(Delivered));
        assert!(is_terminal(Cancelled));
        assert!(!is_terminal(Shipped));
    }

    #[test]
    fn test_same_state_is_rejected() {
        for s in ALL {
            assert!(check_transition(s, s).is_err());
        }
    }

    #[test]
    fn test_buyer_cancel_window() {
        assert!(buyer_can_cancel(Pending));
        assert!(!buyer_can_cancel(Processing));
        assert!(!buyer_can_cancel(Cancelled));
    }
}
