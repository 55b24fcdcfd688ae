//! Order status machines.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Fulfilment status of an order.
///
/// State transitions:
/// ```text
/// Pending ──► Accepted ──► Preparing ──► Out for Delivery ──► Delivered
///    │           │            │                 │
///    └───────────┴────────────┴─────────────────┴──► Cancelled
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum OrderStatus {
    /// Placed, not yet seen by the shop.
    #[default]
    Pending,

    Accepted,

    Preparing,

    #[serde(rename = "Out for Delivery")]
    OutForDelivery,

    /// Handed to the customer (terminal state).
    Delivered,

    /// Abandoned by the shop (terminal state).
    Cancelled,
}

/// Result of checking a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<T> {
    /// Target equals the current value; nothing to write.
    Unchanged,
    /// Target differs and is allowed.
    Changed { from: T, to: T },
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the states directly reachable from this one.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Accepted, OrderStatus::Cancelled],
            OrderStatus::Accepted => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::OutForDelivery, OrderStatus::Cancelled],
            OrderStatus::OutForDelivery => &[OrderStatus::Delivered, OrderStatus::Cancelled],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Checks a move to `next`. Re-applying the current status is accepted.
    pub fn transition_to(
        &self,
        next: OrderStatus,
    ) -> Result<Transition<OrderStatus>, ValidationError> {
        if *self == next {
            Ok(Transition::Unchanged)
        } else if self.can_transition_to(next) {
            Ok(Transition::Changed {
                from: *self,
                to: next,
            })
        } else {
            Err(ValidationError::IllegalTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Returns the status name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Accepted => "Accepted",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::InvalidStatus(s.to_string()))
    }
}

/// Payment status of an order. Toggles freely.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "Unpaid",
            PaymentStatus::Paid => "Paid",
        }
    }

    pub fn transition_to(&self, next: PaymentStatus) -> Transition<PaymentStatus> {
        if *self == next {
            Transition::Unchanged
        } else {
            Transition::Changed {
                from: *self,
                to: next,
            }
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("unpaid") => Ok(PaymentStatus::Unpaid),
            v if v.eq_ignore_ascii_case("paid") => Ok(PaymentStatus::Paid),
            _ => Err(ValidationError::InvalidStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_statuses() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_forward_path() {
        let path = [
            OrderStatus::Pending,
            OrderStatus::Accepted,
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for status in OrderStatus::ALL {
            assert_eq!(
                status.can_transition_to(OrderStatus::Cancelled),
                !status.is_terminal(),
                "{status}"
            );
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [OrderStatus::Delivered, OrderStatus::Cancelled] {
            assert!(terminal.allowed_next().is_empty());
            for next in OrderStatus::ALL {
                if next != terminal {
                    assert!(terminal.transition_to(next).is_err());
                }
            }
        }
    }

    #[test]
    fn test_delivered_to_pending_is_illegal() {
        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::IllegalTransition {
                from: "Delivered".to_string(),
                to: "Pending".to_string(),
            }
        );
    }

    #[test]
    fn test_skipping_backwards_is_illegal() {
        assert!(
            OrderStatus::Preparing
                .transition_to(OrderStatus::Accepted)
                .is_err()
        );
    }

    #[test]
    fn test_same_status_is_unchanged() {
        for status in OrderStatus::ALL {
            assert_eq!(status.transition_to(status).unwrap(), Transition::Unchanged);
        }
        assert_eq!(
            PaymentStatus::Paid.transition_to(PaymentStatus::Paid),
            Transition::Unchanged
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "out for delivery".parse::<OrderStatus>().unwrap(),
            OrderStatus::OutForDelivery
        );
        assert_eq!("Paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
        assert_eq!(
            "Shipped".parse::<OrderStatus>().unwrap_err(),
            ValidationError::InvalidStatus("Shipped".to_string())
        );
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(
            serde_json::to_value(OrderStatus::OutForDelivery).unwrap(),
            serde_json::json!("Out for Delivery")
        );
        assert_eq!(
            serde_json::to_value(PaymentStatus::Unpaid).unwrap(),
            serde_json::json!("Unpaid")
        );
    }
}
