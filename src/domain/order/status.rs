//! Order status and payment method enumerations.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Status only ever moves forward through the fulfillment sequence;
/// cancellation is allowed from any state short of delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Paid => 1,
            OrderStatus::Processing => 2,
            OrderStatus::Shipped => 3,
            OrderStatus::Delivered => 4,
            OrderStatus::Cancelled => 5,
        }
    }

    /// Whether a transition to `next` is a legal forward move.
    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            // Terminal states never move.
            (OrderStatus::Delivered, _) | (OrderStatus::Cancelled, _) => false,
            // Cancellation is allowed from any non-terminal state.
            (_, OrderStatus::Cancelled) => true,
            // Otherwise strictly forward through fulfillment.
            (current, next) => next.rank() > current.rank(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an order was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Paystack,
    BankTransfer,
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Paystack => "paystack",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_advances_forward() {
        assert!(OrderStatus::Pending.can_advance_to(OrderStatus::Paid));
        assert!(OrderStatus::Paid.can_advance_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_advance_to(OrderStatus::Delivered));
    }

    #[test]
    fn status_never_moves_backward() {
        assert!(!OrderStatus::Paid.can_advance_to(OrderStatus::Pending));
        assert!(!OrderStatus::Delivered.can_advance_to(OrderStatus::Shipped));
    }

    #[test]
    fn cancellation_allowed_before_delivery() {
        assert!(OrderStatus::Pending.can_advance_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_advance_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_advance_to(OrderStatus::Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        assert!(!OrderStatus::Cancelled.can_advance_to(OrderStatus::Paid));
        assert!(!OrderStatus::Delivered.can_advance_to(OrderStatus::Delivered));
    }

    #[test]
    fn status_strings_are_stable() {
        assert_eq!(OrderStatus::Paid.as_str(), "paid");
        assert_eq!(PaymentMethod::BankTransfer.as_str(), "bank_transfer");
    }
}
