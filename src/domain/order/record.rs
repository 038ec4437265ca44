//! Order records.
//!
//! An order is an immutable audit record of a completed transaction. Line
//! items and totals never change after creation; only the fulfillment status
//! may advance (see [`OrderStatus::can_advance_to`]). The gateway reference is
//! the external-to-internal correlation key and is unique across orders.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AccountId, Amount, DomainError, ErrorCode, OrderId, Timestamp};

use super::{ItemKind, LineItem, OrderStatus, PaymentMethod};

/// A persisted order record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub items: Vec<LineItem>,
    /// Gateway-settled total in minor units.
    pub total: Amount,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Gateway transaction reference; unique per successful order.
    pub reference: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

impl Order {
    /// Count of course line items (used for replayed reconciliation responses).
    pub fn course_item_count(&self) -> u32 {
        self.items
            .iter()
            .filter(|item| item.kind == ItemKind::Course)
            .count() as u32
    }

    /// Advances the fulfillment status.
    ///
    /// Fails when the transition is not a legal forward move.
    pub fn advance_status(&mut self, next: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_advance_to(next) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Order status cannot move from {} to {}", self.status, next),
            ));
        }
        self.status = next;
        Ok(())
    }
}

/// Input for creating an order; the store assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub account_id: AccountId,
    pub items: Vec<LineItem>,
    pub total: Amount,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub reference: String,
    pub notes: Option<String>,
}

impl NewOrder {
    /// Builds an order record for a gateway-verified payment.
    pub fn paid(
        account_id: AccountId,
        items: Vec<LineItem>,
        total: Amount,
        reference: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            account_id,
            items,
            total,
            email,
            phone,
            status: OrderStatus::Paid,
            payment_method: PaymentMethod::Paystack,
            reference: reference.into(),
            notes: None,
        }
    }

    /// Materializes the persisted record with a server-assigned id and time.
    pub fn into_order(self, id: OrderId, created_at: Timestamp) -> Order {
        Order {
            id,
            account_id: self.account_id,
            items: self.items,
            total: self.total,
            email: self.email,
            phone: self.phone,
            status: self.status,
            payment_method: self.payment_method,
            reference: self.reference,
            notes: self.notes,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CourseId, ProductId};

    fn paid_order() -> Order {
        let new_order = NewOrder::paid(
            AccountId::new(),
            vec![
                LineItem::course(CourseId::new(), None, Some(Amount::from_minor(50000))),
                LineItem::product(ProductId::new(), None, Some(Amount::from_minor(10000)), 2),
            ],
            Amount::from_minor(70000),
            "ref-123",
            Some("buyer@example.com".to_string()),
            None,
        );
        new_order.into_order(OrderId::new(), Timestamp::now())
    }

    #[test]
    fn paid_constructor_records_paystack_method() {
        let order = paid_order();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_method, PaymentMethod::Paystack);
        assert_eq!(order.reference, "ref-123");
    }

    #[test]
    fn course_item_count_only_counts_courses() {
        let order = paid_order();
        assert_eq!(order.course_item_count(), 1);
    }

    #[test]
    fn advance_status_accepts_forward_move() {
        let mut order = paid_order();
        assert!(order.advance_status(OrderStatus::Processing).is_ok());
        assert_eq!(order.status, OrderStatus::Processing);
    }

    #[test]
    fn advance_status_rejects_backward_move() {
        let mut order = paid_order();
        let result = order.advance_status(OrderStatus::Pending);
        assert!(result.is_err());
        assert_eq!(order.status, OrderStatus::Paid);
    }
}
