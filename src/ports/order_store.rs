//! Order store port - immutable transaction records.
//!
//! The uniqueness of the gateway reference is enforced here, and it is the
//! single point of truth for "this payment has already been reconciled". Two
//! concurrent reconciliations of one reference race on `create`; the first
//! writer wins and the loser observes [`OrderStoreError::DuplicateReference`].

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::order::{NewOrder, Order};

/// Errors from order persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderStoreError {
    /// An order with this gateway reference already exists. The coordinator
    /// treats this as "already reconciled", not as a failure.
    #[error("order already exists for reference '{reference}'")]
    DuplicateReference { reference: String },

    /// Any other persistence failure.
    #[error("order storage error: {0}")]
    Storage(String),
}

impl OrderStoreError {
    pub fn duplicate(reference: impl Into<String>) -> Self {
        OrderStoreError::DuplicateReference {
            reference: reference.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        OrderStoreError::Storage(message.into())
    }
}

/// Port for recording and looking up orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order, assigning a server-generated id and timestamp.
    ///
    /// Fails with [`OrderStoreError::DuplicateReference`] when an order for
    /// the same gateway reference already exists.
    async fn create(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    /// Finds the order recorded for a gateway reference, if any.
    async fn find_by_reference(&self, reference: &str)
        -> Result<Option<Order>, OrderStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_store_is_object_safe() {
        fn _accepts_dyn(_store: &dyn OrderStore) {}
    }

    #[test]
    fn duplicate_error_names_the_reference() {
        let err = OrderStoreError::duplicate("ref-9");
        assert!(err.to_string().contains("ref-9"));
    }
}
