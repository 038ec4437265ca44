//! In-memory order store.
//!
//! Deterministic implementation for unit tests and local development. The
//! gateway-reference uniqueness check and the insert happen under one write
//! lock, mirroring the database unique constraint.
//!
//! # Security Note
//!
//! Testing only; `.expect()` on lock operations, see the account store note.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::order::{NewOrder, Order};
use crate::ports::{OrderStore, OrderStoreError};

/// In-memory order store enforcing reference uniqueness.
pub struct InMemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(Vec::new()),
        }
    }

    /// Number of persisted orders (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn order_count(&self) -> usize {
        self.orders
            .read()
            .expect("InMemoryOrderStore: lock poisoned")
            .len()
    }

    /// Snapshot of all persisted orders (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn all_orders(&self) -> Vec<Order> {
        self.orders
            .read()
            .expect("InMemoryOrderStore: lock poisoned")
            .clone()
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| OrderStoreError::storage("order lock poisoned"))?;

        if orders.iter().any(|o| o.reference == order.reference) {
            return Err(OrderStoreError::duplicate(order.reference));
        }

        let persisted = order.into_order(OrderId::new(), Timestamp::now());
        orders.push(persisted.clone());
        Ok(persisted)
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, OrderStoreError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| OrderStoreError::storage("order lock poisoned"))?;
        Ok(orders.iter().find(|o| o.reference == reference).cloned())
    }
}
