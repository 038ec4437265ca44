//! Per-account mutual exclusion for reconciliation attempts.
//!
//! Two reconciliations touching the same account's entitlement collections
//! must not interleave their check-then-grant sequences. The registry hands
//! out one async mutex per account id; holding the guard serializes the
//! critical section for that account while leaving other accounts untouched.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::foundation::AccountId;

/// Registry of per-account async locks.
///
/// Cloning is cheap; clones share the same registry.
#[derive(Clone, Default)]
pub struct AccountLocks {
    inner: Arc<StdMutex<HashMap<AccountId, Arc<Mutex<()>>>>>,
}

impl AccountLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for an account, waiting if another reconciliation
    /// for the same account is in flight.
    ///
    /// # Panics
    ///
    /// Panics if the registry mutex is poisoned.
    pub async fn acquire(&self, account_id: &AccountId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self
                .inner
                .lock()
                .expect("AccountLocks: registry lock poisoned");
            registry
                .entry(*account_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
