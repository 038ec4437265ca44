//! In-memory account store and entitlement ledger.
//!
//! Deterministic implementation for unit tests and local development.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are
//! poisoned. Production code should use the PostgreSQL adapters.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::account::Account;
use crate::domain::foundation::{AccountId, CourseId, DomainError, ErrorCode, ProductId, Timestamp};
use crate::ports::{AccountStore, CourseGrant, EntitlementLedger, LedgerError, ProductGrant};

/// In-memory account store that also serves as the entitlement ledger.
///
/// Grants mutate the stored account under a single write lock, so per-account
/// merges are applied atomically (the mutual-exclusion scope the ledger
/// contract requires).
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl InMemoryAccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a store seeded with one account.
    pub fn with_account(account: Account) -> Self {
        let store = Self::new();
        store.insert(account);
        store
    }

    /// Inserts or replaces an account.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, account: Account) {
        self.accounts
            .write()
            .expect("InMemoryAccountStore: lock poisoned")
            .insert(account.id, account);
    }

    /// Returns a snapshot of an account (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get(&self, id: &AccountId) -> Option<Account> {
        self.accounts
            .read()
            .expect("InMemoryAccountStore: lock poisoned")
            .get(id)
            .cloned()
    }
}

impl Default for InMemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "account lock poisoned"))?;
        Ok(accounts.get(id).cloned())
    }
}

#[async_trait]
impl EntitlementLedger for InMemoryAccountStore {
    async fn grant_course(
        &self,
        account_id: &AccountId,
        course_id: &CourseId,
    ) -> Result<CourseGrant, LedgerError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| LedgerError::Storage("account lock poisoned".to_string()))?;

        let account = accounts
            .get_mut(account_id)
            .ok_or(LedgerError::AccountNotFound(*account_id))?;

        let granted = account.enroll(*course_id, Timestamp::now());
        Ok(CourseGrant { granted })
    }

    async fn grant_product(
        &self,
        account_id: &AccountId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ProductGrant, LedgerError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| LedgerError::Storage("account lock poisoned".to_string()))?;

        let account = accounts
            .get_mut(account_id)
            .ok_or(LedgerError::AccountNotFound(*account_id))?;

        let merged_quantity = account.add_purchase(*product_id, quantity, Timestamp::now());
        Ok(ProductGrant { merged_quantity })
    }
}
