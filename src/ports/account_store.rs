//! Account store port - read access to buyer accounts.

use async_trait::async_trait;

use crate::domain::account::Account;
use crate::domain::foundation::{AccountId, DomainError};

/// Port for reading accounts by id.
///
/// Entitlement mutations go through the [`EntitlementLedger`] port instead;
/// this port exists for the reconciliation coordinator's contact lookup
/// (receipt email fallback, phone on the order record).
///
/// [`EntitlementLedger`]: crate::ports::EntitlementLedger
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Looks up an account by id.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError>;
}
