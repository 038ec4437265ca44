//! Entitlement ledger port - idempotent grants of course and product rights.
//!
//! The ledger owns the per-account record of enrollments and purchases and
//! applies additions idempotently:
//!
//! - granting a course the account already holds is a no-op, not a failure
//! - granting a product merges the quantity into any existing entry
//!
//! Implementations must be safe under concurrent calls for the same account
//! (account-level locking or single-statement atomic updates).

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{AccountId, CourseId, ProductId};

/// Result of a course grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseGrant {
    /// `true` when a new enrollment was created; `false` when the account
    /// already held one (duplicate suppression, not failure).
    pub granted: bool,
}

/// Result of a product grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductGrant {
    /// The account's quantity for the product after the additive merge.
    pub merged_quantity: u32,
}

/// Errors from ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The account id does not resolve.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// Underlying storage failure.
    #[error("entitlement storage error: {0}")]
    Storage(String),
}

/// Port for applying entitlement grants.
#[async_trait]
pub trait EntitlementLedger: Send + Sync {
    /// Adds a course enrollment unless one already exists.
    async fn grant_course(
        &self,
        account_id: &AccountId,
        course_id: &CourseId,
    ) -> Result<CourseGrant, LedgerError>;

    /// Merges a product purchase additively into the account.
    async fn grant_product(
        &self,
        account_id: &AccountId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ProductGrant, LedgerError>;
}
