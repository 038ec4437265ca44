//! PostgreSQL persistence adapters.

mod account_store;
mod entitlement_ledger;
mod order_store;

pub use account_store::PostgresAccountStore;
pub use entitlement_ledger::PostgresEntitlementLedger;
pub use order_store::PostgresOrderStore;
