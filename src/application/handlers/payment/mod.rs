//! Payment reconciliation command handlers.

mod account_locks;
mod reconcile_payment;

pub use account_locks::AccountLocks;
pub use reconcile_payment::{
    CompletedReconciliation, ReconcileOutcome, ReconcilePaymentCommand, ReconcilePaymentHandler,
    RequestedItem,
};
