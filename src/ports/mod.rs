//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Reconciliation Ports
//!
//! - `PaymentGateway` - authoritative transaction verification
//! - `AccountStore` - account lookup (buyer contact data)
//! - `EntitlementLedger` - idempotent course/product grants
//! - `OrderStore` - immutable order records, reference uniqueness
//! - `ReceiptNotifier` - best-effort buyer notification

mod account_store;
mod entitlement_ledger;
mod order_store;
mod payment_gateway;
mod receipt_notifier;

pub use account_store::AccountStore;
pub use entitlement_ledger::{CourseGrant, EntitlementLedger, LedgerError, ProductGrant};
pub use order_store::{OrderStore, OrderStoreError};
pub use payment_gateway::{GatewayError, GatewayVerification, PaymentGateway};
pub use receipt_notifier::{NotifyError, Receipt, ReceiptNotifier};
