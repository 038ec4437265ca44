//! HTTP adapter for the payment verification endpoint.

pub mod dto;
mod handlers;
mod routes;

pub use handlers::{AuthenticatedAccount, PaymentApiError, PaymentAppState};
pub use routes::{payment_router, payment_routes};
