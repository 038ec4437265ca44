//! Axum router configuration for payment endpoints.

use axum::{routing::post, Router};

use super::handlers::{verify_payment, PaymentAppState};

/// Create the payment API router.
///
/// # Routes
///
/// ## User Endpoints (require authentication)
/// - `POST /verify` - Verify a gateway reference and reconcile entitlements
pub fn payment_routes() -> Router<PaymentAppState> {
    Router::new().route("/verify", post(verify_payment))
}

/// Create the complete payment module router, suitable for mounting at
/// `/api`.
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use learncart::adapters::http::payment::{payment_router, PaymentAppState};
///
/// let app_state = PaymentAppState { /* ... */ };
/// let app = Router::new()
///     .nest("/api", payment_router())
///     .with_state(app_state);
/// ```
pub fn payment_router() -> Router<PaymentAppState> {
    Router::new().nest("/payments", payment_routes())
}
