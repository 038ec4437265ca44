//! HTTP handlers for the payment endpoints.
//!
//! These handlers connect Axum routes to the application layer command
//! handlers.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::payment::{
    AccountLocks, ReconcileOutcome, ReconcilePaymentCommand, ReconcilePaymentHandler,
};
use crate::domain::foundation::AccountId;
use crate::domain::reconciliation::ReconciliationError;
use crate::ports::{AccountStore, EntitlementLedger, OrderStore, PaymentGateway, ReceiptNotifier};

use super::dto::{ErrorResponse, VerifyPaymentRequest, VerifyPaymentResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all payment dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped
/// dependencies for efficient sharing across handlers. The lock registry is
/// part of the state so per-request handlers still serialize per-account
/// critical sections.
#[derive(Clone)]
pub struct PaymentAppState {
    pub gateway: Arc<dyn PaymentGateway>,
    pub accounts: Arc<dyn AccountStore>,
    pub ledger: Arc<dyn EntitlementLedger>,
    pub orders: Arc<dyn OrderStore>,
    pub notifier: Arc<dyn ReceiptNotifier>,
    pub account_locks: AccountLocks,
}

impl PaymentAppState {
    /// Create the reconciliation handler on demand from the shared state.
    pub fn reconcile_handler(&self) -> ReconcilePaymentHandler {
        ReconcilePaymentHandler::new(
            self.gateway.clone(),
            self.accounts.clone(),
            self.ledger.clone(),
            self.orders.clone(),
            self.notifier.clone(),
            self.account_locks.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Account Context (would come from auth middleware in production)
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated account context extracted from the request.
///
/// In production, this would be extracted from JWT/session by auth
/// middleware. For now, uses a header-based extraction for
/// development/testing. The client payload never supplies the account id.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
}

/// Rejection type for AuthenticatedAccount extraction.
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedAccount
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // In production, this would validate a JWT from the Authorization
            // header. For development, we accept an X-Account-Id header.
            let account_id = parts
                .headers
                .get("X-Account-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<AccountId>().ok())
                .ok_or(AuthenticationRequired)?;

            Ok(AuthenticatedAccount { account_id })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/verify - Verify a payment reference and reconcile
/// entitlements.
///
/// A gateway-rejected payment is HTTP 200 with `status: "error"` in the
/// payload: the outcome is terminal, not transient, and the client should
/// not retry that reference.
pub async fn verify_payment(
    State(state): State<PaymentAppState>,
    account: AuthenticatedAccount,
    Json(request): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let handler = state.reconcile_handler();
    let cmd = ReconcilePaymentCommand {
        account_id: account.account_id,
        reference: request.reference,
        items: request.items.into_iter().map(Into::into).collect(),
    };

    let outcome = handler.handle(cmd).await?;

    let response = match outcome {
        ReconcileOutcome::Completed(completed) => {
            VerifyPaymentResponse::from_completed(&completed)
        }
        ReconcileOutcome::NotVerified {
            reference,
            gateway_status,
        } => VerifyPaymentResponse::not_verified(reference, gateway_status),
    };

    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts workflow errors to HTTP responses.
pub struct PaymentApiError(ReconciliationError);

impl From<ReconciliationError> for PaymentApiError {
    fn from(err: ReconciliationError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self.0 {
            ReconciliationError::InvalidRequest { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST")
            }
            ReconciliationError::AccountNotFound(_) => {
                (StatusCode::NOT_FOUND, "ACCOUNT_NOT_FOUND")
            }
            ReconciliationError::VerificationUnavailable { .. } => {
                (StatusCode::BAD_GATEWAY, "VERIFICATION_UNAVAILABLE")
            }
            ReconciliationError::DuplicateReference { .. } => {
                (StatusCode::CONFLICT, "DUPLICATE_REFERENCE")
            }
            ReconciliationError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        // Infrastructure details stay in the logs; the client gets a generic
        // message without internal state or credentials.
        let message = match &self.0 {
            ReconciliationError::Infrastructure(detail) => {
                tracing::error!(error = %detail, "reconciliation infrastructure failure");
                "Server error verifying payment".to_string()
            }
            other => other.message(),
        };

        let body = ErrorResponse::new(error_code, message);
        (status, Json(body)).into_response()
    }
}
