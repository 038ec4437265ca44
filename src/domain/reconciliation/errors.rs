//! Reconciliation workflow error taxonomy.
//!
//! `PaymentNotVerified` is deliberately absent: a gateway that authoritatively
//! reports a failed payment is a legitimate terminal outcome, not an error
//! (see `ReconcileOutcome::NotVerified` in the application layer).
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | InvalidRequest | 400 |
//! | AccountNotFound | 404 |
//! | VerificationUnavailable | 502 |
//! | DuplicateReference | 409 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{AccountId, DomainError, ErrorCode};

/// Errors surfaced by the reconciliation coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconciliationError {
    /// The request is malformed; the caller must correct and resubmit.
    InvalidRequest { field: String, message: String },

    /// Transient failure talking to the payment gateway. Safe to retry with
    /// the identical reference (the idempotency guard absorbs replays).
    VerificationUnavailable { reason: String },

    /// The authenticated account does not resolve.
    AccountNotFound(AccountId),

    /// An order already exists for the reference and could not be loaded as a
    /// replay. Data-integrity condition, distinguishable from generic storage
    /// failures.
    DuplicateReference { reference: String },

    /// Persistence or other infrastructure failure. Not auto-retried within a
    /// request; surfaced to the caller.
    Infrastructure(String),
}

impl ReconciliationError {
    pub fn invalid_request(field: impl Into<String>, message: impl Into<String>) -> Self {
        ReconciliationError::InvalidRequest {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn verification_unavailable(reason: impl Into<String>) -> Self {
        ReconciliationError::VerificationUnavailable {
            reason: reason.into(),
        }
    }

    pub fn account_not_found(account_id: AccountId) -> Self {
        ReconciliationError::AccountNotFound(account_id)
    }

    pub fn duplicate_reference(reference: impl Into<String>) -> Self {
        ReconciliationError::DuplicateReference {
            reference: reference.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        ReconciliationError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            ReconciliationError::InvalidRequest { .. } => ErrorCode::ValidationFailed,
            ReconciliationError::VerificationUnavailable { .. } => ErrorCode::GatewayUnreachable,
            ReconciliationError::AccountNotFound(_) => ErrorCode::AccountNotFound,
            ReconciliationError::DuplicateReference { .. } => ErrorCode::DuplicateReference,
            ReconciliationError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message. Never includes credentials or
    /// internal state.
    pub fn message(&self) -> String {
        match self {
            ReconciliationError::InvalidRequest { field, message } => {
                format!("Invalid request: {} ({})", message, field)
            }
            ReconciliationError::VerificationUnavailable { reason } => {
                format!("Payment verification is currently unavailable: {}", reason)
            }
            ReconciliationError::AccountNotFound(account_id) => {
                format!("Account not found: {}", account_id)
            }
            ReconciliationError::DuplicateReference { reference } => {
                format!("An order already exists for reference '{}'", reference)
            }
            ReconciliationError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Whether the caller may safely retry with the same reference.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconciliationError::VerificationUnavailable { .. })
    }
}

impl std::fmt::Display for ReconciliationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ReconciliationError {}

impl From<ReconciliationError> for DomainError {
    fn from(err: ReconciliationError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
