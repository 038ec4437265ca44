//! Payment gateway port for transaction verification.
//!
//! Defines the contract for authoritative confirmation of a payment reference
//! against the external gateway (e.g. Paystack). The verification result is a
//! transient value consumed immediately by the reconciliation coordinator; it
//! is never persisted on its own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Amount, Timestamp};

/// Port for verifying payment transactions against the gateway.
///
/// Implementations must apply a bounded timeout to the network call; a
/// timeout surfaces as [`GatewayError::Unreachable`] and is safe to retry
/// with the same reference.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Authoritatively verifies a transaction reference.
    ///
    /// Returns the normalized settlement data on success. Fails with
    /// [`GatewayError::Rejected`] when the gateway reports the transaction as
    /// not found or not successful.
    async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError>;
}

/// Normalized, gateway-authoritative view of a settled transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayVerification {
    /// The gateway transaction reference.
    pub reference: String,

    /// Settled amount in minor units, authoritative over any client-declared
    /// prices.
    pub amount: Amount,

    /// Buyer email as reported by the gateway, if any.
    pub customer_email: Option<String>,

    /// When the gateway settled the transaction.
    pub paid_at: Option<Timestamp>,

    /// Gateway status text (e.g. "Successful", "Test mode (simulated)").
    pub gateway_response: String,
}

/// Errors from gateway verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Network/transport failure or timeout reaching the gateway.
    #[error("payment gateway unreachable: {reason}")]
    Unreachable { reason: String },

    /// No valid secret credential is configured. Includes the case of a
    /// publishable key supplied where a secret key is required.
    #[error("payment gateway misconfigured: {reason}")]
    ConfigError { reason: String },

    /// The gateway authoritatively reports the transaction as not found or
    /// not successful. Terminal for this reference.
    #[error("payment not verified by gateway (status: {status})")]
    Rejected { status: String },
}

impl GatewayError {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        GatewayError::Unreachable {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        GatewayError::ConfigError {
            reason: reason.into(),
        }
    }

    pub fn rejected(status: impl Into<String>) -> Self {
        GatewayError::Rejected {
            status: status.into(),
        }
    }

    /// Whether retrying the verification (same reference) can help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Unreachable { .. })
    }
}
