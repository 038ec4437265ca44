//! Receipt notifier port - best-effort buyer notification.
//!
//! Delivery is fire-and-forget from the workflow's perspective: failures are
//! logged by the caller and never influence the reconciliation outcome.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{Amount, Timestamp};

/// Structured receipt content for a verified payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// Recipient email (gateway-reported buyer email, falling back to the
    /// account email).
    pub to: String,

    /// Gateway transaction reference.
    pub reference: String,

    /// Settled amount in minor units.
    pub amount: Amount,

    /// When the gateway settled the payment.
    pub paid_at: Option<Timestamp>,

    /// Gateway status/response text.
    pub gateway_response: String,

    /// Number of courses newly granted by this payment.
    pub enrolled_courses: u32,
}

/// Errors from receipt delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// The message could not be delivered.
    #[error("receipt delivery failed: {0}")]
    Delivery(String),

    /// The mailer is misconfigured.
    #[error("mailer misconfigured: {0}")]
    Config(String),
}

/// Port for sending receipt/confirmation messages.
#[async_trait]
pub trait ReceiptNotifier: Send + Sync {
    /// Sends a receipt. Best-effort; the caller logs and swallows failures.
    async fn send_receipt(&self, receipt: Receipt) -> Result<(), NotifyError>;
}
