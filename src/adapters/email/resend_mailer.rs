//! Resend transactional email adapter.
//!
//! Implements the `ReceiptNotifier` port over the Resend HTTP API. Delivery
//! is best-effort from the workflow's perspective; the caller decides what a
//! failure means (for reconciliation: log and continue).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::ports::{NotifyError, Receipt, ReceiptNotifier};

/// Resend mailer configuration.
#[derive(Clone)]
pub struct ResendMailerConfig {
    /// Resend API key (re_...).
    api_key: SecretString,

    /// "Name <address>" header value.
    from: String,

    /// Base URL for the Resend API (default: https://api.resend.com).
    api_base_url: String,
}

impl ResendMailerConfig {
    /// Creates a mailer configuration.
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            from: from.into(),
            api_base_url: "https://api.resend.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Resend implementation of the `ReceiptNotifier` port.
pub struct ResendMailer {
    config: ResendMailerConfig,
    http_client: reqwest::Client,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

impl ResendMailer {
    /// Creates a mailer with the given configuration.
    pub fn new(config: ResendMailerConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ReceiptNotifier for ResendMailer {
    async fn send_receipt(&self, receipt: Receipt) -> Result<(), NotifyError> {
        let api_key = self.config.api_key.expose_secret();
        if api_key.is_empty() {
            return Err(NotifyError::Config("RESEND_API_KEY is not configured".to_string()));
        }

        let url = format!("{}/emails", self.config.api_base_url);
        let request = SendEmailRequest {
            from: &self.config.from,
            to: [receipt.to.as_str()],
            subject: receipt_subject(&receipt),
            text: receipt_text(&receipt),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| NotifyError::Delivery(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %body, "mail API rejected receipt");
            return Err(NotifyError::Delivery(format!(
                "mail API returned {}",
                status
            )));
        }

        tracing::info!(to = %receipt.to, reference = %receipt.reference, "receipt sent");
        Ok(())
    }
}

fn receipt_subject(receipt: &Receipt) -> String {
    format!("Receipt for payment {}", receipt.reference)
}

/// Plain-text receipt body. Template rendering is deliberately out of scope;
/// this is the minimal factual summary of the settlement.
fn receipt_text(receipt: &Receipt) -> String {
    let mut lines = vec![
        "Thank you for your payment.".to_string(),
        String::new(),
        format!("Amount:    {}", receipt.amount),
        format!("Reference: {}", receipt.reference),
        format!("Gateway:   {}", receipt.gateway_response),
    ];
    if let Some(paid_at) = &receipt.paid_at {
        lines.push(format!("Paid at:   {}", paid_at));
    }
    if receipt.enrolled_courses > 0 {
        lines.push(String::new());
        lines.push(format!(
            "You have been enrolled in {} course(s). They are waiting in your student dashboard.",
            receipt.enrolled_courses
        ));
    }
    lines.join("\n")
}
