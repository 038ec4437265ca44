//! Paystack gateway verification adapter.
//!
//! Implements the `PaymentGateway` port against the Paystack transaction
//! verification API.
//!
//! # Security
//!
//! - The secret key is held in `secrecy::SecretString` and never logged
//! - A publishable key (`pk_...`) is refused outright rather than sent
//! - The simulation escape hatch only activates through an explicit operator
//!   flag and emits a warning on every use
//!
//! # Configuration
//!
//! ```ignore
//! let config = PaystackConfig::new(secret_key);
//! let gateway = PaystackGateway::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::foundation::{Amount, Timestamp};
use crate::ports::{GatewayError, GatewayVerification, PaymentGateway};

use super::types::PaystackVerifyResponse;

/// Linear backoff unit between transport retries.
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Paystack API configuration.
#[derive(Clone)]
pub struct PaystackConfig {
    /// Paystack secret key (sk_live_... or sk_test_...).
    secret_key: SecretString,

    /// Base URL for the Paystack API (default: https://api.paystack.co).
    api_base_url: String,

    /// Bound on each verification request.
    request_timeout: Duration,

    /// Transport retries after the initial attempt.
    max_retries: u32,

    /// Operator escape hatch: simulate successful verification instead of
    /// calling the gateway. Never enabled implicitly.
    allow_test_mode: bool,
}

impl PaystackConfig {
    /// Creates a configuration with production defaults.
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::new(secret_key.into()),
            api_base_url: "https://api.paystack.co".to_string(),
            request_timeout: Duration::from_secs(10),
            max_retries: 2,
            allow_test_mode: false,
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the transport retry count.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Enable the simulation escape hatch.
    pub fn with_allow_test_mode(mut self, allow: bool) -> Self {
        self.allow_test_mode = allow;
        self
    }
}

/// Paystack implementation of the `PaymentGateway` port.
pub struct PaystackGateway {
    config: PaystackConfig,
    http_client: reqwest::Client,
}

impl PaystackGateway {
    /// Creates a new gateway client with the given configuration.
    pub fn new(config: PaystackConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Validates and exposes the secret key.
    ///
    /// Fails fast instead of sending a missing or publishable credential to
    /// the gateway.
    fn secret_key(&self) -> Result<&str, GatewayError> {
        let key = self.config.secret_key.expose_secret();
        if key.is_empty() {
            return Err(GatewayError::config(
                "PAYSTACK_SECRET_KEY is not configured",
            ));
        }
        if key.starts_with("pk_") {
            return Err(GatewayError::config(
                "a publishable key (pk_...) was supplied where a secret key (sk_...) is required",
            ));
        }
        Ok(key)
    }

    /// Builds a simulated successful verification.
    fn simulated(&self, reference: &str) -> GatewayVerification {
        tracing::warn!(
            reference = %reference,
            "PAYSTACK TEST MODE ACTIVE: returning a simulated successful verification"
        );
        GatewayVerification {
            reference: reference.to_string(),
            amount: Amount::ZERO,
            customer_email: None,
            paid_at: Some(Timestamp::now()),
            gateway_response: "Test mode (simulated)".to_string(),
        }
    }

    /// Sends the verification request, retrying transport failures with
    /// linear backoff. Only network errors and timeouts are retried.
    async fn send_with_retry(
        &self,
        url: &str,
        secret_key: &str,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut attempt = 0u32;
        loop {
            let result = self
                .http_client
                .get(url)
                .bearer_auth(secret_key)
                .timeout(self.config.request_timeout)
                .send()
                .await;

            match result {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.config.max_retries
                    && (err.is_timeout() || err.is_connect()) =>
                {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        error = %err,
                        "gateway request failed, retrying"
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) => return Err(GatewayError::unreachable(err.to_string())),
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn verify(&self, reference: &str) -> Result<GatewayVerification, GatewayError> {
        if self.config.allow_test_mode {
            return Ok(self.simulated(reference));
        }

        let secret_key = self.secret_key()?;
        let url = format!(
            "{}/transaction/verify/{}",
            self.config.api_base_url, reference
        );

        let response = self.send_with_retry(&url, secret_key).await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GatewayError::config(
                "the gateway rejected the configured secret key",
            ));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::rejected("reference_not_found"));
        }
        if status.is_server_error() {
            return Err(GatewayError::unreachable(format!(
                "gateway returned {}",
                status
            )));
        }

        let body: PaystackVerifyResponse = response.json().await.map_err(|err| {
            GatewayError::unreachable(format!("malformed gateway response: {}", err))
        })?;

        normalize(body)
    }
}

/// Normalizes a parsed verify response into the port's verification value.
fn normalize(body: PaystackVerifyResponse) -> Result<GatewayVerification, GatewayError> {
    if !body.status {
        return Err(GatewayError::rejected(
            body.message.unwrap_or_else(|| "verification failed".to_string()),
        ));
    }

    let tx = body
        .data
        .ok_or_else(|| GatewayError::rejected("missing transaction data"))?;

    if tx.status != "success" {
        return Err(GatewayError::rejected(tx.status));
    }

    Ok(GatewayVerification {
        reference: tx.reference,
        amount: Amount::from_minor(tx.amount),
        customer_email: tx.customer.and_then(|c| c.email),
        paid_at: tx.paid_at.as_deref().and_then(Timestamp::parse_rfc3339),
        gateway_response: tx
            .gateway_response
            .or(tx.channel)
            .unwrap_or_else(|| "Paystack".to_string()),
    })
}
