//! Payment configuration (Paystack)

use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration (Paystack)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Paystack secret key (sk_live_... or sk_test_...)
    #[serde(default)]
    pub paystack_secret_key: String,

    /// Operator escape hatch: simulate gateway verification instead of
    /// calling Paystack. Must be set explicitly; never inferred from a
    /// missing or invalid key.
    #[serde(default)]
    pub allow_test_mode: bool,

    /// Base URL for the Paystack API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout for each verification request, in seconds
    #[serde(default = "default_verify_timeout")]
    pub verify_timeout_secs: u64,

    /// Transport retries after the initial verification attempt
    #[serde(default = "default_verify_retries")]
    pub verify_retries: u32,
}

impl PaymentConfig {
    /// Check if the configured key is a Paystack test key
    pub fn is_test_key(&self) -> bool {
        self.paystack_secret_key.starts_with("sk_test_")
    }

    /// Check if the configured key is a Paystack live key
    pub fn is_live_key(&self) -> bool {
        self.paystack_secret_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    ///
    /// A publishable key (pk_...) is rejected outright: it must never stand
    /// in for the secret key. With `allow_test_mode` enabled the key may be
    /// absent, since no gateway call will be made.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.allow_test_mode {
            return Ok(());
        }
        if self.paystack_secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("PAYSTACK_SECRET_KEY"));
        }
        if !self.paystack_secret_key.starts_with("sk_") {
            return Err(ValidationError::InvalidPaystackKey);
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            paystack_secret_key: String::new(),
            allow_test_mode: false,
            api_base_url: default_api_base_url(),
            verify_timeout_secs: default_verify_timeout(),
            verify_retries: default_verify_retries(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_verify_timeout() -> u64 {
    10
}

fn default_verify_retries() -> u32 {
    2
}
