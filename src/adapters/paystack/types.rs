//! Paystack API wire types.
//!
//! Only the fields the verification flow reads are modeled; everything else
//! in the gateway's payload is ignored by serde.

use serde::Deserialize;

/// Envelope of a `GET /transaction/verify/{reference}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackVerifyResponse {
    /// Whether the API call itself succeeded.
    pub status: bool,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Option<PaystackTransaction>,
}

/// The transaction object inside a verify response.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackTransaction {
    pub reference: String,

    /// Transaction status: "success", "failed", "abandoned", ...
    pub status: String,

    /// Settled amount in minor units (kobo).
    #[serde(default)]
    pub amount: i64,

    #[serde(default)]
    pub customer: Option<PaystackCustomer>,

    /// RFC 3339 settlement timestamp.
    #[serde(default)]
    pub paid_at: Option<String>,

    #[serde(default)]
    pub gateway_response: Option<String>,

    #[serde(default)]
    pub channel: Option<String>,
}

/// Customer block of a transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackCustomer {
    #[serde(default)]
    pub email: Option<String>,
}
