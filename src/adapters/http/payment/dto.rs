//! HTTP DTOs (Data Transfer Objects) for the payment endpoints.
//!
//! These types define the JSON request/response structure for payment
//! verification. They serve as the boundary between HTTP and the application
//! layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::handlers::payment::{CompletedReconciliation, RequestedItem};
use crate::domain::foundation::{Amount, CourseId, ProductId};
use crate::domain::order::ItemKind;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to verify a payment and reconcile its entitlements.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    /// Gateway transaction reference.
    pub reference: String,

    /// Buyer-declared item list.
    #[serde(default)]
    pub items: Vec<RequestedItemDto>,
}

/// One buyer-declared item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedItemDto {
    /// "course" or "product".
    pub kind: ItemKind,

    /// Catalog id of the item.
    pub item_id: Uuid,

    /// Display name for the receipt.
    #[serde(default)]
    pub name: Option<String>,

    /// Declared unit price in minor units. Display data only; totals come
    /// from the gateway settlement.
    #[serde(default)]
    pub unit_price: Option<i64>,

    /// Quantity for products; defaults to 1.
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl From<RequestedItemDto> for RequestedItem {
    fn from(dto: RequestedItemDto) -> Self {
        let unit_price = dto.unit_price.map(Amount::from_minor);
        match dto.kind {
            ItemKind::Course => RequestedItem::Course {
                course_id: CourseId::from_uuid(dto.item_id),
                name: dto.name,
                unit_price,
            },
            ItemKind::Product => RequestedItem::Product {
                product_id: ProductId::from_uuid(dto.item_id),
                name: dto.name,
                unit_price,
                quantity: dto.quantity.unwrap_or(1),
            },
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Response for the verification endpoint.
///
/// `status` is "success" when entitlements were applied and "error" when the
/// gateway reports the payment as not successful (which is still HTTP 200 -
/// a terminal outcome, not a transient failure).
#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentResponse {
    pub status: &'static str,
    pub message: String,

    #[serde(rename = "enrolledCourses", skip_serializing_if = "Option::is_none")]
    pub enrolled_courses: Option<u32>,

    pub data: GatewayDataResponse,
}

/// Gateway settlement data echoed to the client.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayDataResponse {
    pub reference: String,
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_response: Option<String>,
}

impl VerifyPaymentResponse {
    /// Builds the success response for a completed reconciliation.
    pub fn from_completed(completed: &CompletedReconciliation) -> Self {
        Self {
            status: "success",
            message: "Payment verified and entitlements applied".to_string(),
            enrolled_courses: Some(completed.enrolled_courses),
            data: GatewayDataResponse {
                reference: completed.order.reference.clone(),
                status: "success".to_string(),
                amount: Some(completed.verification.amount.as_minor()),
                paid_at: completed.verification.paid_at.map(|ts| ts.to_rfc3339()),
                gateway_response: Some(completed.verification.gateway_response.clone()),
            },
        }
    }

    /// Builds the terminal not-verified response.
    pub fn not_verified(reference: String, gateway_status: String) -> Self {
        Self {
            status: "error",
            message: "Payment not verified".to_string(),
            enrolled_courses: None,
            data: GatewayDataResponse {
                reference,
                status: gateway_status,
                amount: None,
                paid_at: None,
                gateway_response: None,
            },
        }
    }
}

/// Error body for failed requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            code,
            message: message.into(),
        }
    }
}
