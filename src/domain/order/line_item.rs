//! Order line items.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{Amount, CourseId, ProductId};

/// The closed set of purchasable item kinds.
///
/// Adding a new entitlement kind (e.g. a subscription) means adding a variant
/// here, which makes every match site a compile error until handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Course,
    Product,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemKind::Course => "course",
            ItemKind::Product => "product",
        };
        write!(f, "{}", s)
    }
}

/// One line of an order.
///
/// The unit price is client-declared display data for the receipt; order
/// totals always come from the gateway-reported settlement amount, never from
/// summing line prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub kind: ItemKind,
    pub item_id: Uuid,
    pub name: Option<String>,
    pub unit_price: Option<Amount>,
    pub quantity: u32,
}

impl LineItem {
    /// Creates a course line item (quantity is always 1 for courses).
    pub fn course(course_id: CourseId, name: Option<String>, unit_price: Option<Amount>) -> Self {
        Self {
            kind: ItemKind::Course,
            item_id: *course_id.as_uuid(),
            name,
            unit_price,
            quantity: 1,
        }
    }

    /// Creates a product line item.
    pub fn product(
        product_id: ProductId,
        name: Option<String>,
        unit_price: Option<Amount>,
        quantity: u32,
    ) -> Self {
        Self {
            kind: ItemKind::Product,
            item_id: *product_id.as_uuid(),
            name,
            unit_price,
            quantity: quantity.max(1),
        }
    }
}
