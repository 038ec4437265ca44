//! PostgreSQL implementation of OrderStore.
//!
//! The unique index on `orders.payment_reference` is the system's single
//! point of truth for "this reference has already been reconciled"; a
//! violation of that index surfaces as the specific
//! `OrderStoreError::DuplicateReference`, never as a generic write failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{AccountId, Amount, OrderId, Timestamp};
use crate::domain::order::{ItemKind, LineItem, NewOrder, Order, OrderStatus, PaymentMethod};
use crate::ports::{OrderStore, OrderStoreError};

/// Name of the unique index guarding the gateway reference.
const REFERENCE_UNIQUE_CONSTRAINT: &str = "orders_payment_reference_key";

/// PostgreSQL implementation of the OrderStore port.
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgresOrderStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    account_id: Uuid,
    total_minor: i64,
    email: Option<String>,
    phone: Option<String>,
    status: String,
    payment_method: String,
    payment_reference: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

/// Database row representation of an order line item.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    kind: String,
    item_id: Uuid,
    name: Option<String>,
    unit_price_minor: Option<i64>,
    quantity: i32,
}

fn parse_status(s: &str) -> Result<OrderStatus, OrderStoreError> {
    match s.to_lowercase().as_str() {
        "pending" => Ok(OrderStatus::Pending),
        "paid" => Ok(OrderStatus::Paid),
        "processing" => Ok(OrderStatus::Processing),
        "shipped" => Ok(OrderStatus::Shipped),
        "delivered" => Ok(OrderStatus::Delivered),
        "cancelled" => Ok(OrderStatus::Cancelled),
        _ => Err(OrderStoreError::storage(format!(
            "Invalid status value: {}",
            s
        ))),
    }
}

fn parse_payment_method(s: &str) -> Result<PaymentMethod, OrderStoreError> {
    match s.to_lowercase().as_str() {
        "paystack" => Ok(PaymentMethod::Paystack),
        "bank_transfer" => Ok(PaymentMethod::BankTransfer),
        "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
        _ => Err(OrderStoreError::storage(format!(
            "Invalid payment method value: {}",
            s
        ))),
    }
}

fn parse_item_kind(s: &str) -> Result<ItemKind, OrderStoreError> {
    match s.to_lowercase().as_str() {
        "course" => Ok(ItemKind::Course),
        "product" => Ok(ItemKind::Product),
        _ => Err(OrderStoreError::storage(format!(
            "Invalid item kind value: {}",
            s
        ))),
    }
}

impl TryFrom<OrderItemRow> for LineItem {
    type Error = OrderStoreError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            OrderStoreError::storage(format!("Invalid item quantity: {}", row.quantity))
        })?;

        Ok(LineItem {
            kind: parse_item_kind(&row.kind)?,
            item_id: row.item_id,
            name: row.name,
            unit_price: row.unit_price_minor.map(Amount::from_minor),
            quantity,
        })
    }
}

fn assemble(row: OrderRow, item_rows: Vec<OrderItemRow>) -> Result<Order, OrderStoreError> {
    let items = item_rows
        .into_iter()
        .map(LineItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Order {
        id: OrderId::from_uuid(row.id),
        account_id: AccountId::from_uuid(row.account_id),
        items,
        total: Amount::from_minor(row.total_minor),
        email: row.email,
        phone: row.phone,
        status: parse_status(&row.status)?,
        payment_method: parse_payment_method(&row.payment_method)?,
        reference: row.payment_reference,
        notes: row.notes,
        created_at: Timestamp::from_datetime(row.created_at),
    })
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let order = order.into_order(OrderId::new(), Timestamp::now());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrderStoreError::storage(format!("Failed to open transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, account_id, total_minor, email, phone, status,
                payment_method, payment_reference, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.account_id.as_uuid())
        .bind(order.total.as_minor())
        .bind(&order.email)
        .bind(&order.phone)
        .bind(order.status.as_str())
        .bind(order.payment_method.as_str())
        .bind(&order.reference)
        .bind(&order.notes)
        .bind(order.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(REFERENCE_UNIQUE_CONSTRAINT) {
                    return OrderStoreError::duplicate(order.reference.clone());
                }
            }
            OrderStoreError::storage(format!("Failed to save order: {}", e))
        })?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, kind, item_id, name, unit_price_minor, quantity
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(position as i32)
            .bind(item.kind.to_string())
            .bind(item.item_id)
            .bind(&item.name)
            .bind(item.unit_price.map(|p| p.as_minor()))
            .bind(item.quantity as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| OrderStoreError::storage(format!("Failed to save order item: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| OrderStoreError::storage(format!("Failed to commit order: {}", e)))?;

        Ok(order)
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, OrderStoreError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, total_minor, email, phone, status,
                   payment_method, payment_reference, notes, created_at
            FROM orders
            WHERE payment_reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| OrderStoreError::storage(format!("Failed to find order: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let item_rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT kind, item_id, name, unit_price_minor, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| OrderStoreError::storage(format!("Failed to load order items: {}", e)))?;

        assemble(row, item_rows).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status_works_for_all_values() {
        assert_eq!(parse_status("pending").unwrap(), OrderStatus::Pending);
        assert_eq!(parse_status("paid").unwrap(), OrderStatus::Paid);
        assert_eq!(parse_status("processing").unwrap(), OrderStatus::Processing);
        assert_eq!(parse_status("shipped").unwrap(), OrderStatus::Shipped);
        assert_eq!(parse_status("delivered").unwrap(), OrderStatus::Delivered);
        assert_eq!(parse_status("cancelled").unwrap(), OrderStatus::Cancelled);
        assert_eq!(parse_status("PAID").unwrap(), OrderStatus::Paid);
    }

    #[test]
    fn parse_status_rejects_invalid_values() {
        assert!(parse_status("invalid").is_err());
        assert!(parse_status("").is_err());
    }

    #[test]
    fn parse_payment_method_works_for_all_values() {
        assert_eq!(
            parse_payment_method("paystack").unwrap(),
            PaymentMethod::Paystack
        );
        assert_eq!(
            parse_payment_method("bank_transfer").unwrap(),
            PaymentMethod::BankTransfer
        );
        assert_eq!(
            parse_payment_method("cash_on_delivery").unwrap(),
            PaymentMethod::CashOnDelivery
        );
    }

    #[test]
    fn parse_item_kind_rejects_unknown_kind() {
        assert!(parse_item_kind("course").is_ok());
        assert!(parse_item_kind("product").is_ok());
        assert!(parse_item_kind("subscription").is_err());
    }

    #[test]
    fn roundtrip_status_conversion() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let parsed = parse_status(status.as_str()).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn item_row_converts_to_line_item() {
        let row = OrderItemRow {
            kind: "product".to_string(),
            item_id: Uuid::new_v4(),
            name: Some("Study Pack".to_string()),
            unit_price_minor: Some(10000),
            quantity: 2,
        };

        let item = LineItem::try_from(row).unwrap();
        assert_eq!(item.kind, ItemKind::Product);
        assert_eq!(item.unit_price, Some(Amount::from_minor(10000)));
        assert_eq!(item.quantity, 2);
    }

    #[test]
    fn item_row_rejects_negative_quantity() {
        let row = OrderItemRow {
            kind: "product".to_string(),
            item_id: Uuid::new_v4(),
            name: None,
            unit_price_minor: None,
            quantity: -1,
        };

        assert!(LineItem::try_from(row).is_err());
    }

    #[test]
    fn assemble_builds_order_from_rows() {
        let row = OrderRow {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            total_minor: 70000,
            email: Some("buyer@example.com".to_string()),
            phone: None,
            status: "paid".to_string(),
            payment_method: "paystack".to_string(),
            payment_reference: "ref-123".to_string(),
            notes: None,
            created_at: Utc::now(),
        };
        let items = vec![OrderItemRow {
            kind: "course".to_string(),
            item_id: Uuid::new_v4(),
            name: None,
            unit_price_minor: Some(70000),
            quantity: 1,
        }];

        let order = assemble(row, items).unwrap();
        assert_eq!(order.total, Amount::from_minor(70000));
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.course_item_count(), 1);
    }
}
