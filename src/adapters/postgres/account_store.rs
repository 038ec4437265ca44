//! PostgreSQL implementation of AccountStore.
//!
//! Assembles the Account aggregate from the `accounts` row and its two
//! entitlement child tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::account::{Account, Enrollment, Purchase};
use crate::domain::foundation::{
    AccountId, CourseId, DomainError, ErrorCode, ProductId, Timestamp,
};
use crate::ports::AccountStore;

/// PostgreSQL implementation of the AccountStore port.
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    /// Creates a new PostgresAccountStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an account.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    full_name: String,
    email: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Database row representation of an enrollment.
#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    course_id: Uuid,
    enrolled_at: DateTime<Utc>,
    progress: i16,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

/// Database row representation of a purchase.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    product_id: Uuid,
    purchased_at: DateTime<Utc>,
    quantity: i32,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = DomainError;

    fn try_from(row: EnrollmentRow) -> Result<Self, Self::Error> {
        let progress = u8::try_from(row.progress).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid progress value: {}", row.progress),
            )
        })?;

        Ok(Enrollment {
            course_id: CourseId::from_uuid(row.course_id),
            enrolled_at: Timestamp::from_datetime(row.enrolled_at),
            progress,
            completed: row.completed,
            completed_at: row.completed_at.map(Timestamp::from_datetime),
        })
    }
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = DomainError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid quantity value: {}", row.quantity),
            )
        })?;

        Ok(Purchase {
            product_id: ProductId::from_uuid(row.product_id),
            purchased_at: Timestamp::from_datetime(row.purchased_at),
            quantity,
        })
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, DomainError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, full_name, email, phone, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find account: {}", e))
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let enrollment_rows: Vec<EnrollmentRow> = sqlx::query_as(
            r#"
            SELECT course_id, enrolled_at, progress, completed, completed_at
            FROM account_enrollments
            WHERE account_id = $1
            ORDER BY enrolled_at ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load enrollments: {}", e),
            )
        })?;

        let purchase_rows: Vec<PurchaseRow> = sqlx::query_as(
            r#"
            SELECT product_id, purchased_at, quantity
            FROM account_purchases
            WHERE account_id = $1
            ORDER BY purchased_at ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to load purchases: {}", e),
            )
        })?;

        let enrollments = enrollment_rows
            .into_iter()
            .map(Enrollment::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let purchases = purchase_rows
            .into_iter()
            .map(Purchase::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Account {
            id: AccountId::from_uuid(row.id),
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            enrollments,
            purchases,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        }))
    }
}
