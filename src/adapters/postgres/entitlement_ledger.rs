//! PostgreSQL implementation of EntitlementLedger.
//!
//! Each grant is a single atomic statement, so concurrent grants for the
//! same account cannot lose updates:
//!
//! - course grants use `ON CONFLICT DO NOTHING` on the `(account_id,
//!   course_id)` primary key
//! - product grants use `ON CONFLICT ... DO UPDATE` to merge quantity
//!   additively into the `(account_id, product_id)` row

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{AccountId, CourseId, ProductId};
use crate::ports::{CourseGrant, EntitlementLedger, LedgerError, ProductGrant};

/// PostgreSQL implementation of the EntitlementLedger port.
pub struct PostgresEntitlementLedger {
    pool: PgPool,
}

impl PostgresEntitlementLedger {
    /// Creates a new PostgresEntitlementLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps an insert failure, turning a foreign-key violation on the account
/// into the ledger's AccountNotFound.
fn map_grant_error(err: sqlx::Error, account_id: &AccountId) -> LedgerError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err
            .constraint()
            .is_some_and(|c| c.ends_with("account_id_fkey"))
        {
            return LedgerError::AccountNotFound(*account_id);
        }
    }
    LedgerError::Storage(format!("Failed to apply grant: {}", err))
}

#[async_trait]
impl EntitlementLedger for PostgresEntitlementLedger {
    async fn grant_course(
        &self,
        account_id: &AccountId,
        course_id: &CourseId,
    ) -> Result<CourseGrant, LedgerError> {
        let result = sqlx::query(
            r#"
            INSERT INTO account_enrollments (account_id, course_id)
            VALUES ($1, $2)
            ON CONFLICT (account_id, course_id) DO NOTHING
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(course_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|e| map_grant_error(e, account_id))?;

        Ok(CourseGrant {
            granted: result.rows_affected() == 1,
        })
    }

    async fn grant_product(
        &self,
        account_id: &AccountId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ProductGrant, LedgerError> {
        let quantity = i32::try_from(quantity.max(1)).unwrap_or(i32::MAX);

        let merged: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO account_purchases (account_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (account_id, product_id)
            DO UPDATE SET quantity = account_purchases.quantity + EXCLUDED.quantity
            RETURNING quantity
            "#,
        )
        .bind(account_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_grant_error(e, account_id))?;

        let merged_quantity = u32::try_from(merged).map_err(|_| {
            LedgerError::Storage(format!("Invalid merged quantity: {}", merged))
        })?;

        Ok(ProductGrant { merged_quantity })
    }
}
