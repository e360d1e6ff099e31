//! # Customer Repository
//!
//! Database operations for customer accounts. Customers are identified by
//! email and created lazily: the first bill for an unseen email creates the
//! account inside that bill's transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::Customer;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Looks up a customer by email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, email, created_at
            FROM customers
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets an existing customer by email, creating one if absent.
    pub async fn upsert_by_email(&self, email: &str) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_by_email_in(&mut conn, email, Utc::now()).await
    }

    // =========================================================================
    // In-transaction building blocks (used by the billing engine)
    // =========================================================================

    /// Get-or-create on the caller's connection. Runs as the first write of
    /// the bill transaction, which also acquires SQLite's write lock up
    /// front.
    pub async fn upsert_by_email_in(
        conn: &mut SqliteConnection,
        email: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Customer> {
        let id = Uuid::new_v4().to_string();

        let inserted = sqlx::query(
            r#"
            INSERT INTO customers (id, email, created_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if inserted.rows_affected() == 1 {
            debug!(email = %email, "Created customer");
        }

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, email, created_at
            FROM customers
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", email.to_string()))?;

        Ok(customer)
    }
}
