//! # Denomination Repository
//!
//! Database operations for the cash drawer's denomination levels.
//!
//! ## Drawer Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Bill, Three Movements                            │
//! │                                                                         │
//! │  customer hands over tender ──► increment_in (per tendered value)       │
//! │  change dispensed           ──► decrement_in (guarded, per change row)  │
//! │  admin restock/recount      ──► set_count / create                      │
//! │                                                                         │
//! │  increment and decrement run ONLY inside a bill's transaction; a        │
//! │  failed bill never pollutes drawer counts. The guard on decrement       │
//! │  (`AND count >= ?`) is what keeps counts from ever going negative       │
//! │  under concurrent bills.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::{validation, Denomination};

/// Repository for denomination database operations.
#[derive(Debug, Clone)]
pub struct DenominationRepository {
    pool: SqlitePool,
}

impl DenominationRepository {
    /// Creates a new DenominationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DenominationRepository { pool }
    }

    /// Creates a new denomination with an initial count.
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidInput)` - non-positive value or negative count
    /// * `Err(DbError::UniqueViolation)` - value already exists
    pub async fn create(&self, value: i64, initial_count: i64) -> DbResult<Denomination> {
        validation::validate_denomination_value(value)?;
        validation::validate_denomination_count(initial_count)?;

        debug!(value = %value, count = %initial_count, "Creating denomination");

        let now = Utc::now();
        let denomination = Denomination {
            value,
            count: initial_count,
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO denominations (value, count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(denomination.value)
        .bind(denomination.count)
        .bind(denomination.created_at)
        .bind(denomination.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(denomination),
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { .. } => {
                    Err(DbError::duplicate("denomination value", value.to_string()))
                }
                other => Err(other),
            },
        }
    }

    /// Sets a denomination's count to an absolute level (drawer recount).
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidInput)` - negative count
    /// * `Err(DbError::NotFound)` - value doesn't exist
    pub async fn set_count(&self, value: i64, new_count: i64) -> DbResult<()> {
        validation::validate_denomination_count(new_count)?;

        debug!(value = %value, new_count = %new_count, "Setting denomination count");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE denominations
            SET count = ?2, updated_at = ?3
            WHERE value = ?1
            "#,
        )
        .bind(value)
        .bind(new_count)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Denomination", value.to_string()));
        }

        Ok(())
    }

    /// Gets a single denomination by value.
    pub async fn get(&self, value: i64) -> DbResult<Option<Denomination>> {
        let denomination = sqlx::query_as::<_, Denomination>(
            r#"
            SELECT value, count, created_at, updated_at
            FROM denominations
            WHERE value = ?1
            "#,
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(denomination)
    }

    /// Lists all denominations in descending value order (the order the
    /// change solver considers them).
    pub async fn list_desc(&self) -> DbResult<Vec<Denomination>> {
        let mut conn = self.pool.acquire().await?;
        Self::snapshot_desc_in(&mut conn).await
    }

    // =========================================================================
    // In-transaction building blocks (used by the billing engine)
    // =========================================================================

    /// Reads the full drawer snapshot, descending by value, on the caller's
    /// connection. Inside a write transaction this is the authoritative
    /// state the change solver must be re-run against.
    pub async fn snapshot_desc_in(conn: &mut SqliteConnection) -> DbResult<Vec<Denomination>> {
        let denominations = sqlx::query_as::<_, Denomination>(
            r#"
            SELECT value, count, created_at, updated_at
            FROM denominations
            ORDER BY value DESC
            "#,
        )
        .fetch_all(conn)
        .await?;

        Ok(denominations)
    }

    /// Guarded decrement for dispensed change.
    ///
    /// Returns `false` when the guard fails (the drawer no longer holds
    /// `count` pieces of `value`); the caller must roll back.
    pub async fn decrement_in(
        conn: &mut SqliteConnection,
        value: i64,
        count: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE denominations
            SET count = count - ?2, updated_at = ?3
            WHERE value = ?1 AND count >= ?2
            "#,
        )
        .bind(value)
        .bind(count)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Increment for tendered cash. The value's existence was validated
    /// earlier in the same transaction's pipeline; a zero-row update here
    /// means the row vanished mid-flight, reported as `false` so the caller
    /// rolls back.
    pub async fn increment_in(
        conn: &mut SqliteConnection,
        value: i64,
        count: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE denominations
            SET count = count + ?2, updated_at = ?3
            WHERE value = ?1
            "#,
        )
        .bind(value)
        .bind(count)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
