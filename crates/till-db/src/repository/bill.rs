//! # Bill Repository
//!
//! Database operations for committed bills, their priced lines, and the
//! change dispensed against them. Bills are append-only: every row here was
//! written inside a single committed transaction, and nothing updates a bill
//! afterwards except the `mail_sent` flag.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::{Bill, BillLine, BillReceipt, ChangeEntry};

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Fetches a full receipt (bill, lines, change) by bill id.
    pub async fn get(&self, bill_id: &str) -> DbResult<Option<BillReceipt>> {
        let bill = sqlx::query_as::<_, Bill>(
            r#"
            SELECT id, customer_id, total_cents, rounded_total_cents, tax_cents,
                   paid_cents, balance_cents, dropped_remainder_cents, mail_sent,
                   created_at
            FROM bills
            WHERE id = ?1
            "#,
        )
        .bind(bill_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(bill) = bill else {
            return Ok(None);
        };

        let lines = self.lines_for(bill_id).await?;
        let change = self.change_for(bill_id).await?;

        Ok(Some(BillReceipt { bill, lines, change }))
    }

    /// Lists all receipts for a customer's email, newest first.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no customer with that email
    pub async fn list_for_customer(&self, email: &str) -> DbResult<Vec<BillReceipt>> {
        let customer_id = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id FROM customers WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", email.to_string()))?;

        let bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT id, customer_id, total_cents, rounded_total_cents, tax_cents,
                   paid_cents, balance_cents, dropped_remainder_cents, mail_sent,
                   created_at
            FROM bills
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(&customer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut receipts = Vec::with_capacity(bills.len());
        for bill in bills {
            let lines = self.lines_for(&bill.id).await?;
            let change = self.change_for(&bill.id).await?;
            receipts.push(BillReceipt { bill, lines, change });
        }

        Ok(receipts)
    }

    /// Flags a bill as notified. Called by the notification worker after a
    /// successful delivery; never part of the bill transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no bill with that id
    pub async fn mark_notified(&self, bill_id: &str) -> DbResult<()> {
        debug!(bill_id = %bill_id, "Marking bill notified");

        let result = sqlx::query(
            r#"
            UPDATE bills SET mail_sent = 1 WHERE id = ?1
            "#,
        )
        .bind(bill_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bill", bill_id.to_string()));
        }

        Ok(())
    }

    async fn lines_for(&self, bill_id: &str) -> DbResult<Vec<BillLine>> {
        let lines = sqlx::query_as::<_, BillLine>(
            r#"
            SELECT id, bill_id, product_id, name_snapshot, quantity,
                   unit_price_cents, tax_rate_bps, tax_cents, total_cents, created_at
            FROM bill_lines
            WHERE bill_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn change_for(&self, bill_id: &str) -> DbResult<Vec<ChangeEntry>> {
        let change = sqlx::query_as::<_, ChangeEntry>(
            r#"
            SELECT id, bill_id, value, count, created_at
            FROM bill_change
            WHERE bill_id = ?1
            ORDER BY value DESC
            "#,
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(change)
    }

    // =========================================================================
    // In-transaction building blocks (used by the billing engine)
    // =========================================================================

    /// Inserts the bill header on the caller's connection.
    pub async fn insert_bill_in(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bills (
                id, customer_id, total_cents, rounded_total_cents, tax_cents,
                paid_cents, balance_cents, dropped_remainder_cents, mail_sent,
                created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&bill.id)
        .bind(&bill.customer_id)
        .bind(bill.total_cents)
        .bind(bill.rounded_total_cents)
        .bind(bill.tax_cents)
        .bind(bill.paid_cents)
        .bind(bill.balance_cents)
        .bind(bill.dropped_remainder_cents)
        .bind(bill.mail_sent)
        .bind(bill.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts one priced line on the caller's connection.
    pub async fn insert_line_in(conn: &mut SqliteConnection, line: &BillLine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bill_lines (
                id, bill_id, product_id, name_snapshot, quantity,
                unit_price_cents, tax_rate_bps, tax_cents, total_cents, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&line.id)
        .bind(&line.bill_id)
        .bind(&line.product_id)
        .bind(&line.name_snapshot)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.tax_rate_bps)
        .bind(line.tax_cents)
        .bind(line.total_cents)
        .bind(line.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Inserts one dispensed-change row on the caller's connection.
    pub async fn insert_change_in(
        conn: &mut SqliteConnection,
        bill_id: &str,
        value: i64,
        count: i64,
        now: DateTime<Utc>,
    ) -> DbResult<ChangeEntry> {
        let entry = ChangeEntry {
            id: Uuid::new_v4().to_string(),
            bill_id: bill_id.to_string(),
            value,
            count,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO bill_change (id, bill_id, value, count, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.bill_id)
        .bind(entry.value)
        .bind(entry.count)
        .bind(entry.created_at)
        .execute(conn)
        .await?;

        Ok(entry)
    }
}
