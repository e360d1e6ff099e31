//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD consumed by the admin surface
//! - The guarded stock decrement used by the billing engine
//!
//! ## The Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: decide from an earlier read, write blindly                   │
//! │     (validated stock=5)  UPDATE products SET available_stock = 2        │
//! │     Two concurrent bills can both pass validation on stock=5 and        │
//! │     both write, overselling the shelf.                                  │
//! │                                                                         │
//! │  ✅ CORRECT: conditional delta update, checked at commit time           │
//! │     UPDATE products SET available_stock = available_stock - ?2          │
//! │     WHERE product_id = ?1 AND available_stock >= ?2                     │
//! │                                                                         │
//! │     rows_affected == 0 → the row moved since validation; the whole      │
//! │     transaction rolls back with a retryable conflict.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::{validation, Product, ValidationError};

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Business identifier referenced by cart lines (e.g. "P1"). Unique.
    pub product_id: String,
    pub name: String,
    pub available_stock: i64,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::InvalidInput)` - malformed id/name, negative price or
    ///   stock, tax rate above 100%
    /// * `Err(DbError::UniqueViolation)` - product_id already exists
    pub async fn create(&self, new: NewProduct) -> DbResult<Product> {
        validation::validate_product_id(&new.product_id)?;
        validation::validate_product_name(&new.name)?;
        validation::validate_price_cents(new.unit_price_cents)?;
        validation::validate_tax_rate_bps(new.tax_rate_bps)?;
        if new.available_stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "available_stock".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        debug!(product_id = %new.product_id, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            product_id: new.product_id,
            name: new.name,
            available_stock: new.available_stock,
            unit_price_cents: new.unit_price_cents,
            tax_rate_bps: new.tax_rate_bps,
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                id, product_id, name, available_stock,
                unit_price_cents, tax_rate_bps, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.product_id)
        .bind(&product.name)
        .bind(product.available_stock)
        .bind(product.unit_price_cents)
        .bind(product.tax_rate_bps)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(product),
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { .. } => {
                    Err(DbError::duplicate("product_id", &product.product_id))
                }
                other => Err(other),
            },
        }
    }

    /// Gets a product by its business id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_product_id(&self, product_id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, product_id, name, available_stock,
                   unit_price_cents, tax_rate_bps, created_at, updated_at
            FROM products
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products, sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, product_id, name, available_stock,
                   unit_price_cents, tax_rate_bps, created_at, updated_at
            FROM products
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Sets a product's stock to an absolute level (restocking, stocktake
    /// corrections).
    ///
    /// ## Returns
    /// * `Err(DbError::InvalidInput)` - negative stock level
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn set_stock(&self, product_id: &str, new_stock: i64) -> DbResult<()> {
        if new_stock < 0 {
            return Err(ValidationError::OutOfRange {
                field: "available_stock".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        debug!(product_id = %product_id, new_stock = %new_stock, "Setting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET available_stock = ?2, updated_at = ?3
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .bind(new_stock)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Adjusts a product's stock by a delta (positive restock, negative
    /// shrinkage write-off). Guarded: an adjustment that would take stock
    /// negative is rejected.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist, or the delta
    ///   would make stock negative
    pub async fn adjust_stock(&self, product_id: &str, delta: i64) -> DbResult<()> {
        debug!(product_id = %product_id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET available_stock = available_stock + ?2, updated_at = ?3
            WHERE product_id = ?1 AND available_stock + ?2 >= 0
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product_id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // In-transaction building blocks (used by the billing engine)
    // =========================================================================

    /// Guarded stock decrement, executed on the caller's transaction
    /// connection.
    ///
    /// Returns `false` when the guard fails (stock moved below the
    /// requested quantity since validation, or the product vanished); the
    /// caller must roll back the enclosing transaction.
    pub async fn decrement_stock_in(
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET available_stock = available_stock - ?2, updated_at = ?3
            WHERE product_id = ?1 AND available_stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
