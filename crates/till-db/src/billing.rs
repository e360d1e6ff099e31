//! # Billing Engine
//!
//! The bill transaction pipeline: validate the whole request against current
//! state, then apply every mutation inside a single database transaction.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  createBill: Validate, Then Mutate                      │
//! │                                                                         │
//! │  VALIDATION (reads only, no locks held)                                 │
//! │   1. request shape (email, lines, tender, paid ≥ 0)                     │
//! │   2. every tendered value is a known denomination (batch reject)        │
//! │   3. Σ tender == declared paid amount                                   │
//! │   4. per line: product exists, cumulative quantity ≤ stock, price it    │
//! │   5. totals → floor to whole unit → paid covers the amount due          │
//! │   6. advisory change solve against the unlocked drawer snapshot         │
//! │                                                                         │
//! │  MUTATION (one write transaction; any failure rolls back everything)    │
//! │   7. upsert customer (first write, takes the write lock up front)       │
//! │   8. guarded stock decrement per line (0 rows → ConcurrentConflict)     │
//! │   9. re-read drawer, re-solve change — THIS solve is authoritative      │
//! │  10. guarded drawer decrements (change) + increments (tender)           │
//! │  11. insert bill, line snapshots, change rows                           │
//! │  12. COMMIT                                                             │
//! │                                                                         │
//! │  POST-COMMIT (never affects the committed bill)                         │
//! │  13. hand the receipt to the notification dispatcher, if wired          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The advisory solve (step 6) exists to reject hopeless requests without
//! taking the write lock. It is re-run in step 9 against the transaction's
//! view of the drawer, because a concurrent bill may have changed counts in
//! between; only the in-transaction solve decides what is dispensed.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::notify::{BillNotification, NotificationSender};
use crate::repository::bill::BillRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::denomination::DenominationRepository;
use crate::repository::product::ProductRepository;
use till_core::{
    make_change, price_line, validation, Bill, BillLine, BillReceipt, BillRequest, BillTotals,
    BillingError, BillingResult, ChangeEntry, Denomination, DrawerLevel, Money,
};

// =============================================================================
// Billing Service
// =============================================================================

/// The bill transaction engine.
///
/// Stateless between calls; holds the pool and an optional notification
/// handle. Obtain via [`crate::Database::billing`] or
/// [`crate::Database::billing_with_notifications`].
#[derive(Debug, Clone)]
pub struct BillingService {
    pool: SqlitePool,
    notifier: Option<NotificationSender>,
}

/// A cart line after validation: pricing frozen, quantity confirmed against
/// stock. Carried from the read phase into the write phase.
struct ValidatedLine {
    product_id: String,
    name_snapshot: String,
    quantity: i64,
    unit_price_cents: i64,
    tax_rate_bps: u32,
    tax_cents: i64,
    total_cents: i64,
}

impl BillingService {
    pub fn new(pool: SqlitePool, notifier: Option<NotificationSender>) -> Self {
        BillingService { pool, notifier }
    }

    /// Runs one complete bill transaction.
    ///
    /// On success the bill, its line snapshots, stock decrements, drawer
    /// movements and change rows are all committed; the returned receipt
    /// reflects exactly what was persisted. On any error nothing was
    /// mutated.
    ///
    /// ## Errors
    /// The full taxonomy of [`BillingError`]; only
    /// [`BillingError::ConcurrentConflict`] is retryable as-is.
    pub async fn create_bill(&self, request: &BillRequest) -> BillingResult<BillReceipt> {
        validation::validate_bill_request(request)?;

        debug!(
            customer = %request.customer_email,
            lines = request.lines.len(),
            paid_cents = request.paid_cents,
            "Validating bill request"
        );

        // ---- Tender validation (drawer snapshot, no locks) ----

        let drawer = self.drawer_snapshot().await?;
        reject_unknown_denominations(request, &drawer)?;

        let tendered_cents = request.tendered_sum_cents();
        if tendered_cents != request.paid_cents {
            return Err(BillingError::MismatchedPayment {
                declared_cents: request.paid_cents,
                tendered_cents,
            });
        }

        // ---- Cart validation and pricing ----

        let (lines, totals) = self.price_cart(request).await?;

        let (due, dropped_remainder) = totals.rounded_total();
        let paid = Money::from_cents(request.paid_cents);
        if paid < due {
            return Err(BillingError::InsufficientPayment {
                due_cents: due.cents(),
                paid_cents: paid.cents(),
            });
        }

        // Both paid and due are unit-aligned, so the balance converts to
        // whole units exactly.
        let balance = paid - due;
        let balance_units = balance.whole_units();

        // Advisory solve: bail out cheaply if the drawer as last seen cannot
        // make change. The binding solve happens inside the transaction.
        let levels: Vec<DrawerLevel> = drawer
            .iter()
            .map(|d| DrawerLevel {
                value: d.value,
                count: d.count,
            })
            .collect();
        make_change(balance_units, &levels)?;

        // ---- Mutation phase ----

        let receipt = self
            .commit_bill(request, lines, totals, due, dropped_remainder, balance)
            .await?;

        info!(
            bill_id = %receipt.bill.id,
            customer = %request.customer_email,
            total = %receipt.bill.total(),
            balance = %receipt.bill.balance(),
            "Bill committed"
        );

        // ---- Post-commit notification (fire and forget) ----

        if let Some(notifier) = &self.notifier {
            let queued = notifier.send(BillNotification {
                customer_email: request.customer_email.clone(),
                bill: receipt.bill.clone(),
            });
            if !queued {
                warn!(
                    bill_id = %receipt.bill.id,
                    "Notification queue full or closed; bill remains committed"
                );
            }
        }

        Ok(receipt)
    }

    /// Reads the drawer outside any transaction.
    async fn drawer_snapshot(&self) -> BillingResult<Vec<Denomination>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        let drawer = DenominationRepository::snapshot_desc_in(&mut conn).await?;
        Ok(drawer)
    }

    /// Validates and prices every cart line against current products.
    ///
    /// Quantities for repeated product ids accumulate, so a cart cannot
    /// out-request the stock by splitting one product across several lines.
    async fn price_cart(
        &self,
        request: &BillRequest,
    ) -> BillingResult<(Vec<ValidatedLine>, BillTotals)> {
        let products = ProductRepository::new(self.pool.clone());

        let mut cache: HashMap<String, till_core::Product> = HashMap::new();
        let mut requested_so_far: HashMap<String, i64> = HashMap::new();
        let mut lines = Vec::with_capacity(request.lines.len());
        let mut totals = BillTotals::default();

        for cart_line in &request.lines {
            if !cache.contains_key(&cart_line.product_id) {
                let product = products
                    .get_by_product_id(&cart_line.product_id)
                    .await?
                    .ok_or_else(|| BillingError::ProductNotFound(cart_line.product_id.clone()))?;
                cache.insert(cart_line.product_id.clone(), product);
            }
            // Cached above when absent.
            let product = &cache[&cart_line.product_id];

            let cumulative = requested_so_far
                .entry(cart_line.product_id.clone())
                .or_insert(0);
            *cumulative += cart_line.quantity;
            if *cumulative > product.available_stock {
                return Err(BillingError::InsufficientStock {
                    product_id: cart_line.product_id.clone(),
                    available: product.available_stock,
                    requested: *cumulative,
                });
            }

            let priced = price_line(product.unit_price(), cart_line.quantity, product.tax_rate())?;
            totals.add_line(&priced);

            lines.push(ValidatedLine {
                product_id: product.product_id.clone(),
                name_snapshot: product.name.clone(),
                quantity: cart_line.quantity,
                unit_price_cents: product.unit_price_cents,
                tax_rate_bps: product.tax_rate_bps,
                tax_cents: priced.tax.cents(),
                total_cents: priced.total.cents(),
            });
        }

        Ok((lines, totals))
    }

    /// The write transaction. Every mutation goes through a guarded update;
    /// a failed guard means a concurrent bill won the race, and the whole
    /// transaction rolls back.
    async fn commit_bill(
        &self,
        request: &BillRequest,
        lines: Vec<ValidatedLine>,
        totals: BillTotals,
        due: Money,
        dropped_remainder: Money,
        balance: Money,
    ) -> BillingResult<BillReceipt> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let now = Utc::now();

        // First write: takes SQLite's write lock before the guarded updates,
        // so guard failures below mean genuinely stale validation, not lock
        // ordering accidents.
        let customer =
            CustomerRepository::upsert_by_email_in(&mut *tx, &request.customer_email, now).await?;

        for line in &lines {
            let decremented =
                ProductRepository::decrement_stock_in(&mut *tx, &line.product_id, line.quantity, now)
                    .await?;
            if !decremented {
                return Err(BillingError::ConcurrentConflict);
            }
        }

        // Authoritative change solve against the drawer as this transaction
        // sees it. A concurrent bill may have drained a denomination since
        // the advisory solve.
        let drawer = DenominationRepository::snapshot_desc_in(&mut *tx).await?;
        let levels: Vec<DrawerLevel> = drawer
            .iter()
            .map(|d| DrawerLevel {
                value: d.value,
                count: d.count,
            })
            .collect();
        let change_lines = make_change(balance.whole_units(), &levels)?;

        for change in &change_lines {
            let decremented =
                DenominationRepository::decrement_in(&mut *tx, change.value, change.count, now)
                    .await?;
            if !decremented {
                return Err(BillingError::ConcurrentConflict);
            }
        }

        for tender in &request.tender {
            let incremented =
                DenominationRepository::increment_in(&mut *tx, tender.value, tender.count, now)
                    .await?;
            if !incremented {
                return Err(BillingError::ConcurrentConflict);
            }
        }

        let bill = Bill {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.id,
            total_cents: totals.total.cents(),
            rounded_total_cents: due.cents(),
            tax_cents: totals.tax.cents(),
            paid_cents: request.paid_cents,
            balance_cents: balance.cents(),
            dropped_remainder_cents: dropped_remainder.cents(),
            mail_sent: false,
            created_at: now,
        };
        BillRepository::insert_bill_in(&mut *tx, &bill).await?;

        let mut bill_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let record = BillLine {
                id: Uuid::new_v4().to_string(),
                bill_id: bill.id.clone(),
                product_id: line.product_id,
                name_snapshot: line.name_snapshot,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                tax_rate_bps: line.tax_rate_bps,
                tax_cents: line.tax_cents,
                total_cents: line.total_cents,
                created_at: now,
            };
            BillRepository::insert_line_in(&mut *tx, &record).await?;
            bill_lines.push(record);
        }

        let mut change_entries: Vec<ChangeEntry> = Vec::with_capacity(change_lines.len());
        for change in &change_lines {
            let entry =
                BillRepository::insert_change_in(&mut *tx, &bill.id, change.value, change.count, now)
                    .await?;
            change_entries.push(entry);
        }

        tx.commit().await.map_err(DbError::from)?;

        Ok(BillReceipt {
            bill,
            lines: bill_lines,
            change: change_entries,
        })
    }
}

// =============================================================================
// Tender Checks
// =============================================================================

/// Rejects the tender as a batch when it contains values the drawer has no
/// row for. Every offending value is reported, each once, in tender order.
fn reject_unknown_denominations(
    request: &BillRequest,
    drawer: &[Denomination],
) -> BillingResult<()> {
    let mut unknown: Vec<i64> = Vec::new();
    for tender in &request.tender {
        let known = drawer.iter().any(|d| d.value == tender.value);
        if !known && !unknown.contains(&tender.value) {
            unknown.push(tender.value);
        }
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(BillingError::UnsupportedDenomination { values: unknown })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
