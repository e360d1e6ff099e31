//! # Domain Types
//!
//! Core domain types for Till POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐        │
//! │  │    Product      │   │      Bill       │   │  Denomination   │        │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │        │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  value (unique) │        │
//! │  │  product_id     │   │  customer_id    │   │  count (≥ 0)    │        │
//! │  │  available_stock│   │  total_cents    │   └─────────────────┘        │
//! │  │  unit_price     │   │  balance_cents  │                              │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  BillLine   — price/tax snapshot of one cart line                       │
//! │  ChangeEntry — one denomination row dispensed as change                 │
//! │  Customer   — upserted lazily by email on first bill                    │
//! │                                                                         │
//! │  BillRequest / BillReceipt — the createBill contract                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Persisted entities have:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business key: (`product_id`, `email`, denomination `value`) -
//!   human-meaningful, what requests reference

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18.00%. Percent rates with two fractional digits map exactly,
/// no float in sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Upper bound: 10000 bps = 100%.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier referenced by cart lines (e.g. "P1").
    pub product_id: String,

    /// Display name shown on the bill.
    pub name: String,

    /// Units currently in stock. Never negative.
    pub available_stock: i64,

    /// Unit price in cents.
    pub unit_price_cents: i64,

    /// Tax rate in basis points (1800 = 18%).
    pub tax_rate_bps: u32,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer, identified by email.
///
/// Created lazily on first bill if absent (idempotent upsert by email);
/// immutable thereafter except for its bill association.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Denomination
// =============================================================================

/// One cash denomination held by the drawer: its value in whole cash units
/// and the drawer's current supply of that unit.
///
/// Mutated only inside a bill transaction (or by explicit admin calls).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Denomination {
    /// Face value in whole cash units (e.g. 50). Positive, unique.
    pub value: i64,

    /// Available count. Never negative.
    pub count: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Bill
// =============================================================================

/// A committed bill. Created exactly once per transaction, immutable after
/// commit except `mail_sent`, which the notification dispatcher sets
/// asynchronously and which carries no financial meaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: String,
    pub customer_id: String,

    /// Sum of line totals, cent precision (pre-rounding).
    pub total_cents: i64,

    /// Amount actually due: `total` floored to a whole cash unit.
    pub rounded_total_cents: i64,

    /// Sum of line taxes, cent precision.
    pub tax_cents: i64,

    /// Declared payment = sum of tendered denominations.
    pub paid_cents: i64,

    /// paid − rounded_total. Always ≥ 0 and unit-aligned.
    pub balance_cents: i64,

    /// The fraction of `total` below one cash unit, dropped from the amount
    /// due. Surfaced so callers can audit what the business absorbed.
    pub dropped_remainder_cents: i64,

    /// Set by the notification dispatcher after delivery.
    pub mail_sent: bool,

    pub created_at: DateTime<Utc>,
}

impl Bill {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Bill Line
// =============================================================================

/// A line item on a bill.
/// Uses the snapshot pattern: price and tax rate are frozen at transaction
/// time, immune to later product edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillLine {
    pub id: String,
    pub bill_id: String,

    /// Business product id at time of sale (frozen).
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    /// Quantity sold.
    pub quantity: i64,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// Tax rate at time of sale (frozen).
    pub tax_rate_bps: u32,

    /// Computed line tax.
    pub tax_cents: i64,

    /// Computed line total (price + tax).
    pub total_cents: i64,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Change Entry
// =============================================================================

/// One denomination row actually dispensed as change for a bill.
///
/// The set of change entries for a bill sums exactly to that bill's
/// balance: Σ(value × count) == balance in whole units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChangeEntry {
    pub id: String,
    pub bill_id: String,

    /// Denomination face value in whole cash units.
    pub value: i64,

    /// Pieces of this denomination dispensed.
    pub count: i64,

    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Bill Request (the createBill contract)
// =============================================================================

/// One cart line in a bill request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRequestLine {
    /// Business product id (not the UUID).
    pub product_id: String,
    pub quantity: i64,
}

/// One denomination/count pair the customer physically hands over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TenderEntry {
    /// Face value in whole cash units.
    pub value: i64,
    /// Pieces handed over.
    pub count: i64,
}

impl TenderEntry {
    /// The cash amount of this entry, in cents.
    #[inline]
    pub fn amount_cents(&self) -> i64 {
        self.value * self.count * crate::money::CENTS_PER_UNIT
    }
}

/// The input to one bill transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillRequest {
    pub customer_email: String,
    pub lines: Vec<BillRequestLine>,
    pub tender: Vec<TenderEntry>,

    /// The payment amount the cashier declared, in cents. Must equal the
    /// tendered sum exactly.
    pub paid_cents: i64,
}

impl BillRequest {
    /// Sums the physical tender, in cents.
    pub fn tendered_sum_cents(&self) -> i64 {
        self.tender.iter().map(TenderEntry::amount_cents).sum()
    }
}

/// The output of a committed bill transaction: the bill record, its line
/// snapshots, and the change distribution handed back to the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillReceipt {
    pub bill: Bill,
    pub lines: Vec<BillLine>,
    pub change: Vec<ChangeEntry>,
}

// =============================================================================
// Unit Tests
// =============================================================================
