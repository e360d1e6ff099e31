//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                           │
//! │  ├── BillingError     - Why a bill transaction was aborted              │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  till-db errors (separate crate)                                        │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  Flow: ValidationError → BillingError ← DbError (mapped at the seam)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every variant carries the offending values (product id, amounts, ...);
//!    callers never get a bare "transaction failed" string
//! 3. Errors are enum variants, never String
//! 4. Each failure identifies which check rejected the bill

use thiserror::Error;

// =============================================================================
// Billing Error
// =============================================================================

/// Why a bill transaction was aborted.
///
/// Every variant except [`BillingError::ConcurrentConflict`] and
/// [`BillingError::Persistence`] is produced by the validation pipeline
/// before any mutation is applied. All variants are request-level: the
/// caller can fix the request (or simply retry, for `ConcurrentConflict`)
/// and submit again.
///
/// Notification delivery failure is deliberately NOT part of this taxonomy.
/// It occurs strictly after commit, is logged, and never reverses a
/// committed bill.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Tender includes denomination values the drawer does not know.
    ///
    /// The whole tender is refused as a batch: `values` lists EVERY
    /// offending value, not just the first one encountered.
    #[error("We do not accept denomination value(s): {values:?}")]
    UnsupportedDenomination { values: Vec<i64> },

    /// The sum of the tendered denominations does not equal the declared
    /// paid amount. Both figures are reported in cents.
    #[error(
        "Sum of tendered denominations ({tendered_cents}) does not match \
         declared paid amount ({declared_cents})"
    )]
    MismatchedPayment {
        declared_cents: i64,
        tendered_cents: i64,
    },

    /// A cart line references a product id that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A cart line requests more units than the product has in stock.
    ///
    /// Lines for the same product accumulate: two lines of 3 units each
    /// against a stock of 5 fail on the second line.
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// The declared payment does not cover the rounded total due.
    #[error("Insufficient payment: due {due_cents}, paid {paid_cents}")]
    InsufficientPayment { due_cents: i64, paid_cents: i64 },

    /// The drawer cannot produce exact change for the balance.
    ///
    /// `remainder` is the portion of the balance (in whole cash units) that
    /// no available denomination could satisfy. The transaction aborts
    /// rather than dispense inexact change.
    #[error("Cannot provide exact change with available denominations, remainder: {remainder}")]
    ChangeInfeasible { remainder: i64 },

    /// A guarded stock or drawer update lost a race with a concurrent bill,
    /// or a lock wait timed out at commit time.
    ///
    /// Recoverable: the caller should retry the whole transaction from
    /// validation. The losing transaction left no mutation behind.
    #[error("Concurrent mutation conflict, retry the transaction")]
    ConcurrentConflict,

    /// The durable-write step itself failed; the transaction was rolled
    /// back entirely.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Malformed input (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl BillingError {
    /// Whether the caller may retry the identical request and expect it to
    /// succeed without changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BillingError::ConcurrentConflict)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request doesn't meet shape requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate product id).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with BillingError.
pub type BillingResult<T> = Result<T, BillingError>;

// =============================================================================
// Unit Tests
// =============================================================================
