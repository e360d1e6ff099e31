//! # till-core: Pure Business Logic for Till POS
//!
//! This crate is the **heart** of Till POS. It contains all billing logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 Caller (routing layer, CLI, ...)                │    │
//! │  │        createBill(email, cart, tender, paid) → receipt          │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    till-db (Transaction Layer)                  │    │
//! │  │     repositories, billing orchestrator, SQLite, notifications   │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                ★ till-core (THIS CRATE) ★                       │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐   │    │
//! │  │   │   types   │  │   money   │  │  change   │  │ validation│   │    │
//! │  │   │  Product  │  │   Money   │  │  solver   │  │   rules   │   │    │
//! │  │   │   Bill    │  │  pricing  │  │  (greedy) │  │   checks  │   │    │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘   │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Bill, Denomination, ...)
//! - [`money`] - Money type (integer cents), line pricing, bill totals
//! - [`change`] - Greedy change-making against a drawer snapshot
//! - [`error`] - The billing error taxonomy
//! - [`validation`] - Request shape validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input =
//!    same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are cents (i64), tax rates are
//!    basis points; binary floating point never touches money
//! 4. **Explicit Errors**: all failures are typed and carry the offending
//!    values, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::money::{price_line, Money};
//! use till_core::types::TaxRate;
//!
//! // 100.00 × 2 at 18% tax
//! let line = price_line(Money::from_cents(10000), 2, TaxRate::from_bps(1800)).unwrap();
//! assert_eq!(line.total.cents(), 23600); // 236.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod change;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use change::{make_change, ChangeLine, DrawerLevel};
pub use error::{BillingError, BillingResult, ValidationError};
pub use money::{price_line, BillTotals, Money, PricedLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum cart lines allowed on a single bill.
///
/// ## Business Reason
/// Prevents runaway carts and keeps a single transaction's lock window
/// bounded.
pub const MAX_BILL_LINES: usize = 100;

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum accepted denomination face value, in whole cash units.
///
/// ## Business Reason
/// Admin-entered values; a typo like 5000000 would dwarf every real bill
/// and make tender sums overflow-prone.
pub const MAX_DENOMINATION_VALUE: i64 = 100_000;

/// Maximum pieces of one denomination in a single tender entry.
///
/// ## Business Reason
/// Nobody hands over ten thousand coins at a till. Together with
/// [`MAX_DENOMINATION_VALUE`] and [`MAX_TENDER_ENTRIES`] this bounds the
/// tender sum well inside i64, so summing it is plain arithmetic.
pub const MAX_TENDER_COUNT: i64 = 10_000;

/// Maximum distinct entries in a single tender.
pub const MAX_TENDER_ENTRIES: usize = 100;
