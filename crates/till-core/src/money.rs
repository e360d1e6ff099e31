//! # Money Module
//!
//! The `Money` type and the line pricing calculator.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Money rounding must be reproducible: the same cart priced twice must   │
//! │  produce the same tax to the cent, every time, on every machine.        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    100.00 is stored as 10000 cents (i64)                                │
//! │    Tax is computed with integer basis-point math, one rounding rule     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding Rule
//! Tax rounds half-up to the cent: `(cents × bps + 5000) / 10000`.
//! This is the single rounding rule for the whole system; it is applied once
//! per line, never to intermediate values.
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(10000); // 100.00
//!
//! // NEVER from a float:
//! // let bad = Money::from_float(100.0); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::error::{BillingResult, ValidationError};
use crate::types::TaxRate;

/// Cents per whole cash unit. Denomination values are whole units; all
/// monetary amounts are cents.
pub const CENTS_PER_UNIT: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate differences (paid − due) may be negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole cash units (e.g. `from_units(236)`
    /// is 236.00).
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units * CENTS_PER_UNIT)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Floors to the nearest whole cash unit below.
    ///
    /// Cash drawers hold whole units only: a 236.49 total is collectable
    /// only as 236. The discarded 49 cents are reported separately by
    /// [`BillTotals::rounded_total`], never silently lost.
    ///
    /// Negative amounts never reach this function in practice; for
    /// completeness it floors toward negative infinity.
    #[inline]
    pub const fn floor_to_unit(&self) -> Self {
        Money(self.0.div_euclid(CENTS_PER_UNIT) * CENTS_PER_UNIT)
    }

    /// The value in whole cash units, assuming the value is unit-aligned.
    #[inline]
    pub const fn whole_units(&self) -> i64 {
        self.0 / CENTS_PER_UNIT
    }

    /// Calculates tax for this amount.
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(amount × bps + 5000) / 10000`.
    /// i128 intermediates prevent overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::types::TaxRate;
    ///
    /// let price = Money::from_cents(20000);    // 200.00
    /// let rate = TaxRate::from_bps(1800);      // 18%
    /// assert_eq!(price.calculate_tax(rate).cents(), 3600); // 36.00
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(tax_cents as i64)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
/// For debugging and log output, not locale-aware display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02}",
            sign,
            (self.0 / CENTS_PER_UNIT).abs(),
            (self.0 % CENTS_PER_UNIT).abs()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Line Pricing
// =============================================================================

/// The priced amounts for one cart line.
///
/// Produced by [`price_line`]; all three figures are frozen onto the bill
/// line at transaction time, immune to later product edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    /// unit_price × quantity (exact, no rounding involved).
    pub price: Money,
    /// price × tax rate, rounded half-up to the cent.
    pub tax: Money,
    /// price + tax.
    pub total: Money,
}

/// Prices one cart line: `unit_price × quantity`, plus tax.
///
/// Pure and side-effect-free. Fails only on malformed input:
/// - negative unit price
/// - non-positive quantity
/// - tax rate above 100%
///
/// ## Example
/// ```rust
/// use till_core::money::{price_line, Money};
/// use till_core::types::TaxRate;
///
/// let line = price_line(Money::from_cents(10000), 2, TaxRate::from_bps(1800)).unwrap();
/// assert_eq!(line.price.cents(), 20000); // 200.00
/// assert_eq!(line.tax.cents(), 3600);    // 36.00
/// assert_eq!(line.total.cents(), 23600); // 236.00
/// ```
pub fn price_line(unit_price: Money, quantity: i64, tax_rate: TaxRate) -> BillingResult<PricedLine> {
    if unit_price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "unit_price".to_string(),
            min: 0,
            max: i64::MAX,
        }
        .into());
    }

    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    if tax_rate.bps() > TaxRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: TaxRate::MAX_BPS as i64,
        }
        .into());
    }

    let price = unit_price.multiply_quantity(quantity);
    let tax = price.calculate_tax(tax_rate);

    Ok(PricedLine {
        price,
        tax,
        total: price + tax,
    })
}

// =============================================================================
// Bill Totals
// =============================================================================

/// Running totals over a bill's priced lines.
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Line 1: 200.00 + 36.00 tax = 236.00   ──┐                              │
/// │  Line 2:  10.50 +  0.53 tax =  11.03   ──┼──► total 247.03, tax 36.53   │
/// │                                          │                              │
/// │  rounded_total() → (247.00 due, 0.03 dropped remainder)                 │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// `total` always equals the sum of line totals and `tax` the sum of line
/// taxes; both retain cent precision. Whole-unit flooring applies only to
/// the amount due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillTotals {
    /// Sum of line totals (price + tax), pre-rounding.
    pub total: Money,
    /// Sum of line taxes.
    pub tax: Money,
}

impl BillTotals {
    /// Adds one priced line into the totals.
    pub fn add_line(&mut self, line: &PricedLine) {
        self.total += line.total;
        self.tax += line.tax;
    }

    /// The amount actually due in whole cash units, and the fractional
    /// remainder dropped from it.
    ///
    /// The remainder is absorbed by the business (there is no sub-unit cash
    /// instrument to collect it) but surfaced here so callers can audit it.
    /// It is dropped from the amount due ONLY: `total` and `tax` keep their
    /// cent precision on the committed bill.
    pub fn rounded_total(&self) -> (Money, Money) {
        let rounded = self.total.floor_to_unit();
        (rounded, self.total - rounded)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
