//! # Money Module
//!
//! Provides the `Money` type for sale totals, cash tendered and change.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Line subtotals are fractional (0.02 paquete × $95.00) so they stay    │
//! │  f64 until the sale total is computed. From that point on everything   │
//! │  is integer cents:                                                      │
//! │                                                                         │
//! │    Σ subtotals (f64) ──► cents (i64) ──► cash step (50¢) ──► Money     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## On Disk
//! The JSON files store amounts as plain decimal numbers (`"total": 7.0`),
//! so `Money` serializes through `f64` and rounds back to cents on load.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Smallest coin the shop hands out as change: 50 centavos.
pub const CASH_STEP_CENTS: i64 = 50;

/// Rounds an f64 amount to 2 decimals, half away from zero.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product.price ──► Cart line ──► Σ subtotals ──► cash_round            │
/// │                                                      │                  │
/// │                                                      ▼                  │
/// │                                      Sale.total / cash_tendered /      │
/// │                                      change ──► receipt footer         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use papeleria_core::money::Money;
    ///
    /// let price = Money::from_cents(9550);
    /// assert_eq!(price.to_decimal(), 95.5);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a decimal amount, rounding half away
    /// from zero to the nearest cent.
    ///
    /// ## Example
    /// ```rust
    /// use papeleria_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(12.346).cents(), 1235);
    /// assert_eq!(Money::from_decimal(-0.5).cents(), -50);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * 100.0).round() as i64)
    }

    /// Rounds a raw (unrounded) sale total to what the customer is charged.
    ///
    /// ## Rules
    /// ```text
    /// raw ≤ 0                      ──► 0
    /// raw > 0                      ──► nearest multiple of `step_cents`
    ///                                  (ties round up)
    /// raw > 0 but rounds below step ──► step_cents
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use papeleria_core::money::{Money, CASH_STEP_CENTS};
    ///
    /// assert_eq!(Money::cash_round(7.10, CASH_STEP_CENTS).cents(), 700);
    /// assert_eq!(Money::cash_round(7.25, CASH_STEP_CENTS).cents(), 750);
    /// assert_eq!(Money::cash_round(0.20, CASH_STEP_CENTS).cents(), 50);
    /// assert_eq!(Money::cash_round(0.0, CASH_STEP_CENTS).cents(), 0);
    /// ```
    pub fn cash_round(raw: f64, step_cents: i64) -> Money {
        if !(raw > 0.0) || step_cents <= 0 {
            return Money::zero();
        }
        // rounded from the raw value, not from whole cents
        let steps = (raw * 100.0 / step_cents as f64).round() as i64;
        Money(steps.saturating_mul(step_cents).max(step_cents))
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the amount as a decimal number (for JSON and f64 math).
    #[inline]
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    #[inline]
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Formats with thousands separators and two decimals, no symbol.
    ///
    /// ## Example
    /// ```rust
    /// use papeleria_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(123456789).grouped(), "1,234,567.89");
    /// assert_eq!(Money::from_cents(-5050).grouped(), "-50.50");
    /// ```
    pub fn grouped(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = (abs / 100).to_string();
        let frac = abs % 100;

        let mut out = String::with_capacity(whole.len() + whole.len() / 3 + 4);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        format!("{}{}.{:02}", sign, out, frac)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-${}", Money(-self.0).grouped())
        } else {
            write!(f, "${}", self.grouped())
        }
    }
}

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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Ok(Money::from_decimal(amount))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
