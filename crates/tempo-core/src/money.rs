//! # Money Module
//!
//! Provides the `BaseMoney` and `LocalMoney` types for handling monetary
//! values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of the smallest currency unit.          │
//! │    Rounding happens exactly once per operation, half-up, in i128.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why TWO Money Types?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE CURRENCY DIRECTION PROBLEM                                         │
//! │                                                                         │
//! │  Every amount in the order store is in the BASE currency (MXN).        │
//! │  Shipping tariffs and free-shipping thresholds are in LOCAL currency.  │
//! │                                                                         │
//! │  With a single money type it is one `*` away from comparing a base     │
//! │  subtotal against a local threshold and waiving shipping at the wrong  │
//! │  amount. With two types that bug does not compile:                     │
//! │                                                                         │
//! │    BaseMoney  ──Currency::to_local()──►  LocalMoney                    │
//! │    LocalMoney ──Currency::to_base()───►  BaseMoney                     │
//! │                                                                         │
//! │  The conversion methods on `Currency` are the ONLY crossing points.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// BaseMoney
// =============================================================================

/// A monetary value in cents of the base currency (MXN centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for discounts and refunds
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Arithmetic lives here**: tax, discounts, and totals are always
///   computed in base currency; `LocalMoney` deliberately has no `Add`
///
/// All persisted amounts are `BaseMoney`. Conversion to a display currency
/// happens at render/compute time, never before storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BaseMoney(i64);

impl BaseMoney {
    /// Creates a value from cents of the base currency.
    ///
    /// ## Example
    /// ```rust
    /// use tempo_core::money::BaseMoney;
    ///
    /// let price = BaseMoney::from_cents(109_900); // $1,099.00 MXN
    /// assert_eq!(price.cents(), 109_900);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        BaseMoney(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero amount.
    #[inline]
    pub const fn zero() -> Self {
        BaseMoney(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the larger of two amounts.
    #[inline]
    pub fn max(self, other: Self) -> Self {
        BaseMoney(self.0.max(other.0))
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        BaseMoney(self.0.min(other.0))
    }

    /// Applies a tax rate, rounding half-up.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000` in i128 to prevent
    /// overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use tempo_core::money::BaseMoney;
    /// use tempo_core::types::TaxRate;
    ///
    /// let subtotal = BaseMoney::from_cents(100_000); // $1,000.00
    /// let rate = TaxRate::from_bps(1600);            // IVA 16%
    ///
    /// assert_eq!(subtotal.calculate_tax(rate).cents(), 16_000);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> BaseMoney {
        let tax_cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        BaseMoney::from_cents(tax_cents as i64)
    }

    /// Computes a percentage of this amount, in basis points (1000 = 10%).
    ///
    /// Used for percentage coupons: the returned value is the discount
    /// amount, NOT the discounted total.
    ///
    /// ## Example
    /// ```rust
    /// use tempo_core::money::BaseMoney;
    ///
    /// let subtotal = BaseMoney::from_cents(100_000); // $1,000.00
    /// assert_eq!(subtotal.percentage(1000).cents(), 10_000); // 10% off
    /// ```
    pub fn percentage(&self, bps: u32) -> BaseMoney {
        let amount = (self.0 as i128 * bps as i128 + 5000) / 10000;
        BaseMoney::from_cents(amount as i64)
    }

    /// Multiplies by a quantity (line totals).
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        BaseMoney(self.0 * qty)
    }
}

/// Display implementation shows money in a human-readable format.
///
/// This is for debugging and logs. User-facing rendering goes through
/// [`crate::currency::Currency`] for the correct symbol and conversion.
impl fmt::Display for BaseMoney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Add for BaseMoney {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        BaseMoney(self.0 + other.0)
    }
}

impl AddAssign for BaseMoney {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for BaseMoney {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        BaseMoney(self.0 - other.0)
    }
}

impl SubAssign for BaseMoney {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for BaseMoney {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        BaseMoney(self.0 * qty)
    }
}

// =============================================================================
// LocalMoney
// =============================================================================

/// A monetary value in cents of a country's LOCAL currency.
///
/// Deliberately inert: it can be compared and subtracted (free-shipping
/// threshold math) but has no general arithmetic and is never persisted.
/// The only producers are the country configuration table and
/// [`crate::currency::Currency::to_local`]; the only consumer that turns it
/// back into stored money is [`crate::currency::Currency::to_base`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LocalMoney(i64);

impl LocalMoney {
    /// Creates a value from cents of the local currency.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        LocalMoney(cents)
    }

    /// Creates a value from whole local currency units (pesos, dollars, ...).
    ///
    /// The shipping tariff table is written in major units, so the config
    /// constants use this.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        LocalMoney(major * 100)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero amount.
    #[inline]
    pub const fn zero() -> Self {
        LocalMoney(0)
    }

    /// Difference clamped at zero, for "spend X more for free shipping".
    #[inline]
    pub fn saturating_sub(self, other: Self) -> Self {
        LocalMoney((self.0 - other.0).max(0))
    }
}

impl fmt::Display for LocalMoney {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
