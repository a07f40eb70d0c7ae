//! # Money Module
//!
//! Provides the `Money` type for course prices, order totals and seller
//! balances.
//!
//! ## Representation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FIXED-POINT MONEY                                                      │
//! │                                                                         │
//! │    "10.99"  ──►  Money { integer: 10, fractional: 99 }                  │
//! │                                                                         │
//! │  • integer     whole units, never negative                              │
//! │  • fractional  always normalized into 0..=99                            │
//! │                                                                         │
//! │  Addition carries at most once:                                         │
//! │    10.99 + 0.05  →  integer 10, fractional 104  →  11.04                │
//! │                                                                         │
//! │  There is no subtraction: refunds are not modelled.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use course_core::money::Money;
//!
//! let price: Money = "10.99".parse().unwrap();
//! let total = price + Money::new(0, 5).unwrap();
//! assert_eq!(total.to_string(), "11.04");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Number of fractional units in one whole unit.
const FRACTION_BASE: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A non-negative fixed-point amount with two fractional digits.
///
/// ## Where Money is Used
/// ```text
/// CourseSnapshot.price ──► place_order running total ──► Order.total
///                      │
///                      └──► pay_order ──► seller Account.balance
/// ```
///
/// Serialized as the display string (`"10.99"`) so API payloads never carry
/// a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Money {
    integer: i64,
    fractional: i64,
}

impl Money {
    /// Creates a Money value from its whole and fractional parts.
    ///
    /// ## Errors
    /// - negative `integer`
    /// - `fractional` outside `0..=99`
    ///
    /// ## Example
    /// ```rust
    /// use course_core::money::Money;
    ///
    /// let price = Money::new(10, 99).unwrap();
    /// assert_eq!(price.integer(), 10);
    /// assert_eq!(price.fractional(), 99);
    ///
    /// assert!(Money::new(1, 100).is_err());
    /// ```
    pub fn new(integer: i64, fractional: i64) -> CoreResult<Self> {
        if integer < 0 {
            return Err(CoreError::InvalidMoney {
                reason: format!("integer part {} is negative", integer),
            });
        }

        if !(0..FRACTION_BASE).contains(&fractional) {
            return Err(CoreError::InvalidMoney {
                reason: format!("fractional part {} is outside 0..=99", fractional),
            });
        }

        Ok(Money {
            integer,
            fractional,
        })
    }

    /// Rebuilds a Money value from its two database columns.
    ///
    /// The columns are CHECK-constrained to the same ranges `new` enforces,
    /// so this normalizes instead of failing.
    pub fn from_stored(integer: i64, fractional: i64) -> Self {
        let carry = fractional.div_euclid(FRACTION_BASE);
        Money {
            integer: (integer + carry).max(0),
            fractional: fractional.rem_euclid(FRACTION_BASE),
        }
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money {
            integer: 0,
            fractional: 0,
        }
    }

    /// Whole units.
    #[inline]
    pub const fn integer(&self) -> i64 {
        self.integer
    }

    /// Fractional units, always in `0..=99`.
    #[inline]
    pub const fn fractional(&self) -> i64 {
        self.fractional
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.integer == 0 && self.fractional == 0
    }

    /// Adds two amounts, carrying once when the fractional sum reaches 100.
    ///
    /// Both inputs are normalized, so the fractional sum is at most 198 and a
    /// single carry always restores the invariant.
    ///
    /// ## Example
    /// ```rust
    /// use course_core::money::Money;
    ///
    /// let total = Money::new(10, 99).unwrap().add(Money::new(0, 5).unwrap());
    /// assert_eq!((total.integer(), total.fractional()), (11, 4));
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, other: Money) -> Money {
        let mut integer = self.integer + other.integer;
        let mut fractional = self.fractional + other.fractional;

        if fractional >= FRACTION_BASE {
            fractional -= FRACTION_BASE;
            integer += 1;
        }

        Money {
            integer,
            fractional,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Renders `"{integer}.{fractional:02}"`.
///
/// The fraction is always two digits: 5.05 renders as `"5.05"`, never `"5.5"`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.integer, self.fractional)
    }
}

/// Parses `"<digits>.<two digits>"`.
///
/// ## Rules
/// - exactly one `.`
/// - integer part: one or more ASCII digits
/// - fractional part: exactly two ASCII digits
impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidMoney {
            reason: format!("'{}' {}", s, reason),
        };

        let (integer, fractional) = s
            .split_once('.')
            .ok_or_else(|| invalid("must look like 12.34"))?;

        if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("has a non-numeric integer part"));
        }

        if fractional.len() != 2 || !fractional.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("must have exactly two fractional digits"));
        }

        let integer: i64 = integer
            .parse()
            .map_err(|_| invalid("has an integer part that is too large"))?;
        let fractional: i64 = fractional
            .parse()
            .map_err(|_| invalid("has a non-numeric fractional part"))?;

        Money::new(integer, fractional)
    }
}

impl From<Money> for String {
    fn from(money: Money) -> Self {
        money.to_string()
    }
}

impl TryFrom<String> for Money {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
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
        Money::add(self, other)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = Money::add(*self, other);
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Money::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
