//! Monetary amounts in minor units.
//!
//! Balances and prices are stored as whole cents so comparisons such as the
//! confirm-step balance gate are exact.

use std::fmt;

use serde::{Deserialize, Serialize};

const CENTS_PER_UNIT: u64 = 100;
const BASIS_POINTS_PER_UNIT: u64 = 10_000;

/// A non-negative amount of money in cents.
///
/// # Examples
/// ```
/// use storefront::domain::Money;
///
/// let price = Money::from_cents(250);
/// assert_eq!(price.to_string(), "2.50");
/// assert!(Money::from_units(1) < price);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from cents.
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole currency units.
    pub const fn from_units(units: u64) -> Self {
        Self(units.saturating_mul(CENTS_PER_UNIT))
    }

    /// Returns the amount in cents.
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Returns `true` when the amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts, returning `None` on overflow.
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Subtracts `other`, returning `None` when the result would be negative.
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Multiplies by a unit count, returning `None` on overflow.
    pub const fn checked_mul(self, count: u32) -> Option<Self> {
        match self.0.checked_mul(count as u64) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Returns the given share in basis points, rounded down to the cent.
    pub const fn basis_points(self, points: u32) -> Self {
        Self(self.0.saturating_mul(points as u64) / BASIS_POINTS_PER_UNIT)
    }

    /// Drops the fractional cents, keeping whole currency units.
    pub const fn floor_to_units(self) -> Self {
        Self(self.0 / CENTS_PER_UNIT * CENTS_PER_UNIT)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / CENTS_PER_UNIT,
            self.0 % CENTS_PER_UNIT
        )
    }
}
