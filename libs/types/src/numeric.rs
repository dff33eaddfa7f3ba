//! Fixed-point decimal types for prices and quantities
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Every computed amount and average price is truncated toward zero, so the
//! resting maker is never credited with more than its funds cover.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Truncate a non-negative value to `dp` decimal places
pub fn floor_dp(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// Price in quote asset per unit of base asset
///
/// Zero only for market orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Self {
        assert!(!value.is_sign_negative(), "price must not be negative");
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = rust_decimal::Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.is_sign_negative() {
            return Err(rust_decimal::Error::ErrorString(format!("negative price: {}", value)));
        }
        Ok(Self(value))
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Decimal {
        price.0
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(Decimal::from_str_exact(s)?)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Non-negative amount of an asset
///
/// Used both for base-asset amounts and for quote-asset funds. Negative
/// values are rejected on every way in, including deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    /// Returns None for negative values
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Value of this amount at `price`, exact
    pub fn times(&self, price: Price) -> Quantity {
        Self(self.0 * price.as_decimal())
    }

    /// Amount these funds buy at `price`, truncated to `dp` places
    pub fn buys_at(&self, price: Price, dp: u32) -> Quantity {
        if price.is_zero() {
            return Quantity::zero();
        }
        Self(floor_dp(self.0 / price.as_decimal(), dp))
    }

    pub fn min(self, other: Quantity) -> Quantity {
        if self <= other {
            self
        } else {
            other
        }
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    /// # Panics
    /// Panics if the result would be negative
    fn sub(self, rhs: Quantity) -> Quantity {
        assert!(self.0 >= rhs.0, "quantity underflow: {} - {}", self.0, rhs.0);
        Quantity(self.0 - rhs.0)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = rust_decimal::Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
            .ok_or_else(|| rust_decimal::Error::ErrorString(format!("negative quantity: {}", value)))
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Decimal {
        quantity.0
    }
}

impl FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(Decimal::from_str_exact(s)?)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Decimal precision of one market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Precision {
    /// Decimal places of prices
    pub price: u32,
    /// Decimal places of base-asset amounts
    pub amount: u32,
}

impl Precision {
    pub fn new(price: u32, amount: u32) -> Self {
        Self { price, amount }
    }

    /// Decimal places of quote-asset funds (amount × price is exact)
    pub fn funds(&self) -> u32 {
        self.price + self.amount
    }

    pub fn floor_price(&self, value: Decimal) -> Price {
        Price(floor_dp(value, self.price))
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self { price: 8, amount: 4 }
    }
}
