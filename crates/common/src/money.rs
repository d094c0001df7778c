//! Monetary amounts.

use serde::{Deserialize, Serialize};

/// Money amount represented in cents to avoid floating point drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Converts a decimal amount (e.g. `50.25`) into cents, rounding to the
    /// nearest cent.
    ///
    /// Returns `None` for negative, NaN, infinite, or out-of-range values.
    pub fn try_from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents > i64::MAX as f64 {
            return None;
        }
        Some(Self {
            cents: cents as i64,
        })
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.cents.checked_add(rhs.cents).map(Self::from_cents)
    }

    /// Subtracts `rhs`, returning `None` on overflow.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.cents.checked_sub(rhs.cents).map(Self::from_cents)
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents - rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.cents -= rhs.cents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_decimal_rounds_to_cents() {
        assert_eq!(Money::try_from_decimal(50.0), Some(Money::from_cents(5000)));
        assert_eq!(Money::try_from_decimal(19.99), Some(Money::from_cents(1999)));
        assert_eq!(Money::try_from_decimal(0.0), Some(Money::zero()));
    }

    #[test]
    fn test_try_from_decimal_rejects_invalid() {
        assert_eq!(Money::try_from_decimal(-1.0), None);
        assert_eq!(Money::try_from_decimal(f64::NAN), None);
        assert_eq!(Money::try_from_decimal(f64::INFINITY), None);
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(1500).checked_add(Money::from_cents(500)),
            Some(Money::from_cents(2000))
        );
        assert_eq!(
            Money::from_cents(1500).checked_sub(Money::from_cents(500)),
            Some(Money::from_cents(1000))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(5000).to_string(), "$50.00");
        assert_eq!(Money::from_cents(1999).to_string(), "$19.99");
        assert_eq!(Money::from_cents(-250).to_string(), "-$2.50");
    }

    #[test]
    fn test_arithmetic() {
        let mut total = Money::zero();
        total += Money::from_cents(1500);
        total += Money::from_cents(500);
        assert_eq!(total, Money::from_cents(2000));
        total -= Money::from_cents(2000);
        assert_eq!(total, Money::zero());
        assert_eq!(
            Money::from_cents(300) - Money::from_cents(100) + Money::from_cents(1),
            Money::from_cents(201)
        );
    }
}
