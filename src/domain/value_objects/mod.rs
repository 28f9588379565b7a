//! Value Objects

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Money value object. Amounts stay unrounded through intermediate
/// arithmetic; `rounded` is applied once at a computation boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn myr(amount: Decimal) -> Self { Self::new(amount, "MYR") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn is_zero(&self) -> bool { self.amount.is_zero() }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }

    /// Scale by an arbitrary decimal factor (e.g. a zone multiplier).
    pub fn scale(&self, factor: Decimal) -> Money { Money::new(self.amount * factor, &self.currency) }

    /// Round to 2 decimal places, midpoint away from zero (retail rounding).
    pub fn rounded(&self) -> Money {
        Money::new(
            self.amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            &self.currency,
        )
    }
}

impl Default for Money { fn default() -> Self { Self::zero("MYR") } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {:.2}", self.currency, self.amount) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_add() {
        let a = Money::myr(Decimal::new(10000, 2));
        let b = Money::myr(Decimal::new(5050, 2));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(15050, 2));
    }

    #[test]
    fn test_currency_mismatch() {
        let a = Money::myr(Decimal::ONE);
        let b = Money::new(Decimal::ONE, "SGD");
        assert_eq!(a.add(&b), Err(MoneyError::CurrencyMismatch));
    }

    #[test]
    fn test_scale_and_round() {
        // RM 8.00 * 1.875 = RM 15.00
        let base = Money::myr(Decimal::new(800, 2));
        assert_eq!(base.scale(Decimal::new(1875, 3)).rounded().amount(), Decimal::new(1500, 2));
        // midpoint rounds away from zero: 1.005 -> 1.01
        let m = Money::myr(Decimal::new(1005, 3));
        assert_eq!(m.rounded().amount(), Decimal::new(101, 2));
    }
}
