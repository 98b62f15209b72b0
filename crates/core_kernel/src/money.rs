//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currency codes following ISO 4217
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// West African CFA franc (Orange Money, MTN, Moov, Wave)
    XOF,
    /// Central African CFA franc
    XAF,
    EUR,
    USD,
    GBP,
}

impl Currency {
    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        match self {
            Currency::XOF | Currency::XAF => 0,
            _ => 2,
        }
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::XOF | Currency::XAF => "FCFA",
            Currency::EUR => "€",
            Currency::USD => "$",
            Currency::GBP => "£",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::XOF => "XOF",
            Currency::XAF => "XAF",
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::GBP => "GBP",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "XOF" => Ok(Currency::XOF),
            "XAF" => Ok(Currency::XAF),
            "EUR" => Ok(Currency::EUR),
            "USD" => Ok(Currency::USD),
            "GBP" => Ok(Currency::GBP),
            other => Err(MoneyError::UnknownCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// A monetary amount with associated currency
///
/// Amounts are stored with 4 decimal places internally; presentation rounds
/// to the currency's minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates Money from an amount the currency can actually settle
    ///
    /// Fails when the amount is finer than the currency's minor unit, e.g.
    /// `0.5` XOF or `10.005` EUR, instead of rounding it away.
    pub fn exact(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if amount.normalize().scale() > currency.decimal_places() {
            return Err(MoneyError::InvalidAmount(format!(
                "{} has more decimal places than {} allows ({})",
                amount,
                currency,
                currency.decimal_places()
            )));
        }
        Ok(Self::new(amount, currency))
    }

    /// Creates Money from an integer amount in minor units (e.g., cents)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        let divisor = Decimal::new(10_i64.pow(currency.decimal_places()), 0);
        Self::new(Decimal::new(minor_units, 0) / divisor, currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Clamps negative amounts to zero
    pub fn floor_at_zero(&self) -> Self {
        if self.is_negative() {
            Self::zero(self.currency)
        } else {
            *self
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{:.dp$} {}",
            self.amount,
            self.currency.symbol(),
            dp = dp as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(40000), Currency::XOF);
        assert_eq!(m.amount(), dec!(40000));
        assert_eq!(m.currency(), Currency::XOF);
    }

    #[test]
    fn test_from_minor_has_no_subunits_for_cfa() {
        let m = Money::from_minor(25000, Currency::XOF);
        assert_eq!(m.amount(), dec!(25000));
    }

    #[test]
    fn test_floor_at_zero() {
        let m = Money::new(dec!(-10), Currency::XOF);
        assert!(m.floor_at_zero().is_zero());

        let p = Money::new(dec!(10), Currency::XOF);
        assert_eq!(p.floor_at_zero(), p);
    }

    #[test]
    fn test_currency_mismatch() {
        let xof = Money::new(dec!(100), Currency::XOF);
        let eur = Money::new(dec!(100), Currency::EUR);

        assert!(matches!(xof.checked_add(&eur), Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_exact_rejects_sub_unit_amounts() {
        assert!(Money::exact(dec!(40000), Currency::XOF).is_ok());
        assert!(Money::exact(dec!(40000.00), Currency::XOF).is_ok());
        assert!(matches!(
            Money::exact(dec!(0.5), Currency::XOF),
            Err(MoneyError::InvalidAmount(_))
        ));

        assert_eq!(Money::exact(dec!(12.50), Currency::EUR).unwrap().amount(), dec!(12.50));
        assert!(Money::exact(dec!(0.00004), Currency::EUR).is_err());
        assert!(Money::exact(dec!(10.005), Currency::EUR).is_err());
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("xof".parse::<Currency>().unwrap(), Currency::XOF);
        assert!(matches!("ABC".parse::<Currency>(), Err(MoneyError::UnknownCurrency(_))));
    }

    #[test]
    fn test_display_uses_currency_precision() {
        assert_eq!(Money::new(dec!(1500), Currency::XOF).to_string(), "1500 FCFA");
        assert_eq!(Money::new(dec!(12.5), Currency::EUR).to_string(), "12.50 €");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_arithmetic_is_associative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::from_minor(a, Currency::XOF);
            let mb = Money::from_minor(b, Currency::XOF);
            let mc = Money::from_minor(c, Currency::XOF);

            let left = ma.checked_add(&mb).unwrap().checked_add(&mc).unwrap();
            let right = ma.checked_add(&mb.checked_add(&mc).unwrap()).unwrap();
            prop_assert_eq!(left, right);
        }

        #[test]
        fn exact_accepts_every_minor_unit_amount(minor in 1i64..1_000_000_000i64) {
            let eur = Money::from_minor(minor, Currency::EUR);
            prop_assert_eq!(Money::exact(eur.amount(), Currency::EUR).unwrap(), eur);
        }

        #[test]
        fn floor_at_zero_is_never_negative(a in -1_000_000i64..1_000_000i64) {
            let m = Money::from_minor(a, Currency::EUR).floor_at_zero();
            prop_assert!(!m.is_negative());
        }
    }
}
