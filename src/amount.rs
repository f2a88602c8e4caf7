//! Exact, positive money amounts with two decimal places.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The number of fractional digits kept for every amount.
pub const AMOUNT_SCALE: u32 = 2;

/// The largest amount that can be stored, in cents.
pub const MAX_AMOUNT_CENTS: i64 = i64::MAX;

/// A strictly positive amount of money, rounded to cents.
///
/// Whether the money was earned or spent is recorded separately by
/// [crate::transaction::TransactionType], so an amount is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Round `value` to cents and check that it is greater than zero.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if the rounded value is zero or negative,
    /// and [Error::AmountTooLarge] if it is more than [MAX_AMOUNT_CENTS] cents.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let rounded =
            value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);

        if rounded <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }

        if rounded > Decimal::new(MAX_AMOUNT_CENTS, AMOUNT_SCALE) {
            return Err(Error::AmountTooLarge);
        }

        Ok(Self(rounded))
    }

    /// Create an amount from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `cents` is zero or negative.
    pub fn from_cents(cents: i64) -> Result<Self, Error> {
        Self::new(Decimal::new(cents, AMOUNT_SCALE))
    }

    /// The amount as an exact decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The amount as a whole number of cents.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountTooLarge] if the cents do not fit in an `i64`, which
    /// [Amount::new] already rules out.
    pub fn cents(&self) -> Result<i64, Error> {
        let mut value = self.0;
        value.rescale(AMOUNT_SCALE);

        i64::try_from(value.mantissa()).map_err(|_| Error::AmountTooLarge)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = Error;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim()).map_err(|_| Error::InvalidAmount)?;

        Self::new(value)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut value = self.0;
        value.rescale(AMOUNT_SCALE);
        value.fmt(f)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let cents = self
            .cents()
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;

        Ok(ToSqlOutput::from(cents))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let cents = value.as_i64()?;

        Amount::from_cents(cents).map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

#[cfg(test)]
mod amount_tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use crate::{
        Error,
        amount::{Amount, MAX_AMOUNT_CENTS},
    };

    #[test]
    fn new_fails_on_zero() {
        assert_eq!(Amount::new(Decimal::ZERO), Err(Error::InvalidAmount));
    }

    #[test]
    fn new_fails_on_negative() {
        assert_eq!(Amount::new(Decimal::new(-500, 2)), Err(Error::InvalidAmount));
    }

    #[test]
    fn new_fails_when_value_rounds_to_zero() {
        assert_eq!(Amount::new(Decimal::new(4, 3)), Err(Error::InvalidAmount));
    }

    #[test]
    fn new_rounds_to_cents() {
        let amount = Amount::new(Decimal::new(12345, 3)).unwrap();

        assert_eq!(amount.value(), Decimal::new(1235, 2));
    }

    #[test]
    fn parses_exact_decimal() {
        let amount = Amount::from_str("12.34").unwrap();

        assert_eq!(amount.value(), Decimal::new(1234, 2));
        assert_eq!(amount.cents(), Ok(1234));
    }

    #[test]
    fn parse_fails_on_garbage() {
        assert_eq!(Amount::from_str("twelve"), Err(Error::InvalidAmount));
    }

    #[test]
    fn cents_of_whole_number() {
        let amount = Amount::new(Decimal::from(1000)).unwrap();

        assert_eq!(amount.cents(), Ok(100_000));
        assert_eq!(amount.to_string(), "1000.00");
    }

    #[test]
    fn from_cents_keeps_precision() {
        let amount = Amount::from_cents(1).unwrap();

        assert_eq!(amount.value(), Decimal::new(1, 2));
        assert_eq!(amount.to_string(), "0.01");
    }

    #[test]
    fn new_fails_when_cents_overflow() {
        let too_big = Decimal::from_str("100000000000000000000").unwrap();
        let one_cent_over = Decimal::new(i64::MAX, 2) + Decimal::new(1, 2);

        assert_eq!(Amount::new(too_big), Err(Error::AmountTooLarge));
        assert_eq!(Amount::new(one_cent_over), Err(Error::AmountTooLarge));
        assert_eq!(
            Amount::from_str("92233720368547758.08"),
            Err(Error::AmountTooLarge)
        );
    }

    #[test]
    fn largest_amount_keeps_every_cent() {
        let amount = Amount::from_cents(MAX_AMOUNT_CENTS).unwrap();

        assert_eq!(amount.cents(), Ok(i64::MAX));
        assert_eq!(amount.to_string(), "92233720368547758.07");
    }
}
