//! Exact currency handling.
//!
//! All monetary values in the app are whole numbers of centavos. Summing sale
//! amounts for the monthly report must not drift, so amounts are never stored
//! or accumulated as binary floating point.

use std::{fmt::Display, iter::Sum, ops::Add};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};

use crate::Error;

/// A non-negative amount of money in centavos (hundredths of a real).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Centavos(i64);

impl Centavos {
    /// Zero centavos.
    pub const ZERO: Centavos = Centavos(0);

    /// Create an amount from a raw number of centavos.
    pub fn new(centavos: i64) -> Self {
        Self(centavos)
    }

    /// The raw number of centavos.
    pub fn as_i64(self) -> i64 {
        self.0
    }

    /// Parse a user-entered amount string.
    ///
    /// Accepts both the Brazilian comma and the dot as the decimal separator,
    /// so "150,50" and "150.50" parse to the same value. At most two decimal
    /// places are allowed and the value must be non-negative.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if the string is not a valid amount.
    pub fn parse_brl(raw: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidAmount(raw.to_string());
        let normalized = raw.trim().replace(',', ".");

        let (whole, fraction) = match normalized.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (normalized.as_str(), None),
        };

        if whole.is_empty() || !whole.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(invalid());
        }

        let reais: i64 = whole.parse().map_err(|_| invalid())?;

        let centavos = match fraction {
            None => 0,
            Some(fraction)
                if fraction.is_empty()
                    || fraction.len() > 2
                    || !fraction.bytes().all(|byte| byte.is_ascii_digit()) =>
            {
                return Err(invalid());
            }
            // A single decimal digit is tenths, e.g. "150,5" is 150.50.
            Some(fraction) if fraction.len() == 1 => fraction.parse::<i64>().unwrap_or(0) * 10,
            Some(fraction) => fraction.parse::<i64>().map_err(|_| invalid())?,
        };

        reais
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(centavos))
            .map(Centavos)
            .ok_or_else(invalid)
    }
}

impl Add for Centavos {
    type Output = Centavos;

    fn add(self, rhs: Self) -> Self::Output {
        Centavos(self.0 + rhs.0)
    }
}

impl Sum for Centavos {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Centavos::ZERO, Add::add)
    }
}

impl Display for Centavos {
    /// Formats the amount in the Brazilian style, e.g. "R$ 1.234,56".
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reais = self.0 / 100;
        let centavos = self.0 % 100;

        let digits = reais.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

        for (position, digit) in digits.chars().enumerate() {
            if position > 0 && (digits.len() - position).is_multiple_of(3) {
                grouped.push('.');
            }
            grouped.push(digit);
        }

        write!(f, "R$ {grouped},{centavos:02}")
    }
}

impl ToSql for Centavos {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Centavos {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Centavos)
    }
}
