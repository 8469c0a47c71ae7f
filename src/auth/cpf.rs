//! CPF handling.
//!
//! The CPF is the natural-person tax number used as the login identifier.
//! Users may type it with or without the usual mask ("123.456.789-01"), so
//! the mask is stripped before validation and storage. Only the digit count
//! is checked; check-digit verification is not performed.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};

use crate::Error;

/// A CPF that has been stripped of its mask and validated to be 11 digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpf(String);

impl Cpf {
    /// Parse a user-entered CPF, tolerating the common mask characters.
    ///
    /// # Errors
    /// Returns [Error::InvalidCpf] if the input is not exactly 11 digits
    /// after stripping dots, dashes, and whitespace.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let digits: String = raw
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | ' '))
            .collect();

        if digits.len() != 11 || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(Error::InvalidCpf(raw.to_string()));
        }

        Ok(Self(digits))
    }

    /// Create a `Cpf` without any validation.
    ///
    /// The caller should ensure that `digits` is a valid 11-digit CPF, e.g.
    /// a value previously stored in the database.
    pub fn new_unchecked(digits: &str) -> Self {
        Self(digits.to_string())
    }

    /// The bare 11 digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The CPF with the standard mask, e.g. "123.456.789-01".
    ///
    /// A value that is not exactly 11 bytes, e.g. a malformed row written by
    /// another tool, is returned unmasked rather than panicking on the slice.
    pub fn formatted(&self) -> String {
        if self.0.len() != 11 {
            return self.0.clone();
        }

        format!(
            "{}.{}.{}-{}",
            &self.0[0..3],
            &self.0[3..6],
            &self.0[6..9],
            &self.0[9..11]
        )
    }
}

impl Display for Cpf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl ToSql for Cpf {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Cpf {
    // Stored values were validated on the way in; [Cpf::formatted] tolerates
    // anything else.
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Cpf)
    }
}

#[cfg(test)]
mod cpf_tests {
    use crate::Error;

    use super::Cpf;

    #[test]
    fn parses_bare_digits() {
        let cpf = Cpf::parse("12345678901").unwrap();

        assert_eq!(cpf.as_str(), "12345678901");
    }

    #[test]
    fn strips_the_mask() {
        let masked = Cpf::parse("123.456.789-01").unwrap();
        let bare = Cpf::parse("12345678901").unwrap();

        assert_eq!(masked, bare);
    }

    #[test]
    fn rejects_wrong_lengths_and_letters() {
        for raw in ["", "1234567890", "123456789012", "1234567890a", "abc"] {
            assert_eq!(
                Cpf::parse(raw),
                Err(Error::InvalidCpf(raw.to_string())),
                "expected \"{raw}\" to be rejected"
            );
        }
    }

    #[test]
    fn formats_with_the_standard_mask() {
        let cpf = Cpf::parse("12345678901").unwrap();

        assert_eq!(cpf.formatted(), "123.456.789-01");
        assert_eq!(cpf.to_string(), "123.456.789-01");
    }

    #[test]
    fn formatted_returns_unexpected_lengths_unmasked() {
        for raw in ["", "123", "123456789012"] {
            let cpf = Cpf::new_unchecked(raw);

            assert_eq!(cpf.formatted(), raw);
        }
    }
}
