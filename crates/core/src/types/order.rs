//! Order number type.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    /// The input does not start with `ORD`.
    #[error("order number must start with {prefix}")]
    MissingPrefix {
        /// Required prefix.
        prefix: &'static str,
    },
    /// The part after the prefix is not exactly six digits.
    #[error("order number must end with {len} digits")]
    InvalidDigits {
        /// Required digit count.
        len: usize,
    },
}

/// A client-generated order number such as `ORD482913`.
///
/// ## Constraints
///
/// - Prefix `ORD`
/// - Followed by exactly six ASCII digits
///
/// Numbers are derived from the placement timestamp, so two orders placed in
/// the same millisecond-modulo-one-million window collide. The history keeps
/// both and a lookup by number returns the earlier one.
///
/// Deserializing goes through [`OrderNumber::parse`], so a malformed number
/// is a decode error.
///
/// ## Examples
///
/// ```
/// use nexus_core::OrderNumber;
///
/// assert!(OrderNumber::parse("ORD000123").is_ok());
/// assert!(OrderNumber::parse("ORD12").is_err());
/// assert!(OrderNumber::parse("INV000123").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(into = "String", try_from = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Fixed prefix.
    pub const PREFIX: &'static str = "ORD";
    /// Number of trailing digits.
    pub const DIGITS: usize = 6;

    /// Derive an order number from the last six digits of the timestamp's
    /// Unix milliseconds.
    #[must_use]
    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        let millis = at.timestamp_millis().rem_euclid(1_000_000);
        Self(format!("{}{millis:06}", Self::PREFIX))
    }

    /// Parse an `OrderNumber` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is missing or the suffix is not six digits.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let digits = s
            .strip_prefix(Self::PREFIX)
            .ok_or(OrderNumberError::MissingPrefix {
                prefix: Self::PREFIX,
            })?;

        if digits.len() != Self::DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::InvalidDigits { len: Self::DIGITS });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(number: OrderNumber) -> Self {
        number.0
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
