//! Type-safe price representation using decimal arithmetic.
//!
//! The catalog API is loose about prices: list endpoints send formatted
//! strings such as `"KSh 1,200"` or `"1200.00"`, while locally built records
//! carry plain numbers. [`PriceInput`] models both shapes at the ingestion
//! boundary and [`normalize_price`] turns either into a [`Decimal`]. Nothing
//! past ingestion sees the loose shape.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price as it arrives from a caller or the catalog API.
///
/// Deserializes from either a JSON number or a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    /// Plain numeric amount.
    Amount(f64),
    /// Formatted string, possibly with a currency symbol and separators.
    Text(String),
}

impl From<f64> for PriceInput {
    fn from(value: f64) -> Self {
        Self::Amount(value)
    }
}

impl From<&str> for PriceInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PriceInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Default for PriceInput {
    fn default() -> Self {
        Self::Amount(0.0)
    }
}

/// Normalize a loose price into a non-negative decimal amount.
///
/// - Numbers are used as-is. Negative, NaN and infinite values become zero.
/// - Strings keep only ASCII digits and `.`, then the longest leading
///   `digits[.digits]` run is parsed. Everything after a second `.` is
///   ignored, so `"1.2.3"` reads as `1.2`.
/// - A string without digits, or one too large for a `Decimal`, is zero.
///
/// Unparseable input yields zero rather than an error.
///
/// # Examples
///
/// ```
/// use nexus_core::{PriceInput, normalize_price};
/// use rust_decimal::Decimal;
///
/// assert_eq!(normalize_price(&PriceInput::from("KSh 1,200")), Decimal::from(1200));
/// assert_eq!(normalize_price(&PriceInput::from(1200.0)), Decimal::from(1200));
/// assert_eq!(normalize_price(&PriceInput::from("free")), Decimal::ZERO);
/// ```
#[must_use]
pub fn normalize_price(input: &PriceInput) -> Decimal {
    match input {
        PriceInput::Amount(value) => normalize_amount(*value),
        PriceInput::Text(text) => parse_price_text(text),
    }
}

fn normalize_amount(value: f64) -> Decimal {
    if !value.is_finite() || value.is_sign_negative() {
        return Decimal::ZERO;
    }
    // f64 Display is the shortest round-tripping form and never uses exponents
    Decimal::from_str(&value.to_string()).map_or(Decimal::ZERO, |d| d.normalize())
}

fn parse_price_text(text: &str) -> Decimal {
    let mut integer = String::new();
    let mut fraction = String::new();
    let mut seen_point = false;

    for c in text.chars().filter(|c| c.is_ascii_digit() || *c == '.') {
        match c {
            '.' if seen_point => break,
            '.' => seen_point = true,
            digit if seen_point => fraction.push(digit),
            digit => integer.push(digit),
        }
    }

    if integer.is_empty() && fraction.is_empty() {
        return Decimal::ZERO;
    }
    if integer.is_empty() {
        integer.push('0');
    }

    let literal = if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    };

    Decimal::from_str(&literal).map_or(Decimal::ZERO, |d| d.normalize())
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., shillings, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the store's default currency.
    #[must_use]
    pub fn kes(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::KES)
    }

    /// Format for display with two decimals and thousands separators
    /// (e.g., `"KSh 1,200.00"`, `"$19.99"`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let fixed = format!("{rounded:.2}");
        let (sign, unsigned) = fixed
            .strip_prefix('-')
            .map_or(("", fixed.as_str()), |rest| ("-", rest));
        let (whole, cents) = unsigned.split_once('.').unwrap_or((unsigned, "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }

        format!(
            "{sign}{}{grouped}.{cents}",
            self.currency_code.display_prefix()
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KES,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::KES => "KSh",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::KES => "KES",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    const fn display_prefix(self) -> &'static str {
        match self {
            Self::KES => "KSh ",
            other => other.symbol(),
        }
    }
}
