use crate::error::{ReceiptLedgerError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Largest amount accepted from an OCR token. Anything bigger is a misread,
/// and keeping tokens this small leaves sums of many records far from
/// `Decimal::MAX`.
pub const MAX_OCR_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0); // 1_000_000_000_000

/// A dollar amount. Backed by a decimal so repeated reconciliation arithmetic
/// never drifts the way binary floats do. Serializes as a plain JSON number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct Money(
    #[serde(with = "rust_decimal::serde::float")]
    #[schemars(with = "f64")]
    Decimal,
);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parses an amount token as OCR emits it: an optional leading currency
    /// symbol, thousands separators, and stray trailing punctuation.
    pub fn parse_ocr(token: &str) -> Option<Money> {
        let cleaned: String = token
            .trim()
            .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '.')
            .trim_end_matches(|c: char| !c.is_ascii_digit())
            .chars()
            .filter(|c| *c != ',')
            .collect();

        if cleaned.is_empty() {
            return None;
        }

        let amount: Decimal = cleaned.parse().ok()?;
        if amount > MAX_OCR_AMOUNT {
            return None;
        }
        Some(Money(amount))
    }

    /// Moves the decimal point one place left, rounded to cents. Undoes a
    /// dropped decimal point or a doubled trailing digit.
    pub fn shift_decimal_left(self) -> Money {
        Money((self.0 / Decimal::TEN).round_dp(2))
    }

    /// Integer part, truncated toward zero.
    pub fn whole_units(&self) -> i64 {
        self.0.trunc().to_i64().unwrap_or_default()
    }

    pub fn scale(self, factor: Decimal) -> Money {
        Money(self.0 * factor)
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    pub fn abs_diff(self, other: Money) -> Money {
        Money((self.0 - other.0).abs())
    }

    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Arithmetic mean, or `None` for an empty set.
    pub fn mean<I: IntoIterator<Item = Money>>(values: I) -> Option<Money> {
        let mut total = Decimal::ZERO;
        let mut count = 0u32;
        for value in values {
            total += value.0;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(Money(total / Decimal::from(count)))
    }
}

impl FromStr for Money {
    type Err = ReceiptLedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Decimal::from_str(s.trim())
            .map(Money)
            .map_err(|_| ReceiptLedgerError::InvalidAmount(s.to_string()))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

/// A monetary field as captured from a receipt line. OCR can leave a field
/// present but unreadable, which is different from the field never appearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    Parsed(Money),
    Unreadable(String),
}

impl Amount {
    pub fn from_token(token: &str) -> Self {
        match Money::parse_ocr(token) {
            Some(money) => Amount::Parsed(money),
            None => Amount::Unreadable(token.to_string()),
        }
    }

    pub fn money(&self) -> Option<Money> {
        match self {
            Amount::Parsed(money) => Some(*money),
            Amount::Unreadable(_) => None,
        }
    }
}
