use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const CENTS_PER_UNIT: i64 = 100;

/// Largest magnitude a ledger amount, total or balance may reach. Keeps every
/// value exactly representable as an `f64` so the wire round trip is lossless.
pub const MAX_CENTS: i64 = 1 << 52;

/// Signed monetary value stored as integer minor units (cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Converts a decimal amount (e.g. `12.5`) into cents, rounding half away
    /// from zero. Returns `None` for NaN, infinities and out-of-range values.
    pub fn from_decimal(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let cents = (value * CENTS_PER_UNIT as f64).round();
        if cents.abs() > MAX_CENTS as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    /// Sum that stays within [`MAX_CENTS`], `None` otherwise.
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).and_then(Self::bounded)
    }

    /// Difference that stays within [`MAX_CENTS`], `None` otherwise.
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).and_then(Self::bounded)
    }

    /// Sums an iterator, failing as soon as a partial sum leaves the range.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(iter: I) -> Option<Money> {
        iter.into_iter().try_fold(Money::ZERO, Money::checked_add)
    }

    pub const fn is_in_range(self) -> bool {
        self.0.unsigned_abs() <= MAX_CENTS as u64
    }

    fn bounded(cents: i64) -> Option<Money> {
        Some(Money(cents)).filter(|money| money.is_in_range())
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / CENTS_PER_UNIT as f64
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Shortest decimal rendering, matching how the balance is persisted:
    /// `100`, `-12.5`, `0.07`.
    pub fn to_plain_string(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / CENTS_PER_UNIT as u64;
        let fraction = abs % CENTS_PER_UNIT as u64;
        if fraction == 0 {
            format!("{sign}{units}")
        } else if fraction % 10 == 0 {
            format!("{sign}{units}.{}", fraction / 10)
        } else {
            format!("{sign}{units}.{fraction:02}")
        }
    }

    /// Parses a persisted decimal string. Rejects anything that is not a
    /// finite number.
    pub fn parse_plain(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .and_then(Self::from_decimal)
    }
}

impl fmt::Display for Money {
    /// Fixed two-decimal rendering used for display (`-12.50`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(
            f,
            "{sign}{}.{:02}",
            abs / CENTS_PER_UNIT as u64,
            abs % CENTS_PER_UNIT as u64
        )
    }
}

// Operators saturate; ledger mutations go through the checked variants.
impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(self.0.saturating_neg())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

// On the wire money is a plain JSON number in major units.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % CENTS_PER_UNIT == 0 {
            serializer.serialize_i64(self.0 / CENTS_PER_UNIT)
        } else {
            serializer.serialize_f64(self.to_decimal())
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_decimal(value)
            .ok_or_else(|| serde::de::Error::custom(format!("amount {value} is out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_conversion_rounds_to_cents() {
        assert_eq!(Money::from_decimal(10.0), Some(Money::from_cents(1000)));
        assert_eq!(Money::from_decimal(0.1 + 0.2), Some(Money::from_cents(30)));
        assert_eq!(Money::from_decimal(19.999), Some(Money::from_cents(2_000)));
        assert_eq!(Money::from_decimal(-4.5), Some(Money::from_cents(-450)));
    }

    #[test]
    fn decimal_conversion_rejects_non_finite_values() {
        assert_eq!(Money::from_decimal(f64::NAN), None);
        assert_eq!(Money::from_decimal(f64::INFINITY), None);
        assert_eq!(Money::from_decimal(f64::NEG_INFINITY), None);
        assert_eq!(Money::from_decimal(1e300), None);
    }

    #[test]
    fn plain_string_is_shortest_decimal() {
        assert_eq!(Money::from_cents(10_000).to_plain_string(), "100");
        assert_eq!(Money::from_cents(-1_250).to_plain_string(), "-12.5");
        assert_eq!(Money::from_cents(7).to_plain_string(), "0.07");
        assert_eq!(Money::from_cents(-5).to_plain_string(), "-0.05");
        assert_eq!(Money::ZERO.to_plain_string(), "0");
    }

    #[test]
    fn parse_plain_accepts_persisted_forms() {
        assert_eq!(Money::parse_plain("100"), Some(Money::from_cents(10_000)));
        assert_eq!(Money::parse_plain(" -12.5 "), Some(Money::from_cents(-1_250)));
        assert_eq!(Money::parse_plain("NaN"), None);
        assert_eq!(Money::parse_plain("inf"), None);
        assert_eq!(Money::parse_plain("abc"), None);
    }

    #[test]
    fn checked_arithmetic_stays_within_range() {
        let near_limit = Money::from_cents(MAX_CENTS - 10);
        assert_eq!(
            near_limit.checked_add(Money::from_cents(10)),
            Some(Money::from_cents(MAX_CENTS))
        );
        assert_eq!(near_limit.checked_add(Money::from_cents(11)), None);
        assert_eq!(Money::from_cents(-MAX_CENTS).checked_sub(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::checked_sum([Money::from_cents(MAX_CENTS), Money::from_cents(1)]),
            None
        );
        assert_eq!(
            Money::from_cents(i64::MAX) + Money::from_cents(1),
            Money::from_cents(i64::MAX)
        );
    }

    #[test]
    fn largest_amount_survives_plain_round_trip() {
        let largest = Money::from_cents(MAX_CENTS);
        assert_eq!(Money::parse_plain(&largest.to_plain_string()), Some(largest));
        assert_eq!(Money::parse_plain(&(-largest).to_plain_string()), Some(-largest));
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::from_cents(1_000).to_string(), "10.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    }

    #[test]
    fn serializes_as_json_number() {
        let whole = serde_json::to_string(&Money::from_cents(10_000)).unwrap();
        let fractional = serde_json::to_string(&Money::from_cents(1_050)).unwrap();
        assert_eq!(whole, "100");
        assert_eq!(fractional, "10.5");
        let parsed: Money = serde_json::from_str("99.99").unwrap();
        assert_eq!(parsed, Money::from_cents(9_999));
    }
}
