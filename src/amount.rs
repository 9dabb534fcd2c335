//! Fixed-point currency amounts.
//!
//! Every amount in the ledger has exactly two fractional digits, so we store
//! the number of cents as an integer and never accumulate floating-point
//! error. Floats only appear at the edges: JSON input/output and display.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{error::InputError, parser::parse_amount_str};

const AMOUNT_TO_FLOAT_DIVISOR: f64 = 100.0;
// 2^63, the first float past i64::MAX.
const MAX_CENTS_AS_F64: f64 = 9_223_372_036_854_775_808.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Two amounts closer than or equal to this are considered the same value.
    pub const TOLERANCE: Amount = Amount(1);

    pub const fn from_cents(cents: i64) -> Amount {
        Amount(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Convert a decimal value, rounding half away from zero to the nearest cent.
    ///
    /// Returns `None` when the value is not finite or does not fit in cents.
    pub fn try_from_f64(value: f64) -> Option<Amount> {
        let cents = (value * AMOUNT_TO_FLOAT_DIVISOR).round();
        if cents.is_finite() && cents.abs() < MAX_CENTS_AS_F64 {
            Some(Amount(cents as i64))
        } else {
            None
        }
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / AMOUNT_TO_FLOAT_DIVISOR
    }

    pub fn abs(self) -> Amount {
        Amount(self.0.abs())
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    pub fn checked_sub(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Sum that returns `None` instead of overflowing.
    pub fn checked_sum<I: IntoIterator<Item = Amount>>(amounts: I) -> Option<Amount> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |a, b| a.checked_add(b))
    }

    /// Equality up to [`Amount::TOLERANCE`].
    pub fn approx_eq(self, other: Amount) -> bool {
        self.checked_sub(other)
            .and_then(|d| d.0.checked_abs())
            .map_or(false, |d| d <= Amount::TOLERANCE.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl FromStr for Amount {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_amount_str(s)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Amount) {
        self.0 -= rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, |a, b| a + b)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Amount::try_from_f64(value)
            .ok_or_else(|| de::Error::custom(format!("invalid amount {value}")))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_cents(3000).to_string(), "30.00");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Amount::from_cents(-123456).to_string(), "-1234.56");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_from_f64_rounds_half_away_from_zero() {
        assert_eq!(Amount::try_from_f64(0.29), Some(Amount::from_cents(29)));
        assert_eq!(Amount::try_from_f64(0.125), Some(Amount::from_cents(13)));
        assert_eq!(Amount::try_from_f64(-0.125), Some(Amount::from_cents(-13)));
        assert_eq!(Amount::try_from_f64(0.1 + 0.2), Some(Amount::from_cents(30)));
        assert_abs_diff_eq!(Amount::from_cents(1999).to_f64(), 19.99);
    }

    #[test]
    fn test_from_f64_out_of_range() {
        assert_eq!(Amount::try_from_f64(1e300), None);
        assert_eq!(Amount::try_from_f64(-1e17), None);
        assert_eq!(Amount::try_from_f64(f64::NAN), None);
        assert_eq!(Amount::try_from_f64(f64::INFINITY), None);
        assert_eq!(Amount::try_from_f64(1e16), Some(Amount::from_cents(1e18 as i64)));
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Amount::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Amount::from_cents(1)), None);
        assert_eq!(Amount::from_cents(i64::MIN).checked_sub(Amount::from_cents(1)), None);
        assert_eq!(
            Amount::checked_sum([Amount::from_cents(5), Amount::from_cents(-2)]),
            Some(Amount::from_cents(3))
        );
        assert_eq!(Amount::checked_sum([max, Amount::from_cents(1)]), None);
        assert_eq!(Amount::checked_sum(Vec::new()), Some(Amount::ZERO));
        assert!(!max.approx_eq(Amount::from_cents(-1)));
        assert!(!Amount::from_cents(i64::MIN).approx_eq(Amount::ZERO));
    }

    #[test]
    fn test_approx_eq() {
        let amount = Amount::from_cents(1000);
        assert!(amount.approx_eq(Amount::from_cents(1001)));
        assert!(amount.approx_eq(Amount::from_cents(999)));
        assert!(!amount.approx_eq(Amount::from_cents(1002)));
    }

    #[test]
    fn test_sum() {
        let amounts = [
            Amount::from_cents(3333),
            Amount::from_cents(3333),
            Amount::from_cents(3334),
        ];
        assert_eq!(amounts.iter().sum::<Amount>(), Amount::from_cents(10000));
    }

    #[test]
    fn test_json() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&Amount::from_cents(3050))?, "30.5");
        let amount: Amount = serde_json::from_str("12.3")?;
        assert_eq!(amount, Amount::from_cents(1230));
        let amount: Amount = serde_json::from_str("7")?;
        assert_eq!(amount, Amount::from_cents(700));
        assert!(serde_json::from_str::<Amount>("1e300").is_err());
        assert!(serde_json::from_str::<Amount>("-1e300").is_err());
        Ok(())
    }
}
