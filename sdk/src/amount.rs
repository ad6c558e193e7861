//! Exact decimal and native-unit amounts
//!
//! Fiat figures are carried as [`Decimal`], a non-negative wrapper around
//! [`BigDecimal`], so that percentage splits conserve value exactly. Native
//! chain amounts are plain 256-bit integers in the chain's smallest unit.
//! [`Decimal::to_native_units`] is the only place a fiat figure becomes a
//! native integer.
//!
//! # Examples
//! ```
//! use dinsy_sdk::amount::Decimal;
//!
//! let total: Decimal = "100".parse().unwrap();
//! let share: Decimal = "0.09".parse().unwrap();
//! let sponsor = total.product(&share);
//! assert_eq!(sponsor.to_string(), "9");
//! assert_eq!(total.checked_sub(&sponsor).unwrap().to_string(), "91");
//! ```

use crate::error::{DinsyError, Result};
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};
use ruint::aliases::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Amount in the chain's smallest unit (e.g. wei)
pub type NativeAmount = U256;

fn native_to_bigint(amount: NativeAmount) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &amount.to_be_bytes::<32>())
}

fn bigint_to_native(value: &BigInt) -> Result<NativeAmount> {
    let (sign, bytes) = value.to_bytes_be();
    if sign == Sign::Minus {
        return Err(DinsyError::AmountOverflow("negative native amount"));
    }
    U256::try_from_be_slice(&bytes).ok_or(DinsyError::AmountOverflow("native conversion"))
}

fn pow10(exp: i64) -> Result<BigInt> {
    let exp = usize::try_from(exp).map_err(|_| DinsyError::AmountOverflow("decimal exponent"))?;
    Ok(num_traits::pow(BigInt::from(10_u8), exp))
}

/// Non-negative arbitrary-precision decimal
///
/// Equality and ordering are numeric, so `1.0 == 1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Decimal(BigDecimal);

impl Decimal {
    #[must_use]
    pub fn zero() -> Self {
        Self(BigDecimal::zero())
    }

    #[must_use]
    pub fn one() -> Self {
        Self(BigDecimal::one())
    }

    /// Build `mantissa * 10^-scale`
    #[must_use]
    pub fn new(mantissa: U256, scale: u32) -> Self {
        Self(BigDecimal::new(native_to_bigint(mantissa), i64::from(scale)))
    }

    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self(BigDecimal::from(value))
    }

    /// Interpret a native amount with `decimals` fractional digits
    #[must_use]
    pub fn from_native(amount: NativeAmount, decimals: u32) -> Self {
        Self::new(amount, decimals)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[must_use]
    pub const fn as_big_decimal(&self) -> &BigDecimal {
        &self.0
    }

    /// Exact product
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn product(&self, other: &Self) -> Self {
        Self(&self.0 * &other.0)
    }

    /// Exact sum
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn sum(&self, other: &Self) -> Self {
        Self(&self.0 + &other.0)
    }

    /// Exact difference; errors when the result would be negative
    #[allow(clippy::arithmetic_side_effects)]
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        if other > self {
            return Err(DinsyError::Generic(format!(
                "negative result subtracting {other} from {self}"
            )));
        }
        Ok(Self(&self.0 - &other.0))
    }

    /// `floor(self / rate * 10^exponent)` computed in integer arithmetic
    #[allow(clippy::arithmetic_side_effects)]
    pub fn to_native_units(&self, rate: &Self, exponent: u32) -> Result<NativeAmount> {
        if rate.is_zero() {
            return Err(DinsyError::InvalidExchangeRate(rate.to_string()));
        }
        let (value_digits, value_scale) = self.0.as_bigint_and_exponent();
        let (rate_digits, rate_scale) = rate.0.as_bigint_and_exponent();

        // value_digits / 10^value_scale / (rate_digits / 10^rate_scale) * 10^exponent
        let shift = rate_scale
            .checked_add(i64::from(exponent))
            .and_then(|s| s.checked_sub(value_scale))
            .ok_or(DinsyError::AmountOverflow("native conversion"))?;
        let (numerator, denominator) = if shift >= 0 {
            (value_digits * pow10(shift)?, rate_digits)
        } else {
            (value_digits, rate_digits * pow10(-shift)?)
        };

        // both operands are non-negative, so truncation is flooring
        bigint_to_native(&(numerator / denominator))
    }
}

impl FromStr for Decimal {
    type Err = DinsyError;

    /// Plain digits with at most one `.`; signs and exponents are rejected
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = || DinsyError::InvalidAmount(s.to_string());

        let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !digits_only(int_part)
            || !digits_only(frac_part)
        {
            return Err(invalid());
        }

        let canonical = format!(
            "{}.{}",
            if int_part.is_empty() { "0" } else { int_part },
            if frac_part.is_empty() { "0" } else { frac_part }
        );
        BigDecimal::from_str(&canonical)
            .map(Self)
            .map_err(|_| invalid())
    }
}

impl fmt::Display for Decimal {
    /// Plain notation without trailing fractional zeros
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (digits, scale) = self.0.normalized().as_bigint_and_exponent();
        if digits.is_zero() {
            return f.write_str("0");
        }
        let digits = digits.to_string();
        let Ok(scale) = usize::try_from(scale) else {
            // negative scale: trailing integer zeros
            let zeros = usize::try_from(scale.unsigned_abs()).map_err(|_| fmt::Error)?;
            return write!(f, "{digits}{}", "0".repeat(zeros));
        };
        if scale == 0 {
            return f.write_str(&digits);
        }
        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale.saturating_sub(digits.len()).saturating_add(1)))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len().saturating_sub(scale));
        write!(f, "{int_part}.{frac_part}")
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Raw::Int(value) => Ok(Self::from_u64(value)),
        }
    }
}

/// Serialize a native amount as a base-10 string (for `#[serde(serialize_with)]`)
pub fn serialize_native<S: Serializer>(
    amount: &NativeAmount,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(amount)
}

/// [`serialize_native`] for optional amounts; `None` becomes `null`
pub fn serialize_native_opt<S: Serializer>(
    amount: &Option<NativeAmount>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match amount {
        Some(amount) => serializer.collect_str(amount),
        None => serializer.serialize_none(),
    }
}

/// Render a native amount as a decimal of whole native units
///
/// ```
/// use dinsy_sdk::amount::{format_native, NativeAmount};
///
/// let wei = NativeAmount::from(1_500_000_000_000_000_000_u64);
/// assert_eq!(format_native(wei, 18), "1.5");
/// ```
#[must_use]
pub fn format_native(amount: NativeAmount, decimals: u32) -> String {
    Decimal::from_native(amount, decimals).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(dec("100").to_string(), "100");
        assert_eq!(dec("0.09").to_string(), "0.09");
        assert_eq!(dec("1.500").to_string(), "1.5");
        assert_eq!(dec(".5").to_string(), "0.5");
        assert_eq!(dec("7.").to_string(), "7");
        assert_eq!(dec(" 25000 ").to_string(), "25000");
        assert_eq!(dec("0.000").to_string(), "0");
        assert_eq!(dec("100000").to_string(), "100000");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", ".", "-1", "+1", "1e2", "abc", "1.2.3", "1,5", "NaN", "1 000"] {
            assert!(
                matches!(bad.parse::<Decimal>(), Err(DinsyError::InvalidAmount(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_numeric_equality() {
        assert_eq!(dec("1.0"), dec("1"));
        assert_eq!(dec("0.090"), dec("0.09"));
        assert_eq!(dec("0"), Decimal::zero());
        assert_eq!(Decimal::from_u64(593), dec("593.000"));
    }

    #[test]
    fn test_product_is_exact() {
        assert_eq!(dec("100").product(&dec("0.09")), dec("9"));
        assert_eq!(dec("33.33").product(&dec("0.09")), dec("2.9997"));
        // 0.1 * 0.2 is exactly 0.02, unlike binary floating point
        assert_eq!(dec("0.1").product(&dec("0.2")), dec("0.02"));
    }

    #[test]
    fn test_sum_and_difference() {
        assert_eq!(dec("91").sum(&dec("9")), dec("100"));
        assert_eq!(dec("0.1").sum(&dec("0.2")), dec("0.3"));
        assert_eq!(dec("33.33").checked_sub(&dec("2.9997")).unwrap(), dec("30.3303"));
        assert!(dec("1").checked_sub(&dec("1.01")).is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(dec("0.09") < Decimal::one());
        assert!(dec("1.0001") > Decimal::one());
        assert!(dec("0") <= Decimal::zero());
        assert!(dec("2") > dec("1.999999"));
    }

    #[test]
    fn test_to_native_units_floors() {
        let rate = dec("593");
        // 100 / 593 * 1e18 = 168634064080944350.758...
        assert_eq!(
            dec("100").to_native_units(&rate, 18).unwrap(),
            U256::from(168_634_064_080_944_350_u128)
        );
        // 9 / 593 * 1e18 = 15177065767284991.568...
        assert_eq!(
            dec("9").to_native_units(&rate, 18).unwrap(),
            U256::from(15_177_065_767_284_991_u128)
        );
        assert_eq!(dec("1").to_native_units(&dec("1"), 0).unwrap(), U256::from(1_u64));
        assert_eq!(dec("0").to_native_units(&rate, 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_to_native_units_fractional_values() {
        // 1 / 0.5 * 10^6 = 2_000_000
        assert_eq!(
            dec("1").to_native_units(&dec("0.5"), 6).unwrap(),
            U256::from(2_000_000_u64)
        );
        // 2.9997 / 3 * 10^2 = 99.99
        assert_eq!(
            dec("2.9997").to_native_units(&dec("3"), 2).unwrap(),
            U256::from(99_u64)
        );
    }

    #[test]
    fn test_to_native_units_zero_rate() {
        assert!(matches!(
            dec("1").to_native_units(&Decimal::zero(), 18),
            Err(DinsyError::InvalidExchangeRate(_))
        ));
    }

    #[test]
    fn test_to_native_units_overflow() {
        let huge = dec(&"9".repeat(80));
        assert!(matches!(
            huge.to_native_units(&dec("1"), 0),
            Err(DinsyError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_format_native() {
        assert_eq!(format_native(U256::from(1_u64), 18), "0.000000000000000001");
        assert_eq!(format_native(U256::ZERO, 18), "0");
        assert_eq!(format_native(U256::from(2_000_u64), 3), "2");
        assert_eq!(
            format_native(U256::from(168_634_064_080_944_350_u128), 18),
            "0.16863406408094435"
        );
    }

    #[test]
    fn test_serde_accepts_string_and_integer() {
        let from_str: Decimal = serde_json::from_str("\"0.09\"").unwrap();
        let from_int: Decimal = serde_json::from_str("593").unwrap();
        assert_eq!(from_str, dec("0.09"));
        assert_eq!(from_int, dec("593"));
        assert_eq!(serde_json::to_string(&dec("12.50")).unwrap(), "\"12.5\"");
        assert!(serde_json::from_str::<Decimal>("\"-3\"").is_err());
    }

    #[test]
    fn test_optional_native_serializes_as_string_or_null() {
        #[derive(Serialize)]
        struct Row {
            #[serde(serialize_with = "serialize_native_opt")]
            price: Option<NativeAmount>,
        }

        let priced = Row {
            price: Some(U256::from(168_634_064_080_944_350_u128)),
        };
        assert_eq!(
            serde_json::to_string(&priced).unwrap(),
            r#"{"price":"168634064080944350"}"#
        );
        assert_eq!(
            serde_json::to_string(&Row { price: None }).unwrap(),
            r#"{"price":null}"#
        );
    }
}
