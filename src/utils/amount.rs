//! Exact fixed-point token amounts.
//!
//! On-chain amounts travel as decimal strings of the token's smallest unit.
//! `TokenAmount` keeps that integer as a `BigInt` next to the token's decimals,
//! so sums over many small era rewards never drift.

use crate::error::AmountError;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

/// Largest scale accepted from token metadata; NEP-141 amounts fit in a u128.
pub const MAX_DECIMALS: u32 = 77;

#[derive(Debug, Clone)]
pub struct TokenAmount {
    raw: BigInt,
    decimals: u32,
}

fn ten_pow(exp: u32) -> BigInt {
    BigInt::from(10u32).pow(exp)
}

impl TokenAmount {
    pub fn zero(decimals: u32) -> Self {
        Self {
            raw: BigInt::zero(),
            decimals,
        }
    }

    pub fn from_raw(raw: BigInt, decimals: u32) -> Self {
        Self { raw, decimals }
    }

    /// Parses an integer count of smallest units, e.g. `"1500000000000000000"`.
    pub fn from_raw_str(value: &str, decimals: u32) -> Result<Self, AmountError> {
        let cleaned = value.trim().trim_matches('"');
        if cleaned.is_empty() || cleaned.contains('+') {
            return Err(AmountError::Invalid(value.to_string()));
        }
        let raw = BigInt::from_str(cleaned).map_err(|_| AmountError::Invalid(value.to_string()))?;
        Ok(Self { raw, decimals })
    }

    /// Parses a human amount such as `"12.5"` into smallest units.
    pub fn from_human(value: &str, decimals: u32) -> Result<Self, AmountError> {
        let cleaned = value.trim();
        let invalid = || AmountError::Invalid(value.to_string());

        let (int_part, frac_part) = match cleaned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (cleaned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }
        if frac_part.len() > decimals as usize {
            return Err(AmountError::TooPrecise {
                value: value.to_string(),
                decimals,
            });
        }

        let int_value = if int_part.is_empty() {
            BigInt::zero()
        } else {
            BigInt::from_str(int_part).map_err(|_| invalid())?
        };
        let padded = format!("{:0<width$}", frac_part, width = decimals as usize);
        let frac_value = if padded.is_empty() {
            BigInt::zero()
        } else {
            BigInt::from_str(&padded).map_err(|_| invalid())?
        };

        Ok(Self {
            raw: int_value * ten_pow(decimals) + frac_value,
            decimals,
        })
    }

    pub fn raw(&self) -> &BigInt {
        &self.raw
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.raw.is_positive()
    }

    /// Decimal-string encoding of the smallest-unit count, as contracts expect it.
    pub fn to_raw_string(&self) -> String {
        self.raw.to_string()
    }

    /// Re-expresses the amount at another scale. Going down truncates toward zero.
    pub fn rescale(&self, decimals: u32) -> Self {
        let raw = match decimals.cmp(&self.decimals) {
            Ordering::Equal => self.raw.clone(),
            Ordering::Greater => &self.raw * ten_pow(decimals - self.decimals),
            Ordering::Less => &self.raw / ten_pow(self.decimals - decimals),
        };
        Self { raw, decimals }
    }

    fn aligned(&self, other: &Self) -> (BigInt, BigInt, u32) {
        let decimals = self.decimals.max(other.decimals);
        (
            self.rescale(decimals).raw,
            other.rescale(decimals).raw,
            decimals,
        )
    }

    fn split(&self) -> (bool, BigInt, String) {
        let scale = ten_pow(self.decimals);
        let abs = self.raw.abs();
        let int_part = &abs / &scale;
        let frac = (&abs % &scale).to_string();
        let frac = format!("{:0>width$}", frac, width = self.decimals as usize);
        let frac = frac.trim_end_matches('0').to_string();
        (self.raw.is_negative(), int_part, frac)
    }

    /// Display form with thousands separators and at most two fractional digits.
    pub fn beautify(&self) -> String {
        let (negative, int_part, frac) = self.split();
        let digits = int_part.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        let frac: String = frac.chars().take(2).collect();
        let frac = frac.trim_end_matches('0');
        let sign = if negative && !(int_part.is_zero() && frac.is_empty()) {
            "-"
        } else {
            ""
        };
        if frac.is_empty() {
            format!("{}{}", sign, grouped)
        } else {
            format!("{}{}.{}", sign, grouped, frac)
        }
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, int_part, frac) = self.split();
        let sign = if negative { "-" } else { "" };
        if frac.is_empty() {
            write!(f, "{}{}", sign, int_part)
        } else {
            write!(f, "{}{}.{}", sign, int_part, frac)
        }
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl PartialEq for TokenAmount {
    fn eq(&self, other: &Self) -> bool {
        let (a, b, _) = self.aligned(other);
        a == b
    }
}

impl Eq for TokenAmount {}

impl PartialOrd for TokenAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TokenAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, _) = self.aligned(other);
        a.cmp(&b)
    }
}

impl Add for TokenAmount {
    type Output = TokenAmount;

    fn add(self, rhs: Self) -> Self::Output {
        let (a, b, decimals) = self.aligned(&rhs);
        TokenAmount::from_raw(a + b, decimals)
    }
}

impl AddAssign for TokenAmount {
    fn add_assign(&mut self, rhs: Self) {
        let (a, b, decimals) = self.aligned(&rhs);
        self.raw = a + b;
        self.decimals = decimals;
    }
}

impl Sub for TokenAmount {
    type Output = TokenAmount;

    fn sub(self, rhs: Self) -> Self::Output {
        let (a, b, decimals) = self.aligned(&rhs);
        TokenAmount::from_raw(a - b, decimals)
    }
}

impl Sum for TokenAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(TokenAmount::zero(0), |acc, next| acc + next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_string_round_trips_through_display() {
        let amount = TokenAmount::from_raw_str("1500000000000000000", 18).unwrap();
        assert_eq!(amount.to_string(), "1.5");
        assert_eq!(amount.to_raw_string(), "1500000000000000000");
    }

    #[test]
    fn test_from_raw_str_trims_quotes() {
        let amount = TokenAmount::from_raw_str(" \"42\" ", 0).unwrap();
        assert_eq!(amount.raw(), &BigInt::from(42));
        assert!(TokenAmount::from_raw_str("", 18).is_err());
        assert!(TokenAmount::from_raw_str("12.5", 18).is_err());
        assert!(TokenAmount::from_raw_str("abc", 18).is_err());
    }

    #[test]
    fn test_from_human() {
        let amount = TokenAmount::from_human("12.5", 18).unwrap();
        assert_eq!(amount.to_raw_string(), "12500000000000000000");
        assert_eq!(
            TokenAmount::from_human(".25", 2).unwrap().to_raw_string(),
            "25"
        );
        assert_eq!(TokenAmount::from_human("7", 0).unwrap().to_raw_string(), "7");
        assert_eq!(
            TokenAmount::from_human("0.123", 2),
            Err(AmountError::TooPrecise {
                value: "0.123".to_string(),
                decimals: 2
            })
        );
        assert!(TokenAmount::from_human("1.2.3", 18).is_err());
        assert!(TokenAmount::from_human("-1", 18).is_err());
        assert!(TokenAmount::from_human(".", 18).is_err());
    }

    #[test]
    fn test_mixed_scale_arithmetic_is_exact() {
        let a = TokenAmount::from_human("0.1", 1).unwrap();
        let b = TokenAmount::from_human("0.02", 2).unwrap();
        let sum = a + b;
        assert_eq!(sum.decimals(), 2);
        assert_eq!(sum.to_string(), "0.12");
        assert_eq!(
            TokenAmount::from_raw_str("10", 1).unwrap(),
            TokenAmount::from_raw_str("1", 0).unwrap()
        );
    }

    #[test]
    fn test_many_small_amounts_do_not_drift() {
        let total: TokenAmount = (0..1000)
            .map(|_| TokenAmount::from_human("0.1", 18).unwrap())
            .sum();
        assert_eq!(total.to_string(), "100");
    }

    #[test]
    fn test_beautify() {
        let amount = TokenAmount::from_human("1234567.891", 18).unwrap();
        assert_eq!(amount.beautify(), "1,234,567.89");
        assert_eq!(TokenAmount::from_human("999.5", 18).unwrap().beautify(), "999.5");
        assert_eq!(TokenAmount::from_human("0.001", 18).unwrap().beautify(), "0");
        assert_eq!(TokenAmount::zero(18).beautify(), "0");
        let negative = TokenAmount::zero(2) - TokenAmount::from_human("1000.5", 2).unwrap();
        assert_eq!(negative.beautify(), "-1,000.5");
        assert_eq!(negative.to_string(), "-1000.5");
    }

    #[test]
    fn test_min_and_ordering() {
        let small = TokenAmount::from_human("1", 18).unwrap();
        let large = TokenAmount::from_human("2", 18).unwrap();
        assert!(small < large);
        assert_eq!(large.clone().min(small.clone()), small);
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let amount = TokenAmount::from_raw_str("1250000", 6).unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), "\"1.25\"");
    }
}
