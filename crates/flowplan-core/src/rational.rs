//! Exact rational arithmetic for production rates.
//!
//! Every rate in the pipeline is a [`Rational`]: an arbitrary-precision
//! fraction kept in lowest terms with a positive denominator. Equal values
//! always share one representation, so `Rational` compares and hashes by
//! value. Long recipe chains never accumulate rounding error.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by rational arithmetic and parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RationalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid rational literal '{input}'")]
    Parse { input: String },
}

// ---------------------------------------------------------------------------
// Rational
// ---------------------------------------------------------------------------

/// An exact fraction. Immutable: every operation returns a new value.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rational(BigRational);

impl Rational {
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    pub fn one() -> Self {
        Self(BigRational::one())
    }

    pub fn from_integer(value: i64) -> Self {
        Self(BigRational::from_integer(BigInt::from(value)))
    }

    /// Build `numer / denom`, reduced to lowest terms.
    pub fn from_pair(numer: i64, denom: i64) -> Result<Self, RationalError> {
        if denom == 0 {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self(BigRational::new(BigInt::from(numer), BigInt::from(denom))))
    }

    pub fn numer(&self) -> &BigInt {
        self.0.numer()
    }

    /// Always positive.
    pub fn denom(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn nonzero(&self) -> bool {
        !self.0.is_zero()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    /// Divide by `divisor`, failing instead of panicking on zero.
    pub fn checked_div(&self, divisor: &Rational) -> Result<Rational, RationalError> {
        if divisor.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self(&self.0 / &divisor.0))
    }

    pub fn reciprocal(&self) -> Result<Rational, RationalError> {
        if self.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Self(self.0.recip()))
    }

    /// Smallest integer not less than `self`.
    pub fn ceil(&self) -> Rational {
        Self(self.0.ceil())
    }

    /// Largest integer not greater than `self`.
    pub fn floor(&self) -> Rational {
        Self(self.0.floor())
    }

    pub fn abs(&self) -> Rational {
        Self(self.0.abs())
    }

    /// Integer part, truncated toward zero. `None` if it does not fit.
    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_integer().to_i64()
    }

    /// Lossy conversion for display. Never feed the result back into a plan.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Decimal rendering rounded to `precision` fractional digits, with
    /// trailing zeros removed.
    pub fn to_decimal_string(&self, precision: u32) -> String {
        let scale = BigRational::from_integer(num_traits::pow(
            BigInt::from(10u8),
            precision as usize,
        ));
        let scaled = (&self.0 * &scale).round().to_integer();
        let negative = scaled.is_negative();
        let digits = scaled.abs().to_string();

        let width = precision as usize;
        let padded = if digits.len() <= width {
            format!("{}{}", "0".repeat(width + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (whole, fraction) = padded.split_at(padded.len() - width);
        let fraction = fraction.trim_end_matches('0');

        let mut out = String::with_capacity(padded.len() + 2);
        if negative {
            out.push('-');
        }
        out.push_str(whole);
        if !fraction.is_empty() {
            out.push('.');
            out.push_str(fraction);
        }
        out
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rational({self})")
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp for Rational {
            type Output = Rational;
            fn $method(self, rhs: Rational) -> Rational {
                Rational(self.0.$method(rhs.0))
            }
        }

        impl<'a> $imp<&'a Rational> for Rational {
            type Output = Rational;
            fn $method(self, rhs: &'a Rational) -> Rational {
                Rational(self.0.$method(&rhs.0))
            }
        }

        impl<'a, 'b> $imp<&'b Rational> for &'a Rational {
            type Output = Rational;
            fn $method(self, rhs: &'b Rational) -> Rational {
                Rational((&self.0).$method(&rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);

impl Neg for Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational(-&self.0)
    }
}

impl Sum for Rational {
    fn sum<I: Iterator<Item = Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, v| acc + v)
    }
}

impl<'a> Sum<&'a Rational> for Rational {
    fn sum<I: Iterator<Item = &'a Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, v| acc + v)
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl FromStr for Rational {
    type Err = RationalError;

    /// Accepts `"3"`, `"-1/3"`, and decimals such as `"1.25"` or `".5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RationalError::Parse {
            input: s.to_string(),
        };
        let input = s.trim();

        if let Some((n, d)) = input.split_once('/') {
            let numer = BigInt::from_str(n.trim()).map_err(|_| invalid())?;
            let denom = BigInt::from_str(d.trim()).map_err(|_| invalid())?;
            if denom.is_zero() {
                return Err(RationalError::DivisionByZero);
            }
            return Ok(Self(BigRational::new(numer, denom)));
        }

        let (negative, unsigned) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input.strip_prefix('+').unwrap_or(input)),
        };
        let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(invalid());
        }

        let numer = BigInt::from_str(&format!("{whole}{fraction}")).map_err(|_| invalid())?;
        let denom = num_traits::pow(BigInt::from(10u8), fraction.len());
        let value = BigRational::new(numer, denom);
        Ok(Self(if negative { -value } else { value }))
    }
}

// ---------------------------------------------------------------------------
// Serde
// ---------------------------------------------------------------------------

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rational {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RationalVisitor)
    }
}

struct RationalVisitor;

impl Visitor<'_> for RationalVisitor {
    type Value = Rational;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer, a decimal, or a fraction string such as \"1/3\"")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Rational, E> {
        Ok(Rational::from_integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Rational, E> {
        Ok(Rational(BigRational::from_integer(BigInt::from(v))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Rational, E> {
        if !v.is_finite() {
            return Err(E::invalid_value(Unexpected::Float(v), &self));
        }
        // Shortest round-trip decimal, so 0.1 becomes exactly 1/10.
        v.to_string().parse().map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Rational, E> {
        v.parse().map_err(E::custom)
    }
}
