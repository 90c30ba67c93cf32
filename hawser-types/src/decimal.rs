//! Exact decimal numbers.
//!
//! [`Decimal`] is a mantissa/scale number (`value = mantissa × 10^-scale`) built on
//! `rust_decimal`. It is an immutable value: every operation returns a new `Decimal` and the
//! operands are left untouched, so two logical values can never alias. Operations that can fail
//! return `Result` instead of a sentinel:
//!
//! - division or remainder by zero, logarithms of non-positive values, square roots of negative
//!   values and non-integer powers of non-positive bases are `Arithmetic` errors;
//! - results that leave the representable range are `Overflow` errors.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use rust_decimal::MathematicalOps;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::HawserError;

type Inner = rust_decimal::Decimal;

const ERF_SATURATION: i64 = 6;
const NORMAL_CDF_SATURATION: i64 = 9;

/// Exact decimal value.
///
/// Equality, ordering and hashing follow the represented value, so `1.50 == 1.5` and
/// `-0 == 0`.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Decimal(Inner);

impl Decimal {
    /// Zero.
    pub const ZERO: Self = Self(Inner::ZERO);
    /// One.
    pub const ONE: Self = Self(Inner::ONE);

    /// Build `mantissa × 10^-scale`.
    ///
    /// # Errors
    /// `Overflow` if `scale` exceeds the supported precision (28).
    pub fn new(mantissa: i64, scale: u32) -> Result<Self, HawserError> {
        Inner::try_new(mantissa, scale)
            .map(Self)
            .map_err(|e| HawserError::overflow(format!("{mantissa}e-{scale}: {e}")))
    }

    /// Build from a 128-bit mantissa.
    ///
    /// # Errors
    /// `Overflow` if the mantissa needs more than 96 bits or `scale` exceeds 28.
    pub fn from_i128_with_scale(mantissa: i128, scale: u32) -> Result<Self, HawserError> {
        Inner::try_from_i128_with_scale(mantissa, scale)
            .map(Self)
            .map_err(|e| HawserError::overflow(format!("{mantissa}e-{scale}: {e}")))
    }

    /// Best-effort conversion from a binary float.
    ///
    /// # Errors
    /// `InvalidFormat` for NaN or infinities, `Overflow` if the magnitude is out of range.
    pub fn from_f64(value: f64) -> Result<Self, HawserError> {
        if !value.is_finite() {
            return Err(HawserError::invalid_format(format!(
                "{value} is not a finite number"
            )));
        }
        Inner::from_f64(value)
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("{value} is out of decimal range")))
    }

    /// Lossy conversion to a binary float.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(f64::NAN)
    }

    /// Integer mantissa.
    #[must_use]
    pub const fn mantissa(&self) -> i128 {
        self.0.mantissa()
    }

    /// Number of fractional digits.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.0.scale()
    }

    /// Underlying `rust_decimal` value.
    #[must_use]
    pub const fn into_inner(self) -> Inner {
        self.0
    }

    // ---- arithmetic ----

    /// `self + other`.
    ///
    /// # Errors
    /// `Overflow` if the sum is out of range.
    pub fn checked_add(&self, other: &Self) -> Result<Self, HawserError> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("{self} + {other}")))
    }

    /// `self - other`.
    ///
    /// # Errors
    /// `Overflow` if the difference is out of range.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, HawserError> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("{self} - {other}")))
    }

    /// `self * other`.
    ///
    /// # Errors
    /// `Overflow` if the product is out of range.
    pub fn checked_mul(&self, other: &Self) -> Result<Self, HawserError> {
        self.0
            .checked_mul(other.0)
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("{self} * {other}")))
    }

    /// `self / other`.
    ///
    /// # Errors
    /// `Arithmetic` if `other` is zero, `Overflow` if the quotient is out of range.
    pub fn checked_div(&self, other: &Self) -> Result<Self, HawserError> {
        if other.is_zero() {
            return Err(HawserError::arithmetic(format!("{self} / 0: division by zero")));
        }
        self.0
            .checked_div(other.0)
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("{self} / {other}")))
    }

    /// Remainder of `self / other`, with the sign of `self`.
    ///
    /// # Errors
    /// `Arithmetic` if `other` is zero.
    pub fn checked_rem(&self, other: &Self) -> Result<Self, HawserError> {
        if other.is_zero() {
            return Err(HawserError::arithmetic(format!("{self} % 0: remainder by zero")));
        }
        self.0
            .checked_rem(other.0)
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("{self} % {other}")))
    }

    /// `-self`.
    #[must_use]
    pub fn negate(&self) -> Self {
        Self(-self.0)
    }

    // ---- transforms ----

    /// Absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Smallest integer greater than or equal to `self`.
    #[must_use]
    pub fn ceil(&self) -> Self {
        Self(self.0.ceil())
    }

    /// Largest integer less than or equal to `self`.
    #[must_use]
    pub fn floor(&self) -> Self {
        Self(self.0.floor())
    }

    /// Fractional part, keeping the sign of `self`.
    #[must_use]
    pub fn fract(&self) -> Self {
        Self(self.0.fract())
    }

    /// Integer part, rounding towards zero.
    #[must_use]
    pub fn trunc(&self) -> Self {
        Self(self.0.trunc())
    }

    /// Round to an integer, ties to even (`6.5 → 6`, `7.5 → 8`).
    #[must_use]
    pub fn round(&self) -> Self {
        Self(self.0.round())
    }

    /// Round to `dp` fractional digits, ties to even.
    #[must_use]
    pub fn round_dp(&self, dp: u32) -> Self {
        Self(self.0.round_dp(dp))
    }

    /// Strip trailing zeros; `-0` becomes `0`.
    #[must_use]
    pub fn normalize(&self) -> Self {
        Self(self.0.normalize())
    }

    // ---- predicates ----

    /// `self == 0`.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `self < 0`. Negative zero is not negative.
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_negative()
    }

    /// `self > 0`.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Three-way comparison as a boundary integer: `-1`, `0` or `1`.
    #[must_use]
    pub fn cmp_tag(&self, other: &Self) -> i32 {
        match self.cmp(other) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }
    }

    // ---- transcendental ----

    /// Square root.
    ///
    /// # Errors
    /// `Arithmetic` for negative values.
    pub fn sqrt(&self) -> Result<Self, HawserError> {
        self.0
            .sqrt()
            .map(Self)
            .ok_or_else(|| HawserError::arithmetic(format!("sqrt({self}): negative operand")))
    }

    /// Natural logarithm.
    ///
    /// # Errors
    /// `Arithmetic` for values `<= 0`.
    pub fn ln(&self) -> Result<Self, HawserError> {
        if !self.is_positive() {
            return Err(HawserError::arithmetic(format!("ln({self}): non-positive operand")));
        }
        self.0
            .checked_ln()
            .map(Self)
            .ok_or_else(|| HawserError::arithmetic(format!("ln({self})")))
    }

    /// Base-10 logarithm.
    ///
    /// # Errors
    /// `Arithmetic` for values `<= 0`.
    pub fn log10(&self) -> Result<Self, HawserError> {
        if !self.is_positive() {
            return Err(HawserError::arithmetic(format!(
                "log10({self}): non-positive operand"
            )));
        }
        self.0
            .checked_log10()
            .map(Self)
            .ok_or_else(|| HawserError::arithmetic(format!("log10({self})")))
    }

    /// `e^self` with the default series tolerance.
    ///
    /// # Errors
    /// `Overflow` if the result is out of range.
    pub fn exp(&self) -> Result<Self, HawserError> {
        self.0
            .checked_exp()
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("exp({self})")))
    }

    /// `e^self`, stopping the series once a term falls below `tolerance`.
    ///
    /// # Errors
    /// `Arithmetic` if `tolerance` is not positive, `Overflow` if the result is out of range.
    pub fn exp_with_tolerance(&self, tolerance: &Self) -> Result<Self, HawserError> {
        if !tolerance.is_positive() {
            return Err(HawserError::arithmetic(format!(
                "exp tolerance must be positive, got {tolerance}"
            )));
        }
        self.0
            .checked_exp_with_tolerance(tolerance.0)
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("exp({self})")))
    }

    /// Sine of `self` radians.
    ///
    /// # Errors
    /// `Overflow` if the series does not fit.
    pub fn sin(&self) -> Result<Self, HawserError> {
        self.0
            .checked_sin()
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("sin({self})")))
    }

    /// Cosine of `self` radians.
    ///
    /// # Errors
    /// `Overflow` if the series does not fit.
    pub fn cos(&self) -> Result<Self, HawserError> {
        self.0
            .checked_cos()
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("cos({self})")))
    }

    /// Tangent of `self` radians.
    ///
    /// # Errors
    /// `Overflow` near odd multiples of π/2.
    pub fn tan(&self) -> Result<Self, HawserError> {
        self.0
            .checked_tan()
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("tan({self})")))
    }

    /// `self^exp`.
    ///
    /// Integer exponents are computed by repeated squaring and accept any base. Other exponents
    /// use `exp(exp × ln(self))` and therefore need a positive base (a zero base is accepted
    /// for positive exponents).
    ///
    /// # Errors
    /// `Arithmetic` for a domain violation, `Overflow` if the result is out of range.
    pub fn pow(&self, exp: &Self) -> Result<Self, HawserError> {
        if exp.0.fract().is_zero()
            && let Some(n) = exp.0.to_i64()
        {
            if self.is_zero() && n < 0 {
                return Err(HawserError::arithmetic(format!(
                    "pow({self}, {exp}): zero to a negative power"
                )));
            }
            return self
                .0
                .checked_powi(n)
                .map(Self)
                .ok_or_else(|| HawserError::overflow(format!("pow({self}, {exp})")));
        }

        if self.is_zero() {
            return if exp.is_positive() {
                Ok(Self::ZERO)
            } else {
                Err(HawserError::arithmetic(format!(
                    "pow({self}, {exp}): zero to a negative power"
                )))
            };
        }
        if self.is_negative() {
            return Err(HawserError::arithmetic(format!(
                "pow({self}, {exp}): non-integer power of a negative base"
            )));
        }
        self.0
            .checked_powd(exp.0)
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("pow({self}, {exp})")))
    }

    /// Error function (Abramowitz and Stegun approximation).
    ///
    /// Saturates to ±1 for `|x| >= 6`, where the approximation's polynomial would overflow and
    /// the true value is within 1e-17 of the limit.
    #[must_use]
    pub fn erf(&self) -> Self {
        if self.0.abs() >= Inner::from(ERF_SATURATION) {
            return if self.is_negative() { -Self::ONE } else { Self::ONE };
        }
        Self(self.0.erf())
    }

    /// Cumulative distribution function of the standard normal distribution.
    ///
    /// Saturates to 0 or 1 for `|x| >= 9`.
    #[must_use]
    pub fn normal_cdf(&self) -> Self {
        if self.0.abs() >= Inner::from(NORMAL_CDF_SATURATION) {
            return if self.is_negative() { Self::ZERO } else { Self::ONE };
        }
        Self(self.0.norm_cdf())
    }

    /// Probability density function of the standard normal distribution.
    ///
    /// # Errors
    /// `Overflow` if the intermediate exponent does not fit.
    pub fn norm_pdf(&self) -> Result<Self, HawserError> {
        self.0
            .checked_norm_pdf()
            .map(Self)
            .ok_or_else(|| HawserError::overflow(format!("norm_pdf({self})")))
    }
}

/// The smaller of `a` and `b`; `a` when they compare equal.
///
/// Returns one of the two borrowed inputs, never a new value.
#[must_use]
pub fn min<'a>(a: &'a Decimal, b: &'a Decimal) -> &'a Decimal {
    if a <= b { a } else { b }
}

/// The larger of `a` and `b`; `b` when they compare equal.
///
/// Paired with [`min`], the two calls always hand back both inputs.
#[must_use]
pub fn max<'a>(a: &'a Decimal, b: &'a Decimal) -> &'a Decimal {
    if a <= b { b } else { a }
}

impl FromStr for Decimal {
    type Err = HawserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = if trimmed.contains(['e', 'E']) {
            Inner::from_scientific(trimmed)
        } else {
            Inner::from_str(trimmed)
        };
        parsed
            .map(Self)
            .map_err(|e| HawserError::invalid_format(format!("`{s}` is not a decimal: {e}")))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self(Inner::from(value))
    }
}

impl From<Inner> for Decimal {
    fn from(value: Inner) -> Self {
        Self(value)
    }
}

impl From<Decimal> for Inner {
    fn from(value: Decimal) -> Self {
        value.0
    }
}

impl TryFrom<f64> for Decimal {
    type Error = HawserError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_f64(value)
    }
}

impl Add for Decimal {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Decimal {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for Decimal {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Neg for Decimal {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn round_is_bankers() {
        assert_eq!(d("6.5").round(), d("6"));
        assert_eq!(d("7.5").round(), d("8"));
        assert_eq!(d("-2.5").round(), d("-2"));
    }

    #[test]
    fn equality_ignores_trailing_zeros() {
        assert_eq!(d("1.50"), d("1.5"));
        assert_eq!(d("1.50").cmp_tag(&d("1.5")), 0);
        assert_eq!(d("1.50").normalize().scale(), 1);
    }

    #[test]
    fn normalize_maps_negative_zero_to_zero() {
        let neg_zero = d("-0.00");
        assert!(neg_zero.is_zero());
        assert!(!neg_zero.is_negative());
        assert_eq!(neg_zero.normalize().to_string(), "0");
    }

    #[test]
    fn division_by_zero_is_arithmetic_error() {
        let err = d("1").checked_div(&Decimal::ZERO).unwrap_err();
        assert!(matches!(err, HawserError::Arithmetic(_)));
        let err = d("1").checked_rem(&Decimal::ZERO).unwrap_err();
        assert!(matches!(err, HawserError::Arithmetic(_)));
    }

    #[test]
    fn logarithm_domain() {
        assert!(matches!(Decimal::ZERO.ln(), Err(HawserError::Arithmetic(_))));
        assert!(matches!(d("-3").log10(), Err(HawserError::Arithmetic(_))));
        assert_eq!(d("100").log10().unwrap().round_dp(10), d("2"));
    }

    #[test]
    fn pow_domain_and_overflow() {
        assert_eq!(d("2").pow(&d("10")).unwrap(), d("1024"));
        assert_eq!(d("-2").pow(&d("3")).unwrap(), d("-8"));
        assert!(matches!(d("-2").pow(&d("0.5")), Err(HawserError::Arithmetic(_))));
        assert!(matches!(Decimal::ZERO.pow(&d("-1")), Err(HawserError::Arithmetic(_))));
        assert!(matches!(d("10").pow(&d("40")), Err(HawserError::Overflow(_))));
        assert_eq!(d("4").pow(&d("0.5")).unwrap().round_dp(8), d("2"));
    }

    #[test]
    fn unparseable_input_is_invalid_format() {
        assert!(matches!("abc".parse::<Decimal>(), Err(HawserError::InvalidFormat(_))));
        assert!(matches!(Decimal::from_f64(f64::NAN), Err(HawserError::InvalidFormat(_))));
        assert_eq!(d("1.5e2"), d("150"));
    }

    #[test]
    fn min_max_hand_back_inputs() {
        let a = d("1.0");
        let b = d("1.00");
        assert!(std::ptr::eq(min(&a, &b), &a));
        assert!(std::ptr::eq(max(&a, &b), &b));
    }

    #[test]
    fn scale_above_precision_is_overflow() {
        assert!(matches!(Decimal::new(1, 29), Err(HawserError::Overflow(_))));
    }
}
