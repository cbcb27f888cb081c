//! The [`Dec`] fixed-point type.

use {
    crate::error::DecError,
    borsh::{BorshDeserialize, BorshSerialize},
    num_bigint::BigInt,
    num_traits::{One, Signed, ToPrimitive, Zero},
    serde::{de, Deserialize, Deserializer, Serialize, Serializer},
    std::{
        fmt,
        io::{Read, Write},
        iter::Sum,
        ops::{Add, Mul, Neg, Sub},
        str::FromStr,
    },
};

/// Number of fractional decimal digits carried by every [`Dec`].
pub const PRECISION: u32 = 10;

/// `10^PRECISION`.
const PRECISION_MULTIPLIER: i64 = 10_000_000_000;

/// Basis points denominator (10_000 bps = 100%).
pub const BPS_DENOMINATOR: i64 = 10_000;

fn precision_multiplier() -> BigInt {
    BigInt::from(PRECISION_MULTIPLIER)
}

/// Integer division rounding half away from zero.
///
/// `den` must be non-zero.
fn div_round(num: &BigInt, den: &BigInt) -> BigInt {
    let quotient = num / den;
    let remainder = num % den;
    if remainder.abs() * BigInt::from(2u8) < den.abs() {
        return quotient;
    }
    if num.is_negative() == den.is_negative() {
        quotient + BigInt::one()
    } else {
        quotient - BigInt::one()
    }
}

/// A signed fixed-point decimal with [`PRECISION`] fractional digits.
///
/// The value is stored as `raw / 10^PRECISION` where `raw` is an
/// arbitrary-precision integer, so no product of realistic stake amounts
/// can overflow. Equality, ordering and hashing compare the exact value.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(BigInt);

impl Dec {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn one() -> Self {
        Self(precision_multiplier())
    }

    /// A whole-number decimal.
    pub fn from_int(value: i64) -> Self {
        Self(BigInt::from(value) * precision_multiplier())
    }

    /// A whole-number decimal from a 128-bit integer.
    pub fn from_i128(value: i128) -> Self {
        Self(BigInt::from(value) * precision_multiplier())
    }

    /// A fraction expressed in basis points (`10_000` bps = `1`). Exact.
    pub fn from_bps(bps: u64) -> Self {
        Self(BigInt::from(bps) * BigInt::from(PRECISION_MULTIPLIER / BPS_DENOMINATOR))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Divide, rounding half away from zero at the last fractional digit.
    pub fn checked_quo(&self, other: &Dec) -> Result<Self, DecError> {
        if other.is_zero() {
            return Err(DecError::DivisionByZero);
        }
        Ok(Self(div_round(&(&self.0 * precision_multiplier()), &other.0)))
    }

    /// Round to the nearest whole number, halves away from zero.
    ///
    /// `20.5` rounds to `21`, `20.4999999999` to `20`, `-0.5` to `-1`.
    pub fn round(&self) -> Self {
        let multiplier = precision_multiplier();
        Self(div_round(&self.0, &multiplier) * multiplier)
    }

    /// The value rounded to a whole number, if it fits in an `i128`.
    pub fn round_to_i128(&self) -> Option<i128> {
        div_round(&self.0, &precision_multiplier()).to_i128()
    }

    fn mul_raw(&self, other: &Dec) -> Self {
        Self(div_round(&(&self.0 * &other.0), &precision_multiplier()))
    }
}

impl From<i64> for Dec {
    fn from(value: i64) -> Self {
        Self::from_int(value)
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, |$lhs:ident, $rhs:ident| $body:expr) => {
        impl $trait<&Dec> for &Dec {
            type Output = Dec;
            fn $method(self, $rhs: &Dec) -> Dec {
                let $lhs = self;
                $body
            }
        }

        impl $trait<Dec> for Dec {
            type Output = Dec;
            fn $method(self, rhs: Dec) -> Dec {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Dec> for Dec {
            type Output = Dec;
            fn $method(self, rhs: &Dec) -> Dec {
                (&self).$method(rhs)
            }
        }

        impl $trait<Dec> for &Dec {
            type Output = Dec;
            fn $method(self, rhs: Dec) -> Dec {
                self.$method(&rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, |lhs, rhs| Dec(&lhs.0 + &rhs.0));
impl_binary_op!(Sub, sub, |lhs, rhs| Dec(&lhs.0 - &rhs.0));
impl_binary_op!(Mul, mul, |lhs, rhs| lhs.mul_raw(rhs));

impl Neg for Dec {
    type Output = Dec;
    fn neg(self) -> Dec {
        Dec(-self.0)
    }
}

impl Neg for &Dec {
    type Output = Dec;
    fn neg(self) -> Dec {
        Dec(-&self.0)
    }
}

impl Sum for Dec {
    fn sum<I: Iterator<Item = Dec>>(iter: I) -> Self {
        iter.fold(Dec::zero(), |acc, value| acc + value)
    }
}

impl<'a> Sum<&'a Dec> for Dec {
    fn sum<I: Iterator<Item = &'a Dec>>(iter: I) -> Self {
        iter.fold(Dec::zero(), |acc, value| acc + value)
    }
}

// ---------------------------------------------------------------------------
// Text form
// ---------------------------------------------------------------------------

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let multiplier = precision_multiplier();
        let magnitude = self.0.abs();
        let integer = &magnitude / &multiplier;
        let fraction = &magnitude % &multiplier;
        let sign = if self.0.is_negative() { "-" } else { "" };
        write!(
            f,
            "{sign}{integer}.{fraction:0>width$}",
            fraction = fraction.to_string(),
            width = PRECISION as usize
        )
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

impl FromStr for Dec {
    type Err = DecError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || DecError::InvalidFormat {
            input: input.to_string(),
        };

        let (negative, unsigned) = match input.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        let (integer, fraction) = match unsigned.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (unsigned, ""),
        };
        if integer.is_empty() || !integer.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if unsigned.contains('.') && fraction.is_empty() {
            return Err(invalid());
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > PRECISION as usize {
            return Err(DecError::TooManyFractionalDigits {
                input: input.to_string(),
                digits: fraction.len(),
                max: PRECISION,
            });
        }

        let digits = format!("{integer}{fraction:0<width$}", width = PRECISION as usize);
        let raw = BigInt::from_str(&digits).map_err(|_| invalid())?;
        Ok(Dec(if negative { -raw } else { raw }))
    }
}

// ---------------------------------------------------------------------------
// Encodings
// ---------------------------------------------------------------------------

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as Deserialize>::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Borsh form: the scaled integer as signed little-endian bytes.
impl BorshSerialize for Dec {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        BorshSerialize::serialize(&self.0.to_signed_bytes_le(), writer)
    }
}

impl BorshDeserialize for Dec {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let bytes: Vec<u8> = BorshDeserialize::deserialize_reader(reader)?;
        Ok(Dec(BigInt::from_signed_bytes_le(&bytes)))
    }
}
