use std::{cmp::Ordering, fmt, str::FromStr};

use cosmwasm_std::{Decimal256, Uint128, Uint256, Uint512};

use crate::error::{Error, Result};

/// Number of fractional digits carried by [`PreciseDec`].
pub const PRECISION: u32 = 36;

// ─── PreciseDec ───────────────────────────────────────────────────────────────
// Unsigned fixed-point decimal with 36 fractional digits, stored as atomics in
// a Uint512 so the product of two pool-sized values never needs a wider type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct PreciseDec(Uint512);

fn ten_pow(exp: u32) -> Uint512 {
    Uint512::from(10u128).pow(exp)
}

fn fractional() -> Uint512 {
    ten_pow(PRECISION)
}

impl PreciseDec {
    pub fn zero() -> Self {
        PreciseDec(Uint512::zero())
    }

    pub fn one() -> Self {
        PreciseDec(fractional())
    }

    pub fn from_atomics(atomics: Uint512) -> Self {
        PreciseDec(atomics)
    }

    pub fn atomics(&self) -> Uint512 {
        self.0
    }

    pub fn from_u128(value: u128) -> Self {
        PreciseDec(Uint512::from(value) * fractional())
    }

    pub fn from_uint256(value: Uint256) -> Self {
        PreciseDec(Uint512::from(value) * fractional())
    }

    /// Lossless: 18 fractional digits are padded to 36.
    pub fn from_decimal256(value: Decimal256) -> Self {
        PreciseDec(Uint512::from(value.atomics()) * ten_pow(PRECISION - 18))
    }

    pub fn from_ratio(numerator: Uint256, denominator: Uint256) -> Result<Self> {
        PreciseDec::from_uint256(numerator).checked_div(PreciseDec::from_uint256(denominator))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Self) -> Result<Self> {
        Ok(PreciseDec(self.0.checked_add(other.0)?))
    }

    pub fn checked_sub(self, other: Self) -> Result<Self> {
        Ok(PreciseDec(self.0.checked_sub(other.0)?))
    }

    /// Truncating multiplication.
    pub fn checked_mul(self, other: Self) -> Result<Self> {
        let product = self.0.checked_mul(other.0)?;
        Ok(PreciseDec(product / fractional()))
    }

    /// Truncating division.
    pub fn checked_div(self, other: Self) -> Result<Self> {
        if other.is_zero() {
            return Err(Error::MathOverflow("division by zero"));
        }
        let scaled = self.0.checked_mul(fractional())?;
        Ok(PreciseDec(scaled / other.0))
    }

    pub fn checked_mul_uint(self, other: Uint256) -> Result<Self> {
        Ok(PreciseDec(self.0.checked_mul(Uint512::from(other))?))
    }

    pub fn checked_div_u64(self, other: u64) -> Result<Self> {
        Ok(PreciseDec(self.0.checked_div(Uint512::from(other))?))
    }

    /// Integer power by squaring.
    pub fn checked_powi(self, mut exp: u64) -> Result<Self> {
        let mut base = self;
        let mut acc = PreciseDec::one();
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc.checked_mul(base)?;
            }
            exp >>= 1;
            if exp > 0 {
                base = base.checked_mul(base)?;
            }
        }
        Ok(acc)
    }

    /// Integer part, truncated.
    pub fn trunc(self) -> Self {
        PreciseDec((self.0 / fractional()) * fractional())
    }

    pub fn trunc_u64(self) -> Result<u64> {
        let wide = Uint256::try_from(self.0 / fractional())?;
        let int = Uint128::try_from(wide)?;
        u64::try_from(int.u128()).map_err(|_| Error::MathOverflow("exponent"))
    }

    pub fn to_uint_floor(self) -> Result<Uint256> {
        Ok(Uint256::try_from(self.0 / fractional())?)
    }

    pub fn to_uint_ceil(self) -> Result<Uint256> {
        let frac = fractional();
        let mut int = self.0 / frac;
        if !(self.0 % frac).is_zero() {
            int = int.checked_add(Uint512::one())?;
        }
        Ok(Uint256::try_from(int)?)
    }

    /// Drops the 18 lowest fractional digits.
    pub fn to_decimal256_floor(self) -> Result<Decimal256> {
        let atomics = Uint256::try_from(self.0 / ten_pow(PRECISION - 18))?;
        Ok(Decimal256::from_atomics(atomics, 18)?)
    }

    /// Absolute difference and whether `self < other`.
    pub fn abs_diff_with_sign(self, other: Self) -> (Self, bool) {
        match self.cmp(&other) {
            Ordering::Less => (PreciseDec(other.0 - self.0), true),
            _ => (PreciseDec(self.0 - other.0), false),
        }
    }

    /// Rounds half-up to `sig_figs` significant digits.
    pub fn sig_fig_round(self, sig_figs: u32) -> Self {
        if self.is_zero() {
            return self;
        }
        let digits = self.0.to_string().len() as u32;
        if digits <= sig_figs {
            return self;
        }
        let scale = ten_pow(digits - sig_figs);
        let quotient = self.0 / scale;
        let remainder = self.0 % scale;
        let rounded = if remainder * Uint512::from(2u128) >= scale {
            quotient + Uint512::one()
        } else {
            quotient
        };
        PreciseDec(rounded * scale)
    }
}

impl fmt::Display for PreciseDec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frac = fractional();
        let int = self.0 / frac;
        let rem = self.0 % frac;
        if rem.is_zero() {
            return write!(f, "{int}");
        }
        let digits = format!("{:0>width$}", rem.to_string(), width = PRECISION as usize);
        write!(f, "{int}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for PreciseDec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidCoins(format!("invalid decimal: {s}"));
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() || frac_part.len() > PRECISION as usize {
            return Err(invalid());
        }
        let int = Uint512::from_str(int_part).map_err(|_| invalid())?;
        let frac = if frac_part.is_empty() {
            Uint512::zero()
        } else {
            let padded = format!("{:0<width$}", frac_part, width = PRECISION as usize);
            Uint512::from_str(&padded).map_err(|_| invalid())?
        };
        Ok(PreciseDec(int.checked_mul(fractional())?.checked_add(frac)?))
    }
}

// ─── SignedDec ────────────────────────────────────────────────────────────────
// Magnitude plus sign, for the invariant solver whose result flips sign
// depending on which side of the pool is held fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignedDec {
    pub abs: PreciseDec,
    pub negative: bool,
}

impl SignedDec {
    pub fn new(abs: PreciseDec, negative: bool) -> Self {
        SignedDec { abs, negative: negative && !abs.is_zero() }
    }

    pub fn neg(self) -> Self {
        SignedDec::new(self.abs, !self.negative)
    }

    pub fn is_positive(&self) -> bool {
        !self.negative && !self.abs.is_zero()
    }

    /// The magnitude when strictly positive.
    pub fn positive(self) -> Option<PreciseDec> {
        self.is_positive().then_some(self.abs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> PreciseDec {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_displays() {
        assert_eq!(dec("1.5").to_string(), "1.5");
        assert_eq!(dec("42").to_string(), "42");
        assert_eq!(dec("0.000000000000000000000000000000000001").atomics(), Uint512::one());
        assert!("1.0000000000000000000000000000000000001".parse::<PreciseDec>().is_err());
        assert!(".5".parse::<PreciseDec>().is_err());
    }

    #[test]
    fn mul_and_div_truncate() {
        assert_eq!(dec("2").checked_div(dec("3")).unwrap().to_string(), "0.666666666666666666666666666666666666");
        assert_eq!(dec("1.5").checked_mul(dec("1.5")).unwrap(), dec("2.25"));
        assert!(dec("1").checked_div(PreciseDec::zero()).is_err());
    }

    #[test]
    fn floor_and_ceil() {
        assert_eq!(dec("7.2").to_uint_floor().unwrap(), Uint256::from(7u128));
        assert_eq!(dec("7.2").to_uint_ceil().unwrap(), Uint256::from(8u128));
        assert_eq!(dec("7").to_uint_ceil().unwrap(), Uint256::from(7u128));
    }

    #[test]
    fn sig_fig_rounding() {
        assert_eq!(dec("0.123456789").sig_fig_round(8), dec("0.12345679"));
        assert_eq!(dec("1234567890").sig_fig_round(8), dec("1234567900"));
        assert_eq!(dec("1.5").sig_fig_round(8), dec("1.5"));
    }

    #[test]
    fn decimal256_conversions() {
        let d = Decimal256::percent(15);
        assert_eq!(PreciseDec::from_decimal256(d), dec("0.15"));
        assert_eq!(dec("0.15").to_decimal256_floor().unwrap(), d);
    }

    #[test]
    fn signed_zero_is_not_negative() {
        let zero = SignedDec::new(PreciseDec::zero(), true);
        assert!(!zero.negative);
        assert_eq!(zero.positive(), None);
        assert_eq!(SignedDec::new(dec("1"), true).neg().positive(), Some(dec("1")));
    }
}
