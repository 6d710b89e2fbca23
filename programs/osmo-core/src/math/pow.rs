use super::precise::PreciseDec;
use crate::{
    constants::POW_PRECISION_ATOMICS,
    error::{Error, Result},
};
use cosmwasm_std::Uint512;

/// Series terms are summed at most this many times before giving up.
const MAX_APPROX_ITERATIONS: u64 = 300;

pub fn pow_precision() -> PreciseDec {
    PreciseDec::from_atomics(Uint512::from(POW_PRECISION_ATOMICS))
}

/// `base ^ exp` for `base ∈ (0, 2)`.
///
/// The integer part of `exp` is computed exactly by repeated squaring; the
/// fractional part by [`pow_approx`].
pub fn pow(base: PreciseDec, exp: PreciseDec) -> Result<PreciseDec> {
    let two = PreciseDec::from_u128(2);
    if base.is_zero() || base >= two {
        return Err(Error::PowBaseOutOfRange);
    }

    let integer = exp.trunc();
    let fractional = exp.checked_sub(integer)?;

    let integer_pow = base.checked_powi(integer.trunc_u64()?)?;
    if fractional.is_zero() {
        return Ok(integer_pow);
    }

    let fractional_pow = pow_approx(base, fractional, pow_precision())?;
    integer_pow.checked_mul(fractional_pow)
}

/// Binomial series for `(1 + x) ^ a` with `x = base - 1`, `a ∈ [0, 1)`:
///
/// ```text
/// term_0 = 1
/// term_k = term_{k-1} * (a - (k - 1)) * x / k
/// ```
///
/// Summation stops once a term falls below `precision`. Signs are tracked
/// separately since both `x` and `a - (k - 1)` can be negative.
pub fn pow_approx(base: PreciseDec, exp: PreciseDec, precision: PreciseDec) -> Result<PreciseDec> {
    if exp.is_zero() {
        return Ok(PreciseDec::one());
    }

    let one = PreciseDec::one();
    let (x, x_neg) = base.abs_diff_with_sign(one);
    let mut term = one;
    let mut sum = one;
    let mut negative = false;

    let mut i: u64 = 1;
    while term >= precision {
        if i > MAX_APPROX_ITERATIONS {
            return Err(Error::InvalidMathApprox(format!(
                "pow_approx did not converge for base {base}, exp {exp}"
            )));
        }
        let big_k = PreciseDec::from_u128(i as u128);
        let (c, c_neg) = exp.abs_diff_with_sign(big_k.checked_sub(one)?);
        term = term.checked_mul(c.checked_mul(x)?)?.checked_div(big_k)?;

        if term.is_zero() {
            break;
        }
        if x_neg {
            negative = !negative;
        }
        if c_neg {
            negative = !negative;
        }
        sum = if negative {
            sum.checked_sub(term)?
        } else {
            sum.checked_add(term)?
        };
        i += 1;
    }
    Ok(sum)
}
