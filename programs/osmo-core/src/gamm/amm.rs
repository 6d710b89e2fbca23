//! Weighted constant-function invariant and every quantity derived from it.
//!
//! All functions work on [`PreciseDec`]. Weights passed as `normalized_weight`
//! are an asset's share of the pool's total weight; share-side weights are 1.
//! Rounding to integers happens in the caller, toward the pool.

use crate::{
    error::{Error, Result},
    math::{pow, PreciseDec, SignedDec},
};

/// `bal_unknown_before * (1 - (bal_fixed_before / bal_fixed_after) ^ (weight_fixed / weight_unknown))`
///
/// Positive when the unknown side must pay out, negative when it must be paid in.
///
/// # Panics
/// When `token_weight_unknown` is zero. Pool weights are validated positive
/// before they reach the store.
pub fn solve_constant_function_invariant(
    token_balance_fixed_before: PreciseDec,
    token_balance_fixed_after: PreciseDec,
    token_weight_fixed: PreciseDec,
    token_balance_unknown_before: PreciseDec,
    token_weight_unknown: PreciseDec,
) -> Result<SignedDec> {
    assert!(
        !token_weight_unknown.is_zero(),
        "solve_constant_function_invariant: unknown token weight is zero"
    );

    let weight_ratio = token_weight_fixed.checked_div(token_weight_unknown)?;
    let y = token_balance_fixed_before.checked_div(token_balance_fixed_after)?;
    let y_to_weight_ratio = pow(y, weight_ratio)?;

    let (paren, negative) = PreciseDec::one().abs_diff_with_sign(y_to_weight_ratio);
    let amount = token_balance_unknown_before.checked_mul(paren)?;
    Ok(SignedDec::new(amount, negative))
}

/// `(balance_in / weight_in) / (balance_out / weight_out)`, unrounded.
pub fn calc_spot_price(
    token_balance_in: PreciseDec,
    token_weight_in: PreciseDec,
    token_balance_out: PreciseDec,
    token_weight_out: PreciseDec,
) -> Result<PreciseDec> {
    let number = token_balance_in.checked_div(token_weight_in)?;
    let denom = token_balance_out.checked_div(token_weight_out)?;
    number.checked_div(denom)
}

/// Spot price scaled up by `1 / (1 - swap_fee)`.
pub fn calc_spot_price_with_swap_fee(
    token_balance_in: PreciseDec,
    token_weight_in: PreciseDec,
    token_balance_out: PreciseDec,
    token_weight_out: PreciseDec,
    swap_fee: PreciseDec,
) -> Result<PreciseDec> {
    let spot_price = calc_spot_price(token_balance_in, token_weight_in, token_balance_out, token_weight_out)?;
    let scale = PreciseDec::one().checked_div(PreciseDec::one().checked_sub(swap_fee)?)?;
    spot_price.checked_mul(scale)
}

/// Tokens out for `token_amount_in` after the swap fee is taken from the input.
///
/// * `token_balance_in`  – pool balance of the input denom
/// * `token_weight_in`   – weight of the input denom
/// * `token_balance_out` – pool balance of the output denom
/// * `token_weight_out`  – weight of the output denom
/// * `token_amount_in`   – amount the trader sells
/// * `swap_fee`          – pool swap fee in `[0, 1)`
pub fn calc_out_given_in(
    token_balance_in: PreciseDec,
    token_weight_in: PreciseDec,
    token_balance_out: PreciseDec,
    token_weight_out: PreciseDec,
    token_amount_in: PreciseDec,
    swap_fee: PreciseDec,
) -> Result<PreciseDec> {
    let in_after_fee = token_amount_in.checked_mul(PreciseDec::one().checked_sub(swap_fee)?)?;
    let out = solve_constant_function_invariant(
        token_balance_in,
        token_balance_in.checked_add(in_after_fee)?,
        token_weight_in,
        token_balance_out,
        token_weight_out,
    )?;
    out.positive()
        .ok_or_else(|| Error::InvalidMathApprox("token amount out must be positive".into()))
}

/// Tokens in required to receive `token_amount_out`, fee included.
pub fn calc_in_given_out(
    token_balance_in: PreciseDec,
    token_weight_in: PreciseDec,
    token_balance_out: PreciseDec,
    token_weight_out: PreciseDec,
    token_amount_out: PreciseDec,
    swap_fee: PreciseDec,
) -> Result<PreciseDec> {
    let out_after = token_balance_out
        .checked_sub(token_amount_out)
        .map_err(|_| Error::InvalidMathApprox("token amount out exceeds pool balance".into()))?;
    let token_in = solve_constant_function_invariant(
        token_balance_out,
        out_after,
        token_weight_out,
        token_balance_in,
        token_weight_in,
    )?
    .neg();
    let before_fee = token_in
        .positive()
        .ok_or_else(|| Error::InvalidMathApprox("token amount in must be positive".into()))?;
    before_fee.checked_div(PreciseDec::one().checked_sub(swap_fee)?)
}

/// Share of the swap fee charged on a single-sided deposit or withdrawal:
/// only the portion that does not mirror the pool composition pays.
fn fee_ratio(normalized_weight: PreciseDec, swap_fee: PreciseDec) -> Result<PreciseDec> {
    let charged = PreciseDec::one()
        .checked_sub(normalized_weight)?
        .checked_mul(swap_fee)?;
    PreciseDec::one().checked_sub(charged)
}

/// Shares minted for a single-asset deposit of `token_amount_in`.
pub fn calc_pool_out_given_single_in(
    token_balance_in: PreciseDec,
    normalized_token_weight_in: PreciseDec,
    pool_supply: PreciseDec,
    token_amount_in: PreciseDec,
    swap_fee: PreciseDec,
) -> Result<PreciseDec> {
    let in_after_fee = token_amount_in.checked_mul(fee_ratio(normalized_token_weight_in, swap_fee)?)?;
    let shares = solve_constant_function_invariant(
        token_balance_in.checked_add(in_after_fee)?,
        token_balance_in,
        normalized_token_weight_in,
        pool_supply,
        PreciseDec::one(),
    )?
    .neg();
    Ok(shares.positive().unwrap_or_default())
}

/// Tokens a single-asset depositor must pay to receive `pool_amount_out` shares.
pub fn calc_single_in_given_pool_out(
    token_balance_in: PreciseDec,
    normalized_token_weight_in: PreciseDec,
    pool_supply: PreciseDec,
    pool_amount_out: PreciseDec,
    swap_fee: PreciseDec,
) -> Result<PreciseDec> {
    let token_in = solve_constant_function_invariant(
        pool_supply.checked_add(pool_amount_out)?,
        pool_supply,
        PreciseDec::one(),
        token_balance_in,
        normalized_token_weight_in,
    )?
    .neg();
    let before_fee = token_in.positive().unwrap_or_default();
    before_fee.checked_div(fee_ratio(normalized_token_weight_in, swap_fee)?)
}

/// Tokens paid out for burning `pool_amount_in` shares into one asset.
pub fn calc_single_out_given_pool_in(
    token_balance_out: PreciseDec,
    normalized_token_weight_out: PreciseDec,
    pool_supply: PreciseDec,
    pool_amount_in: PreciseDec,
    swap_fee: PreciseDec,
    exit_fee: PreciseDec,
) -> Result<PreciseDec> {
    let pool_in_after_exit_fee = pool_amount_in.checked_mul(PreciseDec::one().checked_sub(exit_fee)?)?;
    let supply_after = pool_supply
        .checked_sub(pool_in_after_exit_fee)
        .map_err(|_| Error::InvalidMathApprox("shares in exceed pool supply".into()))?;
    let token_out = solve_constant_function_invariant(
        pool_supply,
        supply_after,
        PreciseDec::one(),
        token_balance_out,
        normalized_token_weight_out,
    )?;
    let token_out = token_out.positive().unwrap_or_default();
    token_out.checked_mul(fee_ratio(normalized_token_weight_out, swap_fee)?)
}

/// Shares that must be burned to withdraw exactly `token_amount_out` of one asset.
pub fn calc_pool_in_given_single_out(
    token_balance_out: PreciseDec,
    normalized_token_weight_out: PreciseDec,
    pool_supply: PreciseDec,
    token_amount_out: PreciseDec,
    swap_fee: PreciseDec,
    exit_fee: PreciseDec,
) -> Result<PreciseDec> {
    let out_before_fee = token_amount_out.checked_div(fee_ratio(normalized_token_weight_out, swap_fee)?)?;
    let balance_after = token_balance_out
        .checked_sub(out_before_fee)
        .map_err(|_| Error::InvalidMathApprox("token amount out exceeds pool balance".into()))?;
    let shares_in = solve_constant_function_invariant(
        balance_after,
        token_balance_out,
        normalized_token_weight_out,
        pool_supply,
        PreciseDec::one(),
    )?;
    let shares_in = shares_in.positive().unwrap_or_default();
    shares_in.checked_div(PreciseDec::one().checked_sub(exit_fee)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> PreciseDec {
        s.parse().unwrap()
    }

    fn assert_within(expected: &str, actual: PreciseDec, tolerance: &str) {
        let (diff, _) = dec(expected).abs_diff_with_sign(actual);
        assert!(diff <= dec(tolerance), "expected {expected}, got {actual} (tolerance {tolerance})");
    }

    #[test]
    fn spot_price() {
        let s = calc_spot_price(dec("100"), dec("0.1"), dec("200"), dec("0.3")).unwrap();
        assert_within("1.5", s, "0.00000001");
    }

    #[test]
    fn spot_price_with_swap_fee() {
        let s = calc_spot_price_with_swap_fee(dec("100"), dec("0.1"), dec("200"), dec("0.3"), dec("0.01"))
            .unwrap();
        assert_within("1.51515151", s, "0.00000001");
    }

    #[test]
    fn out_given_in() {
        let s = calc_out_given_in(dec("100"), dec("0.1"), dec("200"), dec("0.3"), dec("40"), dec("0.01"))
            .unwrap();
        assert_within("21.0487006", s, "0.0001");
    }

    #[test]
    fn in_given_out() {
        let s = calc_in_given_out(dec("100"), dec("0.1"), dec("200"), dec("0.3"), dec("70"), dec("0.01"))
            .unwrap();
        assert_within("266.8009177", s, "0.0000001");
    }

    #[test]
    fn pool_out_given_single_in() {
        let s = calc_pool_out_given_single_in(dec("100"), dec("0.2"), dec("300"), dec("40"), dec("0.15"))
            .unwrap();
        assert_within("18.6519592", s, "0.0001");
    }

    #[test]
    fn single_out_given_pool_in() {
        let s = calc_single_out_given_pool_in(
            dec("200"),
            dec("0.8"),
            dec("300"),
            dec("40"),
            dec("0.15"),
            PreciseDec::zero(),
        )
        .unwrap();
        assert_within("31.77534976", s, "0.0001");
    }

    #[test]
    fn pool_in_given_single_out() {
        let s = calc_pool_in_given_single_out(
            dec("200"),
            dec("0.8"),
            dec("300"),
            dec("70"),
            dec("0.15"),
            PreciseDec::zero(),
        )
        .unwrap();
        assert_within("90.29092777", s, "0.0001");
    }

    #[test]
    fn single_in_given_pool_out_inverts_pool_out() {
        // Paying the quoted tokens back in must mint at least the requested shares.
        let token_in = calc_single_in_given_pool_out(dec("100"), dec("0.2"), dec("300"), dec("10"), dec("0.15"))
            .unwrap();
        let shares = calc_pool_out_given_single_in(dec("100"), dec("0.2"), dec("300"), token_in, dec("0.15"))
            .unwrap();
        assert_within("10", shares, "0.000001");
    }

    #[test]
    fn higher_fee_gives_less_out() {
        let low = calc_out_given_in(dec("100"), dec("0.5"), dec("100"), dec("0.5"), dec("10"), dec("0.01")).unwrap();
        let high = calc_out_given_in(dec("100"), dec("0.5"), dec("100"), dec("0.5"), dec("10"), dec("0.99")).unwrap();
        assert!(low > high);
    }

    #[test]
    fn literal_single_asset_join() {
        let shares = calc_pool_out_given_single_in(
            dec("1000000000000"),
            dec("0.5"),
            dec("100000000000000000000"),
            dec("50000"),
            PreciseDec::zero(),
        )
        .unwrap();
        assert_eq!(shares.to_uint_floor().unwrap().to_string(), "2499999968750");
    }

    #[test]
    #[should_panic(expected = "unknown token weight is zero")]
    fn zero_unknown_weight_panics() {
        let _ = solve_constant_function_invariant(dec("1"), dec("1"), dec("1"), dec("1"), PreciseDec::zero());
    }

    #[test]
    fn pow_base_out_of_range_surfaces() {
        // Withdrawing more than half the output side pushes the base past 2.
        let err = calc_in_given_out(dec("100"), dec("0.5"), dec("100"), dec("0.5"), dec("60"), dec("0")).unwrap_err();
        assert!(matches!(err, Error::PowBaseOutOfRange));
    }
}
