//! Balancer pool record: the sorted asset ledger, the weight schedule and the
//! pool-level join / exit / swap calculations.
//!
//! Methods named `calc_*` never mutate; the others update the in-memory pool
//! and leave persistence and bank transfers to the keeper.

use cosmwasm_std::{Decimal256, Timestamp, Uint256};
use serde::{Deserialize, Serialize};

use super::{
    amm,
    params::PoolParams,
    pool_asset::{
        ensure_denoms_in_pool, get_pool_assets_by_denom, pool_assets_coins, sort_pool_assets_by_denom,
        validate_user_specified_weight, PoolAsset,
    },
};
use crate::{
    address::pool_address,
    coins::{Coin, Coins},
    constants::{GUARANTEED_WEIGHT_PRECISION, SPOT_PRICE_SIG_FIGS},
    error::{Error, Result},
    math::PreciseDec,
};

/// LP share denom of pool `pool_id`.
pub fn pool_share_denom(pool_id: u64) -> String {
    format!("gamm/pool/{pool_id}")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: u64,
    /// Account holding the pool's liquidity.
    pub address: String,
    pub pool_params: PoolParams,
    #[serde(default)]
    pub future_pool_governor: String,
    /// Outstanding LP shares; the denom is `gamm/pool/<id>`.
    pub total_shares: Coin,
    /// Sorted by denom, no duplicates, every balance positive.
    pub pool_assets: Vec<PoolAsset>,
    /// Sum of `pool_assets[i].weight`.
    pub total_weight: Uint256,
}

impl Pool {
    /// Builds a pool from user-specified weights (scaled by 2^30 here) and
    /// validates its params. A schedule with a zero start time starts at
    /// `block_time`.
    pub fn new(
        pool_id: u64,
        pool_params: PoolParams,
        assets: Vec<PoolAsset>,
        future_governor: &str,
        block_time: Timestamp,
    ) -> Result<Self> {
        let mut pool = Pool {
            id: pool_id,
            address: pool_address(pool_id),
            pool_params: PoolParams::default(),
            future_pool_governor: future_governor.to_string(),
            total_shares: Coin::from_uint(Uint256::zero(), pool_share_denom(pool_id)),
            pool_assets: Vec::new(),
            total_weight: Uint256::zero(),
        };

        pool.set_initial_pool_assets(assets)?;
        pool_params.validate(&pool.pool_assets)?;
        pool.set_initial_pool_params(pool_params, block_time)?;
        Ok(pool)
    }

    fn set_initial_pool_assets(&mut self, assets: Vec<PoolAsset>) -> Result<()> {
        let mut scaled: Vec<PoolAsset> = Vec::with_capacity(assets.len());
        let mut total_weight = self.total_weight;

        for mut asset in assets {
            if asset.token.amount.is_zero() {
                return Err(Error::NonPositiveBalance(asset.token.denom));
            }
            validate_user_specified_weight(asset.weight)?;
            if scaled.iter().any(|a: &PoolAsset| a.token.denom == asset.token.denom) {
                return Err(Error::DuplicatePoolAsset(asset.token.denom));
            }
            asset.weight = asset.weight.checked_mul(Uint256::from(GUARANTEED_WEIGHT_PRECISION))?;
            total_weight = total_weight.checked_add(asset.weight)?;
            scaled.push(asset);
        }

        self.pool_assets.extend(scaled);
        sort_pool_assets_by_denom(&mut self.pool_assets);
        self.total_weight = total_weight;
        Ok(())
    }

    fn set_initial_pool_params(&mut self, mut params: PoolParams, block_time: Timestamp) -> Result<()> {
        if let Some(schedule) = params.smooth_weight_change_params.as_mut() {
            schedule.initial_pool_weights = self
                .pool_assets
                .iter()
                .map(|a| PoolAsset {
                    token: Coin::from_uint(Uint256::zero(), a.token.denom.clone()),
                    weight: a.weight,
                })
                .collect();

            sort_pool_assets_by_denom(&mut schedule.target_pool_weights);
            for target in schedule.target_pool_weights.iter_mut() {
                validate_user_specified_weight(target.weight)?;
                target.weight = target.weight.checked_mul(Uint256::from(GUARANTEED_WEIGHT_PRECISION))?;
            }

            if schedule.start_time.seconds() == 0 {
                schedule.start_time = Timestamp::from_seconds(block_time.seconds());
            }
        }
        self.pool_params = params;
        Ok(())
    }

    // ─── Shares ──────────────────────────────────────────────────────────────

    pub fn total_shares_amount(&self) -> Uint256 {
        self.total_shares.amount
    }

    pub fn add_total_shares(&mut self, amount: Uint256) -> Result<()> {
        self.total_shares.amount = self.total_shares.amount.checked_add(amount)?;
        Ok(())
    }

    pub fn sub_total_shares(&mut self, amount: Uint256) -> Result<()> {
        self.total_shares.amount = self.total_shares.amount.checked_sub(amount)?;
        Ok(())
    }

    // ─── Asset ledger ────────────────────────────────────────────────────────

    fn pool_asset_index(&self, denom: &str) -> Result<usize> {
        if denom.is_empty() {
            return Err(Error::EmptyDenom);
        }
        self.pool_assets
            .binary_search_by(|a| a.token.denom.as_str().cmp(denom))
            .map_err(|_| Error::PoolAssetNotFound(denom.to_string()))
    }

    pub fn get_pool_asset(&self, denom: &str) -> Result<PoolAsset> {
        Ok(self.pool_assets[self.pool_asset_index(denom)?].clone())
    }

    pub fn get_pool_assets(&self, denoms: &[&str]) -> Result<Vec<PoolAsset>> {
        denoms.iter().map(|d| self.get_pool_asset(d)).collect()
    }

    pub fn get_all_pool_assets(&self) -> Vec<PoolAsset> {
        self.pool_assets.clone()
    }

    pub fn num_assets(&self) -> usize {
        self.pool_assets.len()
    }

    pub fn total_pool_liquidity(&self) -> Result<Coins> {
        pool_assets_coins(&self.pool_assets)
    }

    pub fn token_weight(&self, denom: &str) -> Result<Uint256> {
        Ok(self.get_pool_asset(denom)?.weight)
    }

    pub fn token_balance(&self, denom: &str) -> Result<Uint256> {
        Ok(self.get_pool_asset(denom)?.token.amount)
    }

    /// Replaces (does not add to) the balance of `coin.denom`.
    pub fn update_pool_asset_balance(&mut self, coin: &Coin) -> Result<()> {
        let index = self.pool_asset_index(&coin.denom)?;
        if coin.amount.is_zero() {
            return Err(Error::NonPositiveBalance(coin.denom.clone()));
        }
        self.pool_assets[index].token.amount = coin.amount;
        Ok(())
    }

    /// Replaces several balances; all of them are checked before any is written.
    pub fn update_pool_asset_balances(&mut self, coins: &Coins) -> Result<()> {
        coins.validate()?;
        let mut indexes = Vec::with_capacity(coins.len());
        for coin in coins {
            indexes.push(self.pool_asset_index(&coin.denom)?);
        }
        for (index, coin) in indexes.into_iter().zip(coins) {
            self.pool_assets[index].token.amount = coin.amount;
        }
        Ok(())
    }

    fn add_to_pool_asset_balances(&mut self, coins: &Coins) -> Result<()> {
        let mut updated = Vec::with_capacity(coins.len());
        for coin in coins {
            let balance = self.token_balance(&coin.denom)?;
            updated.push(Coin::from_uint(balance.checked_add(coin.amount)?, coin.denom.clone()));
        }
        self.update_pool_asset_balances(&Coins::new(updated)?)
    }

    /// Adds joined liquidity and the shares minted for it.
    pub fn increase_liquidity(&mut self, shares_out: Uint256, coins_in: &Coins) -> Result<()> {
        self.add_to_pool_asset_balances(coins_in)?;
        self.add_total_shares(shares_out)
    }

    // ─── Weights ─────────────────────────────────────────────────────────────

    fn normalized_weight(&self, asset: &PoolAsset) -> Result<PreciseDec> {
        if self.total_weight.is_zero() {
            return Err(Error::InvalidMathApprox("pool misconfigured, total weight = 0".into()));
        }
        PreciseDec::from_ratio(asset.weight, self.total_weight)
    }

    /// Overwrites every weight. `new_weights` must list the pool's denoms in
    /// order with positive weights.
    ///
    /// # Panics
    /// On any mismatch: the input is produced by the weight schedule, which is
    /// validated at pool creation.
    fn update_all_weights(&mut self, new_weights: &[PoolAsset]) {
        assert_eq!(
            self.pool_assets.len(),
            new_weights.len(),
            "update_all_weights: weight count does not match pool asset count"
        );
        let mut total_weight = Uint256::zero();
        for (asset, new) in self.pool_assets.iter_mut().zip(new_weights) {
            assert_eq!(
                asset.token.denom, new.token.denom,
                "update_all_weights: weight denom does not match pool asset"
            );
            assert!(new.validate_weight().is_ok(), "update_all_weights: non-positive weight for {}", new.token.denom);
            asset.weight = new.weight;
            total_weight += new.weight;
        }
        self.total_weight = total_weight;
    }

    /// Advances the weight schedule to `block_time`.
    ///
    /// Before the start nothing changes. Inside the window every weight is
    /// `initial + trunc(elapsed / duration * (target - initial))`. Once the
    /// window has passed the weights are pinned to the targets and the
    /// schedule is dropped.
    pub fn poke_token_weights(&mut self, block_time: Timestamp) {
        let Some(schedule) = self.pool_params.smooth_weight_change_params.clone() else {
            return;
        };

        if block_time <= schedule.start_time {
            return;
        }

        let elapsed_ms = (block_time.nanos() - schedule.start_time.nanos()) / 1_000_000;
        let duration_ms = schedule.duration.as_millis();
        let fraction = Decimal256::checked_from_ratio(elapsed_ms as u128, duration_ms)
            .unwrap_or_else(|_| Decimal256::one());

        if block_time > schedule.end_time() || fraction >= Decimal256::one() {
            self.update_all_weights(&schedule.target_pool_weights);
            self.pool_params.smooth_weight_change_params = None;
            return;
        }

        let fraction = PreciseDec::from_decimal256(fraction);
        let interpolated: Vec<PoolAsset> = schedule
            .initial_pool_weights
            .iter()
            .zip(&schedule.target_pool_weights)
            .map(|(initial, target)| {
                let weight = if target.weight >= initial.weight {
                    initial.weight + shift(fraction, target.weight - initial.weight)
                } else {
                    initial.weight - shift(fraction, initial.weight - target.weight)
                };
                PoolAsset { token: initial.token.clone(), weight }
            })
            .collect();
        self.update_all_weights(&interpolated);
    }

    // ─── Prices and swaps ────────────────────────────────────────────────────

    /// How many `quote` one `base` is worth, to 8 significant figures.
    pub fn spot_price(&self, quote: &str, base: &str) -> Result<Decimal256> {
        let quote = self.get_pool_asset(quote)?;
        let base = self.get_pool_asset(base)?;
        if base.weight.is_zero() || quote.weight.is_zero() {
            return Err(Error::InvalidMathApprox("pool is misconfigured, got 0 weight".into()));
        }
        let price = amm::calc_spot_price(
            PreciseDec::from_uint256(quote.token.amount),
            PreciseDec::from_uint256(quote.weight),
            PreciseDec::from_uint256(base.token.amount),
            PreciseDec::from_uint256(base.weight),
        )?;
        price.sig_fig_round(SPOT_PRICE_SIG_FIGS).to_decimal256_floor()
    }

    /// Unrounded spot price of `token_in` in units of `token_out`, fee included.
    pub fn spot_price_with_swap_fee(&self, token_in: &str, token_out: &str) -> Result<PreciseDec> {
        let asset_in = self.get_pool_asset(token_in)?;
        let asset_out = self.get_pool_asset(token_out)?;
        amm::calc_spot_price_with_swap_fee(
            PreciseDec::from_uint256(asset_in.token.amount),
            PreciseDec::from_uint256(asset_in.weight),
            PreciseDec::from_uint256(asset_out.token.amount),
            PreciseDec::from_uint256(asset_out.weight),
            PreciseDec::from_decimal256(self.pool_params.swap_fee),
        )
    }

    pub fn calc_out_amt_given_in(&self, token_in: &Coin, token_out_denom: &str) -> Result<Coin> {
        let asset_in = self.get_pool_asset(&token_in.denom)?;
        let asset_out = self.get_pool_asset(token_out_denom)?;
        let out = amm::calc_out_given_in(
            PreciseDec::from_uint256(asset_in.token.amount),
            PreciseDec::from_uint256(asset_in.weight),
            PreciseDec::from_uint256(asset_out.token.amount),
            PreciseDec::from_uint256(asset_out.weight),
            PreciseDec::from_uint256(token_in.amount),
            PreciseDec::from_decimal256(self.pool_params.swap_fee),
        )?;
        let amount = out.to_uint_floor()?;
        if amount.is_zero() {
            return Err(Error::InvalidMathApprox("token amount out is zero".into()));
        }
        Ok(Coin::from_uint(amount, token_out_denom))
    }

    /// Rounded up: the trader pays for any fractional unit.
    pub fn calc_in_amt_given_out(&self, token_out: &Coin, token_in_denom: &str) -> Result<Coin> {
        let asset_in = self.get_pool_asset(token_in_denom)?;
        let asset_out = self.get_pool_asset(&token_out.denom)?;
        let token_in = amm::calc_in_given_out(
            PreciseDec::from_uint256(asset_in.token.amount),
            PreciseDec::from_uint256(asset_in.weight),
            PreciseDec::from_uint256(asset_out.token.amount),
            PreciseDec::from_uint256(asset_out.weight),
            PreciseDec::from_uint256(token_out.amount),
            PreciseDec::from_decimal256(self.pool_params.swap_fee),
        )?;
        let amount = token_in.to_uint_ceil()?;
        if amount.is_zero() {
            return Err(Error::InvalidMathApprox("token amount in is zero".into()));
        }
        Ok(Coin::from_uint(amount, token_in_denom))
    }

    pub fn apply_swap(&mut self, token_in: &Coin, token_out: &Coin) -> Result<()> {
        let balance_in = self.token_balance(&token_in.denom)?.checked_add(token_in.amount)?;
        let balance_out = self
            .token_balance(&token_out.denom)?
            .checked_sub(token_out.amount)
            .map_err(|_| Error::InvalidMathApprox("swap drains the pool".into()))?;
        self.update_pool_asset_balances(&Coins::new(vec![
            Coin::from_uint(balance_in, token_in.denom.clone()),
            Coin::from_uint(balance_out, token_out.denom.clone()),
        ])?)
    }

    // ─── Joins ───────────────────────────────────────────────────────────────

    fn calc_single_asset_join(&self, token_in: &Coin, asset: &PoolAsset, total_shares: Uint256) -> Result<Uint256> {
        let shares = amm::calc_pool_out_given_single_in(
            PreciseDec::from_uint256(asset.token.amount),
            self.normalized_weight(asset)?,
            PreciseDec::from_uint256(total_shares),
            PreciseDec::from_uint256(token_in.amount),
            PreciseDec::from_decimal256(self.pool_params.swap_fee),
        )?;
        shares.to_uint_floor()
    }

    /// Joins at the pool's current ratio with as much of `tokens_in` as fits.
    /// Returns the shares minted and what is left over.
    fn maximal_exact_ratio_join(&self, tokens_in: &Coins) -> Result<(Uint256, Coins)> {
        let total_shares = self.total_shares_amount();
        let mut min_ratio: Option<PreciseDec> = None;
        let mut max_ratio = PreciseDec::zero();
        for coin in tokens_in {
            let ratio = PreciseDec::from_ratio(coin.amount, self.token_balance(&coin.denom)?)?;
            min_ratio = Some(min_ratio.map_or(ratio, |m| m.min(ratio)));
            max_ratio = max_ratio.max(ratio);
        }
        let min_ratio = min_ratio.ok_or_else(|| Error::InvalidCoins("no tokens to join".into()))?;

        let shares = min_ratio.checked_mul_uint(total_shares)?.to_uint_floor()?;
        if min_ratio == max_ratio {
            return Ok((shares, Coins::empty()));
        }

        let mut remaining = Vec::new();
        for coin in tokens_in {
            let used = min_ratio.checked_mul_uint(self.token_balance(&coin.denom)?)?.to_uint_ceil()?;
            let left = coin.amount.checked_sub(used)?;
            if !left.is_zero() {
                remaining.push(Coin::from_uint(left, coin.denom.clone()));
            }
        }
        Ok((shares, Coins::new(remaining)?))
    }

    /// Shares minted for `tokens_in` and the tokens actually taken.
    ///
    /// One denom is a single-asset join. All of the pool's denoms first join at
    /// the current ratio without fee, then each remainder is single-asset
    /// joined against the running share total.
    pub fn calc_join_pool_shares(&self, tokens_in: &Coins) -> Result<(Uint256, Coins)> {
        let mut by_denom = get_pool_assets_by_denom(&self.pool_assets)?;
        ensure_denoms_in_pool(&by_denom, tokens_in)?;

        let total_shares = self.total_shares_amount();
        if tokens_in.len() == 1 {
            let token = &tokens_in.as_slice()[0];
            let shares = self.calc_single_asset_join(token, &by_denom[&token.denom], total_shares)?;
            return Ok((shares, tokens_in.clone()));
        }
        if tokens_in.len() != self.num_assets() {
            return Err(Error::InvalidJoinAssetCount);
        }

        let (mut shares, remaining) = self.maximal_exact_ratio_join(tokens_in)?;
        let mut joined = tokens_in.checked_sub(&remaining)?;
        if !joined.is_all_lte(tokens_in) {
            return Err(Error::InvalidMathApprox("more coins joined than tokens passed in".into()));
        }
        if remaining.is_empty() {
            return Ok((shares, joined));
        }

        // Shadow liquidity: the pool itself is untouched.
        for coin in &joined {
            if let Some(asset) = by_denom.get_mut(&coin.denom) {
                asset.token.amount = asset.token.amount.checked_add(coin.amount)?;
            }
        }
        let mut running_total = total_shares.checked_add(shares)?;
        for coin in &remaining {
            let asset = by_denom[&coin.denom].clone();
            let new_shares = self.calc_single_asset_join(coin, &asset, running_total)?;
            if let Some(asset) = by_denom.get_mut(&coin.denom) {
                asset.token.amount = asset.token.amount.checked_add(coin.amount)?;
            }
            running_total = running_total.checked_add(new_shares)?;
            shares = shares.checked_add(new_shares)?;
        }
        joined = joined.checked_add(&remaining)?;

        if !joined.is_all_lte(tokens_in) {
            return Err(Error::InvalidMathApprox("more coins joined than tokens passed in".into()));
        }
        Ok((shares, joined))
    }

    pub fn join_pool(&mut self, tokens_in: &Coins) -> Result<Uint256> {
        let (shares, joined) = self.calc_join_pool_shares(tokens_in)?;
        self.increase_liquidity(shares, &joined)?;
        Ok(shares)
    }

    /// Tokens of `denom` to pay for exactly `share_out` shares, rounded up.
    pub fn calc_token_in_share_amount_out(&self, denom: &str, share_out: Uint256) -> Result<Uint256> {
        let asset = self.get_pool_asset(denom)?;
        let token_in = amm::calc_single_in_given_pool_out(
            PreciseDec::from_uint256(asset.token.amount),
            self.normalized_weight(&asset)?,
            PreciseDec::from_uint256(self.total_shares_amount()),
            PreciseDec::from_uint256(share_out),
            PreciseDec::from_decimal256(self.pool_params.swap_fee),
        )?;
        let amount = token_in.to_uint_ceil()?;
        if amount.is_zero() {
            return Err(Error::InvalidMathApprox("token amount in is zero".into()));
        }
        Ok(amount)
    }

    // ─── Exits ───────────────────────────────────────────────────────────────

    /// `balance * (exiting_shares * (1 - exit_fee) / total_shares)` per asset,
    /// rounded down.
    pub fn calc_exit_pool_coins_from_shares(&self, exiting_shares: Uint256, exit_fee: Decimal256) -> Result<Coins> {
        let total_shares = self.total_shares_amount();
        if exiting_shares >= total_shares {
            return Err(Error::LimitMaxAmount {
                denom: self.total_shares.denom.clone(),
                amount: exiting_shares,
                max: total_shares,
            });
        }

        let refunded = PreciseDec::from_uint256(exiting_shares)
            .checked_mul(PreciseDec::one().checked_sub(PreciseDec::from_decimal256(exit_fee))?)?;
        let share_out_ratio = refunded.checked_div(PreciseDec::from_uint256(total_shares))?;
        if share_out_ratio.is_zero() {
            return Err(Error::InvalidMathApprox("share ratio is zero".into()));
        }

        let mut exited = Vec::with_capacity(self.num_assets());
        for asset in &self.pool_assets {
            let amount = share_out_ratio.checked_mul_uint(asset.token.amount)?.to_uint_floor()?;
            if amount.is_zero() {
                continue;
            }
            if amount >= asset.token.amount {
                return Err(Error::InvalidMathApprox("too many shares out".into()));
            }
            exited.push(Coin::from_uint(amount, asset.token.denom.clone()));
        }
        Coins::new(exited)
    }

    pub fn exit_pool(&mut self, exiting_shares: Uint256, exit_fee: Decimal256) -> Result<Coins> {
        let exited = self.calc_exit_pool_coins_from_shares(exiting_shares, exit_fee)?;
        self.apply_exit(&exited, exiting_shares)?;
        Ok(exited)
    }

    /// Removes `exiting_coins` from the ledger and `exiting_shares` from the supply.
    pub fn apply_exit(&mut self, exiting_coins: &Coins, exiting_shares: Uint256) -> Result<()> {
        let mut balances = Vec::with_capacity(exiting_coins.len());
        for coin in exiting_coins {
            let balance = self
                .token_balance(&coin.denom)?
                .checked_sub(coin.amount)
                .map_err(|_| Error::InvalidMathApprox("exit exceeds pool balance".into()))?;
            balances.push(Coin::from_uint(balance, coin.denom.clone()));
        }
        self.update_pool_asset_balances(&Coins::from_sorted_unchecked(balances))?;
        self.sub_total_shares(exiting_shares)
    }

    /// Tokens of `denom` paid out for burning `share_in` shares, rounded down.
    pub fn calc_single_out_given_pool_in(&self, denom: &str, share_in: Uint256) -> Result<Uint256> {
        let asset = self.get_pool_asset(denom)?;
        let token_out = amm::calc_single_out_given_pool_in(
            PreciseDec::from_uint256(asset.token.amount),
            self.normalized_weight(&asset)?,
            PreciseDec::from_uint256(self.total_shares_amount()),
            PreciseDec::from_uint256(share_in),
            PreciseDec::from_decimal256(self.pool_params.swap_fee),
            PreciseDec::from_decimal256(self.pool_params.exit_fee),
        )?;
        let amount = token_out.to_uint_floor()?;
        if amount.is_zero() {
            return Err(Error::InvalidMathApprox("token amount out is zero".into()));
        }
        Ok(amount)
    }

    /// Shares to burn for exactly `token_out`, rounded up.
    pub fn calc_pool_in_given_single_out(&self, token_out: &Coin) -> Result<Uint256> {
        let asset = self.get_pool_asset(&token_out.denom)?;
        let shares_in = amm::calc_pool_in_given_single_out(
            PreciseDec::from_uint256(asset.token.amount),
            self.normalized_weight(&asset)?,
            PreciseDec::from_uint256(self.total_shares_amount()),
            PreciseDec::from_uint256(token_out.amount),
            PreciseDec::from_decimal256(self.pool_params.swap_fee),
            PreciseDec::from_decimal256(self.pool_params.exit_fee),
        )?;
        let amount = shares_in.to_uint_ceil()?;
        if amount.is_zero() {
            return Err(Error::InvalidMathApprox("share amount in is zero".into()));
        }
        Ok(amount)
    }
}

/// `trunc(fraction * delta)` with `fraction ∈ [0, 1)`, which cannot exceed `delta`.
fn shift(fraction: PreciseDec, delta: Uint256) -> Uint256 {
    fraction
        .checked_mul_uint(delta)
        .and_then(PreciseDec::to_uint_floor)
        .map(|s| s.min(delta))
        .unwrap_or(delta)
}
