//! Gamm keeper: persists pools, moves liquidity and LP shares through the
//! bank and enforces the caller's slippage bounds.
//!
//! Every mutating call loads the pool with its weights poked to the current
//! block time, computes the whole outcome in memory and only then writes
//! balances and the pool back. Callers run it inside a `CacheStore`, so an
//! error part-way through never reaches the parent store.

use cosmwasm_std::{Decimal256, Storage, Timestamp, Uint256};

use super::{
    governor::validate_future_governor,
    params::{Params, PoolParams},
    pool::{pool_share_denom, Pool},
    pool_asset::PoolAsset,
};
use crate::{
    bank::{BankKeeper, DenomUnit, Metadata},
    coins::{Coin, Coins},
    constants::{
        COMMUNITY_POOL_MODULE, GAMM_MODULE, GAMM_PARAMS_KEY, INIT_POOL_SHARES_SUPPLY, MAX_POOL_ASSETS,
        MAX_SPOT_PRICE, MIN_POOL_ASSETS, NEXT_POOL_ID_KEY, ONE_SHARE_EXPONENT, POOL_PREFIX,
        TOTAL_LIQUIDITY_PREFIX,
    },
    error::{Error, Result},
    math::PreciseDec,
    store::{self, denom_key, id_key, Context},
};

pub struct GammKeeper<B: BankKeeper> {
    bank: B,
}

impl<B: BankKeeper> GammKeeper<B> {
    pub fn new(bank: B) -> Self {
        GammKeeper { bank }
    }

    // ─── Params and counters ─────────────────────────────────────────────────

    pub fn get_params(&self, store: &dyn Storage) -> Result<Params> {
        Ok(store::load(store, GAMM_PARAMS_KEY)?.unwrap_or_default())
    }

    pub fn set_params(&self, store: &mut dyn Storage, params: &Params) -> Result<()> {
        params.validate()?;
        store::save(store, GAMM_PARAMS_KEY, params)
    }

    /// Pool ids start at 1.
    pub fn get_next_pool_id(&self, store: &dyn Storage) -> Result<u64> {
        Ok(store::load(store, NEXT_POOL_ID_KEY)?.unwrap_or(1))
    }

    pub fn set_next_pool_id(&self, store: &mut dyn Storage, pool_id: u64) -> Result<()> {
        store::save(store, NEXT_POOL_ID_KEY, &pool_id)
    }

    // ─── Pool storage ────────────────────────────────────────────────────────

    pub fn get_pool(&self, store: &dyn Storage, pool_id: u64) -> Result<Pool> {
        store::load(store, &id_key(POOL_PREFIX, pool_id))?.ok_or(Error::PoolNotFound(pool_id))
    }

    /// Loads the pool with its weights advanced to `block_time`. The poke is
    /// only persisted if the caller saves the pool.
    pub fn get_pool_and_poke(&self, store: &dyn Storage, pool_id: u64, block_time: Timestamp) -> Result<Pool> {
        let mut pool = self.get_pool(store, pool_id)?;
        pool.poke_token_weights(block_time);
        Ok(pool)
    }

    pub fn set_pool(&self, store: &mut dyn Storage, pool: &Pool) -> Result<()> {
        store::save(store, &id_key(POOL_PREFIX, pool.id), pool)
    }

    pub fn get_pools(&self, store: &dyn Storage) -> Result<Vec<Pool>> {
        store::load_prefix(store, &[POOL_PREFIX])
    }

    /// Advances and persists the weights of every pool with a live schedule.
    pub fn poke_all_pools(&self, ctx: &mut Context<'_>) -> Result<()> {
        for mut pool in self.get_pools(ctx.store)? {
            if pool.pool_params.smooth_weight_change_params.is_none() {
                continue;
            }
            pool.poke_token_weights(ctx.block.time);
            self.set_pool(ctx.store, &pool)?;
            tracing::debug!(pool_id = pool.id, total_weight = %pool.total_weight, "weights poked");
        }
        Ok(())
    }

    pub fn poke_pool(&self, ctx: &mut Context<'_>, pool_id: u64) -> Result<Pool> {
        let pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;
        self.set_pool(ctx.store, &pool)?;
        tracing::debug!(pool_id, total_weight = %pool.total_weight, "weights poked");
        Ok(pool)
    }

    // ─── Total liquidity ─────────────────────────────────────────────────────

    pub fn get_total_liquidity(&self, store: &dyn Storage) -> Result<Coins> {
        let prefix = [TOTAL_LIQUIDITY_PREFIX];
        let mut coins = Vec::new();
        for (key, value) in store::prefix_records(store, &prefix) {
            let denom = String::from_utf8(key[1..].to_vec())
                .map_err(|_| Error::InvalidDenom("non-utf8 liquidity key".into()))?;
            let amount: Uint256 = serde_json::from_slice(&value)?;
            coins.push(Coin::from_uint(amount, denom));
        }
        Ok(Coins::from_sorted_unchecked(coins))
    }

    pub fn set_total_liquidity(&self, store: &mut dyn Storage, coins: &Coins) -> Result<()> {
        for coin in coins {
            store::save(store, &denom_key(TOTAL_LIQUIDITY_PREFIX, &coin.denom), &coin.amount)?;
        }
        Ok(())
    }

    fn record_total_liquidity_increase(&self, store: &mut dyn Storage, coins: &Coins) -> Result<()> {
        for coin in coins {
            let key = denom_key(TOTAL_LIQUIDITY_PREFIX, &coin.denom);
            let current: Uint256 = store::load(store, &key)?.unwrap_or_default();
            store::save(store, &key, &current.checked_add(coin.amount)?)?;
        }
        Ok(())
    }

    fn record_total_liquidity_decrease(&self, store: &mut dyn Storage, coins: &Coins) -> Result<()> {
        for coin in coins {
            let key = denom_key(TOTAL_LIQUIDITY_PREFIX, &coin.denom);
            let current: Uint256 = store::load(store, &key)?.unwrap_or_default();
            let remaining = current.checked_sub(coin.amount)?;
            if remaining.is_zero() {
                store::remove(store, &key);
            } else {
                store::save(store, &key, &remaining)?;
            }
        }
        Ok(())
    }

    // ─── Share supply ────────────────────────────────────────────────────────

    fn mint_pool_shares_to_account(
        &self,
        store: &mut dyn Storage,
        pool: &mut Pool,
        to: &str,
        amount: Uint256,
    ) -> Result<()> {
        let shares = Coins::from(Coin::from_uint(amount, pool.total_shares.denom.clone()));
        self.bank.mint_coins(store, GAMM_MODULE, &shares)?;
        self.bank.send_coins_from_module_to_account(store, GAMM_MODULE, to, &shares)?;
        pool.add_total_shares(amount)
    }

    /// Burns `amount` shares held by `from`. The pool's share total is the
    /// caller's to update.
    fn burn_pool_shares_from_account(&self, store: &mut dyn Storage, pool: &Pool, from: &str, amount: Uint256) -> Result<()> {
        let shares = Coins::from(Coin::from_uint(amount, pool.total_shares.denom.clone()));
        self.bank.send_coins_from_account_to_module(store, from, GAMM_MODULE, &shares)?;
        self.bank.burn_coins(store, GAMM_MODULE, &shares)
    }

    fn set_share_denom_metadata(&self, store: &mut dyn Storage, pool_id: u64) -> Result<()> {
        let base = pool_share_denom(pool_id);
        let display = format!("GAMM-{pool_id}");
        let metadata = Metadata {
            description: format!("The share token of the gamm pool {pool_id}"),
            denom_units: vec![
                DenomUnit { denom: base.clone(), exponent: 0, aliases: vec!["attopoolshare".into()] },
                DenomUnit { denom: display.clone(), exponent: ONE_SHARE_EXPONENT, aliases: vec![] },
            ],
            base,
            display,
        };
        self.bank.set_denom_metadata(store, &metadata)
    }

    // ─── Pool creation ───────────────────────────────────────────────────────

    /// Creates a pool funded by `sender`, who receives the initial 100 × 10^18
    /// shares and pays the module's pool-creation fee.
    pub fn create_pool(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_params: PoolParams,
        pool_assets: Vec<PoolAsset>,
        future_pool_governor: &str,
    ) -> Result<u64> {
        crate::address::validate_address(sender)?;
        if pool_assets.len() < MIN_POOL_ASSETS {
            return Err(Error::TooFewPoolAssets { min: MIN_POOL_ASSETS });
        }
        if pool_assets.len() > MAX_POOL_ASSETS {
            return Err(Error::TooManyPoolAssets { got: pool_assets.len(), max: MAX_POOL_ASSETS });
        }
        validate_future_governor(future_pool_governor)?;

        let params = self.get_params(ctx.store)?;
        if !params.pool_creation_fee.is_empty() {
            self.bank.send_coins_from_account_to_module(
                ctx.store,
                sender,
                COMMUNITY_POOL_MODULE,
                &params.pool_creation_fee,
            )?;
        }

        let pool_id = self.get_next_pool_id(ctx.store)?;
        let mut pool = Pool::new(pool_id, pool_params, pool_assets, future_pool_governor, ctx.block.time)?;
        self.set_next_pool_id(ctx.store, pool_id + 1)?;

        let liquidity = pool.total_pool_liquidity()?;
        self.bank.send_coins(ctx.store, sender, &pool.address, &liquidity)?;
        self.mint_pool_shares_to_account(ctx.store, &mut pool, sender, Uint256::from(INIT_POOL_SHARES_SUPPLY))?;
        self.set_share_denom_metadata(ctx.store, pool_id)?;
        self.set_pool(ctx.store, &pool)?;
        self.record_total_liquidity_increase(ctx.store, &liquidity)?;

        tracing::info!(pool_id, %sender, %liquidity, "pool created");
        Ok(pool_id)
    }

    // ─── Joins ───────────────────────────────────────────────────────────────

    /// Mints exactly `share_out_amount` shares for a proportional deposit.
    /// `token_in_maxs` may bound any subset of the pool's denoms.
    pub fn join_pool(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_id: u64,
        share_out_amount: Uint256,
        token_in_maxs: &Coins,
    ) -> Result<Coins> {
        let mut pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;

        let share_ratio = PreciseDec::from_ratio(share_out_amount, pool.total_shares_amount())?;
        if share_ratio.is_zero() {
            return Err(Error::InvalidMathApprox("share ratio is zero".into()));
        }

        let mut tokens_in = Vec::with_capacity(pool.num_assets());
        for asset in &pool.pool_assets {
            let amount = share_ratio.checked_mul_uint(asset.token.amount)?.to_uint_floor()?;
            if amount.is_zero() {
                return Err(Error::InvalidMathApprox(format!("token {} amount in is zero", asset.token.denom)));
            }
            let max = token_in_maxs.amount_of(&asset.token.denom);
            if !max.is_zero() && amount > max {
                return Err(Error::LimitMaxAmount { denom: asset.token.denom.clone(), amount, max });
            }
            tokens_in.push(Coin::from_uint(amount, asset.token.denom.clone()));
        }
        for max in token_in_maxs {
            pool.get_pool_asset(&max.denom)?;
        }
        let tokens_in = Coins::new(tokens_in)?;

        pool.increase_liquidity(Uint256::zero(), &tokens_in)?;
        self.bank.send_coins(ctx.store, sender, &pool.address, &tokens_in)?;
        self.mint_pool_shares_to_account(ctx.store, &mut pool, sender, share_out_amount)?;
        self.set_pool(ctx.store, &pool)?;
        self.record_total_liquidity_increase(ctx.store, &tokens_in)?;

        tracing::info!(pool_id, %sender, shares = %share_out_amount, %tokens_in, "joined pool");
        Ok(tokens_in)
    }

    /// Single-asset deposit of exactly `token_in`; returns the shares minted.
    pub fn join_swap_extern_amount_in(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_id: u64,
        token_in: Coin,
        share_out_min_amount: Uint256,
    ) -> Result<Uint256> {
        let mut pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;
        token_in.validate()?;
        let tokens_in = Coins::from(token_in);

        let (shares, joined) = pool.calc_join_pool_shares(&tokens_in)?;
        if shares.is_zero() {
            return Err(Error::InvalidMathApprox("share amount out is zero".into()));
        }
        if shares < share_out_min_amount {
            return Err(Error::LimitMinAmount {
                denom: pool.total_shares.denom.clone(),
                amount: shares,
                min: share_out_min_amount,
            });
        }

        pool.increase_liquidity(Uint256::zero(), &joined)?;
        self.bank.send_coins(ctx.store, sender, &pool.address, &joined)?;
        self.mint_pool_shares_to_account(ctx.store, &mut pool, sender, shares)?;
        self.set_pool(ctx.store, &pool)?;
        self.record_total_liquidity_increase(ctx.store, &joined)?;

        tracing::info!(pool_id, %sender, %shares, tokens_in = %joined, "joined pool with single asset");
        Ok(shares)
    }

    /// Single-asset deposit minting exactly `share_out_amount`; returns the
    /// tokens charged.
    pub fn join_swap_share_amount_out(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_id: u64,
        token_in_denom: &str,
        share_out_amount: Uint256,
        token_in_max_amount: Uint256,
    ) -> Result<Uint256> {
        let mut pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;

        let amount = pool.calc_token_in_share_amount_out(token_in_denom, share_out_amount)?;
        if amount > token_in_max_amount {
            return Err(Error::LimitMaxAmount {
                denom: token_in_denom.to_string(),
                amount,
                max: token_in_max_amount,
            });
        }
        let tokens_in = Coins::from(Coin::from_uint(amount, token_in_denom));

        pool.increase_liquidity(Uint256::zero(), &tokens_in)?;
        self.bank.send_coins(ctx.store, sender, &pool.address, &tokens_in)?;
        self.mint_pool_shares_to_account(ctx.store, &mut pool, sender, share_out_amount)?;
        self.set_pool(ctx.store, &pool)?;
        self.record_total_liquidity_increase(ctx.store, &tokens_in)?;

        tracing::info!(pool_id, %sender, shares = %share_out_amount, %tokens_in, "joined pool with single asset");
        Ok(amount)
    }

    // ─── Exits ───────────────────────────────────────────────────────────────

    /// Burns `share_in_amount` for a proportional withdrawal. The exit fee
    /// portion of the shares is burned without payout.
    pub fn exit_pool(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_id: u64,
        share_in_amount: Uint256,
        token_out_mins: &Coins,
    ) -> Result<Coins> {
        let mut pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;
        let exit_fee = pool.pool_params.exit_fee;

        let exited = pool.exit_pool(share_in_amount, exit_fee)?;
        for min in token_out_mins {
            pool.get_pool_asset(&min.denom)?;
            let amount = exited.amount_of(&min.denom);
            if amount < min.amount {
                return Err(Error::LimitMinAmount { denom: min.denom.clone(), amount, min: min.amount });
            }
        }

        self.bank.send_coins(ctx.store, &pool.address, sender, &exited)?;
        self.burn_pool_shares_from_account(ctx.store, &pool, sender, share_in_amount)?;
        self.set_pool(ctx.store, &pool)?;
        self.record_total_liquidity_decrease(ctx.store, &exited)?;

        tracing::info!(pool_id, %sender, shares = %share_in_amount, tokens_out = %exited, "exited pool");
        Ok(exited)
    }

    /// Burns exactly `share_in_amount` for one asset; returns the tokens paid.
    pub fn exit_swap_share_amount_in(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_id: u64,
        token_out_denom: &str,
        share_in_amount: Uint256,
        token_out_min_amount: Uint256,
    ) -> Result<Uint256> {
        let mut pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;

        let amount = pool.calc_single_out_given_pool_in(token_out_denom, share_in_amount)?;
        if amount < token_out_min_amount {
            return Err(Error::LimitMinAmount {
                denom: token_out_denom.to_string(),
                amount,
                min: token_out_min_amount,
            });
        }
        let tokens_out = Coins::from(Coin::from_uint(amount, token_out_denom));

        self.exit_single_asset(ctx, &mut pool, sender, share_in_amount, &tokens_out)?;
        tracing::info!(pool_id, %sender, shares = %share_in_amount, %tokens_out, "exited pool to single asset");
        Ok(amount)
    }

    /// Withdraws exactly `token_out`; returns the shares burned.
    pub fn exit_swap_extern_amount_out(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_id: u64,
        token_out: Coin,
        share_in_max_amount: Uint256,
    ) -> Result<Uint256> {
        let mut pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;
        token_out.validate()?;

        let shares = pool.calc_pool_in_given_single_out(&token_out)?;
        if shares > share_in_max_amount {
            return Err(Error::LimitMaxAmount {
                denom: pool.total_shares.denom.clone(),
                amount: shares,
                max: share_in_max_amount,
            });
        }
        let tokens_out = Coins::from(token_out);

        self.exit_single_asset(ctx, &mut pool, sender, shares, &tokens_out)?;
        tracing::info!(pool_id, %sender, %shares, %tokens_out, "exited pool to single asset");
        Ok(shares)
    }

    fn exit_single_asset(
        &self,
        ctx: &mut Context<'_>,
        pool: &mut Pool,
        sender: &str,
        shares: Uint256,
        tokens_out: &Coins,
    ) -> Result<()> {
        if shares >= pool.total_shares_amount() {
            return Err(Error::LimitMaxAmount {
                denom: pool.total_shares.denom.clone(),
                amount: shares,
                max: pool.total_shares_amount(),
            });
        }
        pool.apply_exit(tokens_out, shares)?;
        self.bank.send_coins(ctx.store, &pool.address, sender, tokens_out)?;
        self.burn_pool_shares_from_account(ctx.store, pool, sender, shares)?;
        self.set_pool(ctx.store, pool)?;
        self.record_total_liquidity_decrease(ctx.store, tokens_out)
    }

    // ─── Swaps ───────────────────────────────────────────────────────────────

    /// Sells exactly `token_in`; returns the amount of `token_out_denom` bought.
    pub fn swap_exact_amount_in(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_id: u64,
        token_in: Coin,
        token_out_denom: &str,
        token_out_min_amount: Uint256,
    ) -> Result<Uint256> {
        if token_in.denom == token_out_denom {
            return Err(Error::SameDenomSwap(token_in.denom));
        }
        token_in.validate()?;
        let mut pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;

        let token_out = pool.calc_out_amt_given_in(&token_in, token_out_denom)?;
        if token_out.amount < token_out_min_amount {
            return Err(Error::LimitMinAmount {
                denom: token_out_denom.to_string(),
                amount: token_out.amount,
                min: token_out_min_amount,
            });
        }

        self.execute_swap(ctx, &mut pool, sender, &token_in, &token_out)?;
        tracing::info!(pool_id, %sender, %token_in, %token_out, "swap exact amount in");
        Ok(token_out.amount)
    }

    /// Buys exactly `token_out`; returns the amount of `token_in_denom` sold.
    pub fn swap_exact_amount_out(
        &self,
        ctx: &mut Context<'_>,
        sender: &str,
        pool_id: u64,
        token_in_denom: &str,
        token_in_max_amount: Uint256,
        token_out: Coin,
    ) -> Result<Uint256> {
        if token_out.denom == token_in_denom {
            return Err(Error::SameDenomSwap(token_out.denom));
        }
        token_out.validate()?;
        let mut pool = self.get_pool_and_poke(ctx.store, pool_id, ctx.block.time)?;

        let token_in = pool.calc_in_amt_given_out(&token_out, token_in_denom)?;
        if token_in.amount > token_in_max_amount {
            return Err(Error::LimitMaxAmount {
                denom: token_in_denom.to_string(),
                amount: token_in.amount,
                max: token_in_max_amount,
            });
        }

        self.execute_swap(ctx, &mut pool, sender, &token_in, &token_out)?;
        tracing::info!(pool_id, %sender, %token_in, %token_out, "swap exact amount out");
        Ok(token_in.amount)
    }

    /// Applies a priced swap after the spot-price sanity checks: the price of
    /// the sold asset may not fall, may not exceed the maximum and the trade's
    /// effective price may not beat the pre-trade spot price.
    fn execute_swap(&self, ctx: &mut Context<'_>, pool: &mut Pool, sender: &str, token_in: &Coin, token_out: &Coin) -> Result<()> {
        let spot_before = pool.spot_price_with_swap_fee(&token_in.denom, &token_out.denom)?;
        pool.apply_swap(token_in, token_out)?;
        let spot_after = pool.spot_price_with_swap_fee(&token_in.denom, &token_out.denom)?;

        if spot_after < spot_before {
            return Err(Error::InvalidMathApprox("spot price after swap is lower than before".into()));
        }
        if spot_after > PreciseDec::from_u128(MAX_SPOT_PRICE) {
            return Err(Error::SpotPriceOverflow);
        }
        let effective = PreciseDec::from_ratio(token_in.amount, token_out.amount)?;
        if spot_before > effective {
            return Err(Error::InvalidMathApprox("effective price is below the spot price".into()));
        }

        self.bank.send_coins(ctx.store, sender, &pool.address, &Coins::from(token_in.clone()))?;
        self.bank.send_coins(ctx.store, &pool.address, sender, &Coins::from(token_out.clone()))?;
        self.set_pool(ctx.store, pool)
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    /// Spot price of `base` in `quote` with weights as of `block_time`.
    pub fn spot_price(
        &self,
        store: &dyn Storage,
        block_time: Timestamp,
        pool_id: u64,
        quote: &str,
        base: &str,
    ) -> Result<Decimal256> {
        self.get_pool_and_poke(store, pool_id, block_time)?.spot_price(quote, base)
    }

    pub fn get_pool_assets(&self, store: &dyn Storage, pool_id: u64, denoms: &[&str]) -> Result<Vec<PoolAsset>> {
        let pool = self.get_pool(store, pool_id)?;
        if denoms.is_empty() {
            Ok(pool.get_all_pool_assets())
        } else {
            pool.get_pool_assets(denoms)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use cosmwasm_std::{testing::mock_env, MemoryStorage};

    use super::*;
    use crate::{address::module_address, bank::StoreBank, store::CacheStore};

    const ALICE: &str = "osmo1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9nck";

    fn funded_store() -> MemoryStorage {
        let mut store = MemoryStorage::new();
        StoreBank
            .mint_coins(&mut store, "faucet", &"10000000000000uatom,10000000000000uosmo".parse().unwrap())
            .unwrap();
        StoreBank
            .send_coins_from_module_to_account(
                &mut store,
                "faucet",
                ALICE,
                &"10000000000000uatom,10000000000000uosmo".parse().unwrap(),
            )
            .unwrap();
        store
    }

    fn equal_pool(keeper: &GammKeeper<StoreBank>, ctx: &mut Context<'_>, fee: &str) -> u64 {
        keeper
            .create_pool(
                ctx,
                ALICE,
                PoolParams::new(Decimal256::from_str(fee).unwrap(), Decimal256::zero()),
                vec![
                    PoolAsset::new(Coin::new(1_000_000_000_000, "uosmo"), 100),
                    PoolAsset::new(Coin::new(1_000_000_000_000, "uatom"), 100),
                ],
                "",
            )
            .unwrap()
    }

    fn balance(store: &dyn Storage, address: &str, denom: &str) -> Uint256 {
        StoreBank.get_balance(store, address, denom).unwrap().amount
    }

    #[test]
    fn create_pool_mints_shares_and_metadata() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);

        let pool_id = equal_pool(&keeper, &mut ctx, "0");
        assert_eq!(pool_id, 1);
        assert_eq!(keeper.get_next_pool_id(ctx.store).unwrap(), 2);

        let pool = keeper.get_pool(ctx.store, pool_id).unwrap();
        assert_eq!(balance(ctx.store, ALICE, "gamm/pool/1"), Uint256::from(INIT_POOL_SHARES_SUPPLY));
        assert_eq!(balance(ctx.store, &pool.address, "uosmo"), Uint256::from(1_000_000_000_000u128));
        assert_eq!(StoreBank.get_supply(ctx.store, "gamm/pool/1").unwrap().amount, pool.total_shares_amount());

        let metadata = StoreBank.get_denom_metadata(ctx.store, "gamm/pool/1").unwrap().unwrap();
        assert_eq!(metadata.display, "GAMM-1");
        assert_eq!(metadata.denom_units[1].exponent, 18);

        assert_eq!(
            keeper.get_total_liquidity(ctx.store).unwrap(),
            "1000000000000uatom,1000000000000uosmo".parse().unwrap()
        );
    }

    #[test]
    fn create_pool_charges_creation_fee() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        keeper
            .set_params(&mut store, &Params { pool_creation_fee: "1000uosmo".parse().unwrap() })
            .unwrap();
        let mut ctx = Context::new(&mut store, mock_env().block);
        equal_pool(&keeper, &mut ctx, "0");
        assert_eq!(balance(ctx.store, &module_address(COMMUNITY_POOL_MODULE), "uosmo"), Uint256::from(1000u128));
    }

    #[test]
    fn create_pool_rejects_asset_counts() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let one = vec![PoolAsset::new(Coin::new(10, "uosmo"), 1)];
        assert!(matches!(
            keeper.create_pool(&mut ctx, ALICE, PoolParams::default(), one, ""),
            Err(Error::TooFewPoolAssets { .. })
        ));
        let nine = (0..9).map(|i| PoolAsset::new(Coin::new(10, format!("token{i}")), 1)).collect();
        assert!(matches!(
            keeper.create_pool(&mut ctx, ALICE, PoolParams::default(), nine, ""),
            Err(Error::TooManyPoolAssets { got: 9, .. })
        ));
    }

    #[test]
    fn join_and_exit_keep_supply_in_sync() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let pool_id = equal_pool(&keeper, &mut ctx, "0");

        let shares = Uint256::from(INIT_POOL_SHARES_SUPPLY / 100);
        let paid = keeper.join_pool(&mut ctx, ALICE, pool_id, shares, &Coins::empty()).unwrap();
        assert_eq!(paid, "10000000000uatom,10000000000uosmo".parse().unwrap());

        let out = keeper.exit_pool(&mut ctx, ALICE, pool_id, shares, &Coins::empty()).unwrap();
        assert!(out.is_all_lte(&paid));

        let pool = keeper.get_pool(ctx.store, pool_id).unwrap();
        assert_eq!(pool.total_shares_amount(), Uint256::from(INIT_POOL_SHARES_SUPPLY));
        assert_eq!(StoreBank.get_supply(ctx.store, "gamm/pool/1").unwrap().amount, pool.total_shares_amount());
    }

    #[test]
    fn join_pool_enforces_max_in() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let pool_id = equal_pool(&keeper, &mut ctx, "0");

        let maxs: Coins = "5uosmo".parse().unwrap();
        let err = keeper
            .join_pool(&mut ctx, ALICE, pool_id, Uint256::from(INIT_POOL_SHARES_SUPPLY / 100), &maxs)
            .unwrap_err();
        assert!(matches!(err, Error::LimitMaxAmount { .. }));
    }

    #[test]
    fn single_asset_join_and_exit() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let pool_id = equal_pool(&keeper, &mut ctx, "0");

        let shares = keeper
            .join_swap_extern_amount_in(&mut ctx, ALICE, pool_id, Coin::new(50_000, "uosmo"), Uint256::zero())
            .unwrap();
        assert_eq!(shares, Uint256::from(2_499_999_968_750u128));

        let err = keeper
            .join_swap_extern_amount_in(
                &mut ctx,
                ALICE,
                pool_id,
                Coin::new(50_000, "uosmo"),
                Uint256::from(3_000_000_000_000u128),
            )
            .unwrap_err();
        assert!(matches!(err, Error::LimitMinAmount { .. }));

        let paid = keeper
            .join_swap_share_amount_out(&mut ctx, ALICE, pool_id, "uatom", shares, Uint256::from(60_000u128))
            .unwrap();
        assert!(paid >= Uint256::from(50_000u128) && paid < Uint256::from(50_100u128));

        let out = keeper
            .exit_swap_share_amount_in(&mut ctx, ALICE, pool_id, "uatom", shares, Uint256::zero())
            .unwrap();
        assert!(out <= paid);

        let burned = keeper
            .exit_swap_extern_amount_out(&mut ctx, ALICE, pool_id, Coin::new(10_000, "uosmo"), shares)
            .unwrap();
        assert!(burned < shares);

        let pool = keeper.get_pool(ctx.store, pool_id).unwrap();
        assert_eq!(StoreBank.get_supply(ctx.store, "gamm/pool/1").unwrap().amount, pool.total_shares_amount());
    }

    #[test]
    fn swaps_move_balances_and_respect_limits() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let pool_id = equal_pool(&keeper, &mut ctx, "0.003");
        let address = keeper.get_pool(ctx.store, pool_id).unwrap().address;

        let before = balance(ctx.store, ALICE, "uatom");
        let out = keeper
            .swap_exact_amount_in(&mut ctx, ALICE, pool_id, Coin::new(1_000_000, "uosmo"), "uatom", Uint256::one())
            .unwrap();
        assert_eq!(balance(ctx.store, ALICE, "uatom"), before + out);
        assert_eq!(balance(ctx.store, &address, "uosmo"), Uint256::from(1_000_001_000_000u128));

        let err = keeper
            .swap_exact_amount_in(&mut ctx, ALICE, pool_id, Coin::new(1_000, "uosmo"), "uatom", Uint256::from(1_000u128))
            .unwrap_err();
        assert!(matches!(err, Error::LimitMinAmount { .. }));

        let paid = keeper
            .swap_exact_amount_out(&mut ctx, ALICE, pool_id, "uatom", Uint256::from(2_000_000u128), Coin::new(1_000_000, "uosmo"))
            .unwrap();
        assert!(paid > Uint256::from(1_000_000u128));

        let err = keeper
            .swap_exact_amount_out(&mut ctx, ALICE, pool_id, "uatom", Uint256::from(10u128), Coin::new(1_000_000, "uosmo"))
            .unwrap_err();
        assert!(matches!(err, Error::LimitMaxAmount { .. }));

        let err = keeper
            .swap_exact_amount_in(&mut ctx, ALICE, pool_id, Coin::new(1_000, "uosmo"), "uosmo", Uint256::zero())
            .unwrap_err();
        assert!(matches!(err, Error::SameDenomSwap(_)));
    }

    #[test]
    fn failed_swap_leaves_parent_store_untouched() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        {
            let mut ctx = Context::new(&mut store, mock_env().block);
            equal_pool(&keeper, &mut ctx, "0");
        }
        let before = balance(&store, ALICE, "uosmo");
        {
            let mut cache = CacheStore::new(&mut store);
            let mut ctx = Context::new(&mut cache, mock_env().block);
            let result =
                keeper.swap_exact_amount_in(&mut ctx, ALICE, 1, Coin::new(1_000, "uosmo"), "uatom", Uint256::from(u128::MAX));
            assert!(result.is_err());
        }
        assert_eq!(balance(&store, ALICE, "uosmo"), before);
    }

    #[test]
    fn spot_price_query_and_unknown_pool() {
        let mut store = funded_store();
        let keeper = GammKeeper::new(StoreBank);
        let block = mock_env().block;
        let mut ctx = Context::new(&mut store, block.clone());
        let pool_id = equal_pool(&keeper, &mut ctx, "0");

        assert_eq!(keeper.spot_price(ctx.store, block.time, pool_id, "uosmo", "uatom").unwrap(), Decimal256::one());
        assert!(matches!(keeper.get_pool(ctx.store, 42), Err(Error::PoolNotFound(42))));
        assert_eq!(keeper.get_pool_assets(ctx.store, pool_id, &[]).unwrap().len(), 2);
    }
}
