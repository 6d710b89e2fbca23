//! Message dispatcher.
//!
//! Every [`Msg`] and every `begin_block` runs against a [`CacheStore`] over
//! the caller's store and is committed only when it succeeds.

use cosmwasm_std::{BlockInfo, Storage};

use crate::{
    bank::{BankKeeper, StoreBank},
    error::Result,
    farm::FarmKeeper,
    gamm::GammKeeper,
    msg::{Msg, MsgResponse, QueryMsg, QueryResponse},
    pool_yield::PoolYieldKeeper,
    store::{CacheStore, Context},
};

pub struct App {
    pub bank: StoreBank,
    pub gamm: GammKeeper<StoreBank>,
    pub farm: FarmKeeper<StoreBank>,
    pub pool_yield: PoolYieldKeeper<StoreBank>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        App {
            bank: StoreBank,
            gamm: GammKeeper::new(StoreBank),
            farm: FarmKeeper::new(StoreBank),
            pool_yield: PoolYieldKeeper::new(StoreBank),
        }
    }

    /// Executes `msg` atomically: on error nothing it wrote reaches `store`.
    pub fn execute(&self, store: &mut dyn Storage, block: &BlockInfo, msg: Msg) -> Result<MsgResponse> {
        let mut cache = CacheStore::new(store);
        let response = {
            let mut ctx = Context::new(&mut cache, block.clone());
            self.dispatch(&mut ctx, msg)
        };
        match response {
            Ok(response) => {
                cache.commit();
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(error = %err, height = block.height, "message failed, state rolled back");
                Err(err)
            }
        }
    }

    /// Pokes every scheduled pool, then hands the block's share of collected
    /// fees to the farms.
    pub fn begin_block(&self, store: &mut dyn Storage, block: &BlockInfo) -> Result<()> {
        let mut cache = CacheStore::new(store);
        {
            let mut ctx = Context::new(&mut cache, block.clone());
            self.gamm.poke_all_pools(&mut ctx)?;
            self.pool_yield.begin_block(&mut ctx)?;
        }
        cache.commit();
        tracing::debug!(height = block.height, "begin block");
        Ok(())
    }

    fn dispatch(&self, ctx: &mut Context<'_>, msg: Msg) -> Result<MsgResponse> {
        let response = match msg {
            // ── Gamm ──
            Msg::CreatePool { sender, pool_params, pool_assets, future_pool_governor } => {
                let pool_id =
                    self.gamm.create_pool(ctx, &sender, pool_params, pool_assets, &future_pool_governor)?;
                MsgResponse::PoolCreated { pool_id }
            }
            Msg::JoinPool { sender, pool_id, share_out_amount, token_in_maxs } => {
                let coins = self.gamm.join_pool(ctx, &sender, pool_id, share_out_amount, &token_in_maxs)?;
                MsgResponse::Coins { coins }
            }
            Msg::JoinSwapExternAmountIn { sender, pool_id, token_in, share_out_min_amount } => {
                let amount = self.gamm.join_swap_extern_amount_in(ctx, &sender, pool_id, token_in, share_out_min_amount)?;
                MsgResponse::Amount { amount }
            }
            Msg::JoinSwapShareAmountOut { sender, pool_id, token_in_denom, share_out_amount, token_in_max_amount } => {
                let amount = self.gamm.join_swap_share_amount_out(
                    ctx,
                    &sender,
                    pool_id,
                    &token_in_denom,
                    share_out_amount,
                    token_in_max_amount,
                )?;
                MsgResponse::Amount { amount }
            }
            Msg::ExitPool { sender, pool_id, share_in_amount, token_out_mins } => {
                let coins = self.gamm.exit_pool(ctx, &sender, pool_id, share_in_amount, &token_out_mins)?;
                MsgResponse::Coins { coins }
            }
            Msg::ExitSwapShareAmountIn { sender, pool_id, token_out_denom, share_in_amount, token_out_min_amount } => {
                let amount = self.gamm.exit_swap_share_amount_in(
                    ctx,
                    &sender,
                    pool_id,
                    &token_out_denom,
                    share_in_amount,
                    token_out_min_amount,
                )?;
                MsgResponse::Amount { amount }
            }
            Msg::ExitSwapExternAmountOut { sender, pool_id, token_out, share_in_max_amount } => {
                let amount = self.gamm.exit_swap_extern_amount_out(ctx, &sender, pool_id, token_out, share_in_max_amount)?;
                MsgResponse::Amount { amount }
            }
            Msg::SwapExactAmountIn { sender, pool_id, token_in, token_out_denom, token_out_min_amount } => {
                let amount = self.gamm.swap_exact_amount_in(
                    ctx,
                    &sender,
                    pool_id,
                    token_in,
                    &token_out_denom,
                    token_out_min_amount,
                )?;
                MsgResponse::Amount { amount }
            }
            Msg::SwapExactAmountOut { sender, pool_id, token_in_denom, token_in_max_amount, token_out } => {
                let amount = self.gamm.swap_exact_amount_out(
                    ctx,
                    &sender,
                    pool_id,
                    &token_in_denom,
                    token_in_max_amount,
                    token_out,
                )?;
                MsgResponse::Amount { amount }
            }
            Msg::PokePool { pool_id } => MsgResponse::Pool { pool: self.gamm.poke_pool(ctx, pool_id)? },

            // ── Farm ──
            Msg::NewFarm {} => MsgResponse::FarmCreated { farm_id: self.farm.new_farm(ctx)?.farm_id },
            Msg::AllocateToFarm { sender, farm_id, assets } => {
                self.farm.allocate_assets_from_account_to_farm(ctx, farm_id, &sender, &assets)?;
                MsgResponse::Empty {}
            }
            Msg::DepositShare { farm_id, address, share } => {
                MsgResponse::Coins { coins: self.farm.deposit_share_to_farm(ctx, farm_id, &address, share)? }
            }
            Msg::WithdrawShare { farm_id, address, share } => {
                MsgResponse::Coins { coins: self.farm.withdraw_share_from_farm(ctx, farm_id, &address, share)? }
            }
            Msg::WithdrawRewards { farm_id, address } => {
                MsgResponse::Coins { coins: self.farm.withdraw_rewards_from_farm(ctx, farm_id, &address)? }
            }

            // ── Pool yield ──
            Msg::AddDistrRecords { records } => {
                self.pool_yield.add_distr_records(ctx, records)?;
                MsgResponse::Empty {}
            }
            Msg::RemoveDistrRecords { indexes } => {
                self.pool_yield.remove_distr_records(ctx, &indexes)?;
                MsgResponse::Empty {}
            }
        };
        Ok(response)
    }

    /// Read-only; pool weights are reported as of `block.time` without being
    /// written back.
    pub fn query(&self, store: &dyn Storage, block: &BlockInfo, query: &QueryMsg) -> Result<QueryResponse> {
        let response = match query {
            QueryMsg::Pool { pool_id } => {
                QueryResponse::Pool { pool: self.gamm.get_pool_and_poke(store, *pool_id, block.time)? }
            }
            QueryMsg::Pools {} => QueryResponse::Pools { pools: self.gamm.get_pools(store)? },
            QueryMsg::PoolAssets { pool_id, denoms } => {
                let denoms: Vec<&str> = denoms.iter().map(String::as_str).collect();
                QueryResponse::PoolAssets { pool_assets: self.gamm.get_pool_assets(store, *pool_id, &denoms)? }
            }
            QueryMsg::SpotPrice { pool_id, quote_denom, base_denom } => QueryResponse::SpotPrice {
                spot_price: self.gamm.spot_price(store, block.time, *pool_id, quote_denom, base_denom)?,
            },
            QueryMsg::TotalLiquidity {} => {
                QueryResponse::TotalLiquidity { liquidity: self.gamm.get_total_liquidity(store)? }
            }
            QueryMsg::Farm { farm_id } => QueryResponse::Farm { farm: self.farm.get_farm(store, *farm_id)? },
            QueryMsg::Farmer { farm_id, address } => {
                QueryResponse::Farmer { farmer: self.farm.get_farmer(store, *farm_id, address)? }
            }
            QueryMsg::PendingRewards { farm_id, address } => QueryResponse::PendingRewards {
                rewards: self.farm.calculate_pending_rewards(store, *farm_id, address)?,
            },
            QueryMsg::DistrInfo {} => QueryResponse::DistrInfo { distr_info: self.pool_yield.get_distr_info(store)? },
            QueryMsg::AllocatableAsset {} => {
                QueryResponse::AllocatableAsset { asset: self.pool_yield.get_allocatable_asset(store)? }
            }
            QueryMsg::Balances { address } => {
                QueryResponse::Balances { coins: self.bank.get_all_balances(store, address)? }
            }
        };
        Ok(response)
    }
}
