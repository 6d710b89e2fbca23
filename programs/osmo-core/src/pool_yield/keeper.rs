//! Pool-yield keeper: each block, a share of the fee collector's minted denom
//! is split across farms by weight.

use std::collections::BTreeSet;

use cosmwasm_std::Storage;

use super::state::{DistrInfo, DistrRecord, Params};
use crate::{
    bank::BankKeeper,
    coins::{Coin, Coins},
    constants::{COMMUNITY_POOL_MODULE, DISTR_INFO_KEY, FEE_COLLECTOR_MODULE, POOL_YIELD_PARAMS_KEY},
    error::{Error, Result},
    farm::FarmKeeper,
    store::{self, Context},
};

pub struct PoolYieldKeeper<B: BankKeeper + Clone> {
    bank: B,
    farm: FarmKeeper<B>,
}

impl<B: BankKeeper + Clone> PoolYieldKeeper<B> {
    pub fn new(bank: B) -> Self {
        PoolYieldKeeper { farm: FarmKeeper::new(bank.clone()), bank }
    }

    pub fn get_params(&self, store: &dyn Storage) -> Result<Params> {
        Ok(store::load(store, POOL_YIELD_PARAMS_KEY)?.unwrap_or_default())
    }

    pub fn set_params(&self, store: &mut dyn Storage, params: &Params) -> Result<()> {
        params.validate()?;
        store::save(store, POOL_YIELD_PARAMS_KEY, params)
    }

    pub fn get_distr_info(&self, store: &dyn Storage) -> Result<DistrInfo> {
        Ok(store::load(store, DISTR_INFO_KEY)?.unwrap_or_default())
    }

    pub fn set_distr_info(&self, store: &mut dyn Storage, info: &DistrInfo) -> Result<()> {
        store::save(store, DISTR_INFO_KEY, info)
    }

    // ─── Allocation ──────────────────────────────────────────────────────────

    /// `floor(fee collector balance of minted_denom * allocation_ratio)`.
    pub fn get_allocatable_asset(&self, store: &dyn Storage) -> Result<Coin> {
        let params = self.get_params(store)?;
        let balance = self.bank.get_balance(
            store,
            &crate::address::module_address(FEE_COLLECTOR_MODULE),
            &params.minted_denom,
        )?;
        Ok(Coin::from_uint(balance.amount.mul_floor(params.allocation_ratio), params.minted_denom))
    }

    /// Splits `asset` (held by the fee collector) across the distribution
    /// records by weight, rounding each portion down. Without records the
    /// whole asset goes to the community pool.
    pub fn allocate_asset(&self, ctx: &mut Context<'_>, asset: Coin) -> Result<()> {
        if asset.amount.is_zero() {
            return Ok(());
        }
        asset.validate()?;
        let info = self.get_distr_info(ctx.store)?;

        if info.total_weight.is_zero() {
            self.bank.send_coins_from_module_to_module(
                ctx.store,
                FEE_COLLECTOR_MODULE,
                COMMUNITY_POOL_MODULE,
                &Coins::from(asset.clone()),
            )?;
            tracing::info!(%asset, "no distribution records, asset sent to community pool");
            return Ok(());
        }

        for record in &info.records {
            let portion = asset.amount.multiply_ratio(record.weight, info.total_weight);
            if portion.is_zero() {
                continue;
            }
            let portion = Coins::from(Coin::from_uint(portion, asset.denom.clone()));
            self.farm
                .allocate_assets_from_module_to_farm(ctx, record.farm_id, FEE_COLLECTOR_MODULE, &portion)?;
        }
        tracing::info!(%asset, records = info.records.len(), "asset allocated to farms");
        Ok(())
    }

    pub fn begin_block(&self, ctx: &mut Context<'_>) -> Result<()> {
        let asset = self.get_allocatable_asset(ctx.store)?;
        if asset.amount.is_zero() {
            return Ok(());
        }
        self.allocate_asset(ctx, asset)
    }

    // ─── Records ─────────────────────────────────────────────────────────────

    pub fn add_distr_records(&self, ctx: &mut Context<'_>, records: Vec<DistrRecord>) -> Result<()> {
        for record in &records {
            self.farm.get_farm(ctx.store, record.farm_id)?;
            if record.weight.is_zero() {
                return Err(Error::InvalidDistrRecord(format!("farm {} has zero weight", record.farm_id)));
            }
        }

        let mut info = self.get_distr_info(ctx.store)?;
        info.records.extend(records);
        info.recompute_total_weight()?;
        self.set_distr_info(ctx.store, &info)?;

        tracing::info!(records = info.records.len(), total_weight = %info.total_weight, "distribution records added");
        Ok(())
    }

    pub fn remove_distr_records(&self, ctx: &mut Context<'_>, indexes: &[usize]) -> Result<()> {
        let mut info = self.get_distr_info(ctx.store)?;
        let mut unique = BTreeSet::new();
        for &index in indexes {
            if index >= info.records.len() {
                return Err(Error::DistrRecordInvalidIndex { index, len: info.records.len() });
            }
            if !unique.insert(index) {
                return Err(Error::InvalidDistrRecord(format!("index {index} listed twice")));
            }
        }

        for index in unique.into_iter().rev() {
            info.records.remove(index);
        }
        info.recompute_total_weight()?;
        self.set_distr_info(ctx.store, &info)?;

        tracing::info!(records = info.records.len(), total_weight = %info.total_weight, "distribution records removed");
        Ok(())
    }
}
