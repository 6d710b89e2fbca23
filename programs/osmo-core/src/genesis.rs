//! Whole-state import and export.
//!
//! `export_genesis` followed by `init_genesis` on an empty store reproduces
//! every record the keepers read: pools and counters, total liquidity,
//! farms with their farmers and historical records, the distribution table,
//! module params and bank balances with denom metadata. Supplies are rebuilt
//! from the balances.

use std::collections::{BTreeMap, BTreeSet};

use cosmwasm_std::Storage;
use serde::{Deserialize, Serialize};

use crate::{
    address::validate_address,
    bank::{Balance, BankKeeper, Metadata, StoreBank},
    coins::Coins,
    error::{Error, Result},
    farm::{Farm, FarmKeeper, Farmer, HistoricalRecord},
    gamm::{GammKeeper, Params as GammParams, Pool},
    pool_yield::{DistrInfo, Params as PoolYieldParams, PoolYieldKeeper},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(default)]
    pub gamm: GammGenesis,
    #[serde(default)]
    pub farm: FarmGenesis,
    #[serde(default)]
    pub pool_yield: PoolYieldGenesis,
    #[serde(default)]
    pub bank: BankGenesis,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GammGenesis {
    #[serde(default)]
    pub params: GammParams,
    pub next_pool_id: u64,
    #[serde(default)]
    pub pools: Vec<Pool>,
    #[serde(default)]
    pub total_liquidity: Coins,
}

impl Default for GammGenesis {
    fn default() -> Self {
        GammGenesis { params: GammParams::default(), next_pool_id: 1, pools: vec![], total_liquidity: Coins::empty() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmGenesis {
    pub next_farm_id: u64,
    #[serde(default)]
    pub farms: Vec<Farm>,
    #[serde(default)]
    pub farmers: Vec<Farmer>,
    #[serde(default)]
    pub historical_records: Vec<HistoricalRecord>,
}

impl Default for FarmGenesis {
    fn default() -> Self {
        FarmGenesis { next_farm_id: 1, farms: vec![], farmers: vec![], historical_records: vec![] }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolYieldGenesis {
    #[serde(default)]
    pub params: PoolYieldParams,
    #[serde(default)]
    pub distr_info: DistrInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankGenesis {
    #[serde(default)]
    pub balances: Vec<Balance>,
    #[serde(default)]
    pub denom_metadata: Vec<Metadata>,
}

impl GenesisState {
    /// Cross-record consistency: ids below their counters, no duplicates and
    /// every farmer, record and distribution entry pointing at a known farm.
    pub fn validate(&self) -> Result<()> {
        self.gamm.params.validate()?;
        self.pool_yield.params.validate()?;

        let mut pool_ids = BTreeSet::new();
        for pool in &self.gamm.pools {
            if pool.id == 0 || pool.id >= self.gamm.next_pool_id {
                return Err(Error::Genesis(format!(
                    "pool id {} is not below next pool id {}",
                    pool.id, self.gamm.next_pool_id
                )));
            }
            if !pool_ids.insert(pool.id) {
                return Err(Error::Genesis(format!("duplicate pool id {}", pool.id)));
            }
        }
        self.gamm.total_liquidity.validate()?;

        let mut farms = BTreeMap::new();
        for farm in &self.farm.farms {
            if farm.farm_id == 0 || farm.farm_id >= self.farm.next_farm_id {
                return Err(Error::Genesis(format!(
                    "farm id {} is not below next farm id {}",
                    farm.farm_id, self.farm.next_farm_id
                )));
            }
            if farms.insert(farm.farm_id, farm).is_some() {
                return Err(Error::Genesis(format!("duplicate farm id {}", farm.farm_id)));
            }
        }

        for farmer in &self.farm.farmers {
            let farm = farms
                .get(&farmer.farm_id)
                .ok_or_else(|| Error::Genesis(format!("farmer {} of unknown farm {}", farmer.address, farmer.farm_id)))?;
            if farmer.share.is_zero() {
                return Err(Error::Genesis(format!("farmer {} has zero share", farmer.address)));
            }
            if farmer.last_withdrawn_period >= farm.current_period {
                return Err(Error::Genesis(format!(
                    "farmer {} settled past the current period of farm {}",
                    farmer.address, farm.farm_id
                )));
            }
        }

        for record in &self.farm.historical_records {
            let farm = farms.get(&record.farm_id).ok_or_else(|| {
                Error::Genesis(format!("historical record of unknown farm {}", record.farm_id))
            })?;
            if record.period >= farm.current_period {
                return Err(Error::Genesis(format!(
                    "historical record period {} of farm {} is not closed",
                    record.period, record.farm_id
                )));
            }
        }

        for record in &self.pool_yield.distr_info.records {
            if !farms.contains_key(&record.farm_id) {
                return Err(Error::Genesis(format!("distribution record for unknown farm {}", record.farm_id)));
            }
            if record.weight.is_zero() {
                return Err(Error::Genesis(format!("distribution record for farm {} has zero weight", record.farm_id)));
            }
        }
        let mut distr_info = self.pool_yield.distr_info.clone();
        distr_info.recompute_total_weight()?;
        if distr_info.total_weight != self.pool_yield.distr_info.total_weight {
            return Err(Error::Genesis("distribution total weight does not match its records".into()));
        }

        for balance in &self.bank.balances {
            validate_address(&balance.address)?;
        }

        Ok(())
    }
}

pub fn init_genesis(store: &mut dyn Storage, genesis: &GenesisState) -> Result<()> {
    genesis.validate()?;

    let gamm = GammKeeper::new(StoreBank);
    gamm.set_params(store, &genesis.gamm.params)?;
    gamm.set_next_pool_id(store, genesis.gamm.next_pool_id)?;
    for pool in &genesis.gamm.pools {
        gamm.set_pool(store, pool)?;
    }
    gamm.set_total_liquidity(store, &genesis.gamm.total_liquidity)?;

    let farm = FarmKeeper::new(StoreBank);
    farm.set_next_farm_id(store, genesis.farm.next_farm_id)?;
    for f in &genesis.farm.farms {
        farm.set_farm(store, f)?;
    }
    for farmer in &genesis.farm.farmers {
        farm.set_farmer(store, farmer)?;
    }
    for record in &genesis.farm.historical_records {
        farm.set_historical_record(store, record)?;
    }

    let pool_yield = PoolYieldKeeper::new(StoreBank);
    pool_yield.set_params(store, &genesis.pool_yield.params)?;
    pool_yield.set_distr_info(store, &genesis.pool_yield.distr_info)?;

    StoreBank::init_balances(store, &genesis.bank.balances)?;
    for metadata in &genesis.bank.denom_metadata {
        StoreBank.set_denom_metadata(store, metadata)?;
    }

    tracing::info!(
        pools = genesis.gamm.pools.len(),
        farms = genesis.farm.farms.len(),
        accounts = genesis.bank.balances.len(),
        "genesis initialised"
    );
    Ok(())
}

pub fn export_genesis(store: &dyn Storage) -> Result<GenesisState> {
    let gamm = GammKeeper::new(StoreBank);
    let farm = FarmKeeper::new(StoreBank);
    let pool_yield = PoolYieldKeeper::new(StoreBank);

    Ok(GenesisState {
        gamm: GammGenesis {
            params: gamm.get_params(store)?,
            next_pool_id: gamm.get_next_pool_id(store)?,
            pools: gamm.get_pools(store)?,
            total_liquidity: gamm.get_total_liquidity(store)?,
        },
        farm: FarmGenesis {
            next_farm_id: farm.get_next_farm_id(store)?,
            farms: farm.get_farms(store)?,
            farmers: farm.get_farmers(store)?,
            historical_records: farm.get_historical_records(store)?,
        },
        pool_yield: PoolYieldGenesis {
            params: pool_yield.get_params(store)?,
            distr_info: pool_yield.get_distr_info(store)?,
        },
        bank: BankGenesis {
            balances: StoreBank::all_balances(store)?,
            denom_metadata: StoreBank::all_denom_metadata(store)?,
        },
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use cosmwasm_std::{testing::mock_env, Decimal256, MemoryStorage, Uint256};

    use super::*;
    use crate::{
        coins::Coin,
        constants::FEE_COLLECTOR_MODULE,
        gamm::{PoolAsset, PoolParams},
        pool_yield::DistrRecord,
        store::Context,
    };

    const ALICE: &str = "osmo1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9nck";

    fn populated_store() -> MemoryStorage {
        let mut store = MemoryStorage::new();
        let funds: Coins = "10000000000000uatom,10000000000000uosmo".parse().unwrap();
        StoreBank.mint_coins(&mut store, "faucet", &funds).unwrap();
        StoreBank.send_coins_from_module_to_account(&mut store, "faucet", ALICE, &funds).unwrap();
        StoreBank
            .mint_coins(&mut store, FEE_COLLECTOR_MODULE, &"5000uosmo".parse().unwrap())
            .unwrap();

        let mut ctx = Context::new(&mut store, mock_env().block);
        GammKeeper::new(StoreBank)
            .create_pool(
                &mut ctx,
                ALICE,
                PoolParams::new(Decimal256::from_str("0.003").unwrap(), Decimal256::zero()),
                vec![
                    PoolAsset::new(Coin::new(1_000_000, "uosmo"), 1),
                    PoolAsset::new(Coin::new(2_000_000, "uatom"), 3),
                ],
                "",
            )
            .unwrap();

        let farms = FarmKeeper::new(StoreBank);
        let farm_id = farms.new_farm(&mut ctx).unwrap().farm_id;
        farms.deposit_share_to_farm(&mut ctx, farm_id, ALICE, Uint256::from(10u128)).unwrap();
        farms
            .allocate_assets_from_account_to_farm(&mut ctx, farm_id, ALICE, &"333uosmo".parse().unwrap())
            .unwrap();

        let pool_yield = PoolYieldKeeper::new(StoreBank);
        pool_yield
            .add_distr_records(&mut ctx, vec![DistrRecord { farm_id, weight: Uint256::from(5u128) }])
            .unwrap();
        store
    }

    #[test]
    fn export_then_import_is_exact() {
        let store = populated_store();
        let exported = export_genesis(&store).unwrap();
        assert_eq!(exported.gamm.pools.len(), 1);
        assert_eq!(exported.gamm.next_pool_id, 2);
        assert_eq!(exported.farm.historical_records.len(), 2);

        let json = serde_json::to_string(&exported).unwrap();
        let decoded: GenesisState = serde_json::from_str(&json).unwrap();

        let mut fresh = MemoryStorage::new();
        init_genesis(&mut fresh, &decoded).unwrap();
        assert_eq!(export_genesis(&fresh).unwrap(), exported);
        assert_eq!(
            StoreBank.get_supply(&fresh, "uosmo").unwrap(),
            StoreBank.get_supply(&store, "uosmo").unwrap()
        );
    }

    #[test]
    fn empty_genesis_uses_defaults() {
        let genesis: GenesisState = serde_json::from_str("{}").unwrap();
        assert_eq!(genesis.gamm.next_pool_id, 1);
        assert_eq!(genesis.farm.next_farm_id, 1);

        let mut store = MemoryStorage::new();
        init_genesis(&mut store, &genesis).unwrap();
        assert_eq!(export_genesis(&store).unwrap(), genesis);
    }

    #[test]
    fn inconsistent_genesis_is_rejected() {
        let good = export_genesis(&populated_store()).unwrap();

        let mut orphan = good.clone();
        orphan.farm.farmers[0].farm_id = 9;
        assert!(matches!(orphan.validate(), Err(Error::Genesis(_))));

        let mut stale_counter = good.clone();
        stale_counter.gamm.next_pool_id = 1;
        assert!(matches!(stale_counter.validate(), Err(Error::Genesis(_))));

        let mut bad_weight = good;
        bad_weight.pool_yield.distr_info.total_weight = Uint256::from(7u128);
        let mut store = MemoryStorage::new();
        assert!(init_genesis(&mut store, &bad_weight).is_err());
        assert!(export_genesis(&store).unwrap().gamm.pools.is_empty());
    }

    #[test]
    fn balance_with_invalid_address_is_rejected() {
        let mut genesis = export_genesis(&populated_store()).unwrap();
        genesis.bank.balances.push(Balance { address: "x".repeat(300), coins: "1uosmo".parse().unwrap() });
        assert!(matches!(genesis.validate(), Err(Error::InvalidAddress(_))));

        let mut store = MemoryStorage::new();
        assert!(init_genesis(&mut store, &genesis).is_err());
        assert!(StoreBank::all_balances(&store).unwrap().is_empty());

        let err = StoreBank::init_balances(&mut store, &genesis.bank.balances[genesis.bank.balances.len() - 1..])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
        assert!(StoreBank::all_balances(&store).unwrap().is_empty());
    }
}
