//! Farm keeper: cumulative-reward-ratio accounting.
//!
//! An allocation never touches farmers. It appends `previous ratio + assets /
//! total_share` as the historical record of the current period and opens the
//! next one. A farmer's pending reward is the ratio difference between the
//! last closed period and the period they last settled, times their share.

use cosmwasm_std::{Storage, Uint256};

use super::state::{Farm, Farmer, HistoricalRecord};
use crate::{
    address::validate_address,
    bank::BankKeeper,
    coins::{Coins, DecCoins},
    constants::{FARMER_PREFIX, FARM_MODULE, FARM_PREFIX, HISTORICAL_RECORD_PREFIX, NEXT_FARM_ID_KEY},
    error::{Error, Result},
    store::{self, id_address_key, id_key, id_period_key, Context},
};

pub struct FarmKeeper<B: BankKeeper> {
    bank: B,
}

impl<B: BankKeeper> FarmKeeper<B> {
    pub fn new(bank: B) -> Self {
        FarmKeeper { bank }
    }

    // ─── Storage ─────────────────────────────────────────────────────────────

    pub fn get_next_farm_id(&self, store: &dyn Storage) -> Result<u64> {
        Ok(store::load(store, NEXT_FARM_ID_KEY)?.unwrap_or(1))
    }

    pub fn set_next_farm_id(&self, store: &mut dyn Storage, farm_id: u64) -> Result<()> {
        store::save(store, NEXT_FARM_ID_KEY, &farm_id)
    }

    pub fn get_farm(&self, store: &dyn Storage, farm_id: u64) -> Result<Farm> {
        store::load(store, &id_key(FARM_PREFIX, farm_id))?.ok_or(Error::FarmNotFound(farm_id))
    }

    pub fn set_farm(&self, store: &mut dyn Storage, farm: &Farm) -> Result<()> {
        store::save(store, &id_key(FARM_PREFIX, farm.farm_id), farm)
    }

    pub fn get_farms(&self, store: &dyn Storage) -> Result<Vec<Farm>> {
        store::load_prefix(store, &[FARM_PREFIX])
    }

    pub fn get_farmer(&self, store: &dyn Storage, farm_id: u64, address: &str) -> Result<Option<Farmer>> {
        store::load(store, &id_address_key(FARMER_PREFIX, farm_id, address))
    }

    pub fn set_farmer(&self, store: &mut dyn Storage, farmer: &Farmer) -> Result<()> {
        store::save(store, &id_address_key(FARMER_PREFIX, farmer.farm_id, &farmer.address), farmer)
    }

    fn remove_farmer(&self, store: &mut dyn Storage, farm_id: u64, address: &str) {
        store::remove(store, &id_address_key(FARMER_PREFIX, farm_id, address));
    }

    pub fn get_farmers(&self, store: &dyn Storage) -> Result<Vec<Farmer>> {
        store::load_prefix(store, &[FARMER_PREFIX])
    }

    pub fn get_farmers_of_farm(&self, store: &dyn Storage, farm_id: u64) -> Result<Vec<Farmer>> {
        store::load_prefix(store, &id_key(FARMER_PREFIX, farm_id))
    }

    pub fn get_historical_record(&self, store: &dyn Storage, farm_id: u64, period: u64) -> Result<HistoricalRecord> {
        store::load(store, &id_period_key(HISTORICAL_RECORD_PREFIX, farm_id, period))?
            .ok_or(Error::HistoricalRecordNotFound { farm_id, period })
    }

    pub fn set_historical_record(&self, store: &mut dyn Storage, record: &HistoricalRecord) -> Result<()> {
        store::save(
            store,
            &id_period_key(HISTORICAL_RECORD_PREFIX, record.farm_id, record.period),
            record,
        )
    }

    pub fn get_historical_records(&self, store: &dyn Storage) -> Result<Vec<HistoricalRecord>> {
        store::load_prefix(store, &[HISTORICAL_RECORD_PREFIX])
    }

    // ─── Farms ───────────────────────────────────────────────────────────────

    pub fn new_farm(&self, ctx: &mut Context<'_>) -> Result<Farm> {
        let farm_id = self.get_next_farm_id(ctx.store)?;
        self.set_next_farm_id(ctx.store, farm_id + 1)?;

        let farm = Farm::new(farm_id);
        self.set_farm(ctx.store, &farm)?;
        self.set_historical_record(
            ctx.store,
            &HistoricalRecord { farm_id, period: 0, cumulative_reward_ratio: DecCoins::empty() },
        )?;

        tracing::info!(farm_id, "farm created");
        Ok(farm)
    }

    // ─── Allocation ──────────────────────────────────────────────────────────

    /// Closes the current period with `assets` spread over the current total
    /// share. The assets must already sit in the farm module account.
    ///
    /// With no share deposited the ratio is zero: the assets stay in the
    /// module account and no farmer can ever claim them.
    pub fn allocate_assets_to_farm(&self, ctx: &mut Context<'_>, farm_id: u64, assets: &Coins) -> Result<()> {
        validate_allocation(assets)?;
        let mut farm = self.get_farm(ctx.store, farm_id)?;

        let ratio = if farm.total_share.is_zero() {
            tracing::warn!(farm_id, %assets, "allocation to a farm without shares is unclaimable");
            DecCoins::empty()
        } else {
            DecCoins::from_coins_ratio(assets, farm.total_share)?
        };

        let previous = self.get_historical_record(ctx.store, farm_id, farm.last_closed_period())?;
        let record = HistoricalRecord {
            farm_id,
            period: farm.current_period,
            cumulative_reward_ratio: previous.cumulative_reward_ratio.checked_add(&ratio)?,
        };
        self.set_historical_record(ctx.store, &record)?;

        farm.current_period += 1;
        farm.outstanding_rewards = farm.outstanding_rewards.checked_add(assets)?;
        self.set_farm(ctx.store, &farm)?;

        tracing::info!(farm_id, period = record.period, %assets, "assets allocated to farm");
        Ok(())
    }

    pub fn allocate_assets_from_account_to_farm(
        &self,
        ctx: &mut Context<'_>,
        farm_id: u64,
        sender: &str,
        assets: &Coins,
    ) -> Result<()> {
        validate_allocation(assets)?;
        self.get_farm(ctx.store, farm_id)?;
        self.bank.send_coins_from_account_to_module(ctx.store, sender, FARM_MODULE, assets)?;
        self.allocate_assets_to_farm(ctx, farm_id, assets)
    }

    pub fn allocate_assets_from_module_to_farm(
        &self,
        ctx: &mut Context<'_>,
        farm_id: u64,
        module: &str,
        assets: &Coins,
    ) -> Result<()> {
        validate_allocation(assets)?;
        self.get_farm(ctx.store, farm_id)?;
        self.bank.send_coins_from_module_to_module(ctx.store, module, FARM_MODULE, assets)?;
        self.allocate_assets_to_farm(ctx, farm_id, assets)
    }

    // ─── Shares ──────────────────────────────────────────────────────────────

    /// Adds `share` for `address`, settling an existing farmer's rewards
    /// first. A new farmer starts at the last closed period and earns nothing
    /// from earlier allocations.
    pub fn deposit_share_to_farm(
        &self,
        ctx: &mut Context<'_>,
        farm_id: u64,
        address: &str,
        share: Uint256,
    ) -> Result<Coins> {
        validate_address(address)?;
        if share.is_zero() {
            return Err(Error::ZeroShare);
        }
        let mut farm = self.get_farm(ctx.store, farm_id)?;

        let (mut farmer, rewards) = match self.get_farmer(ctx.store, farm_id, address)? {
            Some(mut farmer) => {
                let rewards = self.settle(ctx, &mut farm, &mut farmer)?;
                (farmer, rewards)
            }
            None => (
                Farmer {
                    farm_id,
                    address: address.to_string(),
                    share: Uint256::zero(),
                    last_withdrawn_period: farm.last_closed_period(),
                },
                Coins::empty(),
            ),
        };

        farmer.share = farmer.share.checked_add(share)?;
        farm.total_share = farm.total_share.checked_add(share)?;
        self.set_farmer(ctx.store, &farmer)?;
        self.set_farm(ctx.store, &farm)?;

        tracing::info!(farm_id, %address, %share, %rewards, "share deposited");
        Ok(rewards)
    }

    /// Removes `share` from `address` after settling its rewards. A farmer
    /// left with no share is deleted.
    pub fn withdraw_share_from_farm(
        &self,
        ctx: &mut Context<'_>,
        farm_id: u64,
        address: &str,
        share: Uint256,
    ) -> Result<Coins> {
        if share.is_zero() {
            return Err(Error::ZeroShare);
        }
        let mut farm = self.get_farm(ctx.store, farm_id)?;
        let mut farmer = self.load_farmer(ctx.store, farm_id, address)?;
        if share > farmer.share {
            return Err(Error::InsufficientShare { available: farmer.share, requested: share });
        }

        let rewards = self.settle(ctx, &mut farm, &mut farmer)?;
        farmer.share -= share;
        farm.total_share = farm.total_share.checked_sub(share)?;
        if farmer.share.is_zero() {
            self.remove_farmer(ctx.store, farm_id, address);
        } else {
            self.set_farmer(ctx.store, &farmer)?;
        }
        self.set_farm(ctx.store, &farm)?;

        tracing::info!(farm_id, %address, %share, %rewards, "share withdrawn");
        Ok(rewards)
    }

    // ─── Rewards ─────────────────────────────────────────────────────────────

    pub fn calculate_pending_rewards(&self, store: &dyn Storage, farm_id: u64, address: &str) -> Result<DecCoins> {
        let farm = self.get_farm(store, farm_id)?;
        let farmer = self.load_farmer(store, farm_id, address)?;
        self.pending_rewards(store, &farm, &farmer)
    }

    /// Pays out the whole-coin part of the pending rewards. The fractional
    /// remainder is forfeited to the farm.
    pub fn withdraw_rewards_from_farm(&self, ctx: &mut Context<'_>, farm_id: u64, address: &str) -> Result<Coins> {
        let mut farm = self.get_farm(ctx.store, farm_id)?;
        let mut farmer = self.load_farmer(ctx.store, farm_id, address)?;

        let rewards = self.settle(ctx, &mut farm, &mut farmer)?;
        self.set_farmer(ctx.store, &farmer)?;
        self.set_farm(ctx.store, &farm)?;
        Ok(rewards)
    }

    fn load_farmer(&self, store: &dyn Storage, farm_id: u64, address: &str) -> Result<Farmer> {
        self.get_farmer(store, farm_id, address)?
            .ok_or_else(|| Error::FarmerNotFound { farm_id, address: address.to_string() })
    }

    fn pending_rewards(&self, store: &dyn Storage, farm: &Farm, farmer: &Farmer) -> Result<DecCoins> {
        let end_period = farm.last_closed_period();
        if end_period == 0 || farmer.last_withdrawn_period >= end_period {
            return Ok(DecCoins::empty());
        }
        let start = self.get_historical_record(store, farm.farm_id, farmer.last_withdrawn_period)?;
        let end = self.get_historical_record(store, farm.farm_id, end_period)?;
        end.cumulative_reward_ratio
            .checked_sub(&start.cumulative_reward_ratio)?
            .checked_mul_uint(farmer.share)
    }

    /// Pays `farmer` up to the last closed period. The caller persists both
    /// records.
    fn settle(&self, ctx: &mut Context<'_>, farm: &mut Farm, farmer: &mut Farmer) -> Result<Coins> {
        let pending = self.pending_rewards(ctx.store, farm, farmer)?;
        let (rewards, _dust) = pending.truncate_decimal();
        farmer.last_withdrawn_period = farm.last_closed_period();

        if !rewards.is_empty() {
            farm.outstanding_rewards = farm.outstanding_rewards.checked_sub(&rewards)?;
            self.bank
                .send_coins_from_module_to_account(ctx.store, FARM_MODULE, &farmer.address, &rewards)?;
            tracing::info!(farm_id = farm.farm_id, address = %farmer.address, %rewards, "rewards withdrawn");
        }
        Ok(rewards)
    }
}

fn validate_allocation(assets: &Coins) -> Result<()> {
    if assets.is_empty() {
        return Err(Error::InvalidCoins("allocation must not be empty".into()));
    }
    assets.validate()
}

#[cfg(test)]
mod tests {
    use cosmwasm_std::{testing::mock_env, MemoryStorage};

    use super::*;
    use crate::{
        address::module_address,
        bank::StoreBank,
        coins::Coin,
        constants::MINT_MODULE,
    };

    struct Accounts {
        allocator: String,
        acc1: String,
        acc2: String,
        acc3: String,
    }

    fn prepare_accounts(store: &mut MemoryStorage) -> Accounts {
        let accounts = Accounts {
            allocator: module_address("allocator"),
            acc1: module_address("acc1"),
            acc2: module_address("acc2"),
            acc3: module_address("acc3"),
        };
        let funds: Coins = "10000000000bar,10000000000baz,10000000000foo".parse().unwrap();
        StoreBank.mint_coins(store, MINT_MODULE, &funds).unwrap();
        StoreBank.send_coins_from_module_to_account(store, MINT_MODULE, &accounts.allocator, &funds).unwrap();
        accounts
    }

    fn coins(s: &str) -> Coins {
        s.parse().unwrap()
    }

    fn foo_balance(store: &dyn Storage, address: &str) -> String {
        StoreBank.get_balance(store, address, "foo").unwrap().amount.to_string()
    }

    #[test]
    fn allocation_errors() {
        let mut store = MemoryStorage::new();
        let accs = prepare_accounts(&mut store);
        let keeper = FarmKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);

        assert!(matches!(
            keeper.allocate_assets_from_account_to_farm(&mut ctx, 1, &accs.allocator, &coins("1000foo")),
            Err(Error::FarmNotFound(1))
        ));

        let farm = keeper.new_farm(&mut ctx).unwrap();
        let zero = Coins::from_sorted_unchecked(vec![Coin::new(0, "foo")]);
        assert!(keeper.allocate_assets_from_account_to_farm(&mut ctx, farm.farm_id, &accs.allocator, &zero).is_err());
        assert!(keeper
            .allocate_assets_from_account_to_farm(&mut ctx, farm.farm_id, &accs.allocator, &Coins::empty())
            .is_err());
        let duplicated = Coins::from_sorted_unchecked(vec![Coin::new(1000, "foo"), Coin::new(1000, "foo")]);
        assert!(keeper
            .allocate_assets_from_account_to_farm(&mut ctx, farm.farm_id, &accs.allocator, &duplicated)
            .is_err());
        assert!(matches!(
            keeper.allocate_assets_from_account_to_farm(&mut ctx, farm.farm_id, &accs.acc1, &coins("1000foo")),
            Err(Error::InsufficientFunds { .. })
        ));
        assert_eq!(keeper.get_farm(ctx.store, farm.farm_id).unwrap().current_period, 1);
    }

    #[test]
    fn simple_reward() {
        let mut store = MemoryStorage::new();
        let accs = prepare_accounts(&mut store);
        let keeper = FarmKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let farm_id = keeper.new_farm(&mut ctx).unwrap().farm_id;

        let rewards = keeper.deposit_share_to_farm(&mut ctx, farm_id, &accs.acc1, Uint256::one()).unwrap();
        assert!(rewards.is_empty());
        assert_eq!(foo_balance(ctx.store, &accs.acc1), "0");

        keeper.allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins("1000foo")).unwrap();
        let rewards = keeper.withdraw_rewards_from_farm(&mut ctx, farm_id, &accs.acc1).unwrap();
        assert_eq!(rewards.to_string(), "1000foo");
        assert_eq!(foo_balance(ctx.store, &accs.acc1), "1000");

        keeper.allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins("1000foo")).unwrap();
        keeper.allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins("1000foo")).unwrap();

        let rewards = keeper.deposit_share_to_farm(&mut ctx, farm_id, &accs.acc2, Uint256::one()).unwrap();
        assert!(rewards.is_empty());
        let rewards = keeper.withdraw_rewards_from_farm(&mut ctx, farm_id, &accs.acc2).unwrap();
        assert!(rewards.is_empty());

        let rewards = keeper.withdraw_rewards_from_farm(&mut ctx, farm_id, &accs.acc1).unwrap();
        assert_eq!(rewards.to_string(), "2000foo");
        assert_eq!(foo_balance(ctx.store, &accs.acc1), "3000");
    }

    #[test]
    fn truncated_rewards_stay_in_the_farm() {
        let mut store = MemoryStorage::new();
        let accs = prepare_accounts(&mut store);
        let keeper = FarmKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let farm_id = keeper.new_farm(&mut ctx).unwrap().farm_id;

        keeper.deposit_share_to_farm(&mut ctx, farm_id, &accs.acc1, Uint256::one()).unwrap();
        keeper.allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins("1000foo")).unwrap();

        let rewards = keeper.deposit_share_to_farm(&mut ctx, farm_id, &accs.acc2, Uint256::from(2u128)).unwrap();
        assert!(rewards.is_empty());
        assert_eq!(foo_balance(ctx.store, &accs.acc2), "0");

        keeper.allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins("1000foo")).unwrap();
        keeper.allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins("2000foo")).unwrap();

        let rewards = keeper.withdraw_rewards_from_farm(&mut ctx, farm_id, &accs.acc1).unwrap();
        assert_eq!(rewards.to_string(), "1999foo");
        assert_eq!(foo_balance(ctx.store, &accs.acc1), "1999");
        let rewards = keeper.withdraw_rewards_from_farm(&mut ctx, farm_id, &accs.acc2).unwrap();
        assert_eq!(rewards.to_string(), "1999foo");
        assert_eq!(foo_balance(ctx.store, &accs.acc2), "1999");

        let farm = keeper.get_farm(ctx.store, farm_id).unwrap();
        assert_eq!(farm.outstanding_rewards.to_string(), "2foo");
        assert_eq!(foo_balance(ctx.store, &module_address(FARM_MODULE)), "2");
    }

    #[test]
    fn withdraw_share_checks_before_settling() {
        let mut store = MemoryStorage::new();
        let accs = prepare_accounts(&mut store);
        let keeper = FarmKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let farm_id = keeper.new_farm(&mut ctx).unwrap().farm_id;

        keeper.deposit_share_to_farm(&mut ctx, farm_id, &accs.acc1, Uint256::from(10u128)).unwrap();
        keeper.allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins("1000foo")).unwrap();

        let err = keeper
            .withdraw_share_from_farm(&mut ctx, farm_id, &accs.acc1, Uint256::from(11u128))
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientShare { .. }));
        assert_eq!(foo_balance(ctx.store, &accs.acc1), "0");
        assert_eq!(
            keeper.calculate_pending_rewards(ctx.store, farm_id, &accs.acc1).unwrap().to_string(),
            "1000foo"
        );

        let rewards = keeper
            .withdraw_share_from_farm(&mut ctx, farm_id, &accs.acc1, Uint256::from(10u128))
            .unwrap();
        assert_eq!(rewards.to_string(), "1000foo");
        assert!(keeper.get_farmer(ctx.store, farm_id, &accs.acc1).unwrap().is_none());
        assert!(keeper.get_farm(ctx.store, farm_id).unwrap().total_share.is_zero());
        assert!(matches!(
            keeper.withdraw_rewards_from_farm(&mut ctx, farm_id, &accs.acc1),
            Err(Error::FarmerNotFound { .. })
        ));
    }

    #[test]
    fn allocation_without_shares_is_unclaimable() {
        let mut store = MemoryStorage::new();
        let accs = prepare_accounts(&mut store);
        let keeper = FarmKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let farm_id = keeper.new_farm(&mut ctx).unwrap().farm_id;

        keeper.allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins("500foo")).unwrap();
        keeper.deposit_share_to_farm(&mut ctx, farm_id, &accs.acc1, Uint256::one()).unwrap();
        assert!(keeper.calculate_pending_rewards(ctx.store, farm_id, &accs.acc1).unwrap().is_empty());

        let farm = keeper.get_farm(ctx.store, farm_id).unwrap();
        assert_eq!(farm.current_period, 2);
        assert_eq!(farm.outstanding_rewards.to_string(), "500foo");
        assert!(keeper.get_historical_record(ctx.store, farm_id, 1).unwrap().cumulative_reward_ratio.is_empty());
    }

    // ── Compare with naive per-allocation payouts ──

    struct Step {
        allocation: &'static str,
        diffs: [i64; 3],
    }

    fn step(allocation: &'static str, diffs: [i64; 3]) -> Step {
        Step { allocation, diffs }
    }

    /// Pays every allocation out immediately, truncated per account.
    fn naive_rewards(steps: &[Step]) -> [Coins; 3] {
        let mut shares = [0u128; 3];
        let mut rewards = [Coins::empty(), Coins::empty(), Coins::empty()];
        for s in steps {
            let allocation = coins(s.allocation);
            let total: u128 = shares.iter().sum();
            if !allocation.is_empty() && total > 0 {
                for (share, reward) in shares.iter().zip(rewards.iter_mut()) {
                    if *share == 0 {
                        continue;
                    }
                    let paid: Vec<Coin> = allocation
                        .iter()
                        .map(|c| Coin::from_uint(c.amount.multiply_ratio(*share, total), c.denom.clone()))
                        .filter(|c| !c.amount.is_zero())
                        .collect();
                    *reward = reward.checked_add(&Coins::new(paid).unwrap()).unwrap();
                }
            }
            for (share, diff) in shares.iter_mut().zip(s.diffs) {
                *share = (*share as i128 + diff as i128) as u128;
            }
        }
        rewards
    }

    #[test]
    fn matches_naive_calculation() {
        let steps = [
            step("", [100, 0, 0]),
            step("10000000bar,10000000baz,10000000foo", [0, 0, 0]),
            step("", [0, 100, 0]),
            step("10000000bar,10000000baz,10000000foo", [0, 0, 0]),
            step("", [0, 0, 100]),
            step("20000000bar,20000000baz,20000000foo", [0, 0, 0]),
            step("", [-10, 0, 0]),
            step("25000000baz", [0, 0, 0]),
            step("", [-50, 0, -90]),
            step("25000000foo", [0, 0, 0]),
            step("", [-10, 0, 0]),
            step("15000000bar", [0, 0, 0]),
        ];
        let expected = naive_rewards(&steps);

        let mut store = MemoryStorage::new();
        let accs = prepare_accounts(&mut store);
        let keeper = FarmKeeper::new(StoreBank);
        let mut ctx = Context::new(&mut store, mock_env().block);
        let farm_id = keeper.new_farm(&mut ctx).unwrap().farm_id;

        let addresses = [accs.acc1.clone(), accs.acc2.clone(), accs.acc3.clone()];
        let mut totals = [Coins::empty(), Coins::empty(), Coins::empty()];
        for s in &steps {
            if !s.allocation.is_empty() {
                keeper
                    .allocate_assets_from_account_to_farm(&mut ctx, farm_id, &accs.allocator, &coins(s.allocation))
                    .unwrap();
            }
            for ((address, diff), total) in addresses.iter().zip(s.diffs).zip(totals.iter_mut()) {
                let rewards = match diff {
                    0 => continue,
                    d if d > 0 => keeper.deposit_share_to_farm(&mut ctx, farm_id, address, Uint256::from(d as u128)),
                    d => keeper.withdraw_share_from_farm(&mut ctx, farm_id, address, Uint256::from(d.unsigned_abs() as u128)),
                }
                .unwrap();
                *total = total.checked_add(&rewards).unwrap();
            }
        }
        for (address, total) in addresses.iter().zip(totals.iter_mut()) {
            let rewards = keeper.withdraw_rewards_from_farm(&mut ctx, farm_id, address).unwrap();
            *total = total.checked_add(&rewards).unwrap();
        }

        for ((address, total), expected) in addresses.iter().zip(&totals).zip(&expected) {
            assert_eq!(&StoreBank.get_all_balances(ctx.store, address).unwrap(), total);
            for coin in expected.iter().chain(total.iter()) {
                let a = expected.amount_of(&coin.denom);
                let b = total.amount_of(&coin.denom);
                let delta = if a > b { a - b } else { b - a };
                assert!(delta <= Uint256::one(), "{address}: expected {expected}, got {total}");
            }
        }
    }
}
