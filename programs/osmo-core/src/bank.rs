//! Bank capability consumed by every keeper.
//!
//! [`BankKeeper`] is the seam; [`StoreBank`] is the in-process implementation
//! whose balances live in the same store as the rest of the state, so a
//! rolled-back message rolls back its transfers too.

use cosmwasm_std::{Storage, Uint256};
use serde::{Deserialize, Serialize};

use crate::{
    address::{module_address, validate_address},
    coins::{Coin, Coins},
    constants::{BALANCE_PREFIX, DENOM_METADATA_PREFIX, SUPPLY_PREFIX},
    error::{Error, Result},
    store::{self, address_denom_key, address_prefix, denom_key},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub description: String,
    pub denom_units: Vec<DenomUnit>,
    pub base: String,
    pub display: String,
}

/// One account's holdings, as exported in genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: String,
    pub coins: Coins,
}

pub trait BankKeeper {
    fn get_balance(&self, store: &dyn Storage, address: &str, denom: &str) -> Result<Coin>;

    fn get_all_balances(&self, store: &dyn Storage, address: &str) -> Result<Coins>;

    fn get_supply(&self, store: &dyn Storage, denom: &str) -> Result<Coin>;

    fn send_coins(&self, store: &mut dyn Storage, from: &str, to: &str, amount: &Coins) -> Result<()>;

    /// Credits `module`'s account and the total supply.
    fn mint_coins(&self, store: &mut dyn Storage, module: &str, amount: &Coins) -> Result<()>;

    /// Debits `module`'s account and the total supply.
    fn burn_coins(&self, store: &mut dyn Storage, module: &str, amount: &Coins) -> Result<()>;

    fn set_denom_metadata(&self, store: &mut dyn Storage, metadata: &Metadata) -> Result<()>;

    fn get_denom_metadata(&self, store: &dyn Storage, denom: &str) -> Result<Option<Metadata>>;

    fn send_coins_from_module_to_account(
        &self,
        store: &mut dyn Storage,
        module: &str,
        to: &str,
        amount: &Coins,
    ) -> Result<()> {
        self.send_coins(store, &module_address(module), to, amount)
    }

    fn send_coins_from_account_to_module(
        &self,
        store: &mut dyn Storage,
        from: &str,
        module: &str,
        amount: &Coins,
    ) -> Result<()> {
        self.send_coins(store, from, &module_address(module), amount)
    }

    fn send_coins_from_module_to_module(
        &self,
        store: &mut dyn Storage,
        from_module: &str,
        to_module: &str,
        amount: &Coins,
    ) -> Result<()> {
        self.send_coins(store, &module_address(from_module), &module_address(to_module), amount)
    }
}

// ─── StoreBank ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default)]
pub struct StoreBank;

impl StoreBank {
    fn balance(store: &dyn Storage, address: &str, denom: &str) -> Result<Uint256> {
        Ok(store::load(store, &address_denom_key(BALANCE_PREFIX, address, denom)?)?.unwrap_or_default())
    }

    fn set_balance(store: &mut dyn Storage, address: &str, denom: &str, amount: Uint256) -> Result<()> {
        let key = address_denom_key(BALANCE_PREFIX, address, denom)?;
        if amount.is_zero() {
            store::remove(store, &key);
            Ok(())
        } else {
            store::save(store, &key, &amount)
        }
    }

    fn supply(store: &dyn Storage, denom: &str) -> Result<Uint256> {
        Ok(store::load(store, &denom_key(SUPPLY_PREFIX, denom))?.unwrap_or_default())
    }

    fn ensure_spendable(store: &dyn Storage, address: &str, amount: &Coins) -> Result<()> {
        for coin in amount {
            let available = Self::balance(store, address, &coin.denom)?;
            if available < coin.amount {
                return Err(Error::InsufficientFunds {
                    address: address.to_string(),
                    denom: coin.denom.clone(),
                    available,
                    required: coin.amount,
                });
            }
        }
        Ok(())
    }

    /// Every non-zero balance in the store, grouped by address.
    pub fn all_balances(store: &dyn Storage) -> Result<Vec<Balance>> {
        let mut out: Vec<Balance> = Vec::new();
        for (key, value) in store::prefix_records(store, &[BALANCE_PREFIX]) {
            let addr_len = key[1] as usize;
            let address = String::from_utf8_lossy(&key[2..2 + addr_len]).into_owned();
            let denom = String::from_utf8_lossy(&key[2 + addr_len..]).into_owned();
            let amount: Uint256 = serde_json::from_slice(&value)?;
            let coin = Coin::from_uint(amount, denom);
            match out.last_mut() {
                Some(last) if last.address == address => {
                    last.coins = last.coins.checked_add(&Coins::from(coin))?;
                }
                _ => out.push(Balance { address, coins: Coins::from(coin) }),
            }
        }
        Ok(out)
    }

    /// Credits `balances` and grows the supply to match. Genesis only.
    pub fn init_balances(store: &mut dyn Storage, balances: &[Balance]) -> Result<()> {
        for balance in balances {
            validate_address(&balance.address)?;
            balance.coins.validate()?;
            for coin in &balance.coins {
                let current = Self::balance(store, &balance.address, &coin.denom)?;
                Self::set_balance(store, &balance.address, &coin.denom, current.checked_add(coin.amount)?)?;
                let supply = Self::supply(store, &coin.denom)?.checked_add(coin.amount)?;
                store::save(store, &denom_key(SUPPLY_PREFIX, &coin.denom), &supply)?;
            }
        }
        Ok(())
    }

    pub fn all_denom_metadata(store: &dyn Storage) -> Result<Vec<Metadata>> {
        store::load_prefix(store, &[DENOM_METADATA_PREFIX])
    }
}

impl BankKeeper for StoreBank {
    fn get_balance(&self, store: &dyn Storage, address: &str, denom: &str) -> Result<Coin> {
        Ok(Coin::from_uint(Self::balance(store, address, denom)?, denom))
    }

    fn get_all_balances(&self, store: &dyn Storage, address: &str) -> Result<Coins> {
        let prefix = address_prefix(BALANCE_PREFIX, address)?;
        let mut coins = Vec::new();
        for (key, value) in store::prefix_records(store, &prefix) {
            let denom = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            coins.push(Coin::from_uint(serde_json::from_slice(&value)?, denom));
        }
        Coins::new(coins)
    }

    fn get_supply(&self, store: &dyn Storage, denom: &str) -> Result<Coin> {
        Ok(Coin::from_uint(Self::supply(store, denom)?, denom))
    }

    fn send_coins(&self, store: &mut dyn Storage, from: &str, to: &str, amount: &Coins) -> Result<()> {
        amount.validate()?;
        Self::ensure_spendable(store, from, amount)?;
        for coin in amount {
            let from_balance = Self::balance(store, from, &coin.denom)?;
            Self::set_balance(store, from, &coin.denom, from_balance.checked_sub(coin.amount)?)?;
            let to_balance = Self::balance(store, to, &coin.denom)?;
            Self::set_balance(store, to, &coin.denom, to_balance.checked_add(coin.amount)?)?;
        }
        tracing::trace!(%from, %to, %amount, "bank send");
        Ok(())
    }

    fn mint_coins(&self, store: &mut dyn Storage, module: &str, amount: &Coins) -> Result<()> {
        amount.validate()?;
        let account = module_address(module);
        for coin in amount {
            let supply = Self::supply(store, &coin.denom)?.checked_add(coin.amount)?;
            store::save(store, &denom_key(SUPPLY_PREFIX, &coin.denom), &supply)?;
            let balance = Self::balance(store, &account, &coin.denom)?;
            Self::set_balance(store, &account, &coin.denom, balance.checked_add(coin.amount)?)?;
        }
        tracing::trace!(%module, %amount, "minted");
        Ok(())
    }

    fn burn_coins(&self, store: &mut dyn Storage, module: &str, amount: &Coins) -> Result<()> {
        amount.validate()?;
        let account = module_address(module);
        Self::ensure_spendable(store, &account, amount)?;
        for coin in amount {
            let balance = Self::balance(store, &account, &coin.denom)?;
            Self::set_balance(store, &account, &coin.denom, balance.checked_sub(coin.amount)?)?;
            let supply = Self::supply(store, &coin.denom)?.checked_sub(coin.amount)?;
            store::save(store, &denom_key(SUPPLY_PREFIX, &coin.denom), &supply)?;
        }
        tracing::trace!(%module, %amount, "burned");
        Ok(())
    }

    fn set_denom_metadata(&self, store: &mut dyn Storage, metadata: &Metadata) -> Result<()> {
        store::save(store, &denom_key(DENOM_METADATA_PREFIX, &metadata.base), metadata)
    }

    fn get_denom_metadata(&self, store: &dyn Storage, denom: &str) -> Result<Option<Metadata>> {
        store::load(store, &denom_key(DENOM_METADATA_PREFIX, denom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MINT_MODULE;
    use cosmwasm_std::MemoryStorage;

    const ALICE: &str = "osmo1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9nck";

    fn coins(s: &str) -> Coins {
        s.parse().unwrap()
    }

    #[test]
    fn mint_send_burn() {
        let mut store = MemoryStorage::new();
        let bank = StoreBank;
        bank.mint_coins(&mut store, MINT_MODULE, &coins("100foo")).unwrap();
        bank.send_coins_from_module_to_account(&mut store, MINT_MODULE, ALICE, &coins("60foo"))
            .unwrap();
        assert_eq!(bank.get_balance(&store, ALICE, "foo").unwrap().amount, Uint256::from(60u128));
        assert_eq!(bank.get_supply(&store, "foo").unwrap().amount, Uint256::from(100u128));

        bank.send_coins_from_account_to_module(&mut store, ALICE, MINT_MODULE, &coins("60foo"))
            .unwrap();
        bank.burn_coins(&mut store, MINT_MODULE, &coins("100foo")).unwrap();
        assert!(bank.get_supply(&store, "foo").unwrap().amount.is_zero());
        assert!(StoreBank::all_balances(&store).unwrap().is_empty());
    }

    #[test]
    fn insufficient_send_changes_nothing() {
        let mut store = MemoryStorage::new();
        let bank = StoreBank;
        bank.mint_coins(&mut store, MINT_MODULE, &coins("10bar,100foo")).unwrap();
        let mint = module_address(MINT_MODULE);

        let err = bank.send_coins(&mut store, &mint, ALICE, &coins("11bar,5foo")).unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert_eq!(bank.get_all_balances(&store, &mint).unwrap(), coins("10bar,100foo"));
        assert!(bank.get_all_balances(&store, ALICE).unwrap().is_empty());
    }

    #[test]
    fn all_balances_groups_by_address() {
        let mut store = MemoryStorage::new();
        let bank = StoreBank;
        bank.mint_coins(&mut store, MINT_MODULE, &coins("10bar,100foo")).unwrap();
        bank.send_coins_from_module_to_account(&mut store, MINT_MODULE, ALICE, &coins("1bar,1foo"))
            .unwrap();
        let all = StoreBank::all_balances(&store).unwrap();
        assert_eq!(all.len(), 2);
        let alice = all.iter().find(|b| b.address == ALICE).unwrap();
        assert_eq!(alice.coins, coins("1bar,1foo"));
    }
}
