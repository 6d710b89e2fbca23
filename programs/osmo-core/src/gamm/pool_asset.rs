use std::collections::BTreeMap;

use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};

use crate::{
    coins::{Coin, Coins},
    constants::MAX_USER_SPECIFIED_WEIGHT,
    error::{Error, Result},
};

/// One side of a pool: the balance held and its (scaled) weight.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolAsset {
    pub token: Coin,
    pub weight: Uint256,
}

impl PoolAsset {
    pub fn new(token: Coin, weight: u128) -> Self {
        PoolAsset { token, weight: Uint256::from(weight) }
    }

    pub fn denom(&self) -> &str {
        &self.token.denom
    }

    pub fn validate_weight(&self) -> Result<()> {
        if self.weight.is_zero() {
            return Err(Error::NotPositiveWeight(self.weight));
        }
        Ok(())
    }
}

/// Weights taken from user input must lie in `[1, 2^20)`.
pub fn validate_user_specified_weight(weight: Uint256) -> Result<()> {
    if weight.is_zero() {
        return Err(Error::NotPositiveWeight(weight));
    }
    if weight >= Uint256::from(MAX_USER_SPECIFIED_WEIGHT) {
        return Err(Error::WeightTooLarge(weight));
    }
    Ok(())
}

pub fn sort_pool_assets_by_denom(assets: &mut [PoolAsset]) {
    assets.sort_by(|a, b| a.token.denom.cmp(&b.token.denom));
}

pub fn sort_pool_assets_out_of_place_by_denom(assets: &[PoolAsset]) -> Vec<PoolAsset> {
    let mut sorted = assets.to_vec();
    sort_pool_assets_by_denom(&mut sorted);
    sorted
}

/// The balances of `assets` as a coin set.
pub fn pool_assets_coins(assets: &[PoolAsset]) -> Result<Coins> {
    Coins::new(assets.iter().map(|a| a.token.clone()).collect())
}

/// Indexes `assets` by denom; a denom seen twice is an error.
pub fn get_pool_assets_by_denom(assets: &[PoolAsset]) -> Result<BTreeMap<String, PoolAsset>> {
    let mut by_denom = BTreeMap::new();
    for asset in assets {
        if by_denom.insert(asset.token.denom.clone(), asset.clone()).is_some() {
            return Err(Error::RepeatingPoolAssets(asset.token.denom.clone()));
        }
    }
    Ok(by_denom)
}

pub fn ensure_denoms_in_pool(by_denom: &BTreeMap<String, PoolAsset>, tokens: &Coins) -> Result<()> {
    for coin in tokens {
        if !by_denom.contains_key(&coin.denom) {
            return Err(Error::DenomNotInPool(coin.denom.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeating_denoms_are_rejected() {
        let assets = vec![
            PoolAsset::new(Coin::new(100, "uatom"), 1),
            PoolAsset::new(Coin::new(200, "uosmo"), 1),
            PoolAsset::new(Coin::new(300, "uatom"), 2),
        ];
        let err = get_pool_assets_by_denom(&assets).unwrap_err();
        assert_eq!(err.to_string(), "repeating pool assets not allowed, found uatom");
    }

    #[test]
    fn by_denom_indexes_every_asset() {
        let assets = vec![
            PoolAsset::new(Coin::new(200, "uosmo"), 2),
            PoolAsset::new(Coin::new(100, "uatom"), 1),
        ];
        let map = get_pool_assets_by_denom(&assets).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["uosmo"].weight, Uint256::from(2u128));

        let foreign: Coins = "5ufoo".parse().unwrap();
        assert!(matches!(ensure_denoms_in_pool(&map, &foreign), Err(Error::DenomNotInPool(_))));
    }

    #[test]
    fn user_weight_bounds() {
        assert!(validate_user_specified_weight(Uint256::zero()).is_err());
        validate_user_specified_weight(Uint256::one()).unwrap();
        validate_user_specified_weight(Uint256::from(MAX_USER_SPECIFIED_WEIGHT - 1)).unwrap();
        assert!(matches!(
            validate_user_specified_weight(Uint256::from(MAX_USER_SPECIFIED_WEIGHT)),
            Err(Error::WeightTooLarge(_))
        ));
    }

    #[test]
    fn sorts_by_denom() {
        let mut assets = vec![
            PoolAsset::new(Coin::new(1, "uosmo"), 1),
            PoolAsset::new(Coin::new(1, "uatom"), 1),
            PoolAsset::new(Coin::new(1, "ubtc"), 1),
        ];
        sort_pool_assets_by_denom(&mut assets);
        let denoms: Vec<&str> = assets.iter().map(PoolAsset::denom).collect();
        assert_eq!(denoms, vec!["uatom", "ubtc", "uosmo"]);
    }
}
