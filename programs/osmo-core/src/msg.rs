//! Messages accepted by [`crate::App::execute`] and queries answered by
//! [`crate::App::query`], with their responses.

use cosmwasm_std::{Decimal256, Uint256};
use serde::{Deserialize, Serialize};

use crate::{
    coins::{Coin, Coins, DecCoins},
    farm::{Farm, Farmer},
    gamm::{Pool, PoolAsset, PoolParams},
    pool_yield::{DistrInfo, DistrRecord},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Msg {
    // ── Gamm ──
    CreatePool {
        sender: String,
        pool_params: PoolParams,
        pool_assets: Vec<PoolAsset>,
        #[serde(default)]
        future_pool_governor: String,
    },
    JoinPool {
        sender: String,
        pool_id: u64,
        share_out_amount: Uint256,
        #[serde(default)]
        token_in_maxs: Coins,
    },
    JoinSwapExternAmountIn {
        sender: String,
        pool_id: u64,
        token_in: Coin,
        share_out_min_amount: Uint256,
    },
    JoinSwapShareAmountOut {
        sender: String,
        pool_id: u64,
        token_in_denom: String,
        share_out_amount: Uint256,
        token_in_max_amount: Uint256,
    },
    ExitPool {
        sender: String,
        pool_id: u64,
        share_in_amount: Uint256,
        #[serde(default)]
        token_out_mins: Coins,
    },
    ExitSwapShareAmountIn {
        sender: String,
        pool_id: u64,
        token_out_denom: String,
        share_in_amount: Uint256,
        token_out_min_amount: Uint256,
    },
    ExitSwapExternAmountOut {
        sender: String,
        pool_id: u64,
        token_out: Coin,
        share_in_max_amount: Uint256,
    },
    SwapExactAmountIn {
        sender: String,
        pool_id: u64,
        token_in: Coin,
        token_out_denom: String,
        token_out_min_amount: Uint256,
    },
    SwapExactAmountOut {
        sender: String,
        pool_id: u64,
        token_in_denom: String,
        token_in_max_amount: Uint256,
        token_out: Coin,
    },
    PokePool {
        pool_id: u64,
    },

    // ── Farm ──
    NewFarm {},
    AllocateToFarm {
        sender: String,
        farm_id: u64,
        assets: Coins,
    },
    DepositShare {
        farm_id: u64,
        address: String,
        share: Uint256,
    },
    WithdrawShare {
        farm_id: u64,
        address: String,
        share: Uint256,
    },
    WithdrawRewards {
        farm_id: u64,
        address: String,
    },

    // ── Pool yield ──
    AddDistrRecords {
        records: Vec<DistrRecord>,
    },
    RemoveDistrRecords {
        indexes: Vec<usize>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgResponse {
    PoolCreated { pool_id: u64 },
    FarmCreated { farm_id: u64 },
    /// Coins paid in or out by the message.
    Coins { coins: Coins },
    /// Single amount: shares minted or burned, tokens bought or sold.
    Amount { amount: Uint256 },
    Pool { pool: Pool },
    Empty {},
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMsg {
    Pool {
        pool_id: u64,
    },
    Pools {},
    PoolAssets {
        pool_id: u64,
        #[serde(default)]
        denoms: Vec<String>,
    },
    SpotPrice {
        pool_id: u64,
        quote_denom: String,
        base_denom: String,
    },
    TotalLiquidity {},
    Farm {
        farm_id: u64,
    },
    Farmer {
        farm_id: u64,
        address: String,
    },
    PendingRewards {
        farm_id: u64,
        address: String,
    },
    DistrInfo {},
    AllocatableAsset {},
    Balances {
        address: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryResponse {
    Pool { pool: Pool },
    Pools { pools: Vec<Pool> },
    PoolAssets { pool_assets: Vec<PoolAsset> },
    SpotPrice { spot_price: Decimal256 },
    TotalLiquidity { liquidity: Coins },
    Farm { farm: Farm },
    Farmer { farmer: Option<Farmer> },
    PendingRewards { rewards: DecCoins },
    DistrInfo { distr_info: DistrInfo },
    AllocatableAsset { asset: Coin },
    Balances { coins: Coins },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_snake_case_tags() {
        let msg = Msg::SwapExactAmountIn {
            sender: "osmo1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9nck".into(),
            pool_id: 1,
            token_in: Coin::new(1000, "uosmo"),
            token_out_denom: "uatom".into(),
            token_out_min_amount: Uint256::from(1u128),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["swap_exact_amount_in"]["token_in"]["amount"], "1000");
        assert_eq!(serde_json::from_value::<Msg>(json).unwrap(), msg);
    }

    #[test]
    fn optional_bounds_default_to_empty() {
        let msg: Msg = serde_json::from_str(
            r#"{"exit_pool":{"sender":"osmo1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9nck","pool_id":1,"share_in_amount":"10"}}"#,
        )
        .unwrap();
        let Msg::ExitPool { token_out_mins, .. } = msg else { panic!("wrong variant") };
        assert!(token_out_mins.is_empty());
    }
}
