use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};

use crate::coins::{Coins, DecCoins};

/// A reward pool whose payouts are tracked per period instead of per farmer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub farm_id: u64,
    /// Sum of every farmer's share.
    pub total_share: Uint256,
    /// Period the next allocation closes. Starts at 1; period 0 holds the
    /// empty ratio.
    pub current_period: u64,
    /// Allocated to the farm and not yet paid out, truncation dust included.
    #[serde(default)]
    pub outstanding_rewards: Coins,
}

impl Farm {
    pub fn new(farm_id: u64) -> Self {
        Farm {
            farm_id,
            total_share: Uint256::zero(),
            current_period: 1,
            outstanding_rewards: Coins::empty(),
        }
    }

    /// The last period whose cumulative ratio is final.
    pub fn last_closed_period(&self) -> u64 {
        self.current_period.saturating_sub(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farmer {
    pub farm_id: u64,
    pub address: String,
    pub share: Uint256,
    /// Rewards up to and including this period have been settled.
    pub last_withdrawn_period: u64,
}

/// Reward per unit of share accumulated from period 1 through `period`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub farm_id: u64,
    pub period: u64,
    #[serde(default)]
    pub cumulative_reward_ratio: DecCoins,
}
