use std::time::Duration;

use cosmwasm_std::{Decimal256, Timestamp};
use serde::{Deserialize, Serialize};

use super::pool_asset::{sort_pool_assets_out_of_place_by_denom, validate_user_specified_weight, PoolAsset};
use crate::{
    coins::Coins,
    error::{Error, Result},
};

/// Module-wide gamm parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Charged to the pool creator and paid into the community pool.
    #[serde(default)]
    pub pool_creation_fee: Coins,
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        self.pool_creation_fee.validate()
    }
}

/// Per-pool fees and the optional weight schedule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolParams {
    pub swap_fee: Decimal256,
    pub exit_fee: Decimal256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smooth_weight_change_params: Option<SmoothWeightChangeParams>,
}

/// Linear interpolation of every asset's weight from `initial_pool_weights`
/// at `start_time` to `target_pool_weights` at `start_time + duration`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothWeightChangeParams {
    /// Zero means "the block time the pool is created at".
    pub start_time: Timestamp,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    /// Filled in at creation from the pool's scaled weights; amounts are zero.
    #[serde(default)]
    pub initial_pool_weights: Vec<PoolAsset>,
    pub target_pool_weights: Vec<PoolAsset>,
}

impl SmoothWeightChangeParams {
    pub fn end_time(&self) -> Timestamp {
        let nanos = u64::try_from(self.duration.as_nanos()).unwrap_or(u64::MAX);
        Timestamp::from_nanos(self.start_time.nanos().saturating_add(nanos))
    }
}

impl PoolParams {
    pub fn new(swap_fee: Decimal256, exit_fee: Decimal256) -> Self {
        PoolParams { swap_fee, exit_fee, smooth_weight_change_params: None }
    }

    /// Checks fees and, when a schedule is present, that its targets cover
    /// exactly the pool's denoms with valid user weights.
    pub fn validate(&self, pool_weights: &[PoolAsset]) -> Result<()> {
        if self.exit_fee >= Decimal256::one() {
            return Err(Error::TooMuchExitFee);
        }
        if self.swap_fee >= Decimal256::one() {
            return Err(Error::TooMuchSwapFee);
        }

        let Some(schedule) = &self.smooth_weight_change_params else {
            return Ok(());
        };
        let targets = &schedule.target_pool_weights;
        if targets.len() != pool_weights.len() {
            return Err(Error::PoolParamsInvalidNumDenoms);
        }
        for target in targets {
            validate_user_specified_weight(target.weight)?;
        }
        let sorted_targets = sort_pool_assets_out_of_place_by_denom(targets);
        let sorted_pool = sort_pool_assets_out_of_place_by_denom(pool_weights);
        for (target, current) in sorted_targets.iter().zip(&sorted_pool) {
            if target.token.denom != current.token.denom {
                return Err(Error::PoolParamsInvalidDenom);
            }
        }
        if schedule.duration.is_zero() {
            return Err(Error::NonPositiveDuration);
        }
        Ok(())
    }
}
