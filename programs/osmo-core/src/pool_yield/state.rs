use cosmwasm_std::{Decimal256, Uint256};
use serde::{Deserialize, Serialize};

use crate::{
    coins::validate_denom,
    error::{Error, Result},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Denom collected by the fee collector and handed to farms.
    pub minted_denom: String,
    /// Fraction of the fee collector's `minted_denom` balance allocated per block.
    pub allocation_ratio: Decimal256,
}

impl Default for Params {
    fn default() -> Self {
        Params { minted_denom: "uosmo".into(), allocation_ratio: Decimal256::percent(20) }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.minted_denom)?;
        if self.allocation_ratio > Decimal256::one() {
            return Err(Error::InvalidAllocationRatio(self.allocation_ratio.to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrRecord {
    pub farm_id: u64,
    pub weight: Uint256,
}

/// How each allocation is split across farms.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistrInfo {
    pub total_weight: Uint256,
    pub records: Vec<DistrRecord>,
}

impl DistrInfo {
    pub fn recompute_total_weight(&mut self) -> Result<()> {
        let mut total = Uint256::zero();
        for record in &self.records {
            total = total.checked_add(record.weight)?;
        }
        self.total_weight = total;
        Ok(())
    }
}
