//! Weighted constant-function AMM (balancer pools).

pub mod amm;
pub mod governor;
pub mod keeper;
pub mod params;
pub mod pool;
pub mod pool_asset;

pub use keeper::GammKeeper;
pub use params::{Params, PoolParams, SmoothWeightChangeParams};
pub use pool::{pool_share_denom, Pool};
pub use pool_asset::PoolAsset;
