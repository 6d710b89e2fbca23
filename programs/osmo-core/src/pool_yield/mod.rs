//! Per-block distribution of collected fees across farms.

pub mod keeper;
pub mod state;

pub use keeper::PoolYieldKeeper;
pub use state::{DistrInfo, DistrRecord, Params};
