//! Farms: O(1) per-farmer reward settlement over a cumulative reward ratio.

pub mod keeper;
pub mod state;

pub use keeper::FarmKeeper;
pub use state::{Farm, Farmer, HistoricalRecord};
