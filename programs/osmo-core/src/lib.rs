/// osmo-core: the state machine behind an Osmosis-style chain.
///
/// Three keepers over one `cosmwasm_std::Storage`:
///   gamm        weighted constant-function pools with LBP weight smoothing
///   farm        cumulative-reward-ratio reward accounting
///   pool_yield  per-block distribution of collected fees across farms
///
/// [`App`] dispatches [`Msg`]s to them atomically; `genesis` imports and
/// exports the whole state.

// ─── Foundations ──────────────────────────────────────────────────────────────

pub mod address;
pub mod bank;
pub mod coins;
pub mod constants;
pub mod error;
pub mod math;
pub mod store;

// ─── Modules ──────────────────────────────────────────────────────────────────

pub mod farm;
pub mod gamm;
pub mod pool_yield;

// ─── Entry points ─────────────────────────────────────────────────────────────

pub mod app;
pub mod genesis;
pub mod msg;

pub use app::App;
pub use coins::{Coin, Coins, DecCoin, DecCoins};
pub use error::{Error, Result};
pub use genesis::{export_genesis, init_genesis, GenesisState};
pub use msg::{Msg, MsgResponse, QueryMsg, QueryResponse};
