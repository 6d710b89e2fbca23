/// Store key prefixes (one byte each, followed by big-endian ids)
pub const POOL_PREFIX: u8 = 0x02;
pub const NEXT_POOL_ID_KEY: &[u8] = &[0x01];
pub const TOTAL_LIQUIDITY_PREFIX: u8 = 0x03;
pub const GAMM_PARAMS_KEY: &[u8] = &[0x04];

pub const FARM_PREFIX: u8 = 0x11;
pub const FARMER_PREFIX: u8 = 0x12;
pub const HISTORICAL_RECORD_PREFIX: u8 = 0x13;
pub const NEXT_FARM_ID_KEY: &[u8] = &[0x10];

pub const DISTR_INFO_KEY: &[u8] = &[0x21];
pub const POOL_YIELD_PARAMS_KEY: &[u8] = &[0x22];

pub const BALANCE_PREFIX: u8 = 0x31;
pub const SUPPLY_PREFIX: u8 = 0x32;
pub const DENOM_METADATA_PREFIX: u8 = 0x33;

/// Module account names
pub const GAMM_MODULE: &str = "gamm";
pub const FARM_MODULE: &str = "farm";
pub const FEE_COLLECTOR_MODULE: &str = "fee_collector";
pub const COMMUNITY_POOL_MODULE: &str = "distribution";
pub const MINT_MODULE: &str = "mint";

/// Human-readable part of every derived account address
pub const BECH32_PREFIX: &str = "osmo";

/// Pool asset bounds
pub const MIN_POOL_ASSETS: usize = 2;
pub const MAX_POOL_ASSETS: usize = 8;

/// User weights must be strictly below 2^20
pub const MAX_USER_SPECIFIED_WEIGHT: u128 = 1 << 20;
/// Internal weights are user weights scaled by 2^30
pub const GUARANTEED_WEIGHT_PRECISION: u128 = 1 << 30;

/// Shares minted to the pool creator: 100 * 10^18
pub const INIT_POOL_SHARES_SUPPLY: u128 = 100_000_000_000_000_000_000;
/// LP share display exponent
pub const ONE_SHARE_EXPONENT: u32 = 18;

/// Significant figures kept by `spot_price`
pub const SPOT_PRICE_SIG_FIGS: u32 = 8;
/// Upper bound on any spot price: 2^128 - 1
pub const MAX_SPOT_PRICE: u128 = u128::MAX;

/// Series cut-off for the fractional power approximation (1e-8 at 36 decimals)
pub const POW_PRECISION_ATOMICS: u128 = 10_000_000_000_000_000_000_000_000_000;
