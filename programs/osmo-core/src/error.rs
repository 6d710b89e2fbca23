//! Error type shared by every keeper.
//!
//! User-input failures are returned as [`Error`]. Broken internal invariants
//! (zero weights inside validated pools, weight vectors that do not match the
//! pool, corrupted records) panic instead: they can only be reached through a
//! bug, never through a message.

use cosmwasm_std::Uint256;

/// All errors returned by osmo-core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Lookup ───────────────────────────────────────────────────────────────
    #[error("pool {0} does not exist")]
    PoolNotFound(u64),

    #[error("can't find the PoolAsset ({0})")]
    PoolAssetNotFound(String),

    #[error("you tried to find the PoolAsset with empty denom")]
    EmptyDenom,

    #[error("farm {0} does not exist")]
    FarmNotFound(u64),

    #[error("farmer {address} not found in farm {farm_id}")]
    FarmerNotFound { farm_id: u64, address: String },

    #[error("historical record for farm {farm_id} period {period} not found")]
    HistoricalRecordNotFound { farm_id: u64, period: u64 },

    // ── Coins / input validation ─────────────────────────────────────────────
    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    #[error("invalid denom: {0}")]
    InvalidDenom(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("repeating pool assets not allowed, found {0}")]
    RepeatingPoolAssets(String),

    #[error("same PoolAsset already exists: {0}")]
    DuplicatePoolAsset(String),

    #[error("can't add the zero or negative balance of token {0}")]
    NonPositiveBalance(String),

    #[error("token weight must be positive, got {0}")]
    NotPositiveWeight(Uint256),

    #[error("user specified token weight should be less than 2^20, got {0}")]
    WeightTooLarge(Uint256),

    #[error("pool should have at least {min} assets, as they must be swapping between at least two assets")]
    TooFewPoolAssets { min: usize },

    #[error("pool has too many PoolAssets ({got}), max is {max}")]
    TooManyPoolAssets { got: usize, max: usize },

    #[error("balancer pool only supports LP'ing with one asset or all assets in pool")]
    InvalidJoinAssetCount,

    #[error("input denom {0} not found in pool")]
    DenomNotInPool(String),

    #[error("cannot swap a denom for itself: {0}")]
    SameDenomSwap(String),

    // ── Pool params ──────────────────────────────────────────────────────────
    #[error("exit fee should be non-negative and lesser than 1")]
    TooMuchExitFee,

    #[error("swap fee should be non-negative and lesser than 1")]
    TooMuchSwapFee,

    #[error("smooth weight change target must have the same number of assets as the pool")]
    PoolParamsInvalidNumDenoms,

    #[error("smooth weight change target denoms do not match the pool assets")]
    PoolParamsInvalidDenom,

    #[error("smooth weight change params must have a positive duration")]
    NonPositiveDuration,

    #[error("invalid future governor: {0}")]
    InvalidFutureGovernor(String),

    // ── Math ─────────────────────────────────────────────────────────────────
    #[error("invalid calculated result: {0}")]
    InvalidMathApprox(String),

    #[error("base must be greater than 0 and lesser than two")]
    PowBaseOutOfRange,

    #[error("arithmetic overflow in {0}")]
    MathOverflow(&'static str),

    #[error("spot price exceeds the maximum allowed spot price")]
    SpotPriceOverflow,

    // ── Limits ───────────────────────────────────────────────────────────────
    #[error("{denom} token is lesser than min amount: {amount} < {min}")]
    LimitMinAmount { denom: String, amount: Uint256, min: Uint256 },

    #[error("{denom} token is larger than max amount: {amount} > {max}")]
    LimitMaxAmount { denom: String, amount: Uint256, max: Uint256 },

    // ── Balances / shares ────────────────────────────────────────────────────
    #[error("insufficient funds: {address} has {available}{denom}, needs {required}{denom}")]
    InsufficientFunds {
        address: String,
        denom: String,
        available: Uint256,
        required: Uint256,
    },

    #[error("insufficient share: farmer has {available}, tried to withdraw {requested}")]
    InsufficientShare { available: Uint256, requested: Uint256 },

    #[error("share must be positive")]
    ZeroShare,

    // ── Pool yield ───────────────────────────────────────────────────────────
    #[error("distribution record index {index} out of bounds (records: {len})")]
    DistrRecordInvalidIndex { index: usize, len: usize },

    #[error("invalid distribution record: {0}")]
    InvalidDistrRecord(String),

    #[error("allocation ratio must be between 0 and 1, got {0}")]
    InvalidAllocationRatio(String),

    // ── Store / codec ────────────────────────────────────────────────────────
    #[error("store codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("genesis error: {0}")]
    Genesis(String),
}

impl From<cosmwasm_std::OverflowError> for Error {
    fn from(_: cosmwasm_std::OverflowError) -> Self {
        Error::MathOverflow("checked integer op")
    }
}

impl From<cosmwasm_std::CheckedFromRatioError> for Error {
    fn from(_: cosmwasm_std::CheckedFromRatioError) -> Self {
        Error::MathOverflow("decimal ratio")
    }
}

impl From<cosmwasm_std::CheckedMultiplyRatioError> for Error {
    fn from(_: cosmwasm_std::CheckedMultiplyRatioError) -> Self {
        Error::MathOverflow("multiply ratio")
    }
}

impl From<cosmwasm_std::ConversionOverflowError> for Error {
    fn from(_: cosmwasm_std::ConversionOverflowError) -> Self {
        Error::MathOverflow("integer conversion")
    }
}

impl From<cosmwasm_std::DecimalRangeExceeded> for Error {
    fn from(_: cosmwasm_std::DecimalRangeExceeded) -> Self {
        Error::MathOverflow("decimal range")
    }
}

impl From<cosmwasm_std::Decimal256RangeExceeded> for Error {
    fn from(_: cosmwasm_std::Decimal256RangeExceeded) -> Self {
        Error::MathOverflow("decimal range")
    }
}

impl From<cosmwasm_std::DivideByZeroError> for Error {
    fn from(_: cosmwasm_std::DivideByZeroError) -> Self {
        Error::MathOverflow("division by zero")
    }
}

/// Convenience alias so every module can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;
