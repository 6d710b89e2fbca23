//! Fixed-point helpers for the balancer invariant.
//!
//! Amounts and fees enter as `Uint256` / `Decimal256`; every intermediate of
//! the power approximation is carried at 36 decimals and only rounded when
//! converted back to an integer amount.

pub mod pow;
pub mod precise;

pub use pow::{pow, pow_approx};
pub use precise::{PreciseDec, SignedDec};
