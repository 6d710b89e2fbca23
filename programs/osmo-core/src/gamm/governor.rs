//! Future pool governor strings.
//!
//! Accepted forms:
//!   ""                      no governor
//!   "osmo1…"                a governing account
//!   "<lp denom>,<duration>" holders of that LP token locked for the duration
//!   "<duration>"            holders of this pool's LP token locked that long

use crate::{
    address::validate_address,
    coins::validate_denom,
    error::{Error, Result},
};

pub fn validate_future_governor(governor: &str) -> Result<()> {
    if governor.is_empty() || validate_address(governor).is_ok() {
        return Ok(());
    }

    let invalid = || Error::InvalidFutureGovernor(governor.to_string());
    let parts: Vec<&str> = governor.split(',').collect();
    let lock_time = match parts.as_slice() {
        [lp_denom, lock_time] => {
            validate_denom(lp_denom).map_err(|_| invalid())?;
            *lock_time
        }
        [lock_time] => *lock_time,
        _ => return Err(invalid()),
    };

    // A zero lock duration is allowed.
    humantime::parse_duration(lock_time.trim()).map_err(|_| invalid())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_forms() {
        validate_future_governor("").unwrap();
        validate_future_governor("osmo1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9nck").unwrap();
        validate_future_governor("gamm/pool/1,1000h").unwrap();
        validate_future_governor("1000h").unwrap();
        validate_future_governor("0s").unwrap();
    }

    #[test]
    fn rejected_forms() {
        for bad in ["osmo1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9ncx", "gamm/pool/1,1000h,1h", "1,1000h", "lptoken,notaduration", "abc"] {
            assert!(
                matches!(validate_future_governor(bad), Err(Error::InvalidFutureGovernor(_))),
                "{bad} should be rejected"
            );
        }
    }
}
