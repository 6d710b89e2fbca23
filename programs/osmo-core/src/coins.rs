//! Fungible amounts: integer [`Coin`]s and 18-decimal [`DecCoin`]s, plus the
//! sorted, de-duplicated collections every keeper passes around.

use std::{fmt, str::FromStr, sync::LazyLock};

use cosmwasm_std::{Decimal256, Uint256};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static DENOM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9/:._-]{2,127}$").expect("denom regex is valid")
});

static COIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]+)([a-zA-Z][a-zA-Z0-9/:._-]{2,127})$").expect("coin regex is valid")
});

pub fn validate_denom(denom: &str) -> Result<()> {
    if DENOM_RE.is_match(denom) {
        Ok(())
    } else {
        Err(Error::InvalidDenom(denom.to_string()))
    }
}

// ─── Coin ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Uint256,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Coin { denom: denom.into(), amount: Uint256::from(amount) }
    }

    pub fn from_uint(amount: Uint256, denom: impl Into<String>) -> Self {
        Coin { denom: denom.into(), amount }
    }

    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.denom)?;
        if self.amount.is_zero() {
            return Err(Error::InvalidCoins(format!("coin {self} amount is not positive")));
        }
        Ok(())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = COIN_RE
            .captures(s.trim())
            .ok_or_else(|| Error::InvalidCoins(format!("invalid coin expression: {s}")))?;
        let amount = Uint256::from_str(&caps[1])
            .map_err(|_| Error::InvalidCoins(format!("invalid coin amount: {s}")))?;
        Ok(Coin { denom: caps[2].to_string(), amount })
    }
}

// ─── Coins ────────────────────────────────────────────────────────────────────
// Sorted by denom, strictly increasing, every amount positive. Construct with
// `Coins::new` (validating) or `Coins::from_sorted_unchecked` when the caller
// already upholds the invariant.

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Sorts and validates; zero amounts and duplicate denoms are rejected.
    pub fn new(mut coins: Vec<Coin>) -> Result<Self> {
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        let coins = Coins(coins);
        coins.validate()?;
        Ok(coins)
    }

    pub fn from_sorted_unchecked(coins: Vec<Coin>) -> Self {
        Coins(coins)
    }

    pub fn empty() -> Self {
        Coins(Vec::new())
    }

    pub fn validate(&self) -> Result<()> {
        for (i, coin) in self.0.iter().enumerate() {
            coin.validate()?;
            if i > 0 {
                let prev = &self.0[i - 1].denom;
                if prev == &coin.denom {
                    return Err(Error::InvalidCoins(format!("duplicate denomination {}", coin.denom)));
                }
                if prev > &coin.denom {
                    return Err(Error::InvalidCoins(format!("denomination {} is not sorted", coin.denom)));
                }
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Coin> {
        self.0
    }

    pub fn denoms(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.denom.as_str()).collect()
    }

    pub fn amount_of(&self, denom: &str) -> Uint256 {
        self.0
            .binary_search_by(|c| c.denom.as_str().cmp(denom))
            .map(|i| self.0[i].amount)
            .unwrap_or_default()
    }

    pub fn checked_add(&self, other: &Coins) -> Result<Coins> {
        let mut out = self.0.clone();
        for coin in other.iter() {
            match out.binary_search_by(|c| c.denom.cmp(&coin.denom)) {
                Ok(i) => out[i].amount = out[i].amount.checked_add(coin.amount)?,
                Err(i) => out.insert(i, coin.clone()),
            }
        }
        out.retain(|c| !c.amount.is_zero());
        Ok(Coins(out))
    }

    /// Fails when any denom of `other` exceeds what `self` holds.
    pub fn checked_sub(&self, other: &Coins) -> Result<Coins> {
        let mut out = self.0.clone();
        for coin in other.iter() {
            let i = out
                .binary_search_by(|c| c.denom.cmp(&coin.denom))
                .map_err(|_| Error::InvalidCoins(format!("negative coin amount: {}", coin.denom)))?;
            out[i].amount = out[i]
                .amount
                .checked_sub(coin.amount)
                .map_err(|_| Error::InvalidCoins(format!("negative coin amount: {}", coin.denom)))?;
        }
        out.retain(|c| !c.amount.is_zero());
        Ok(Coins(out))
    }

    /// `true` when every denom in `self` is covered by `other` with at least
    /// the same amount.
    pub fn is_all_lte(&self, other: &Coins) -> bool {
        self.0.iter().all(|c| c.amount <= other.amount_of(&c.denom))
    }
}

impl IntoIterator for Coins {
    type Item = Coin;
    type IntoIter = std::vec::IntoIter<Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        if coin.amount.is_zero() {
            Coins::empty()
        } else {
            Coins(vec![coin])
        }
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Coin::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl FromStr for Coins {
    type Err = Error;

    /// Parses `"100uosmo,5uatom"`; an empty string is the empty set.
    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Coins::empty());
        }
        let coins = s.split(',').map(Coin::from_str).collect::<Result<Vec<_>>>()?;
        Coins::new(coins)
    }
}

// ─── DecCoins ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Decimal256,
}

impl fmt::Display for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecCoins(Vec<DecCoin>);

impl DecCoins {
    pub fn empty() -> Self {
        DecCoins(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecCoin> {
        self.0.iter()
    }

    pub fn amount_of(&self, denom: &str) -> Decimal256 {
        self.0
            .binary_search_by(|c| c.denom.as_str().cmp(denom))
            .map(|i| self.0[i].amount)
            .unwrap_or_default()
    }

    /// Each coin divided by `divisor`, truncated to 18 decimals.
    pub fn from_coins_ratio(coins: &Coins, divisor: Uint256) -> Result<Self> {
        let mut out = Vec::with_capacity(coins.len());
        for coin in coins {
            let amount = Decimal256::checked_from_ratio(coin.amount, divisor)?;
            if !amount.is_zero() {
                out.push(DecCoin { denom: coin.denom.clone(), amount });
            }
        }
        Ok(DecCoins(out))
    }

    pub fn checked_add(&self, other: &DecCoins) -> Result<DecCoins> {
        let mut out = self.0.clone();
        for coin in other.iter() {
            match out.binary_search_by(|c| c.denom.cmp(&coin.denom)) {
                Ok(i) => out[i].amount = out[i].amount.checked_add(coin.amount)?,
                Err(i) => out.insert(i, coin.clone()),
            }
        }
        out.retain(|c| !c.amount.is_zero());
        Ok(DecCoins(out))
    }

    pub fn checked_sub(&self, other: &DecCoins) -> Result<DecCoins> {
        let mut out = self.0.clone();
        for coin in other.iter() {
            let i = out
                .binary_search_by(|c| c.denom.cmp(&coin.denom))
                .map_err(|_| Error::InvalidCoins(format!("negative decimal coin amount: {}", coin.denom)))?;
            out[i].amount = out[i].amount.checked_sub(coin.amount)?;
        }
        out.retain(|c| !c.amount.is_zero());
        Ok(DecCoins(out))
    }

    /// Multiplies every amount by an integer.
    pub fn checked_mul_uint(&self, factor: Uint256) -> Result<DecCoins> {
        let factor = Decimal256::checked_from_ratio(factor, Uint256::one())?;
        let mut out = Vec::with_capacity(self.0.len());
        for coin in self.iter() {
            let amount = coin.amount.checked_mul(factor)?;
            if !amount.is_zero() {
                out.push(DecCoin { denom: coin.denom.clone(), amount });
            }
        }
        Ok(DecCoins(out))
    }

    /// Splits into whole coins and the fractional change left behind.
    pub fn truncate_decimal(&self) -> (Coins, DecCoins) {
        let mut whole = Vec::new();
        let mut change = Vec::new();
        for coin in self.iter() {
            let floor = coin.amount.floor();
            let int = coin.amount.to_uint_floor();
            if !int.is_zero() {
                whole.push(Coin { denom: coin.denom.clone(), amount: int });
            }
            let rest = coin.amount - floor;
            if !rest.is_zero() {
                change.push(DecCoin { denom: coin.denom.clone(), amount: rest });
            }
        }
        (Coins(whole), DecCoins(change))
    }
}

impl fmt::Display for DecCoins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(DecCoin::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}
