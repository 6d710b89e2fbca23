//! Key layout and typed access on top of `cosmwasm_std::Storage`.
//!
//! Keys are `prefix-byte ‖ be(u64 id) [‖ be(u64 period) | ‖ address]`, values
//! are JSON. [`CacheStore`] buffers writes so a failed message never reaches
//! the parent store.

use std::collections::BTreeMap;

use cosmwasm_std::{BlockInfo, Order, Record, Storage};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

// ─── Context ──────────────────────────────────────────────────────────────────

/// Everything a keeper call may touch: the store and the current block.
pub struct Context<'a> {
    pub store: &'a mut dyn Storage,
    pub block: BlockInfo,
}

impl<'a> Context<'a> {
    pub fn new(store: &'a mut dyn Storage, block: BlockInfo) -> Self {
        Context { store, block }
    }
}

// ─── Keys ─────────────────────────────────────────────────────────────────────

pub fn id_key(prefix: u8, id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(9);
    key.push(prefix);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

pub fn id_period_key(prefix: u8, id: u64, period: u64) -> Vec<u8> {
    let mut key = id_key(prefix, id);
    key.extend_from_slice(&period.to_be_bytes());
    key
}

pub fn id_address_key(prefix: u8, id: u64, address: &str) -> Vec<u8> {
    let mut key = id_key(prefix, id);
    key.extend_from_slice(address.as_bytes());
    key
}

/// `prefix ‖ len(address) ‖ address ‖ denom`; the length byte keeps one
/// address from being a prefix of another.
pub fn address_denom_key(prefix: u8, address: &str, denom: &str) -> Result<Vec<u8>> {
    let mut key = address_prefix(prefix, address)?;
    key.extend_from_slice(denom.as_bytes());
    Ok(key)
}

/// Fails for addresses longer than 255 bytes, which the length byte can't hold.
pub fn address_prefix(prefix: u8, address: &str) -> Result<Vec<u8>> {
    let len = u8::try_from(address.len())
        .map_err(|_| Error::InvalidAddress(format!("{} bytes is too long for a store key", address.len())))?;
    let mut key = Vec::with_capacity(2 + address.len());
    key.push(prefix);
    key.push(len);
    key.extend_from_slice(address.as_bytes());
    Ok(key)
}

pub fn denom_key(prefix: u8, denom: &str) -> Vec<u8> {
    let mut key = vec![prefix];
    key.extend_from_slice(denom.as_bytes());
    key
}

/// Smallest key strictly greater than every key starting with `prefix`.
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

// ─── Typed access ─────────────────────────────────────────────────────────────

pub fn load<T: DeserializeOwned>(store: &dyn Storage, key: &[u8]) -> Result<Option<T>> {
    match store.get(key) {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

pub fn save<T: Serialize>(store: &mut dyn Storage, key: &[u8], value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    store.set(key, &bytes);
    Ok(())
}

pub fn remove(store: &mut dyn Storage, key: &[u8]) {
    store.remove(key);
}

/// All records under `prefix`, ascending by key.
pub fn prefix_records(store: &dyn Storage, prefix: &[u8]) -> Vec<Record> {
    let end = prefix_end(prefix);
    store.range(Some(prefix), end.as_deref(), Order::Ascending).collect()
}

pub fn load_prefix<T: DeserializeOwned>(store: &dyn Storage, prefix: &[u8]) -> Result<Vec<T>> {
    prefix_records(store, prefix)
        .into_iter()
        .map(|(_, v)| serde_json::from_slice(&v).map_err(Into::into))
        .collect()
}

// ─── CacheStore ───────────────────────────────────────────────────────────────

/// Write-buffering overlay. Reads fall through to the parent; nothing reaches
/// the parent until [`CacheStore::commit`].
pub struct CacheStore<'a> {
    parent: &'a mut dyn Storage,
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a mut dyn Storage) -> Self {
        CacheStore { parent, writes: BTreeMap::new() }
    }

    pub fn commit(self) {
        for (key, value) in self.writes {
            match value {
                Some(v) => self.parent.set(&key, &v),
                None => self.parent.remove(&key),
            }
        }
    }
}

impl Storage for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.writes.get(key) {
            Some(Some(v)) => Some(v.clone()),
            Some(None) => None,
            None => self.parent.get(key),
        }
    }

    fn range<'b>(
        &'b self,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
        order: Order,
    ) -> Box<dyn Iterator<Item = Record> + 'b> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.range(start, end, Order::Ascending).collect();
        let in_bounds = |k: &[u8]| {
            start.map_or(true, |s| k >= s) && end.map_or(true, |e| k < e)
        };
        for (key, value) in self.writes.iter().filter(|(k, _)| in_bounds(k.as_slice())) {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        let records: Vec<Record> = merged.into_iter().collect();
        match order {
            Order::Ascending => Box::new(records.into_iter()),
            Order::Descending => Box::new(records.into_iter().rev()),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
    }

    fn remove(&mut self, key: &[u8]) {
        self.writes.insert(key.to_vec(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::MemoryStorage;

    #[test]
    fn keys_are_big_endian() {
        assert_eq!(id_key(0x02, 1), vec![0x02, 0, 0, 0, 0, 0, 0, 0, 1]);
        let k = id_period_key(0x13, 1, 256);
        assert_eq!(&k[9..], &[0, 0, 0, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn prefix_iteration_is_bounded() {
        let mut store = MemoryStorage::new();
        save(&mut store, &id_key(0x02, 1), &"a").unwrap();
        save(&mut store, &id_key(0x02, 2), &"b").unwrap();
        save(&mut store, &id_key(0x03, 1), &"c").unwrap();
        let got: Vec<String> = load_prefix(&store, &[0x02]).unwrap();
        assert_eq!(got, vec!["a", "b"]);
        assert_eq!(prefix_end(&[0x01, 0xff]), Some(vec![0x02]));
        assert_eq!(prefix_end(&[0xff]), None);
    }

    #[test]
    fn address_keys_carry_the_length() {
        assert_eq!(address_prefix(0x31, "ab").unwrap(), vec![0x31, 2, b'a', b'b']);
        assert_eq!(address_denom_key(0x31, "ab", "x").unwrap(), vec![0x31, 2, b'a', b'b', b'x']);

        let long = "a".repeat(256);
        assert!(matches!(address_prefix(0x31, &long), Err(Error::InvalidAddress(_))));
        assert!(address_denom_key(0x31, &long, "uosmo").is_err());
        assert!(address_prefix(0x31, &long[..255]).is_ok());
    }

    #[test]
    fn cache_store_buffers_until_commit() {
        let mut parent = MemoryStorage::new();
        save(&mut parent, b"k1", &1u64).unwrap();
        save(&mut parent, b"k2", &2u64).unwrap();

        {
            let mut cache = CacheStore::new(&mut parent);
            save(&mut cache, b"k3", &3u64).unwrap();
            cache.remove(b"k1");
            let all: Vec<u64> = load_prefix(&cache, b"k").unwrap();
            assert_eq!(all, vec![2, 3]);
            // dropped without commit
        }
        assert_eq!(load::<u64>(&parent, b"k1").unwrap(), Some(1));
        assert_eq!(load::<u64>(&parent, b"k3").unwrap(), None);

        let mut cache = CacheStore::new(&mut parent);
        save(&mut cache, b"k3", &3u64).unwrap();
        cache.remove(b"k1");
        cache.commit();
        assert_eq!(load::<u64>(&parent, b"k1").unwrap(), None);
        assert_eq!(load::<u64>(&parent, b"k3").unwrap(), Some(3));
    }
}
