//! Account addresses.
//!
//! Module and pool accounts are derived from SHA-256 hashes of fixed seeds and
//! rendered as bech32 strings with the chain prefix. User addresses are only
//! validated, never derived.

use sha2::{Digest, Sha256};

use crate::{
    constants::{BECH32_PREFIX, GAMM_MODULE},
    error::{Error, Result},
};

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";
const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];

// ─── Derivation ───────────────────────────────────────────────────────────────

/// Address of a named module account: first 20 bytes of SHA-256(name).
pub fn module_address(module: &str) -> String {
    let hash = Sha256::digest(module.as_bytes());
    encode(BECH32_PREFIX, &hash[..20])
}

/// Address of the account holding a pool's liquidity:
/// SHA-256(SHA-256("module") ‖ "gamm" ‖ 0x00 ‖ "pool" ‖ be(pool_id)).
pub fn pool_address(pool_id: u64) -> String {
    let typ = Sha256::digest(b"module");
    let mut h = Sha256::new();
    h.update(typ);
    h.update(GAMM_MODULE.as_bytes());
    h.update([0u8]);
    h.update(b"pool");
    h.update(pool_id.to_be_bytes());
    encode(BECH32_PREFIX, &h.finalize())
}

// ─── Bech32 ───────────────────────────────────────────────────────────────────

fn polymod(values: &[u8]) -> u32 {
    let mut chk: u32 = 1;
    for v in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ u32::from(*v);
        for (i, g) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let bytes = hrp.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() * 2 + 1);
    out.extend(bytes.iter().map(|b| b >> 5));
    out.push(0);
    out.extend(bytes.iter().map(|b| b & 0x1f));
    out
}

fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let maxv: u32 = (1 << to) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);
    for value in data {
        let v = u32::from(*value);
        if v >> from != 0 {
            return None;
        }
        acc = (acc << from) | v;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & maxv) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & maxv) != 0 {
        return None;
    }
    Some(out)
}

pub fn encode(hrp: &str, payload: &[u8]) -> String {
    // 8 → 5 bit conversion with padding cannot fail for byte input.
    let data = convert_bits(payload, 8, 5, true).unwrap_or_default();
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(&data);
    values.extend_from_slice(&[0u8; 6]);
    let checksum = polymod(&values) ^ 1;

    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + 6);
    out.push_str(hrp);
    out.push('1');
    for d in &data {
        out.push(CHARSET[*d as usize] as char);
    }
    for i in 0..6 {
        out.push(CHARSET[((checksum >> (5 * (5 - i))) & 0x1f) as usize] as char);
    }
    out
}

/// Decodes a bech32 string into its prefix and payload bytes.
pub fn decode(addr: &str) -> Result<(String, Vec<u8>)> {
    let invalid = |why: &str| Error::InvalidAddress(format!("{addr}: {why}"));

    let has_lower = addr.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = addr.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(invalid("mixed case"));
    }
    let addr_lower = addr.to_ascii_lowercase();
    let sep = addr_lower.rfind('1').ok_or_else(|| invalid("missing separator"))?;
    let (hrp, rest) = addr_lower.split_at(sep);
    let data_part = &rest[1..];
    if hrp.is_empty() || data_part.len() < 6 || addr.len() > 90 {
        return Err(invalid("bad length"));
    }

    let mut data = Vec::with_capacity(data_part.len());
    for c in data_part.bytes() {
        let idx = CHARSET
            .iter()
            .position(|x| *x == c)
            .ok_or_else(|| invalid("invalid character"))?;
        data.push(idx as u8);
    }

    let mut values = hrp_expand(hrp);
    values.extend_from_slice(&data);
    if polymod(&values) != 1 {
        return Err(invalid("invalid checksum"));
    }

    let payload = convert_bits(&data[..data.len() - 6], 5, 8, false)
        .ok_or_else(|| invalid("invalid padding"))?;
    Ok((hrp.to_string(), payload))
}

/// Accepts `osmo1…` addresses carrying 1–255 payload bytes.
pub fn validate_address(addr: &str) -> Result<()> {
    let (hrp, payload) = decode(addr)?;
    if hrp != BECH32_PREFIX {
        return Err(Error::InvalidAddress(format!("{addr}: expected prefix {BECH32_PREFIX}, got {hrp}")));
    }
    if payload.is_empty() || payload.len() > 255 {
        return Err(Error::InvalidAddress(format!("{addr}: bad payload length {}", payload.len())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_osmosis_address_validates() {
        validate_address("osmo1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9nck").unwrap();
    }

    #[test]
    fn derived_addresses_round_trip() {
        let addr = pool_address(1);
        let (hrp, payload) = decode(&addr).unwrap();
        assert_eq!(hrp, "osmo");
        assert_eq!(payload.len(), 32);
        assert_ne!(pool_address(1), pool_address(2));

        let module = module_address("farm");
        assert_eq!(decode(&module).unwrap().1.len(), 20);
        validate_address(&module).unwrap();
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let mut addr = module_address("gamm");
        let last = addr.pop().unwrap();
        addr.push(if last == 'q' { 'p' } else { 'q' });
        assert!(validate_address(&addr).is_err());
        assert!(validate_address("cosmos1fqlr98d45v5ysqgp6h56kpujcj4cvsjnjq9nck").is_err());
        assert!(validate_address("100h").is_err());
    }
}
