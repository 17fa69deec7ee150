//! Address: a 33-byte identifier for either a user (compressed secp256r1
//! public key) or a system/contract (domain-separated hash of a symbolic
//! name).

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length in bytes of an [`Address`].
pub const ADDRESS_SIZE: usize = 33;

/// Domain separator prepended to a hashed contract name. Chosen to be
/// disjoint from the `0x02`/`0x03` compressed-point prefixes a genuine
/// secp256r1 public key can start with.
const CONTRACT_DOMAIN_TAG: u8 = 0x01;

/// A 33-byte address: either a user's compressed public key or a
/// deterministically-derived system/contract address.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    /// Wraps a 33-byte compressed public key as a user address.
    pub fn from_public_key(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derives the address of a native or user-deployed contract from its
    /// symbolic name: `CONTRACT_DOMAIN_TAG || sha256(name)`.
    pub fn for_contract(name: &str) -> CoreResult<Self> {
        if name.is_empty() {
            return Err(CoreError::InvalidContractName(name.to_string()));
        }
        let digest = Sha256::digest(name.as_bytes());
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes[0] = CONTRACT_DOMAIN_TAG;
        bytes[1..].copy_from_slice(&digest);
        Ok(Self(bytes))
    }

    /// Builds an address from a raw byte slice, failing if the length is
    /// not exactly [`ADDRESS_SIZE`].
    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != ADDRESS_SIZE {
            return Err(CoreError::InvalidLength {
                expected: ADDRESS_SIZE,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; ADDRESS_SIZE];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Returns the raw bytes of this address.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    /// True if this address was derived from a contract's symbolic name
    /// rather than a user keypair.
    pub fn is_system(&self) -> bool {
        self.0[0] == CONTRACT_DOMAIN_TAG
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_addresses_are_deterministic_and_distinct() {
        let a = Address::for_contract("staking").unwrap();
        let b = Address::for_contract("staking").unwrap();
        let c = Address::for_contract("token").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_system());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Address::from_slice(&[0u8; 10]).is_err());
    }

    #[test]
    fn roundtrips_through_hex() {
        let a = Address::for_contract("gas").unwrap();
        let hex = a.to_hex();
        assert_eq!(Address::from_hex(&hex).unwrap(), a);
    }
}
