//! Hash256: a 32-byte SHA-256 digest used for block/transaction identity.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub const HASH_SIZE: usize = 32;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
pub struct Hash256([u8; HASH_SIZE]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; HASH_SIZE]);

    /// Hashes `data` with SHA-256.
    pub fn sha256(data: &[u8]) -> Self {
        let digest = Sha256::digest(data);
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() != HASH_SIZE {
            return Err(CoreError::InvalidLength {
                expected: HASH_SIZE,
                actual: bytes.len(),
            });
        }
        let mut buf = [0u8; HASH_SIZE];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_input_hashes_equal() {
        assert_eq!(Hash256::sha256(b"abc"), Hash256::sha256(b"abc"));
        assert_ne!(Hash256::sha256(b"abc"), Hash256::sha256(b"abd"));
    }
}
