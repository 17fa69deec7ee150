//! Cryptography collaborator hooks: hashing and secp256r1 signatures.
//!
//! These are the primitive operations spec.md §6 names under the `Crypto`
//! collaborator hook. Witness verification over a transaction (matching a
//! signature against the set of addresses referenced during execution)
//! lives one layer up, in `vela-chain`, since it needs the transaction's
//! signed preimage.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// SHA-256 of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// RIPEMD-160 of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let digest = Ripemd160::digest(data);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

/// A secp256r1 keypair, for genesis bootstrap and test fixtures.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generates a fresh keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// The 33-byte SEC1-compressed public key, suitable for wrapping as an
    /// [`crate::Address`].
    pub fn compressed_public_key(&self) -> [u8; 33] {
        let point = VerifyingKey::from(&self.signing_key)
            .to_encoded_point(true);
        let mut out = [0u8; 33];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Signs `message` with this keypair's private key.
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig: Signature = self.signing_key.sign(message);
        sig.to_der().as_bytes().to_vec()
    }
}

/// Verifies a secp256r1 signature over `message` against a 33-byte
/// compressed public key.
pub fn verify(public_key: &[u8; 33], message: &[u8], signature_der: &[u8]) -> bool {
    let Ok(key) = VerifyingKey::from_sec1_bytes(public_key) else {
        return false;
    };
    let Ok(sig) = Signature::from_der(signature_der) else {
        return false;
    };
    key.verify(message, &sig).is_ok()
}
