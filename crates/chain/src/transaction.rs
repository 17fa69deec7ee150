//! Transaction: a signed script plus gas parameters (spec.md §3
//! "Transaction"). The identity hash covers every field except
//! signatures; verifying a signature is what turns a public key into a
//! witness address `Runtime::is_witness` can check against.

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use vela_core::{crypto, Address, Hash256, Timestamp};
use vela_io::{BinaryReader, BinaryWriter, IoResult, Serializable};
use vela_vm::VMObject;

use crate::script;

/// A single witness: a public key and the signature it produced over the
/// transaction's signing hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub public_key: [u8; 33],
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub payer: Address,
    pub target_chain: String,
    pub script: Vec<u8>,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub expiration: Timestamp,
    pub nonce: u64,
    pub signatures: Vec<Signature>,
}

const MAX_SCRIPT_LEN: usize = 64 * 1024;
const MAX_CHAIN_NAME_LEN: usize = 64;
const MAX_SIGNATURE_LEN: usize = 80;

impl Transaction {
    /// Builds an unsigned `Transaction` whose script calls a single native
    /// contract method. The gas bracket (spec.md §4.4 `AllowGas`/
    /// `SpendGas`) is not part of the script; `Chain::add_block` applies it
    /// around execution. Callers sign the result with
    /// [`Transaction::add_signature`] before submission.
    #[allow(clippy::too_many_arguments)]
    pub fn build_call(
        payer: Address,
        target_chain: impl Into<String>,
        target_contract: &Address,
        method: &str,
        args: &[VMObject],
        gas_price: u64,
        gas_limit: u64,
        expiration: Timestamp,
        nonce: u64,
    ) -> Self {
        let script = script::build_call_script(target_contract, method, args);
        Self {
            payer,
            target_chain: target_chain.into(),
            script,
            gas_price,
            gas_limit,
            expiration,
            nonce,
            signatures: Vec::new(),
        }
    }

    /// Encodes every field the identity hash covers, excluding signatures
    /// (spec.md §3, "Hash covers all fields except signatures").
    fn encode_preimage(&self, w: &mut BinaryWriter) {
        w.write_address(&self.payer);
        w.write_string(&self.target_chain);
        w.write_var_bytes(&self.script);
        w.write_u64(self.gas_price);
        w.write_u64(self.gas_limit);
        w.write_timestamp(self.expiration);
        w.write_u64(self.nonce);
    }

    /// The hash signers sign over and `verify_witnesses` checks against.
    pub fn signing_hash(&self) -> Hash256 {
        let mut w = BinaryWriter::new();
        self.encode_preimage(&mut w);
        Hash256::sha256(&w.into_bytes())
    }

    /// Signs this transaction's preimage and appends the resulting witness.
    /// `signing_key` signs with [`vela_core::crypto::KeyPair::sign`].
    pub fn add_signature(&mut self, public_key: [u8; 33], signature: Vec<u8>) {
        self.signatures.push(Signature { public_key, signature });
    }

    /// Verifies every attached signature against the signing hash and
    /// returns the addresses of the ones that check out. These become the
    /// transaction's witness set (`Runtime::signers`).
    pub fn verify_witnesses(&self) -> Vec<Address> {
        let hash = self.signing_hash();
        self.signatures
            .iter()
            .filter(|sig| crypto::verify(&sig.public_key, hash.as_bytes(), &sig.signature))
            .map(|sig| Address::from_public_key(sig.public_key))
            .collect()
    }

    /// True if every attached signature verifies (no garbage witnesses
    /// riding along) and the verified set includes `self.payer` (spec.md
    /// §3, "Signatures must witness the set of addresses referenced by
    /// `IsWitness` checks").
    pub fn is_fully_signed(&self) -> bool {
        let witnesses = self.verify_witnesses();
        !self.signatures.is_empty() && witnesses.len() == self.signatures.len() && witnesses.contains(&self.payer)
    }
}

impl Serializable for Transaction {
    fn encode(&self, w: &mut BinaryWriter) {
        self.encode_preimage(w);
        w.write_var_int(self.signatures.len() as u64);
        for sig in &self.signatures {
            w.write_bytes(&sig.public_key);
            w.write_var_bytes(&sig.signature);
        }
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        let payer = r.read_address()?;
        let target_chain = r.read_string(MAX_CHAIN_NAME_LEN)?;
        let script = r.read_var_bytes(MAX_SCRIPT_LEN)?;
        let gas_price = r.read_u64()?;
        let gas_limit = r.read_u64()?;
        let expiration = r.read_timestamp()?;
        let nonce = r.read_u64()?;
        let sig_count = r.read_var_int()?;
        let mut signatures = Vec::with_capacity(sig_count as usize);
        for _ in 0..sig_count {
            let mut public_key = [0u8; 33];
            public_key.copy_from_slice(&r.read_bytes(33)?);
            let signature = r.read_var_bytes(MAX_SIGNATURE_LEN)?;
            signatures.push(Signature { public_key, signature });
        }
        Ok(Self {
            payer,
            target_chain,
            script,
            gas_price,
            gas_limit,
            expiration,
            nonce,
            signatures,
        })
    }

    /// The identity/witness hash excludes signatures, unlike the full
    /// encoding `to_bytes`/`from_bytes` round-trip (spec.md §3).
    fn content_hash(&self) -> Hash256 {
        self.signing_hash()
    }
}

/// Amount a transaction pays in total: `used_gas * gas_price`, as settled
/// by `Gas.SpendGas` (spec.md §4.4). Exposed here so chain-level fee
/// reporting doesn't need to replay execution.
pub fn total_fee(used_gas: u64, gas_price: u64) -> BigInt {
    BigInt::from(used_gas.saturating_mul(gas_price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_core::crypto::KeyPair;

    fn sample(payer: Address) -> Transaction {
        Transaction::build_call(
            payer,
            "main",
            &Address::for_contract("token").unwrap(),
            "Mint",
            &[],
            1,
            1_000_000,
            Timestamp::new(1000),
            0,
        )
    }

    #[test]
    fn serialization_round_trips_including_signatures() {
        let kp = KeyPair::generate();
        let payer = Address::from_public_key(kp.compressed_public_key());
        let mut tx = sample(payer);
        let sig = kp.sign(tx.signing_hash().as_bytes());
        tx.add_signature(kp.compressed_public_key(), sig);

        let bytes = tx.to_bytes();
        let decoded = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn signing_hash_is_stable_across_signature_changes() {
        let kp = KeyPair::generate();
        let payer = Address::from_public_key(kp.compressed_public_key());
        let mut tx = sample(payer);
        let hash_before = tx.signing_hash();
        let sig = kp.sign(hash_before.as_bytes());
        tx.add_signature(kp.compressed_public_key(), sig);
        assert_eq!(tx.signing_hash(), hash_before);
        assert_eq!(tx.content_hash(), hash_before);
    }

    #[test]
    fn verify_witnesses_recovers_the_signer_address_and_rejects_tampering() {
        let kp = KeyPair::generate();
        let payer = Address::from_public_key(kp.compressed_public_key());
        let mut tx = sample(payer);
        let sig = kp.sign(tx.signing_hash().as_bytes());
        tx.add_signature(kp.compressed_public_key(), sig);
        assert_eq!(tx.verify_witnesses(), vec![payer]);

        tx.nonce += 1;
        assert!(tx.verify_witnesses().is_empty());
    }
}
