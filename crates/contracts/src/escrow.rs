//! Cross-chain transfer escrow bookkeeping (spec.md §4.5).
//!
//! `Token::SideChainSend` writes a record here on the source chain; actual
//! settlement (reading the record from the *other* chain's storage,
//! verifying finality, crediting the destination) needs both chains'
//! storage at once and so is driven by `vela-chain`, not this crate.

use num_bigint::BigInt;
use vela_core::{Address, Hash256, Timestamp};
use vela_io::{BinaryReader, BinaryWriter, IoResult, Serializable};
use vela_storage::{ChangeSet, StorageMap};

/// An NFT locked into an escrow: the id plus its ROM/RAM record, carried
/// across chains so settlement can recreate the token on the destination
/// without consulting the source chain again (spec.md §4.5, "NFTs use the
/// same protocol... the nft record (ROM+RAM) is atomically moved").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowNft {
    pub id: u64,
    pub rom: Vec<u8>,
    pub ram: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowRecord {
    pub symbol: String,
    pub amount: BigInt,
    pub cross_fee: BigInt,
    pub dest_chain: String,
    pub dest_address: Address,
    /// `Some` for an NFT escrow; `amount` is unused (zero) in that case.
    pub nft: Option<EscrowNft>,
    pub expiration: Timestamp,
}

impl Serializable for EscrowRecord {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_string(&self.symbol);
        w.write_bigint(&self.amount);
        w.write_bigint(&self.cross_fee);
        w.write_string(&self.dest_chain);
        w.write_address(&self.dest_address);
        match &self.nft {
            Some(nft) => {
                w.write_bool(true);
                w.write_u64(nft.id);
                w.write_var_bytes(&nft.rom);
                w.write_var_bytes(&nft.ram);
            }
            None => w.write_bool(false),
        }
        w.write_timestamp(self.expiration);
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        let symbol = r.read_string(32)?;
        let amount = r.read_bigint(64)?;
        let cross_fee = r.read_bigint(64)?;
        let dest_chain = r.read_string(64)?;
        let dest_address = r.read_address()?;
        let nft = if r.read_bool()? {
            Some(EscrowNft {
                id: r.read_u64()?,
                rom: r.read_var_bytes(4096)?,
                ram: r.read_var_bytes(4096)?,
            })
        } else {
            None
        };
        let expiration = r.read_timestamp()?;
        Ok(Self {
            symbol,
            amount,
            cross_fee,
            dest_chain,
            dest_address,
            nft,
            expiration,
        })
    }
}

fn records() -> StorageMap {
    StorageMap::new(b"escrow:record:".to_vec())
}
fn consumed() -> StorageMap {
    StorageMap::new(b"escrow:consumed:".to_vec())
}

pub fn write(cs: &mut ChangeSet, tx_hash: &Hash256, record: &EscrowRecord) {
    records().set(cs, tx_hash.as_bytes(), record);
}

pub fn read(cs: &ChangeSet, tx_hash: &Hash256) -> Option<EscrowRecord> {
    records().get(cs, tx_hash.as_bytes()).ok().flatten()
}

pub fn is_consumed(cs: &ChangeSet, tx_hash: &Hash256) -> bool {
    consumed().contains(cs, tx_hash.as_bytes())
}

pub fn mark_consumed(cs: &mut ChangeSet, tx_hash: &Hash256) {
    consumed().set_bytes(cs, tx_hash.as_bytes(), vec![1]);
}

/// Releases an unclaimed, expired escrow back onto the source chain without
/// consuming it for settlement (SPEC_FULL §3, "escrow-expiry sweep").
pub fn clear_expired(cs: &mut ChangeSet, tx_hash: &Hash256) {
    records().delete(cs, tx_hash.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_round_trips_through_storage() {
        let storage = vela_storage::Storage::default();
        let mut cs = storage.fork_change_set();
        let tx_hash = Hash256::sha256(b"tx");
        let record = EscrowRecord {
            symbol: "KCAL".to_string(),
            amount: BigInt::from(500),
            cross_fee: BigInt::from(1),
            dest_chain: "privacy".to_string(),
            dest_address: Address::for_contract("receiver").unwrap(),
            nft: None,
            expiration: Timestamp::new(1000),
        };
        assert!(read(&cs, &tx_hash).is_none());
        write(&mut cs, &tx_hash, &record);
        assert_eq!(read(&cs, &tx_hash), Some(record));
        assert!(!is_consumed(&cs, &tx_hash));
        mark_consumed(&mut cs, &tx_hash);
        assert!(is_consumed(&cs, &tx_hash));
    }

    #[test]
    fn nft_escrow_carries_the_rom_and_ram_through_storage() {
        let storage = vela_storage::Storage::default();
        let mut cs = storage.fork_change_set();
        let tx_hash = Hash256::sha256(b"tx-nft");
        let record = EscrowRecord {
            symbol: "COOL".to_string(),
            amount: BigInt::from(0),
            cross_fee: BigInt::from(0),
            dest_chain: "privacy".to_string(),
            dest_address: Address::for_contract("receiver").unwrap(),
            nft: Some(EscrowNft { id: 7, rom: vec![1, 3, 3, 7], ram: vec![1, 4, 4, 6] }),
            expiration: Timestamp::new(1000),
        };
        write(&mut cs, &tx_hash, &record);
        assert_eq!(read(&cs, &tx_hash), Some(record));
    }
}
