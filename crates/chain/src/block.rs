//! Block: an immutable, hash-chained container for a batch of transactions
//! and the events they raised (spec.md §3 "Block").

use std::collections::HashMap;
use vela_core::{Address, Hash256, Timestamp};
use vela_io::{BinaryReader, BinaryWriter, IoError, IoResult, Serializable};
use vela_runtime::{Event, EventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub height: u32,
    pub timestamp: Timestamp,
    pub previous_hash: Hash256,
    pub producer: Address,
    pub transaction_hashes: Vec<Hash256>,
    pub events: HashMap<Hash256, Vec<Event>>,
}

const MAX_BLOCK_TRANSACTIONS: usize = 65_536;
const MAX_EVENT_PAYLOAD: usize = 4096;

/// `Event`/`EventKind` (`vela-runtime`) carry no `Serializable` impl of
/// their own — nothing outside block persistence needs to put an event on
/// the wire — so the tag mapping lives here, mirroring
/// `vela_runtime::runtime::event_kind_from_tag`'s ordering exactly.
fn tag_for_kind(kind: EventKind) -> u8 {
    match kind {
        EventKind::ChainCreate => 0,
        EventKind::TokenCreate => 1,
        EventKind::TokenSend => 2,
        EventKind::TokenReceive => 3,
        EventKind::TokenClaim => 4,
        EventKind::TokenMint => 5,
        EventKind::TokenBurn => 6,
        EventKind::TokenEscrow => 7,
        EventKind::TokenStake => 8,
        EventKind::TokenUnstake => 9,
        EventKind::AddressRegister => 10,
        EventKind::AddressAdd => 11,
        EventKind::AddressRemove => 12,
        EventKind::GasEscrow => 13,
        EventKind::GasPayment => 14,
        EventKind::AuctionCreated => 15,
        EventKind::AuctionCancelled => 16,
        EventKind::AuctionFilled => 17,
        EventKind::Metadata => 18,
    }
}

fn kind_for_tag(tag: u8) -> IoResult<EventKind> {
    Ok(match tag {
        0 => EventKind::ChainCreate,
        1 => EventKind::TokenCreate,
        2 => EventKind::TokenSend,
        3 => EventKind::TokenReceive,
        4 => EventKind::TokenClaim,
        5 => EventKind::TokenMint,
        6 => EventKind::TokenBurn,
        7 => EventKind::TokenEscrow,
        8 => EventKind::TokenStake,
        9 => EventKind::TokenUnstake,
        10 => EventKind::AddressRegister,
        11 => EventKind::AddressAdd,
        12 => EventKind::AddressRemove,
        13 => EventKind::GasEscrow,
        14 => EventKind::GasPayment,
        15 => EventKind::AuctionCreated,
        16 => EventKind::AuctionCancelled,
        17 => EventKind::AuctionFilled,
        18 => EventKind::Metadata,
        other => return Err(IoError::InvalidEncoding(format!("unknown event kind tag {other}"))),
    })
}

fn encode_event(w: &mut BinaryWriter, event: &Event) {
    w.write_u8(tag_for_kind(event.kind));
    w.write_address(&event.address);
    w.write_var_bytes(&event.payload);
}

fn decode_event(r: &mut BinaryReader) -> IoResult<Event> {
    let kind = kind_for_tag(r.read_u8()?)?;
    let address = r.read_address()?;
    let payload = r.read_var_bytes(MAX_EVENT_PAYLOAD)?;
    Ok(Event { kind, address, payload })
}

impl Serializable for Block {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_u32(self.height);
        w.write_timestamp(self.timestamp);
        w.write_hash(&self.previous_hash);
        w.write_address(&self.producer);

        w.write_var_int(self.transaction_hashes.len() as u64);
        for hash in &self.transaction_hashes {
            w.write_hash(hash);
        }

        // Emitted in transaction order so encoding is deterministic despite
        // `events` being a HashMap.
        w.write_var_int(self.transaction_hashes.len() as u64);
        for tx_hash in &self.transaction_hashes {
            let events = self.events.get(tx_hash).map(Vec::as_slice).unwrap_or(&[]);
            w.write_var_int(events.len() as u64);
            for event in events {
                encode_event(w, event);
            }
        }
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        let height = r.read_u32()?;
        let timestamp = r.read_timestamp()?;
        let previous_hash = r.read_hash()?;
        let producer = r.read_address()?;

        let tx_count = r.read_var_int()? as usize;
        if tx_count > MAX_BLOCK_TRANSACTIONS {
            return Err(IoError::TooLong { length: tx_count, max: MAX_BLOCK_TRANSACTIONS });
        }
        let mut transaction_hashes = Vec::with_capacity(tx_count);
        for _ in 0..tx_count {
            transaction_hashes.push(r.read_hash()?);
        }

        let event_group_count = r.read_var_int()? as usize;
        let mut events = HashMap::with_capacity(event_group_count);
        for i in 0..event_group_count {
            let count = r.read_var_int()? as usize;
            let mut group = Vec::with_capacity(count);
            for _ in 0..count {
                group.push(decode_event(r)?);
            }
            if let Some(tx_hash) = transaction_hashes.get(i) {
                events.insert(*tx_hash, group);
            }
        }

        Ok(Self {
            height,
            timestamp,
            previous_hash,
            producer,
            transaction_hashes,
            events,
        })
    }
}

impl Block {
    pub fn events_for(&self, tx_hash: &Hash256) -> &[Event] {
        self.events.get(tx_hash).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_bytes_including_events() {
        let tx_hash = Hash256::sha256(b"tx");
        let mut events = HashMap::new();
        events.insert(
            tx_hash,
            vec![Event {
                kind: EventKind::TokenMint,
                address: Address::for_contract("alice").unwrap(),
                payload: vec![1, 2, 3],
            }],
        );
        let block = Block {
            height: 1,
            timestamp: Timestamp::new(1000),
            previous_hash: Hash256::ZERO,
            producer: Address::for_contract("producer").unwrap(),
            transaction_hashes: vec![tx_hash],
            events,
        };
        let bytes = block.to_bytes();
        let decoded = Block::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn content_hash_changes_when_a_transaction_hash_changes() {
        let base = Block {
            height: 1,
            timestamp: Timestamp::new(1000),
            previous_hash: Hash256::ZERO,
            producer: Address::for_contract("producer").unwrap(),
            transaction_hashes: vec![Hash256::sha256(b"a")],
            events: HashMap::new(),
        };
        let mut other = base.clone();
        other.transaction_hashes[0] = Hash256::sha256(b"b");
        assert_ne!(base.content_hash(), other.content_hash());
    }
}
