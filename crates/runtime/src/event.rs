//! The append-only event log a transaction accumulates as it runs
//! (spec.md §3 "Event", §4.2 "Notify").
//!
//! Each event carries an opaque payload rather than a generic VM value —
//! the corpus's "reflection-based event payloads" pattern is replaced here
//! by a fixed registry keyed by `EventKind` (spec.md §9 design note), with
//! payload bytes produced by whichever native contract raises the event.

use vela_core::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    ChainCreate,
    TokenCreate,
    TokenSend,
    TokenReceive,
    TokenClaim,
    TokenMint,
    TokenBurn,
    TokenEscrow,
    TokenStake,
    TokenUnstake,
    AddressRegister,
    AddressAdd,
    AddressRemove,
    GasEscrow,
    GasPayment,
    AuctionCreated,
    AuctionCancelled,
    AuctionFilled,
    Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub address: Address,
    pub payload: Vec<u8>,
}

/// Fixed schema for `GasEscrow`'s payload: `{ limit: u64, price: u64 }`
/// little-endian (spec.md §4.4, `AllowGas`).
pub fn encode_gas_escrow(limit: u64, price: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(16);
    bytes.extend_from_slice(&limit.to_le_bytes());
    bytes.extend_from_slice(&price.to_le_bytes());
    bytes
}

/// Fixed schema for `GasPayment`'s payload: `{ amount: u64 }` little-endian
/// (spec.md §4.4, `SpendGas`).
pub fn encode_gas_payment(amount: u64) -> Vec<u8> {
    amount.to_le_bytes().to_vec()
}
