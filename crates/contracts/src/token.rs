//! The token contract: fungible and non-fungible tokens on a single chain
//! (spec.md §3 "Token", §4.4 "Token contract").
//!
//! Supply and balances are tracked per chain, matching spec.md §3's
//! invariant ("sum of balances on a chain equals the supply recorded for
//! that token on that chain") — there is no nexus-wide balance ledger to
//! reconcile against.

use crate::error::{ContractError, ContractResult};
use crate::escrow::{self, EscrowNft, EscrowRecord};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::collections::HashMap;
use vela_core::{Address, Timestamp};
use vela_io::{BinaryReader, BinaryWriter, IoResult, Serializable};
use vela_runtime::{EventKind, NativeContract, Runtime};
use vela_storage::{ChangeSet, StorageMap};
use vela_vm::{VMObject, VmError, VmResult};

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TokenFlags: u8 {
        const FUNGIBLE     = 0b0000_0001;
        const BURNABLE     = 0b0000_0010;
        const TRADABLE     = 0b0000_0100;
        const DIVISIBLE    = 0b0000_1000;
        const TRANSFERABLE = 0b0001_0000;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMeta {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Zero means unlimited.
    pub max_supply: BigInt,
    pub flags: TokenFlags,
}

impl Serializable for TokenMeta {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_string(&self.symbol);
        w.write_string(&self.name);
        w.write_u8(self.decimals);
        w.write_bigint(&self.max_supply);
        w.write_u8(self.flags.bits());
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        Ok(Self {
            symbol: r.read_string(32)?,
            name: r.read_string(64)?,
            decimals: r.read_u8()?,
            max_supply: r.read_bigint(64)?,
            flags: TokenFlags::from_bits_truncate(r.read_u8()?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NftRecord {
    pub rom: Vec<u8>,
    pub ram: Vec<u8>,
}

impl Serializable for NftRecord {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_var_bytes(&self.rom);
        w.write_var_bytes(&self.ram);
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        Ok(Self {
            rom: r.read_var_bytes(4096)?,
            ram: r.read_var_bytes(4096)?,
        })
    }
}

fn meta_map() -> StorageMap {
    StorageMap::new(b"token:meta:".to_vec())
}
fn supply_map() -> StorageMap {
    StorageMap::new(b"token:supply:".to_vec())
}
fn balance_map(symbol: &str) -> StorageMap {
    StorageMap::new(format!("token:bal:{symbol}:").into_bytes())
}
fn nft_owner_map(symbol: &str) -> StorageMap {
    StorageMap::new(format!("token:nftowner:{symbol}:").into_bytes())
}
fn nft_record_map(symbol: &str) -> StorageMap {
    StorageMap::new(format!("token:nftrec:{symbol}:").into_bytes())
}
fn next_id_map() -> StorageMap {
    StorageMap::new(b"token:nextid:".to_vec())
}

pub fn get_meta(cs: &ChangeSet, symbol: &str) -> ContractResult<Option<TokenMeta>> {
    Ok(meta_map().get(cs, symbol.as_bytes())?)
}

pub fn get_supply(cs: &ChangeSet, symbol: &str) -> BigInt {
    supply_map()
        .get_bytes(cs, symbol.as_bytes())
        .map(|b| BigInt::from_signed_bytes_le(&b))
        .unwrap_or_else(BigInt::zero)
}

fn set_supply(cs: &mut ChangeSet, symbol: &str, value: &BigInt) {
    supply_map().set_bytes(cs, symbol.as_bytes(), value.to_signed_bytes_le());
}

pub fn get_balance(cs: &ChangeSet, symbol: &str, address: &Address) -> BigInt {
    balance_map(symbol)
        .get_bytes(cs, address.as_bytes())
        .map(|b| BigInt::from_signed_bytes_le(&b))
        .unwrap_or_else(BigInt::zero)
}

fn set_balance(cs: &mut ChangeSet, symbol: &str, address: &Address, value: &BigInt) {
    balance_map(symbol).set_bytes(cs, address.as_bytes(), value.to_signed_bytes_le());
}

/// All addresses holding a nonzero balance of `symbol`, keyed by address.
pub fn all_balances(cs: &ChangeSet, symbol: &str) -> HashMap<Address, BigInt> {
    balance_map(symbol)
        .all_bytes(cs)
        .into_iter()
        .filter_map(|(k, v)| {
            let addr = Address::from_slice(&k).ok()?;
            Some((addr, BigInt::from_signed_bytes_le(&v)))
        })
        .collect()
}

/// Non-fungible ownership map for `symbol`: address -> owned ids.
pub fn ownerships(cs: &ChangeSet, symbol: &str) -> HashMap<Address, Vec<u64>> {
    let mut result: HashMap<Address, Vec<u64>> = HashMap::new();
    for (key, value) in nft_owner_map(symbol).all_bytes(cs) {
        if key.len() != 8 {
            continue;
        }
        let id = u64::from_le_bytes(key.try_into().unwrap());
        if let Ok(owner) = Address::from_slice(&value) {
            result.entry(owner).or_default().push(id);
        }
    }
    result
}

pub fn create(
    cs: &mut ChangeSet,
    symbol: &str,
    name: &str,
    decimals: u8,
    max_supply: BigInt,
    flags: TokenFlags,
) -> ContractResult<()> {
    if get_meta(cs, symbol)?.is_some() {
        return Err(ContractError::DuplicateToken(symbol.to_string()));
    }
    let meta = TokenMeta {
        symbol: symbol.to_string(),
        name: name.to_string(),
        decimals,
        max_supply,
        flags,
    };
    meta_map().set(cs, symbol.as_bytes(), &meta);
    set_supply(cs, symbol, &BigInt::zero());
    Ok(())
}

pub fn mint(cs: &mut ChangeSet, symbol: &str, to: &Address, amount: &BigInt) -> ContractResult<()> {
    let meta = get_meta(cs, symbol)?.ok_or_else(|| ContractError::UnknownToken(symbol.to_string()))?;
    let supply = get_supply(cs, symbol);
    let new_supply = &supply + amount;
    if !meta.max_supply.is_zero() && new_supply > meta.max_supply {
        return Err(ContractError::InvalidOperation(format!(
            "{symbol}: minting {amount} exceeds max supply"
        )));
    }
    set_supply(cs, symbol, &new_supply);
    let balance = get_balance(cs, symbol, to) + amount;
    set_balance(cs, symbol, to, &balance);
    Ok(())
}

pub fn burn(cs: &mut ChangeSet, symbol: &str, from: &Address, amount: &BigInt) -> ContractResult<()> {
    let balance = get_balance(cs, symbol, from);
    if &balance < amount {
        return Err(ContractError::InvalidOperation(format!("{symbol}: insufficient balance to burn")));
    }
    set_balance(cs, symbol, from, &(balance - amount));
    let supply = get_supply(cs, symbol);
    set_supply(cs, symbol, &(supply - amount));
    Ok(())
}

pub fn transfer(cs: &mut ChangeSet, symbol: &str, from: &Address, to: &Address, amount: &BigInt) -> ContractResult<()> {
    let from_balance = get_balance(cs, symbol, from);
    if &from_balance < amount {
        return Err(ContractError::InvalidOperation(format!("{symbol}: insufficient balance")));
    }
    set_balance(cs, symbol, from, &(from_balance - amount));
    let to_balance = get_balance(cs, symbol, to) + amount;
    set_balance(cs, symbol, to, &to_balance);
    Ok(())
}

pub fn debit(cs: &mut ChangeSet, symbol: &str, from: &Address, amount: &BigInt) -> ContractResult<()> {
    let balance = get_balance(cs, symbol, from);
    if &balance < amount {
        return Err(ContractError::InvalidOperation(format!("{symbol}: insufficient balance")));
    }
    set_balance(cs, symbol, from, &(balance - amount));
    Ok(())
}

pub fn credit(cs: &mut ChangeSet, symbol: &str, to: &Address, amount: &BigInt) {
    let balance = get_balance(cs, symbol, to) + amount;
    set_balance(cs, symbol, to, &balance);
}

pub fn mint_nft(cs: &mut ChangeSet, symbol: &str, to: &Address, rom: Vec<u8>, ram: Vec<u8>) -> ContractResult<u64> {
    get_meta(cs, symbol)?.ok_or_else(|| ContractError::UnknownToken(symbol.to_string()))?;
    let id = next_id_map()
        .get_bytes(cs, symbol.as_bytes())
        .map(|b| u64::from_le_bytes(b.try_into().unwrap_or([0; 8])))
        .unwrap_or(0);
    next_id_map().set_bytes(cs, symbol.as_bytes(), (id + 1).to_le_bytes().to_vec());
    nft_record_map(symbol).set(cs, &id.to_le_bytes(), &NftRecord { rom, ram });
    nft_owner_map(symbol).set_bytes(cs, &id.to_le_bytes(), to.as_bytes().to_vec());
    let supply = get_supply(cs, symbol);
    set_supply(cs, symbol, &(supply + 1));
    Ok(id)
}

pub fn nft_owner(cs: &ChangeSet, symbol: &str, id: u64) -> Option<Address> {
    nft_owner_map(symbol)
        .get_bytes(cs, &id.to_le_bytes())
        .and_then(|b| Address::from_slice(&b).ok())
}

pub fn nft_record(cs: &ChangeSet, symbol: &str, id: u64) -> ContractResult<Option<NftRecord>> {
    Ok(nft_record_map(symbol).get(cs, &id.to_le_bytes())?)
}

pub fn transfer_nft(cs: &mut ChangeSet, symbol: &str, from: &Address, to: &Address, id: u64) -> ContractResult<()> {
    match nft_owner(cs, symbol, id) {
        Some(owner) if &owner == from => {
            nft_owner_map(symbol).set_bytes(cs, &id.to_le_bytes(), to.as_bytes().to_vec());
            Ok(())
        }
        _ => Err(ContractError::InvalidOperation(format!("{symbol}: token {id} not owned by sender"))),
    }
}

/// Clears ownership of `id`. The NFT's ROM/RAM record is left in place —
/// the token stays "recorded" (spec.md §8 scenario 5) even once unowned.
pub fn burn_nft(cs: &mut ChangeSet, symbol: &str, from: &Address, id: u64) -> ContractResult<()> {
    match nft_owner(cs, symbol, id) {
        Some(owner) if &owner == from => {
            nft_owner_map(symbol).delete(cs, &id.to_le_bytes());
            Ok(())
        }
        _ => Err(ContractError::InvalidOperation(format!("{symbol}: token {id} not owned by sender"))),
    }
}

/// Locks `id` out of `from`'s ownership for a cross-chain escrow, returning
/// its ROM/RAM so the escrow record can carry the full NFT across chains
/// (spec.md §4.5, "the nft record (ROM+RAM) is atomically moved"). The
/// record itself is left in place on the source chain; only ownership is
/// cleared, mirroring `burn_nft`.
pub fn lock_nft(cs: &mut ChangeSet, symbol: &str, from: &Address, id: u64) -> ContractResult<NftRecord> {
    match nft_owner(cs, symbol, id) {
        Some(owner) if &owner == from => {
            let record = nft_record(cs, symbol, id)?
                .ok_or_else(|| ContractError::InvalidOperation(format!("{symbol}: token {id} has no record")))?;
            nft_owner_map(symbol).delete(cs, &id.to_le_bytes());
            Ok(record)
        }
        _ => Err(ContractError::InvalidOperation(format!("{symbol}: token {id} not owned by sender"))),
    }
}

/// Restores `id` to `to`'s ownership after an escrow release, without
/// touching the stored ROM/RAM (source-chain counterpart to
/// `receive_nft`, used when an escrow expires unsettled).
pub fn unlock_nft(cs: &mut ChangeSet, symbol: &str, to: &Address, id: u64) {
    nft_owner_map(symbol).set_bytes(cs, &id.to_le_bytes(), to.as_bytes().to_vec());
}

/// Writes an incoming NFT's ROM/RAM and ownership directly into `symbol`'s
/// maps on the settling chain, independent of whatever id sequence that
/// chain's own `MintNft` counter is at (spec.md §4.5 settlement: "the nft
/// record... is atomically moved", not re-minted).
pub fn receive_nft(cs: &mut ChangeSet, symbol: &str, to: &Address, id: u64, record: &NftRecord) {
    nft_record_map(symbol).set(cs, &id.to_le_bytes(), record);
    nft_owner_map(symbol).set_bytes(cs, &id.to_le_bytes(), to.as_bytes().to_vec());
}

/// The `SWITCH`-reachable wrapper around the free functions above, adding
/// witness checks, flag enforcement, and event emission (spec.md §4.4).
pub struct TokenContract;

impl NativeContract for TokenContract {
    fn name(&self) -> &str {
        "token"
    }

    fn invoke(&self, runtime: &mut Runtime, method: &str, args: Vec<VMObject>) -> VmResult<VMObject> {
        match method {
            "Create" => self.create(runtime, args),
            "Mint" => self.mint(runtime, args),
            "Burn" => self.burn(runtime, args),
            "Transfer" => self.transfer(runtime, args),
            "SideChainSend" => self.side_chain_send(runtime, args),
            "GetBalance" => self.get_balance(runtime, args),
            "GetSupply" => self.get_supply(runtime, args),
            "MintNft" => self.mint_nft(runtime, args),
            "TransferNft" => self.transfer_nft(runtime, args),
            "BurnNft" => self.burn_nft(runtime, args),
            "GetNftOwner" => self.get_nft_owner(runtime, args),
            other => Err(VmError::UnknownInterop(format!("token.{other}"))),
        }
    }
}

fn arg_string(args: &[VMObject], i: usize) -> VmResult<String> {
    args.get(i)
        .ok_or_else(|| VmError::BoundsViolation(format!("missing argument {i}")))?
        .as_string()
}

fn arg_bytes(args: &[VMObject], i: usize) -> VmResult<Vec<u8>> {
    args.get(i)
        .ok_or_else(|| VmError::BoundsViolation(format!("missing argument {i}")))?
        .as_bytes()
}

fn arg_address(args: &[VMObject], i: usize) -> VmResult<Address> {
    args.get(i)
        .ok_or_else(|| VmError::BoundsViolation(format!("missing argument {i}")))?
        .as_address()
}

fn arg_int(args: &[VMObject], i: usize) -> VmResult<BigInt> {
    args.get(i)
        .ok_or_else(|| VmError::BoundsViolation(format!("missing argument {i}")))?
        .as_int()
}

impl TokenContract {
    fn create(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let symbol = arg_string(&args, 1)?;
        let name = arg_string(&args, 2)?;
        let decimals = arg_int(&args, 3)?.to_u8().unwrap_or(0);
        let max_supply = arg_int(&args, 4)?;
        let flags = TokenFlags::from_bits_truncate(arg_int(&args, 5)?.to_u8().unwrap_or(0));
        runtime.expect(runtime.is_witness(&from), "Create requires the issuer's witness")?;
        runtime.expect(
            runtime.owner.map_or(true, |owner| owner == from),
            "Create requires the nexus owner's witness",
        )?;
        create(runtime.change_set, &symbol, &name, decimals, max_supply, flags)
            .map_err(|e| VmError::Thrown(e.to_string()))?;
        runtime.notify(EventKind::TokenCreate, from, symbol.into_bytes());
        Ok(VMObject::Null)
    }

    fn mint(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let to = arg_address(&args, 1)?;
        let symbol = arg_string(&args, 2)?;
        let amount = arg_int(&args, 3)?;
        runtime.expect(runtime.is_witness(&from), "Mint requires the issuer's witness")?;
        mint(runtime.change_set, &symbol, &to, &amount).map_err(|e| VmError::Thrown(e.to_string()))?;
        runtime.notify(EventKind::TokenMint, to, symbol.into_bytes());
        Ok(VMObject::Null)
    }

    fn burn(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let symbol = arg_string(&args, 1)?;
        let amount = arg_int(&args, 2)?;
        runtime.expect(runtime.is_witness(&from), "Burn requires the holder's witness")?;
        let meta = get_meta(runtime.change_set, &symbol)
            .map_err(|e| VmError::Thrown(e.to_string()))?
            .ok_or_else(|| VmError::Thrown(format!("unknown token {symbol}")))?;
        runtime.expect(meta.flags.contains(TokenFlags::BURNABLE), "token is not burnable")?;
        burn(runtime.change_set, &symbol, &from, &amount).map_err(|e| VmError::Thrown(e.to_string()))?;
        runtime.notify(EventKind::TokenBurn, from, symbol.into_bytes());
        Ok(VMObject::Null)
    }

    fn transfer(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let to = arg_address(&args, 1)?;
        let symbol = arg_string(&args, 2)?;
        let amount = arg_int(&args, 3)?;
        runtime.expect(runtime.is_witness(&from), "Transfer requires the sender's witness")?;
        let meta = get_meta(runtime.change_set, &symbol)
            .map_err(|e| VmError::Thrown(e.to_string()))?
            .ok_or_else(|| VmError::Thrown(format!("unknown token {symbol}")))?;
        runtime.expect(meta.flags.contains(TokenFlags::TRANSFERABLE), "token is not transferable")?;
        transfer(runtime.change_set, &symbol, &from, &to, &amount).map_err(|e| VmError::Thrown(e.to_string()))?;
        runtime.notify(EventKind::TokenSend, from, symbol.clone().into_bytes());
        runtime.notify(EventKind::TokenReceive, to, symbol.into_bytes());
        Ok(VMObject::Null)
    }

    fn get_balance(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let address = arg_address(&args, 0)?;
        let symbol = arg_string(&args, 1)?;
        Ok(VMObject::Int(get_balance(runtime.change_set, &symbol, &address)))
    }

    fn get_supply(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let symbol = arg_string(&args, 0)?;
        Ok(VMObject::Int(get_supply(runtime.change_set, &symbol)))
    }

    /// Debits the sender (or locks the NFT out of their ownership) and
    /// records an escrow keyed by this transaction's hash; settlement
    /// happens on the destination chain (spec.md §4.5, "Send" — "NFTs use
    /// the same protocol"). `amount` is read as a token id when `symbol`
    /// is not `FUNGIBLE`.
    fn side_chain_send(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        const ESCROW_EXPIRY_SECONDS: u64 = 7 * 86_400;

        let from = arg_address(&args, 0)?;
        let symbol = arg_string(&args, 1)?;
        let amount = arg_int(&args, 2)?;
        let cross_fee = arg_int(&args, 3)?;
        let dest_chain = arg_string(&args, 4)?;
        let to = arg_address(&args, 5)?;
        runtime.expect(runtime.is_witness(&from), "SideChainSend requires the sender's witness")?;
        let meta = get_meta(runtime.change_set, &symbol)
            .map_err(|e| VmError::Thrown(e.to_string()))?
            .ok_or_else(|| VmError::Thrown(format!("unknown token {symbol}")))?;

        let (locked_amount, nft) = if meta.flags.contains(TokenFlags::FUNGIBLE) {
            let total = &amount + &cross_fee;
            debit(runtime.change_set, &symbol, &from, &total).map_err(|e| VmError::Thrown(e.to_string()))?;
            (amount, None)
        } else {
            runtime.expect(cross_fee.is_zero(), "NFT cross-chain sends carry no fungible cross_fee")?;
            let id = amount.to_u64().ok_or_else(|| VmError::Thrown("nft id does not fit in u64".to_string()))?;
            let record = lock_nft(runtime.change_set, &symbol, &from, id).map_err(|e| VmError::Thrown(e.to_string()))?;
            (BigInt::zero(), Some(EscrowNft { id, rom: record.rom, ram: record.ram }))
        };
        let record = EscrowRecord {
            symbol: symbol.clone(),
            amount: locked_amount,
            cross_fee,
            dest_chain,
            dest_address: to,
            nft,
            expiration: Timestamp::new(runtime.block.timestamp.secs() + ESCROW_EXPIRY_SECONDS),
        };
        escrow::write(runtime.change_set, &runtime.tx_hash, &record);
        runtime.notify(EventKind::TokenEscrow, from, runtime.tx_hash.as_bytes().to_vec());
        Ok(VMObject::Null)
    }

    fn mint_nft(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let to = arg_address(&args, 1)?;
        let symbol = arg_string(&args, 2)?;
        let rom = arg_bytes(&args, 3)?;
        let ram = arg_bytes(&args, 4)?;
        runtime.expect(runtime.is_witness(&from), "MintNft requires the issuer's witness")?;
        let id = mint_nft(runtime.change_set, &symbol, &to, rom, ram).map_err(|e| VmError::Thrown(e.to_string()))?;
        runtime.notify(EventKind::TokenMint, to, symbol.into_bytes());
        Ok(VMObject::Int(BigInt::from(id)))
    }

    fn transfer_nft(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let to = arg_address(&args, 1)?;
        let symbol = arg_string(&args, 2)?;
        let id = arg_int(&args, 3)?.to_u64().ok_or_else(|| VmError::Thrown("nft id does not fit in u64".to_string()))?;
        runtime.expect(runtime.is_witness(&from), "TransferNft requires the sender's witness")?;
        // Unlike fungible Transfer, NFT moves aren't gated on
        // `TokenFlags::TRANSFERABLE` (spec.md §8 scenario 5 transfers with
        // flags=none) — ownership alone governs who can move an id.
        transfer_nft(runtime.change_set, &symbol, &from, &to, id).map_err(|e| VmError::Thrown(e.to_string()))?;
        runtime.notify(EventKind::TokenSend, from, symbol.clone().into_bytes());
        runtime.notify(EventKind::TokenReceive, to, symbol.into_bytes());
        Ok(VMObject::Null)
    }

    fn burn_nft(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let symbol = arg_string(&args, 1)?;
        let id = arg_int(&args, 2)?.to_u64().ok_or_else(|| VmError::Thrown("nft id does not fit in u64".to_string()))?;
        // As with TransferNft, burning an NFT is gated on ownership, not
        // `TokenFlags::BURNABLE` (spec.md §8 scenario 5 burns with flags=none).
        runtime.expect(runtime.is_witness(&from), "BurnNft requires the holder's witness")?;
        burn_nft(runtime.change_set, &symbol, &from, id).map_err(|e| VmError::Thrown(e.to_string()))?;
        runtime.notify(EventKind::TokenBurn, from, symbol.into_bytes());
        Ok(VMObject::Null)
    }

    fn get_nft_owner(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let symbol = arg_string(&args, 0)?;
        let id = arg_int(&args, 1)?.to_u64().ok_or_else(|| VmError::Thrown("nft id does not fit in u64".to_string()))?;
        Ok(match nft_owner(runtime.change_set, &symbol, id) {
            Some(owner) => VMObject::Address(owner),
            None => VMObject::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_storage::Storage;

    #[test]
    fn mint_and_burn_track_supply() {
        let storage = Storage::default();
        let mut cs = storage.fork_change_set();
        create(&mut cs, "KCAL", "Fuel", 10, BigInt::zero(), TokenFlags::FUNGIBLE.union(TokenFlags::BURNABLE)).unwrap();
        let addr = Address::for_contract("alice").unwrap();
        mint(&mut cs, "KCAL", &addr, &BigInt::from(1000)).unwrap();
        assert_eq!(get_balance(&cs, "KCAL", &addr), BigInt::from(1000));
        assert_eq!(get_supply(&cs, "KCAL"), BigInt::from(1000));
        burn(&mut cs, "KCAL", &addr, &BigInt::from(400)).unwrap();
        assert_eq!(get_balance(&cs, "KCAL", &addr), BigInt::from(600));
        assert_eq!(get_supply(&cs, "KCAL"), BigInt::from(600));
    }

    #[test]
    fn transfer_moves_balance_between_addresses() {
        let storage = Storage::default();
        let mut cs = storage.fork_change_set();
        create(&mut cs, "KCAL", "Fuel", 10, BigInt::zero(), TokenFlags::FUNGIBLE).unwrap();
        let a = Address::for_contract("a").unwrap();
        let b = Address::for_contract("b").unwrap();
        mint(&mut cs, "KCAL", &a, &BigInt::from(500)).unwrap();
        transfer(&mut cs, "KCAL", &a, &b, &BigInt::from(200)).unwrap();
        assert_eq!(get_balance(&cs, "KCAL", &a), BigInt::from(300));
        assert_eq!(get_balance(&cs, "KCAL", &b), BigInt::from(200));
    }

    #[test]
    fn nft_mint_transfer_burn_round_trip() {
        let storage = Storage::default();
        let mut cs = storage.fork_change_set();
        create(&mut cs, "COOL", "Cool", 0, BigInt::zero(), TokenFlags::empty()).unwrap();
        let sender = Address::for_contract("sender").unwrap();
        let receiver = Address::for_contract("receiver").unwrap();
        let id = mint_nft(&mut cs, "COOL", &sender, vec![1, 3, 3, 7], vec![1, 4, 4, 6]).unwrap();
        assert_eq!(nft_owner(&cs, "COOL", id), Some(sender));
        assert_eq!(get_supply(&cs, "COOL"), BigInt::from(1));
        transfer_nft(&mut cs, "COOL", &sender, &receiver, id).unwrap();
        assert_eq!(nft_owner(&cs, "COOL", id), Some(receiver));
        burn_nft(&mut cs, "COOL", &receiver, id).unwrap();
        assert_eq!(nft_owner(&cs, "COOL", id), None);
        assert_eq!(get_supply(&cs, "COOL"), BigInt::from(1), "supply records minted total, burn does not un-mint it");
    }
}
