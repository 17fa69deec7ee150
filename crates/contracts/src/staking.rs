//! The staking/fuel contract: the canonical non-trivial native contract
//! (spec.md §4.4 "Staking contract (detailed example)"). Staking the
//! StakingToken (SOUL) accrues FuelToken (KCAL) over time, optionally
//! redirected through proxies.
//!
//! spec.md §9 flags several bugs in the system this was distilled from;
//! the accrual and read-boundary logic here implements the documented
//! *intended* behavior rather than reproducing them.

use crate::error::ContractResult;
use crate::token;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use vela_core::{Address, Timestamp};
use vela_io::{BinaryReader, BinaryWriter, IoResult, Serializable};
use vela_runtime::{EventKind, NativeContract, Runtime};
use vela_storage::{ChangeSet, StorageMap};
use vela_vm::{VMObject, VmError, VmResult};

pub const STAKING_TOKEN: &str = "SOUL";
pub const FUEL_TOKEN: &str = "KCAL";
/// 1 SOUL-second yields 1/500 KCAL per day (spec.md §4.4).
pub const ENERGY_RATIO_DIVISOR: u64 = 500;
const SECONDS_PER_DAY: u64 = 86_400;
const MAX_PROXIES: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StakeEntry {
    amount: BigInt,
    timestamp: Timestamp,
}

impl Serializable for StakeEntry {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_bigint(&self.amount);
        w.write_timestamp(self.timestamp);
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        Ok(Self {
            amount: r.read_bigint(64)?,
            timestamp: r.read_timestamp()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProxyEntry {
    address: Address,
    percentage: u8,
}

impl Serializable for ProxyEntry {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_address(&self.address);
        w.write_u8(self.percentage);
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        Ok(Self {
            address: r.read_address()?,
            percentage: r.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ProxyList(Vec<ProxyEntry>);

impl Serializable for ProxyList {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_u8(self.0.len() as u8);
        for entry in &self.0 {
            entry.encode(w);
        }
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        let count = r.read_u8()?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            entries.push(ProxyEntry::decode(r)?);
        }
        Ok(Self(entries))
    }
}

fn stakes() -> StorageMap {
    StorageMap::new(b"staking:stake:".to_vec())
}
fn claims() -> StorageMap {
    StorageMap::new(b"staking:claim:".to_vec())
}
fn proxies() -> StorageMap {
    StorageMap::new(b"staking:proxy:".to_vec())
}

/// The address staked SOUL is escrowed under while it is locked — derived
/// the same way any other contract address is (spec.md §3, "Address").
fn chain_escrow_address() -> Address {
    Address::for_contract("staking.escrow").expect("static name derives a valid address")
}

fn proxy_list(cs: &ChangeSet, address: &Address) -> ContractResult<Vec<ProxyEntry>> {
    Ok(proxies().get::<ProxyList>(cs, address.as_bytes())?.unwrap_or_default().0)
}

fn set_proxy_list(cs: &mut ChangeSet, address: &Address, list: &[ProxyEntry]) {
    proxies().set(cs, address.as_bytes(), &ProxyList(list.to_vec()));
}

pub struct StakingContract;

impl NativeContract for StakingContract {
    fn name(&self) -> &str {
        "staking"
    }

    fn invoke(&self, runtime: &mut Runtime, method: &str, args: Vec<VMObject>) -> VmResult<VMObject> {
        match method {
            "Stake" => self.stake(runtime, args),
            "Unstake" => self.unstake(runtime, args),
            "Claim" => self.claim(runtime, args),
            "AddProxy" => self.add_proxy(runtime, args),
            "RemoveProxy" => self.remove_proxy(runtime, args),
            "ClearProxies" => self.clear_proxies(runtime, args),
            "GetProxies" => self.get_proxies(runtime, args),
            "GetStake" => self.get_stake(runtime, args),
            other => Err(VmError::UnknownInterop(format!("staking.{other}"))),
        }
    }
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

impl StakingContract {
    fn stake(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let amount = arg_int(&args, 1)?;
        runtime.expect(runtime.is_witness(&from), "Stake requires the staker's witness")?;
        runtime.expect(amount >= BigInt::from(ENERGY_RATIO_DIVISOR), "stake amount below the energy ratio divisor")?;
        token::debit(runtime.change_set, STAKING_TOKEN, &from, &amount).map_err(|e| VmError::Thrown(e.to_string()))?;
        token::credit(runtime.change_set, STAKING_TOKEN, &chain_escrow_address(), &amount);
        let entry = StakeEntry { amount, timestamp: runtime.block.timestamp };
        stakes().set(runtime.change_set, from.as_bytes(), &entry);
        runtime.notify(EventKind::TokenStake, from, entry.amount.to_signed_bytes_le());
        Ok(VMObject::Null)
    }

    fn unstake(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        runtime.expect(runtime.is_witness(&from), "Unstake requires the staker's witness")?;
        let entry: StakeEntry = stakes()
            .get(runtime.change_set, from.as_bytes())
            .map_err(|e| VmError::Thrown(e.to_string()))?
            .ok_or_else(|| VmError::Thrown("no stake entry for this address".to_string()))?;
        let elapsed = runtime.block.timestamp.since(entry.timestamp);
        runtime.expect(elapsed >= SECONDS_PER_DAY, "stake is still within its lock period")?;
        // §9(d): the source used `entry.stake`, a field that doesn't exist on
        // the struct it names (`amount`) — the amount staked is what unlocks.
        token::credit(runtime.change_set, STAKING_TOKEN, &from, &entry.amount);
        token::debit(runtime.change_set, STAKING_TOKEN, &chain_escrow_address(), &entry.amount)
            .map_err(|e| VmError::Thrown(e.to_string()))?;
        stakes().delete(runtime.change_set, from.as_bytes());
        runtime.notify(EventKind::TokenUnstake, from, entry.amount.to_signed_bytes_le());
        Ok(VMObject::Null)
    }

    fn claim(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let stake_address = arg_address(&args, 1)?;
        runtime.expect(runtime.is_witness(&from), "Claim requires the claimant's witness")?;

        let stake: StakeEntry = stakes()
            .get(runtime.change_set, stake_address.as_bytes())
            .map_err(|e| VmError::Thrown(e.to_string()))?
            .ok_or_else(|| VmError::Thrown("no stake entry for this address".to_string()))?;
        let last: Option<StakeEntry> = claims()
            .get(runtime.change_set, stake_address.as_bytes())
            .map_err(|e| VmError::Thrown(e.to_string()))?;

        let already_claimed = match &last {
            Some(last) if runtime.block.timestamp.since(last.timestamp) < SECONDS_PER_DAY => last.amount.clone(),
            _ => BigInt::zero(),
        };
        let unclaimed = &stake.amount - &already_claimed;
        runtime.expect(unclaimed > BigInt::zero(), "nothing unclaimed yet")?;

        if from != stake_address {
            let delegate = proxy_list(runtime.change_set, &stake_address).map_err(|e| VmError::Thrown(e.to_string()))?;
            runtime.expect(
                delegate.iter().any(|p| p.address == from),
                "claimant is not a registered proxy for this stake",
            )?;
        }

        let fuel = unclaimed / BigInt::from(ENERGY_RATIO_DIVISOR);
        let proxy_entries = proxy_list(runtime.change_set, &stake_address).map_err(|e| VmError::Thrown(e.to_string()))?;

        let mut distributed = BigInt::zero();
        for proxy in &proxy_entries {
            let share = &fuel * BigInt::from(proxy.percentage) / BigInt::from(100u8);
            if share > BigInt::zero() {
                // §9(e): the source mints StakingToken balances here; a fuel
                // token accrual contract must mint FuelToken.
                token::mint(runtime.change_set, FUEL_TOKEN, &proxy.address, &share)
                    .map_err(|e| VmError::Thrown(e.to_string()))?;
                runtime.notify(EventKind::TokenMint, proxy.address, share.to_signed_bytes_le());
                distributed += share;
            }
        }
        let remainder = &fuel - &distributed;
        if remainder > BigInt::zero() {
            token::mint(runtime.change_set, FUEL_TOKEN, &stake_address, &remainder)
                .map_err(|e| VmError::Thrown(e.to_string()))?;
            runtime.notify(EventKind::TokenMint, stake_address, remainder.to_signed_bytes_le());
        }

        let new_claim = StakeEntry { amount: stake.amount.clone(), timestamp: runtime.block.timestamp };
        claims().set(runtime.change_set, stake_address.as_bytes(), &new_claim);
        runtime.notify(EventKind::TokenClaim, stake_address, fuel.to_signed_bytes_le());
        Ok(VMObject::Null)
    }

    fn add_proxy(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let to = arg_address(&args, 1)?;
        let pct = arg_int(&args, 2)?.to_u8().unwrap_or(0);
        runtime.expect(runtime.is_witness(&from), "AddProxy requires the delegator's witness")?;
        runtime.expect(pct > 0 && pct <= 100, "percentage must be in 1..=100")?;
        runtime.expect(from != to, "cannot delegate to yourself")?;

        let mut list = proxy_list(runtime.change_set, &from).map_err(|e| VmError::Thrown(e.to_string()))?;
        let existing_total: u32 = list.iter().filter(|p| p.address != to).map(|p| p.percentage as u32).sum();
        runtime.expect(existing_total + pct as u32 <= 100, "combined proxy percentage exceeds 100")?;
        runtime.expect(list.len() < MAX_PROXIES, "too many proxies already registered")?;

        match list.iter_mut().find(|p| p.address == to) {
            Some(entry) => entry.percentage = pct,
            None => list.push(ProxyEntry { address: to, percentage: pct }),
        }
        set_proxy_list(runtime.change_set, &from, &list);
        runtime.notify(EventKind::AddressAdd, to, vec![pct]);
        Ok(VMObject::Null)
    }

    fn remove_proxy(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        let to = arg_address(&args, 1)?;
        runtime.expect(runtime.is_witness(&from), "RemoveProxy requires the delegator's witness")?;
        let mut list = proxy_list(runtime.change_set, &from).map_err(|e| VmError::Thrown(e.to_string()))?;
        list.retain(|p| p.address != to);
        set_proxy_list(runtime.change_set, &from, &list);
        runtime.notify(EventKind::AddressRemove, to, vec![]);
        Ok(VMObject::Null)
    }

    fn clear_proxies(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let from = arg_address(&args, 0)?;
        runtime.expect(runtime.is_witness(&from), "ClearProxies requires the delegator's witness")?;
        proxies().delete(runtime.change_set, from.as_bytes());
        Ok(VMObject::Null)
    }

    fn get_proxies(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let address = arg_address(&args, 0)?;
        let list = proxy_list(runtime.change_set, &address).map_err(|e| VmError::Thrown(e.to_string()))?;
        let fields = list
            .into_iter()
            .map(|p| VMObject::Struct(vec![VMObject::Address(p.address), VMObject::Int(BigInt::from(p.percentage))]))
            .collect();
        Ok(VMObject::Struct(fields))
    }

    fn get_stake(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let address = arg_address(&args, 0)?;
        let entry: Option<StakeEntry> =
            stakes().get(runtime.change_set, address.as_bytes()).map_err(|e| VmError::Thrown(e.to_string()))?;
        Ok(match entry {
            Some(entry) => VMObject::Int(entry.amount),
            None => VMObject::Int(BigInt::zero()),
        })
    }
}
