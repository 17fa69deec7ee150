//! The account contract: a bidirectional address ↔ human name directory
//! (spec.md §4.4 "Account contract", testable scenario 6).

use crate::error::ContractError;
use vela_core::Address;
use vela_io::{BinaryReader, BinaryWriter, IoResult, Serializable};
use vela_runtime::{EventKind, NativeContract, Runtime};
use vela_storage::{ChangeSet, StorageMap};
use vela_vm::{VMObject, VmError, VmResult};

const MIN_NAME_LEN: usize = 4;
const MAX_NAME_LEN: usize = 15;

fn names() -> StorageMap {
    StorageMap::new(b"account:name:".to_vec())
}
fn addresses() -> StorageMap {
    StorageMap::new(b"account:address:".to_vec())
}

fn is_valid_name(name: &str) -> bool {
    let len = name.len();
    (MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len)
        && name.bytes().all(|b| b.is_ascii_lowercase())
}

pub fn lookup_name(cs: &ChangeSet, address: &Address) -> Option<String> {
    names()
        .get_bytes(cs, address.as_bytes())
        .map(|b| String::from_utf8_lossy(&b).into_owned())
}

pub fn lookup_address(cs: &ChangeSet, name: &str) -> Option<Address> {
    addresses().get::<StoredAddress>(cs, name.as_bytes()).ok().flatten().map(|s| s.0)
}

/// Registers `name` for `address`. Fails if the name is malformed, already
/// taken by a different address, or `address` already has a name bound —
/// registration is one-time per address (testable scenario 6: a second
/// `Register` call for an already-named user fails even under a fresh
/// name).
pub fn register(cs: &mut ChangeSet, address: &Address, name: &str) -> Result<(), ContractError> {
    if !is_valid_name(name) {
        return Err(ContractError::InvalidOperation(format!("{name}: not a valid account name")));
    }
    if lookup_name(cs, address).is_some() {
        return Err(ContractError::InvalidOperation("address is already registered".to_string()));
    }
    if lookup_address(cs, name).is_some() {
        return Err(ContractError::InvalidOperation(format!("{name}: already registered")));
    }
    names().set_bytes(cs, address.as_bytes(), name.as_bytes().to_vec());
    addresses().set(cs, name.as_bytes(), &StoredAddress(*address));
    Ok(())
}

/// Thin `Serializable` wrapper so `Address` can sit in a `StorageMap`.
struct StoredAddress(Address);

impl Serializable for StoredAddress {
    fn encode(&self, w: &mut BinaryWriter) {
        w.write_address(&self.0);
    }

    fn decode(r: &mut BinaryReader) -> IoResult<Self> {
        Ok(Self(r.read_address()?))
    }
}

pub struct AccountContract;

impl NativeContract for AccountContract {
    fn name(&self) -> &str {
        "account"
    }

    fn invoke(&self, runtime: &mut Runtime, method: &str, args: Vec<VMObject>) -> VmResult<VMObject> {
        match method {
            "Register" => self.register(runtime, args),
            "LookUpName" => self.lookup_name(runtime, args),
            "LookUpAddress" => self.lookup_address(runtime, args),
            other => Err(VmError::UnknownInterop(format!("account.{other}"))),
        }
    }
}

impl AccountContract {
    fn register(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let address = args
            .first()
            .ok_or_else(|| VmError::BoundsViolation("missing argument 0".into()))?
            .as_address()?;
        let name = args
            .get(1)
            .ok_or_else(|| VmError::BoundsViolation("missing argument 1".into()))?
            .as_string()?;
        runtime.expect(runtime.is_witness(&address), "Register requires the address's witness")?;
        register(runtime.change_set, &address, &name).map_err(|e| VmError::Thrown(e.to_string()))?;
        runtime.notify(EventKind::AddressRegister, address, name.into_bytes());
        Ok(VMObject::Null)
    }

    fn lookup_name(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let address = args
            .first()
            .ok_or_else(|| VmError::BoundsViolation("missing argument 0".into()))?
            .as_address()?;
        Ok(match lookup_name(runtime.change_set, &address) {
            Some(name) => VMObject::String(name),
            None => VMObject::Null,
        })
    }

    fn lookup_address(&self, runtime: &mut Runtime, args: Vec<VMObject>) -> VmResult<VMObject> {
        let name = args
            .first()
            .ok_or_else(|| VmError::BoundsViolation("missing argument 0".into()))?
            .as_string()?;
        Ok(match lookup_address(runtime.change_set, &name) {
            Some(address) => VMObject::Address(address),
            None => VMObject::Null,
        })
    }
}
