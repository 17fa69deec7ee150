//! Maps contract addresses to either deployed bytecode or a native
//! (Rust-implemented) contract handler.

use crate::runtime::Runtime;
use std::collections::HashMap;
use std::rc::Rc;
use vela_core::Address;
use vela_vm::{VMObject, VmResult};

/// A contract implemented directly in Rust rather than bytecode, reached
/// through `SWITCH` the same way a deployed script is (spec.md §4.4,
/// "Native contracts").
pub trait NativeContract {
    fn name(&self) -> &str;
    fn invoke(&self, runtime: &mut Runtime, method: &str, args: Vec<VMObject>) -> VmResult<VMObject>;
}

enum Entry {
    Script(Rc<[u8]>),
    Native(Rc<dyn NativeContract>),
}

/// What a resolved address turns out to be.
pub enum Resolved {
    Script(Rc<[u8]>),
    Native(Rc<dyn NativeContract>),
}

#[derive(Default)]
pub struct ContractRegistry {
    entries: HashMap<Address, Entry>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_script(&mut self, address: Address, script: Rc<[u8]>) {
        self.entries.insert(address, Entry::Script(script));
    }

    pub fn register_native(&mut self, address: Address, contract: Rc<dyn NativeContract>) {
        self.entries.insert(address, Entry::Native(contract));
    }

    pub fn resolve(&self, address: &Address) -> Option<Resolved> {
        match self.entries.get(address)? {
            Entry::Script(script) => Some(Resolved::Script(script.clone())),
            Entry::Native(contract) => Some(Resolved::Native(contract.clone())),
        }
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains_key(address)
    }
}
