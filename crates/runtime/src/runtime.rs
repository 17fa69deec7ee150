//! `Runtime`: the per-transaction execution context. It owns the
//! transaction's storage overlay and gas ledger and is the concrete
//! `InteropHost` the VM engine calls back into (spec.md §4.2, §9's
//! context-passing note).

use crate::event::{Event, EventKind};
use crate::registry::{ContractRegistry, Resolved};
use std::rc::Rc;
use tracing::{debug, warn};
use vela_core::{Address, Hash256, Timestamp};
use vela_storage::ChangeSet;
use vela_vm::{InteropHost, SwitchOutcome, VMObject, VMState, VmError, VmResult};

/// Everything about the surrounding block a running transaction can
/// observe (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct BlockContext {
    pub chain_name: String,
    pub height: u64,
    pub timestamp: Timestamp,
    pub producer: Address,
}

pub struct Runtime<'a> {
    pub change_set: &'a mut ChangeSet,
    registry: Rc<ContractRegistry>,
    pub block: BlockContext,
    pub tx_hash: Hash256,
    pub signers: Vec<Address>,
    pub events: Vec<Event>,
    pub used_gas: u64,
    pub paid_gas: u64,
    pub max_gas: u64,
    pub gas_price: u64,
    /// The nexus owner address, when known — `None` during genesis
    /// bootstrap, before a nexus has an owner to check against (spec.md
    /// §4.4, Token contract's "requires genesis or nexus owner").
    pub owner: Option<Address>,
}

impl<'a> Runtime<'a> {
    pub fn new(
        change_set: &'a mut ChangeSet,
        registry: Rc<ContractRegistry>,
        block: BlockContext,
        tx_hash: Hash256,
        signers: Vec<Address>,
        max_gas: u64,
        gas_price: u64,
    ) -> Self {
        Self {
            change_set,
            registry,
            block,
            tx_hash,
            signers,
            events: Vec::new(),
            used_gas: 0,
            paid_gas: 0,
            max_gas,
            gas_price,
            owner: None,
        }
    }

    /// Records the nexus owner so native contracts can enforce
    /// owner-only operations (spec.md §4.4, Token contract's `Create`).
    pub fn set_owner(&mut self, owner: Address) {
        self.owner = Some(owner);
    }

    /// Appends an event to the transaction log. `GasEscrow` and
    /// `GasPayment` are additionally intercepted to mutate the running gas
    /// counters (spec.md §4.2, "Notify").
    pub fn notify(&mut self, kind: EventKind, address: Address, payload: Vec<u8>) {
        match kind {
            EventKind::GasEscrow if payload.len() >= 16 => {
                self.max_gas = u64::from_le_bytes(payload[0..8].try_into().unwrap());
                self.gas_price = u64::from_le_bytes(payload[8..16].try_into().unwrap());
            }
            EventKind::GasPayment if payload.len() >= 8 => {
                self.paid_gas = u64::from_le_bytes(payload[0..8].try_into().unwrap());
            }
            _ => {}
        }
        self.events.push(Event { kind, address, payload });
    }

    /// Fails the current interop call unless `condition` holds — the
    /// runtime-level equivalent of `THROW` (spec.md §4.2, "Expect").
    pub fn expect(&self, condition: bool, message: impl Into<String>) -> VmResult<()> {
        if condition {
            Ok(())
        } else {
            Err(VmError::Thrown(message.into()))
        }
    }

    pub fn is_witness(&self, address: &Address) -> bool {
        self.signers.contains(address)
    }

    pub fn pay_gas(&mut self, amount: u64) {
        self.paid_gas += amount;
    }

    /// Resolves a contract's symbolic name to its deployment address,
    /// failing if nothing is registered there (spec.md §4.2, "LoadContext").
    pub fn load_context(&self, name: &str) -> VmResult<Address> {
        let address = Address::for_contract(name).map_err(|e| VmError::Thrown(e.to_string()))?;
        if self.registry.contains(&address) {
            Ok(address)
        } else {
            Err(VmError::UnresolvableContext)
        }
    }

    /// Reconciles the VM's terminal state against gas actually paid: a
    /// script that `Halt`ed without the fee payer covering `used_gas` is
    /// downgraded to a `Fault`, discarding its storage changes (spec.md
    /// §4.2, "usedGas/paidGas/maxGas").
    pub fn finalize(&self, state: VMState) -> VMState {
        if state.is_halt() && self.used_gas > self.paid_gas {
            warn!(
                used_gas = self.used_gas,
                paid_gas = self.paid_gas,
                "transaction halted without covering its gas bill"
            );
            return VMState::Fault(format!(
                "insufficient gas paid: used {} > paid {}",
                self.used_gas, self.paid_gas
            ));
        }
        state
    }
}

impl<'a> InteropHost for Runtime<'a> {
    fn invoke_interop(&mut self, name: &str, args: &mut Vec<VMObject>) -> VmResult<VMObject> {
        debug!(interop = name, "dispatching host interop");
        match name {
            "Runtime.Notify" => {
                // Script pushes [kind, address, payload] before EXTCALL;
                // args are popped in that push order (last in, first out).
                let payload = args.pop().unwrap_or(VMObject::Null).as_bytes()?;
                let address = args
                    .pop()
                    .ok_or(VmError::StackUnderflow { needed: 2, available: 0 })?
                    .as_address()?;
                let kind_tag = args
                    .pop()
                    .ok_or(VmError::StackUnderflow { needed: 3, available: 1 })?
                    .as_i64()?;
                let kind = event_kind_from_tag(kind_tag)?;
                self.notify(kind, address, payload);
                Ok(VMObject::Null)
            }
            "Runtime.CheckWitness" => {
                let addr = args
                    .pop()
                    .ok_or(VmError::StackUnderflow { needed: 1, available: 0 })?
                    .as_address()?;
                Ok(VMObject::Bool(self.is_witness(&addr)))
            }
            "Runtime.GetTime" => Ok(VMObject::from(self.block.timestamp.secs() as i64)),
            "Runtime.GetHeight" => Ok(VMObject::from(self.block.height as i64)),
            other => Err(VmError::UnknownInterop(other.to_string())),
        }
    }

    fn switch_context(&mut self, address: &Address, argument: VMObject) -> VmResult<SwitchOutcome> {
        match self.registry.resolve(address) {
            Some(Resolved::Script(script)) => Ok(SwitchOutcome::EnterScript(script)),
            Some(Resolved::Native(contract)) => {
                let fields = argument.as_struct()?;
                let method = fields
                    .first()
                    .ok_or_else(|| VmError::BoundsViolation("missing native call method".into()))?
                    .as_string()?;
                let call_args = match fields.get(1) {
                    Some(VMObject::Struct(a)) => a.clone(),
                    Some(other) => vec![other.clone()],
                    None => Vec::new(),
                };
                contract.invoke(self, &method, call_args).map(SwitchOutcome::Returned)
            }
            None => Err(VmError::UnresolvableContext),
        }
    }
}

fn event_kind_from_tag(tag: i64) -> VmResult<EventKind> {
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
        other => return Err(VmError::BoundsViolation(format!("unknown event kind tag {other}"))),
    })
}
