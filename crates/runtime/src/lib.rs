//! Transaction execution context: bridges `vela-vm`'s engine to persistent
//! storage, gas accounting, and native contracts (spec.md §4.2).

mod error;
mod event;
mod registry;
mod runtime;

pub use error::{RuntimeError, RuntimeResult};
pub use event::{encode_gas_escrow, encode_gas_payment, Event, EventKind};
pub use registry::{ContractRegistry, NativeContract, Resolved};
pub use runtime::{BlockContext, Runtime};

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use vela_core::{Address, Hash256, Timestamp};
    use vela_storage::{ChangeSet, Storage};
    use vela_vm::{ExecutionEngine, OpCode, VMState};

    fn test_block() -> BlockContext {
        BlockContext {
            chain_name: "main".to_string(),
            height: 1,
            timestamp: Timestamp::new(0),
            producer: Address::for_contract("producer").unwrap(),
        }
    }

    #[test]
    fn runtime_host_notify_appends_an_event() {
        let storage = Storage::default();
        let mut change_set = storage.fork_change_set();
        let registry = Rc::new(ContractRegistry::new());
        let mut runtime = Runtime::new(
            &mut change_set,
            registry,
            test_block(),
            Hash256::ZERO,
            vec![],
            1_000_000,
            1_000_000,
        );
        let contract = Address::for_contract("test").unwrap();
        runtime.notify(EventKind::TokenSend, contract, vec![1, 2, 3]);
        assert_eq!(runtime.events.len(), 1);
        assert_eq!(runtime.events[0].kind, EventKind::TokenSend);
    }

    #[test]
    fn gas_escrow_event_sets_max_gas_and_price() {
        let storage = Storage::default();
        let mut change_set = storage.fork_change_set();
        let registry = Rc::new(ContractRegistry::new());
        let mut runtime = Runtime::new(
            &mut change_set,
            registry,
            test_block(),
            Hash256::ZERO,
            vec![],
            0,
            0,
        );
        let payer = Address::for_contract("payer").unwrap();
        runtime.notify(EventKind::GasEscrow, payer, encode_gas_escrow(5_000, 3));
        assert_eq!(runtime.max_gas, 5_000);
        assert_eq!(runtime.gas_price, 3);
    }

    #[test]
    fn finalize_downgrades_halt_to_fault_when_gas_unpaid() {
        let storage = Storage::default();
        let mut change_set = storage.fork_change_set();
        let registry = Rc::new(ContractRegistry::new());
        let mut runtime = Runtime::new(
            &mut change_set,
            registry,
            test_block(),
            Hash256::ZERO,
            vec![],
            1_000_000,
            0,
        );
        runtime.used_gas = 5;
        let state = runtime.finalize(VMState::Halt);
        assert!(state.is_fault());
    }

    #[test]
    fn engine_runs_against_a_real_runtime_host() {
        let storage = Storage::default();
        let mut change_set = storage.fork_change_set();
        let registry = Rc::new(ContractRegistry::new());
        let mut runtime = Runtime::new(
            &mut change_set,
            registry,
            test_block(),
            Hash256::ZERO,
            vec![],
            1_000_000,
            1_000_000,
        );
        let script: Vec<u8> = vec![OpCode::Nop as u8, OpCode::Ret as u8];
        let addr = Address::for_contract("test").unwrap();
        let mut engine = ExecutionEngine::new(Rc::from(script.into_boxed_slice()), addr, 1_000_000);
        let state = engine.run(&mut runtime);
        assert_eq!(state, VMState::Halt);
    }
}
