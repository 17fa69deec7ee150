//! Host hooks the engine calls out to: named interop methods (`EXTCALL`)
//! and context resolution for cross-contract calls (`CTX`/`SWITCH`),
//! spec.md §4.1's "Interop" and "Context (SWITCH)" sections.
//!
//! The VM crate knows nothing about transactions, chains, or native
//! contracts — those concerns live in `vela-runtime` and `vela-contracts`.
//! This trait is the seam between them, following the context-passing
//! design note in spec.md §9 (the host is passed explicitly into `run`,
//! never stashed in a global).

use crate::error::VmResult;
use crate::object::VMObject;
use std::rc::Rc;
use vela_core::Address;

/// What happens when bytecode `SWITCH`es into a resolved context.
pub enum SwitchOutcome {
    /// Push a new frame and keep interpreting bytecode.
    EnterScript(Rc<[u8]>),
    /// The context was a native (non-bytecode) contract; the host already
    /// ran it to completion and this is its result.
    Returned(VMObject),
}

/// Host capabilities the running script can reach. Implemented by
/// `vela-runtime`'s `Runtime`.
pub trait InteropHost {
    /// Dispatches a named host method popped off the evaluation stack by
    /// `EXTCALL`. The handler is responsible for popping its own arguments
    /// from `args` (in push order) and pushing its result, if any.
    fn invoke_interop(&mut self, name: &str, args: &mut Vec<VMObject>) -> VmResult<VMObject>;

    /// Resolves a `CTX`-built address into either another script to enter
    /// or a native contract invocation already run to completion.
    ///
    /// `argument` is the single value `SWITCH` copied off the top of the
    /// evaluation stack (conventionally a `Struct` of `[method, args]` for
    /// native contracts).
    fn switch_context(&mut self, address: &Address, argument: VMObject) -> VmResult<SwitchOutcome>;
}
