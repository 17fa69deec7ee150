//! A single call frame: instruction pointer, registers, the script it is
//! executing, and where to return control when it `RET`s (spec.md §4.1).

use crate::error::{VmError, VmResult};
use crate::object::VMObject;
use crate::op_code::NUM_REGISTERS;
use std::rc::Rc;
use vela_core::Address;

#[derive(Debug, Clone)]
pub struct Frame {
    pub ip: usize,
    pub registers: [VMObject; NUM_REGISTERS],
    /// The bytecode this frame is executing.
    pub script: Rc<[u8]>,
    /// The contract address that owns `script` — what `THIS` returns.
    pub context_address: Address,
    /// Return addresses for intra-script `CALL`/`RET` subroutine calls.
    /// Distinct from the engine's stack of `Frame`s, which is for
    /// cross-contract calls entered through `SWITCH`.
    pub return_stack: Vec<usize>,
}

impl Frame {
    pub fn new(script: Rc<[u8]>, context_address: Address) -> Self {
        Self {
            ip: 0,
            registers: std::array::from_fn(|_| VMObject::Null),
            script,
            context_address,
            return_stack: Vec::new(),
        }
    }

    pub fn register(&self, index: u8) -> VmResult<&VMObject> {
        self.registers
            .get(index as usize)
            .ok_or(VmError::InvalidRegister(index))
    }

    pub fn set_register(&mut self, index: u8, value: VMObject) -> VmResult<()> {
        let slot = self
            .registers
            .get_mut(index as usize)
            .ok_or(VmError::InvalidRegister(index))?;
        *slot = value;
        Ok(())
    }
}
