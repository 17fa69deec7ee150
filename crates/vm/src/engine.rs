//! The opcode-dispatch interpreter loop (spec.md §4.1).
//!
//! `ExecutionEngine` owns the call stack of [`Frame`]s, the shared
//! [`EvaluationStack`], gas accounting, and the current [`VMState`]. It
//! knows nothing about transactions or native contracts: those are reached
//! only through the [`InteropHost`] passed into `run`.

use crate::error::VmError;
use crate::evaluation_stack::EvaluationStack;
use crate::frame::Frame;
use crate::instruction::Instruction;
use crate::interop::{InteropHost, SwitchOutcome};
use crate::object::VMObject;
use crate::op_code::OpCode;
use crate::vm_state::VMState;
use num_bigint::BigInt;
use num_traits::Zero;
use std::rc::Rc;
use vela_core::Address;

/// Register conventions shared by `CALL`/`RET` and `SWITCH`: register 0
/// carries a subroutine or contract call's return value.
const RESULT_REGISTER: u8 = 0;

/// Maximum depth of the cross-contract frame stack, guarding against
/// unbounded `SWITCH` recursion.
const MAX_CALL_DEPTH: usize = 256;

pub struct ExecutionEngine {
    frames: Vec<Frame>,
    stack: EvaluationStack,
    state: VMState,
    pub used_gas: u64,
    pub max_gas: u64,
    /// Bypasses gas charging while the native fuel token's supply is zero
    /// (spec.md §4.1, "Gas metering" bootstrap carve-out).
    pub gas_metering_enabled: bool,
}

impl ExecutionEngine {
    pub fn new(script: Rc<[u8]>, context_address: Address, max_gas: u64) -> Self {
        Self {
            frames: vec![Frame::new(script, context_address)],
            stack: EvaluationStack::new(),
            state: VMState::Running,
            used_gas: 0,
            max_gas,
            gas_metering_enabled: true,
        }
    }

    pub fn state(&self) -> &VMState {
        &self.state
    }

    pub fn evaluation_stack(&self) -> &EvaluationStack {
        &self.stack
    }

    fn current_frame(&self) -> &Frame {
        self.frames.last().expect("engine always has a frame while running")
    }

    fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("engine always has a frame while running")
    }

    fn fault(&mut self, err: VmError) -> VMState {
        let state = VMState::Fault(err.to_string());
        self.state = state.clone();
        state
    }

    /// Runs until the VM halts, faults, or exhausts `max_gas`.
    pub fn run(&mut self, host: &mut dyn InteropHost) -> VMState {
        loop {
            if self.state != VMState::Running {
                return self.state.clone();
            }
            match self.step(host) {
                Ok(()) => {}
                Err(err) => return self.fault(err),
            }
        }
    }

    fn charge_gas(&mut self, cost: u64) -> Result<(), VmError> {
        if !self.gas_metering_enabled {
            return Ok(());
        }
        let next = self.used_gas + cost;
        if next > self.max_gas {
            return Err(VmError::OutOfGas {
                used: next,
                limit: self.max_gas,
            });
        }
        self.used_gas = next;
        Ok(())
    }

    fn step(&mut self, host: &mut dyn InteropHost) -> Result<(), VmError> {
        let script = self.current_frame().script.clone();
        let ip = self.current_frame().ip;
        if ip >= script.len() {
            self.state = VMState::Halt;
            return Ok(());
        }
        let ins = Instruction::decode(&script, ip)?;
        self.charge_gas(ins.opcode.gas_cost())?;
        self.current_frame_mut().ip = ins.next_position;
        self.dispatch(&ins, host)
    }

    fn dispatch(&mut self, ins: &Instruction, host: &mut dyn InteropHost) -> Result<(), VmError> {
        use OpCode::*;
        match ins.opcode {
            Nop => {}
            Move => {
                let (src, dst) = (ins.reg(0), ins.reg(1));
                let value = self.current_frame().register(src)?.clone();
                self.current_frame_mut().set_register(src, VMObject::Null)?;
                self.current_frame_mut().set_register(dst, value)?;
            }
            Copy => {
                let (src, dst) = (ins.reg(0), ins.reg(1));
                let value = self.current_frame().register(src)?.clone();
                self.current_frame_mut().set_register(dst, value)?;
            }
            Swap => {
                let (a, b) = (ins.reg(0), ins.reg(1));
                let va = self.current_frame().register(a)?.clone();
                let vb = self.current_frame().register(b)?.clone();
                self.current_frame_mut().set_register(a, vb)?;
                self.current_frame_mut().set_register(b, va)?;
            }
            Load => self.exec_load(ins)?,
            Push => {
                let value = self.current_frame().register(ins.reg(0))?.clone();
                self.stack.push(value);
            }
            Pop => {
                let value = self.stack.pop()?;
                self.current_frame_mut().set_register(ins.reg(0), value)?;
            }
            Add | Sub | Mul | Div | Mod | Shl | Shr | Min | Max => self.exec_arithmetic(ins)?,
            Inc | Dec => self.exec_incdec(ins)?,
            Negate | Abs | Sign | Not | Size => self.exec_unary(ins)?,
            And | Or | Xor | Equal | Lt | Lte | Gt | Gte => self.exec_compare(ins)?,
            Cat => self.exec_cat(ins)?,
            Left | Right => self.exec_slice(ins)?,
            Jmp => self.jump(ins, true)?,
            JmpIf => {
                let cond = self.current_frame().register(ins.reg(0))?.as_bool()?;
                self.jump(ins, cond)?;
            }
            JmpNot => {
                let cond = self.current_frame().register(ins.reg(0))?.as_bool()?;
                self.jump(ins, !cond)?;
            }
            Call => self.exec_call(ins)?,
            Ret => self.exec_ret()?,
            Throw => return Err(VmError::Thrown(String::from_utf8_lossy(&ins.operand).into_owned())),
            Ctx => {
                let src = ins.reg(0);
                let dst = ins.reg(1);
                let addr = self.current_frame().register(src)?.as_address()?;
                self.current_frame_mut().set_register(dst, VMObject::Context(addr))?;
            }
            Switch => self.exec_switch(ins, host)?,
            ExtCall => self.exec_extcall(host)?,
            This => {
                let addr = self.current_frame().context_address;
                self.current_frame_mut().set_register(ins.reg(0), VMObject::Address(addr))?;
            }
            Put => self.exec_put(ins)?,
            Get => self.exec_get(ins)?,
        }
        Ok(())
    }

    fn jump(&mut self, ins: &Instruction, take: bool) -> Result<(), VmError> {
        if !take {
            return Ok(());
        }
        let offset = ins.i16_operand() as i64;
        let target = ins.position as i64 + offset;
        let len = self.current_frame().script.len();
        if target < 0 || target as usize >= len {
            return Err(VmError::InvalidJumpTarget { target, len });
        }
        self.current_frame_mut().ip = target as usize;
        Ok(())
    }

    fn exec_load(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let dst = ins.operand[0];
        let type_byte = ins.operand[1];
        let payload = &ins.operand[2..];
        let value = match type_byte {
            0 => VMObject::Null,
            1 => VMObject::Bool(payload.first().copied().unwrap_or(0) != 0),
            2 => VMObject::Int(BigInt::from_signed_bytes_le(payload)),
            3 => VMObject::String(
                String::from_utf8(payload.to_vec()).map_err(|_| VmError::TypeMismatch {
                    expected: "utf8 string",
                    actual: "bytes",
                })?,
            ),
            4 => VMObject::Bytes(payload.to_vec()),
            5 => VMObject::Address(Address::from_slice(payload).map_err(|_| VmError::TypeMismatch {
                expected: "33-byte address",
                actual: "bytes",
            })?),
            other => {
                return Err(VmError::BoundsViolation(format!(
                    "unknown LOAD type tag {other}"
                )))
            }
        };
        self.current_frame_mut().set_register(dst, value)
    }

    fn exec_arithmetic(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let (lhs, rhs, dst) = (ins.reg(0), ins.reg(1), ins.reg(2));
        let a = self.current_frame().register(lhs)?.as_int()?;
        let b = self.current_frame().register(rhs)?.as_int()?;
        let result = match ins.opcode {
            OpCode::Add => a + b,
            OpCode::Sub => a - b,
            OpCode::Mul => a * b,
            OpCode::Div => {
                if b.is_zero() {
                    return Err(VmError::DivisionByZero);
                }
                a / b
            }
            OpCode::Mod => {
                if b.is_zero() {
                    return Err(VmError::DivisionByZero);
                }
                a % b
            }
            OpCode::Shl => a << shift_amount(&b)?,
            OpCode::Shr => a >> shift_amount(&b)?,
            OpCode::Min => a.clone().min(b),
            OpCode::Max => a.clone().max(b),
            _ => unreachable!("exec_arithmetic only dispatched for arithmetic opcodes"),
        };
        self.current_frame_mut().set_register(dst, VMObject::Int(result))
    }

    fn exec_incdec(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let reg = ins.reg(0);
        let value = self.current_frame().register(reg)?.as_int()?;
        let result = match ins.opcode {
            OpCode::Inc => value + 1,
            OpCode::Dec => value - 1,
            _ => unreachable!(),
        };
        self.current_frame_mut().set_register(reg, VMObject::Int(result))
    }

    fn exec_unary(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let (src, dst) = (ins.reg(0), ins.reg(1));
        let value = self.current_frame().register(src)?.clone();
        let result = match ins.opcode {
            OpCode::Negate => VMObject::Int(-value.as_int()?),
            OpCode::Abs => VMObject::Int(value.as_int()?.magnitude().clone().into()),
            OpCode::Sign => VMObject::Int(BigInt::from(value.sign()?)),
            OpCode::Not => VMObject::Bool(!value.as_bool()?),
            OpCode::Size => VMObject::Int(BigInt::from(value.size()?)),
            _ => unreachable!(),
        };
        self.current_frame_mut().set_register(dst, result)
    }

    fn exec_compare(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let (lhs, rhs, dst) = (ins.reg(0), ins.reg(1), ins.reg(2));
        let a = self.current_frame().register(lhs)?.clone();
        let b = self.current_frame().register(rhs)?.clone();
        let result = match ins.opcode {
            OpCode::And => VMObject::Bool(a.as_bool()? && b.as_bool()?),
            OpCode::Or => VMObject::Bool(a.as_bool()? || b.as_bool()?),
            OpCode::Xor => VMObject::Bool(a.as_bool()? ^ b.as_bool()?),
            OpCode::Equal => VMObject::Bool(a == b),
            OpCode::Lt => VMObject::Bool(a.as_int()? < b.as_int()?),
            OpCode::Lte => VMObject::Bool(a.as_int()? <= b.as_int()?),
            OpCode::Gt => VMObject::Bool(a.as_int()? > b.as_int()?),
            OpCode::Gte => VMObject::Bool(a.as_int()? >= b.as_int()?),
            _ => unreachable!(),
        };
        self.current_frame_mut().set_register(dst, result)
    }

    fn exec_cat(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let (lhs, rhs, dst) = (ins.reg(0), ins.reg(1), ins.reg(2));
        let mut a = self.current_frame().register(lhs)?.as_bytes()?;
        let b = self.current_frame().register(rhs)?.as_bytes()?;
        a.extend_from_slice(&b);
        self.current_frame_mut().set_register(dst, VMObject::Bytes(a))
    }

    fn exec_slice(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let (src, dst, len_reg) = (ins.reg(0), ins.reg(1), ins.operand[2]);
        let bytes = self.current_frame().register(src)?.as_bytes()?;
        let len = len_reg as usize;
        if len > bytes.len() {
            return Err(VmError::BoundsViolation(format!(
                "slice length {len} exceeds value length {}",
                bytes.len()
            )));
        }
        let sliced = match ins.opcode {
            OpCode::Left => bytes[..len].to_vec(),
            OpCode::Right => bytes[bytes.len() - len..].to_vec(),
            _ => unreachable!(),
        };
        self.current_frame_mut().set_register(dst, VMObject::Bytes(sliced))
    }

    fn exec_call(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let offset = i16::from_le_bytes([ins.operand[1], ins.operand[2]]) as i64;
        let target = ins.position as i64 + offset;
        let frame = self.current_frame_mut();
        let len = frame.script.len();
        if target < 0 || target as usize >= len {
            return Err(VmError::InvalidJumpTarget { target, len });
        }
        frame.return_stack.push(frame.ip);
        frame.ip = target as usize;
        Ok(())
    }

    fn exec_ret(&mut self) -> Result<(), VmError> {
        if let Some(addr) = self.current_frame_mut().return_stack.pop() {
            self.current_frame_mut().ip = addr;
            return Ok(());
        }
        if self.frames.len() > 1 {
            let result = self.current_frame().register(RESULT_REGISTER)?.clone();
            self.frames.pop();
            self.stack.push(result);
            return Ok(());
        }
        self.state = VMState::Halt;
        Ok(())
    }

    fn exec_switch(&mut self, ins: &Instruction, host: &mut dyn InteropHost) -> Result<(), VmError> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(VmError::CallStackOverflow);
        }
        let reg = ins.reg(0);
        let address = self.current_frame().register(reg)?.as_address()?;
        let argument = self.stack.pop()?;
        match host.switch_context(&address, argument)? {
            SwitchOutcome::EnterScript(script) => {
                self.frames.push(Frame::new(script, address));
            }
            SwitchOutcome::Returned(value) => {
                self.stack.push(value);
            }
        }
        Ok(())
    }

    fn exec_extcall(&mut self, host: &mut dyn InteropHost) -> Result<(), VmError> {
        let name = self.stack.pop()?.as_string()?;
        let mut args = match self.stack.pop()? {
            VMObject::Struct(fields) => fields,
            other => vec![other],
        };
        let result = host.invoke_interop(&name, &mut args)?;
        self.stack.push(result);
        Ok(())
    }

    fn exec_put(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let (map_reg, key_reg, value_reg) = (ins.reg(0), ins.reg(1), ins.reg(2));
        let index = self.current_frame().register(key_reg)?.as_i64()? as usize;
        let value = self.current_frame().register(value_reg)?.clone();
        let frame = self.current_frame_mut();
        match frame.register(map_reg)?.clone() {
            VMObject::Struct(mut fields) => {
                if index >= fields.len() {
                    fields.resize(index + 1, VMObject::Null);
                }
                fields[index] = value;
                frame.set_register(map_reg, VMObject::Struct(fields))
            }
            VMObject::Null => {
                let mut fields = vec![VMObject::Null; index + 1];
                fields[index] = value;
                frame.set_register(map_reg, VMObject::Struct(fields))
            }
            other => Err(VmError::TypeMismatch {
                expected: "struct",
                actual: other.type_name(),
            }),
        }
    }

    fn exec_get(&mut self, ins: &Instruction) -> Result<(), VmError> {
        let (map_reg, key_reg, dst_reg) = (ins.reg(0), ins.reg(1), ins.reg(2));
        let index = self.current_frame().register(key_reg)?.as_i64()? as usize;
        let value = self.current_frame().register(map_reg)?.get_field(index)?;
        self.current_frame_mut().set_register(dst_reg, value)
    }
}

fn shift_amount(value: &BigInt) -> Result<u32, VmError> {
    use num_traits::ToPrimitive;
    value.to_u32().ok_or_else(|| {
        VmError::BoundsViolation("shift amount does not fit in u32".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_core::Address;

    struct NoopHost;
    impl InteropHost for NoopHost {
        fn invoke_interop(&mut self, name: &str, _args: &mut Vec<VMObject>) -> Result<VMObject, VmError> {
            Err(VmError::UnknownInterop(name.to_string()))
        }
        fn switch_context(&mut self, _address: &Address, _argument: VMObject) -> Result<SwitchOutcome, VmError> {
            Err(VmError::UnresolvableContext)
        }
    }

    fn load_int(dst: u8, value: i64) -> Vec<u8> {
        let bytes = BigInt::from(value).to_signed_bytes_le();
        let mut script = vec![OpCode::Load as u8, dst, 2u8, bytes.len() as u8];
        script.extend_from_slice(&bytes);
        script
    }

    #[test]
    fn adds_two_loaded_registers_and_halts() {
        let mut script = load_int(0, 2);
        script.extend(load_int(1, 3));
        script.push(OpCode::Add as u8);
        script.extend_from_slice(&[0, 1, 2]);
        script.push(OpCode::Ret as u8);

        let addr = Address::for_contract("test").unwrap();
        let mut engine = ExecutionEngine::new(Rc::from(script.into_boxed_slice()), addr, 1_000_000);
        let mut host = NoopHost;
        let state = engine.run(&mut host);
        assert_eq!(state, VMState::Halt);
    }

    #[test]
    fn division_by_zero_faults() {
        let mut script = load_int(0, 1);
        script.extend(load_int(1, 0));
        script.push(OpCode::Div as u8);
        script.extend_from_slice(&[0, 1, 2]);

        let addr = Address::for_contract("test").unwrap();
        let mut engine = ExecutionEngine::new(Rc::from(script.into_boxed_slice()), addr, 1_000_000);
        let mut host = NoopHost;
        let state = engine.run(&mut host);
        assert!(state.is_fault());
    }

    #[test]
    fn out_of_gas_faults_before_completion() {
        let script = vec![OpCode::Nop as u8, OpCode::Nop as u8, OpCode::Ctx as u8, 0, 0];
        let addr = Address::for_contract("test").unwrap();
        let mut engine = ExecutionEngine::new(Rc::from(script.into_boxed_slice()), addr, 1);
        let mut host = NoopHost;
        let state = engine.run(&mut host);
        assert!(matches!(state, VMState::Fault(_)));
    }

    #[test]
    fn gas_metering_bypass_allows_unlimited_execution() {
        let script = vec![OpCode::Ctx as u8, 0, 0, OpCode::Ret as u8];
        let addr = Address::for_contract("test").unwrap();
        let mut engine = ExecutionEngine::new(Rc::from(script.into_boxed_slice()), addr, 0);
        engine.gas_metering_enabled = false;
        let mut host = NoopHost;
        let state = engine.run(&mut host);
        assert_eq!(state, VMState::Halt);
    }
}
