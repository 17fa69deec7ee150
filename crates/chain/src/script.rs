//! Assembles the bytecode a transaction carries in its `script` field.
//!
//! spec.md §4.4 has every native contract method reached through
//! `SWITCH`, and §4.4's "Gas contract" brackets every transaction with
//! `AllowGas`/`SpendGas` calls — there is no separate transaction-level
//! hook for this, so the bracket has to be bytecode the transaction's own
//! script runs. [`ScriptBuilder`] is the assembler for that bytecode,
//! grounded on the teacher's `neo-vm::ScriptBuilder` (same emit/push
//! shape, narrowed to this VM's LOAD/PUT/SWITCH instruction set).

use num_bigint::BigInt;
use vela_core::Address;
use vela_vm::{OpCode, VMObject};

/// Scratch registers reserved by [`ScriptBuilder::call_native`]. Register 0
/// is `RESULT_REGISTER` and is left alone; callers needing their own
/// working registers should stay below 16.
const R_ADDR: u8 = 16;
const R_METHOD: u8 = 17;
const R_ARGS: u8 = 18;
const R_CALL: u8 = 19;
const R_IDX: u8 = 20;
const R_TMP: u8 = 21;

pub struct ScriptBuilder {
    code: Vec<u8>,
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self { code: Vec::new() }
    }

    fn emit_op(&mut self, op: OpCode) -> &mut Self {
        self.code.push(op as u8);
        self
    }

    /// Writes a LOAD payload-length header. All payloads this builder ever
    /// emits (struct indices, addresses, short strings) are well under the
    /// single-byte literal threshold used by the decoder's var-length
    /// convention.
    fn write_len(&mut self, len: usize) {
        assert!(len < 0xFD, "script builder payload too long for a literal length byte");
        self.code.push(len as u8);
    }

    pub fn load_null(&mut self, dst: u8) -> &mut Self {
        self.emit_op(OpCode::Load);
        self.code.push(dst);
        self.code.push(0);
        self.write_len(0);
        self
    }

    pub fn load_bool(&mut self, dst: u8, value: bool) -> &mut Self {
        self.emit_op(OpCode::Load);
        self.code.push(dst);
        self.code.push(1);
        self.write_len(1);
        self.code.push(value as u8);
        self
    }

    pub fn load_int(&mut self, dst: u8, value: &BigInt) -> &mut Self {
        let bytes = value.to_signed_bytes_le();
        self.emit_op(OpCode::Load);
        self.code.push(dst);
        self.code.push(2);
        self.write_len(bytes.len());
        self.code.extend_from_slice(&bytes);
        self
    }

    pub fn load_i64(&mut self, dst: u8, value: i64) -> &mut Self {
        self.load_int(dst, &BigInt::from(value))
    }

    pub fn load_string(&mut self, dst: u8, value: &str) -> &mut Self {
        let bytes = value.as_bytes();
        self.emit_op(OpCode::Load);
        self.code.push(dst);
        self.code.push(3);
        self.write_len(bytes.len());
        self.code.extend_from_slice(bytes);
        self
    }

    pub fn load_bytes(&mut self, dst: u8, value: &[u8]) -> &mut Self {
        self.emit_op(OpCode::Load);
        self.code.push(dst);
        self.code.push(4);
        self.write_len(value.len());
        self.code.extend_from_slice(value);
        self
    }

    pub fn load_address(&mut self, dst: u8, value: &Address) -> &mut Self {
        self.emit_op(OpCode::Load);
        self.code.push(dst);
        self.code.push(5);
        self.write_len(value.as_bytes().len());
        self.code.extend_from_slice(value.as_bytes());
        self
    }

    /// Loads whichever [`VMObject`] variant `value` holds into `dst`. Used
    /// for assembling call arguments without the caller needing to match
    /// on the variant itself.
    pub fn load_value(&mut self, dst: u8, value: &VMObject) -> &mut Self {
        match value {
            VMObject::Null => self.load_null(dst),
            VMObject::Bool(b) => self.load_bool(dst, *b),
            VMObject::Int(i) => self.load_int(dst, i),
            VMObject::String(s) => self.load_string(dst, s),
            VMObject::Bytes(b) => self.load_bytes(dst, b),
            VMObject::Address(a) => self.load_address(dst, a),
            VMObject::Struct(_) | VMObject::Context(_) => {
                panic!("script builder cannot load a struct or context literal")
            }
        }
    }

    pub fn push_reg(&mut self, reg: u8) -> &mut Self {
        self.emit_op(OpCode::Push);
        self.code.push(reg);
        self
    }

    pub fn pop_reg(&mut self, reg: u8) -> &mut Self {
        self.emit_op(OpCode::Pop);
        self.code.push(reg);
        self
    }

    pub fn put(&mut self, map_reg: u8, key_reg: u8, value_reg: u8) -> &mut Self {
        self.emit_op(OpCode::Put);
        self.code.extend_from_slice(&[map_reg, key_reg, value_reg]);
        self
    }

    pub fn switch(&mut self, addr_reg: u8) -> &mut Self {
        self.emit_op(OpCode::Switch);
        self.code.push(addr_reg);
        self
    }

    pub fn ret(&mut self) -> &mut Self {
        self.emit_op(OpCode::Ret)
    }

    /// Builds and executes a `SWITCH` into `address`'s native contract,
    /// calling `method` with `args`, leaving the returned value (or `Null`
    /// if the callee returned nothing it cared to push) in `result_reg`.
    ///
    /// `address`/`method`/`args` are loaded into reserved scratch registers
    /// (16-21); callers should not rely on those registers' contents
    /// surviving a `call_native`.
    pub fn call_native(&mut self, address: &Address, method: &str, args: &[VMObject], result_reg: u8) -> &mut Self {
        self.load_address(R_ADDR, address);
        self.load_null(R_ARGS);
        for (i, arg) in args.iter().enumerate() {
            self.load_value(R_TMP, arg);
            self.load_i64(R_IDX, i as i64);
            self.put(R_ARGS, R_IDX, R_TMP);
        }
        self.load_null(R_CALL);
        self.load_string(R_METHOD, method);
        self.load_i64(R_IDX, 0);
        self.put(R_CALL, R_IDX, R_METHOD);
        self.load_i64(R_IDX, 1);
        self.put(R_CALL, R_IDX, R_ARGS);
        self.push_reg(R_CALL);
        self.switch(R_ADDR);
        self.pop_reg(result_reg)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.code
    }
}

/// Builds a complete transaction script invoking a single native contract
/// method. The `AllowGas`/`SpendGas` bracket (spec.md §4.4) is not part of
/// this bytecode: `Gas.SpendGas` needs the VM engine's own metered
/// `used_gas` once the script has finished running, so `vela-chain`'s
/// transaction pipeline calls the gas contract directly around
/// `ExecutionEngine::run` rather than the script calling it on itself.
pub fn build_call_script(target_contract: &Address, method: &str, args: &[VMObject]) -> Vec<u8> {
    let mut b = ScriptBuilder::new();
    b.call_native(target_contract, method, args, 0);
    b.ret();
    b.into_bytes()
}
