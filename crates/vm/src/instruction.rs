//! Instruction decoding: turns a byte stream into opcode + operand bytes,
//! following spec.md §4.1's per-opcode operand layouts and the var-length
//! integer convention (first byte `n`; `n < 0xFD` is a literal length,
//! `0xFD`/`0xFE`/`0xFF` prefix a little-endian u16/u32/u64).

use crate::error::{VmError, VmResult};
use crate::op_code::{OpCode, MAX_LOAD_PAYLOAD, MAX_THROW_PAYLOAD};

#[derive(Debug, Clone)]
pub struct Instruction {
    pub opcode: OpCode,
    pub operand: Vec<u8>,
    /// Position of the opcode byte itself within the script.
    pub position: usize,
    /// Position of the first byte after this instruction.
    pub next_position: usize,
}

fn read_var_len(script: &[u8], pos: usize) -> VmResult<(usize, usize)> {
    let n = *script
        .get(pos)
        .ok_or(VmError::TruncatedScript { position: pos })?;
    let (len, header): (u64, usize) = match n {
        0xfd => {
            let bytes = script
                .get(pos + 1..pos + 3)
                .ok_or(VmError::TruncatedScript { position: pos })?;
            (u16::from_le_bytes([bytes[0], bytes[1]]) as u64, 3)
        }
        0xfe => {
            let bytes = script
                .get(pos + 1..pos + 5)
                .ok_or(VmError::TruncatedScript { position: pos })?;
            (u32::from_le_bytes(bytes.try_into().unwrap()) as u64, 5)
        }
        0xff => {
            let bytes = script
                .get(pos + 1..pos + 9)
                .ok_or(VmError::TruncatedScript { position: pos })?;
            (u64::from_le_bytes(bytes.try_into().unwrap()), 9)
        }
        small => (small as u64, 1),
    };
    Ok((len as usize, header))
}

impl Instruction {
    /// Decodes the instruction starting at `position` in `script`.
    pub fn decode(script: &[u8], position: usize) -> VmResult<Self> {
        let opcode_byte = *script
            .get(position)
            .ok_or(VmError::TruncatedScript { position })?;
        let opcode = OpCode::try_from(opcode_byte)?;
        let operand_start = position + 1;

        let (operand, next_position) = match opcode {
            OpCode::Load => {
                let dst_reg = *script
                    .get(operand_start)
                    .ok_or(VmError::TruncatedScript { position })?;
                let type_byte = *script
                    .get(operand_start + 1)
                    .ok_or(VmError::TruncatedScript { position })?;
                let (len, header) = read_var_len(script, operand_start + 2)?;
                if len > MAX_LOAD_PAYLOAD {
                    return Err(VmError::PayloadTooLong {
                        length: len,
                        max: MAX_LOAD_PAYLOAD,
                    });
                }
                let payload_start = operand_start + 2 + header;
                let payload = script
                    .get(payload_start..payload_start + len)
                    .ok_or(VmError::TruncatedScript { position })?;
                let mut operand = Vec::with_capacity(2 + payload.len());
                operand.push(dst_reg);
                operand.push(type_byte);
                operand.extend_from_slice(payload);
                (operand, payload_start + len)
            }
            OpCode::Throw => {
                let (len, header) = read_var_len(script, operand_start)?;
                if len > MAX_THROW_PAYLOAD {
                    return Err(VmError::PayloadTooLong {
                        length: len,
                        max: MAX_THROW_PAYLOAD,
                    });
                }
                let payload_start = operand_start + header;
                let payload = script
                    .get(payload_start..payload_start + len)
                    .ok_or(VmError::TruncatedScript { position })?;
                (payload.to_vec(), payload_start + len)
            }
            OpCode::ExtCall | OpCode::Ret | OpCode::Nop => (Vec::new(), operand_start),
            _ => {
                let len = opcode.fixed_operand_len().unwrap_or(0);
                let operand = script
                    .get(operand_start..operand_start + len)
                    .ok_or(VmError::TruncatedScript { position })?;
                (operand.to_vec(), operand_start + len)
            }
        };

        Ok(Instruction {
            opcode,
            operand,
            position,
            next_position,
        })
    }

    pub fn reg(&self, index: usize) -> u8 {
        self.operand[index]
    }

    pub fn i16_operand(&self) -> i16 {
        i16::from_le_bytes([self.operand[0], self.operand[1]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_move_with_two_register_operands() {
        let script = [OpCode::Move as u8, 3, 7];
        let ins = Instruction::decode(&script, 0).unwrap();
        assert_eq!(ins.operand, vec![3, 7]);
        assert_eq!(ins.next_position, 3);
    }

    #[test]
    fn decodes_load_with_var_length_payload() {
        let dst_reg = 5u8;
        let mut script = vec![OpCode::Load as u8, dst_reg, 0u8 /* type=bool-ish */, 3];
        script.extend_from_slice(&[9, 9, 9]);
        let ins = Instruction::decode(&script, 0).unwrap();
        assert_eq!(ins.operand, vec![dst_reg, 0, 9, 9, 9]);
        assert_eq!(ins.next_position, script.len());
    }

    #[test]
    fn rejects_oversized_load_payload() {
        let mut script = vec![OpCode::Load as u8, 0u8, 0u8, 0xfe];
        script.extend_from_slice(&(MAX_LOAD_PAYLOAD as u32 + 1).to_le_bytes());
        assert!(Instruction::decode(&script, 0).is_err());
    }

    #[test]
    fn decodes_jmp_as_signed_offset() {
        let script = [OpCode::Jmp as u8, 0xfe, 0xff];
        let ins = Instruction::decode(&script, 0).unwrap();
        assert_eq!(ins.i16_operand(), -2);
    }
}
