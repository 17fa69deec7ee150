//! Renders a script as a human-readable instruction listing (SPEC_FULL §3
//! supplement, folded into the VM crate rather than split out on its own).

use crate::instruction::Instruction;
use crate::op_code::OpCode;
use std::fmt::Write as _;

/// Disassembles `script` into one line per instruction, starting each line
/// with the byte offset of the opcode.
pub fn disassemble(script: &[u8]) -> String {
    let mut out = String::new();
    let mut pos = 0;
    while pos < script.len() {
        match Instruction::decode(script, pos) {
            Ok(ins) => {
                let _ = writeln!(out, "{:06}: {}", ins.position, format_instruction(&ins));
                pos = ins.next_position;
            }
            Err(err) => {
                let _ = writeln!(out, "{pos:06}: <decode error: {err}>");
                break;
            }
        }
    }
    out
}

fn format_instruction(ins: &Instruction) -> String {
    match ins.opcode {
        OpCode::Load => format!(
            "LOAD r{} type={} payload={}",
            ins.operand[0],
            ins.operand[1],
            hex::encode(&ins.operand[2..])
        ),
        OpCode::Throw => format!("THROW {:?}", String::from_utf8_lossy(&ins.operand)),
        OpCode::Jmp | OpCode::JmpIf | OpCode::JmpNot => {
            format!("{:?} {:+}", ins.opcode, ins.i16_operand())
        }
        OpCode::Call => {
            let offset = i16::from_le_bytes([ins.operand[1], ins.operand[2]]);
            format!("CALL argc={} {:+}", ins.operand[0], offset)
        }
        OpCode::Nop | OpCode::Ret | OpCode::ExtCall => format!("{:?}", ins.opcode),
        _ => {
            let regs: Vec<String> = ins.operand.iter().map(|b| format!("r{b}")).collect();
            format!("{:?} {}", ins.opcode, regs.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op_code::OpCode;

    #[test]
    fn disassembles_a_short_script() {
        let script = [OpCode::Move as u8, 1, 2, OpCode::Ret as u8];
        let text = disassemble(&script);
        assert!(text.contains("Move"));
        assert!(text.contains("RET") || text.contains("Ret"));
    }

    #[test]
    fn stops_cleanly_on_truncated_tail() {
        let script = [OpCode::Move as u8, 1];
        let text = disassemble(&script);
        assert!(text.contains("decode error"));
    }
}
