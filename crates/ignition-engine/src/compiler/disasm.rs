//! Human-readable listings of flat bytecode.

use std::fmt::Write;

use crate::compiler::bytecode::{OpCode, Word};
use crate::resolver::Constant;

/// Lists `words` one instruction per line, e.g. `0003  LdaGlobal 0`.
///
/// Never fails: unknown words print as `<unknown N>` and an instruction
/// cut short by the end of the program prints as `<truncated>`.
pub fn disassemble(words: &[Word]) -> String {
    disassemble_with_constants(words, &[])
}

/// Like [`disassemble`], annotating `LdaConstant` with the pool value.
pub fn disassemble_with_constants(words: &[Word], constants: &[Constant]) -> String {
    let mut out = String::new();
    let mut pc = 0usize;

    while pc < words.len() {
        let word = words[pc];
        let Some(op) = OpCode::from_word(word) else {
            let _ = writeln!(out, "{pc:04}  <unknown {word}>");
            pc += 1;
            continue;
        };

        let end = pc + 1 + op.operand_count();
        let Some(operands) = words.get(pc + 1..end) else {
            let _ = writeln!(out, "{pc:04}  {op:?} <truncated>");
            break;
        };

        let _ = write!(out, "{pc:04}  {op:?}");
        for operand in operands {
            let _ = write!(out, " {operand}");
        }
        if op == OpCode::LdaConstant {
            let value = usize::try_from(operands[0])
                .ok()
                .and_then(|index| constants.get(index));
            if let Some(constant) = value {
                let _ = write!(out, " ; {:?}", constant.value);
            }
        }
        out.push('\n');
        pc = end;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ConstantValue;

    #[test]
    fn test_listing() {
        let words = vec![
            OpCode::LdaSmi.word(),
            5,
            OpCode::StaGlobal.word(),
            0,
            OpCode::LdaContextSlot.word(),
            1,
            2,
        ];
        assert_eq!(
            disassemble(&words),
            "0000  LdaSmi 5\n0002  StaGlobal 0\n0004  LdaContextSlot 1 2\n"
        );
    }

    #[test]
    fn test_unknown_and_truncated() {
        let words = vec![9999, OpCode::Add.word(), OpCode::LdaGlobal.word()];
        assert_eq!(
            disassemble(&words),
            "0000  <unknown 9999>\n0001  Add\n0002  LdaGlobal <truncated>\n"
        );
    }

    #[test]
    fn test_constant_annotation() {
        let words = vec![OpCode::LdaConstant.word(), 0];
        let constants = [Constant {
            index: 0,
            value: ConstantValue::Float(5.7),
        }];
        assert_eq!(
            disassemble_with_constants(&words, &constants),
            "0000  LdaConstant 0 ; Float(5.7)\n"
        );
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(disassemble(&[]), "");
    }
}
