//! Bytecode compiler.
//!
//! Transforms a resolved syntax tree into bytecode that can be executed by
//! the VM.
//!
//! # Module Structure
//!
//! - `bytecode`: Opcodes, operands and instruction records
//! - `codegen`: Code generation from the syntax tree
//! - `disasm`: Text listings of flat programs

pub mod bytecode;
pub mod codegen;
pub mod disasm;

pub use bytecode::{Bytecode, Instruction, OpCode, Operand, Word};
pub use codegen::Compiler;
pub use disasm::{disassemble, disassemble_with_constants};
