//! Code generation from the resolved syntax tree to bytecode.
//!
//! The walk mirrors the resolver's: statements leave the operand stack as
//! they found it, expressions push exactly one value. Nothing is looked up
//! by name here; slots, depths and constant indices all come from the
//! annotations the resolver left on the tree.


use tracing::{debug, instrument};

use crate::ast::*;
use crate::compiler::bytecode::{Bytecode, Instruction, OpCode, Operand};
use crate::error::CompileError;
use crate::lexer::SourceLocation;
use crate::resolver::{BindingScope, ContextId, ScopeTree};

/// Compiles a resolved syntax tree to bytecode.
pub struct Compiler<'a> {
    /// The bytecode being generated
    pub bytecode: Bytecode,
    scopes: &'a ScopeTree,
}

impl<'a> Compiler<'a> {
    /// Creates a compiler for a tree resolved into `scopes`.
    pub fn new(scopes: &'a ScopeTree) -> Self {
        Self {
            bytecode: Bytecode::new(),
            scopes,
        }
    }

    /// Compiles the root block.
    #[instrument(skip_all)]
    pub fn compile(&mut self, root: &Block) -> Result<Bytecode, CompileError> {
        self.compile_block(root)?;

        let bytecode = std::mem::take(&mut self.bytecode);
        debug!(
            instructions = bytecode.len(),
            words = bytecode.instructions.iter().map(Instruction::width).sum::<usize>(),
            "compiled program"
        );
        Ok(bytecode)
    }

    fn emit(&mut self, instruction: Instruction) {
        self.bytecode.emit(instruction);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn compile_statement(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::Block(block) => self.compile_block(block),
            Node::VarDecl(decl) => self.compile_var_decl(decl),
            Node::BinaryOp(_) | Node::Identifier(_) | Node::NumberLiteral(_) => {
                Err(CompileError::UnexpectedNode {
                    kind: node.kind_name(),
                    location: node.location().clone(),
                })
            }
        }
    }

    fn compile_block(&mut self, block: &Block) -> Result<(), CompileError> {
        let context = block
            .context
            .ok_or_else(|| unresolved("block", &block.location))?;
        let is_global = self.is_global(context, &block.location)?;

        if !is_global {
            self.emit(Instruction::simple(OpCode::PushContext));
        }
        for statement in &block.body {
            self.compile_statement(statement)?;
        }
        if !is_global {
            self.emit(Instruction::simple(OpCode::PopContext));
        }
        Ok(())
    }

    fn compile_var_decl(&mut self, decl: &VarDecl) -> Result<(), CompileError> {
        let (context, slot) = match (decl.context, decl.slot) {
            (Some(context), Some(slot)) => (context, slot),
            _ => return Err(unresolved("variable declaration", &decl.location)),
        };

        self.compile_expression(&decl.init)?;

        // A declaration always lives in the innermost frame.
        let opcode = if self.is_global(context, &decl.location)? {
            OpCode::StaGlobal
        } else {
            OpCode::StaCurrentContextSlot
        };
        self.emit(Instruction::with_operand(opcode, Operand::Slot(slot)));
        Ok(())
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn compile_expression(&mut self, node: &Node) -> Result<(), CompileError> {
        match node {
            Node::BinaryOp(bin) => self.compile_binary(bin),
            Node::Identifier(ident) => self.compile_identifier(ident),
            Node::NumberLiteral(lit) => self.compile_number(lit),
            Node::Block(_) | Node::VarDecl(_) => Err(CompileError::UnexpectedNode {
                kind: node.kind_name(),
                location: node.location().clone(),
            }),
        }
    }

    fn compile_binary(&mut self, bin: &BinaryOp) -> Result<(), CompileError> {
        let opcode = match bin.operator {
            BinaryOperator::Add => OpCode::Add,
            BinaryOperator::Subtract => OpCode::Sub,
            BinaryOperator::Multiply => OpCode::Mul,
            BinaryOperator::Divide => OpCode::Div,
            BinaryOperator::Equal | BinaryOperator::NotEqual => {
                return Err(CompileError::UnsupportedOperator {
                    operator: bin.operator.symbol(),
                    location: bin.location.clone(),
                });
            }
        };

        self.compile_expression(&bin.left)?;
        self.compile_expression(&bin.right)?;
        self.emit(Instruction::simple(opcode));
        Ok(())
    }

    fn compile_identifier(&mut self, ident: &Identifier) -> Result<(), CompileError> {
        let binding = ident
            .binding
            .ok_or_else(|| unresolved("identifier", &ident.location))?;
        let slot = Operand::Slot(binding.slot);

        let instruction = match binding.scope {
            BindingScope::Global => Instruction::with_operand(OpCode::LdaGlobal, slot),
            BindingScope::Context { depth: 0 } => {
                Instruction::with_operand(OpCode::LdaCurrentContextSlot, slot)
            }
            BindingScope::Context { depth } => {
                Instruction::with_operands(OpCode::LdaContextSlot, [slot, Operand::Depth(depth)])
            }
        };
        self.emit(instruction);
        Ok(())
    }

    fn compile_number(&mut self, lit: &NumberLiteral) -> Result<(), CompileError> {
        let instruction = match (lit.value, lit.constant) {
            (Number::Integer(n), _) if i32::try_from(n).is_ok() => {
                Instruction::with_operand(OpCode::LdaSmi, Operand::Immediate(n as i32))
            }
            (_, Some(index)) => Instruction::with_operand(OpCode::LdaConstant, Operand::Constant(index)),
            (_, None) => return Err(unresolved("number literal", &lit.location)),
        };
        self.emit(instruction);
        Ok(())
    }

    fn is_global(&self, context: ContextId, location: &SourceLocation) -> Result<bool, CompileError> {
        self.scopes
            .find(context)
            .map(|context| context.is_global())
            .ok_or_else(|| unresolved("context", location))
    }
}

fn unresolved(kind: &'static str, location: &SourceLocation) -> CompileError {
    CompileError::Unresolved {
        kind,
        location: location.clone(),
    }
}
