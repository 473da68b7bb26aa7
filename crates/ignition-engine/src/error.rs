//! Error types for every phase of the pipeline.

use thiserror::Error;

use crate::compiler::{OpCode, Word};
use crate::lexer::SourceLocation;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Malformed source text.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("SyntaxError: {message} at {location}")]
pub struct SyntaxError {
    /// What went wrong
    pub message: String,
    /// Where it went wrong
    pub location: SourceLocation,
}

/// Errors raised while resolving scopes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    /// No enclosing context declares the name
    #[error("ResolutionError: undeclared identifier '{name}' at {location}")]
    UndeclaredIdentifier {
        /// The undeclared name
        name: String,
        /// Where it was referenced
        location: SourceLocation,
    },
}

/// Errors raised while emitting bytecode.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// An operator that has no instruction
    #[error("CompileError: operator '{operator}' is not supported at {location}")]
    UnsupportedOperator {
        /// The operator symbol
        operator: &'static str,
        /// Location of the operation
        location: SourceLocation,
    },

    /// A statement where an expression belongs, or the other way round
    #[error("CompileError: unexpected {kind} at {location}")]
    UnexpectedNode {
        /// The node kind
        kind: &'static str,
        /// Location of the node
        location: SourceLocation,
    },

    /// A node reached the compiler without resolver annotations
    #[error("CompileError: unresolved {kind} at {location}")]
    Unresolved {
        /// The node kind
        kind: &'static str,
        /// Location of the node
        location: SourceLocation,
    },
}

/// Fatal errors raised by the virtual machine.
///
/// `position` is always the index of the offending opcode word.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The word is not a known opcode
    #[error("ExecutionError: unknown opcode {code} at {position}")]
    UnknownOpcode {
        /// The raw word
        code: Word,
        /// Instruction pointer
        position: usize,
    },

    /// The opcode is reserved but has no implementation
    #[error("ExecutionError: opcode {opcode:?} is not implemented (at {position})")]
    Unimplemented {
        /// The reserved opcode
        opcode: OpCode,
        /// Instruction pointer
        position: usize,
    },

    /// The program ended in the middle of an instruction's operands
    #[error("ExecutionError: truncated {opcode:?} instruction at {position}")]
    TruncatedInstruction {
        /// The incomplete opcode
        opcode: OpCode,
        /// Instruction pointer
        position: usize,
    },

    /// Arithmetic on a hole or a string
    #[error("ExecutionError: arithmetic on non-numeric {kind} value at {position}")]
    NonNumericOperand {
        /// Kind of the offending value
        kind: &'static str,
        /// Instruction pointer
        position: usize,
    },

    /// An instruction popped an empty operand stack
    #[error("ExecutionError: operand stack underflow at {position}")]
    StackUnderflow {
        /// Instruction pointer
        position: usize,
    },

    /// A context-slot access or `PopContext` with no scope frame
    #[error("ExecutionError: no scope frame at depth {depth} (at {position})")]
    NoScopeFrame {
        /// Requested frame depth
        depth: Word,
        /// Instruction pointer
        position: usize,
    },

    /// A constant index outside the pool
    #[error("ExecutionError: constant index {index} out of range at {position}")]
    ConstantOutOfRange {
        /// The offending operand
        index: Word,
        /// Instruction pointer
        position: usize,
    },

    /// A negative slot operand, or one past the slot limit
    #[error("ExecutionError: slot {index} out of range at {position}")]
    SlotOutOfRange {
        /// The offending operand
        index: Word,
        /// Instruction pointer
        position: usize,
    },

    /// The operand stack grew beyond the configured limit
    #[error("ExecutionError: operand stack overflow (limit {limit}) at {position}")]
    StackOverflow {
        /// Configured maximum
        limit: usize,
        /// Instruction pointer
        position: usize,
    },
}

/// Any error the engine can produce.
#[derive(Error, Debug)]
pub enum Error {
    /// Parsing failed
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Scope resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Bytecode emission failed
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Execution failed
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The host asked for a name the global context never declared
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// Reading a source or configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// A dedicated thread pool could not be started
    #[cfg(feature = "parallel")]
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = ResolutionError::UndeclaredIdentifier {
            name: "y".to_string(),
            location: SourceLocation::new("main.js", 1, 9),
        };
        assert_eq!(
            err.to_string(),
            "ResolutionError: undeclared identifier 'y' at main.js:1:9"
        );

        let err = ExecutionError::UnknownOpcode {
            code: 9999,
            position: 4,
        };
        assert_eq!(err.to_string(), "ExecutionError: unknown opcode 9999 at 4");
    }

    #[test]
    fn test_wrapping_is_transparent() {
        let inner = ExecutionError::StackUnderflow { position: 2 };
        let err: Error = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
        assert!(matches!(err, Error::Execution(_)));
    }

    #[test]
    fn test_variable_not_found() {
        let err = Error::VariableNotFound("zzz".to_string());
        assert_eq!(err.to_string(), "variable not found: zzz");
    }
}
