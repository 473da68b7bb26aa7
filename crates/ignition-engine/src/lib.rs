// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # ignition-engine
//!
//! The compilation and execution core of a miniature scripting language.
//! Programs compile to a variable-length bytecode that borrows its opcode
//! names from V8's Ignition interpreter and runs on a stack machine.
//!
//! ## Overview
//!
//! A program goes through four phases:
//! - the [`parser`] builds a syntax tree whose root is a [`ast::Block`]
//! - the [`resolver`] assigns a slot to every variable, binds every
//!   identifier to its declaring context and hoists floating-point literals
//!   into the global constant pool
//! - the [`compiler`] emits variable-length bytecode
//! - the [`vm`] executes it on an operand stack, global slots and a stack
//!   of scope frames
//!
//! ## Quick Start
//!
//! ```rust
//! use ignition_engine::{Engine, Value};
//!
//! let mut engine = Engine::new();
//! engine.execute("var a = 5; var b = a * 2;")?;
//! assert_eq!(engine.get_value("a")?, &Value::Integer(5));
//! assert_eq!(engine.get_value("b")?, &Value::Float(10.0));
//! # Ok::<(), ignition_engine::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod runtime;
pub mod vm;

#[cfg(feature = "parallel")]
pub mod parallel;

use tracing::{debug, instrument};

// Re-exports for convenience
pub use config::EngineConfig;
pub use error::{CompileError, Error, ExecutionError, ResolutionError, Result, SyntaxError};
#[cfg(feature = "parallel")]
pub use parallel::ParallelExecutor;
pub use runtime::value::Value;

use ast::Block;
use compiler::{Bytecode, Compiler, Word};
use parser::Parser;
use resolver::{Resolver, ScopeTree};
use vm::VM;

/// The output of resolving and compiling one program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compilation {
    /// Contexts, slots and the constant pool
    pub scopes: ScopeTree,
    /// The compiled instructions
    pub bytecode: Bytecode,
}

impl Compilation {
    /// The flat program.
    pub fn words(&self) -> Vec<Word> {
        self.bytecode.encode()
    }

    /// A text listing of the program.
    pub fn disassemble(&self) -> String {
        compiler::disassemble_with_constants(&self.words(), self.scopes.constants())
    }
}

/// Parses, resolves and compiles `source`.
pub fn compile_source(source: &str, config: &EngineConfig) -> Result<Compilation> {
    let mut root = Parser::with_file(source, config.file_name.as_str()).parse_program()?;
    compile_tree(&mut root, config)
}

/// Resolves and compiles a prebuilt tree, annotating it in place.
pub fn compile_tree(root: &mut Block, config: &EngineConfig) -> Result<Compilation> {
    let scopes = Resolver::with_config(config).resolve(root)?;
    let bytecode = Compiler::new(&scopes).compile(root)?;
    Ok(Compilation { scopes, bytecode })
}

/// The main engine instance.
///
/// Each call to [`Engine::execute`] runs a complete, independent program;
/// afterwards its global variables can be queried by name.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    compilation: Compilation,
    vm: VM,
}

impl Engine {
    /// Creates a new engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates a new engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        let vm = VM::with_config(&config);
        Self {
            config,
            compilation: Compilation::default(),
            vm,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compiles and runs `source`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use ignition_engine::{Engine, Error};
    /// let mut engine = Engine::new();
    /// let err = engine.execute("var x = y;").unwrap_err();
    /// assert!(matches!(err, Error::Resolution(_)));
    /// ```
    #[instrument(skip_all, fields(file = %self.config.file_name))]
    pub fn execute(&mut self, source: &str) -> Result<()> {
        self.clear();
        let compilation = compile_source(source, &self.config)?;
        self.run(compilation)
    }

    /// Resolves, compiles and runs a prebuilt tree.
    #[instrument(skip_all)]
    pub fn execute_tree(&mut self, mut root: Block) -> Result<()> {
        self.clear();
        let compilation = compile_tree(&mut root, &self.config)?;
        self.run(compilation)
    }

    /// Forgets the previous program and its globals.
    fn clear(&mut self) {
        self.compilation = Compilation::default();
        self.vm = VM::with_config(&self.config);
    }

    fn run(&mut self, compilation: Compilation) -> Result<()> {
        self.compilation = compilation;
        let words = self.compilation.words();
        self.vm.run(&words, self.compilation.scopes.constants())?;

        debug!(globals = self.vm.globals().len(), "program finished");
        Ok(())
    }

    /// Returns the final value of a global variable.
    ///
    /// Fails with [`Error::VariableNotFound`] unless the last program
    /// declared `name` in its global context. A declared global that was
    /// never written reads as [`Value::Hole`].
    pub fn get_value(&self, name: &str) -> Result<&Value> {
        let slot = self
            .compilation
            .scopes
            .global_slot(name)
            .ok_or_else(|| Error::VariableNotFound(name.to_string()))?;
        Ok(self.vm.global(slot as usize))
    }

    /// Global variables with their values, in slot order.
    pub fn globals(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.compilation
            .scopes
            .global()
            .map(|global| global.variables())
            .unwrap_or_default()
            .into_iter()
            .map(move |(name, slot)| (name, self.vm.global(slot as usize)))
    }

    /// The last compiled program.
    pub fn compilation(&self) -> &Compilation {
        &self.compilation
    }

    /// A text listing of the last compiled program.
    pub fn disassemble(&self) -> String {
        self.compilation.disassemble()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new();
        assert_eq!(engine.config(), &EngineConfig::default());
        assert_eq!(engine.globals().count(), 0);
    }

    #[test]
    fn test_unknown_name_before_any_run() {
        let engine = Engine::new();
        assert!(matches!(
            engine.get_value("a"),
            Err(Error::VariableNotFound(name)) if name == "a"
        ));
    }

    #[test]
    fn test_globals_in_slot_order() {
        let mut engine = Engine::new();
        engine.execute("var z = 1; var a = 2; { var hidden = 3; }").unwrap();
        let globals: Vec<_> = engine
            .globals()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        assert_eq!(
            globals,
            vec![
                ("z".to_string(), Value::Integer(1)),
                ("a".to_string(), Value::Integer(2)),
            ]
        );
    }

    #[test]
    fn test_block_locals_are_not_exposed() {
        let mut engine = Engine::new();
        engine.execute("{ var inner = 1; }").unwrap();
        assert!(matches!(
            engine.get_value("inner"),
            Err(Error::VariableNotFound(_))
        ));
    }

    #[test]
    fn test_each_execute_is_independent() {
        let mut engine = Engine::new();
        engine.execute("var a = 1;").unwrap();
        engine.execute("var b = 2;").unwrap();
        assert!(engine.get_value("a").is_err());
        assert_eq!(engine.get_value("b").unwrap(), &Value::Integer(2));
    }

    #[test]
    fn test_failed_compile_discards_previous_program() {
        let mut engine = Engine::new();
        engine.execute("var a = 1;").unwrap();

        assert!(engine.execute("var a = y;").is_err());
        assert!(matches!(
            engine.get_value("a"),
            Err(Error::VariableNotFound(_))
        ));
        assert_eq!(engine.globals().count(), 0);
        assert!(engine.compilation().bytecode.is_empty());

        engine.execute("var b = 2;").unwrap();
        assert!(engine.execute("var c = 1 == 2;").is_err());
        assert!(engine.get_value("b").is_err());
    }

    #[test]
    fn test_failed_tree_discards_previous_program() {
        use ast::{Identifier, VarDecl};
        use lexer::SourceLocation;

        let mut engine = Engine::new();
        engine.execute("var a = 1;").unwrap();

        let location = SourceLocation::new("tree", 1, 1);
        let init = Identifier::new("missing", location.clone());
        let root = Block::new(vec![VarDecl::new("a", init.into(), location.clone()).into()], location);
        assert!(matches!(engine.execute_tree(root), Err(Error::Resolution(_))));
        assert!(engine.get_value("a").is_err());
    }

    #[test]
    fn test_file_name_flows_into_errors() {
        let config = EngineConfig {
            file_name: "main.js".to_string(),
            ..EngineConfig::default()
        };
        let mut engine = Engine::with_config(config);
        let err = engine.execute("var a = 1;\nvar b = c;").unwrap_err();
        assert_eq!(
            err.to_string(),
            "ResolutionError: undeclared identifier 'c' at main.js:2:9"
        );
    }

    #[test]
    fn test_disassemble() {
        let mut engine = Engine::new();
        engine.execute("var a = 1.5;").unwrap();
        assert_eq!(
            engine.disassemble(),
            "0000  LdaConstant 0 ; Float(1.5)\n0002  StaGlobal 0\n"
        );
    }
}
