//! Parser for the scripting language.
//!
//! Transforms a stream of tokens into an Abstract Syntax Tree (AST).
//! The whole program becomes the root [`Block`](crate::ast::Block).
//!
//! ## Grammar
//!
//! ```text
//! program    := statement* EOF
//! statement  := ';' | 'var' IDENT '=' expression ';'? | '{' statement* '}'
//! expression := additive (('==' | '!=') additive)*
//! additive   := term (('+' | '-') term)*
//! term       := primary (('*' | '/') primary)*
//! primary    := INTEGER | FLOAT | IDENT | '(' expression ')'
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use ignition_engine::parser::Parser;
//!
//! let mut parser = Parser::new("var x = 1 + 2;");
//! let program = parser.parse_program().expect("Should parse");
//! assert_eq!(program.body.len(), 1);
//! ```

mod parser;

pub use parser::Parser;
