//! Lexical analysis (tokenization) for source code.
//!
//! The lexer transforms source text into a stream of tokens that can be
//! consumed by the parser.
//!
//! ## Structure
//!
//! - `scanner.rs` - Main `Scanner` struct that produces tokens
//! - `token.rs` - `Token` and `TokenKind` definitions
//! - `location.rs` - `SourceLocation` and the byte-offset `LineIndex`
//!
//! ## Usage
//!
//! ```rust
//! use ignition_engine::lexer::{Scanner, TokenKind};
//!
//! let mut scanner = Scanner::new("var x = 42;");
//!
//! loop {
//!     let token = scanner.next_token();
//!     if matches!(token.kind, TokenKind::Eof) {
//!         break;
//!     }
//!     println!("{:?}", token.kind);
//! }
//! ```

mod location;
mod scanner;
mod token;

pub use location::{ANONYMOUS_FILE, LineIndex, SourceLocation};
pub use scanner::Scanner;
pub use token::{Span, Token, TokenKind};
