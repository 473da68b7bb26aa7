//! The main parser implementation.

use std::sync::Arc;

use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{ANONYMOUS_FILE, LineIndex, Scanner, SourceLocation, Span, Token, TokenKind};

/// A recursive descent parser.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    lines: LineIndex<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for anonymous source code.
    pub fn new(source: &'a str) -> Self {
        Self::with_file(source, ANONYMOUS_FILE)
    }

    /// Creates a new parser whose locations name `file`.
    pub fn with_file(source: &'a str, file: impl Into<Arc<str>>) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            scanner,
            lines: LineIndex::new(source, file),
            current,
        }
    }

    /// Parses the whole source into the root block.
    pub fn parse_program(&mut self) -> Result<Block, SyntaxError> {
        let location = self.location();
        let mut body = Vec::new();

        while !self.is_at_end() {
            if let Some(statement) = self.parse_statement()? {
                body.push(statement);
            }
        }

        Ok(Block::new(body, location))
    }

    /// Parses a single statement. Empty statements yield `None`.
    pub fn parse_statement(&mut self) -> Result<Option<Node>, SyntaxError> {
        match &self.current.kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(None)
            }
            TokenKind::Var => self.parse_variable_declaration().map(Some),
            TokenKind::LeftBrace => self.parse_block_statement().map(Some),
            kind if kind.starts_expression() => {
                Err(self.error("expression statements are not supported"))
            }
            kind => {
                let message = format!("unexpected token {:?}", kind);
                Err(self.error(message))
            }
        }
    }

    fn parse_variable_declaration(&mut self) -> Result<Node, SyntaxError> {
        let location = self.location();
        self.advance(); // consume 'var'

        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Equal)?;
        let init = self.parse_expression()?;

        // The terminating semicolon is optional.
        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }

        Ok(VarDecl::new(name, init, location).into())
    }

    fn parse_block_statement(&mut self) -> Result<Node, SyntaxError> {
        let location = self.location();
        self.advance(); // consume '{'
        let mut body = Vec::new();

        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.parse_statement()? {
                body.push(statement);
            }
        }

        self.expect(&TokenKind::RightBrace)?;

        Ok(Block::new(body, location).into())
    }

    /// Parses an expression.
    pub fn parse_expression(&mut self) -> Result<Node, SyntaxError> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_additive()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.parse_primary()?;

        loop {
            let operator = match &self.current.kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_primary()?;
            left = binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Node, SyntaxError> {
        let location = self.location();
        match &self.current.kind {
            TokenKind::Integer(n) => {
                let value = *n;
                self.advance();
                Ok(NumberLiteral::integer(value, location).into())
            }
            TokenKind::Float(n) => {
                let value = *n;
                self.advance();
                Ok(NumberLiteral::float(value, location).into())
            }
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(Identifier::new(name, location).into())
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            kind => {
                let message = format!("expected expression, found {:?}", kind);
                Err(self.error(message))
            }
        }
    }

    fn expect_identifier(&mut self) -> Result<String, SyntaxError> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            let message = format!("expected identifier, found {:?}", self.current.kind);
            Err(self.error(message))
        }
    }

    fn advance(&mut self) {
        self.current = self.scanner.next_token();
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), SyntaxError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            let message = format!("expected {:?}, found {:?}", kind, self.current.kind);
            Err(self.error(message))
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn location(&self) -> SourceLocation {
        self.locate(self.current.span)
    }

    fn locate(&self, span: Span) -> SourceLocation {
        self.lines.locate(span)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            location: self.location(),
        }
    }
}

fn binary(operator: BinaryOperator, left: Node, right: Node) -> Node {
    let location = left.location().clone();
    BinaryOp::new(operator, left, right, location).into()
}
