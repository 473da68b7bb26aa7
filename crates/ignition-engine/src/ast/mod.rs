//! Abstract Syntax Tree (AST) definitions.
//!
//! The tree is built once by the parser (or by a host) and is then annotated
//! in place by the [`Resolver`](crate::resolver::Resolver): every node gets the
//! context it was resolved in, declarations get their slot, identifiers get a
//! [`Binding`] and floating-point literals get their constant-pool index.
//! Neither the resolver nor the compiler ever restructures the tree.

use std::fmt;

use crate::lexer::SourceLocation;
use crate::resolver::{Binding, ConstantIndex, ContextId, SlotIndex};

/// A syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `{ ... }` or the program root
    Block(Block),
    /// `var name = init`
    VarDecl(VarDecl),
    /// `left op right`
    BinaryOp(BinaryOp),
    /// A variable reference
    Identifier(Identifier),
    /// An integer or floating-point literal
    NumberLiteral(NumberLiteral),
}

impl Node {
    /// Returns the source location of this node.
    pub fn location(&self) -> &SourceLocation {
        match self {
            Node::Block(node) => &node.location,
            Node::VarDecl(node) => &node.location,
            Node::BinaryOp(node) => &node.location,
            Node::Identifier(node) => &node.location,
            Node::NumberLiteral(node) => &node.location,
        }
    }

    /// Returns the context this node was resolved in, if resolved.
    pub fn context(&self) -> Option<ContextId> {
        match self {
            Node::Block(node) => node.context,
            Node::VarDecl(node) => node.context,
            Node::BinaryOp(node) => node.context,
            Node::Identifier(node) => node.context,
            Node::NumberLiteral(node) => node.context,
        }
    }

    /// A short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Block(_) => "block",
            Node::VarDecl(_) => "variable declaration",
            Node::BinaryOp(_) => "binary operation",
            Node::Identifier(_) => "identifier",
            Node::NumberLiteral(_) => "number literal",
        }
    }
}

/// A block of statements. The program root is a block too.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// The statements in the block
    pub body: Vec<Node>,
    /// Where the block starts
    pub location: SourceLocation,
    /// The context this block owns (set by the resolver)
    pub context: Option<ContextId>,
}

impl Block {
    /// Creates an unresolved block.
    pub fn new(body: Vec<Node>, location: SourceLocation) -> Self {
        Self {
            body,
            location,
            context: None,
        }
    }
}

/// A variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    /// The declared name
    pub name: String,
    /// The initializer expression
    pub init: Box<Node>,
    /// Where the declaration starts
    pub location: SourceLocation,
    /// The declaring context (set by the resolver)
    pub context: Option<ContextId>,
    /// The slot assigned in the declaring context (set by the resolver)
    pub slot: Option<SlotIndex>,
}

impl VarDecl {
    /// Creates an unresolved declaration.
    pub fn new(name: impl Into<String>, init: Node, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            init: Box::new(init),
            location,
            context: None,
            slot: None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// ==
    Equal,
    /// !=
    NotEqual,
}

impl BinaryOperator {
    /// The operator as written in source.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A binary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    /// The operator
    pub operator: BinaryOperator,
    /// Left operand
    pub left: Box<Node>,
    /// Right operand
    pub right: Box<Node>,
    /// Location of the left operand
    pub location: SourceLocation,
    /// Set by the resolver
    pub context: Option<ContextId>,
}

impl BinaryOp {
    /// Creates an unresolved binary operation.
    pub fn new(operator: BinaryOperator, left: Node, right: Node, location: SourceLocation) -> Self {
        Self {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            location,
            context: None,
        }
    }
}

/// A reference to a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    /// The referenced name
    pub name: String,
    /// Where the reference appears
    pub location: SourceLocation,
    /// Set by the resolver
    pub context: Option<ContextId>,
    /// Where the referenced slot lives (set by the resolver)
    pub binding: Option<Binding>,
}

impl Identifier {
    /// Creates an unresolved identifier.
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            location,
            context: None,
            binding: None,
        }
    }
}

/// The value of a numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
}

/// A numeric literal.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    /// The literal value
    pub value: Number,
    /// Where the literal appears
    pub location: SourceLocation,
    /// Set by the resolver
    pub context: Option<ContextId>,
    /// Constant-pool index, for literals that live in the pool
    pub constant: Option<ConstantIndex>,
}

impl NumberLiteral {
    /// Creates an integer literal.
    pub fn integer(value: i64, location: SourceLocation) -> Self {
        Self::new(Number::Integer(value), location)
    }

    /// Creates a floating-point literal.
    pub fn float(value: f64, location: SourceLocation) -> Self {
        Self::new(Number::Float(value), location)
    }

    fn new(value: Number, location: SourceLocation) -> Self {
        Self {
            value,
            location,
            context: None,
            constant: None,
        }
    }
}

impl From<Block> for Node {
    fn from(node: Block) -> Self {
        Node::Block(node)
    }
}

impl From<VarDecl> for Node {
    fn from(node: VarDecl) -> Self {
        Node::VarDecl(node)
    }
}

impl From<BinaryOp> for Node {
    fn from(node: BinaryOp) -> Self {
        Node::BinaryOp(node)
    }
}

impl From<Identifier> for Node {
    fn from(node: Identifier) -> Self {
        Node::Identifier(node)
    }
}

impl From<NumberLiteral> for Node {
    fn from(node: NumberLiteral) -> Self {
        Node::NumberLiteral(node)
    }
}
