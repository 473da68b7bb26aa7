//! Bytecode definitions.
//!
//! Instructions are built as typed [`Instruction`] records and only
//! flattened into raw [`Word`]s by [`Bytecode::encode`]. A flat program is
//! an opcode word followed by exactly [`OpCode::operand_count`] operand
//! words, repeated until the end of the sequence.

use std::fmt;

use crate::resolver::{ConstantIndex, SlotIndex};

/// One machine word of a flat bytecode program.
pub type Word = i64;

/// A compiled program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    /// The instructions
    pub instructions: Vec<Instruction>,
}

impl Bytecode {
    /// Creates a new empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instruction and returns its index.
    pub fn emit(&mut self, instruction: Instruction) -> usize {
        debug_assert_eq!(
            instruction.operands.len(),
            instruction.opcode.operand_count(),
            "wrong operand count for {:?}",
            instruction.opcode
        );
        let index = self.instructions.len();
        self.instructions.push(instruction);
        index
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if nothing was emitted.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Flattens the program into words.
    pub fn encode(&self) -> Vec<Word> {
        let size = self.instructions.iter().map(Instruction::width).sum();
        let mut words = Vec::with_capacity(size);
        for instruction in &self.instructions {
            words.push(instruction.opcode.word());
            words.extend(instruction.operands.iter().map(|operand| operand.word()));
        }
        words
    }
}

/// A single bytecode instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The operation code
    pub opcode: OpCode,
    /// Operands, in encoding order
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Creates a new instruction with no operand.
    pub fn simple(opcode: OpCode) -> Self {
        Self {
            opcode,
            operands: Vec::new(),
        }
    }

    /// Creates a new instruction with one operand.
    pub fn with_operand(opcode: OpCode, operand: Operand) -> Self {
        Self {
            opcode,
            operands: vec![operand],
        }
    }

    /// Creates a new instruction with several operands.
    pub fn with_operands(opcode: OpCode, operands: impl Into<Vec<Operand>>) -> Self {
        Self {
            opcode,
            operands: operands.into(),
        }
    }

    /// Encoded size in words.
    pub fn width(&self) -> usize {
        1 + self.operands.len()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.opcode)?;
        for operand in &self.operands {
            write!(f, " {}", operand.word())?;
        }
        Ok(())
    }
}

/// Instruction operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// Small integer carried inline
    Immediate(i32),
    /// Constant pool index
    Constant(ConstantIndex),
    /// Slot index in a global array or scope frame
    Slot(SlotIndex),
    /// Number of scope frames to skip
    Depth(u32),
}

impl Operand {
    /// The operand as a machine word.
    pub fn word(self) -> Word {
        match self {
            Operand::Immediate(n) => Word::from(n),
            Operand::Constant(index) => Word::from(index),
            Operand::Slot(slot) => Word::from(slot),
            Operand::Depth(depth) => Word::from(depth),
        }
    }
}

/// Operation codes, numbered in declaration order.
///
/// Only a small subset is executable (see [`OpCode::is_implemented`]). The
/// rest are reserved so the numbering stays stable as the language grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum OpCode {
    /// Placeholder for word 0; never emitted
    None = 0,

    // Operand width prefixes
    Wide,
    ExtraWide,

    // Debug breaks
    DebugBreakWide,
    DebugBreakExtraWide,
    DebugBreak0,
    DebugBreak1,
    DebugBreak2,
    DebugBreak3,
    DebugBreak4,
    DebugBreak5,
    DebugBreak6,

    // Accumulator and register loads
    Ldar,
    LdaZero,
    /// Push the inline small integer operand
    LdaSmi,
    LdaUndefined,
    LdaNull,
    LdaTheHole,
    LdaTrue,
    LdaFalse,
    /// Push the constant-pool entry named by the operand
    LdaConstant,
    /// Push a slot of the scope frame `depth` frames below the top
    LdaContextSlot,
    LdaImmutableContextSlot,
    /// Push a slot of the innermost scope frame
    LdaCurrentContextSlot,
    LdaImmutableCurrentContextSlot,
    Star,
    Mov,
    /// Enter a new, empty scope frame
    PushContext,
    /// Discard the innermost scope frame
    PopContext,
    TestReferenceEqual,
    TestUndetectable,
    TestNull,
    TestUndefined,
    TestTypeOf,

    // Globals
    /// Push a global slot
    LdaGlobal,
    LdaGlobalInsideTypeof,
    /// Pop into a global slot
    StaGlobal,

    // Context operations
    StaContextSlot,
    /// Pop into a slot of the innermost scope frame
    StaCurrentContextSlot,
    StaScriptContextSlot,
    StaCurrentScriptContextSlot,

    // Lookup slots
    LdaLookupSlot,
    LdaLookupContextSlot,
    LdaLookupGlobalSlot,
    LdaLookupSlotInsideTypeof,
    LdaLookupContextSlotInsideTypeof,
    LdaLookupGlobalSlotInsideTypeof,
    StaLookupSlot,

    // Property loads
    GetNamedProperty,
    GetNamedPropertyFromSuper,
    GetKeyedProperty,
    GetEnumeratedKeyedProperty,

    // Operations on module variables
    LdaModuleVariable,
    StaModuleVariable,

    // Property stores
    SetNamedProperty,
    DefineNamedOwnProperty,
    SetKeyedProperty,
    DefineKeyedOwnProperty,
    StaInArrayLiteral,
    DefineKeyedOwnPropertyInLiteral,

    // Binary operators
    /// Pop two numbers, push their sum
    Add,
    /// Pop two numbers, push their difference
    Sub,
    /// Pop two numbers, push their product
    Mul,
    /// Pop two numbers, push their quotient
    Div,
    Mod,
    Exp,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    ShiftLeft,
    ShiftRight,
    ShiftRightLogical,

    // Binary operators with immediate operands
    AddSmi,
    SubSmi,
    MulSmi,
    DivSmi,
    ModSmi,
    ExpSmi,
    BitwiseOrSmi,
    BitwiseXorSmi,
    BitwiseAndSmi,
    ShiftLeftSmi,
    ShiftRightSmi,
    ShiftRightLogicalSmi,

    // Unary operators
    Inc,
    Dec,
    Negate,
    BitwiseNot,
    ToBooleanLogicalNot,
    LogicalNot,
    TypeOf,
    DeletePropertyStrict,
    DeletePropertySloppy,

    // Super constructor
    GetSuperConstructor,
    FindNonDefaultConstructorOrConstruct,

    // Call operations
    CallAnyReceiver,
    CallProperty,
    CallProperty0,
    CallProperty1,
    CallProperty2,
    CallUndefinedReceiver,
    CallUndefinedReceiver0,
    CallUndefinedReceiver1,
    CallUndefinedReceiver2,
    CallWithSpread,
    CallRuntime,
    CallRuntimeForPair,
    CallJSRuntime,

    // Intrinsics
    InvokeIntrinsic,

    // Construct operators
    Construct,
    ConstructWithSpread,
    ConstructForwardAllArgs,

    // Comparisons
    TestEqual,
    TestEqualStrict,
    TestLessThan,
    TestGreaterThan,
    TestLessThanOrEqual,
    TestGreaterThanOrEqual,
    TestInstanceOf,
    TestIn,

    // Cast operators
    ToName,
    ToNumber,
    ToNumeric,
    ToObject,
    ToString,
    ToBoolean,

    // Literals
    CreateRegExpLiteral,
    CreateArrayLiteral,
    CreateArrayFromIterable,
    CreateEmptyArrayLiteral,
    CreateObjectLiteral,
    CreateEmptyObjectLiteral,
    CloneObject,

    // Tagged templates
    GetTemplateObject,

    // Closure allocation
    CreateClosure,

    // Context allocation
    CreateBlockContext,
    CreateCatchContext,
    CreateFunctionContext,
    CreateEvalContext,
    CreateWithContext,

    // Arguments allocation
    CreateMappedArguments,
    CreateUnmappedArguments,
    CreateRestParameter,

    // Control flow
    JumpLoop,
    Jump,
    JumpConstant,
    JumpIfNullConstant,
    JumpIfNotNullConstant,
    JumpIfUndefinedConstant,
    JumpIfUndefinedOrNullConstant,
    JumpIfTrueConstant,
    JumpIfFalseConstant,
    JumpIfJSReceiverConstant,
    JumpIfForInDoneConstant,
    JumpIfToBooleanTrueConstant,
    JumpIfToBooleanFalseConstant,
    JumpIfToBooleanTrue,
    JumpIfToBooleanFalse,
    JumpIfTrue,
    JumpIfFalse,
    JumpIfNull,
    JumpIfNotNull,
    JumpIfUndefined,
    JumpIfNotUndefined,
    JumpIfUndefinedOrNull,
    JumpIfJSReceiver,
    JumpIfForInDone,

    // Switch
    SwitchOnSmiNoFeedback,

    // For-in
    ForInEnumerate,
    ForInPrepare,
    ForInNext,
    ForInStep,

    // Pending message
    SetPendingMessage,

    // Non-local flow control
    Throw,
    ReThrow,
    Return,
    ThrowReferenceErrorIfHole,
    ThrowSuperNotCalledIfHole,
    ThrowSuperAlreadyCalledIfNotHole,
    ThrowIfNotSuperConstructor,

    // Generators
    SwitchOnGeneratorState,
    SuspendGenerator,
    ResumeGenerator,

    // Iterator protocol operations
    GetIterator,

    // Debugger
    Debugger,

    // Block coverage
    IncBlockCounter,

    // Internal abort
    Abort,
}

/// Every opcode, indexed by its numeric value.
const ALL_OPCODES: [OpCode; OpCode::COUNT] = [
    OpCode::None, OpCode::Wide, OpCode::ExtraWide, OpCode::DebugBreakWide,
    OpCode::DebugBreakExtraWide, OpCode::DebugBreak0, OpCode::DebugBreak1, OpCode::DebugBreak2,
    OpCode::DebugBreak3, OpCode::DebugBreak4, OpCode::DebugBreak5, OpCode::DebugBreak6,
    OpCode::Ldar, OpCode::LdaZero, OpCode::LdaSmi, OpCode::LdaUndefined, OpCode::LdaNull,
    OpCode::LdaTheHole, OpCode::LdaTrue, OpCode::LdaFalse, OpCode::LdaConstant,
    OpCode::LdaContextSlot, OpCode::LdaImmutableContextSlot, OpCode::LdaCurrentContextSlot,
    OpCode::LdaImmutableCurrentContextSlot, OpCode::Star, OpCode::Mov, OpCode::PushContext,
    OpCode::PopContext, OpCode::TestReferenceEqual, OpCode::TestUndetectable, OpCode::TestNull,
    OpCode::TestUndefined, OpCode::TestTypeOf, OpCode::LdaGlobal, OpCode::LdaGlobalInsideTypeof,
    OpCode::StaGlobal, OpCode::StaContextSlot, OpCode::StaCurrentContextSlot,
    OpCode::StaScriptContextSlot, OpCode::StaCurrentScriptContextSlot, OpCode::LdaLookupSlot,
    OpCode::LdaLookupContextSlot, OpCode::LdaLookupGlobalSlot, OpCode::LdaLookupSlotInsideTypeof,
    OpCode::LdaLookupContextSlotInsideTypeof, OpCode::LdaLookupGlobalSlotInsideTypeof,
    OpCode::StaLookupSlot, OpCode::GetNamedProperty, OpCode::GetNamedPropertyFromSuper,
    OpCode::GetKeyedProperty, OpCode::GetEnumeratedKeyedProperty, OpCode::LdaModuleVariable,
    OpCode::StaModuleVariable, OpCode::SetNamedProperty, OpCode::DefineNamedOwnProperty,
    OpCode::SetKeyedProperty, OpCode::DefineKeyedOwnProperty, OpCode::StaInArrayLiteral,
    OpCode::DefineKeyedOwnPropertyInLiteral, OpCode::Add, OpCode::Sub, OpCode::Mul, OpCode::Div,
    OpCode::Mod, OpCode::Exp, OpCode::BitwiseOr, OpCode::BitwiseXor, OpCode::BitwiseAnd,
    OpCode::ShiftLeft, OpCode::ShiftRight, OpCode::ShiftRightLogical, OpCode::AddSmi,
    OpCode::SubSmi, OpCode::MulSmi, OpCode::DivSmi, OpCode::ModSmi, OpCode::ExpSmi,
    OpCode::BitwiseOrSmi, OpCode::BitwiseXorSmi, OpCode::BitwiseAndSmi, OpCode::ShiftLeftSmi,
    OpCode::ShiftRightSmi, OpCode::ShiftRightLogicalSmi, OpCode::Inc, OpCode::Dec, OpCode::Negate,
    OpCode::BitwiseNot, OpCode::ToBooleanLogicalNot, OpCode::LogicalNot, OpCode::TypeOf,
    OpCode::DeletePropertyStrict, OpCode::DeletePropertySloppy, OpCode::GetSuperConstructor,
    OpCode::FindNonDefaultConstructorOrConstruct, OpCode::CallAnyReceiver, OpCode::CallProperty,
    OpCode::CallProperty0, OpCode::CallProperty1, OpCode::CallProperty2,
    OpCode::CallUndefinedReceiver, OpCode::CallUndefinedReceiver0, OpCode::CallUndefinedReceiver1,
    OpCode::CallUndefinedReceiver2, OpCode::CallWithSpread, OpCode::CallRuntime,
    OpCode::CallRuntimeForPair, OpCode::CallJSRuntime, OpCode::InvokeIntrinsic, OpCode::Construct,
    OpCode::ConstructWithSpread, OpCode::ConstructForwardAllArgs, OpCode::TestEqual,
    OpCode::TestEqualStrict, OpCode::TestLessThan, OpCode::TestGreaterThan,
    OpCode::TestLessThanOrEqual, OpCode::TestGreaterThanOrEqual, OpCode::TestInstanceOf,
    OpCode::TestIn, OpCode::ToName, OpCode::ToNumber, OpCode::ToNumeric, OpCode::ToObject,
    OpCode::ToString, OpCode::ToBoolean, OpCode::CreateRegExpLiteral, OpCode::CreateArrayLiteral,
    OpCode::CreateArrayFromIterable, OpCode::CreateEmptyArrayLiteral, OpCode::CreateObjectLiteral,
    OpCode::CreateEmptyObjectLiteral, OpCode::CloneObject, OpCode::GetTemplateObject,
    OpCode::CreateClosure, OpCode::CreateBlockContext, OpCode::CreateCatchContext,
    OpCode::CreateFunctionContext, OpCode::CreateEvalContext, OpCode::CreateWithContext,
    OpCode::CreateMappedArguments, OpCode::CreateUnmappedArguments, OpCode::CreateRestParameter,
    OpCode::JumpLoop, OpCode::Jump, OpCode::JumpConstant, OpCode::JumpIfNullConstant,
    OpCode::JumpIfNotNullConstant, OpCode::JumpIfUndefinedConstant,
    OpCode::JumpIfUndefinedOrNullConstant, OpCode::JumpIfTrueConstant,
    OpCode::JumpIfFalseConstant, OpCode::JumpIfJSReceiverConstant,
    OpCode::JumpIfForInDoneConstant, OpCode::JumpIfToBooleanTrueConstant,
    OpCode::JumpIfToBooleanFalseConstant, OpCode::JumpIfToBooleanTrue,
    OpCode::JumpIfToBooleanFalse, OpCode::JumpIfTrue, OpCode::JumpIfFalse, OpCode::JumpIfNull,
    OpCode::JumpIfNotNull, OpCode::JumpIfUndefined, OpCode::JumpIfNotUndefined,
    OpCode::JumpIfUndefinedOrNull, OpCode::JumpIfJSReceiver, OpCode::JumpIfForInDone,
    OpCode::SwitchOnSmiNoFeedback, OpCode::ForInEnumerate, OpCode::ForInPrepare,
    OpCode::ForInNext, OpCode::ForInStep, OpCode::SetPendingMessage, OpCode::Throw,
    OpCode::ReThrow, OpCode::Return, OpCode::ThrowReferenceErrorIfHole,
    OpCode::ThrowSuperNotCalledIfHole, OpCode::ThrowSuperAlreadyCalledIfNotHole,
    OpCode::ThrowIfNotSuperConstructor, OpCode::SwitchOnGeneratorState, OpCode::SuspendGenerator,
    OpCode::ResumeGenerator, OpCode::GetIterator, OpCode::Debugger, OpCode::IncBlockCounter,
    OpCode::Abort,
];

impl OpCode {
    /// Number of opcodes in the catalogue.
    pub const COUNT: usize = OpCode::Abort as usize + 1;

    /// Decodes an opcode word.
    pub fn from_word(word: Word) -> Option<OpCode> {
        usize::try_from(word)
            .ok()
            .and_then(|index| ALL_OPCODES.get(index).copied())
    }

    /// The opcode as a machine word.
    pub fn word(self) -> Word {
        self as Word
    }

    /// Number of operand words following the opcode.
    ///
    /// Reserved opcodes report 0.
    pub fn operand_count(self) -> usize {
        match self {
            Self::LdaSmi
            | Self::LdaConstant
            | Self::LdaGlobal
            | Self::StaGlobal
            | Self::LdaCurrentContextSlot
            | Self::StaCurrentContextSlot => 1,
            Self::LdaContextSlot => 2,
            _ => 0,
        }
    }

    /// True for the opcodes the virtual machine can execute.
    pub fn is_implemented(self) -> bool {
        matches!(
            self,
            Self::LdaSmi
                | Self::LdaConstant
                | Self::LdaGlobal
                | Self::StaGlobal
                | Self::LdaContextSlot
                | Self::LdaCurrentContextSlot
                | Self::StaCurrentContextSlot
                | Self::PushContext
                | Self::PopContext
                | Self::Add
                | Self::Sub
                | Self::Mul
                | Self::Div
        )
    }

    /// Iterates over the whole catalogue in numeric order.
    pub fn all() -> impl Iterator<Item = OpCode> {
        ALL_OPCODES.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_is_densely_numbered() {
        for (index, opcode) in OpCode::all().enumerate() {
            assert_eq!(opcode.word(), index as Word);
            assert_eq!(OpCode::from_word(index as Word), Some(opcode));
        }
        assert_eq!(OpCode::COUNT, 187);
    }

    #[test]
    fn test_from_word_rejects_out_of_range() {
        assert_eq!(OpCode::from_word(-1), None);
        assert_eq!(OpCode::from_word(OpCode::COUNT as Word), None);
    }

    #[test]
    fn test_implemented_subset() {
        let implemented: Vec<_> = OpCode::all().filter(|op| op.is_implemented()).collect();
        assert_eq!(implemented.len(), 13);
        assert!(!OpCode::Jump.is_implemented());
        assert!(!OpCode::CallProperty.is_implemented());
        assert_eq!(OpCode::Jump.operand_count(), 0);
    }

    #[test]
    fn test_encode_flattens_operands() {
        let mut bytecode = Bytecode::new();
        bytecode.emit(Instruction::with_operand(OpCode::LdaSmi, Operand::Immediate(-3)));
        bytecode.emit(Instruction::with_operands(
            OpCode::LdaContextSlot,
            [Operand::Slot(2), Operand::Depth(1)],
        ));
        bytecode.emit(Instruction::simple(OpCode::Add));

        assert_eq!(
            bytecode.encode(),
            vec![
                OpCode::LdaSmi.word(),
                -3,
                OpCode::LdaContextSlot.word(),
                2,
                1,
                OpCode::Add.word(),
            ]
        );
    }

    #[test]
    fn test_instruction_display() {
        let instruction = Instruction::with_operand(OpCode::StaGlobal, Operand::Slot(4));
        assert_eq!(instruction.to_string(), "StaGlobal 4");
        assert_eq!(instruction.width(), 2);
    }
}
