//! Bytecode interpreter.

use tracing::{debug, instrument, trace};

use crate::compiler::{OpCode, Word};
use crate::config::EngineConfig;
use crate::error::ExecutionError;
use crate::resolver::Constant;
use crate::runtime::value::Value;

static HOLE: Value = Value::Hole;

/// Highest slot or constant index a store may grow an array to.
pub const MAX_SLOT_INDEX: usize = u16::MAX as usize;

/// The virtual machine that executes bytecode.
#[derive(Debug, Clone)]
pub struct VM {
    /// The operand stack
    stack: Vec<Value>,
    /// Global slots
    globals: Vec<Value>,
    /// One slot array per entered block, innermost last
    frames: Vec<Vec<Value>>,
    /// The constant pool, indexed by pool index
    constants: Vec<Value>,
    /// Instruction pointer
    ip: usize,
    max_stack_size: usize,
    trace_execution: bool,
}

impl VM {
    /// Creates a new VM with default limits.
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Creates a new VM honoring the relevant `config` options.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            stack: Vec::with_capacity(64),
            globals: Vec::new(),
            frames: Vec::new(),
            constants: Vec::new(),
            ip: 0,
            max_stack_size: config.max_stack_size,
            trace_execution: config.trace_execution,
        }
    }

    /// Runs a flat program to completion.
    ///
    /// All state from a previous run is discarded first. On error, the
    /// globals written so far stay readable but are not guaranteed to be
    /// consistent.
    #[instrument(skip_all, fields(words = words.len()))]
    pub fn run(&mut self, words: &[Word], constants: &[Constant]) -> Result<(), ExecutionError> {
        self.reset(constants)?;

        while self.ip < words.len() {
            let position = self.ip;
            let word = words[position];
            let opcode = OpCode::from_word(word).ok_or(ExecutionError::UnknownOpcode {
                code: word,
                position,
            })?;

            let end = position + 1 + opcode.operand_count();
            let operands = words
                .get(position + 1..end)
                .ok_or(ExecutionError::TruncatedInstruction { opcode, position })?;
            self.ip = end;

            if self.trace_execution {
                trace!(position, ?opcode, ?operands, stack = self.stack.len(), "dispatch");
            }
            self.dispatch(opcode, operands, position)?;
        }

        debug!(
            globals = self.globals.len(),
            frames = self.frames.len(),
            stack = self.stack.len(),
            "execution finished"
        );
        Ok(())
    }

    /// The global slot array after the last run.
    pub fn globals(&self) -> &[Value] {
        &self.globals
    }

    /// One global slot; slots never written read as [`Value::Hole`].
    pub fn global(&self, slot: usize) -> &Value {
        self.globals.get(slot).unwrap_or(&HOLE)
    }

    /// Current operand stack depth.
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of live scope frames.
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    fn reset(&mut self, constants: &[Constant]) -> Result<(), ExecutionError> {
        self.ip = 0;
        self.stack.clear();
        self.globals.clear();
        self.frames.clear();
        self.constants.clear();
        for constant in constants {
            let index = constant.index as usize;
            if index > MAX_SLOT_INDEX {
                return Err(ExecutionError::ConstantOutOfRange {
                    index: Word::from(constant.index),
                    position: 0,
                });
            }
            store(&mut self.constants, index, constant.value.into());
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        opcode: OpCode,
        operands: &[Word],
        position: usize,
    ) -> Result<(), ExecutionError> {
        match opcode {
            OpCode::LdaSmi => self.push(Value::Integer(operands[0]), position),

            OpCode::LdaConstant => {
                let index = operands[0];
                let value = usize::try_from(index)
                    .ok()
                    .and_then(|i| self.constants.get(i))
                    .cloned()
                    .ok_or(ExecutionError::ConstantOutOfRange { index, position })?;
                self.push(value, position)
            }

            OpCode::LdaGlobal => {
                let slot = slot_index(operands[0], position)?;
                let value = read(&self.globals, slot);
                self.push(value, position)
            }

            OpCode::StaGlobal => {
                let slot = slot_index(operands[0], position)?;
                let value = self.pop(position)?;
                store(&mut self.globals, slot, value);
                Ok(())
            }

            OpCode::LdaCurrentContextSlot => {
                let slot = slot_index(operands[0], position)?;
                let value = read(self.frame(0, position)?, slot);
                self.push(value, position)
            }

            OpCode::LdaContextSlot => {
                let slot = slot_index(operands[0], position)?;
                let value = read(self.frame(operands[1], position)?, slot);
                self.push(value, position)
            }

            OpCode::StaCurrentContextSlot => {
                let slot = slot_index(operands[0], position)?;
                let value = self.pop(position)?;
                let frame = self
                    .frames
                    .last_mut()
                    .ok_or(ExecutionError::NoScopeFrame { depth: 0, position })?;
                store(frame, slot, value);
                Ok(())
            }

            OpCode::PushContext => {
                self.frames.push(Vec::new());
                Ok(())
            }

            OpCode::PopContext => {
                self.frames
                    .pop()
                    .map(drop)
                    .ok_or(ExecutionError::NoScopeFrame { depth: 0, position })
            }

            OpCode::Add => self.binary_num_op(position, |a, b| a + b),
            OpCode::Sub => self.binary_num_op(position, |a, b| a - b),
            OpCode::Mul => self.binary_num_op(position, |a, b| a * b),
            OpCode::Div => self.binary_num_op(position, |a, b| a / b),

            _ => Err(ExecutionError::Unimplemented { opcode, position }),
        }
    }

    /// The frame `depth` frames below the innermost one.
    fn frame(&self, depth: Word, position: usize) -> Result<&[Value], ExecutionError> {
        usize::try_from(depth)
            .ok()
            .and_then(|d| self.frames.len().checked_sub(d + 1))
            .map(|index| self.frames[index].as_slice())
            .ok_or(ExecutionError::NoScopeFrame { depth, position })
    }

    fn push(&mut self, value: Value, position: usize) -> Result<(), ExecutionError> {
        if self.stack.len() >= self.max_stack_size {
            return Err(ExecutionError::StackOverflow {
                limit: self.max_stack_size,
                position,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self, position: usize) -> Result<Value, ExecutionError> {
        self.stack
            .pop()
            .ok_or(ExecutionError::StackUnderflow { position })
    }

    fn binary_num_op<F>(&mut self, position: usize, op: F) -> Result<(), ExecutionError>
    where
        F: Fn(f64, f64) -> f64,
    {
        let b = self.pop(position)?;
        let a = self.pop(position)?;

        let number = |value: &Value| {
            value.to_number().ok_or(ExecutionError::NonNumericOperand {
                kind: value.kind_name(),
                position,
            })
        };
        let result = op(number(&a)?, number(&b)?);

        self.push(Value::Float(result), position)
    }
}

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

fn slot_index(word: Word, position: usize) -> Result<usize, ExecutionError> {
    usize::try_from(word)
        .ok()
        .filter(|&index| index <= MAX_SLOT_INDEX)
        .ok_or(ExecutionError::SlotOutOfRange {
            index: word,
            position,
        })
}

fn read(slots: &[Value], index: usize) -> Value {
    slots.get(index).cloned().unwrap_or_default()
}

fn store(slots: &mut Vec<Value>, index: usize, value: Value) {
    if index >= slots.len() {
        slots.resize(index + 1, Value::Hole);
    }
    slots[index] = value;
}
