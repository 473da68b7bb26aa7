//! The bytecode virtual machine.
//!
//! Executes flat bytecode against global slots, a stack of scope frames,
//! an operand stack and a materialized constant pool.
//!
//! ## Structure
//!
//! - `interpreter` - The VM and its dispatch loop

mod interpreter;

pub use interpreter::{MAX_SLOT_INDEX, VM};
