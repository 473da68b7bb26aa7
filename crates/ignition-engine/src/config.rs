//! Engine configuration.
//!
//! Every field has a default, so a configuration file only needs to name
//! the options it changes:
//!
//! ```toml
//! file_name = "script.js"
//! dedupe_constants = true
//! max_stack_size = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lexer::ANONYMOUS_FILE;

/// Default operand stack limit.
pub const DEFAULT_MAX_STACK_SIZE: usize = 1024;

/// Options shared by the resolver, compiler and virtual machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// File name used in source locations
    pub file_name: String,

    /// Reuse constant-pool entries for bit-identical literals
    pub dedupe_constants: bool,

    /// Maximum depth of the operand stack
    pub max_stack_size: usize,

    /// Log every dispatched instruction at trace level
    pub trace_execution: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            file_name: ANONYMOUS_FILE.to_string(),
            dedupe_constants: false,
            max_stack_size: DEFAULT_MAX_STACK_SIZE,
            trace_execution: false,
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serializes to a TOML document.
    pub fn to_toml_string(&self) -> String {
        // A flat struct of strings, bools and integers always serializes.
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
