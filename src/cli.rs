//! Command line arguments for the ignition driver.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// ignition - run a script and print its global variables
#[derive(Parser, Debug)]
#[command(name = "ignition")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "eval"])))]
pub struct Cli {
    /// Script file to run
    pub file: Option<PathBuf>,

    /// Run CODE instead of a file
    #[arg(short, long, value_name = "CODE")]
    pub eval: Option<String>,

    /// Print only this global (repeatable)
    #[arg(short, long = "print", value_name = "NAME")]
    pub print: Vec<String>,

    /// Print the bytecode listing before the results
    #[arg(long)]
    pub disassemble: bool,

    /// Load engine options from a TOML file
    #[arg(long, value_name = "PATH", env = "IGNITION_CONFIG")]
    pub config: Option<PathBuf>,
}
