// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ignition - command line driver for the ignition engine
//!
//! Feeds a script file (or `-e CODE`) to the engine and prints the final
//! global variables as `name = value` lines. Set `RUST_LOG=ignition_engine=debug`
//! to see per-phase summaries, or `trace` together with
//! `trace_execution = true` in the config file to log every instruction.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use ignition_engine::{Engine, EngineConfig, Error};
use owo_colors::OwoColorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

/// Main entry point - uses tokio runtime for async file loading.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e.red());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).await?,
        None => EngineConfig::default(),
    };

    let source = match (&cli.eval, &cli.file) {
        (Some(code), _) => code.clone(),
        (None, Some(path)) => {
            config.file_name = path.display().to_string();
            tokio::fs::read_to_string(path).await?
        }
        // clap requires one of the two
        (None, None) => String::new(),
    };

    let mut engine = Engine::with_config(config);
    let result = engine.execute(&source);

    // A failed run still has a listing worth showing
    if cli.disassemble {
        print!("{}", engine.disassemble());
    }
    result?;

    if cli.print.is_empty() {
        for (name, value) in engine.globals() {
            println!("{} = {}", name, value);
        }
    } else {
        for name in &cli.print {
            println!("{} = {}", name, engine.get_value(name)?);
        }
    }

    Ok(())
}

async fn load_config(path: &Path) -> Result<EngineConfig, Error> {
    let content = tokio::fs::read_to_string(path).await?;
    EngineConfig::from_toml_str(&content)
}
