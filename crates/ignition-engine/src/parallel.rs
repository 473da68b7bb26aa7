//! Running independent programs on a thread pool.
//!
//! Every source gets its own parser, resolver, compiler and VM; nothing
//! mutable is shared between jobs.

use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::{Compilation, Engine, compile_source};

/// Compiles and runs many programs in parallel.
pub struct ParallelExecutor {
    /// Dedicated pool, or `None` for rayon's global pool
    pool: Option<rayon::ThreadPool>,
    config: EngineConfig,
}

impl ParallelExecutor {
    /// Creates an executor on the global thread pool.
    pub fn new() -> Self {
        Self {
            pool: None,
            config: EngineConfig::default(),
        }
    }

    /// Creates an executor with its own pool of `num_threads` threads.
    pub fn with_threads(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;
        Ok(Self {
            pool: Some(pool),
            config: EngineConfig::default(),
        })
    }

    /// Uses `config` for every job.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs every source to completion, returning one engine per source in
    /// input order.
    pub fn run_parallel(&self, sources: &[&str]) -> Vec<Result<Engine>> {
        self.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    let mut engine = Engine::with_config(self.config.clone());
                    engine.execute(source)?;
                    Ok(engine)
                })
                .collect()
        })
    }

    /// Compiles every source without running it.
    pub fn compile_parallel(&self, sources: &[&str]) -> Vec<Result<Compilation>> {
        self.install(|| {
            sources
                .par_iter()
                .map(|source| compile_source(source, &self.config))
                .collect()
        })
    }

    fn install<R: Send>(&self, job: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(job),
            None => job(),
        }
    }
}

impl Default for ParallelExecutor {
    fn default() -> Self {
        Self::new()
    }
}
