//! Runtime configuration from the environment.

use std::path::PathBuf;

use evmole_types::env_utils::{env_bool_or, env_path, env_var_or};

use crate::error::EngineError;
use crate::module::EngineModule;

/// Path to the engine `.wasm` (optionally gzip-compressed).
pub const WASM_PATH_ENV: &str = "EVMOLE_WASM_PATH";
/// Number of handles in a pool.
pub const POOL_SIZE_ENV: &str = "EVMOLE_POOL_SIZE";
/// Whether cranelift optimizes for speed (`true`) or skips optimization.
pub const OPTIMIZE_ENV: &str = "EVMOLE_OPTIMIZE";

/// How to load and host the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Explicit module path; `None` means the bundled module.
    pub wasm_path: Option<PathBuf>,
    /// Number of independently guarded handles, at least 1.
    pub pool_size: usize,
    /// Compile with cranelift speed optimizations.
    pub optimize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            wasm_path: None,
            pool_size: default_pool_size(),
            optimize: true,
        }
    }
}

impl EngineConfig {
    /// Read `EVMOLE_WASM_PATH`, `EVMOLE_POOL_SIZE` and `EVMOLE_OPTIMIZE`.
    ///
    /// Unset or unparsable values fall back to the defaults. A pool size of
    /// zero is raised to one.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            wasm_path: env_path(WASM_PATH_ENV),
            pool_size: env_var_or(POOL_SIZE_ENV, defaults.pool_size).max(1),
            optimize: env_bool_or(OPTIMIZE_ENV, defaults.optimize),
        }
    }

    pub fn with_wasm_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.wasm_path = Some(path.into());
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    /// Load the module this configuration points at.
    pub fn load_module(&self) -> Result<EngineModule, EngineError> {
        match &self.wasm_path {
            Some(path) => EngineModule::from_file(path),
            None => EngineModule::bundled().cloned(),
        }
    }
}

fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
