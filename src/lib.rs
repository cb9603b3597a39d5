//! evmole-host
//!
//! Host bridge for the evmole EVM bytecode analysis engine, which runs as an
//! opaque WebAssembly module inside a wasmtime sandbox:
//!
//! - **Analyzer**: load the engine once, analyze many contracts
//! - **Contract model**: functions, storage layout, disassembly, basic blocks
//!   and the control flow graph, re-exported from [`evmole_types`]
//! - **Runtime**: handles, pools and options, re-exported from [`evmole_runtime`]
//!
//! ```ignore
//! use evmole_host::{AnalysisOptions, Analyzer, EngineConfig};
//!
//! let analyzer = Analyzer::new(&EngineConfig::from_env())?;
//! let contract = analyzer.contract_info_hex(
//!     "0x6080604052348015600e575f80fd5b50...",
//!     AnalysisOptions::new().with_arguments().with_state_mutability(),
//! )?;
//! for f in contract.functions.unwrap_or_default() {
//!     println!("{} {:?}", f.selector, f.arguments);
//! }
//! ```

use tracing::info;

pub use evmole_runtime::{
    AnalysisOptions, AnalysisRequest, CancelToken, CompiledEngine, EngineConfig, EngineError,
    EngineHandle, EngineMetrics, EngineModule, HandlePool, MetricsSnapshot, ABI_REVISION,
};
pub use evmole_types::{
    BasicBlock, Block, BlockType, Contract, ControlFlowGraph, DecodeError, DynamicJump, Function,
    Instruction, Selector, Slot, StateMutability, StorageRecord,
};

/// A loaded engine with a pool of handles, reusable across calls.
#[derive(Debug)]
pub struct Analyzer {
    pool: HandlePool,
    module_digest: String,
}

impl Analyzer {
    /// Load the module named by `config` (or the bundled one) and open
    /// `config.pool_size` handles.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let module = config.load_module()?;
        Self::with_module(&module, config)
    }

    /// Like [`Analyzer::new`], with module bytes already in hand.
    pub fn with_module(module: &EngineModule, config: &EngineConfig) -> Result<Self, EngineError> {
        let pool = HandlePool::open(module, config.pool_size, config.optimize)?;
        info!(
            pool_size = pool.size(),
            digest = %module.digest_hex(),
            "analyzer ready"
        );
        Ok(Self {
            pool,
            module_digest: module.digest_hex(),
        })
    }

    pub fn contract_info(
        &self,
        code: &[u8],
        options: AnalysisOptions,
    ) -> Result<Contract, EngineError> {
        self.pool.contract_info(&AnalysisRequest::new(code, options))
    }

    /// Analyze hex bytecode, with or without a `0x` prefix.
    pub fn contract_info_hex(
        &self,
        code: &str,
        options: AnalysisOptions,
    ) -> Result<Contract, EngineError> {
        self.pool.contract_info(&AnalysisRequest::from_hex(code, options)?)
    }

    pub fn contract_info_request(
        &self,
        request: &AnalysisRequest,
    ) -> Result<Contract, EngineError> {
        self.pool.contract_info(request)
    }

    /// Analyze a batch in parallel; results are in request order.
    pub fn contract_info_many(
        &self,
        requests: &[AnalysisRequest],
    ) -> Vec<Result<Contract, EngineError>> {
        self.pool.contract_info_many(requests)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.pool.metrics().snapshot()
    }

    /// Hex SHA-256 of the engine module.
    pub fn module_digest(&self) -> &str {
        &self.module_digest
    }

    pub fn close(&self) -> Result<(), EngineError> {
        self.pool.close()
    }
}

/// One-off analysis: open a single handle, analyze, close.
///
/// Compiles the engine on every call. Keep an [`Analyzer`] around for
/// anything beyond a single contract.
pub fn contract_info(
    module: &EngineModule,
    code: &[u8],
    options: AnalysisOptions,
) -> Result<Contract, EngineError> {
    let handle = EngineHandle::open(module)?;
    let result = handle.contract_info(&AnalysisRequest::new(code, options));
    handle.close()?;
    result
}
