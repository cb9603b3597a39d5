//! Engine handles.
//!
//! Compiling the engine is the expensive step (tens of milliseconds), so it
//! is split from instantiation: a [`CompiledEngine`] is compiled once and can
//! produce any number of [`EngineHandle`]s, each with its own sandbox.
//!
//! ```ignore
//! let module = EngineModule::from_file("evmole.wasm")?;
//! let handle = EngineHandle::open(&module)?;
//! let request = AnalysisRequest::from_hex("0x6001600055", AnalysisOptions::new().with_basic_blocks())?;
//! let contract = handle.contract_info(&request)?;
//! handle.close()?;
//! ```

use std::time::Instant;

use evmole_types::{decode_contract, Contract};
use tracing::{debug, info};
use wasmtime::{Config, Engine, Module, OptLevel};

use crate::bridge::Sandbox;
use crate::error::EngineError;
use crate::guard::Guard;
use crate::metrics::EngineMetrics;
use crate::module::EngineModule;
use crate::request::AnalysisRequest;

/// A compiled engine module, ready to be instantiated.
#[derive(Clone)]
pub struct CompiledEngine {
    engine: Engine,
    module: Module,
    digest: [u8; 32],
}

impl std::fmt::Debug for CompiledEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledEngine")
            .field("digest", &hex::encode(self.digest))
            .finish()
    }
}

impl CompiledEngine {
    /// Compile `module`. `optimize` selects cranelift's speed level.
    pub fn compile(module: &EngineModule, optimize: bool) -> Result<Self, EngineError> {
        let started = Instant::now();
        let mut config = Config::new();
        config.cranelift_opt_level(if optimize {
            OptLevel::Speed
        } else {
            OptLevel::None
        });
        let engine = Engine::new(&config)
            .map_err(|e| EngineError::load(format!("engine configuration: {:#}", e)))?;
        let compiled = Module::new(&engine, module.bytes())
            .map_err(|e| EngineError::load(format!("compilation failed: {:#}", e)))?;
        info!(
            digest = %module.digest_hex(),
            optimize,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "compiled engine module"
        );
        Ok(Self {
            engine,
            module: compiled,
            digest: module.digest(),
        })
    }

    /// Create a new handle with its own sandbox.
    pub fn instantiate(&self) -> Result<EngineHandle, EngineError> {
        self.instantiate_with_metrics(EngineMetrics::default())
    }

    pub(crate) fn instantiate_with_metrics(
        &self,
        metrics: EngineMetrics,
    ) -> Result<EngineHandle, EngineError> {
        let sandbox = Sandbox::instantiate(&self.engine, &self.module)?;
        debug!(digest = %hex::encode(self.digest), "instantiated engine handle");
        Ok(EngineHandle {
            sandbox: Guard::new(sandbox),
            digest: self.digest,
            metrics,
        })
    }

    pub fn module_digest(&self) -> [u8; 32] {
        self.digest
    }
}

/// One loaded engine instance.
///
/// Calls on the same handle are serialized; use several handles (see
/// [`crate::pool::HandlePool`]) for parallel throughput.
pub struct EngineHandle {
    sandbox: Guard<Sandbox>,
    digest: [u8; 32],
    metrics: EngineMetrics,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("digest", &hex::encode(self.digest))
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl EngineHandle {
    /// Compile and instantiate `module` in one step.
    pub fn open(module: &EngineModule) -> Result<Self, EngineError> {
        let handle = CompiledEngine::compile(module, true)?.instantiate()?;
        info!(digest = %module.digest_hex(), "opened engine handle");
        Ok(handle)
    }

    /// Release the sandbox. Waits for an in-flight call; fails if already closed.
    pub fn close(&self) -> Result<(), EngineError> {
        let sandbox = self.sandbox.close()?;
        drop(sandbox);
        info!(digest = %hex::encode(self.digest), "closed engine handle");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.sandbox.is_closed()
    }

    /// Analyze and decode.
    pub fn contract_info(&self, request: &AnalysisRequest) -> Result<Contract, EngineError> {
        let payload = self.contract_info_raw(request)?;
        Ok(decode_contract(&payload)?)
    }

    /// Analyze and return the engine's JSON payload undecoded.
    pub fn contract_info_raw(&self, request: &AnalysisRequest) -> Result<Vec<u8>, EngineError> {
        request.check_cancelled()?;
        let result = self.sandbox.with(|sandbox| self.run(sandbox, request));
        self.finish(request, result)
    }

    /// Like [`Self::contract_info_raw`], but `None` if the handle is busy.
    pub(crate) fn try_contract_info_raw(
        &self,
        request: &AnalysisRequest,
    ) -> Option<Result<Vec<u8>, EngineError>> {
        if let Err(e) = request.check_cancelled() {
            return Some(Err(e));
        }
        let result = self.sandbox.try_with(|sandbox| self.run(sandbox, request))?;
        Some(self.finish(request, result))
    }

    fn run(
        &self,
        sandbox: &mut Sandbox,
        request: &AnalysisRequest,
    ) -> Result<Vec<u8>, EngineError> {
        let started = Instant::now();
        let result = sandbox.contract_info(&request.code, request.options.to_mask(), &self.metrics);
        self.metrics.record_call(result.is_err());
        debug!(
            code_len = request.code.len(),
            ok = result.is_ok(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "contract_info"
        );
        result
    }

    fn finish(
        &self,
        request: &AnalysisRequest,
        result: Result<Vec<u8>, EngineError>,
    ) -> Result<Vec<u8>, EngineError> {
        let payload = result?;
        request.check_cancelled()?;
        Ok(payload)
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn module_digest(&self) -> [u8; 32] {
        self.digest
    }
}
