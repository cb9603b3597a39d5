//! A fixed set of independently guarded handles over one compiled module.

use std::sync::atomic::{AtomicUsize, Ordering};

use evmole_types::{decode_contract, Contract};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::handle::{CompiledEngine, EngineHandle};
use crate::metrics::EngineMetrics;
use crate::module::EngineModule;
use crate::request::AnalysisRequest;

/// Handles sharing one compilation and one set of metrics.
pub struct HandlePool {
    handles: Vec<EngineHandle>,
    next: AtomicUsize,
    metrics: EngineMetrics,
}

impl std::fmt::Debug for HandlePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlePool")
            .field("size", &self.handles.len())
            .finish()
    }
}

impl HandlePool {
    /// Compile `module` once and instantiate `size` handles (at least one).
    pub fn open(module: &EngineModule, size: usize, optimize: bool) -> Result<Self, EngineError> {
        let compiled = CompiledEngine::compile(module, optimize)?;
        Self::from_compiled(&compiled, size)
    }

    pub fn from_compiled(compiled: &CompiledEngine, size: usize) -> Result<Self, EngineError> {
        let metrics = EngineMetrics::default();
        let handles = (0..size.max(1))
            .map(|_| compiled.instantiate_with_metrics(metrics.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            size = handles.len(),
            digest = %hex::encode(compiled.module_digest()),
            "opened handle pool"
        );
        Ok(Self {
            handles,
            next: AtomicUsize::new(0),
            metrics,
        })
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Run on the first idle handle, or wait for the next one in rotation.
    pub fn contract_info_raw(&self, request: &AnalysisRequest) -> Result<Vec<u8>, EngineError> {
        for handle in &self.handles {
            if let Some(result) = handle.try_contract_info_raw(request) {
                return result;
            }
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.handles.len();
        self.handles[index].contract_info_raw(request)
    }

    pub fn contract_info(&self, request: &AnalysisRequest) -> Result<Contract, EngineError> {
        let payload = self.contract_info_raw(request)?;
        Ok(decode_contract(&payload)?)
    }

    /// Analyze a batch in parallel. Results are in request order.
    pub fn contract_info_many(
        &self,
        requests: &[AnalysisRequest],
    ) -> Vec<Result<Contract, EngineError>> {
        requests
            .par_iter()
            .map(|request| self.contract_info(request))
            .collect()
    }

    /// Close every handle. Reports the first failure after trying all of them.
    pub fn close(&self) -> Result<(), EngineError> {
        let mut first_error = None;
        for (index, handle) in self.handles.iter().enumerate() {
            if let Err(e) = handle.close() {
                warn!(index, error = %e, "failed to close pooled handle");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }
}
