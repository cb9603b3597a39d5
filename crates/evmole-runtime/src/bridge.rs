//! The host/engine call protocol.
//!
//! One [`Sandbox`] is one instantiated engine: its store, its linear memory
//! and the three typed entry points. [`Sandbox::contract_info`] runs the
//! allocate / write / invoke / read / deallocate sequence. Every input buffer
//! it allocates is released before it returns, on success and on failure.
//!
//! Result layout: a 4-byte little-endian length prefix at the returned
//! pointer, followed by that many bytes of UTF-8 JSON. The engine expects the
//! whole `4 + len` region back through `wasm_dealloc`.

use tracing::{debug, warn};
use wasmtime::{Instance, Module, Store, TypedFunc};

use crate::error::EngineError;
use crate::memory::{Arena, SandboxPtr};
use crate::metrics::EngineMetrics;
use crate::options::OptionMask;

pub(crate) const ALLOC_EXPORT: &str = "wasm_alloc";
pub(crate) const DEALLOC_EXPORT: &str = "wasm_dealloc";
pub(crate) const ANALYZE_EXPORT: &str = "contract_info";
pub(crate) const MEMORY_EXPORT: &str = "memory";

const LEN_PREFIX: u32 = 4;

pub(crate) struct Sandbox {
    store: Store<()>,
    arena: Arena,
    alloc: TypedFunc<i32, i32>,
    dealloc: TypedFunc<(i32, i32), ()>,
    analyze: TypedFunc<(i32, i32, i32), i32>,
}

impl Sandbox {
    /// Instantiate `module` and resolve its exports against the pinned ABI.
    pub(crate) fn instantiate(
        engine: &wasmtime::Engine,
        module: &Module,
    ) -> Result<Self, EngineError> {
        let mut store = Store::new(engine, ());
        let instance = Instance::new(&mut store, module, &[])
            .map_err(|e| EngineError::load(format!("instantiation failed: {:#}", e)))?;

        let memory = instance
            .get_memory(&mut store, MEMORY_EXPORT)
            .ok_or_else(|| EngineError::load(format!("missing '{}' export", MEMORY_EXPORT)))?;
        let alloc = typed_export::<i32, i32>(&instance, &mut store, ALLOC_EXPORT)?;
        let dealloc = typed_export::<(i32, i32), ()>(&instance, &mut store, DEALLOC_EXPORT)?;
        let analyze = typed_export::<(i32, i32, i32), i32>(&instance, &mut store, ANALYZE_EXPORT)?;

        Ok(Self {
            store,
            arena: Arena::new(memory),
            alloc,
            dealloc,
            analyze,
        })
    }

    /// Run one analysis and return the raw JSON payload.
    pub(crate) fn contract_info(
        &mut self,
        code: &[u8],
        mask: OptionMask,
        metrics: &EngineMetrics,
    ) -> Result<Vec<u8>, EngineError> {
        if code.is_empty() {
            return Err(EngineError::InvalidInput {
                reason: "empty bytecode".to_string(),
            });
        }
        let len = u32::try_from(code.len()).map_err(|_| EngineError::InvalidInput {
            reason: format!("bytecode of {} bytes exceeds the sandbox address space", code.len()),
        })?;

        let input = self.allocate(len)?;
        metrics.record_allocation();
        debug!(ptr = input.offset(), len, "allocated input buffer");

        let result = self.write_and_analyze(input, code, mask, metrics);

        self.deallocate(input, len, metrics);
        metrics.record_deallocation();
        result
    }

    fn allocate(&mut self, size: u32) -> Result<SandboxPtr, EngineError> {
        let raw = self
            .alloc
            .call(&mut self.store, size as i32)
            .map_err(|trap| EngineError::Allocation {
                size,
                trap: Some(format!("{:#}", trap)),
            })?;
        SandboxPtr::from_wasm(raw).ok_or(EngineError::Allocation { size, trap: None })
    }

    fn write_and_analyze(
        &mut self,
        input: SandboxPtr,
        code: &[u8],
        mask: OptionMask,
        metrics: &EngineMetrics,
    ) -> Result<Vec<u8>, EngineError> {
        self.arena.write(&mut self.store, input, code)?;

        let raw = self
            .analyze
            .call(
                &mut self.store,
                (input.as_wasm(), code.len() as i32, mask.as_wasm()),
            )
            .map_err(|trap| EngineError::invocation(format!("engine trapped: {:#}", trap)))?;
        let result = SandboxPtr::from_wasm(raw)
            .ok_or_else(|| EngineError::invocation("contract_info returned a null pointer"))?;

        let payload_len = match self.arena.read_u32_le(&self.store, result.offset()) {
            Ok(len) => len,
            Err(e) => {
                // Size unknown without the prefix: the buffer is leaked.
                warn!(
                    ptr = result.offset(),
                    error = %e,
                    "unreadable result prefix, result buffer not released"
                );
                return Err(e);
            }
        };
        debug!(ptr = result.offset(), payload_len, "engine returned result");

        let payload = result
            .offset()
            .checked_add(LEN_PREFIX)
            .ok_or(EngineError::MemoryAccess {
                offset: result.offset(),
                len: u64::from(LEN_PREFIX) + u64::from(payload_len),
                memory_size: self.arena.size(&self.store),
            })
            .and_then(|offset| self.arena.read(&self.store, offset, payload_len));

        match payload_len.checked_add(LEN_PREFIX) {
            Some(size) => {
                self.deallocate(result, size, metrics);
                metrics.record_result_release();
            }
            None => warn!(
                ptr = result.offset(),
                payload_len, "result size overflows u32, result buffer not released"
            ),
        }

        let payload = payload?;
        metrics.record_payload(payload.len());
        Ok(payload)
    }

    /// Release a buffer. Traps are logged and counted, never returned.
    fn deallocate(&mut self, ptr: SandboxPtr, size: u32, metrics: &EngineMetrics) {
        if let Err(trap) = self
            .dealloc
            .call(&mut self.store, (ptr.as_wasm(), size as i32))
        {
            metrics.record_cleanup_failure();
            warn!(ptr = ptr.offset(), size, "wasm_dealloc trapped: {:#}", trap);
        }
    }
}

/// Look up an exported function and check its signature.
fn typed_export<P, R>(
    instance: &Instance,
    store: &mut Store<()>,
    name: &str,
) -> Result<TypedFunc<P, R>, EngineError>
where
    P: wasmtime::WasmParams,
    R: wasmtime::WasmResults,
{
    let func = instance
        .get_func(&mut *store, name)
        .ok_or_else(|| EngineError::load(format!("missing '{}' export", name)))?;
    func.typed::<P, R>(&*store).map_err(|e| {
        EngineError::load(format!(
            "'{}' does not match ABI revision {}: {:#}",
            name,
            crate::options::ABI_REVISION,
            e
        ))
    })
}
