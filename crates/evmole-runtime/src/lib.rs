//! Host runtime for the evmole analysis engine.
//!
//! The engine is an opaque WebAssembly module exporting `wasm_alloc`,
//! `wasm_dealloc`, `contract_info` and its linear `memory`. This crate loads
//! it with wasmtime and drives the call protocol:
//!
//! - [`module`] - engine bytes, gzip handling, the bundled module
//! - [`handle`] - compilation and per-instance handles
//! - [`pool`] - several handles over one compilation
//! - [`options`] - requested outputs and their bitmask
//! - [`request`] - bytecode requests and cancellation
//! - [`config`] - environment-driven configuration
//! - [`metrics`] - call and buffer counters
//!
//! Decoded results use the types from [`evmole_types`].

mod bridge;
pub mod config;
pub mod error;
mod guard;
pub mod handle;
mod memory;
pub mod metrics;
pub mod module;
pub mod options;
pub mod pool;
pub mod request;

pub use config::EngineConfig;
pub use error::EngineError;
pub use handle::{CompiledEngine, EngineHandle};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use module::EngineModule;
pub use options::{AnalysisOptions, ABI_REVISION};
pub use pool::HandlePool;
pub use request::{AnalysisRequest, CancelToken};
