//! Call protocol metrics.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Engine call metrics (thread-safe counters).
///
/// Clones share their counters, so one instance can be handed to every
/// handle of a pool.
#[derive(Debug, Clone)]
pub struct EngineMetrics {
    /// `contract_info` calls that reached the sandbox
    pub calls: Arc<AtomicU64>,
    /// Calls that ended in an error
    pub failures: Arc<AtomicU64>,
    /// Input buffers allocated in the sandbox
    pub allocations: Arc<AtomicU64>,
    /// `wasm_dealloc` calls issued for input buffers, trapped or not
    pub deallocations: Arc<AtomicU64>,
    /// `wasm_dealloc` calls issued for result buffers, trapped or not
    pub result_releases: Arc<AtomicU64>,
    /// Deallocation calls that trapped
    pub cleanup_failures: Arc<AtomicU64>,
    /// Payload bytes copied out of the sandbox
    pub payload_bytes: Arc<AtomicU64>,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self {
            calls: Arc::new(AtomicU64::new(0)),
            failures: Arc::new(AtomicU64::new(0)),
            allocations: Arc::new(AtomicU64::new(0)),
            deallocations: Arc::new(AtomicU64::new(0)),
            result_releases: Arc::new(AtomicU64::new(0)),
            cleanup_failures: Arc::new(AtomicU64::new(0)),
            payload_bytes: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl EngineMetrics {
    /// Record a call and whether it failed.
    pub fn record_call(&self, failed: bool) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deallocation(&self) {
        self.deallocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result_release(&self) {
        self.result_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cleanup_failure(&self) {
        self.cleanup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_payload(&self, bytes: usize) {
        self.payload_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Get a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            deallocations: self.deallocations.load(Ordering::Relaxed),
            result_releases: self.result_releases.load(Ordering::Relaxed),
            cleanup_failures: self.cleanup_failures.load(Ordering::Relaxed),
            payload_bytes: self.payload_bytes.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.calls.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.allocations.store(0, Ordering::Relaxed);
        self.deallocations.store(0, Ordering::Relaxed);
        self.result_releases.store(0, Ordering::Relaxed);
        self.cleanup_failures.store(0, Ordering::Relaxed);
        self.payload_bytes.store(0, Ordering::Relaxed);
    }
}

/// Snapshot of metrics (for reporting).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub calls: u64,
    pub failures: u64,
    pub allocations: u64,
    pub deallocations: u64,
    pub result_releases: u64,
    pub cleanup_failures: u64,
    pub payload_bytes: u64,
}

impl MetricsSnapshot {
    /// Input allocations without a matching deallocate call. Zero between calls.
    pub fn outstanding_buffers(&self) -> u64 {
        self.allocations.saturating_sub(self.deallocations)
    }

    /// Fraction of calls that failed.
    pub fn failure_rate(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.failures as f64 / self.calls as f64
        }
    }
}
