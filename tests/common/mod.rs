//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use evmole_host::EngineModule;

/// Path to the real engine module, from `EVMOLE_WASM_PATH`.
///
/// Returns `None` when the variable is unset; tests that need the real
/// engine skip themselves in that case.
pub fn get_engine_path() -> Option<PathBuf> {
    std::env::var_os("EVMOLE_WASM_PATH")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Canned engine: every call yields one `Terminate` block spanning `[0, 4]`.
const CANNED_ENGINE: &str = r##"
(module
  (memory (export "memory") 1 1)
  (global $heap (mut i32) (i32.const 4096))
  (data (i32.const 1028) "{\"basic_blocks\":[[0,4]],\"control_flow_graph\":{\"blocks\":[{\"start\":0,\"end\":4,\"type\":\"Terminate\",\"data\":{\"success\":true}}]}}")

  (func (export "wasm_alloc") (param $size i32) (result i32)
    (local $p i32)
    (if (i32.gt_u (i32.add (global.get $heap) (local.get $size)) (i32.const 65536))
      (then (global.set $heap (i32.const 4096))))
    (local.set $p (global.get $heap))
    (global.set $heap (i32.add (local.get $p) (local.get $size)))
    (local.get $p))

  (func (export "wasm_dealloc") (param i32 i32))

  (func (export "contract_info") (param i32 i32 i32) (result i32)
    (i32.store (i32.const 1024) (i32.const 121))
    (i32.const 1024))
)
"##;

pub fn canned_engine_bytes() -> Vec<u8> {
    wat::parse_str(CANNED_ENGINE).expect("canned engine WAT must parse")
}

pub fn canned_engine() -> EngineModule {
    EngineModule::from_bytes(canned_engine_bytes()).expect("canned engine module")
}

/// Write the canned engine to a temp dir and return the dir guard and path.
pub fn canned_engine_file() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("engine.wasm");
    std::fs::write(&path, canned_engine_bytes()).expect("write engine");
    (dir, path)
}
