//! Stand-in engine modules for exercising the call protocol.
//!
//! The fake engine speaks the real ABI (`wasm_alloc`, `wasm_dealloc`,
//! `contract_info`, `memory`) and answers with a one-function contract whose
//! selector is the hex of the first four input bytes and whose `arguments`
//! string is `m` followed by the option mask in hex. Inputs starting with a
//! marker byte drive the failure paths:
//!
//! | first byte | behaviour                                   |
//! |------------|---------------------------------------------|
//! | `0xff`     | `contract_info` returns 0                   |
//! | `0xfe`     | result pointer outside linear memory        |
//! | `0xfd`     | length prefix larger than linear memory     |
//! | `0xfc`     | payload with an `UnknownType` block         |
//! | `0xfb`     | `contract_info` traps                       |
//!
//! `wasm_alloc` returns 0 for requests above 32 KiB and traps above 48 KiB.

#![allow(dead_code)]

use evmole_runtime::EngineModule;

pub const NULL_RESULT: u8 = 0xff;
pub const RESULT_OUT_OF_BOUNDS: u8 = 0xfe;
pub const PAYLOAD_OUT_OF_BOUNDS: u8 = 0xfd;
pub const UNKNOWN_BLOCK: u8 = 0xfc;
pub const ENGINE_TRAP: u8 = 0xfb;

pub const ALLOC_REFUSED_SIZE: usize = 40_000;
pub const ALLOC_TRAP_SIZE: usize = 50_000;

const FAKE_ENGINE: &str = r##"
(module
  (memory (export "memory") 1 1)
  (global $heap (mut i32) (i32.const 4096))
  (data (i32.const 0) "0123456789abcdef")
  (data (i32.const 256) "{\"functions\":[{\"selector\":\"00000000\",\"bytecode_offset\":0,\"arguments\":\"m00\"}]}")
  (data (i32.const 512) "{\"control_flow_graph\":{\"blocks\":[{\"start\":0,\"end\":1,\"type\":\"UnknownType\",\"data\":{}}]}}")

  (func $hex (param $dst i32) (param $byte i32)
    (i32.store8 (local.get $dst)
      (i32.load8_u (i32.shr_u (local.get $byte) (i32.const 4))))
    (i32.store8 (i32.add (local.get $dst) (i32.const 1))
      (i32.load8_u (i32.and (local.get $byte) (i32.const 15)))))

  (func $respond (param $src i32) (param $len i32) (result i32)
    (i32.store (i32.const 1024) (local.get $len))
    (memory.copy (i32.const 1028) (local.get $src) (local.get $len))
    (i32.const 1024))

  (func (export "wasm_alloc") (param $size i32) (result i32)
    (local $p i32)
    (if (i32.gt_u (local.get $size) (i32.const 49152)) (then unreachable))
    (if (i32.gt_u (local.get $size) (i32.const 32768)) (then (return (i32.const 0))))
    (if (i32.gt_u (i32.add (global.get $heap) (local.get $size)) (i32.const 65536))
      (then (global.set $heap (i32.const 4096))))
    (local.set $p (global.get $heap))
    (global.set $heap (i32.add (local.get $p) (local.get $size)))
    (local.get $p))

  (func (export "wasm_dealloc") (param $ptr i32) (param $size i32)
    @DEALLOC@)

  (func (export "contract_info") (param $ptr i32) (param $len i32) (param $opts i32) (result i32)
    (local $first i32) (local $i i32) (local $byte i32)
    (local.set $first (i32.load8_u (local.get $ptr)))
    (if (i32.eq (local.get $first) (i32.const 0xff)) (then (return (i32.const 0))))
    (if (i32.eq (local.get $first) (i32.const 0xfe)) (then (return (i32.const 0xfffff0))))
    (if (i32.eq (local.get $first) (i32.const 0xfd))
      (then
        (i32.store (i32.const 1024) (i32.const 0x7fffff00))
        (return (i32.const 1024))))
    (if (i32.eq (local.get $first) (i32.const 0xfc))
      (then (return (call $respond (i32.const 512) (i32.const 86)))))
    (if (i32.eq (local.get $first) (i32.const 0xfb)) (then unreachable))
    (drop (call $respond (i32.const 256) (i32.const 77)))
    (block $done
      (loop $next
        (br_if $done (i32.ge_u (local.get $i) (i32.const 4)))
        (local.set $byte (i32.const 0))
        (if (i32.lt_u (local.get $i) (local.get $len))
          (then (local.set $byte (i32.load8_u (i32.add (local.get $ptr) (local.get $i))))))
        (call $hex
          (i32.add (i32.const 1055) (i32.shl (local.get $i) (i32.const 1)))
          (local.get $byte))
        (local.set $i (i32.add (local.get $i) (i32.const 1)))
        (br $next)))
    (call $hex (i32.const 1099) (local.get $opts))
    (i32.const 1024))
)
"##;

/// WAT text of the fake engine with the given `wasm_dealloc` body.
pub fn fake_engine_wat(dealloc_body: &str) -> String {
    FAKE_ENGINE.replace("@DEALLOC@", dealloc_body)
}

pub fn module_from_wat(wat: &str) -> EngineModule {
    let bytes = wat::parse_str(wat).expect("fixture WAT must parse");
    EngineModule::from_bytes(bytes).expect("fixture module")
}

/// The well-behaved fake engine.
pub fn fake_engine() -> EngineModule {
    module_from_wat(&fake_engine_wat("nop"))
}

/// A fake engine whose deallocator always traps.
pub fn fake_engine_with_trapping_dealloc() -> EngineModule {
    module_from_wat(&fake_engine_wat("unreachable"))
}

/// Input whose result selector will be the hex of its first four bytes.
pub fn code_with_selector(selector: [u8; 4]) -> Vec<u8> {
    let mut code = selector.to_vec();
    code.extend_from_slice(&[0x60, 0x00, 0x55]);
    code
}
