//! Tests against the real engine module.
//!
//! Run with `EVMOLE_WASM_PATH=/path/to/evmole.wasm cargo test --test engine_tests`.
//! Without the variable every test returns early.

mod common;

use common::get_engine_path;
use evmole_host::{
    AnalysisOptions, Analyzer, BlockType, EngineConfig, Selector, StateMutability,
};

/// Dispatcher with a single `pure` function `fae7ab82(uint32)`.
const UINT32_PURE: &str = "6080604052348015600e575f80fd5b50600436106026575f3560e01c8063fae7ab8214602a575b5f80fd5b603960353660046062565b6052565b60405163ffffffff909116815260200160405180910390f35b5f605c826001608a565b92915050565b5f602082840312156071575f80fd5b813563ffffffff811681146083575f80fd5b9392505050565b63ffffffff8181168382160190811115605c57634e487b7160e01b5f52601160045260245ffd";

fn analyzer() -> Option<Analyzer> {
    let Some(path) = get_engine_path() else {
        eprintln!("Skipping: EVMOLE_WASM_PATH not set");
        return None;
    };
    let config = EngineConfig::default().with_wasm_path(path).with_pool_size(2);
    Some(Analyzer::new(&config).expect("engine should load"))
}

#[test]
fn test_sstore_is_one_terminate_block() {
    let Some(analyzer) = analyzer() else { return };
    let contract = analyzer
        .contract_info_hex("0x6001600055", AnalysisOptions::new().with_control_flow_graph())
        .unwrap();

    let blocks = contract.basic_blocks.unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!((blocks[0].start, blocks[0].end), (0, 4));

    let cfg = contract.control_flow_graph.unwrap();
    assert_eq!(cfg.blocks.len(), 1);
    assert!(matches!(cfg.blocks[0].btype, BlockType::Terminate { .. }));
}

#[test]
fn test_uint32_pure_function() {
    let Some(analyzer) = analyzer() else { return };
    let contract = analyzer
        .contract_info_hex(
            UINT32_PURE,
            AnalysisOptions::new()
                .with_arguments()
                .with_state_mutability(),
        )
        .unwrap();

    let functions = contract.functions.unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].selector, Selector([0xfa, 0xe7, 0xab, 0x82]));
    assert_eq!(functions[0].arguments.as_deref(), Some("uint32"));
    assert_eq!(functions[0].state_mutability, Some(StateMutability::Pure));
}

#[test]
fn test_disassembly_and_cfg_entry() {
    let Some(analyzer) = analyzer() else { return };
    let contract = analyzer
        .contract_info_hex(
            UINT32_PURE,
            AnalysisOptions::new()
                .with_disassemble()
                .with_control_flow_graph(),
        )
        .unwrap();

    let first = &contract.disassembled.unwrap()[0];
    assert_eq!((first.offset, first.opcode.as_str()), (0, "PUSH1 80"));

    let cfg = contract.control_flow_graph.unwrap();
    assert!(matches!(cfg.blocks[0].btype, BlockType::Jumpi { .. }));
    assert!(cfg.reachable_from(0).len() > 1);
}

#[test]
fn test_empty_request_returns_no_sections() {
    let Some(analyzer) = analyzer() else { return };
    let contract = analyzer
        .contract_info_hex(UINT32_PURE, AnalysisOptions::new())
        .unwrap();
    assert!(contract.functions.is_none());
    assert!(contract.control_flow_graph.is_none());
}

#[test]
fn test_repeated_calls_are_stable() {
    let Some(analyzer) = analyzer() else { return };
    let options = AnalysisOptions::all();
    let first = analyzer.contract_info_hex(UINT32_PURE, options).unwrap();
    for _ in 0..5 {
        assert_eq!(analyzer.contract_info_hex(UINT32_PURE, options).unwrap(), first);
    }
    let metrics = analyzer.metrics();
    assert_eq!(metrics.allocations, metrics.deallocations);
    assert_eq!(metrics.cleanup_failures, 0);
}
