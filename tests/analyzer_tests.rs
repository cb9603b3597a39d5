//! Analyzer facade against the canned engine.

mod common;

use common::*;
use evmole_host::{
    contract_info, AnalysisOptions, AnalysisRequest, Analyzer, BlockType, EngineConfig,
    EngineError,
};

fn config(pool_size: usize) -> EngineConfig {
    EngineConfig::default()
        .with_pool_size(pool_size)
        .with_optimize(false)
}

#[test]
fn analyzer_from_explicit_path() {
    let (_dir, path) = canned_engine_file();
    let analyzer = Analyzer::new(&config(2).with_wasm_path(&path)).unwrap();
    assert_eq!(analyzer.module_digest(), canned_engine().digest_hex());

    let contract = analyzer
        .contract_info_hex("0x6001600055", AnalysisOptions::new().with_control_flow_graph())
        .unwrap();
    let cfg = contract.control_flow_graph.unwrap();
    assert_eq!(cfg.blocks.len(), 1);
    assert_eq!(cfg.blocks[0].btype, BlockType::Terminate { success: true });
    assert_eq!(cfg.reachable_from(0).len(), 1);

    analyzer.close().unwrap();
}

#[test]
fn analyzer_rejects_bad_hex_and_empty_code() {
    let analyzer = Analyzer::with_module(&canned_engine(), &config(1)).unwrap();
    assert_eq!(
        analyzer
            .contract_info_hex("0xzz", AnalysisOptions::all())
            .unwrap_err()
            .kind(),
        "INVALID_INPUT"
    );
    assert!(matches!(
        analyzer.contract_info(&[], AnalysisOptions::all()),
        Err(EngineError::InvalidInput { .. })
    ));
    // Only the empty input reached a handle.
    assert_eq!(analyzer.metrics().calls, 1);
}

#[test]
fn analyzer_batch() {
    let analyzer = Analyzer::with_module(&canned_engine(), &config(3)).unwrap();
    let requests: Vec<AnalysisRequest> = (1u8..=12)
        .map(|n| {
            AnalysisRequest::new(
                vec![0x5b; n as usize],
                AnalysisOptions::new().with_basic_blocks(),
            )
        })
        .collect();
    let results = analyzer.contract_info_many(&requests);
    assert_eq!(results.len(), 12);
    assert!(results.iter().all(|r| r.is_ok()));

    let metrics = analyzer.metrics();
    assert_eq!(metrics.calls, 12);
    assert_eq!(metrics.allocations, metrics.deallocations);
    assert_eq!(metrics.result_releases, 12);
}

#[test]
fn one_shot_contract_info() {
    let contract = contract_info(
        &canned_engine(),
        &[0x60, 0x01, 0x60, 0x00, 0x55],
        AnalysisOptions::new().with_basic_blocks(),
    )
    .unwrap();
    let blocks = contract.basic_blocks.unwrap();
    assert_eq!((blocks[0].start, blocks[0].end), (0, 4));
}

#[test]
fn missing_module_path_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let err = Analyzer::new(&config(1).with_wasm_path(dir.path().join("missing.wasm")))
        .unwrap_err();
    assert_eq!(err.kind(), "ENGINE_LOAD");
}
