use crate::utils::{COUNTER_CODE, counter_artifact, counter_source_map, reverting_trace};
use alloy_primitives::{B256, hex, keccak256};
use postmortem::{
    AnalysisInput, CompiledArtifact, Diagnostic, ResolverConfig, TraceAnalyzer, TxAnalysis,
    decode::RevertReason, sourcemap::SourceLocation, traces::RawTrace,
};
use postmortem_test_utils::{COUNTER_SOURCE, TraceBuilder, encode_source_map, init_tracing};

fn analyze(
    trace: &RawTrace,
    artifact: &CompiledArtifact,
    onchain_code: Option<&[u8]>,
) -> TxAnalysis {
    init_tracing();
    TraceAnalyzer::default()
        .analyze(&AnalysisInput { trace, artifact, source: COUNTER_SOURCE, onchain_code })
        .unwrap()
}

#[test]
fn resolves_failing_require() {
    let analysis = analyze(&reverting_trace(), &counter_artifact(), None);
    assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);

    let revert = &analysis.revert;
    assert!(!revert.success);
    assert_eq!(revert.reason, Some(RevertReason::Error { message: "bad input".to_string() }));
    assert_eq!((revert.step_index, revert.pc), (Some(5), Some(8)));

    let resolved = revert.location.as_ref().unwrap();
    similar_asserts::assert_eq!(
        resolved.location,
        SourceLocation { line: 9, column: 9, snippet: "require(x > 0);".to_string() }
    );
    let function = resolved.function.as_ref().unwrap();
    assert_eq!(function.name, "foo");
    assert_eq!((function.start_line, function.end_line, function.target_line), (7, 10, 9));
    assert!(function.contains_target());
    assert!(function.code.contains("require(x > 0);"));
}

#[test]
fn decodes_storage_changes() {
    let analysis = analyze(&reverting_trace(), &counter_artifact(), None);
    assert_eq!(analysis.steps.len(), 6);
    assert_eq!(analysis.storage_changes.len(), 1);

    let decoded = &analysis.storage_changes[0];
    assert_eq!(decoded.change.slot, B256::ZERO);
    assert_eq!(decoded.change.old_value, B256::ZERO);
    assert_eq!(decoded.change.new_value, B256::with_last_byte(1));
    assert_eq!(decoded.change.step_index, 2);
    assert_eq!(decoded.variables.len(), 1);
    assert_eq!(decoded.variables[0].label, "count");
    let count = &decoded.variables[0];
    assert_eq!((count.old_value.as_str(), count.new_value.as_str()), ("0", "1"));

    let mut artifact = counter_artifact();
    artifact.storage_layout = None;
    let analysis = analyze(&reverting_trace(), &artifact, None);
    assert!(analysis.storage_changes[0].variables.is_empty());
}

#[test]
fn walks_back_out_of_generated_code() {
    let trace = TraceBuilder::new()
        .step(0, "PUSH1", &[])
        .step(2, "PUSH1", &[1])
        .step(4, "SSTORE", &[1, 0])
        .step(9, "INVALID", &[])
        .failed(true)
        .build();
    let analysis = analyze(&trace, &counter_artifact(), None);

    assert_eq!(analysis.revert.pc, Some(9));
    assert_eq!(
        analysis.revert.reason,
        Some(RevertReason::Error { message: "Transaction reverted".to_string() })
    );
    assert_eq!(analysis.revert.location.as_ref().map(|r| r.location.line), Some(9));
}

#[test]
fn generated_code_without_authored_neighbour_is_unresolved() {
    let mut artifact = counter_artifact();
    artifact.deployed_bytecode.as_mut().unwrap().source_map =
        Some(encode_source_map(&[(0, 0, 1); 8]));

    let analysis = analyze(&reverting_trace(), &artifact, None);
    assert_eq!(analysis.revert.location, None);
    assert!(analysis.has_diagnostic(&Diagnostic::UnresolvedPc { pc: 8 }));
    // everything else is still reported
    assert!(analysis.revert.reason.is_some());
    assert_eq!(analysis.storage_changes.len(), 1);
}

#[test]
fn empty_trace() {
    let analysis = analyze(&RawTrace::default(), &counter_artifact(), None);
    assert_eq!(analysis.diagnostics, [Diagnostic::EmptyTrace]);
    assert!(analysis.steps.is_empty());
    assert!(analysis.storage_changes.is_empty());
    assert!(analysis.revert.success);
    assert_eq!(analysis.revert.reason, None);

    let failed = RawTrace { failed: Some(true), ..Default::default() };
    let analysis = analyze(&failed, &counter_artifact(), None);
    assert_eq!(
        analysis.revert.reason.as_ref().map(RevertReason::message),
        Some("Transaction reverted")
    );
    assert_eq!(analysis.revert.location, None);
}

#[test]
fn successful_transaction_has_no_failure() {
    let trace =
        TraceBuilder::new().step(0, "PUSH1", &[]).step(2, "STOP", &[1]).failed(false).build();
    let analysis = analyze(&trace, &counter_artifact(), None);
    assert!(analysis.revert.success);
    assert_eq!(analysis.revert.reason, None);
    assert_eq!(analysis.revert.step_index, None);
    assert_eq!(analysis.revert.location, None);
    assert!(analysis.diagnostics.is_empty());
}

#[test]
fn missing_inputs_are_diagnosed() {
    let mut artifact = counter_artifact();
    artifact.deployed_bytecode.as_mut().unwrap().source_map = None;
    let analysis = analyze(&reverting_trace(), &artifact, None);
    assert_eq!(analysis.diagnostics, [Diagnostic::MissingSourceMap]);
    assert_eq!(analysis.revert.location, None);

    let artifact = CompiledArtifact::default();
    let analysis = analyze(&reverting_trace(), &artifact, None);
    assert_eq!(analysis.diagnostics, [Diagnostic::MissingBytecode]);

    let mut artifact = counter_artifact();
    let map = format!("{};x:1:0:-", counter_source_map());
    artifact.deployed_bytecode.as_mut().unwrap().source_map = Some(map);
    let analysis = analyze(&reverting_trace(), &artifact, None);
    assert!(matches!(analysis.diagnostics[..], [Diagnostic::MalformedSourceMap { entry: 8, .. }]));
    // the entries before the malformed one still resolve
    assert!(analysis.revert.location.is_some());
}

#[test]
fn prefers_onchain_code() {
    let artifact_code = hex::decode(COUNTER_CODE).unwrap();

    // same layout, different immediate
    let onchain = hex::decode("0x6002600055600080fdfe5b").unwrap();
    let analysis = analyze(&reverting_trace(), &counter_artifact(), Some(&onchain[..]));
    assert_eq!(
        analysis.diagnostics,
        [Diagnostic::BytecodeMismatch {
            artifact_hash: keccak256(&artifact_code),
            onchain_hash: keccak256(&onchain),
        }]
    );
    assert!(analysis.revert.location.is_some());

    // DUP1 replaced by DUP2
    let onchain = hex::decode("0x6001600055600081fdfe5b").unwrap();
    let analysis = analyze(&reverting_trace(), &counter_artifact(), Some(&onchain[..]));
    assert_eq!(analysis.diagnostics.len(), 2);
    assert_eq!(
        analysis.diagnostics[1],
        Diagnostic::OpcodeMismatch {
            pc: 7,
            traced: "DUP1".to_string(),
            disassembled: "DUP2".to_string()
        }
    );

    let analysis = analyze(&reverting_trace(), &counter_artifact(), Some(&artifact_code[..]));
    assert!(analysis.diagnostics.is_empty());
}

#[test]
fn nested_frames_are_not_resolved() {
    let trace = TraceBuilder::new()
        .step(0, "PUSH1", &[])
        .step(2, "PUSH1", &[1])
        .depth(2)
        .step(0, "PUSH1", &[])
        .step(2, "REVERT", &[0, 0])
        .depth(1)
        .step(8, "REVERT", &[0, 0])
        .failed(true)
        .build();
    let analysis = analyze(&trace, &counter_artifact(), None);
    assert_eq!(analysis.revert.step_index, Some(4));
    assert_eq!(analysis.revert.location.as_ref().map(|r| r.location.line), Some(9));
    assert!(analysis.diagnostics.is_empty());
}

#[test]
fn plain_reason_and_unknown_payloads() {
    let mut trace = reverting_trace();
    trace.return_value = Some("0xdeadbeef".to_string());
    let analysis = analyze(&trace, &counter_artifact(), None);
    assert_eq!(
        analysis.revert.reason,
        Some(RevertReason::Raw { payload_hex: "0xdeadbeef".to_string() })
    );

    trace.revert_reason = Some("Ownable: caller is not the owner".to_string());
    let analysis = analyze(&trace, &counter_artifact(), None);
    assert_eq!(
        analysis.revert.reason.as_ref().map(RevertReason::message),
        Some("Ownable: caller is not the owner")
    );

    trace.return_value = Some("not hex".to_string());
    trace.revert_reason = None;
    let analysis = analyze(&trace, &counter_artifact(), None);
    assert_eq!(
        analysis.revert.reason.as_ref().map(RevertReason::message),
        Some("Transaction reverted")
    );
}

#[test]
fn respects_config() {
    let config = ResolverConfig {
        function_context: false,
        generic_revert_message: "execution failed".to_string(),
        ..Default::default()
    };
    let mut analyzer = TraceAnalyzer::new(config);
    let trace = RawTrace { return_value: None, ..reverting_trace() };
    let artifact = counter_artifact();
    let input = AnalysisInput {
        trace: &trace,
        artifact: &artifact,
        source: COUNTER_SOURCE,
        onchain_code: None,
    };

    let analysis = analyzer.analyze(&input).unwrap();
    assert_eq!(
        analysis.revert.reason.as_ref().map(RevertReason::message),
        Some("execution failed")
    );
    let resolved = analysis.revert.location.unwrap();
    assert_eq!(resolved.location.line, 9);
    assert_eq!(resolved.function, None);

    // analyzing again reuses the cached context and yields the same result
    let again = analyzer.analyze(&input).unwrap();
    assert_eq!(again.revert.location.map(|r| r.location.line), Some(9));
}

#[test]
fn invalid_inputs_fail() {
    let trace = TraceBuilder::new().step_hex(0, "POP", &["0xnothex"]).failed(true).build();
    let err = TraceAnalyzer::default()
        .analyze(&AnalysisInput {
            trace: &trace,
            artifact: &counter_artifact(),
            source: COUNTER_SOURCE,
            onchain_code: None,
        })
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid trace");
    assert!(err.chain().any(|cause| cause.to_string().contains("step 0")), "{err:?}");

    let mut artifact = counter_artifact();
    artifact.deployed_bytecode.as_mut().unwrap().object = "0xzz".to_string();
    let err = TraceAnalyzer::default()
        .analyze(&AnalysisInput {
            trace: &reverting_trace(),
            artifact: &artifact,
            source: COUNTER_SOURCE,
            onchain_code: None,
        })
        .unwrap_err();
    assert!(err.to_string().contains("bytecode"), "{err}");
}

#[test]
fn invalid_artifact_bytecode_falls_back_to_onchain_code() {
    let mut artifact = counter_artifact();
    artifact.deployed_bytecode.as_mut().unwrap().object = "0xzz".to_string();
    let onchain = hex::decode(COUNTER_CODE).unwrap();
    let analysis = analyze(&reverting_trace(), &artifact, Some(&onchain[..]));

    assert!(
        matches!(analysis.diagnostics[..], [Diagnostic::InvalidArtifactBytecode { .. }]),
        "{:?}",
        analysis.diagnostics
    );
    assert_eq!(analysis.revert.location.as_ref().map(|r| r.location.line), Some(9));
    assert_eq!(
        analysis.revert.reason,
        Some(RevertReason::Error { message: "bad input".to_string() })
    );
    assert_eq!(analysis.storage_changes.len(), 1);
}

#[test]
fn serializes_analysis() {
    let analysis = analyze(&reverting_trace(), &counter_artifact(), None);
    let json = serde_json::to_value(&analysis).unwrap();
    assert_eq!(json["revert"]["reason"]["kind"], "error");
    assert_eq!(json["revert"]["location"]["location"]["line"], 9);
    assert_eq!(json["revert"]["location"]["function"]["name"], "foo");
    assert_eq!(json["storageChanges"][0]["variables"][0]["newValue"], "1");
    assert_eq!(json["steps"][2]["storageWrite"]["value"], format!("0x{:064x}", 1));
}
