//! End-to-end checks of the individual building blocks through the public API.

use crate::utils::{COUNTER_CODE, counter_source_map};
use alloy_primitives::{B256, U256, hex};
use postmortem::{
    ResolverConfig,
    decode::{RevertReason, decode_revert_hex, decode_storage_value},
    sourcemap::{PcIcMap, ResolutionContext, SourceMap, SourceMapEntry, build_pc_ic_map},
    traces::{StorageChange, extract_storage_changes, normalize_trace},
};
use postmortem_test_utils::{COUNTER_SOURCE, TraceBuilder, encode_source_map, init_tracing};

#[test]
fn instruction_table_skips_immediates() {
    // PUSH1 0x01, PUSH2 0x0203, STOP
    let map = build_pc_ic_map(&hex::decode("0x600161020300").unwrap());
    similar_asserts::assert_eq!(map, PcIcMap::from([(0, 0), (2, 1), (5, 2)]));
}

#[test]
fn source_map_inherits_empty_entries() {
    let map = SourceMap::parse("10:5:0:-;;20:3:0:-");
    let ranges = map
        .entries()
        .iter()
        .map(|SourceMapEntry { start, length, file_index, .. }| (*start, *length, *file_index))
        .collect::<Vec<_>>();
    assert_eq!(ranges, [(10, 5, Some(0)), (10, 5, Some(0)), (20, 3, Some(0))]);
}

#[test]
fn storage_change_old_value_from_sload() {
    let filler = |builder: TraceBuilder, pc: u32| builder.step(pc, "JUMPDEST", &[]);
    let mut builder = TraceBuilder::new();
    for pc in 0..4 {
        builder = filler(builder, pc);
    }
    builder = builder.step(4, "SLOAD", &[1]).step(5, "PUSH1", &[7]);
    for pc in 6..9 {
        builder = filler(builder, pc);
    }
    let trace = builder.step(9, "SSTORE", &[9, 1]).build();

    let steps = normalize_trace(&trace).unwrap();
    assert_eq!(steps.len(), 10);
    similar_asserts::assert_eq!(
        extract_storage_changes(&steps),
        vec![StorageChange {
            slot: B256::with_last_byte(1),
            old_value: B256::with_last_byte(7),
            new_value: B256::with_last_byte(9),
            step_index: 9,
        }]
    );
}

#[test]
fn revert_payloads() {
    let panic = format!("0x4e487b71{:064x}", 0x11);
    let reason = decode_revert_hex(&panic, None, "generic");
    assert!(matches!(reason, RevertReason::Panic { code: 0x11, .. }));
    assert!(reason.message().contains("overflow"));

    let error = postmortem_test_utils::error_payload("bad input");
    assert_eq!(
        decode_revert_hex(&error, None, "generic"),
        RevertReason::Error { message: "bad input".to_string() }
    );
}

#[test]
fn storage_values() {
    assert_eq!(decode_storage_value(&B256::ZERO, "bool"), "false");
    assert_eq!(decode_storage_value(&B256::ZERO, "uint256"), "0");

    let mut hi = B256::ZERO;
    hi[..2].copy_from_slice(b"hi");
    hi[31] = 4;
    assert_eq!(decode_storage_value(&hi, "string"), "\"hi\"");

    let max = B256::from(U256::MAX.to_be_bytes::<32>());
    assert_eq!(decode_storage_value(&max, "uint256"), U256::MAX.to_string());
}

#[test]
fn function_context_of_require() {
    init_tracing();
    let code = hex::decode(COUNTER_CODE).unwrap();
    let context = ResolutionContext::new(
        &code,
        &counter_source_map(),
        COUNTER_SOURCE,
        &ResolverConfig::default(),
    );

    let resolved = context.resolve_with_function(8).unwrap();
    assert_eq!(resolved.location.snippet, "require(x > 0);");
    let function = resolved.function.unwrap();
    assert_eq!(function.name, "foo");
    assert!(function.start_line <= resolved.location.line);
    assert!(function.end_line >= resolved.location.line);
    assert_eq!((function.start_line, function.end_line), (7, 10));
    assert!(function.code.starts_with("    function foo() external {"));
    assert!(function.code.contains("require(x > 0);"));

    // the SSTORE belongs to `increment`
    let resolved = context.resolve_with_function(4).unwrap();
    assert_eq!(resolved.location.line, 13);
    assert_eq!(resolved.function.map(|f| f.name), Some("increment".to_string()));
}

#[test]
fn synthetic_code_resolves_only_within_lookback() {
    init_tracing();
    // 30 JUMPDESTs: only the first maps to authored source
    let code = [0x5bu8; 30];
    let require = COUNTER_SOURCE.find("require(x > 0)").unwrap() as i64;
    let mut entries = vec![(require, 14, 0)];
    entries.extend([(0, 0, 1); 29]);
    let context = ResolutionContext::new(
        &code,
        &encode_source_map(&entries),
        COUNTER_SOURCE,
        &ResolverConfig::default(),
    );

    assert_eq!(context.resolve(0).map(|l| l.line), Some(9));
    assert_eq!(context.resolve(20).map(|l| l.line), Some(9));
    // 21 instructions after the last authored one
    assert_eq!(context.resolve(21), None);
    assert_eq!(context.resolve(29), None);
    assert_eq!(context.resolve(30), None);

    let narrow = ResolverConfig { synthetic_lookback: 3, ..Default::default() };
    let context =
        ResolutionContext::new(&code, &encode_source_map(&entries), COUNTER_SOURCE, &narrow);
    assert_eq!(context.resolve(3).map(|l| l.line), Some(9));
    assert_eq!(context.resolve(4), None);
}
