//! The `Counter` fixture: a runtime that writes slot 0 and reverts inside `foo`.

use postmortem::{CompiledArtifact, DeployedBytecode, traces::RawTrace};
use postmortem_test_utils::{
    COUNTER_SOURCE, TraceBuilder, encode_source_map, error_payload, offset_of,
};

/// `PUSH1 1, PUSH1 0, SSTORE, PUSH1 0, DUP1, REVERT, INVALID, JUMPDEST`
pub const COUNTER_CODE: &str = "0x6001600055600080fdfe5b";

/// Maps the `SSTORE` to line 13, the `REVERT` to the `require` on line 9 and the trailing two
/// instructions to compiler-generated code.
pub fn counter_source_map() -> String {
    let store = offset_of(COUNTER_SOURCE, "count = count + by") as i64;
    let require = offset_of(COUNTER_SOURCE, "require(x > 0)") as i64;
    encode_source_map(&[
        (store, 18, 0),
        (store, 18, 0),
        (store, 18, 0),
        (require, 14, 0),
        (require, 14, 0),
        (require, 14, 0),
        (0, 0, 1),
        (0, 0, 1),
    ])
}

pub fn counter_artifact() -> CompiledArtifact {
    CompiledArtifact {
        storage_layout: Some(
            serde_json::from_value(serde_json::json!({
                "storage": [
                    {
                        "astId": 2,
                        "contract": "src/Counter.sol:Counter",
                        "label": "count",
                        "offset": 0,
                        "slot": "0",
                        "type": "t_uint256"
                    }
                ],
                "types": {
                    "t_uint256": {"encoding": "inplace", "label": "uint256", "numberOfBytes": "32"}
                }
            }))
            .unwrap(),
        ),
        deployed_bytecode: Some(DeployedBytecode {
            object: COUNTER_CODE.to_string(),
            source_map: Some(counter_source_map()),
        }),
    }
}

/// Executes the whole runtime, failing at the `REVERT` with `Error("bad input")`.
pub fn reverting_trace() -> RawTrace {
    TraceBuilder::new()
        .step(0, "PUSH1", &[])
        .step(2, "PUSH1", &[1])
        .step(4, "SSTORE", &[1, 0])
        .step(5, "PUSH1", &[])
        .step(7, "DUP1", &[0])
        .step(8, "REVERT", &[0, 0])
        .failed(true)
        .return_value(error_payload("bad input"))
        .build()
}
