//! Source, source map and trace fixtures.

use alloy_primitives::{U256, hex};
use postmortem_traces::{RawStructLog, RawTrace};

/// A small contract whose lines are referenced by the tests.
///
/// `foo` spans lines 7 to 10 with its `require` on line 9, and `increment` spans lines 12 to 15.
pub const COUNTER_SOURCE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.20;

contract Counter {
    uint256 public count;

    function foo() external {
        uint x = 1;
        require(x > 0);
    }

    function increment(uint256 by) external {
        count = count + by;
        require(count < 10, "too big");
    }
}
"#;

/// Returns the byte offset of the first occurrence of `needle` in `source`.
///
/// # Panics
///
/// Panics if `needle` does not occur.
pub fn offset_of(source: &str, needle: &str) -> usize {
    source.find(needle).unwrap_or_else(|| panic!("{needle:?} not found in source"))
}

/// Writes `(start, length, file)` triples as an uncompressed solc source map.
pub fn encode_source_map(entries: &[(i64, i64, i64)]) -> String {
    entries
        .iter()
        .map(|(start, length, file)| format!("{start}:{length}:{file}:-"))
        .collect::<Vec<_>>()
        .join(";")
}

/// ABI encodes `Error(reason)` as `0x` prefixed hex.
pub fn error_payload(reason: &str) -> String {
    let mut payload = hex!("08c379a0").to_vec();
    payload.extend_from_slice(&U256::from(32).to_be_bytes::<32>());
    payload.extend_from_slice(&U256::from(reason.len()).to_be_bytes::<32>());
    payload.extend_from_slice(reason.as_bytes());
    payload.resize(payload.len() + (32 - reason.len() % 32) % 32, 0);
    hex::encode_prefixed(payload)
}

/// Builds [`RawTrace`]s step by step. Every step consumes 3 gas.
#[derive(Clone, Debug)]
pub struct TraceBuilder {
    logs: Vec<RawStructLog>,
    gas: u64,
    depth: u32,
    trace: RawTrace,
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self { logs: Vec::new(), gas: 100_000, depth: 1, trace: RawTrace::default() }
    }

    /// Sets the call depth of the following steps.
    pub fn depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    /// Adds a step whose stack holds `stack`, bottom first.
    pub fn step(self, pc: u32, op: &str, stack: &[u64]) -> Self {
        let stack = stack.iter().map(|word| format!("{word:#x}")).collect();
        self.step_with(pc, op, stack)
    }

    /// Adds a step with a stack of raw hex words.
    pub fn step_hex(self, pc: u32, op: &str, stack: &[&str]) -> Self {
        let stack = stack.iter().map(ToString::to_string).collect();
        self.step_with(pc, op, stack)
    }

    fn step_with(mut self, pc: u32, op: &str, stack: Vec<String>) -> Self {
        self.logs.push(RawStructLog {
            pc,
            op: op.to_string(),
            gas: self.gas,
            gas_cost: None,
            stack,
            memory: None,
            depth: self.depth,
        });
        self.gas = self.gas.saturating_sub(3);
        self
    }

    pub fn failed(mut self, failed: bool) -> Self {
        self.trace.failed = Some(failed);
        self
    }

    pub fn return_value(mut self, value: impl Into<String>) -> Self {
        self.trace.return_value = Some(value.into());
        self
    }

    pub fn revert_reason(mut self, reason: impl Into<String>) -> Self {
        self.trace.revert_reason = Some(reason.into());
        self
    }

    pub fn build(self) -> RawTrace {
        RawTrace { struct_logs: self.logs, ..self.trace }
    }
}
