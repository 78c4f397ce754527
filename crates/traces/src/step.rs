use alloy_primitives::{B256, Bytes};
use serde::Serialize;

/// Mnemonic of the storage load opcode.
pub const SLOAD: &str = "SLOAD";
/// Mnemonic of the storage store opcode.
pub const SSTORE: &str = "SSTORE";
/// Mnemonic of the revert opcode.
pub const REVERT: &str = "REVERT";
/// Mnemonic of the designated invalid opcode.
pub const INVALID: &str = "INVALID";

/// A storage write captured from an `SSTORE` step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct StorageWrite {
    /// The slot being written.
    pub slot: B256,
    /// The value being written.
    pub value: B256,
}

/// A single executed instruction of a normalized trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStep {
    /// Position of the step in the trace, starting at 0.
    pub index: u32,
    /// Program counter of the instruction.
    pub pc: u32,
    /// Opcode mnemonic.
    pub op: String,
    /// Gas remaining before the instruction.
    pub gas_remaining: u64,
    /// Gas charged for the instruction.
    pub gas_cost: u64,
    /// Stack words, bottom first.
    pub stack: Vec<B256>,
    /// Memory before the instruction, if it was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Bytes>,
    /// The write performed by an `SSTORE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_write: Option<StorageWrite>,
    /// Call depth.
    pub depth: u32,
}

impl ExecutionStep {
    /// Returns true if this step executes `op`.
    #[inline]
    pub fn is_op(&self, op: &str) -> bool {
        self.op.eq_ignore_ascii_case(op)
    }

    /// Returns the `n`th stack item from the top, where 0 is the top.
    #[inline]
    pub fn stack_peek(&self, n: usize) -> Option<&B256> {
        self.stack.len().checked_sub(n + 1).map(|idx| &self.stack[idx])
    }

    /// Returns the top of the stack.
    #[inline]
    pub fn stack_top(&self) -> Option<&B256> {
        self.stack_peek(0)
    }

    /// Returns true if this step ends execution of its frame with a failure.
    pub fn is_failure(&self) -> bool {
        self.is_op(REVERT) || self.is_op(INVALID)
    }
}
