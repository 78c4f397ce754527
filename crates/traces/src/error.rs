use alloy_primitives::hex;
use postmortem_common::WordError;

/// Errors raised while validating a raw trace.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TraceError {
    /// A stack item is not a valid 32-byte word.
    #[error("step {step}: invalid stack item {position}: {source}")]
    InvalidStackWord {
        /// Index of the offending step.
        step: usize,
        /// Position of the item, counted from the bottom of the stack.
        position: usize,
        /// Underlying error.
        #[source]
        source: WordError,
    },
    /// A memory word is not valid hex.
    #[error("step {step}: invalid memory word {position}: {source}")]
    InvalidMemory {
        /// Index of the offending step.
        step: usize,
        /// Index of the memory word.
        position: usize,
        /// Underlying error.
        #[source]
        source: hex::FromHexError,
    },
    /// The transaction's return value is not valid hex.
    #[error("invalid return value: {source}")]
    InvalidReturnValue {
        /// Underlying error.
        #[source]
        source: hex::FromHexError,
    },
}
