use alloy_primitives::B256;
use serde::Serialize;
use std::fmt;

/// A non-fatal problem found while analyzing a transaction.
///
/// Diagnostics explain why parts of an analysis are missing or may be unreliable; the rest of
/// the analysis is still produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// The trace has no steps.
    EmptyTrace,
    /// Neither the artifact nor the caller supplied bytecode.
    MissingBytecode,
    /// The on-chain code differs from the artifact's runtime bytecode.
    #[serde(rename_all = "camelCase")]
    BytecodeMismatch { artifact_hash: B256, onchain_hash: B256 },
    /// The artifact's bytecode could not be decoded, so the on-chain code was used.
    InvalidArtifactBytecode { reason: String },
    /// A traced opcode differs from the instruction at the same pc of the resolved bytecode.
    OpcodeMismatch { pc: u32, traced: String, disassembled: String },
    /// The artifact has no runtime source map.
    MissingSourceMap,
    /// The source map stopped decompressing at `entry`.
    MalformedSourceMap { entry: usize, reason: String },
    /// The failing pc could not be attributed to authored source.
    UnresolvedPc { pc: u32 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTrace => f.write_str("trace contains no steps"),
            Self::MissingBytecode => f.write_str("no bytecode to resolve against"),
            Self::BytecodeMismatch { artifact_hash, onchain_hash } => write!(
                f,
                "on-chain code {onchain_hash} does not match artifact bytecode {artifact_hash}"
            ),
            Self::InvalidArtifactBytecode { reason } => {
                write!(f, "ignoring invalid artifact bytecode: {reason}")
            }
            Self::OpcodeMismatch { pc, traced, disassembled } => {
                write!(f, "traced {traced} at pc {pc}, but bytecode has {disassembled}")
            }
            Self::MissingSourceMap => f.write_str("artifact has no runtime source map"),
            Self::MalformedSourceMap { entry, reason } => {
                write!(f, "source map truncated at entry {entry}: {reason}")
            }
            Self::UnresolvedPc { pc } => write!(f, "pc {pc} does not map to authored source"),
        }
    }
}
