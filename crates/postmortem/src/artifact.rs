use alloy_primitives::Bytes;
use postmortem_decode::StorageLayout;
use postmortem_sourcemap::{BytecodeError, decode_bytecode_hex};
use serde::{Deserialize, Serialize};

/// The parts of a compiler artifact needed to analyze a transaction.
///
/// Unknown fields are ignored, so full solc or forge artifacts deserialize as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledArtifact {
    /// The layout of the contract's state variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_layout: Option<StorageLayout>,
    /// The runtime bytecode and its source map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_bytecode: Option<DeployedBytecode>,
}

/// Runtime bytecode as emitted by the compiler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployedBytecode {
    /// Hex encoded bytecode, possibly with unlinked library placeholders.
    #[serde(default)]
    pub object: String,
    /// Compressed source map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,
}

impl CompiledArtifact {
    /// Decodes the runtime bytecode; `None` if the artifact carries none.
    pub fn deployed_code(&self) -> Result<Option<Bytes>, BytecodeError> {
        match self.deployed_bytecode.as_ref().map(|code| code.object.trim()) {
            None | Some("" | "0x") => Ok(None),
            Some(object) => decode_bytecode_hex(object).map(Some),
        }
    }

    /// Returns the runtime source map, if present and non-empty.
    pub fn source_map(&self) -> Option<&str> {
        self.deployed_bytecode
            .as_ref()
            .and_then(|code| code.source_map.as_deref())
            .filter(|map| !map.trim().is_empty())
    }
}
