//! Reading inputs from disk.

use crate::artifact::CompiledArtifact;
use eyre::{Result, WrapErr};
use postmortem_traces::RawTrace;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Reads a compiler artifact, see [`CompiledArtifact`].
pub fn load_artifact(path: impl AsRef<Path>) -> Result<CompiledArtifact> {
    read_json_file(path.as_ref()).wrap_err("failed to load compiler artifact")
}

/// Reads a step trace, either bare or wrapped in a JSON-RPC response's `result`.
pub fn load_trace(path: impl AsRef<Path>) -> Result<RawTrace> {
    let path = path.as_ref();
    let value: serde_json::Value = read_json_file(path).wrap_err("failed to load trace")?;
    let value = match value {
        serde_json::Value::Object(mut obj) if obj.contains_key("result") => {
            obj.remove("result").unwrap_or_default()
        }
        value => value,
    };
    serde_json::from_value(value)
        .wrap_err_with(|| format!("failed to deserialize trace {}", path.display()))
}

/// Reads a source file.
pub fn load_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read source file {}", path.display()))
}

fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .wrap_err_with(|| format!("failed to deserialize {}", path.display()))
}
