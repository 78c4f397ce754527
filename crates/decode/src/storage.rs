//! Human readable rendering of storage words.

use crate::layout::{StorageLayout, StorageVariable};
use alloy_primitives::{B256, U256, hex};
use postmortem_common::WORD_LEN;
use postmortem_traces::StorageChange;
use serde::Serialize;

/// Rendering of a long string, whose bytes live outside the slot.
pub const LONG_STRING: &str = "string (long)";

/// The decoding-relevant shape of a declared Solidity type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageType {
    String,
    /// Dynamic `bytes`.
    Bytes,
    /// Addresses and contracts.
    Address,
    Bool,
    /// Unsigned integers and enums, with their bit width.
    Uint(u16),
    /// Signed integers, with their bit width.
    Int(u16),
    /// `bytes1` to `bytes32`.
    FixedBytes(u8),
    /// Anything else, such as mappings, arrays and structs.
    Other(String),
}

impl StorageType {
    /// Parses a declared type, either a solc type identifier (`t_string_storage`) or a type
    /// label (`contract Token`).
    pub fn parse(declared: &str) -> Self {
        let ty = declared.trim();
        let ty = ty.strip_prefix("t_").unwrap_or(ty);
        let ty = ["_storage_ptr", "_storage", "_memory_ptr", "_calldata_ptr"]
            .iter()
            .find_map(|suffix| ty.strip_suffix(suffix))
            .unwrap_or(ty);

        if ty.ends_with(']') || ["array", "mapping", "struct"].iter().any(|p| ty.starts_with(p)) {
            return Self::Other(declared.to_string());
        }

        match ty {
            "string" => return Self::String,
            "bytes" => return Self::Bytes,
            "bool" => return Self::Bool,
            "address" | "address_payable" | "address payable" => return Self::Address,
            _ => {}
        }
        if ty.starts_with("contract") {
            return Self::Address;
        }
        if ty.starts_with("enum") {
            return Self::Uint(8);
        }
        if let Some(bits) = ty.strip_prefix("uint") {
            return int_width(bits).map_or_else(|| Self::Other(declared.to_string()), Self::Uint);
        }
        if let Some(bits) = ty.strip_prefix("int") {
            return int_width(bits).map_or_else(|| Self::Other(declared.to_string()), Self::Int);
        }
        if let Some(len) = ty.strip_prefix("bytes").and_then(|len| len.parse::<u8>().ok())
            && (1..=WORD_LEN as u8).contains(&len)
        {
            return Self::FixedBytes(len);
        }
        Self::Other(declared.to_string())
    }

    /// Renders `word` as a value of this type.
    ///
    /// Values are expected right-aligned in the word, the way they sit in storage.
    pub fn decode(&self, word: &B256) -> String {
        match self {
            Self::String => decode_short_string(word),
            Self::Address => hex::encode_prefixed(&word[WORD_LEN - 20..]),
            Self::Bool => (!word.is_zero()).to_string(),
            // the sign of `int` values is not recovered
            Self::Uint(_) | Self::Int(_) => U256::from_be_bytes(word.0).to_string(),
            Self::FixedBytes(len) => hex::encode_prefixed(&word[WORD_LEN - *len as usize..]),
            Self::Bytes | Self::Other(_) => hex::encode_prefixed(word),
        }
    }
}

fn int_width(bits: &str) -> Option<u16> {
    if bits.is_empty() {
        return Some(256);
    }
    bits.parse().ok().filter(|bits| *bits > 0 && *bits <= 256 && bits % 8 == 0)
}

/// Short strings keep their bytes left-aligned and `2 * len` in the lowest byte; long strings
/// store `2 * len + 1` and keep their bytes elsewhere.
fn decode_short_string(word: &B256) -> String {
    if word.is_zero() {
        return "\"\"".to_string();
    }
    let tag = word[WORD_LEN - 1] as usize;
    if tag == 0 || tag % 2 == 1 || tag > 2 * (WORD_LEN - 1) {
        return LONG_STRING.to_string();
    }
    let len = tag / 2;
    match std::str::from_utf8(&word[..len]) {
        Ok(s) => format!("\"{s}\""),
        Err(_) => hex::encode_prefixed(&word[..len]),
    }
}

/// Renders a raw storage word as a value of the declared type, see [`StorageType::parse`].
pub fn decode_storage_value(word: &B256, declared: &str) -> String {
    StorageType::parse(declared).decode(word)
}

/// A state variable touched by a storage change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedVariable {
    pub label: String,
    /// Human readable type name.
    #[serde(rename = "type")]
    pub type_label: String,
    pub old_value: String,
    pub new_value: String,
}

impl DecodedVariable {
    /// Returns true if the write changed this variable.
    pub fn is_changed(&self) -> bool {
        self.old_value != self.new_value
    }
}

/// A storage change annotated with the variables stored in its slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecodedStorageChange {
    #[serde(flatten)]
    pub change: StorageChange,
    pub variables: Vec<DecodedVariable>,
}

/// Annotates `changes` with the state variables `layout` places in each slot.
///
/// Packed variables are extracted from the word by offset and size before decoding. Slots
/// without a declared variable, such as mapping entries, get no annotations.
pub fn decode_storage_changes(
    changes: &[StorageChange],
    layout: &StorageLayout,
) -> Vec<DecodedStorageChange> {
    changes
        .iter()
        .map(|change| {
            let variables = layout
                .variables_at(change.slot_number())
                .map(|var| decode_variable(layout, var, change))
                .collect::<Vec<_>>();
            if variables.is_empty() {
                trace!(slot = %change.slot_hex(), "no declared variable in slot");
            }
            DecodedStorageChange { change: *change, variables }
        })
        .collect()
}

fn decode_variable(
    layout: &StorageLayout,
    var: &StorageVariable,
    change: &StorageChange,
) -> DecodedVariable {
    let type_label = layout.type_label(var);
    let ty = StorageType::parse(type_label);
    let size = layout.packed_size(var);
    let offset = var.offset as usize;
    DecodedVariable {
        label: var.label.clone(),
        type_label: type_label.to_string(),
        old_value: ty.decode(&extract(&change.old_value, offset, size)),
        new_value: ty.decode(&extract(&change.new_value, offset, size)),
    }
}

/// Extracts `size` bytes at byte `offset` from the least significant end of `word`, right
/// aligned.
fn extract(word: &B256, offset: usize, size: usize) -> B256 {
    if offset == 0 && size >= WORD_LEN {
        return *word;
    }
    if offset >= WORD_LEN || size == 0 {
        return B256::ZERO;
    }
    let shifted = U256::from_be_bytes(word.0) >> (offset * 8);
    let mask = U256::MAX >> ((WORD_LEN - size.min(WORD_LEN)) * 8);
    B256::from((shifted & mask).to_be_bytes::<32>())
}
