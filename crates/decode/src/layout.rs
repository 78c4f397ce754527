//! The `storageLayout` output of solc.

use alloy_primitives::U256;
use postmortem_common::WORD_LEN;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};

/// Storage layout of a contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLayout {
    /// State variables in declaration order.
    #[serde(default)]
    pub storage: Vec<StorageVariable>,
    /// Type descriptions, keyed by type identifier such as `t_uint256`.
    #[serde(default, deserialize_with = "nullable_types")]
    pub types: BTreeMap<String, StorageTypeInfo>,
}

/// A state variable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageVariable {
    #[serde(default)]
    pub ast_id: u64,
    #[serde(default)]
    pub contract: String,
    pub label: String,
    /// Byte offset inside the slot, counted from the least significant end.
    #[serde(default)]
    pub offset: u32,
    /// The slot as a decimal string.
    pub slot: String,
    /// Type identifier, a key of [`StorageLayout::types`].
    #[serde(rename = "type")]
    pub storage_type: String,
}

impl StorageVariable {
    /// Parses [`StorageVariable::slot`]; accepts decimal and `0x` prefixed hex.
    pub fn slot(&self) -> Option<U256> {
        U256::from_str(self.slot.trim()).ok()
    }
}

/// A type description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageTypeInfo {
    #[serde(default)]
    pub encoding: String,
    /// Human readable type name, such as `uint256` or `contract Token`.
    pub label: String,
    /// Size in bytes as a decimal string.
    pub number_of_bytes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl StorageTypeInfo {
    /// Parses [`StorageTypeInfo::number_of_bytes`].
    pub fn size(&self) -> Option<usize> {
        self.number_of_bytes.trim().parse().ok()
    }
}

impl StorageLayout {
    /// Returns the variables that live in `slot`.
    pub fn variables_at(&self, slot: U256) -> impl Iterator<Item = &StorageVariable> {
        self.storage.iter().filter(move |var| var.slot() == Some(slot))
    }

    /// Returns the description of `var`'s type.
    pub fn type_of(&self, var: &StorageVariable) -> Option<&StorageTypeInfo> {
        self.types.get(&var.storage_type)
    }

    /// Returns the human readable type name of `var`, falling back to its type identifier.
    pub fn type_label<'a>(&'a self, var: &'a StorageVariable) -> &'a str {
        self.type_of(var).map_or(var.storage_type.as_str(), |ty| ty.label.as_str())
    }

    /// Returns the number of bytes `var` occupies inside its slot.
    ///
    /// Types of unknown size, and types spanning more than one slot, occupy the remainder of
    /// the slot.
    pub fn packed_size(&self, var: &StorageVariable) -> usize {
        let rest = WORD_LEN.saturating_sub(var.offset as usize);
        self.type_of(var).and_then(StorageTypeInfo::size).map_or(rest, |size| size.min(rest))
    }
}

fn nullable_types<'de, D>(deserializer: D) -> Result<BTreeMap<String, StorageTypeInfo>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, StorageTypeInfo>>::deserialize(deserializer)?.unwrap_or_default())
}
