//! The trace shape produced by a step-logging tracer such as geth's struct logger.
//!
//! These records are deserialized as-is and checked once by the normalizer; nothing past this
//! module sees unvalidated hex.

use crate::error::TraceError;
use alloy_primitives::{Bytes, hex};
use serde::{Deserialize, Deserializer, Serialize};

/// A single step as reported by the tracer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStructLog {
    /// Program counter.
    pub pc: u32,
    /// Opcode mnemonic.
    pub op: String,
    /// Gas remaining before the step.
    #[serde(deserialize_with = "quantity")]
    pub gas: u64,
    /// Gas charged for the step, if the tracer reports it.
    #[serde(
        default,
        deserialize_with = "optional_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas_cost: Option<u64>,
    /// Stack words, bottom first.
    #[serde(default)]
    pub stack: Vec<String>,
    /// Memory as 32-byte hex words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Vec<String>>,
    /// Call depth.
    pub depth: u32,
}

/// The full result of a step-logging trace of one transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrace {
    /// One entry per executed instruction.
    #[serde(default)]
    pub struct_logs: Vec<RawStructLog>,
    /// Return or revert data of the transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<String>,
    /// A plain revert reason reported by the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    /// Whether the transaction failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<bool>,
    /// Gas used by the transaction.
    #[serde(
        default,
        deserialize_with = "optional_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    pub gas: Option<u64>,
}

impl RawTrace {
    /// Returns true if no steps were recorded.
    pub fn is_empty(&self) -> bool {
        self.struct_logs.is_empty()
    }

    /// Decodes [`RawTrace::return_value`]; a missing value is empty.
    pub fn return_data(&self) -> Result<Bytes, TraceError> {
        match self.return_value.as_deref().map(str::trim) {
            None | Some("" | "0x") => Ok(Bytes::new()),
            Some(value) => hex::decode(value)
                .map(Into::into)
                .map_err(|source| TraceError::InvalidReturnValue { source }),
        }
    }

    /// Returns whether the transaction failed.
    ///
    /// When the tracer does not say, a trace whose last step is `REVERT` or `INVALID` is
    /// considered failed.
    pub fn is_failed(&self) -> bool {
        self.failed.unwrap_or_else(|| {
            self.struct_logs
                .last()
                .is_some_and(|log| matches!(log.op.as_str(), "REVERT" | "INVALID"))
        })
    }
}

/// Quantities are numbers for geth but hex strings for some other tracers.
#[derive(Deserialize)]
#[serde(untagged)]
enum Quantity {
    Number(u64),
    String(String),
}

impl Quantity {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::String(s) => match s.strip_prefix("0x") {
                Some(digits) => u64::from_str_radix(digits, 16),
                None => s.parse(),
            }
            .map_err(|err| E::custom(format!("invalid quantity `{s}`: {err}"))),
        }
    }
}

fn quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Quantity::deserialize(deserializer)?.into_u64()
}

fn optional_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    Option::<Quantity>::deserialize(deserializer)?.map(Quantity::into_u64).transpose()
}
