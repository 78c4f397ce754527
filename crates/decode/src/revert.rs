//! Classification of revert payloads.
//!
//! Decoding is best effort and never fails: anything that cannot be decoded degrades to the
//! plain reason reported by the node, the raw payload or a generic message.

use alloy_primitives::{U256, hex};
use alloy_sol_types::{Panic, Revert, SolError};
use postmortem_common::SELECTOR_LEN;
use serde::Serialize;
use std::fmt;

/// Message used for panic codes outside the known table.
pub const UNKNOWN_PANIC: &str = "Unknown panic";

/// Why a transaction failed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RevertReason {
    /// A `Panic(uint256)` raised by a compiler-inserted check.
    Panic {
        /// The panic code.
        code: u8,
        /// Description of the code.
        message: String,
    },
    /// An `Error(string)` raised by `require` or `revert`, or a plain reason from the node.
    Error {
        /// The reason string.
        message: String,
    },
    /// A payload that could not be classified, such as a custom error.
    Raw {
        /// The payload, `0x` prefixed.
        #[serde(rename = "payloadHex")]
        payload_hex: String,
    },
}

impl RevertReason {
    /// Returns a human readable message for the reason.
    pub fn message(&self) -> &str {
        match self {
            Self::Panic { message, .. } | Self::Error { message } => message,
            Self::Raw { payload_hex } => payload_hex,
        }
    }

    /// Returns true if this is a panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic { .. })
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panic { code, message } => write!(f, "panic: {message} ({code:#04x})"),
            Self::Error { message } => f.write_str(message),
            Self::Raw { payload_hex } => write!(f, "custom error {payload_hex}"),
        }
    }
}

/// Returns the description of a Solidity panic code.
pub fn panic_message(code: u8) -> &'static str {
    match code {
        0x00 => "Generic compiler panic",
        0x01 => "Assertion failed",
        0x11 => "Arithmetic overflow or underflow",
        0x12 => "Division or modulo by zero",
        0x21 => "Invalid enum value",
        0x22 => "Invalid storage byte array encoding",
        0x31 => "Pop on empty array",
        0x32 => "Array index out of bounds",
        0x41 => "Out of memory",
        0x51 => "Invalid internal function call",
        _ => UNKNOWN_PANIC,
    }
}

/// Classifies the revert payload of a failed call.
///
/// `Panic(uint256)` and `Error(string)` payloads are decoded. Anything else, including a
/// malformed payload behind one of those selectors, yields `plain_reason` if one was reported.
/// Otherwise an unknown non-empty payload is returned as [`RevertReason::Raw`] and everything
/// else becomes `generic_message`.
pub fn decode_revert(
    payload: &[u8],
    plain_reason: Option<&str>,
    generic_message: &str,
) -> RevertReason {
    let fallback = || match plain_reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => RevertReason::Error { message: reason.to_string() },
        None => RevertReason::Error { message: generic_message.to_string() },
    };

    if payload.len() < SELECTOR_LEN {
        if !payload.is_empty() {
            trace!(
                payload = %hex::encode_prefixed(payload),
                "revert payload shorter than a selector"
            );
        }
        return fallback();
    }

    let selector = &payload[..SELECTOR_LEN];
    if selector == Panic::SELECTOR {
        return match Panic::abi_decode(payload) {
            Ok(panic) => decode_panic_code(panic.code, payload),
            Err(err) => {
                debug!(%err, "malformed Panic(uint256) payload");
                fallback()
            }
        };
    }
    if selector == Revert::SELECTOR {
        return match Revert::abi_decode(payload) {
            Ok(revert) => RevertReason::Error { message: revert.reason },
            Err(err) => {
                debug!(%err, "malformed Error(string) payload");
                fallback()
            }
        };
    }

    match plain_reason.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reason) => RevertReason::Error { message: reason.to_string() },
        None => RevertReason::Raw { payload_hex: hex::encode_prefixed(payload) },
    }
}

/// Panic codes are a single byte in practice; wider values are not produced by solc and are
/// kept as raw payloads.
fn decode_panic_code(code: U256, payload: &[u8]) -> RevertReason {
    match u8::try_from(code) {
        Ok(code) => RevertReason::Panic { code, message: panic_message(code).to_string() },
        Err(_) => RevertReason::Raw { payload_hex: hex::encode_prefixed(payload) },
    }
}

/// Hex wrapper around [`decode_revert`]; the payload may carry a `0x` prefix and invalid hex is
/// treated as an empty payload.
pub fn decode_revert_hex(
    payload: &str,
    plain_reason: Option<&str>,
    generic_message: &str,
) -> RevertReason {
    let bytes = hex::decode(payload.trim()).unwrap_or_else(|err| {
        debug!(%err, "revert payload is not valid hex");
        Vec::new()
    });
    decode_revert(&bytes, plain_reason, generic_message)
}

/// Returns the reason a transaction failed, or `None` if it succeeded.
pub fn revert_reason(
    success: bool,
    payload: &[u8],
    plain_reason: Option<&str>,
    generic_message: &str,
) -> Option<RevertReason> {
    (!success).then(|| decode_revert(payload, plain_reason, generic_message))
}
