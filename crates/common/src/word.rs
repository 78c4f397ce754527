//! Normalization of hex-encoded EVM words.
//!
//! Tracers print stack items and storage keys in their shortest form (`0x1`), while storage
//! diffs must compare slots byte for byte. Everything that becomes a slot key or a stack word is
//! therefore routed through [`normalize_word`] first.

use crate::constants::WORD_HEX_LEN;
use alloy_primitives::{B256, hex};

/// Error returned when a string cannot be interpreted as a 32-byte word.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WordError {
    /// More than 64 hex digits were supplied.
    #[error("word `{0}` is longer than 32 bytes")]
    TooLong(String),
    /// The string contained a non-hex character.
    #[error("word `{word}` is not valid hex: {source}")]
    InvalidHex {
        /// The offending input.
        word: String,
        /// Underlying decoding error.
        #[source]
        source: hex::FromHexError,
    },
}

/// Parses a hex string, with or without `0x` and of any length up to 64 digits, into a
/// left-padded 32-byte word.
///
/// An empty string (or a bare `0x`) is the zero word.
pub fn normalize_word(s: &str) -> Result<B256, WordError> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.len() > WORD_HEX_LEN {
        return Err(WordError::TooLong(s.to_string()));
    }

    let padded = format!("{digits:0>width$}", width = WORD_HEX_LEN);
    let mut out = B256::ZERO;
    hex::decode_to_slice(&padded, out.as_mut_slice())
        .map_err(|source| WordError::InvalidHex { word: s.to_string(), source })?;
    Ok(out)
}

/// Formats a word as `0x` followed by exactly 64 lowercase hex digits.
pub fn hex_word(word: &B256) -> String {
    hex::encode_prefixed(word)
}
