//! Commonly used constants

/// The first four bytes of revert data identify the error being raised.
pub const SELECTOR_LEN: usize = 4;

/// Size in bytes of an EVM word, stack item or storage slot.
pub const WORD_LEN: usize = 32;

/// Length of a word when hex encoded without a prefix.
pub const WORD_HEX_LEN: usize = WORD_LEN * 2;

/// Default number of instructions to walk back from compiler-generated code when looking for an
/// authored source location.
pub const DEFAULT_SYNTHETIC_LOOKBACK: usize = 20;

/// Default distance, in instructions, searched around an instruction that has no source map
/// entry.
pub const DEFAULT_NEIGHBOR_TOLERANCE: usize = 5;

/// Message used when a failed transaction carries no decodable reason.
pub const GENERIC_REVERT_MESSAGE: &str = "Transaction reverted";
