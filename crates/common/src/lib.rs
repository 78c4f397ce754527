//! Common utilities for building and using the postmortem crates.

#![warn(missing_docs, unused_crate_dependencies)]

pub mod constants;
pub mod word;

pub use constants::*;
pub use word::{WordError, hex_word, normalize_word};
