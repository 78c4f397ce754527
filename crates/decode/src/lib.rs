//! # postmortem-decode
//!
//! Decoding of revert payloads and raw storage words.

#![warn(unused_crate_dependencies)]

#[macro_use]
extern crate tracing;

pub mod layout;
pub mod revert;
pub mod storage;

pub use layout::{StorageLayout, StorageTypeInfo, StorageVariable};
pub use revert::{RevertReason, decode_revert, decode_revert_hex, panic_message, revert_reason};
pub use storage::{
    DecodedStorageChange, DecodedVariable, StorageType, decode_storage_changes,
    decode_storage_value,
};
