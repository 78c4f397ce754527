//! # postmortem-traces
//!
//! Step trace normalization and storage diffs.

#![warn(unused_crate_dependencies)]

#[macro_use]
extern crate tracing;

mod error;
pub use error::TraceError;

pub mod normalize;
pub mod raw;
pub mod step;
pub mod storage;

pub use normalize::{normalize_steps, normalize_trace};
pub use raw::{RawStructLog, RawTrace};
pub use step::{ExecutionStep, StorageWrite};
pub use storage::{StorageChange, extract_storage_changes};
