//! Fixtures and helpers shared by the postmortem tests.

#![warn(unused_crate_dependencies, unreachable_pub)]

pub mod fixtures;
pub use fixtures::{COUNTER_SOURCE, TraceBuilder, encode_source_map, error_payload, offset_of};

/// Initializes tracing for tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
