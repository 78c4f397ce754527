//! # postmortem
//!
//! Reconstructs the source-level context of a failed EVM transaction from its step trace, the
//! compiler artifact of the called contract and its source: the authored line and function the
//! failure happened in, the decoded revert reason and the storage writes leading up to it.
//!
//! ```no_run
//! use postmortem::{
//!     AnalysisInput, ResolverConfig, TraceAnalyzer, load_artifact, load_source, load_trace,
//! };
//!
//! # fn main() -> eyre::Result<()> {
//! let trace = load_trace("trace.json")?;
//! let artifact = load_artifact("out/Token.sol/Token.json")?;
//! let source = load_source("src/Token.sol")?;
//!
//! let mut analyzer = TraceAnalyzer::new(ResolverConfig::load());
//! let analysis = analyzer.analyze(&AnalysisInput {
//!     trace: &trace,
//!     artifact: &artifact,
//!     source: &source,
//!     onchain_code: None,
//! })?;
//! if let Some(location) = &analysis.revert.location {
//!     println!("reverted at {}", location.location);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unused_crate_dependencies)]

#[macro_use]
extern crate tracing;

mod analyzer;
pub use analyzer::{AnalysisInput, RevertInfo, TraceAnalyzer, TxAnalysis, failure_step};

mod artifact;
pub use artifact::{CompiledArtifact, DeployedBytecode};

mod diagnostic;
pub use diagnostic::Diagnostic;

mod load;
pub use load::{load_artifact, load_source, load_trace};

pub use postmortem_common as common;
pub use postmortem_config::{self as config, ResolverConfig};
pub use postmortem_decode as decode;
pub use postmortem_sourcemap as sourcemap;
pub use postmortem_traces as traces;

