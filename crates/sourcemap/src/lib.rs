//! # postmortem-sourcemap
//!
//! Maps program counters of a single contract back to its authored Solidity source.
//!
//! The bytecode is disassembled into a program counter to instruction counter table
//! ([`ic`]), solc's compressed source map is expanded to one entry per instruction
//! ([`sourcemap`]) and the source text is indexed by line ([`source`]). A
//! [`ResolutionContext`] combines the three and resolves program counters, walking back out of
//! compiler-generated code when needed. [`function`] recovers the function around a line.

#![warn(unused_crate_dependencies)]

#[macro_use]
extern crate tracing;

pub mod cache;
pub mod function;
pub mod ic;
pub mod resolver;
pub mod source;
pub mod sourcemap;

pub use cache::ContextCache;
pub use function::{FunctionContext, extract_function_context};
pub use ic::{
    BytecodeError, IcPcMap, Instruction, PcIcMap, build_ic_pc_map, build_pc_ic_map,
    decode_bytecode_hex, disassemble,
};
pub use resolver::{ResolutionContext, ResolvedLocation};
pub use source::{SourceLocation, SourceText};
pub use sourcemap::{
    AUTHORED_FILE_INDEX, Jump, SourceMap, SourceMapEntry, SourceMapError, parse_source_map,
};
