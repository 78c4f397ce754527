use crate::{
    function::{FunctionContext, extract_function_context},
    ic::{PcIcMap, build_pc_ic_map},
    source::{SourceLocation, SourceText},
    sourcemap::{SourceMap, SourceMapEntry},
};
use alloy_primitives::{B256, keccak256};
use postmortem_config::ResolverConfig;
use serde::Serialize;

/// A resolved location together with the function it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedLocation {
    /// Where in the authored source the instruction comes from.
    pub location: SourceLocation,
    /// The enclosing function, if one could be found.
    pub function: Option<FunctionContext>,
}

/// Everything needed to map program counters of one contract back to its authored source.
///
/// A context is built once per (bytecode, source map, source text) triple and never mutated.
/// Program counters are only meaningful for the bytecode the context was built from, so a
/// context must not be used to resolve steps executed by other code.
#[derive(Clone, Debug)]
pub struct ResolutionContext {
    code_hash: B256,
    pc_ic_map: PcIcMap,
    source_map: SourceMap,
    source: SourceText,
    synthetic_lookback: usize,
    neighbor_tolerance: usize,
    function_context: bool,
}

impl ResolutionContext {
    /// Disassembles `code`, decompresses `source_map` and indexes `source`.
    pub fn new(
        code: &[u8],
        source_map: &str,
        source: impl Into<String>,
        config: &ResolverConfig,
    ) -> Self {
        let code_hash = keccak256(code);
        let pc_ic_map = build_pc_ic_map(code);
        let source_map = SourceMap::parse(source_map);
        if pc_ic_map.len() != source_map.len() {
            debug!(
                %code_hash,
                instructions = pc_ic_map.len(),
                entries = source_map.len(),
                "source map does not cover bytecode exactly"
            );
        }
        Self {
            code_hash,
            pc_ic_map,
            source_map,
            source: SourceText::new(source),
            synthetic_lookback: config.synthetic_lookback,
            neighbor_tolerance: config.neighbor_tolerance,
            function_context: config.function_context,
        }
    }

    /// Returns the keccak256 hash of the bytecode this context was built from.
    pub fn code_hash(&self) -> B256 {
        self.code_hash
    }

    /// Returns the program counter to instruction counter table.
    pub fn pc_ic_map(&self) -> &PcIcMap {
        &self.pc_ic_map
    }

    /// Returns the decompressed source map.
    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Returns the indexed source text.
    pub fn source(&self) -> &SourceText {
        &self.source
    }

    /// Returns the instruction index of the instruction starting at `pc`.
    pub fn instruction_index(&self, pc: usize) -> Option<usize> {
        self.pc_ic_map.get(&pc).copied()
    }

    /// Returns the authored source map entry that `pc` is attributed to.
    ///
    /// This is the entry of the instruction itself, a nearby entry if the instruction has
    /// none, or for compiler-generated code the closest preceding authored entry.
    pub fn authored_entry(&self, pc: usize) -> Option<&SourceMapEntry> {
        let Some(ic) = self.instruction_index(pc) else {
            trace!(pc, "pc is not an instruction start");
            return None;
        };
        let (ic, entry) = self.entry_near(ic)?;
        if entry.is_authored() {
            return Some(entry);
        }
        let authored = self.authored_before(ic);
        if authored.is_none() {
            trace!(pc, ic, lookback = self.synthetic_lookback, "no authored code before synthetic");
        }
        authored
    }

    /// Resolves `pc` to a line in the authored source.
    ///
    /// Returns `None` when `pc` cannot be attributed to authored code; a location in
    /// compiler-generated code is never returned.
    pub fn resolve(&self, pc: usize) -> Option<SourceLocation> {
        let entry = self.authored_entry(pc)?;
        self.source.location(entry.start as usize)
    }

    /// Resolves `pc` and, if enabled, the function enclosing the resolved line.
    pub fn resolve_with_function(&self, pc: usize) -> Option<ResolvedLocation> {
        let location = self.resolve(pc)?;
        let function = if self.function_context {
            extract_function_context(&self.source, location.line as usize)
        } else {
            None
        };
        Some(ResolvedLocation { location, function })
    }

    /// Returns the entry for `ic`, or the closest entry within the neighbour tolerance,
    /// preferring the preceding one at equal distance.
    fn entry_near(&self, ic: usize) -> Option<(usize, &SourceMapEntry)> {
        if let Some(entry) = self.source_map.get(ic) {
            return Some((ic, entry));
        }
        (1..=self.neighbor_tolerance)
            .flat_map(|distance| [ic.checked_sub(distance), ic.checked_add(distance)])
            .flatten()
            .find_map(|neighbor| Some((neighbor, self.source_map.get(neighbor)?)))
    }

    /// Walks back from `ic` to the closest authored entry within the lookback bound.
    fn authored_before(&self, ic: usize) -> Option<&SourceMapEntry> {
        (1..=self.synthetic_lookback)
            .map_while(|distance| ic.checked_sub(distance))
            .filter_map(|idx| self.source_map.get(idx))
            .find(|entry| entry.is_authored())
    }
}
