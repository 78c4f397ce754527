use crate::resolver::ResolutionContext;
use alloy_primitives::{B256, keccak256, map::B256HashMap};
use postmortem_config::ResolverConfig;
use std::sync::Arc;

/// Resolution contexts keyed by the keccak256 hash of the bytecode they were built from.
///
/// Program counters of different bytecodes collide, so every context is looked up by the code
/// that was actually executing. A cache belongs to a single analysis; concurrent analyses each
/// own their cache.
#[derive(Debug, Default)]
pub struct ContextCache {
    contexts: B256HashMap<Arc<ResolutionContext>>,
}

impl ContextCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the context for `code`, building it from `source_map` and `source` on first use.
    ///
    /// Later calls for the same code return the cached context regardless of the other
    /// arguments.
    pub fn get_or_build(
        &mut self,
        code: &[u8],
        source_map: &str,
        source: &str,
        config: &ResolverConfig,
    ) -> Arc<ResolutionContext> {
        let code_hash = keccak256(code);
        self.contexts
            .entry(code_hash)
            .or_insert_with(|| {
                debug!(%code_hash, "building resolution context");
                Arc::new(ResolutionContext::new(code, source_map, source, config))
            })
            .clone()
    }

    /// Returns the context built for the code with hash `code_hash`.
    pub fn get(&self, code_hash: &B256) -> Option<Arc<ResolutionContext>> {
        self.contexts.get(code_hash).cloned()
    }

    /// Number of cached contexts.
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
