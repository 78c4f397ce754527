use crate::{artifact::CompiledArtifact, diagnostic::Diagnostic};
use alloy_primitives::{Bytes, keccak256};
use eyre::{Result, WrapErr};
use itertools::Itertools;
use postmortem_config::ResolverConfig;
use postmortem_decode::{
    DecodedStorageChange, RevertReason, decode_storage_changes, revert_reason,
};
use postmortem_sourcemap::{ContextCache, ResolutionContext, ResolvedLocation, disassemble};
use postmortem_traces::{ExecutionStep, RawTrace, extract_storage_changes, normalize_trace};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything known about one transaction.
#[derive(Clone, Copy, Debug)]
pub struct AnalysisInput<'a> {
    /// The step trace of the transaction.
    pub trace: &'a RawTrace,
    /// The artifact of the contract the transaction called.
    pub artifact: &'a CompiledArtifact,
    /// The authored source the artifact was compiled from.
    pub source: &'a str,
    /// The code deployed at the called address, if known.
    pub onchain_code: Option<&'a [u8]>,
}

/// The outcome of a transaction and, for a failure, where it happened.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevertInfo {
    pub success: bool,
    /// Why the transaction failed; `None` on success.
    pub reason: Option<RevertReason>,
    /// Index of the step the failure is attributed to.
    pub step_index: Option<u32>,
    /// Program counter of that step.
    pub pc: Option<u32>,
    /// Where in the authored source the failure happened.
    pub location: Option<ResolvedLocation>,
}

/// The reconstructed context of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxAnalysis {
    pub steps: Vec<ExecutionStep>,
    /// Storage writes in step order, annotated with the variables they touch.
    pub storage_changes: Vec<DecodedStorageChange>,
    pub revert: RevertInfo,
    pub diagnostics: Vec<Diagnostic>,
}

impl TxAnalysis {
    /// Returns true if analyzing produced `diagnostic`.
    pub fn has_diagnostic(&self, diagnostic: &Diagnostic) -> bool {
        self.diagnostics.contains(diagnostic)
    }
}

/// Turns traces of transactions into [`TxAnalysis`]es.
///
/// Resolution tables are cached per bytecode, so analyzing many transactions against the same
/// contract with one analyzer only disassembles it once.
#[derive(Debug, Default)]
pub struct TraceAnalyzer {
    config: ResolverConfig,
    contexts: ContextCache,
}

impl TraceAnalyzer {
    /// Creates an analyzer with the given resolver settings.
    pub fn new(config: ResolverConfig) -> Self {
        Self { config, contexts: ContextCache::new() }
    }

    /// Returns the resolver settings.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Analyzes one transaction.
    ///
    /// Fails only if the trace is malformed, or the artifact's bytecode is and no on-chain code
    /// was supplied. Anything that merely
    /// limits the analysis, such as a missing source map, is reported as a [`Diagnostic`].
    pub fn analyze(&mut self, input: &AnalysisInput<'_>) -> Result<TxAnalysis> {
        let AnalysisInput { trace, artifact, source, onchain_code } = *input;
        let mut diagnostics = Vec::new();

        let steps = normalize_trace(trace).wrap_err("invalid trace")?;
        if steps.is_empty() {
            diagnostics.push(Diagnostic::EmptyTrace);
        }

        let changes = extract_storage_changes(&steps);
        let storage_changes = match &artifact.storage_layout {
            Some(layout) => decode_storage_changes(&changes, layout),
            None => changes
                .into_iter()
                .map(|change| DecodedStorageChange { change, variables: Vec::new() })
                .collect(),
        };

        let success = !trace.is_failed();
        let payload = trace.return_data().unwrap_or_else(|err| {
            warn!(%err, "ignoring undecodable return value");
            Bytes::new()
        });
        let reason = revert_reason(
            success,
            &payload,
            trace.revert_reason.as_deref(),
            &self.config.generic_revert_message,
        );

        let failure = if success { None } else { failure_step(&steps) };
        let mut revert = RevertInfo {
            success,
            reason,
            step_index: failure.map(|step| step.index),
            pc: failure.map(|step| step.pc),
            location: None,
        };

        if let Some(step) = failure {
            let artifact_code = match artifact.deployed_code() {
                Ok(code) => code,
                Err(err) if onchain_code.is_some() => {
                    warn!(%err, "resolving against on-chain code");
                    diagnostics
                        .push(Diagnostic::InvalidArtifactBytecode { reason: err.to_string() });
                    None
                }
                Err(err) => return Err(err).wrap_err("invalid deployed bytecode in artifact"),
            };
            if let (Some(artifact_code), Some(onchain)) = (&artifact_code, onchain_code) {
                let (artifact_hash, onchain_hash) = (keccak256(artifact_code), keccak256(onchain));
                if artifact_hash != onchain_hash {
                    warn!(%artifact_hash, %onchain_hash, "resolving against on-chain code");
                    diagnostics.push(Diagnostic::BytecodeMismatch { artifact_hash, onchain_hash });
                }
            }

            let code = onchain_code.or(artifact_code.as_ref().map(|code| &code[..]));
            match (code, artifact.source_map()) {
                (None, _) => diagnostics.push(Diagnostic::MissingBytecode),
                (Some(_), None) => diagnostics.push(Diagnostic::MissingSourceMap),
                (Some(code), Some(source_map)) => {
                    let context =
                        self.contexts.get_or_build(code, source_map, source, &self.config);
                    if let Some(err) = context.source_map().error() {
                        diagnostics.push(Diagnostic::MalformedSourceMap {
                            entry: err.entry,
                            reason: err.to_string(),
                        });
                    }
                    diagnostics.extend(opcode_mismatch(code, &steps, step.depth));

                    revert.location = context.resolve_with_function(step.pc as usize);
                    if revert.location.is_none() {
                        diagnostics.push(Diagnostic::UnresolvedPc { pc: step.pc });
                    }
                    trace_resolution(&context, step, revert.location.as_ref());
                }
            }
        }

        debug!(
            steps = steps.len(),
            changes = storage_changes.len(),
            success,
            diagnostics = diagnostics.len(),
            "analyzed transaction"
        );
        Ok(TxAnalysis { steps, storage_changes, revert, diagnostics })
    }
}

/// Returns the step a failure is attributed to: the last `REVERT` or `INVALID` in the
/// outermost frame, or the last step of that frame.
///
/// Only the outermost frame runs the artifact's code, so steps of nested calls are never
/// selected.
pub fn failure_step(steps: &[ExecutionStep]) -> Option<&ExecutionStep> {
    let outermost = steps.iter().map(|step| step.depth).min()?;
    steps
        .iter()
        .filter(|step| step.depth == outermost)
        .rev()
        .find_or_first(|step| step.is_failure())
}

/// Compares the traced opcodes of the frame at `depth` with the disassembly of `code`, and
/// reports the first disagreement.
fn opcode_mismatch(code: &[u8], steps: &[ExecutionStep], depth: u32) -> Option<Diagnostic> {
    let instructions =
        disassemble(code).into_iter().map(|inst| (inst.pc, inst)).collect::<BTreeMap<_, _>>();
    steps.iter().filter(|step| step.depth == depth).find_map(|step| {
        let disassembled = match instructions.get(&(step.pc as usize)) {
            Some(inst) => inst.mnemonic().unwrap_or("UNKNOWN"),
            None => "nothing",
        };
        (!step.is_op(disassembled)).then(|| Diagnostic::OpcodeMismatch {
            pc: step.pc,
            traced: step.op.clone(),
            disassembled: disassembled.to_string(),
        })
    })
}

fn trace_resolution(
    context: &ResolutionContext,
    step: &ExecutionStep,
    location: Option<&ResolvedLocation>,
) {
    match location {
        Some(resolved) => trace!(
            code_hash = %context.code_hash(),
            pc = step.pc,
            line = resolved.location.line,
            function = ?resolved.function.as_ref().map(|f| f.name.as_str()),
            "resolved failure"
        ),
        None => trace!(code_hash = %context.code_hash(), pc = step.pc, "failure is unresolved"),
    }
}
