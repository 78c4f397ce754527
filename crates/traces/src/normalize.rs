use crate::{
    error::TraceError,
    raw::{RawStructLog, RawTrace},
    step::{ExecutionStep, SSTORE, StorageWrite},
};
use alloy_primitives::{Bytes, hex};
use postmortem_common::{WORD_LEN, normalize_word};

/// Normalizes every step of `trace`, see [`normalize_steps`].
pub fn normalize_trace(trace: &RawTrace) -> Result<Vec<ExecutionStep>, TraceError> {
    normalize_steps(&trace.struct_logs)
}

/// Converts raw struct logs into [`ExecutionStep`]s.
///
/// The output has exactly one step per input log, in the same order. Gas costs missing from
/// the input are derived from the difference in remaining gas to the previous step; the first
/// step then costs 0. `SSTORE` steps carry the slot and value they write.
///
/// Every stack and memory word is validated; the first invalid one fails the whole trace.
pub fn normalize_steps(logs: &[RawStructLog]) -> Result<Vec<ExecutionStep>, TraceError> {
    let mut steps = Vec::with_capacity(logs.len());
    let mut prev_gas = None;
    for (idx, log) in logs.iter().enumerate() {
        let stack = log
            .stack
            .iter()
            .enumerate()
            .map(|(position, word)| {
                normalize_word(word)
                    .map_err(|source| TraceError::InvalidStackWord { step: idx, position, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let memory = log.memory.as_deref().map(|words| decode_memory(idx, words)).transpose()?;

        let gas_cost = log.gas_cost.unwrap_or_else(|| {
            prev_gas.map_or(0, |prev: u64| prev.saturating_sub(log.gas))
        });
        prev_gas = Some(log.gas);

        let mut step = ExecutionStep {
            index: idx as u32,
            pc: log.pc,
            op: log.op.clone(),
            gas_remaining: log.gas,
            gas_cost,
            stack,
            memory,
            storage_write: None,
            depth: log.depth,
        };
        if step.is_op(SSTORE) {
            step.storage_write = storage_write(&step);
        }
        steps.push(step);
    }
    trace!(steps = steps.len(), "normalized trace");
    Ok(steps)
}

/// `SSTORE` pops the slot first and the value second.
fn storage_write(step: &ExecutionStep) -> Option<StorageWrite> {
    match (step.stack_peek(0), step.stack_peek(1)) {
        (Some(slot), Some(value)) => Some(StorageWrite { slot: *slot, value: *value }),
        _ => {
            warn!(step = step.index, depth = step.stack.len(), "SSTORE with a short stack");
            None
        }
    }
}

fn decode_memory(step: usize, words: &[String]) -> Result<Bytes, TraceError> {
    let mut memory = Vec::with_capacity(words.len() * WORD_LEN);
    for (position, word) in words.iter().enumerate() {
        let bytes = hex::decode(word)
            .map_err(|source| TraceError::InvalidMemory { step, position, source })?;
        memory.extend_from_slice(&bytes);
    }
    Ok(memory.into())
}
