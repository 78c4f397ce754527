use crate::step::{ExecutionStep, SLOAD};
use alloy_primitives::{B256, U256, map::B256HashMap};
use postmortem_common::hex_word;
use serde::Serialize;

/// A single observed storage write, with the value the slot held before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    /// The slot written.
    pub slot: B256,
    /// The last value observed in the slot before the write, zero if none was observed.
    pub old_value: B256,
    /// The value written.
    pub new_value: B256,
    /// Index of the `SSTORE` step.
    pub step_index: u32,
}

impl StorageChange {
    /// The slot as a `0x` prefixed, 64 digit hex string.
    pub fn slot_hex(&self) -> String {
        hex_word(&self.slot)
    }

    /// The slot as an integer.
    pub fn slot_number(&self) -> U256 {
        U256::from_be_bytes(self.slot.0)
    }

    /// Returns true if the write left the slot unchanged.
    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}

/// Correlates storage reads and writes of a normalized trace into per-write diffs.
///
/// An `SLOAD` at step `i` observes the slot on top of its stack and the value on top of the
/// stack of step `i + 1`. Every step carrying a storage write then yields one
/// [`StorageChange`] whose old value is the latest observation of the slot before that step,
/// and the written value becomes the slot's latest observation. Writes are never merged, and
/// the changes are returned in step order.
///
/// Slots are compared as normalized 32-byte words, and are not distinguished by the contract
/// executing: storage of different contracts touched through nested calls shares one view.
pub fn extract_storage_changes(steps: &[ExecutionStep]) -> Vec<StorageChange> {
    let mut observed = B256HashMap::<B256>::default();
    let mut changes = Vec::new();

    for (idx, step) in steps.iter().enumerate() {
        if step.is_op(SLOAD) {
            match (step.stack_top(), steps.get(idx + 1).and_then(ExecutionStep::stack_top)) {
                (Some(slot), Some(value)) => {
                    observed.insert(*slot, *value);
                }
                _ => trace!(step = step.index, "SLOAD without an observable result"),
            }
        }

        if let Some(write) = step.storage_write {
            let old_value = observed.get(&write.slot).copied().unwrap_or_default();
            changes.push(StorageChange {
                slot: write.slot,
                old_value,
                new_value: write.value,
                step_index: step.index,
            });
            observed.insert(write.slot, write.value);
        }
    }

    debug!(changes = changes.len(), slots = observed.len(), "extracted storage changes");
    changes
}
