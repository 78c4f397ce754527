use alloy_primitives::{Bytes, hex};
use revm::bytecode::opcode::{OpCode, PUSH1, PUSH32};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// A map of program counters to instruction counters.
pub type PcIcMap = BTreeMap<usize, usize>;

/// A map of instruction counters to program counters.
pub type IcPcMap = BTreeMap<usize, usize>;

/// Length of an unlinked library placeholder, e.g. `__$7f6a...$__`.
const PLACEHOLDER_LEN: usize = 40;

/// Error returned when bytecode cannot be decoded from its hex representation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BytecodeError {
    /// The bytecode string is not valid hex.
    #[error("invalid bytecode hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// Returns the number of immediate bytes following `op`.
#[inline]
fn immediate_len(op: u8) -> usize {
    if (PUSH1..=PUSH32).contains(&op) { (op - PUSH1 + 1) as usize } else { 0 }
}

/// Walks `code` once and yields `(pc, ic)` for every instruction start.
///
/// A PUSH whose immediate runs past the end of the buffer still yields its own start, after
/// which the walk ends.
fn instruction_starts(code: &[u8]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut pc = 0;
    let mut ic = 0;
    std::iter::from_fn(move || {
        let op = *code.get(pc)?;
        let item = (pc, ic);
        pc += 1 + immediate_len(op);
        ic += 1;
        Some(item)
    })
}

/// Builds a mapping from program counters to instruction counters.
pub fn build_pc_ic_map(code: &[u8]) -> PcIcMap {
    instruction_starts(code).collect()
}

/// Builds a mapping from instruction counters to program counters.
pub fn build_ic_pc_map(code: &[u8]) -> IcPcMap {
    instruction_starts(code).map(|(pc, ic)| (ic, pc)).collect()
}

/// A single disassembled instruction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Instruction {
    /// Byte offset of the opcode.
    pub pc: usize,
    /// The raw opcode byte.
    pub op: u8,
    /// Immediate bytes; shorter than declared if the bytecode was truncated.
    pub immediate: Bytes,
}

impl Instruction {
    /// Returns the mnemonic of the opcode, or `None` for an undefined byte.
    pub fn mnemonic(&self) -> Option<&'static str> {
        OpCode::new(self.op).map(|op| op.as_str())
    }

    /// Returns true if the declared immediate extends past the end of the bytecode.
    pub fn is_truncated(&self) -> bool {
        self.immediate.len() < immediate_len(self.op)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            Some(name) => write!(f, "{:#06x}: {name}", self.pc)?,
            None => write!(f, "{:#06x}: UNKNOWN({:#04x})", self.pc, self.op)?,
        }
        if !self.immediate.is_empty() {
            write!(f, " {}", self.immediate)?;
        }
        Ok(())
    }
}

/// Disassembles `code` into its instructions, in order.
pub fn disassemble(code: &[u8]) -> Vec<Instruction> {
    instruction_starts(code)
        .map(|(pc, _)| {
            let op = code[pc];
            let end = (pc + 1 + immediate_len(op)).min(code.len());
            Instruction { pc, op, immediate: Bytes::copy_from_slice(&code[pc + 1..end]) }
        })
        .collect()
}

/// Decodes compiler-emitted bytecode hex, with or without a `0x` prefix.
///
/// Unlinked library placeholders are replaced by the zero address so that the instruction
/// layout is preserved.
pub fn decode_bytecode_hex(object: &str) -> Result<Bytes, BytecodeError> {
    let object = object.trim();
    let object = object.strip_prefix("0x").unwrap_or(object);
    if !object.contains("__") || !object.is_ascii() {
        return Ok(hex::decode(object)?.into());
    }

    let mut linked = String::with_capacity(object.len());
    let mut rest = object;
    while let Some(idx) = rest.find("__") {
        let (head, tail) = rest.split_at(idx);
        linked.push_str(head);
        let len = PLACEHOLDER_LEN.min(tail.len());
        debug!(placeholder = &tail[..len], "zeroing unlinked library placeholder");
        linked.extend(std::iter::repeat_n('0', len));
        rest = &tail[len..];
    }
    linked.push_str(rest);
    Ok(hex::decode(linked)?.into())
}
