//! Instruction walking over a method's `code` array.
//!
//! Only instruction boundaries are decoded; operands other than the
//! switch-table sizes are left to the caller.

use super::error::ClassFileError;

pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;

const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const WIDE: u8 = 0xc4;
const IINC: u8 = 0x84;
const RET: u8 = 0xa9;

/// One decoded instruction boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Offset of the opcode within the code array.
    pub pc: usize,
    pub opcode: u8,
    /// Total length including the opcode byte.
    pub len: usize,
}

impl Instruction {
    /// Big-endian `u2` operand directly after the opcode, if the instruction
    /// has one.
    #[must_use]
    pub fn u2_operand(&self, code: &[u8]) -> Option<u16> {
        if self.len < 3 {
            return None;
        }
        let hi = *code.get(self.pc + 1)?;
        let lo = *code.get(self.pc + 2)?;
        Some(u16::from_be_bytes([hi, lo]))
    }
}

/// Iterator over the instructions of a code array.
///
/// Yields an error and then stops if an instruction is undefined or
/// truncated.
#[derive(Debug, Clone)]
pub struct Instructions<'c> {
    code: &'c [u8],
    pc: usize,
    failed: bool,
}

impl<'c> Instructions<'c> {
    #[must_use]
    pub fn new(code: &'c [u8]) -> Self {
        Self {
            code,
            pc: 0,
            failed: false,
        }
    }
}

impl Iterator for Instructions<'_> {
    type Item = Result<Instruction, ClassFileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pc >= self.code.len() {
            return None;
        }
        let pc = self.pc;
        match instruction_length(self.code, pc) {
            Ok(len) => {
                self.pc += len;
                Some(Ok(Instruction {
                    pc,
                    opcode: self.code[pc],
                    len,
                }))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Walk the whole code array, failing on the first bad instruction.
///
/// # Errors
///
/// Returns [`ClassFileError::InvalidOpcode`], [`ClassFileError::MalformedSwitch`]
/// or [`ClassFileError::TruncatedInstruction`].
pub fn validate(code: &[u8]) -> Result<usize, ClassFileError> {
    Instructions::new(code).try_fold(0, |count, insn| insn.map(|_| count + 1))
}

/// Length in bytes of the instruction starting at `pc`.
///
/// # Errors
///
/// See [`validate`].
pub fn instruction_length(code: &[u8], pc: usize) -> Result<usize, ClassFileError> {
    let opcode = *code
        .get(pc)
        .ok_or(ClassFileError::TruncatedInstruction { pc })?;

    let len = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,        // bipush
        0x11 => 3,        // sipush
        0x12 => 2,        // ldc
        0x13 | 0x14 => 3, // ldc_w, ldc2_w
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x83 => 1,
        IINC => 3,
        0x85..=0x98 => 1,
        0x99..=0xa8 => 3,
        RET => 2,
        TABLESWITCH => tableswitch_length(code, pc)?,
        LOOKUPSWITCH => lookupswitch_length(code, pc)?,
        0xac..=0xb1 => 1,
        0xb2..=0xb8 => 3,
        0xb9 | 0xba => 5, // invokeinterface, invokedynamic
        0xbb => 3,        // new
        0xbc => 2,        // newarray
        0xbd => 3,        // anewarray
        0xbe | 0xbf => 1,
        0xc0 | 0xc1 => 3, // checkcast, instanceof
        0xc2 | 0xc3 => 1,
        WIDE => match code.get(pc + 1).copied() {
            Some(IINC) => 6,
            Some(0x15..=0x19 | 0x36..=0x3a | RET) => 4,
            Some(opcode) => return Err(ClassFileError::InvalidOpcode { opcode, pc: pc + 1 }),
            None => return Err(ClassFileError::TruncatedInstruction { pc }),
        },
        0xc5 => 4,        // multianewarray
        0xc6 | 0xc7 => 3, // ifnull, ifnonnull
        0xc8 | 0xc9 => 5, // goto_w, jsr_w
        opcode => return Err(ClassFileError::InvalidOpcode { opcode, pc }),
    };

    match pc.checked_add(len) {
        Some(end) if end <= code.len() => Ok(len),
        _ => Err(ClassFileError::TruncatedInstruction { pc }),
    }
}

/// Operands of both switches start on a 4-byte boundary relative to the
/// start of the code array.
fn switch_padding(pc: usize) -> usize {
    (4 - (pc + 1) % 4) % 4
}

fn read_i32(code: &[u8], at: usize, pc: usize) -> Result<i32, ClassFileError> {
    code.get(at..at + 4)
        .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ClassFileError::TruncatedInstruction { pc })
}

fn tableswitch_length(code: &[u8], pc: usize) -> Result<usize, ClassFileError> {
    let base = pc + 1 + switch_padding(pc);
    let low = i64::from(read_i32(code, base + 4, pc)?);
    let high = i64::from(read_i32(code, base + 8, pc)?);
    if high < low {
        return Err(ClassFileError::MalformedSwitch { pc });
    }
    let entries = usize::try_from(high - low + 1).map_err(|_| ClassFileError::MalformedSwitch { pc })?;
    Ok((1 + switch_padding(pc) + 12).saturating_add(entries.saturating_mul(4)))
}

fn lookupswitch_length(code: &[u8], pc: usize) -> Result<usize, ClassFileError> {
    let base = pc + 1 + switch_padding(pc);
    let npairs = read_i32(code, base + 4, pc)?;
    let npairs = usize::try_from(npairs).map_err(|_| ClassFileError::MalformedSwitch { pc })?;
    Ok((1 + switch_padding(pc) + 8).saturating_add(npairs.saturating_mul(8)))
}
