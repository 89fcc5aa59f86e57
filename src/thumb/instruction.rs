pub mod parsing;

use std::fmt;

use bitflags::bitflags;
use itertools::Itertools;
use strum::{Display, EnumIter, EnumString};

use super::operand::Operand;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mnemonic {
    ADC,
    ADD,
    ADDW,
    ADR,
    AND,
    ASR,
    BIC,
    CMN,
    CMP,
    EOR,
    LSL,
    LSR,
    MOV,
    MOVW,
    MVN,
    ORR,
    ROR,
    RSB,
    SBC,
    SUB,
    SUBW,
    TST,
}

bitflags! {
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct InstructionFlags: u32 {
        /// Sets the condition flags, rendered as an `s` suffix
        const UPDATE_FLAGS = 1 << 1;
        /// Resolved by a coin flip into UPDATE_FLAGS when the instruction is built
        const MAYBE_UPDATE_FLAGS = 1 << 2;
        /// 32-bit Thumb-2 encoding, rendered as a `.w` suffix
        const WIDE = 1 << 3;
    }
}

/// A generated instruction. Operands are kept in ISA order: destination, sources, then any
/// immediate or shift.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    mnemonic: Mnemonic,
    flags: InstructionFlags,
    operands: Vec<Operand>,
}

impl Instruction {
    /// Builds an instruction whose flags are already resolved. Panics if MAYBE_UPDATE_FLAGS is
    /// still set, since only the randomizer may resolve it.
    pub fn new(mnemonic: Mnemonic, flags: InstructionFlags, operands: Vec<Operand>) -> Self {
        assert!(
            !flags.contains(InstructionFlags::MAYBE_UPDATE_FLAGS),
            "unresolved maybe-update-flags on {}",
            mnemonic
        );
        Self { mnemonic, flags, operands }
    }

    pub fn mnemonic(&self) -> Mnemonic {
        self.mnemonic
    }

    pub fn flags(&self) -> InstructionFlags {
        self.flags
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn updates_flags(&self) -> bool {
        self.flags.contains(InstructionFlags::UPDATE_FLAGS)
    }

    pub fn is_wide(&self) -> bool {
        self.flags.contains(InstructionFlags::WIDE)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = if self.updates_flags() { "s" } else { "" };
        let w = if self.is_wide() { ".w" } else { "" };
        let operands = self.operands.iter().filter(|op| !op.is_empty()).join(", ");
        if operands.is_empty() {
            write!(f, "{}{}{}", self.mnemonic, s, w)
        } else {
            write!(f, "{}{}{} {}", self.mnemonic, s, w, operands)
        }
    }
}
