use std::fmt;

use tracing::{debug, trace};

use super::instruction::{Instruction, InstructionFlags, Mnemonic};
use super::operand::{Operand, Register::SP};
use super::rand_asm::{RandASM, RandomSource};
use crate::{Error, Result};

pub type Generator<R> = fn(&mut RandASM<R>) -> Instruction;

/// Size of the machine encoding. Independent of the `.w` qualifier, which is only printed where
/// the mnemonic alone would also assemble to a 16-bit form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Width {
    Narrow,
    Wide,
}

impl Width {
    pub fn bits(self) -> u32 {
        match self {
            Width::Narrow => 16,
            Width::Wide => 32,
        }
    }
}

/// One encoding form of one mnemonic, named as in the ARMv7-M reference, e.g.
/// "ADD (immediate) T3"
pub struct Encoding<R> {
    name: &'static str,
    mnemonic: Mnemonic,
    width: Width,
    flags: InstructionFlags,
    generate: Generator<R>,
}

impl<R> Clone for Encoding<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Encoding<R> {}

impl<R> fmt::Debug for Encoding<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoding")
            .field("name", &self.name)
            .field("mnemonic", &self.mnemonic)
            .field("width", &self.width)
            .field("flags", &self.flags)
            .finish()
    }
}

impl<R: RandomSource> Encoding<R> {
    pub fn new(
        name: &'static str,
        mnemonic: Mnemonic,
        width: Width,
        flags: InstructionFlags,
        generate: Generator<R>,
    ) -> Self {
        debug_assert!(
            width == Width::Wide || !flags.contains(InstructionFlags::WIDE),
            "{} renders .w but is narrow",
            name
        );
        Self { name, mnemonic, width, flags, generate }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mnemonic(&self) -> Mnemonic {
        self.mnemonic
    }

    /// Flags as declared by the form, before MAYBE_UPDATE_FLAGS is resolved
    pub fn flags(&self) -> InstructionFlags {
        self.flags
    }

    pub fn width(&self) -> Width {
        self.width
    }

    /// 32-bit Thumb-2 encoding, whether or not it renders `.w`
    pub fn is_wide(&self) -> bool {
        self.width == Width::Wide
    }

    pub fn generate(&self, r: &mut RandASM<R>) -> Instruction {
        let instr = (self.generate)(r);
        trace!(encoding = self.name, instr = %instr, "generated");
        instr
    }
}

const NONE: InstructionFlags = InstructionFlags::empty();
const S: InstructionFlags = InstructionFlags::UPDATE_FLAGS;
const MAYBE_S: InstructionFlags = InstructionFlags::MAYBE_UPDATE_FLAGS;
const WIDE: InstructionFlags = InstructionFlags::WIDE;
const MAYBE_S_WIDE: InstructionFlags = MAYBE_S.union(WIDE);

/// Declares an encoding of the given `Width` whose operands are drawn left to right, in ISA
/// operand order. The block form is for operands that depend on each other.
macro_rules! encoding {
    (
        $width:ident $name:literal, $mnemonic:ident, $flags:expr,
        |$r:ident| [$($op:expr),* $(,)?]
    ) => {
        encoding!($width $name, $mnemonic, $flags, |$r| { vec![$(Operand::from($op)),*] })
    };
    ($width:ident $name:literal, $mnemonic:ident, $flags:expr, |$r:ident| $body:block) => {
        Encoding::<R>::new($name, Mnemonic::$mnemonic, Width::$width, $flags, |$r| {
            let operands: Vec<Operand> = $body;
            $r.inst(Mnemonic::$mnemonic, $flags, operands)
        })
    };
}

fn thumb_encodings<R: RandomSource>() -> Vec<Encoding<R>> {
    vec![
        encoding!(Wide "ADC (immediate) T1", ADC, MAYBE_S, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "ADC (register) T1", ADC, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "ADC (register) T2", ADC, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Narrow "ADD (immediate) T1", ADD, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
            r.rand_int_bits(3),
        ]),
        encoding!(Narrow "ADD (immediate) T2", ADD, NONE, |r| [
            r.rand_low_register(),
            r.rand_int_bits(8),
        ]),
        encoding!(Wide "ADD (immediate) T3", ADD, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Wide "ADD (immediate) T4", ADDW, NONE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_int_bits(12),
        ]),
        encoding!(Narrow "ADD (register) T1", ADD, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Narrow "ADD (register) T2", ADD, NONE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
        ]),
        encoding!(Wide "ADD (register) T3", ADD, WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Narrow "ADD (SP plus immediate) T1", ADD, NONE, |r| [
            r.rand_low_register(),
            SP,
            r.rand_int_bits(8) << 2,
        ]),
        encoding!(Narrow "ADD (SP plus immediate) T2", ADD, NONE, |r| [
            SP,
            SP,
            r.rand_int_bits(7) << 2,
        ]),
        encoding!(Wide "ADD (SP plus immediate) T3", ADD, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            SP,
            r.rand_thumb_imm(),
        ]),
        encoding!(Wide "ADD (SP plus immediate) T4", ADDW, NONE, |r| [
            r.rand_general_register(),
            SP,
            r.rand_int_bits(12),
        ]),
        // Rdm is a single field
        encoding!(Narrow "ADD (SP plus register) T1", ADD, NONE, |r| {
            let rdm = r.rand_low_register();
            vec![rdm.into(), SP.into(), rdm.into()]
        }),
        encoding!(Narrow "ADD (SP plus register) T2", ADD, NONE, |r| [
            SP,
            r.rand_general_register(),
        ]),
        encoding!(Wide "ADD (SP plus register) T3", ADD, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            SP,
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        // Assemblers emit these as ADD/SUB PC
        encoding!(Narrow "ADR T1", ADR, NONE, |r| [
            r.rand_low_register(),
            r.rand_int_bits(8) << 2,
        ]),
        encoding!(Wide "ADR T2, T3", ADR, WIDE, |r| {
            let rd = r.rand_general_register();
            let imm12 = r.rand_int_bits(12);
            vec![rd.into(), r.maybe_negative(imm12).into()]
        }),
        encoding!(Wide "AND (immediate) T1", AND, MAYBE_S, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "AND (register) T1", AND, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "AND (register) T2", AND, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        // An imm5 of 0 encodes a shift of 32
        encoding!(Narrow "ASR (immediate) T1", ASR, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
            r.rand_int_range(1..=32),
        ]),
        encoding!(Wide "ASR (immediate) T2", ASR, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_int_range(1..=32),
        ]),
        encoding!(Narrow "ASR (register) T1", ASR, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "ASR (register) T2", ASR, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
        ]),
        encoding!(Wide "BIC (immediate) T1", BIC, MAYBE_S, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "BIC (register) T1", BIC, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "BIC (register) T2", BIC, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Wide "CMN (immediate) T1", CMN, NONE, |r| [
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "CMN (register) T1", CMN, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "CMN (register) T2", CMN, WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Narrow "CMP (immediate) T1", CMP, NONE, |r| [
            r.rand_low_register(),
            r.rand_int_bits(8),
        ]),
        encoding!(Wide "CMP (immediate) T2", CMP, WIDE, |r| [
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "CMP (register) T1", CMP, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "CMP (register) T3", CMP, WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Wide "EOR (immediate) T1", EOR, MAYBE_S, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "EOR (register) T1", EOR, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "EOR (register) T2", EOR, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        // An imm5 of 0 is MOV
        encoding!(Narrow "LSL (immediate) T1", LSL, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
            r.rand_int_range(1..=31),
        ]),
        encoding!(Wide "LSL (immediate) T2", LSL, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_int_range(1..=31),
        ]),
        encoding!(Narrow "LSL (register) T1", LSL, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "LSL (register) T2", LSL, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
        ]),
        encoding!(Narrow "LSR (immediate) T1", LSR, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
            r.rand_int_range(1..=32),
        ]),
        encoding!(Wide "LSR (immediate) T2", LSR, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_int_range(1..=32),
        ]),
        encoding!(Narrow "LSR (register) T1", LSR, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "LSR (register) T2", LSR, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
        ]),
        encoding!(Narrow "MOV (immediate) T1", MOV, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_int_bits(8),
        ]),
        encoding!(Wide "MOV (immediate) T2", MOV, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Wide "MOV (immediate) T3", MOVW, NONE, |r| [
            r.rand_general_register(),
            r.rand_int_bits(16),
        ]),
        encoding!(Narrow "MOV (register) T1", MOV, NONE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
        ]),
        // Only exists in the flag-setting form
        encoding!(Narrow "MOV (register) T2", MOV, S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "MOV (register) T3", MOV, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
        ]),
        encoding!(Wide "MVN (immediate) T1", MVN, MAYBE_S, |r| [
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "MVN (register) T1", MVN, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "MVN (register) T2", MVN, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Wide "ORR (immediate) T1", ORR, MAYBE_S, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "ORR (register) T1", ORR, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "ORR (register) T2", ORR, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Wide "ROR (immediate) T1", ROR, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_int_range(1..=31),
        ]),
        encoding!(Narrow "ROR (register) T1", ROR, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "ROR (register) T2", ROR, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
        ]),
        // The narrow form only negates
        encoding!(Narrow "RSB (immediate) T1", RSB, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
            0u32,
        ]),
        encoding!(Wide "RSB (immediate) T2", RSB, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Wide "RSB (register) T1", RSB, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Wide "SBC (immediate) T1", SBC, MAYBE_S, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "SBC (register) T1", SBC, MAYBE_S, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "SBC (register) T2", SBC, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Narrow "SUB (immediate) T1", SUB, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
            r.rand_int_bits(3),
        ]),
        encoding!(Narrow "SUB (immediate) T2", SUB, NONE, |r| [
            r.rand_low_register(),
            r.rand_int_bits(8),
        ]),
        encoding!(Wide "SUB (immediate) T3", SUB, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Wide "SUB (immediate) T4", SUBW, NONE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_int_bits(12),
        ]),
        encoding!(Narrow "SUB (register) T1", SUB, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "SUB (register) T2", SUB, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
        encoding!(Narrow "SUB (SP minus immediate) T1", SUB, NONE, |r| [
            SP,
            SP,
            r.rand_int_bits(7) << 2,
        ]),
        encoding!(Wide "SUB (SP minus immediate) T2", SUB, MAYBE_S_WIDE, |r| [
            r.rand_general_register(),
            SP,
            r.rand_thumb_imm(),
        ]),
        encoding!(Wide "SUB (SP minus immediate) T3", SUBW, NONE, |r| [
            r.rand_general_register(),
            SP,
            r.rand_int_bits(12),
        ]),
        encoding!(Wide "TST (immediate) T1", TST, NONE, |r| [
            r.rand_general_register(),
            r.rand_thumb_imm(),
        ]),
        encoding!(Narrow "TST (register) T1", TST, NONE, |r| [
            r.rand_low_register(),
            r.rand_low_register(),
        ]),
        encoding!(Wide "TST (register) T2", TST, WIDE, |r| [
            r.rand_general_register(),
            r.rand_general_register(),
            r.rand_shift(),
        ]),
    ]
}

/// Ordered, immutable set of encodings. Picking which entry to run is left to the caller; every
/// entry may be run any number of times against the same randomizer.
#[derive(Debug)]
pub struct Registry<R> {
    encodings: Vec<Encoding<R>>,
}

impl<R: RandomSource> Default for Registry<R> {
    fn default() -> Self {
        Self::thumb()
    }
}

impl<R: RandomSource> Registry<R> {
    /// Every Thumb/Thumb-2 encoding form the generator knows about
    pub fn thumb() -> Self {
        let encodings = thumb_encodings();
        debug!(count = encodings.len(), "built thumb encoding registry");
        Self { encodings }
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Encoding<R>> {
        self.encodings.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Encoding<R>> {
        self.encodings.iter()
    }

    pub fn find(&self, name: &str) -> Option<&Encoding<R>> {
        self.encodings.iter().find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Keep only the encodings matching `keep`, preserving order
    pub fn retain<F>(mut self, keep: F) -> Result<Self>
    where
        F: FnMut(&Encoding<R>) -> bool,
    {
        self.encodings.retain(keep);
        if self.encodings.is_empty() {
            return Err(Error::EmptySelection);
        }
        debug!(count = self.encodings.len(), "filtered encoding registry");
        Ok(self)
    }

    /// Run the encoding at `index`. Panics if `index` is out of bounds.
    pub fn generate(&self, index: usize, r: &mut RandASM<R>) -> Instruction {
        self.encodings[index].generate(r)
    }
}
