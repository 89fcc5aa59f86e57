use std::ops::RangeInclusive;

use rand::Rng;

use super::instruction::{Instruction, InstructionFlags, Mnemonic};
use super::operand::{Operand, Register, RegisterShift, REGISTERS, SHIFT_TYPES};

/// Source of the raw draws everything in [`RandASM`] is built from. Any seeded [`rand::Rng`]
/// works; tests substitute a scripted sequence.
pub trait RandomSource {
    /// Uniform value in `0..2^63`
    fn next_u63(&mut self) -> u64;

    /// Uniform value in `0..n`. `n` must be positive.
    fn below(&mut self, n: u64) -> u64;
}

impl<R: Rng> RandomSource for R {
    fn next_u63(&mut self) -> u64 {
        self.gen::<u64>() >> 1
    }

    fn below(&mut self, n: u64) -> u64 {
        self.gen_range(0..n)
    }
}

/// Randomizer for one generation session. Draws happen in a fixed order for a given sequence of
/// calls, so a seed plus a generator selection sequence reproduces a run exactly.
#[derive(Clone, Debug)]
pub struct RandASM<R> {
    rng: R,
}

impl<R: RandomSource> RandASM<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }

    /// Unbiased coin flip
    pub fn maybe(&mut self) -> bool {
        self.rng.next_u63() % 2 == 0
    }

    /// Uniform value in `0..n`
    pub fn below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "empty draw range");
        self.rng.below(n)
    }

    /// The lowest `n` bits of a random value
    pub fn rand_int_bits(&mut self, n: u32) -> u32 {
        assert!(n <= 32, "cannot draw {} bits into a u32", n);
        let mask = ((1u64 << n) - 1) as u32;
        self.rng.next_u63() as u32 & mask
    }

    /// Uniform value in an inclusive range, for immediate fields whose legal values aren't a
    /// power of two wide
    pub fn rand_int_range(&mut self, range: RangeInclusive<u32>) -> u32 {
        let (lo, hi) = range.into_inner();
        assert!(lo <= hi, "empty range {}..={}", lo, hi);
        lo + self.below(u64::from(hi - lo) + 1) as u32
    }

    /// `n`, negated half of the time
    pub fn maybe_negative(&mut self, n: u32) -> i32 {
        if self.maybe() {
            (n as i32).wrapping_neg()
        } else {
            n as i32
        }
    }

    pub fn rand_register(&mut self) -> Register {
        self.rand_register_below(16)
    }

    /// r0-r7, the registers reachable from a 3-bit field
    pub fn rand_low_register(&mut self) -> Register {
        self.rand_register_below(8)
    }

    /// r0-r12, for 4-bit fields where SP and PC are unpredictable
    pub fn rand_general_register(&mut self) -> Register {
        self.rand_register_below(13)
    }

    /// One of the first `n` registers
    pub fn rand_register_below(&mut self, n: u32) -> Register {
        assert!(n > 0 && n <= 16, "register count {} out of range", n);
        REGISTERS[self.below(u64::from(n)) as usize]
    }

    /// A value encodable as a Thumb-2 modified immediate constant
    pub fn rand_thumb_imm(&mut self) -> u32 {
        let imm8 = self.rand_int_bits(8);
        if self.maybe() {
            // Byte replicated into one of the fixed layouts
            match self.below(4) {
                0 => imm8,
                1 => imm8 | (imm8 << 16),
                2 => (imm8 << 8) | (imm8 << 24),
                _ => imm8 | (imm8 << 8) | (imm8 << 16) | (imm8 << 24),
            }
        } else {
            // 1bcdefgh rotated into position
            let lsl = self.below(24) as u32 + 1;
            (imm8 | 0x80) << lsl
        }
    }

    /// Half of the time no shift, otherwise any type with an amount in 0..32
    pub fn rand_shift(&mut self) -> RegisterShift {
        if self.maybe() {
            let shift_type = SHIFT_TYPES[self.below(SHIFT_TYPES.len() as u64) as usize];
            let amount = self.below(32) as u32;
            RegisterShift::new(shift_type, amount)
        } else {
            RegisterShift::default()
        }
    }

    /// Prefix already-formatted operands with `name`, adding the flag-setting suffix half of the
    /// time
    pub fn rand_update_flags(&mut self, name: &str, operands: &str) -> String {
        let s = if self.maybe() { "s" } else { "" };
        format!("{}{} {}", name, s, operands)
    }

    /// Builds an instruction, resolving MAYBE_UPDATE_FLAGS with a single coin flip. Every
    /// generator goes through here so no instruction escapes with the flag unresolved.
    pub fn inst(
        &mut self,
        mnemonic: Mnemonic,
        mut flags: InstructionFlags,
        operands: Vec<Operand>,
    ) -> Instruction {
        if flags.contains(InstructionFlags::MAYBE_UPDATE_FLAGS) {
            if self.maybe() {
                flags |= InstructionFlags::UPDATE_FLAGS;
            }
            flags.remove(InstructionFlags::MAYBE_UPDATE_FLAGS);
        }
        Instruction::new(mnemonic, flags, operands)
    }
}
