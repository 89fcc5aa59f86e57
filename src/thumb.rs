pub mod encodings;
pub mod instruction;
pub mod operand;
pub mod rand_asm;

#[cfg(test)]
mod tests;

pub use encodings::{Encoding, Generator, Registry, Width};
pub use instruction::{Instruction, InstructionFlags, Mnemonic};
pub use operand::{FuzzedRegister, Operand, Register, RegisterShift, ShiftType, Xpsr};
pub use rand_asm::{RandASM, RandomSource};
