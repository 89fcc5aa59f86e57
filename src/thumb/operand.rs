use std::fmt;

use strum::{Display, EnumIter, EnumString};

use crate::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
    R8 = 8,
    R9 = 9,
    R10 = 10,
    R11 = 11,
    R12 = 12,
    SP = 13,
    LR = 14,
    PC = 15,
}
use Register::*;

/// All registers, indexed by their 4-bit encoding
pub const REGISTERS: [Register; 16] = [
    R0, R1, R2, R3, R4, R5, R6, R7, R8, R9, R10, R11, R12, SP, LR, PC,
];

impl TryFrom<u32> for Register {
    type Error = Error;

    /// Register for a 4-bit register field
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        REGISTERS.get(value as usize).copied().ok_or(Error::InvalidRegister(value))
    }
}

impl Register {
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Addressable by the 3-bit register fields of narrow encodings
    pub fn is_low(self) -> bool {
        self.index() < 8
    }

    /// Pair the register with an inclusive value range
    pub fn with_range(self, minimum: u32, maximum: u32) -> FuzzedRegister {
        FuzzedRegister { register: self, minimum, maximum }
    }

    pub fn with_max(self, maximum: u32) -> FuzzedRegister {
        self.with_range(0, maximum)
    }
}

/// A register paired with the inclusive range of values it should hold. Only the register takes
/// part in rendering, the range is carried along for the harness.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FuzzedRegister {
    pub register: Register,
    pub minimum: u32,
    pub maximum: u32,
}

/// Read-only view of the condition flags in the program status register
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct Xpsr(pub u32);

impl Xpsr {
    pub fn n(self) -> bool {
        self.0 & (1 << 31) != 0
    }

    pub fn z(self) -> bool {
        self.0 & (1 << 30) != 0
    }

    pub fn c(self) -> bool {
        self.0 & (1 << 29) != 0
    }

    pub fn v(self) -> bool {
        self.0 & (1 << 28) != 0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ShiftType {
    LSL = 0,
    LSR = 1,
    ASR = 2,
    ROR = 3,
    RRX = 4,
}

pub const SHIFT_TYPES: [ShiftType; 5] = [
    ShiftType::LSL,
    ShiftType::LSR,
    ShiftType::ASR,
    ShiftType::ROR,
    ShiftType::RRX,
];

/// Shift applied to the last register operand. A zero-amount shift of any type but RRX is the
/// same as no shift at all, and renders as nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegisterShift {
    pub shift_type: ShiftType,
    pub amount: u32,
}

impl Default for RegisterShift {
    fn default() -> Self {
        Self { shift_type: ShiftType::LSL, amount: 0 }
    }
}

impl RegisterShift {
    pub fn new(shift_type: ShiftType, amount: u32) -> Self {
        Self { shift_type, amount }
    }

    pub fn is_empty(&self) -> bool {
        self.shift_type != ShiftType::RRX && self.amount == 0
    }
}

impl fmt::Display for RegisterShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shift_type {
            ShiftType::RRX => write!(f, "{}", self.shift_type),
            _ if self.amount == 0 => Ok(()),
            _ => write!(f, "{} #{}", self.shift_type, self.amount),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Reg(Register),
    Fuzzed(FuzzedRegister),
    Signed(i32),
    Unsigned(u32),
    Shift(RegisterShift),
}

impl Operand {
    /// Whether the operand contributes nothing to the rendered operand list
    pub fn is_empty(&self) -> bool {
        match self {
            Operand::Shift(shift) => shift.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg) => write!(f, "{}", reg),
            Operand::Fuzzed(fuzzed) => write!(f, "{}", fuzzed.register),
            Operand::Signed(imm) => write!(f, "#{}", imm),
            Operand::Unsigned(imm) => write!(f, "#{}", imm),
            Operand::Shift(shift) => write!(f, "{}", shift),
        }
    }
}

impl From<Register> for Operand {
    fn from(reg: Register) -> Self {
        Self::Reg(reg)
    }
}

impl From<FuzzedRegister> for Operand {
    fn from(fuzzed: FuzzedRegister) -> Self {
        Self::Fuzzed(fuzzed)
    }
}

impl From<i32> for Operand {
    fn from(imm: i32) -> Self {
        Self::Signed(imm)
    }
}

impl From<u32> for Operand {
    fn from(imm: u32) -> Self {
        Self::Unsigned(imm)
    }
}

impl From<RegisterShift> for Operand {
    fn from(shift: RegisterShift) -> Self {
        Self::Shift(shift)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_low_registers_render_numbered() {
        for reg in Register::iter().take(13) {
            assert_eq!(reg.to_string(), format!("r{}", reg.index()));
        }
    }

    #[rstest]
    #[case(13, "sp")]
    #[case(14, "lr")]
    #[case(15, "pc")]
    fn test_special_registers(#[case] index: u32, #[case] name: &str) {
        assert_eq!(Register::try_from(index).unwrap().to_string(), name);
    }

    #[test]
    fn test_register_index_matches_field() {
        for (i, reg) in Register::iter().enumerate() {
            assert_eq!(reg.index(), i as u32);
            assert_eq!(Register::try_from(i as u32).unwrap(), reg);
        }
        assert!(R7.is_low());
        assert!(!R8.is_low());
    }

    #[test]
    fn test_register_from_str() {
        assert_eq!(Register::from_str("R12").unwrap(), R12);
        assert_eq!(Register::from_str("sp").unwrap(), SP);
        assert!(Register::from_str("r16").is_err());
    }

    #[test]
    fn test_register_out_of_range() {
        assert!(matches!(Register::try_from(16), Err(Error::InvalidRegister(16))));
        assert!(Register::try_from(u32::MAX).is_err());
    }

    #[test]
    fn test_xpsr_flags() {
        let xpsr = Xpsr(0xa000_0000);
        assert!(xpsr.n());
        assert!(!xpsr.z());
        assert!(xpsr.c());
        assert!(!xpsr.v());
        let xpsr = Xpsr(0x5000_0000);
        assert!(!xpsr.n());
        assert!(xpsr.z());
        assert!(!xpsr.c());
        assert!(xpsr.v());
        // Bits below 28 never leak into the flags
        let xpsr = Xpsr(0x0fff_ffff);
        assert!(!(xpsr.n() || xpsr.z() || xpsr.c() || xpsr.v()));
    }

    #[rstest]
    #[case(ShiftType::LSL, 0, "")]
    #[case(ShiftType::LSR, 0, "")]
    #[case(ShiftType::ASR, 0, "")]
    #[case(ShiftType::ROR, 0, "")]
    #[case(ShiftType::RRX, 0, "rrx")]
    #[case(ShiftType::RRX, 17, "rrx")]
    #[case(ShiftType::LSL, 3, "lsl #3")]
    #[case(ShiftType::ASR, 31, "asr #31")]
    #[case(ShiftType::ROR, 8, "ror #8")]
    fn test_shift_display(#[case] shift_type: ShiftType, #[case] amount: u32, #[case] s: &str) {
        let shift = RegisterShift::new(shift_type, amount);
        assert_eq!(shift.to_string(), s);
        assert_eq!(shift.is_empty(), s.is_empty());
    }

    #[test]
    fn test_operand_display() {
        assert_eq!(Operand::from(LR).to_string(), "lr");
        assert_eq!(Operand::from(R3.with_range(4, 9)).to_string(), "r3");
        assert_eq!(Operand::from(42u32).to_string(), "#42");
        assert_eq!(Operand::from(-4095i32).to_string(), "#-4095");
        assert!(Operand::from(RegisterShift::default()).is_empty());
    }

    #[test]
    fn test_fuzzed_register_keeps_range() {
        let fuzzed = R5.with_max(255);
        assert_eq!(fuzzed.register, R5);
        assert_eq!(fuzzed.minimum, 0);
        assert_eq!(fuzzed.maximum, 255);
    }
}
