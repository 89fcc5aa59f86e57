use std::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{
        alpha1, alphanumeric1, char as match_char, multispace0, multispace1, u32 as match_u32,
    },
    combinator::{all_consuming, map, map_res, opt},
    error::{context, convert_error, VerboseError},
    multi::separated_list1,
    sequence::{preceded, tuple},
    Finish, IResult,
};

use super::{Instruction, InstructionFlags, Mnemonic};
use crate::thumb::operand::{Operand, Register, RegisterShift, ShiftType};
use crate::Error;

pub type ParseResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Split a mnemonic word into its base and an optional trailing `s`. No base mnemonic ends in
/// `s`, so a word that isn't a mnemonic as-is can only be a flag-setting form.
fn split_mnemonic(word: &str) -> Result<(Mnemonic, InstructionFlags), strum::ParseError> {
    if let Ok(mnemonic) = Mnemonic::from_str(word) {
        return Ok((mnemonic, InstructionFlags::empty()));
    }
    let base = word
        .strip_suffix('s')
        .or_else(|| word.strip_suffix('S'))
        .ok_or(strum::ParseError::VariantNotFound)?;
    Ok((Mnemonic::from_str(base)?, InstructionFlags::UPDATE_FLAGS))
}

fn wide_suffix(i: &str) -> ParseResult<InstructionFlags> {
    let (i, wide) = context("Wide", opt(tag_no_case(".w")))(i)?;
    let flags = if wide.is_some() { InstructionFlags::WIDE } else { InstructionFlags::empty() };
    Ok((i, flags))
}

/// Mnemonic with its `s` and `.w` suffixes
fn header(i: &str) -> ParseResult<(Mnemonic, InstructionFlags)> {
    let (i, (mnemonic, flags)) = context("Mnemonic", map_res(alpha1, split_mnemonic))(i)?;
    let (i, wide) = wide_suffix(i)?;
    Ok((i, (mnemonic, flags | wide)))
}

fn register(i: &str) -> ParseResult<Operand> {
    context("Register", map(map_res(alphanumeric1, Register::from_str), Operand::Reg))(i)
}

/// `#123` is unsigned, `#-123` signed
fn immediate(i: &str) -> ParseResult<Operand> {
    let negative = map(preceded(match_char('-'), match_u32), |v: u32| {
        Operand::Signed((v as i32).wrapping_neg())
    });
    let positive = map(match_u32, Operand::Unsigned);
    context("Immediate", preceded(match_char('#'), alt((negative, positive))))(i)
}

/// Isn't followed by an amount, unlike other shifts
fn rrx_shift(i: &str) -> ParseResult<Operand> {
    let (i, _) = tag_no_case("rrx")(i)?;
    Ok((i, Operand::Shift(RegisterShift::new(ShiftType::RRX, 0))))
}

fn imm_shift(i: &str) -> ParseResult<Operand> {
    let (i, shift_type) = map_res(alpha1, ShiftType::from_str)(i)?;
    let (i, (_, _, amount)) = tuple((multispace1, match_char('#'), match_u32))(i)?;
    Ok((i, Operand::Shift(RegisterShift::new(shift_type, amount))))
}

fn operand(i: &str) -> ParseResult<Operand> {
    context("Operand", alt((rrx_shift, imm_shift, register, immediate)))(i)
}

fn operands(i: &str) -> ParseResult<Vec<Operand>> {
    let separator = tuple((multispace0, match_char(','), multispace0));
    separated_list1(separator, operand)(i)
}

/// Parses a single rendered instruction, e.g. `adcs.w r0, r1, r2, lsl #3`
pub fn instruction(i: &str) -> ParseResult<Instruction> {
    let (i, _) = multispace0(i)?;
    let (i, (mnemonic, flags)) = header(i)?;
    let (i, operands) = opt(preceded(multispace1, operands))(i)?;
    let (i, _) = multispace0(i)?;
    Ok((i, Instruction::new(mnemonic, flags, operands.unwrap_or_default())))
}

impl FromStr for Instruction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(instruction)(s)
            .finish()
            .map(|(_, instr)| instr)
            .map_err(|e| Error::Parse { input: s.to_string(), reason: convert_error(s, e) })
    }
}
