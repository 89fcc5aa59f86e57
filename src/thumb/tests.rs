use super::rand_asm::scripted::{ScriptedSource, HEADS, TAILS};
use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;
use std::collections::HashSet;

fn run(name: &str, draws: &[u64]) -> String {
    let registry = Registry::<ScriptedSource>::thumb();
    let encoding = registry.find(name).unwrap();
    let mut r = RandASM::new(ScriptedSource::new(draws));
    let instr = encoding.generate(&mut r);
    assert_eq!(r.into_inner().remaining(), 0, "{} left draws unused", name);
    instr.to_string()
}

#[test]
fn test_add_imm_t1() {
    // r0, r1, then 3 bits of immediate
    assert_eq!(run("ADD (immediate) T1", &[0, 1, 5]), "add r0, r1, #5");
}

#[test]
fn test_add_reg_t3() {
    // r2, r3, r4, shift taken, LSL, 3
    assert_eq!(run("ADD (register) T3", &[2, 3, 4, HEADS, 0, 3]), "add.w r2, r3, r4, lsl #3");
}

#[test]
fn test_add_reg_t3_unshifted() {
    assert_eq!(run("ADD (register) T3", &[2, 3, 4, TAILS]), "add.w r2, r3, r4");
}

#[test]
fn test_adc_imm_sets_flags() {
    // r0, r1, imm8 = 0xaa, replicated, raw layout, then the flag coin
    assert_eq!(run("ADC (immediate) T1", &[0, 1, 0xaa, HEADS, 0, HEADS]), "adcs r0, r1, #170");
    assert_eq!(run("ADC (immediate) T1", &[0, 1, 0xaa, HEADS, 0, TAILS]), "adc r0, r1, #170");
}

#[test]
fn test_add_imm_t3_wide_and_flags() {
    assert_eq!(
        run("ADD (immediate) T3", &[9, 12, 0x05, TAILS, 1, HEADS]),
        format!("adds.w r9, r12, #{}", (0x05 | 0x80) << 2)
    );
}

#[test]
fn test_sp_forms_keep_sp() {
    assert_eq!(run("ADD (SP plus immediate) T1", &[3, 0xff]), "add r3, sp, #1020");
    assert_eq!(run("ADD (SP plus immediate) T2", &[0x7f]), "add sp, sp, #508");
    assert_eq!(run("ADD (SP plus register) T1", &[6]), "add r6, sp, r6");
    assert_eq!(run("ADD (SP plus register) T2", &[12]), "add sp, r12");
    assert_eq!(run("ADD (SP plus immediate) T4", &[0, 4095]), "addw r0, sp, #4095");
}

#[test]
fn test_adr_wide_negative() {
    assert_eq!(run("ADR T2, T3", &[4, 0x123, HEADS]), "adr.w r4, #-291");
    assert_eq!(run("ADR T2, T3", &[4, 0x123, TAILS]), "adr.w r4, #291");
}

#[test]
fn test_asr_imm_range() {
    assert_eq!(run("ASR (immediate) T1", &[1, 2, 31]), "asr r1, r2, #32");
    assert_eq!(run("ASR (register) T1", &[1, 2]), "asr r1, r2");
}

#[test]
fn test_mov_reg_t2_always_sets_flags() {
    assert_eq!(run("MOV (register) T2", &[0, 7]), "movs r0, r7");
}

#[test]
fn test_rsb_narrow_negates() {
    assert_eq!(run("RSB (immediate) T1", &[5, 5, TAILS]), "rsb r5, r5, #0");
}

#[test]
fn test_required_forms_present() {
    let registry = Registry::<StdRng>::thumb();
    for name in [
        "ADC (immediate) T1",
        "ADC (register) T1",
        "ADC (register) T2",
        "ADD (immediate) T1",
        "ADD (immediate) T2",
        "ADD (immediate) T3",
        "ADD (immediate) T4",
        "ADD (register) T1",
        "ADD (register) T2",
        "ADD (register) T3",
        "ADD (SP plus immediate) T1",
        "ADD (SP plus immediate) T2",
        "ADD (SP plus immediate) T3",
        "ADD (SP plus immediate) T4",
        "ADD (SP plus register) T1",
        "ADD (SP plus register) T2",
        "ADD (SP plus register) T3",
        "ADR T1",
        "ADR T2, T3",
        "AND (immediate) T1",
        "AND (register) T1",
        "AND (register) T2",
        "ASR (immediate) T1",
        "ASR (immediate) T2",
        "ASR (register) T1",
        "ASR (register) T2",
    ] {
        assert!(registry.find(name).is_some(), "missing {}", name);
    }
}

#[test]
fn test_encoding_names_unique() {
    let registry = Registry::<StdRng>::thumb();
    let names: HashSet<_> = registry.iter().map(|e| e.name()).collect();
    assert_eq!(names.len(), registry.len());
}

#[test]
fn test_generated_matches_declared_form() {
    let registry = Registry::<StdRng>::thumb();
    let mut r = RandASM::new(StdRng::seed_from_u64(0xc0ffee));
    for encoding in registry.iter() {
        for _ in 0..200 {
            let instr = encoding.generate(&mut r);
            assert_eq!(instr.mnemonic(), encoding.mnemonic());
            if instr.is_wide() {
                assert!(encoding.is_wide(), "{} renders .w", encoding.name());
            }
            assert!(!instr.flags().contains(InstructionFlags::MAYBE_UPDATE_FLAGS));
            let can_set_flags = encoding
                .flags()
                .intersects(InstructionFlags::UPDATE_FLAGS | InstructionFlags::MAYBE_UPDATE_FLAGS);
            if instr.updates_flags() {
                assert!(can_set_flags, "{} set flags", encoding.name());
            }
        }
    }
}

#[rstest]
#[case("ADD (immediate) T4", "addw")]
#[case("ADD (SP plus immediate) T4", "addw")]
#[case("SUB (immediate) T4", "subw")]
#[case("SUB (SP minus immediate) T3", "subw")]
#[case("MOV (immediate) T3", "movw")]
#[case("CMN (immediate) T1", "cmn")]
#[case("TST (immediate) T1", "tst")]
fn test_unqualified_wide_forms(#[case] name: &str, #[case] head: &str) {
    // 32-bit encodings with no 16-bit twin print without .w
    let registry = Registry::<StdRng>::thumb();
    let encoding = registry.find(name).unwrap();
    assert!(encoding.is_wide(), "{}", name);
    assert_eq!(encoding.width().bits(), 32);
    let mut r = RandASM::new(StdRng::seed_from_u64(5));
    let line = encoding.generate(&mut r).to_string();
    assert_eq!(line.split(' ').next(), Some(head));
}

#[test]
fn test_w_mnemonics_are_wide() {
    let registry = Registry::<StdRng>::thumb();
    let w_forms: Vec<_> = registry
        .iter()
        .filter(|e| matches!(e.mnemonic(), Mnemonic::ADDW | Mnemonic::SUBW | Mnemonic::MOVW))
        .collect();
    assert_eq!(w_forms.len(), 5);
    assert!(w_forms.iter().all(|e| e.width() == Width::Wide));
}

/// 16-bit forms whose register fields are 3 bits wide
const LOW_REGISTER_FORMS: [&str; 30] = [
    "ADC (register) T1",
    "ADD (immediate) T1",
    "ADD (immediate) T2",
    "ADD (register) T1",
    "ADD (SP plus immediate) T1",
    "ADD (SP plus register) T1",
    "ADR T1",
    "AND (register) T1",
    "ASR (immediate) T1",
    "ASR (register) T1",
    "BIC (register) T1",
    "CMN (register) T1",
    "CMP (immediate) T1",
    "CMP (register) T1",
    "EOR (register) T1",
    "LSL (immediate) T1",
    "LSL (register) T1",
    "LSR (immediate) T1",
    "LSR (register) T1",
    "MOV (immediate) T1",
    "MOV (register) T2",
    "MVN (register) T1",
    "ORR (register) T1",
    "ROR (register) T1",
    "RSB (immediate) T1",
    "SBC (register) T1",
    "SUB (immediate) T1",
    "SUB (immediate) T2",
    "SUB (register) T1",
    "TST (register) T1",
];

#[test]
fn test_narrow_forms_only_use_low_registers() {
    let registry = Registry::<StdRng>::thumb();
    let mut r = RandASM::new(StdRng::seed_from_u64(17));
    for name in LOW_REGISTER_FORMS {
        let encoding = registry.find(name).unwrap();
        assert!(!encoding.is_wide(), "{} is wide", name);
        for _ in 0..200 {
            let instr = encoding.generate(&mut r);
            for op in instr.operands() {
                match op {
                    Operand::Reg(Register::SP) => {}
                    Operand::Reg(reg) => assert!(reg.is_low(), "{} drew {}", name, reg),
                    _ => {}
                }
            }
        }
    }
}

#[test]
fn test_wide_forms_avoid_sp_and_pc() {
    let registry = Registry::<StdRng>::thumb();
    let mut r = RandASM::new(StdRng::seed_from_u64(18));
    for encoding in registry.iter().filter(|e| e.is_wide()) {
        let sp_form = encoding.name().contains("SP");
        for _ in 0..200 {
            let instr = encoding.generate(&mut r);
            for op in instr.operands() {
                if let Operand::Reg(reg) = op {
                    assert_ne!(*reg, Register::PC, "{}", encoding.name());
                    if *reg == Register::SP {
                        assert!(sp_form, "{} drew sp", encoding.name());
                    }
                }
            }
        }
    }
}

#[test]
fn test_every_encoding_renders_parseable_text() {
    let registry = Registry::<StdRng>::thumb();
    let mut r = RandASM::new(StdRng::seed_from_u64(1234));
    for encoding in registry.iter() {
        for _ in 0..50 {
            let line = encoding.generate(&mut r).to_string();
            let parsed: Instruction = line.parse().unwrap();
            assert_eq!(parsed.to_string(), line);
            assert_eq!(parsed.mnemonic(), encoding.mnemonic());
        }
    }
}

#[test]
fn test_registry_retain() {
    let registry = Registry::<StdRng>::thumb();
    let total = registry.len();
    let asr = Registry::<StdRng>::thumb().retain(|e| e.mnemonic() == Mnemonic::ASR).unwrap();
    assert_eq!(asr.len(), 4);
    assert!(asr.len() < total);
    let none = Registry::<StdRng>::thumb().retain(|_| false);
    assert!(matches!(none, Err(crate::Error::EmptySelection)));
}
