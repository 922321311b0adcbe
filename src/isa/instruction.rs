//! Bit-exact encode/decode between [`Instruction`] and its wire form.

use std::fmt;

use thiserror::Error;

use crate::bits;
use crate::registers::Register;

use super::format::Format;
use super::table::{Extension, InstId};

const BITMODE_POS: u32 = 0;
const BITMODE_SIZE: u32 = 1;
const OPCODE_POS: u32 = 1;
const OPCODE_SIZE: u32 = 5;
const FUN_POS: u32 = 6;
const SHORTFUN_SIZE: u32 = 2;
const LONGFUN_SIZE: u32 = 6;
const SR2_POS: u32 = 17;
const SR1_POS: u32 = 22;
const DR_POS: u32 = 27;
const REG_SIZE: u32 = 5;

const BRANCH_LOWER_POS: u32 = 8;
const BRANCH_LOWER_SIZE: u32 = 9;
const BRANCH_UPPER_POS: u32 = 27;
const BRANCH_UPPER_SIZE: u32 = 5;
const IMM_IMMEDIATE_POS: u32 = 8;
const IMM_IMMEDIATE_SIZE: u32 = 14;
const SET_IMMEDIATE_POS: u32 = 6;
const SET_IMMEDIATE_SIZE: u32 = 21;
const JUMP_IMMEDIATE_POS: u32 = 6;
const JUMP_IMMEDIATE_SIZE: u32 = 26;

const HALFWORD_IMMEDIATE_POS: u32 = 6;
const HALFWORD_IMMEDIATE_SIZE: u32 = 5;
const HALFWORD_SR_POS: u32 = 6;
const HALFWORD_DR_POS: u32 = 11;

/// A fully-formed machine instruction: opcode identity plus whichever
/// operand fields its format carries. Fields not used by `id`'s format are
/// set to their zero value and ignored by `encode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub id: InstId,
    pub dr: Register,
    pub sr1: Register,
    pub sr2: Register,
    pub immediate: i32,
}

/// Wire-size encoded form: either a 16-bit halfword or a 32-bit fullword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    Halfword(u16),
    Fullword(u32),
}

impl Encoded {
    pub const fn len(self) -> u32 {
        match self {
            Encoded::Halfword(_) => 2,
            Encoded::Fullword(_) => 4,
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unrecognized opcode {opcode:#x} (halfword={is_halfword})")]
    UnknownOpcode { opcode: u8, is_halfword: bool },
    #[error("unrecognized funcode {funcode:#x} for opcode {opcode:#x}")]
    UnknownFuncode { opcode: u8, funcode: u8 },
}

fn apply_extension(val: u32, size: u32, ext: Extension) -> i32 {
    match ext {
        Extension::Sign => bits::sign_extend(val, size),
        Extension::Zero => bits::zero_extend(val, size) as i32,
        Extension::One => bits::one_extend(val, size) as i32,
        Extension::Na => val as i32,
    }
}

impl Instruction {
    pub fn reg(id: InstId, dr: Register, sr1: Register, sr2: Register) -> Self {
        Instruction { id, dr, sr1, sr2, immediate: 0 }
    }

    pub fn immediate(id: InstId, dr: Register, sr1: Register, imm: i32) -> Self {
        Instruction { id, dr, sr1, sr2: Register::Zero, immediate: imm }
    }

    pub fn branch(id: InstId, sr1: Register, sr2: Register, imm: i32) -> Self {
        Instruction { id, dr: Register::Zero, sr1, sr2, immediate: imm }
    }

    pub fn set(id: InstId, dr: Register, imm: i32) -> Self {
        Instruction { id, dr, sr1: Register::Zero, sr2: Register::Zero, immediate: imm }
    }

    pub fn jump(id: InstId, imm: i32) -> Self {
        Instruction { id, dr: Register::Zero, sr1: Register::Zero, sr2: Register::Zero, immediate: imm }
    }

    pub fn half_reg(id: InstId, dr: Register, sr: Register) -> Self {
        Instruction { id, dr, sr1: Register::Zero, sr2: sr, immediate: 0 }
    }

    pub fn half_immediate(id: InstId, dr: Register, imm: i32) -> Self {
        Instruction { id, dr, sr1: Register::Zero, sr2: Register::Zero, immediate: imm }
    }

    pub fn format(&self) -> Format {
        self.id.info().format
    }

    pub fn encoded_len(&self) -> u32 {
        self.format().size()
    }

    pub fn encode(&self) -> Encoded {
        let info = self.id.info();
        if info.format.is_halfword() {
            let mut word = 0u32;
            word = bits::place(word, 0, BITMODE_POS, BITMODE_SIZE);
            word = bits::place(word, info.opcode as u32, OPCODE_POS, OPCODE_SIZE);
            if info.format == Format::HalfImmediate {
                let imm = bits::select(self.immediate as u32, 0, HALFWORD_IMMEDIATE_SIZE);
                word = bits::place(word, imm, HALFWORD_IMMEDIATE_POS, HALFWORD_IMMEDIATE_SIZE);
            } else {
                word = bits::place(word, self.sr2 as u32, HALFWORD_SR_POS, REG_SIZE);
            }
            word = bits::place(word, self.dr as u32, HALFWORD_DR_POS, REG_SIZE);
            Encoded::Halfword(word as u16)
        } else {
            let mut word = 0u32;
            word = bits::place(word, 1, BITMODE_POS, BITMODE_SIZE);
            word = bits::place(word, info.opcode as u32, OPCODE_POS, OPCODE_SIZE);
            let fun_size = if info.format == Format::Reg { LONGFUN_SIZE } else { SHORTFUN_SIZE };
            word = bits::place(word, info.funcode as u32, FUN_POS, fun_size);

            let form = info.format.operand_form();
            if form.sr2 {
                word = bits::place(word, self.sr2 as u32, SR2_POS, REG_SIZE);
            }
            if form.sr1 {
                word = bits::place(word, self.sr1 as u32, SR1_POS, REG_SIZE);
            }
            if form.dr {
                word = bits::place(word, self.dr as u32, DR_POS, REG_SIZE);
            }
            if form.imm {
                word = self.encode_fullword_immediate(word, info.format);
            }
            Encoded::Fullword(word)
        }
    }

    fn encode_fullword_immediate(&self, word: u32, format: Format) -> u32 {
        match format {
            Format::Branch => {
                let shifted = if super::table::is_store_inst(self.id) {
                    self.immediate
                } else {
                    self.immediate / 2
                };
                let lower = bits::select(shifted as u32, 0, BRANCH_LOWER_SIZE);
                let word = bits::place(word, lower, BRANCH_LOWER_POS, BRANCH_LOWER_SIZE);
                let upper = bits::select(shifted as u32, BRANCH_LOWER_SIZE, BRANCH_UPPER_SIZE);
                bits::place(word, upper, BRANCH_UPPER_POS, BRANCH_UPPER_SIZE)
            }
            Format::Immediate => {
                let imm = bits::select(self.immediate as u32, 0, IMM_IMMEDIATE_SIZE);
                bits::place(word, imm, IMM_IMMEDIATE_POS, IMM_IMMEDIATE_SIZE)
            }
            Format::Set => {
                let imm = bits::select(self.immediate as u32, 0, SET_IMMEDIATE_SIZE);
                bits::place(word, imm, SET_IMMEDIATE_POS, SET_IMMEDIATE_SIZE)
            }
            Format::Jump => {
                let shifted = self.immediate / 2;
                let imm = bits::select(shifted as u32, 0, JUMP_IMMEDIATE_SIZE);
                bits::place(word, imm, JUMP_IMMEDIATE_POS, JUMP_IMMEDIATE_SIZE)
            }
            _ => word,
        }
    }

    pub fn decode_fullword(encoded: u32) -> Result<Instruction, DecodeError> {
        let opcode = bits::select(encoded, OPCODE_POS, OPCODE_SIZE) as u8;
        let format = InstId::format_from_encoding(opcode, false)
            .ok_or(DecodeError::UnknownOpcode { opcode, is_halfword: false })?;

        let funcode = match format {
            Format::Immediate | Format::Branch => bits::select(encoded, FUN_POS, SHORTFUN_SIZE) as u8,
            Format::Reg => bits::select(encoded, FUN_POS, LONGFUN_SIZE) as u8,
            _ => 0,
        };

        let id = InstId::from_encoding(opcode, funcode, false)
            .ok_or(DecodeError::UnknownFuncode { opcode, funcode })?;
        let info = id.info();
        let form = format.operand_form();

        let sr2 = if form.sr2 {
            Register::try_from(bits::select(encoded, SR2_POS, REG_SIZE) as u8).unwrap()
        } else {
            Register::Zero
        };
        let sr1 = if form.sr1 {
            Register::try_from(bits::select(encoded, SR1_POS, REG_SIZE) as u8).unwrap()
        } else {
            Register::Zero
        };
        let mut dr = if form.dr {
            Register::try_from(bits::select(encoded, DR_POS, REG_SIZE) as u8).unwrap()
        } else {
            Register::Zero
        };
        if id == InstId::Rjali {
            dr = Register::Ra;
        }

        let immediate = if form.imm {
            Self::decode_fullword_immediate(encoded, id, format, info.extension)
        } else {
            0
        };

        Ok(Instruction { id, dr, sr1, sr2, immediate })
    }

    fn decode_fullword_immediate(encoded: u32, id: InstId, format: Format, ext: Extension) -> i32 {
        match format {
            Format::Immediate => {
                let raw = bits::select(encoded, IMM_IMMEDIATE_POS, IMM_IMMEDIATE_SIZE);
                apply_extension(raw, IMM_IMMEDIATE_SIZE, ext)
            }
            Format::Branch => {
                let lower = bits::select(encoded, BRANCH_LOWER_POS, BRANCH_LOWER_SIZE);
                let upper = bits::select(encoded, BRANCH_UPPER_POS, BRANCH_UPPER_SIZE);
                let raw = lower + (upper << BRANCH_LOWER_SIZE);
                let extended = apply_extension(raw, BRANCH_LOWER_SIZE + BRANCH_UPPER_SIZE, ext);
                if super::table::is_store_inst(id) {
                    extended
                } else {
                    extended << 1
                }
            }
            Format::Set => {
                let raw = bits::select(encoded, SET_IMMEDIATE_POS, SET_IMMEDIATE_SIZE);
                if matches!(id, InstId::Sui | InstId::Apci) {
                    (raw << (32 - SET_IMMEDIATE_SIZE)) as i32
                } else {
                    apply_extension(raw, SET_IMMEDIATE_SIZE, ext)
                }
            }
            Format::Jump => {
                let raw = bits::select(encoded, JUMP_IMMEDIATE_POS, JUMP_IMMEDIATE_SIZE);
                apply_extension(raw, JUMP_IMMEDIATE_SIZE, ext) << 1
            }
            _ => 0,
        }
    }

    pub fn decode_halfword(encoded: u16) -> Result<Instruction, DecodeError> {
        let encoded = encoded as u32;
        let opcode = bits::select(encoded, OPCODE_POS, OPCODE_SIZE) as u8;
        let format = InstId::format_from_encoding(opcode, true)
            .ok_or(DecodeError::UnknownOpcode { opcode, is_halfword: true })?;
        let id = InstId::from_encoding(opcode, 0, true)
            .ok_or(DecodeError::UnknownFuncode { opcode, funcode: 0 })?;
        let info = id.info();

        let dr = Register::try_from(bits::select(encoded, HALFWORD_DR_POS, REG_SIZE) as u8).unwrap();
        let sr1 = if matches!(id, InstId::Mov | InstId::JalrH) { Register::Zero } else { dr };
        let sr2 = if format == Format::HalfReg {
            Register::try_from(bits::select(encoded, HALFWORD_SR_POS, REG_SIZE) as u8).unwrap()
        } else {
            Register::Zero
        };

        let immediate = if format == Format::HalfImmediate {
            let raw = bits::select(encoded, HALFWORD_IMMEDIATE_POS, HALFWORD_IMMEDIATE_SIZE);
            apply_extension(raw, HALFWORD_IMMEDIATE_SIZE, info.extension)
        } else {
            0
        };

        Ok(Instruction { id, dr, sr1, sr2, immediate })
    }

    pub fn decode(encoded: Encoded) -> Result<Instruction, DecodeError> {
        match encoded {
            Encoded::Fullword(w) => Self::decode_fullword(w),
            Encoded::Halfword(w) => Self::decode_halfword(w),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id == InstId::AddH
            && self.dr == Register::Zero
            && self.sr1 == Register::Zero
            && self.sr2 == Register::Zero
        {
            return f.write_str("nop");
        }

        let form = self.format().operand_form();
        write!(f, "{}", self.id)?;
        let mut wrote = false;
        if form.dr {
            write!(f, " {}", self.dr)?;
            wrote = true;
        }
        if form.sr1 {
            write!(f, "{}{}", if wrote { ", " } else { " " }, self.sr1)?;
            wrote = true;
        }
        if form.sr2 {
            write!(f, "{}{}", if wrote { ", " } else { " " }, self.sr2)?;
            wrote = true;
        }
        if form.imm {
            write!(f, "{}{}", if wrote { ", " } else { " " }, self.immediate)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reg_instruction_round_trips() {
        let inst = Instruction::reg(InstId::Add, Register::T0, Register::T1, Register::T2);
        let encoded = inst.encode();
        assert_eq!(Instruction::decode(encoded).unwrap(), inst);
    }

    #[test]
    fn halfword_reg_round_trips() {
        let inst = Instruction::half_reg(InstId::AddH, Register::S0, Register::S1);
        let encoded = inst.encode();
        assert!(matches!(encoded, Encoded::Halfword(_)));
        assert_eq!(Instruction::decode(encoded).unwrap(), inst);
    }

    #[test]
    fn immediate_sign_extends() {
        let inst = Instruction::immediate(InstId::Addi, Register::T0, Register::T1, -100);
        let decoded = Instruction::decode(inst.encode()).unwrap();
        assert_eq!(decoded.immediate, -100);
    }

    #[test]
    fn branch_store_is_not_halved() {
        let inst = Instruction::branch(InstId::Sw, Register::T0, Register::T1, 42);
        let decoded = Instruction::decode(inst.encode()).unwrap();
        assert_eq!(decoded.immediate, 42);
    }

    #[test]
    fn branch_non_store_round_trips_even_offsets() {
        let inst = Instruction::branch(InstId::Beq, Register::T0, Register::T1, -200);
        let decoded = Instruction::decode(inst.encode()).unwrap();
        assert_eq!(decoded.immediate, -200);
    }

    #[test]
    fn jump_round_trips_even_offsets() {
        let inst = Instruction::jump(InstId::Rji, 1024);
        let decoded = Instruction::decode(inst.encode()).unwrap();
        assert_eq!(decoded.immediate, 1024);
    }

    #[test]
    fn sui_decode_shifts_rather_than_inverts() {
        // Sui/Apci store a pre-shifted 21-bit quantity; decode widens it
        // back to a full-scale address instead of sign-extending it.
        let inst = Instruction::set(InstId::Sui, Register::T0, 5);
        let decoded = Instruction::decode(inst.encode()).unwrap();
        assert_eq!(decoded.immediate, 5 << 11);
    }

    #[test]
    fn rjali_decode_forces_dr_to_ra() {
        let inst = Instruction::jump(InstId::Rjali, 16);
        let decoded = Instruction::decode(inst.encode()).unwrap();
        assert_eq!(decoded.dr, Register::Ra);
    }

    #[test]
    fn display_nop() {
        let inst = Instruction::half_reg(InstId::AddH, Register::Zero, Register::Zero);
        assert_eq!(inst.to_string(), "nop");
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        // bitmode=1 (fullword), opcode=0x1F is unassigned.
        let word = bits::place(0, 1, BITMODE_POS, BITMODE_SIZE);
        let word = bits::place(word, 0x1F, OPCODE_POS, OPCODE_SIZE);
        assert!(matches!(
            Instruction::decode_fullword(word),
            Err(DecodeError::UnknownOpcode { .. })
        ));
    }
}
