//! The authoritative instruction-ID table: one row per mnemonic, binding
//! it to an opcode, a funcode, a format, and an immediate-extension rule.
//! This table is the single source of truth for binary compatibility —
//! every encoder/decoder consults it, nothing hardcodes an opcode elsewhere.

use std::fmt;

use super::format::Format;

/// How a narrower-than-32-bit immediate field is widened back to `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// Missing high bits become 1.
    One,
    /// Missing high bits become 0.
    Zero,
    /// Missing high bits copy the sign bit.
    Sign,
    /// Not applicable — the field isn't extended (e.g. `Sui`/`Apci`, which
    /// shift instead; see `Instruction::decode_set_immediate`).
    Na,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(non_camel_case_types)]
pub enum InstId {
    // register instructions
    Add,
    Sub,
    Mult,
    Div,
    Multu,
    Divu,
    Eql,
    Neql,
    Grt,
    Gre,
    Grtu,
    Greu,
    Lsft,
    Rsft,
    Rsfta,
    Or,
    And,
    Xor,
    Nor,
    Nand,
    Xnor,

    // branch instructions
    Sb,
    Sh,
    Sw,
    Beq,
    Bne,
    Bgr,
    Bgru,
    Bge,
    Bgeu,

    // immediate instructions
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Xori,
    Ori,
    Andi,
    Addi,
    Multi,
    Divi,
    Multui,
    Divui,
    Jalr,

    // set instructions
    Sli,
    Sui,
    Apci,

    // jump instructions
    Rji,
    Rjali,

    // halfword register instructions
    AddH,
    SubH,
    MultH,
    DivH,
    MultuH,
    DivuH,
    NandH,
    NorH,
    XnorH,
    EqlH,
    GrtH,
    GreH,
    GrtuH,
    GreuH,
    LsftH,
    RsftH,
    RsftaH,
    JalrH,
    Mov,

    // halfword immediate instructions
    Lsfti,
    Rsfti,
    Rsftia,
    Incr,
    Decr,
}

impl InstId {
    pub const ALL: [InstId; 73] = [
        InstId::Add,
        InstId::Sub,
        InstId::Mult,
        InstId::Div,
        InstId::Multu,
        InstId::Divu,
        InstId::Eql,
        InstId::Neql,
        InstId::Grt,
        InstId::Gre,
        InstId::Grtu,
        InstId::Greu,
        InstId::Lsft,
        InstId::Rsft,
        InstId::Rsfta,
        InstId::Or,
        InstId::And,
        InstId::Xor,
        InstId::Nor,
        InstId::Nand,
        InstId::Xnor,
        InstId::Sb,
        InstId::Sh,
        InstId::Sw,
        InstId::Beq,
        InstId::Bne,
        InstId::Bgr,
        InstId::Bgru,
        InstId::Bge,
        InstId::Bgeu,
        InstId::Lb,
        InstId::Lh,
        InstId::Lw,
        InstId::Lbu,
        InstId::Lhu,
        InstId::Xori,
        InstId::Ori,
        InstId::Andi,
        InstId::Addi,
        InstId::Multi,
        InstId::Divi,
        InstId::Multui,
        InstId::Divui,
        InstId::Jalr,
        InstId::Sli,
        InstId::Sui,
        InstId::Apci,
        InstId::Rji,
        InstId::Rjali,
        InstId::AddH,
        InstId::SubH,
        InstId::MultH,
        InstId::DivH,
        InstId::MultuH,
        InstId::DivuH,
        InstId::NandH,
        InstId::NorH,
        InstId::XnorH,
        InstId::EqlH,
        InstId::GrtH,
        InstId::GreH,
        InstId::GrtuH,
        InstId::GreuH,
        InstId::LsftH,
        InstId::RsftH,
        InstId::RsftaH,
        InstId::JalrH,
        InstId::Mov,
        InstId::Lsfti,
        InstId::Rsfti,
        InstId::Rsftia,
        InstId::Incr,
        InstId::Decr,
    ];

    pub const fn info(self) -> InstType {
        use Extension::*;
        use Format::*;
        match self {
            // branch instructions — opcode/funcode pairs reproduced
            // verbatim, including the Beq/Bgr and Bgru/Bge collisions.
            InstId::Sb => InstType { format: Branch, opcode: 0x0, funcode: 0x0, extension: Sign },
            InstId::Sh => InstType { format: Branch, opcode: 0x0, funcode: 0x1, extension: Sign },
            InstId::Sw => InstType { format: Branch, opcode: 0x0, funcode: 0x2, extension: Sign },
            InstId::Beq => InstType { format: Branch, opcode: 0x1, funcode: 0x0, extension: Sign },
            InstId::Bne => InstType { format: Branch, opcode: 0x1, funcode: 0x1, extension: Sign },
            InstId::Bgr => InstType { format: Branch, opcode: 0x1, funcode: 0x0, extension: Sign },
            InstId::Bgru => InstType { format: Branch, opcode: 0x2, funcode: 0x1, extension: Sign },
            InstId::Bge => InstType { format: Branch, opcode: 0x2, funcode: 0x2, extension: Sign },
            InstId::Bgeu => InstType { format: Branch, opcode: 0x2, funcode: 0x3, extension: Sign },

            // immediate instructions
            InstId::Lb => InstType { format: Immediate, opcode: 0x3, funcode: 0x0, extension: Sign },
            InstId::Lh => InstType { format: Immediate, opcode: 0x3, funcode: 0x1, extension: Sign },
            InstId::Lw => InstType { format: Immediate, opcode: 0x3, funcode: 0x2, extension: Sign },
            InstId::Lbu => InstType { format: Immediate, opcode: 0x4, funcode: 0x0, extension: Sign },
            InstId::Lhu => InstType { format: Immediate, opcode: 0x4, funcode: 0x1, extension: Sign },
            InstId::Xori => InstType { format: Immediate, opcode: 0x5, funcode: 0x0, extension: Zero },
            InstId::Ori => InstType { format: Immediate, opcode: 0x5, funcode: 0x1, extension: Zero },
            InstId::Andi => InstType { format: Immediate, opcode: 0x5, funcode: 0x2, extension: One },
            InstId::Addi => InstType { format: Immediate, opcode: 0x6, funcode: 0x0, extension: Sign },
            InstId::Jalr => InstType { format: Immediate, opcode: 0x6, funcode: 0x1, extension: Sign },
            InstId::Multi => InstType { format: Immediate, opcode: 0x7, funcode: 0x0, extension: Sign },
            InstId::Divi => InstType { format: Immediate, opcode: 0x7, funcode: 0x1, extension: Sign },
            InstId::Multui => InstType { format: Immediate, opcode: 0x7, funcode: 0x2, extension: Zero },
            InstId::Divui => InstType { format: Immediate, opcode: 0x7, funcode: 0x3, extension: Zero },

            // set instructions
            InstId::Sli => InstType { format: Set, opcode: 0x8, funcode: 0x0, extension: Sign },
            InstId::Sui => InstType { format: Set, opcode: 0x9, funcode: 0x0, extension: Na },
            InstId::Apci => InstType { format: Set, opcode: 0xA, funcode: 0x0, extension: Na },

            // register instructions
            InstId::Add => InstType { format: Reg, opcode: 0xB, funcode: 0x0, extension: Na },
            InstId::Sub => InstType { format: Reg, opcode: 0xB, funcode: 0x1, extension: Na },
            InstId::Mult => InstType { format: Reg, opcode: 0xB, funcode: 0x2, extension: Na },
            InstId::Div => InstType { format: Reg, opcode: 0xB, funcode: 0x3, extension: Na },
            InstId::Multu => InstType { format: Reg, opcode: 0xB, funcode: 0x4, extension: Na },
            InstId::Divu => InstType { format: Reg, opcode: 0xB, funcode: 0x5, extension: Na },
            InstId::Eql => InstType { format: Reg, opcode: 0xB, funcode: 0x6, extension: Na },
            InstId::Neql => InstType { format: Reg, opcode: 0xB, funcode: 0x7, extension: Na },
            InstId::Grt => InstType { format: Reg, opcode: 0xB, funcode: 0x8, extension: Na },
            InstId::Gre => InstType { format: Reg, opcode: 0xB, funcode: 0x9, extension: Na },
            InstId::Grtu => InstType { format: Reg, opcode: 0xB, funcode: 0xA, extension: Na },
            InstId::Greu => InstType { format: Reg, opcode: 0xB, funcode: 0xB, extension: Na },
            InstId::Lsft => InstType { format: Reg, opcode: 0xB, funcode: 0xC, extension: Na },
            InstId::Rsft => InstType { format: Reg, opcode: 0xB, funcode: 0xD, extension: Na },
            InstId::Rsfta => InstType { format: Reg, opcode: 0xB, funcode: 0xE, extension: Na },
            InstId::Or => InstType { format: Reg, opcode: 0xB, funcode: 0xF, extension: Na },
            InstId::And => InstType { format: Reg, opcode: 0xB, funcode: 0x10, extension: Na },
            InstId::Xor => InstType { format: Reg, opcode: 0xB, funcode: 0x11, extension: Na },
            InstId::Nor => InstType { format: Reg, opcode: 0xB, funcode: 0x12, extension: Na },
            InstId::Nand => InstType { format: Reg, opcode: 0xB, funcode: 0x13, extension: Na },
            InstId::Xnor => InstType { format: Reg, opcode: 0xB, funcode: 0x14, extension: Na },

            // jump instructions
            InstId::Rji => InstType { format: Jump, opcode: 0xC, funcode: 0x0, extension: Sign },
            InstId::Rjali => InstType { format: Jump, opcode: 0xD, funcode: 0x0, extension: Sign },

            // halfword register instructions
            InstId::AddH => InstType { format: HalfReg, opcode: 0x0, funcode: 0x0, extension: Na },
            InstId::SubH => InstType { format: HalfReg, opcode: 0x1, funcode: 0x0, extension: Na },
            InstId::MultH => InstType { format: HalfReg, opcode: 0x2, funcode: 0x0, extension: Na },
            InstId::DivH => InstType { format: HalfReg, opcode: 0x3, funcode: 0x0, extension: Na },
            InstId::MultuH => InstType { format: HalfReg, opcode: 0x4, funcode: 0x0, extension: Na },
            InstId::DivuH => InstType { format: HalfReg, opcode: 0x5, funcode: 0x0, extension: Na },
            InstId::NandH => InstType { format: HalfReg, opcode: 0x6, funcode: 0x0, extension: Na },
            InstId::NorH => InstType { format: HalfReg, opcode: 0x7, funcode: 0x0, extension: Na },
            InstId::XnorH => InstType { format: HalfReg, opcode: 0x8, funcode: 0x0, extension: Na },
            InstId::EqlH => InstType { format: HalfReg, opcode: 0x9, funcode: 0x0, extension: Na },
            InstId::GrtH => InstType { format: HalfReg, opcode: 0xA, funcode: 0x0, extension: Na },
            InstId::GreH => InstType { format: HalfReg, opcode: 0xB, funcode: 0x0, extension: Na },
            InstId::GrtuH => InstType { format: HalfReg, opcode: 0xC, funcode: 0x0, extension: Na },
            InstId::GreuH => InstType { format: HalfReg, opcode: 0xD, funcode: 0x0, extension: Na },
            InstId::LsftH => InstType { format: HalfReg, opcode: 0xE, funcode: 0x0, extension: Na },
            InstId::RsftH => InstType { format: HalfReg, opcode: 0xF, funcode: 0x0, extension: Na },
            InstId::RsftaH => InstType { format: HalfReg, opcode: 0x10, funcode: 0x0, extension: Na },
            InstId::JalrH => InstType { format: HalfReg, opcode: 0x11, funcode: 0x0, extension: Na },
            InstId::Mov => InstType { format: HalfReg, opcode: 0x13, funcode: 0x0, extension: Na },

            // halfword immediate instructions
            InstId::Lsfti => InstType { format: HalfImmediate, opcode: 0x14, funcode: 0x0, extension: Zero },
            InstId::Rsfti => InstType { format: HalfImmediate, opcode: 0x15, funcode: 0x0, extension: Zero },
            InstId::Rsftia => InstType { format: HalfImmediate, opcode: 0x16, funcode: 0x0, extension: Zero },
            InstId::Incr => InstType { format: HalfImmediate, opcode: 0x17, funcode: 0x0, extension: Zero },
            InstId::Decr => InstType { format: HalfImmediate, opcode: 0x18, funcode: 0x0, extension: One },
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            InstId::Add => "add",
            InstId::Sub => "sub",
            InstId::Mult => "mult",
            InstId::Div => "div",
            InstId::Multu => "multu",
            InstId::Divu => "divu",
            InstId::Eql => "eql",
            InstId::Neql => "neql",
            InstId::Grt => "grt",
            InstId::Gre => "gre",
            InstId::Grtu => "grtu",
            InstId::Greu => "greu",
            InstId::Lsft => "lsft",
            InstId::Rsft => "rsft",
            InstId::Rsfta => "rsfta",
            InstId::Or => "or",
            InstId::And => "and",
            InstId::Xor => "xor",
            InstId::Nor => "nor",
            InstId::Nand => "nand",
            InstId::Xnor => "xnor",
            InstId::Sb => "sb",
            InstId::Sh => "sh",
            InstId::Sw => "sw",
            InstId::Beq => "beq",
            InstId::Bne => "bne",
            InstId::Bgr => "bgr",
            InstId::Bgru => "bgru",
            InstId::Bge => "bge",
            InstId::Bgeu => "bgeu",
            InstId::Lb => "lb",
            InstId::Lh => "lh",
            InstId::Lw => "lw",
            InstId::Lbu => "lbu",
            InstId::Lhu => "lhu",
            InstId::Xori => "xori",
            InstId::Ori => "ori",
            InstId::Andi => "andi",
            InstId::Addi => "addi",
            InstId::Multi => "multi",
            InstId::Divi => "divi",
            InstId::Multui => "multui",
            InstId::Divui => "divui",
            InstId::Jalr => "jalr",
            InstId::Sli => "sli",
            InstId::Sui => "sui",
            InstId::Apci => "apci",
            InstId::Rji => "rji",
            InstId::Rjali => "rjali",
            InstId::AddH => "add_h",
            InstId::SubH => "sub_h",
            InstId::MultH => "mult_h",
            InstId::DivH => "div_h",
            InstId::MultuH => "multu_h",
            InstId::DivuH => "divu_h",
            InstId::NandH => "nand_h",
            InstId::NorH => "nor_h",
            InstId::XnorH => "xnor_h",
            InstId::EqlH => "eql_h",
            InstId::GrtH => "grt_h",
            InstId::GreH => "gre_h",
            InstId::GrtuH => "grtu_h",
            InstId::GreuH => "greu_h",
            InstId::LsftH => "lsft_h",
            InstId::RsftH => "rsft_h",
            InstId::RsftaH => "rsfta_h",
            InstId::JalrH => "jalr_h",
            InstId::Mov => "mov",
            InstId::Lsfti => "lsfti",
            InstId::Rsfti => "rsfti",
            InstId::Rsftia => "rsftia",
            InstId::Incr => "incr",
            InstId::Decr => "decr",
        }
    }

    /// Reverse lookup by `(opcode, funcode, is_halfword)`. Used by the
    /// decoder. Linear scan mirrors the source table's own lookup helper;
    /// the table is small (74 rows) and decode is not hot-path here.
    pub fn from_encoding(opcode: u8, funcode: u8, is_halfword: bool) -> Option<InstId> {
        InstId::ALL.into_iter().find(|id| {
            let info = id.info();
            info.opcode == opcode && info.funcode == funcode && info.format.is_halfword() == is_halfword
        })
    }

    /// Reverse lookup of just the format for a given `(opcode, is_halfword)`,
    /// used before the funcode width (2 vs 6 bits) is known.
    pub fn format_from_encoding(opcode: u8, is_halfword: bool) -> Option<Format> {
        InstId::ALL
            .into_iter()
            .map(|id| id.info())
            .find(|info| info.opcode == opcode && info.format.is_halfword() == is_halfword)
            .map(|info| info.format)
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The opcode/funcode/format/extension a given `InstId` encodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstType {
    pub format: Format,
    pub opcode: u8,
    pub funcode: u8,
    pub extension: Extension,
}

/// Whether `id` is one of the three store instructions (`Sb`, `Sh`, `Sw`).
/// The displacement for these is encoded without the `/2` scaling applied
/// to branch targets, since byte/halfword/word addresses are not
/// necessarily even.
pub const fn is_store_inst(id: InstId) -> bool {
    matches!(id, InstId::Sb | InstId::Sh | InstId::Sw)
}

/// Whether `id` is one of the five load instructions.
pub const fn is_load_inst(id: InstId) -> bool {
    matches!(id, InstId::Lb | InstId::Lh | InstId::Lw | InstId::Lbu | InstId::Lhu)
}
