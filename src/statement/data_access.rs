//! `op data_reg, base_reg[, offset]` and `op data_reg, label` loads/stores.

use crate::ast::Arg;
use crate::bits::{signed_bitwidth, Alignment};
use crate::isa::{is_store_inst, InstId, Instruction};
use crate::registers::Register;
use crate::symbol::{RelocKind, Scope, SymbolTable};

use super::{LabelRef, StatementError, BRANCH_OFFSET_BITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAccessCase {
    /// Register base, offset fits in the format's split immediate.
    ShortReg,
    /// Register base, offset out of range: `Sui` + `Add` + access.
    LongReg,
    /// Symbol base: `Sui` (absolute address) + access.
    Label,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base {
    Register(Register, i32),
    Label(LabelRef),
}

fn mnemonic_to_id(mnemonic: &str) -> Option<InstId> {
    Some(match mnemonic {
        "lb" => InstId::Lb,
        "lh" => InstId::Lh,
        "lw" => InstId::Lw,
        "lbu" => InstId::Lbu,
        "lhu" => InstId::Lhu,
        "sb" => InstId::Sb,
        "sh" => InstId::Sh,
        "sw" => InstId::Sw,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAccessStatement {
    pub id: InstId,
    pub data_reg: Register,
    pub base: Base,
}

impl DataAccessStatement {
    pub fn parse(mnemonic: &str, args: &[Arg]) -> Result<Option<DataAccessStatement>, StatementError> {
        let Some(id) = mnemonic_to_id(mnemonic) else { return Ok(None) };
        let parse_reg = |s: &str| {
            s.parse::<Register>().map_err(|_| StatementError::BadOperandKind { mnemonic: mnemonic.to_string() })
        };
        let base = match args {
            [Arg::Register(_), Arg::Register(base)] => Base::Register(parse_reg(base)?, 0),
            [Arg::Register(_), Arg::Register(base), Arg::Integer(offset)] => {
                Base::Register(parse_reg(base)?, *offset as i32)
            }
            [Arg::Register(_), Arg::Label(label)] => Base::Label(LabelRef::new(label.clone())),
            other => {
                return Err(StatementError::WrongOperandCount {
                    mnemonic: mnemonic.to_string(),
                    expected: "data_reg, base[, offset] or data_reg, label",
                    got: other.len(),
                })
            }
        };
        let Arg::Register(data_reg) = &args[0] else { unreachable!() };
        Ok(Some(DataAccessStatement { id, data_reg: parse_reg(data_reg)?, base }))
    }

    pub const fn worst_case_size(&self) -> u32 {
        match &self.base {
            // Can't know yet whether the register offset will fit; assume
            // the worst so pass 1 never under-sizes.
            Base::Register(..) => Self::size(DataAccessCase::LongReg),
            Base::Label(_) => Self::size(DataAccessCase::Label),
        }
    }

    pub fn compile_case(&self) -> DataAccessCase {
        match &self.base {
            Base::Register(_, offset) => {
                if signed_bitwidth(*offset).saturating_sub(1) <= BRANCH_OFFSET_BITS {
                    DataAccessCase::ShortReg
                } else {
                    DataAccessCase::LongReg
                }
            }
            Base::Label(_) => DataAccessCase::Label,
        }
    }

    pub const fn size(case: DataAccessCase) -> u32 {
        match case {
            DataAccessCase::ShortReg => 4,
            DataAccessCase::LongReg => 12,
            DataAccessCase::Label => 8,
        }
    }

    /// All three cases are word-aligned: even `ShortReg`'s single
    /// instruction uses a fullword format.
    pub const fn alignment(_case: DataAccessCase) -> Alignment {
        Alignment::Word
    }

    pub const fn worst_case_alignment(&self) -> Alignment {
        Alignment::Word
    }

    fn access_inst(&self, base_reg: Register, offset: i32) -> Instruction {
        if is_store_inst(self.id) {
            Instruction::branch(self.id, base_reg, self.data_reg, offset)
        } else {
            Instruction::immediate(self.id, self.data_reg, base_reg, offset)
        }
    }

    pub fn gen(&self, case: DataAccessCase, symbols: &SymbolTable) -> Vec<Instruction> {
        match case {
            DataAccessCase::ShortReg => {
                let Base::Register(base_reg, offset) = self.base else { unreachable!() };
                vec![self.access_inst(base_reg, offset)]
            }
            DataAccessCase::LongReg => {
                let Base::Register(base_reg, offset) = self.base else { unreachable!() };
                let upper = (offset as u32) >> 11;
                let lower = (offset as u32) & 0x7FF;
                vec![
                    Instruction::set(InstId::Sui, Register::Ar, upper as i32),
                    Instruction::reg(InstId::Add, Register::Ar, Register::Ar, base_reg),
                    self.access_inst(Register::Ar, lower as i32),
                ]
            }
            DataAccessCase::Label => {
                let Base::Label(label) = &self.base else { unreachable!() };
                let address = symbols.get(label.symbol_id).address as i32;
                let upper = (address as u32) >> 11;
                let lower = (address as u32) & 0x7FF;
                vec![Instruction::set(InstId::Sui, Register::Ar, upper as i32), self.access_inst(Register::Ar, lower as i32)]
            }
        }
    }

    /// The relocation recorded against the `Sui` instruction's address; only
    /// the symbol-based case needs a patch.
    pub fn reloc_kind(&self, case: DataAccessCase, symbols: &SymbolTable) -> Option<RelocKind> {
        if case != DataAccessCase::Label {
            return None;
        }
        let Base::Label(label) = &self.base else { return None };
        let external = symbols.get(label.symbol_id).scope == Scope::External;
        let store = is_store_inst(self.id);
        Some(match (store, external) {
            (true, true) => RelocKind::SymrLongStore,
            (true, false) => RelocKind::SecrLongStore,
            (false, true) => RelocKind::SymrLongLoad,
            (false, false) => RelocKind::SecrLongLoad,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Section, Symbol, SymbolType};

    #[test]
    fn small_offset_is_short() {
        let stmt = DataAccessStatement::parse(
            "lw",
            &[Arg::Register("t0".into()), Arg::Register("s0".into()), Arg::Integer(16)],
        )
        .unwrap()
        .unwrap();
        assert_eq!(stmt.compile_case(), DataAccessCase::ShortReg);
    }

    #[test]
    fn omitted_offset_defaults_to_zero() {
        let stmt = DataAccessStatement::parse("lw", &[Arg::Register("t0".into()), Arg::Register("s0".into())])
            .unwrap()
            .unwrap();
        assert_eq!(stmt.base, Base::Register(Register::S0, 0));
    }

    #[test]
    fn large_offset_is_long() {
        let stmt = DataAccessStatement::parse(
            "lw",
            &[Arg::Register("t0".into()), Arg::Register("s0".into()), Arg::Integer(1 << 20)],
        )
        .unwrap()
        .unwrap();
        assert_eq!(stmt.compile_case(), DataAccessCase::LongReg);
        assert_eq!(DataAccessStatement::size(DataAccessCase::LongReg), 12);
    }

    #[test]
    fn store_uses_branch_format() {
        let stmt = DataAccessStatement::parse(
            "sw",
            &[Arg::Register("t0".into()), Arg::Register("s0".into()), Arg::Integer(4)],
        )
        .unwrap()
        .unwrap();
        let insts = stmt.gen(DataAccessCase::ShortReg, &SymbolTable::new());
        assert_eq!(insts[0].id, InstId::Sw);
        assert_eq!(insts[0].sr1, Register::S0);
        assert_eq!(insts[0].sr2, Register::T0);
    }

    #[test]
    fn label_base_relocates_against_sui() {
        let mut symbols = SymbolTable::new();
        let id = symbols
            .insert(Symbol {
                section: Section::Data,
                identifier: "buf".into(),
                address: 0x3000,
                sym_type: SymbolType::Data,
                scope: Scope::Local,
                size: 4,
            })
            .unwrap();
        let mut label = LabelRef::new("buf");
        label.symbol_id = id;
        let stmt = DataAccessStatement { id: InstId::Lw, data_reg: Register::T0, base: Base::Label(label) };
        assert_eq!(stmt.compile_case(), DataAccessCase::Label);
        assert_eq!(stmt.reloc_kind(DataAccessCase::Label, &symbols), Some(RelocKind::SecrLongLoad));
    }
}
