//! `set dr, source` where `source` is an integer, a register, or a label.

use crate::ast::Arg;
use crate::bits::{signed_bitwidth, Alignment};
use crate::isa::{InstId, Instruction};
use crate::registers::Register;
use crate::symbol::{RelocKind, Scope, SymbolTable, SymbolType};

use super::{LabelRef, StatementError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetCase {
    /// Value's signed bit width is within the 14-bit immediate-arithmetic
    /// threshold: a single `Sli`. (The `Sli` field itself is 21 bits wide,
    /// but the cutoff for this case is the narrower 14-bit threshold.)
    IntLowerFit,
    /// Low 11 bits are zero: a single `Sui` covers the whole value.
    IntUpperFit,
    /// General 32-bit integer: `Sui` + `Addi`.
    IntFull,
    /// Label in a data section: absolute-address `Sui` + `Addi`.
    DataLabel,
    /// Label in `.text`: pc-relative `Apci` + `Addi`.
    PcRel,
    /// Register source: a single halfword `Mov`.
    RegMov,
    /// Label source whose symbol isn't resolved yet (sizing pass only;
    /// same worst-case size as `DataLabel`/`PcRel`).
    Undetermined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Integer(i64),
    Register(Register),
    Label(LabelRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetStatement {
    pub dr: Register,
    pub source: Source,
}

impl SetStatement {
    pub fn parse(mnemonic: &str, args: &[Arg]) -> Result<Option<SetStatement>, StatementError> {
        if mnemonic != "set" {
            return Ok(None);
        }
        let [dr_arg, src_arg] = args else {
            return Err(StatementError::WrongOperandCount {
                mnemonic: mnemonic.to_string(),
                expected: "dr, source",
                got: args.len(),
            });
        };
        let Arg::Register(dr) = dr_arg else {
            return Err(StatementError::BadOperandKind { mnemonic: mnemonic.to_string() });
        };
        let dr = dr.parse::<Register>().map_err(|_| StatementError::BadOperandKind { mnemonic: mnemonic.to_string() })?;
        let source = match src_arg {
            Arg::Integer(v) => Source::Integer(*v),
            Arg::Label(name) => Source::Label(LabelRef::new(name.clone())),
            Arg::Register(r) => Source::Register(
                r.parse::<Register>().map_err(|_| StatementError::BadOperandKind { mnemonic: mnemonic.to_string() })?,
            ),
            Arg::Str(_) => return Err(StatementError::BadOperandKind { mnemonic: mnemonic.to_string() }),
        };
        Ok(Some(SetStatement { dr, source }))
    }

    fn integer_case(value: i64) -> SetCase {
        if signed_bitwidth(value as i32) <= 14 {
            SetCase::IntLowerFit
        } else if (value as u32) & 0x7FF == 0 {
            SetCase::IntUpperFit
        } else {
            SetCase::IntFull
        }
    }

    pub fn worst_case_size(&self) -> u32 {
        match &self.source {
            Source::Integer(v) => Self::size(Self::integer_case(*v)),
            Source::Register(_) => Self::size(SetCase::RegMov),
            Source::Label(_) => Self::size(SetCase::Undetermined),
        }
    }

    /// Final compile case, resolved once the symbol table is complete.
    pub fn compile_case(&self, symbols: &SymbolTable) -> SetCase {
        match &self.source {
            Source::Integer(v) => Self::integer_case(*v),
            Source::Register(_) => SetCase::RegMov,
            Source::Label(label) => {
                let symbol = symbols.get(label.symbol_id);
                if symbol.sym_type == SymbolType::Function {
                    SetCase::PcRel
                } else {
                    SetCase::DataLabel
                }
            }
        }
    }

    pub const fn size(case: SetCase) -> u32 {
        match case {
            SetCase::IntLowerFit | SetCase::IntUpperFit => 4,
            SetCase::IntFull | SetCase::DataLabel | SetCase::PcRel | SetCase::Undetermined => 8,
            SetCase::RegMov => 2,
        }
    }

    pub const fn alignment(case: SetCase) -> Alignment {
        match case {
            SetCase::RegMov => Alignment::Halfword,
            SetCase::IntLowerFit
            | SetCase::IntUpperFit
            | SetCase::IntFull
            | SetCase::DataLabel
            | SetCase::PcRel
            | SetCase::Undetermined => Alignment::Word,
        }
    }

    pub fn worst_case_alignment(&self) -> Alignment {
        match &self.source {
            Source::Integer(v) => Self::alignment(Self::integer_case(*v)),
            Source::Register(_) => Self::alignment(SetCase::RegMov),
            Source::Label(_) => Self::alignment(SetCase::Undetermined),
        }
    }

    fn split(value: i32) -> (u32, u32) {
        ((value as u32) >> 11, (value as u32) & 0x7FF)
    }

    pub fn gen(&self, case: SetCase, pc: u32, symbols: &SymbolTable) -> Vec<Instruction> {
        match case {
            SetCase::IntLowerFit => {
                let Source::Integer(v) = self.source else { unreachable!() };
                vec![Instruction::set(InstId::Sli, self.dr, v as i32)]
            }
            SetCase::IntUpperFit => {
                let Source::Integer(v) = self.source else { unreachable!() };
                let (upper, _) = Self::split(v as i32);
                vec![Instruction::set(InstId::Sui, self.dr, upper as i32)]
            }
            SetCase::IntFull => {
                let Source::Integer(v) = self.source else { unreachable!() };
                let (upper, lower) = Self::split(v as i32);
                vec![
                    Instruction::set(InstId::Sui, self.dr, upper as i32),
                    Instruction::immediate(InstId::Addi, self.dr, self.dr, lower as i32),
                ]
            }
            SetCase::DataLabel => {
                let Source::Label(label) = &self.source else { unreachable!() };
                let address = symbols.get(label.symbol_id).address as i32;
                let (upper, lower) = Self::split(address);
                vec![
                    Instruction::set(InstId::Sui, self.dr, upper as i32),
                    Instruction::immediate(InstId::Addi, self.dr, self.dr, lower as i32),
                ]
            }
            SetCase::PcRel => {
                let Source::Label(label) = &self.source else { unreachable!() };
                let address = symbols.get(label.symbol_id).address as i32;
                let displacement = address.wrapping_sub(pc as i32);
                let (upper, lower) = Self::split(displacement);
                vec![
                    Instruction::set(InstId::Apci, self.dr, upper as i32),
                    Instruction::immediate(InstId::Addi, self.dr, self.dr, lower as i32),
                ]
            }
            SetCase::RegMov => {
                let Source::Register(src) = self.source else { unreachable!() };
                vec![Instruction::half_reg(InstId::Mov, self.dr, src)]
            }
            SetCase::Undetermined => {
                unreachable!("Undetermined is a sizing-pass-only placeholder")
            }
        }
    }

    /// The relocation recorded against `pc` (the address of the `Sui`/
    /// `Apci` instruction) for label sources. Returns `None` for
    /// integer/register sources, which need no patch.
    pub fn reloc_kind(&self, case: SetCase, symbols: &SymbolTable) -> Option<RelocKind> {
        let Source::Label(label) = &self.source else { return None };
        let external = symbols.get(label.symbol_id).scope == Scope::External;
        Some(match case {
            SetCase::DataLabel => {
                if external {
                    RelocKind::SymrLongStore
                } else {
                    RelocKind::SecrLongStore
                }
            }
            SetCase::PcRel => {
                if external {
                    RelocKind::LongJump
                } else {
                    RelocKind::Dummy
                }
            }
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Section, Symbol};

    #[test]
    fn small_integer_is_lower_fit() {
        let stmt = SetStatement::parse("set", &[Arg::Register("t0".into()), Arg::Integer(100)]).unwrap().unwrap();
        assert_eq!(stmt.worst_case_size(), 4);
    }

    #[test]
    fn zero_low_bits_is_upper_fit() {
        let stmt =
            SetStatement::parse("set", &[Arg::Register("t0".into()), Arg::Integer(1 << 15)]).unwrap().unwrap();
        assert_eq!(SetStatement::integer_case(1 << 15), SetCase::IntUpperFit);
        let _ = stmt;
    }

    #[test]
    fn value_over_fourteen_bits_with_ragged_low_bits_is_not_lower_fit() {
        assert_eq!(SetStatement::integer_case((1 << 14) + 1), SetCase::IntFull);
    }

    #[test]
    fn large_ragged_integer_is_full() {
        assert_eq!(SetStatement::integer_case((1 << 20) + 3), SetCase::IntFull);
    }

    #[test]
    fn int_full_round_trips_through_sui_plus_addi() {
        let value = 0x1234_5678u32 as i32;
        let stmt = SetStatement::parse("set", &[Arg::Register("t0".into()), Arg::Integer(value as i64)])
            .unwrap()
            .unwrap();
        let symbols = SymbolTable::new();
        let insts = stmt.gen(SetCase::IntFull, 0, &symbols);
        let sui = insts[0].encode();
        let decoded_sui = Instruction::decode(sui).unwrap();
        let addi_low = insts[1].immediate;
        let reconstructed = decoded_sui.immediate + addi_low;
        assert_eq!(reconstructed, value);
    }

    #[test]
    fn data_label_uses_absolute_address() {
        let mut symbols = SymbolTable::new();
        let id = symbols
            .insert(Symbol {
                section: Section::Data,
                identifier: "x".into(),
                address: 0x2000,
                sym_type: SymbolType::Data,
                scope: Scope::Local,
                size: 4,
            })
            .unwrap();
        let mut label = LabelRef::new("x");
        label.symbol_id = id;
        let stmt = SetStatement { dr: Register::T0, source: Source::Label(label) };
        assert_eq!(stmt.compile_case(&symbols), SetCase::DataLabel);
        assert_eq!(stmt.reloc_kind(SetCase::DataLabel, &symbols), Some(RelocKind::SecrLongStore));
    }

    #[test]
    fn pc_rel_targets_function_symbols() {
        let mut symbols = SymbolTable::new();
        let id = symbols
            .insert(Symbol {
                section: Section::Text,
                identifier: "start".into(),
                address: 0x100,
                sym_type: SymbolType::Function,
                scope: Scope::Global,
                size: 0,
            })
            .unwrap();
        let mut label = LabelRef::new("start");
        label.symbol_id = id;
        let stmt = SetStatement { dr: Register::T0, source: Source::Label(label) };
        assert_eq!(stmt.compile_case(&symbols), SetCase::PcRel);
        assert_eq!(stmt.reloc_kind(SetCase::PcRel, &symbols), Some(RelocKind::Dummy));
    }
}
