//! `jmp dest`, `jal dest`, and `jal ret, dest`.

use crate::ast::Arg;
use crate::bits::{signed_bitwidth, Alignment};
use crate::config::AssemblerOptions;
use crate::isa::{InstId, Instruction};
use crate::registers::Register;
use crate::symbol::{RelocKind, Scope, SymbolTable};

use super::{LabelRef, StatementError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpCase {
    /// Destination is a register: a single halfword `Jalr_h`.
    RegJump,
    /// In-range relative jump with no return address saved.
    ShortNoJump,
    /// In-range relative jump that also saves a return address.
    ShortRaJump,
    /// Out-of-range (or external) destination: `Apci` + `Jalr`.
    FullJump,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dest {
    Register(Register),
    Label(LabelRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpStatement {
    pub dest: Dest,
    /// Where the return address is saved; `Register::Zero` means the
    /// link is discarded (a plain `jmp`).
    pub return_reg: Register,
}

impl JumpStatement {
    pub fn parse(mnemonic: &str, args: &[Arg]) -> Result<Option<JumpStatement>, StatementError> {
        let parse_dest = |arg: &Arg, mnemonic: &str| -> Result<Dest, StatementError> {
            match arg {
                Arg::Register(r) => r
                    .parse::<Register>()
                    .map(Dest::Register)
                    .map_err(|_| StatementError::BadOperandKind { mnemonic: mnemonic.to_string() }),
                Arg::Label(name) => Ok(Dest::Label(LabelRef::new(name.clone()))),
                _ => Err(StatementError::BadOperandKind { mnemonic: mnemonic.to_string() }),
            }
        };

        match (mnemonic, args) {
            ("jmp", [dest]) => Ok(Some(JumpStatement { dest: parse_dest(dest, mnemonic)?, return_reg: Register::Zero })),
            ("jal", [dest]) => Ok(Some(JumpStatement { dest: parse_dest(dest, mnemonic)?, return_reg: Register::Ra })),
            ("jal", [Arg::Register(ret), dest]) => {
                let ret = ret.parse::<Register>().map_err(|_| StatementError::BadOperandKind { mnemonic: mnemonic.to_string() })?;
                Ok(Some(JumpStatement { dest: parse_dest(dest, mnemonic)?, return_reg: ret }))
            }
            ("jmp" | "jal", other) => Err(StatementError::WrongOperandCount {
                mnemonic: mnemonic.to_string(),
                expected: "dest, or ret, dest",
                got: other.len(),
            }),
            _ => Ok(None),
        }
    }

    pub fn worst_case_size(&self) -> u32 {
        match &self.dest {
            Dest::Register(_) => 2,
            Dest::Label(_) => 8,
        }
    }

    /// Final compile case once `pc` and the destination symbol's address
    /// (if any) are known.
    pub fn compile_case(&self, pc: u32, symbols: &SymbolTable, options: &AssemblerOptions) -> JumpCase {
        match &self.dest {
            Dest::Register(_) => JumpCase::RegJump,
            Dest::Label(label) => {
                let symbol = symbols.get(label.symbol_id);
                if symbol.scope == Scope::External {
                    if options.short_jumps {
                        self.short_case().unwrap_or(JumpCase::FullJump)
                    } else {
                        JumpCase::FullJump
                    }
                } else {
                    let offset = symbol.address as i64 - pc as i64;
                    let offset_bitwidth = signed_bitwidth(offset as i32).saturating_sub(1);
                    if offset_bitwidth <= 26 {
                        self.short_case().unwrap_or(JumpCase::FullJump)
                    } else {
                        JumpCase::FullJump
                    }
                }
            }
        }
    }

    /// `None` means no short encoding exists for this return register and
    /// the caller must fall back to `FullJump`: only `Zero` (no link saved)
    /// and `Ra` (the only register `Rjali`'s decode hardwires a link into)
    /// have a short form.
    fn short_case(&self) -> Option<JumpCase> {
        match self.return_reg {
            Register::Zero => Some(JumpCase::ShortNoJump),
            Register::Ra => Some(JumpCase::ShortRaJump),
            _ => None,
        }
    }

    pub const fn size(case: JumpCase) -> u32 {
        match case {
            JumpCase::RegJump => 2,
            JumpCase::ShortNoJump | JumpCase::ShortRaJump => 4,
            JumpCase::FullJump => 8,
        }
    }

    pub const fn alignment(case: JumpCase) -> Alignment {
        match case {
            JumpCase::RegJump => Alignment::Halfword,
            JumpCase::ShortNoJump | JumpCase::ShortRaJump | JumpCase::FullJump => Alignment::Word,
        }
    }

    pub fn worst_case_alignment(&self) -> Alignment {
        match &self.dest {
            Dest::Register(_) => Alignment::Halfword,
            Dest::Label(_) => Alignment::Word,
        }
    }

    pub fn gen(&self, case: JumpCase, pc: u32, symbols: &SymbolTable) -> Vec<Instruction> {
        match case {
            JumpCase::RegJump => {
                let Dest::Register(target) = self.dest else { unreachable!() };
                vec![Instruction::half_reg(InstId::JalrH, self.return_reg, target)]
            }
            JumpCase::ShortNoJump | JumpCase::ShortRaJump => {
                let Dest::Label(label) = &self.dest else { unreachable!() };
                let symbol = symbols.get(label.symbol_id);
                let offset = if symbol.scope == Scope::External { 0 } else { symbol.address as i32 - pc as i32 };
                let id = if case == JumpCase::ShortRaJump { InstId::Rjali } else { InstId::Rji };
                vec![Instruction::jump(id, offset)]
            }
            JumpCase::FullJump => {
                let Dest::Label(label) = &self.dest else { unreachable!() };
                let symbol = symbols.get(label.symbol_id);
                let displacement = if symbol.scope == Scope::External { 0 } else { symbol.address as i32 - pc as i32 };
                let upper = (displacement as u32) >> 11;
                let lower = (displacement as u32) & 0x7FF;
                vec![
                    Instruction::set(InstId::Apci, Register::Ar, upper as i32),
                    Instruction::immediate(InstId::Jalr, self.return_reg, Register::Ar, lower as i32),
                ]
            }
        }
    }

    pub fn reloc_kind(&self, case: JumpCase, symbols: &SymbolTable) -> Option<RelocKind> {
        let Dest::Label(label) = &self.dest else { return None };
        let external = symbols.get(label.symbol_id).scope == Scope::External;
        Some(match case {
            JumpCase::ShortNoJump | JumpCase::ShortRaJump if external => RelocKind::ShortJump,
            JumpCase::FullJump if external => RelocKind::LongJump,
            JumpCase::ShortNoJump | JumpCase::ShortRaJump | JumpCase::FullJump => RelocKind::Dummy,
            JumpCase::RegJump => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Section, Symbol, SymbolType};

    #[test]
    fn jmp_defaults_return_reg_to_zero() {
        let stmt = JumpStatement::parse("jmp", &[Arg::Label("dest".into())]).unwrap().unwrap();
        assert_eq!(stmt.return_reg, Register::Zero);
    }

    #[test]
    fn jal_single_arg_defaults_to_ra() {
        let stmt = JumpStatement::parse("jal", &[Arg::Label("dest".into())]).unwrap().unwrap();
        assert_eq!(stmt.return_reg, Register::Ra);
    }

    #[test]
    fn jal_two_args_uses_explicit_return_reg() {
        let stmt =
            JumpStatement::parse("jal", &[Arg::Register("s0".into()), Arg::Label("dest".into())]).unwrap().unwrap();
        assert_eq!(stmt.return_reg, Register::S0);
    }

    #[test]
    fn register_dest_is_reg_jump() {
        let stmt = JumpStatement::parse("jmp", &[Arg::Register("t0".into())]).unwrap().unwrap();
        let symbols = SymbolTable::new();
        let options = AssemblerOptions::default();
        assert_eq!(stmt.compile_case(0, &symbols, &options), JumpCase::RegJump);
    }

    #[test]
    fn nearby_label_is_short() {
        let mut symbols = SymbolTable::new();
        let id = symbols
            .insert(Symbol {
                section: Section::Text,
                identifier: "dest".into(),
                address: 100,
                sym_type: SymbolType::Function,
                scope: Scope::Local,
                size: 0,
            })
            .unwrap();
        let mut label = LabelRef::new("dest");
        label.symbol_id = id;
        let stmt = JumpStatement { dest: Dest::Label(label), return_reg: Register::Zero };
        let options = AssemblerOptions::default();
        assert_eq!(stmt.compile_case(0, &symbols, &options), JumpCase::ShortNoJump);
    }

    #[test]
    fn custom_return_reg_falls_through_to_full_jump() {
        let mut symbols = SymbolTable::new();
        let id = symbols
            .insert(Symbol {
                section: Section::Text,
                identifier: "dest".into(),
                address: 100,
                sym_type: SymbolType::Function,
                scope: Scope::Local,
                size: 0,
            })
            .unwrap();
        let mut label = LabelRef::new("dest");
        label.symbol_id = id;
        let stmt = JumpStatement { dest: Dest::Label(label), return_reg: Register::S0 };
        let options = AssemblerOptions::default();
        assert_eq!(stmt.compile_case(0, &symbols, &options), JumpCase::FullJump);
    }

    #[test]
    fn external_without_short_jumps_is_full() {
        let mut symbols = SymbolTable::new();
        let id = symbols
            .insert(Symbol {
                section: Section::Undefined,
                identifier: "dest".into(),
                address: 0,
                sym_type: SymbolType::Undefined,
                scope: Scope::External,
                size: 0,
            })
            .unwrap();
        let mut label = LabelRef::new("dest");
        label.symbol_id = id;
        let stmt = JumpStatement { dest: Dest::Label(label), return_reg: Register::Zero };
        let options = AssemblerOptions::default();
        assert_eq!(stmt.compile_case(0, &symbols, &options), JumpCase::FullJump);
    }
}
