//! `op sr1, sr2, label` conditional branch.

use crate::ast::Arg;
use crate::bits::{signed_bitwidth, Alignment};
use crate::isa::{InstId, Instruction};
use crate::registers::Register;
use crate::symbol::SymbolTable;

use super::{LabelRef, StatementError, BRANCH_OFFSET_BITS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCase {
    /// Displacement fits directly in the branch format's split immediate.
    ShortBranch,
    /// Out of range: inverted branch over a relative jump.
    LongBranch,
}

fn reverse_condition(id: InstId) -> InstId {
    match id {
        InstId::Beq => InstId::Bne,
        InstId::Bne => InstId::Beq,
        InstId::Bgr => InstId::Bge,
        InstId::Bge => InstId::Bgr,
        InstId::Bgru => InstId::Bgeu,
        InstId::Bgeu => InstId::Bgru,
        other => other,
    }
}

fn mnemonic_to_id(mnemonic: &str) -> Option<InstId> {
    Some(match mnemonic {
        "beq" => InstId::Beq,
        "bne" => InstId::Bne,
        "bgr" => InstId::Bgr,
        "bge" => InstId::Bge,
        "bgru" => InstId::Bgru,
        "bgeu" => InstId::Bgeu,
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchStatement {
    pub id: InstId,
    pub sr1: Register,
    pub sr2: Register,
    pub target: LabelRef,
}

impl BranchStatement {
    pub fn parse(mnemonic: &str, args: &[Arg]) -> Result<Option<BranchStatement>, StatementError> {
        let Some(id) = mnemonic_to_id(mnemonic) else { return Ok(None) };
        let [Arg::Register(sr1), Arg::Register(sr2), Arg::Label(target)] = args else {
            return Err(StatementError::WrongOperandCount {
                mnemonic: mnemonic.to_string(),
                expected: "sr1, sr2, label",
                got: args.len(),
            });
        };
        let parse_reg = |s: &str| {
            s.parse::<Register>().map_err(|_| StatementError::BadOperandKind { mnemonic: mnemonic.to_string() })
        };
        Ok(Some(BranchStatement {
            id,
            sr1: parse_reg(sr1)?,
            sr2: parse_reg(sr2)?,
            target: LabelRef::new(target.clone()),
        }))
    }

    pub const fn worst_case_size(&self) -> u32 {
        Self::size(BranchCase::LongBranch)
    }

    /// `pc` is the address of this statement; the target symbol's address
    /// must already be resolved (branches only ever target local/global
    /// functions, never external symbols).
    pub fn compile_case(&self, pc: u32, symbols: &SymbolTable) -> BranchCase {
        let target_address = symbols.get(self.target.symbol_id).address as i64;
        let offset = target_address - pc as i64;
        // Negative offsets get padded by a word before the bitwidth check;
        // load-bearing for size monotonicity between the sizing and final
        // passes, not implied by the offset arithmetic itself.
        let worst_case_offset = if offset < 0 { offset - 4 } else { offset };
        let offset_bitwidth = signed_bitwidth(worst_case_offset as i32).saturating_sub(1);
        if offset_bitwidth <= BRANCH_OFFSET_BITS {
            BranchCase::ShortBranch
        } else {
            BranchCase::LongBranch
        }
    }

    pub const fn size(case: BranchCase) -> u32 {
        match case {
            BranchCase::ShortBranch => 4,
            BranchCase::LongBranch => 8,
        }
    }

    /// Both cases are word-aligned: the branch format is always fullword,
    /// whether it stands alone or leads the inverted-branch-plus-jump pair.
    pub const fn alignment(_case: BranchCase) -> Alignment {
        Alignment::Word
    }

    pub fn gen(&self, case: BranchCase, pc: u32, symbols: &SymbolTable) -> Vec<Instruction> {
        match case {
            BranchCase::ShortBranch => {
                let target_address = symbols.get(self.target.symbol_id).address;
                let offset = target_address as i32 - pc as i32;
                vec![Instruction::branch(self.id, self.sr1, self.sr2, offset)]
            }
            BranchCase::LongBranch => {
                let target_address = symbols.get(self.target.symbol_id).address;
                let offset = target_address as i32 - pc as i32;
                vec![
                    Instruction::branch(reverse_condition(self.id), self.sr2, self.sr1, 4),
                    Instruction::jump(InstId::Rji, offset - 4),
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{Scope, Section, Symbol, SymbolType};

    fn function_at(symbols: &mut SymbolTable, address: u32) -> LabelRef {
        let id = symbols
            .insert(Symbol {
                section: Section::Text,
                identifier: "target".into(),
                address,
                sym_type: SymbolType::Function,
                scope: Scope::Local,
                size: 0,
            })
            .unwrap();
        let mut label = LabelRef::new("target");
        label.symbol_id = id;
        label
    }

    #[test]
    fn nearby_target_is_short() {
        let mut symbols = SymbolTable::new();
        let target = function_at(&mut symbols, 100);
        let stmt = BranchStatement { id: InstId::Beq, sr1: Register::T0, sr2: Register::T1, target };
        assert_eq!(stmt.compile_case(0, &symbols), BranchCase::ShortBranch);
    }

    #[test]
    fn far_target_is_long() {
        let mut symbols = SymbolTable::new();
        let target = function_at(&mut symbols, 1 << 20);
        let stmt = BranchStatement { id: InstId::Beq, sr1: Register::T0, sr2: Register::T1, target };
        assert_eq!(stmt.compile_case(0, &symbols), BranchCase::LongBranch);
    }

    #[test]
    fn long_branch_inverts_condition() {
        let mut symbols = SymbolTable::new();
        let target = function_at(&mut symbols, 1 << 20);
        let stmt = BranchStatement { id: InstId::Beq, sr1: Register::T0, sr2: Register::T1, target };
        let insts = stmt.gen(BranchCase::LongBranch, 0, &symbols);
        assert_eq!(insts[0].id, InstId::Bne);
        assert_eq!(insts[0].sr1, Register::T1);
        assert_eq!(insts[0].sr2, Register::T0);
        assert_eq!(insts[1].id, InstId::Rji);
    }

    #[test]
    fn reverse_condition_map_is_involutive() {
        for id in [InstId::Beq, InstId::Bne, InstId::Bgr, InstId::Bge, InstId::Bgru, InstId::Bgeu] {
            assert_eq!(reverse_condition(reverse_condition(id)), id);
        }
    }
}
