//! `neg dr, operand` and `not dr, operand`.

use crate::ast::Arg;
use crate::bits::Alignment;
use crate::isa::{InstId, Instruction};
use crate::registers::Register;

use super::StatementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryCase {
    NegFull,
    NotHalf,
    NotFull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnaryStatement {
    op: Op,
    pub dr: Register,
    pub operand: Register,
}

impl UnaryStatement {
    pub fn parse(mnemonic: &str, args: &[Arg]) -> Result<Option<UnaryStatement>, StatementError> {
        let op = match mnemonic {
            "neg" => Op::Neg,
            "not" => Op::Not,
            _ => return Ok(None),
        };
        let [Arg::Register(dr), Arg::Register(operand)] = args else {
            return Err(StatementError::WrongOperandCount {
                mnemonic: mnemonic.to_string(),
                expected: "dr, operand",
                got: args.len(),
            });
        };
        let parse_reg = |s: &str| {
            s.parse::<Register>().map_err(|_| StatementError::BadOperandKind { mnemonic: mnemonic.to_string() })
        };
        Ok(Some(UnaryStatement { op, dr: parse_reg(dr)?, operand: parse_reg(operand)? }))
    }

    pub fn compile_case(&self) -> UnaryCase {
        match self.op {
            Op::Neg => UnaryCase::NegFull,
            Op::Not => {
                if self.dr == self.operand {
                    UnaryCase::NotHalf
                } else {
                    UnaryCase::NotFull
                }
            }
        }
    }

    pub fn size(case: UnaryCase) -> u32 {
        match case {
            UnaryCase::NotHalf => 2,
            UnaryCase::NegFull | UnaryCase::NotFull => 4,
        }
    }

    pub fn alignment(case: UnaryCase) -> Alignment {
        match case {
            UnaryCase::NotHalf => Alignment::Halfword,
            UnaryCase::NegFull | UnaryCase::NotFull => Alignment::Word,
        }
    }

    pub fn gen(&self, case: UnaryCase) -> Vec<Instruction> {
        match case {
            UnaryCase::NegFull => vec![Instruction::reg(InstId::Sub, self.dr, Register::Zero, self.operand)],
            UnaryCase::NotHalf => vec![Instruction::half_reg(InstId::NandH, self.dr, self.operand)],
            UnaryCase::NotFull => vec![Instruction::reg(InstId::Xnor, self.dr, Register::Zero, self.operand)],
        }
    }
}
