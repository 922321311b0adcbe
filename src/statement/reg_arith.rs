//! `op dr, sr1, sr2` register-to-register arithmetic/logic.

use crate::ast::Arg;
use crate::bits::Alignment;
use crate::isa::{InstId, Instruction};
use crate::registers::Register;

use super::StatementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegArithCase {
    Fullword,
    Halfword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegArithStatement {
    pub id: InstId,
    pub dr: Register,
    pub sr1: Register,
    pub sr2: Register,
}

/// The fullword reg-format ops that also have a halfword encoding, and
/// the `InstId` of that halfword form. Ops not in this list (`Neql`,
/// `Or`, `And`, `Xor`) never have a halfword form — the table simply has
/// no row for them.
fn halfword_form(id: InstId) -> Option<InstId> {
    Some(match id {
        InstId::Add => InstId::AddH,
        InstId::Sub => InstId::SubH,
        InstId::Mult => InstId::MultH,
        InstId::Div => InstId::DivH,
        InstId::Multu => InstId::MultuH,
        InstId::Divu => InstId::DivuH,
        InstId::Nand => InstId::NandH,
        InstId::Nor => InstId::NorH,
        InstId::Xnor => InstId::XnorH,
        InstId::Eql => InstId::EqlH,
        InstId::Grt => InstId::GrtH,
        InstId::Gre => InstId::GreH,
        InstId::Grtu => InstId::GrtuH,
        InstId::Greu => InstId::GreuH,
        InstId::Lsft => InstId::LsftH,
        InstId::Rsft => InstId::RsftH,
        InstId::Rsfta => InstId::RsftaH,
        _ => return None,
    })
}

fn mnemonic_to_id(mnemonic: &str) -> Option<InstId> {
    Some(match mnemonic {
        "add" => InstId::Add,
        "sub" => InstId::Sub,
        "mult" => InstId::Mult,
        "div" => InstId::Div,
        "multu" => InstId::Multu,
        "divu" => InstId::Divu,
        "eql" => InstId::Eql,
        "neql" => InstId::Neql,
        "grt" => InstId::Grt,
        "gre" => InstId::Gre,
        "grtu" => InstId::Grtu,
        "greu" => InstId::Greu,
        "lsft" => InstId::Lsft,
        "rsft" => InstId::Rsft,
        "rsfta" => InstId::Rsfta,
        "or" => InstId::Or,
        "and" => InstId::And,
        "xor" => InstId::Xor,
        "nor" => InstId::Nor,
        "nand" => InstId::Nand,
        "xnor" => InstId::Xnor,
        _ => return None,
    })
}

impl RegArithStatement {
    pub fn parse(mnemonic: &str, args: &[Arg]) -> Result<Option<RegArithStatement>, StatementError> {
        let Some(id) = mnemonic_to_id(mnemonic) else { return Ok(None) };
        let parse_reg = |s: &str| {
            s.parse::<Register>().map_err(|_| StatementError::BadOperandKind { mnemonic: mnemonic.to_string() })
        };
        match args {
            [Arg::Register(dr), Arg::Register(sr1), Arg::Register(sr2)] => {
                let dr = parse_reg(dr)?;
                Ok(Some(RegArithStatement { id, dr, sr1: parse_reg(sr1)?, sr2: parse_reg(sr2)? }))
            }
            // `op dr, sr2` implies `sr1 := dr`.
            [Arg::Register(dr), Arg::Register(sr2)] => {
                let dr = parse_reg(dr)?;
                Ok(Some(RegArithStatement { id, dr, sr1: dr, sr2: parse_reg(sr2)? }))
            }
            other => Err(StatementError::WrongOperandCount {
                mnemonic: mnemonic.to_string(),
                expected: "dr, sr1, sr2 or dr, sr2",
                got: other.len(),
            }),
        }
    }

    pub fn compile_case(&self) -> RegArithCase {
        if halfword_form(self.id).is_some() && self.dr == self.sr1 {
            RegArithCase::Halfword
        } else {
            RegArithCase::Fullword
        }
    }

    pub fn worst_case_size(&self) -> u32 {
        Self::size(self.compile_case())
    }

    pub const fn size(case: RegArithCase) -> u32 {
        match case {
            RegArithCase::Halfword => 2,
            RegArithCase::Fullword => 4,
        }
    }

    pub const fn alignment(case: RegArithCase) -> Alignment {
        match case {
            RegArithCase::Halfword => Alignment::Halfword,
            RegArithCase::Fullword => Alignment::Word,
        }
    }

    pub fn gen(&self, case: RegArithCase) -> Vec<Instruction> {
        match case {
            RegArithCase::Halfword => {
                let half_id = halfword_form(self.id).expect("halfword case implies a halfword form exists");
                vec![Instruction::half_reg(half_id, self.dr, self.sr2)]
            }
            RegArithCase::Fullword => vec![Instruction::reg(self.id, self.dr, self.sr1, self.sr2)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dr: &str, sr1: &str, sr2: &str) -> Vec<Arg> {
        vec![Arg::Register(dr.into()), Arg::Register(sr1.into()), Arg::Register(sr2.into())]
    }

    #[test]
    fn add_with_matching_dr_and_sr1_is_halfword() {
        let stmt = RegArithStatement::parse("add", &args("t0", "t0", "t1")).unwrap().unwrap();
        assert_eq!(stmt.compile_case(), RegArithCase::Halfword);
    }

    #[test]
    fn add_with_distinct_dr_and_sr1_is_fullword() {
        let stmt = RegArithStatement::parse("add", &args("t0", "t1", "t2")).unwrap().unwrap();
        assert_eq!(stmt.compile_case(), RegArithCase::Fullword);
    }

    #[test]
    fn or_has_no_halfword_form_even_when_dr_matches_sr1() {
        let stmt = RegArithStatement::parse("or", &args("t0", "t0", "t1")).unwrap().unwrap();
        assert_eq!(stmt.compile_case(), RegArithCase::Fullword);
    }

    #[test]
    fn two_arg_form_binds_sr1_to_dr() {
        let stmt = RegArithStatement::parse(
            "add",
            &[Arg::Register("t0".into()), Arg::Register("t1".into())],
        )
        .unwrap()
        .unwrap();
        assert_eq!(stmt.dr, stmt.sr1);
        assert_eq!(stmt.compile_case(), RegArithCase::Halfword);
    }

    #[test]
    fn unknown_mnemonic_returns_none() {
        assert!(RegArithStatement::parse("addi", &args("t0", "t0", "t1")).unwrap().is_none());
    }
}
