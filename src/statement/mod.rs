//! The seven semantic statement kinds: each owns its own compile-case
//! decision (worst-case during sizing, final once all addresses are
//! known) and instruction-generation logic.

mod branch;
mod data_access;
mod imm_arith;
mod jump;
mod reg_arith;
mod set;
mod unary;

pub use branch::{BranchCase, BranchStatement};
pub use data_access::{Base, DataAccessCase, DataAccessStatement};
pub use imm_arith::{ImmArithCase, ImmArithStatement};
pub use jump::{Dest, JumpCase, JumpStatement};
pub use reg_arith::{RegArithCase, RegArithStatement};
pub use set::{SetCase, SetStatement, Source};
pub use unary::{UnaryCase, UnaryStatement};

use thiserror::Error;

use crate::ast::Arg;
use crate::bits::Alignment;
use crate::config::AssemblerOptions;
use crate::error::Error;
use crate::isa::Instruction;
use crate::symbol::{RelocKind, Scope, SymbolId, SymbolTable, SymbolType};

/// A reference to a label from within a statement's operands: the text
/// as written, plus the symbol id once the analyzer has resolved it.
/// `symbol_id` is `SymbolId::UNDEFINED` until resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRef {
    pub identifier: String,
    pub symbol_id: SymbolId,
}

impl LabelRef {
    pub fn new(identifier: impl Into<String>) -> Self {
        LabelRef { identifier: identifier.into(), symbol_id: SymbolId::UNDEFINED }
    }
}

/// Combined bit width of a branch's lower and upper immediate fields.
/// Fixed at 14 here rather than the original's `lower + lower` reading,
/// per the corrected interpretation this crate follows (see DESIGN.md).
pub const BRANCH_OFFSET_BITS: u32 = 14;

/// Immediate-too-large and bad-operand-shape errors raised while turning
/// a [`crate::ast::ParsedStatement`] into one of the seven statement
/// kinds, or while picking its compile case.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("immediate {value} does not fit in {bits} bits")]
    ImmediateTooLarge { value: i64, bits: u32 },

    #[error("expected {expected} operands for {mnemonic:?}, got {got}")]
    WrongOperandCount { mnemonic: String, expected: &'static str, got: usize },

    #[error("unexpected operand kind for {mnemonic:?}")]
    BadOperandKind { mnemonic: String },

    #[error("unknown mnemonic {0:?} for this statement kind")]
    UnknownMnemonic(String),
}

/// One assembled statement, in whichever of the seven shapes its
/// mnemonic selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    RegArith(RegArithStatement),
    ImmArith(ImmArithStatement),
    Unary(UnaryStatement),
    Set(SetStatement),
    Jump(JumpStatement),
    Branch(BranchStatement),
    DataAccess(DataAccessStatement),
}

impl Statement {
    /// Tries each of the seven statement kinds in turn against `mnemonic`;
    /// the first one that recognizes it wins.
    pub fn parse(line: u32, mnemonic: &str, args: &[Arg]) -> Result<Statement, Error> {
        macro_rules! try_kind {
            ($kind:ident, $ctor:path) => {
                match $kind::parse(mnemonic, args) {
                    Ok(Some(s)) => return Ok($ctor(s)),
                    Ok(None) => {}
                    Err(source) => return Err(Error::Statement { line, source }),
                }
            };
        }
        try_kind!(RegArithStatement, Statement::RegArith);
        try_kind!(ImmArithStatement, Statement::ImmArith);
        try_kind!(UnaryStatement, Statement::Unary);
        try_kind!(SetStatement, Statement::Set);
        try_kind!(JumpStatement, Statement::Jump);
        try_kind!(BranchStatement, Statement::Branch);
        try_kind!(DataAccessStatement, Statement::DataAccess);
        Err(Error::UnknownMnemonic { line, mnemonic: mnemonic.to_string() })
    }

    /// Worst-case encoded size and required alignment, used by the
    /// analyzer's sizing pass before any label addresses are known. Fails
    /// immediately for an immediate that is already known (independent of
    /// any label address) to be out of range.
    pub fn worst_case_layout(&self, line: u32) -> Result<(u32, Alignment), Error> {
        Ok(match self {
            Statement::RegArith(s) => (s.worst_case_size(), RegArithStatement::alignment(s.compile_case())),
            Statement::ImmArith(s) => {
                s.compile_case().map_err(|source| Error::Statement { line, source })?;
                (s.size(), s.alignment())
            }
            Statement::Unary(s) => (UnaryStatement::size(s.compile_case()), UnaryStatement::alignment(s.compile_case())),
            Statement::Set(s) => (s.worst_case_size(), s.worst_case_alignment()),
            Statement::Jump(s) => (s.worst_case_size(), s.worst_case_alignment()),
            Statement::Branch(s) => (s.worst_case_size(), BranchStatement::alignment(BranchCase::LongBranch)),
            Statement::DataAccess(s) => (s.worst_case_size(), s.worst_case_alignment()),
        })
    }

    /// Looks up this statement's label operand (if any) in `symbols` and
    /// records its `SymbolId`. Branch targets are additionally validated:
    /// they must name a local/global function symbol.
    pub fn resolve_labels(&mut self, line: u32, symbols: &SymbolTable) -> Result<(), Error> {
        let lookup = |label: &mut LabelRef| {
            if let Some(id) = symbols.get_id(&label.identifier) {
                label.symbol_id = id;
            }
        };
        match self {
            Statement::Set(s) => {
                if let Source::Label(label) = &mut s.source {
                    lookup(label);
                }
            }
            Statement::Jump(s) => {
                if let Dest::Label(label) = &mut s.dest {
                    lookup(label);
                    let symbol = symbols.get(label.symbol_id);
                    if symbol.sym_type == SymbolType::Data {
                        return Err(Error::JumpToDataSymbol { line, identifier: label.identifier.clone() });
                    }
                }
            }
            Statement::DataAccess(s) => {
                if let Base::Label(label) = &mut s.base {
                    lookup(label);
                }
            }
            Statement::Branch(s) => {
                lookup(&mut s.target);
                let symbol = symbols.get(s.target.symbol_id);
                if symbol.scope == Scope::External {
                    return Err(Error::BranchToExternal { line, identifier: s.target.identifier.clone() });
                }
                if symbol.sym_type != SymbolType::Function {
                    return Err(Error::BranchToNonFunction { line, identifier: s.target.identifier.clone() });
                }
            }
            Statement::RegArith(_) | Statement::ImmArith(_) | Statement::Unary(_) => {}
        }
        Ok(())
    }

    /// Final compile-time size and alignment once every label operand is
    /// resolved.
    pub fn compile_layout(&self, pc: u32, symbols: &SymbolTable, options: &AssemblerOptions) -> (u32, Alignment) {
        match self {
            Statement::RegArith(s) => {
                let case = s.compile_case();
                (RegArithStatement::size(case), RegArithStatement::alignment(case))
            }
            Statement::ImmArith(s) => (s.size(), s.alignment()),
            Statement::Unary(s) => {
                let case = s.compile_case();
                (UnaryStatement::size(case), UnaryStatement::alignment(case))
            }
            Statement::Set(s) => {
                let case = s.compile_case(symbols);
                (SetStatement::size(case), SetStatement::alignment(case))
            }
            Statement::Jump(s) => {
                let case = s.compile_case(pc, symbols, options);
                (JumpStatement::size(case), JumpStatement::alignment(case))
            }
            Statement::Branch(s) => {
                let case = s.compile_case(pc, symbols);
                (BranchStatement::size(case), BranchStatement::alignment(case))
            }
            Statement::DataAccess(s) => {
                let case = s.compile_case();
                (DataAccessStatement::size(case), DataAccessStatement::alignment(case))
            }
        }
    }

    /// Emits this statement's instructions at `pc`.
    pub fn gen(&self, pc: u32, symbols: &SymbolTable, options: &AssemblerOptions) -> Vec<Instruction> {
        match self {
            Statement::RegArith(s) => s.gen(s.compile_case()),
            Statement::ImmArith(s) => s.gen(s.compile_case().expect("size() already validated the immediate")),
            Statement::Unary(s) => s.gen(s.compile_case()),
            Statement::Set(s) => s.gen(s.compile_case(symbols), pc, symbols),
            Statement::Jump(s) => s.gen(s.compile_case(pc, symbols, options), pc, symbols),
            Statement::Branch(s) => s.gen(s.compile_case(pc, symbols), pc, symbols),
            Statement::DataAccess(s) => s.gen(s.compile_case(), symbols),
        }
    }

    /// The symbol id and relocation kind to record against `pc`, if this
    /// statement's encoding touches a symbol that needs a patch.
    pub fn reloc(&self, pc: u32, symbols: &SymbolTable, options: &AssemblerOptions) -> Option<(SymbolId, RelocKind)> {
        match self {
            Statement::Set(s) => {
                let kind = s.reloc_kind(s.compile_case(symbols), symbols)?;
                let Source::Label(label) = &s.source else { return None };
                Some((label.symbol_id, kind))
            }
            Statement::Jump(s) => {
                let kind = s.reloc_kind(s.compile_case(pc, symbols, options), symbols)?;
                let Dest::Label(label) = &s.dest else { return None };
                Some((label.symbol_id, kind))
            }
            Statement::DataAccess(s) => {
                let kind = s.reloc_kind(s.compile_case(), symbols)?;
                let Base::Label(label) = &s.base else { return None };
                Some((label.symbol_id, kind))
            }
            Statement::RegArith(_) | Statement::ImmArith(_) | Statement::Unary(_) | Statement::Branch(_) => None,
        }
    }
}
