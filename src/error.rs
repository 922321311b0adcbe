//! Top-level error type, composed from each subsystem's own error enum.

use thiserror::Error;

use crate::isa::DecodeError;
use crate::registers::{RegisterNameError, RegisterRangeError};
use crate::statement::StatementError;
use crate::symbol::SymbolError;

/// Any fatal error that can abort assembly of a translation unit.
///
/// Every variant that can be attributed to a source line carries one;
/// the analyzer fills it in from the originating `ParsedStatement` as
/// errors propagate up past statement boundaries.
#[derive(Debug, Error)]
pub enum Error {
    #[error("line {line}: {source}")]
    Statement {
        line: u32,
        #[source]
        source: StatementError,
    },

    #[error("line {line}: {source}")]
    Symbol {
        line: u32,
        #[source]
        source: SymbolError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    RegisterRange(#[from] RegisterRangeError),

    #[error(transparent)]
    RegisterName(#[from] RegisterNameError),

    #[error("instruction statement outside .text at line {line}")]
    InstructionOutsideText { line: u32 },

    #[error("data directive outside a data section at line {line}")]
    DirectiveOutsideDataSection { line: u32 },

    #[error("unknown mnemonic {mnemonic:?} at line {line}")]
    UnknownMnemonic { line: u32, mnemonic: String },

    #[error("unknown directive {directive:?} at line {line}")]
    UnknownDirective { line: u32, directive: String },

    #[error("wrong number or kind of operands for {mnemonic:?} at line {line}")]
    BadOperands { line: u32, mnemonic: String },

    #[error("branch to external symbol {identifier:?} at line {line} is not allowed")]
    BranchToExternal { line: u32, identifier: String },

    #[error("branch target {identifier:?} at line {line} is not a function symbol")]
    BranchToNonFunction { line: u32, identifier: String },

    #[error("jump target {identifier:?} at line {line} is a data symbol, expected executable")]
    JumpToDataSymbol { line: u32, identifier: String },
}
