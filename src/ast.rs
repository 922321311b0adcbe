//! The parser-facing input contract: a flat stream of already-tokenized
//! statements. Lexing, macro expansion, and syntax recovery all happen
//! upstream of this crate; by the time a `ParsedStatement` reaches the
//! analyzer it is assumed syntactically well-formed.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One operand of a parsed statement. The parser has already classified
/// each token; the analyzer never re-parses operand text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Arg {
    Integer(i64),
    Label(String),
    Register(String),
    Str(String),
}

/// Either an instruction mnemonic with its operands, or a directive with
/// its arguments — a statement is exactly one of the two.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StatementBody {
    Instruction { mnemonic: String, args: Vec<Arg> },
    Directive { directive: String, args: Vec<Arg> },
}

/// One line of input: an optional label definition plus either an
/// instruction or a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ParsedStatement {
    pub line: u32,
    pub label: Option<String>,
    pub body: StatementBody,
}

impl ParsedStatement {
    pub fn instruction(line: u32, label: Option<&str>, mnemonic: &str, args: Vec<Arg>) -> Self {
        ParsedStatement {
            line,
            label: label.map(str::to_string),
            body: StatementBody::Instruction { mnemonic: mnemonic.to_string(), args },
        }
    }

    pub fn directive(line: u32, label: Option<&str>, directive: &str, args: Vec<Arg>) -> Self {
        ParsedStatement {
            line,
            label: label.map(str::to_string),
            body: StatementBody::Directive { directive: directive.to_string(), args },
        }
    }
}

/// Section-switch directives (`.text`, `.data`, `.rodata`, `.bss`) the
/// parser may have already resolved to a `Directive` name; the analyzer
/// matches against the literal directive string.
pub const SECTION_DIRECTIVES: [&str; 4] = [".text", ".data", ".rodata", ".bss"];

/// Symbol-visibility directives, which name an identifier rather than
/// allocate storage.
pub const VISIBILITY_DIRECTIVES: [&str; 3] = [".global", ".externex", ".externdata"];

/// Data-allocation directive names; `*_array` variants take a single
/// integer count argument instead of a value list.
pub const DATA_DIRECTIVES: [&str; 6] =
    [".word", ".halfword", ".byte", ".word_array", ".halfword_array", ".byte_array"];
