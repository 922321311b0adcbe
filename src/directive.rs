//! `.data`/`.rodata`/`.bss` allocation directives.

use crate::ast::Arg;
use crate::bits::Alignment;
use crate::error::Error;

/// Byte count plus required alignment for a single allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAlloc {
    pub nbytes: u32,
    pub alignment: Alignment,
}

/// One `.word`/`.halfword`/`.byte`/`*_array` directive's resolved
/// storage. `zero_data` collapses the value list whenever every element
/// is (or defaults to) zero, so the writer can emit a `.bss`-style
/// reservation instead of literal zero bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAlloc {
    pub zero_data: bool,
    pub memory_alloc: MemoryAlloc,
    pub values: Vec<i32>,
}

enum ElemKind {
    Word,
    Halfword,
    Byte,
}

impl ElemKind {
    const fn size(&self) -> u32 {
        match self {
            ElemKind::Word => 4,
            ElemKind::Halfword => 2,
            ElemKind::Byte => 1,
        }
    }

    const fn alignment(&self) -> Alignment {
        match self {
            ElemKind::Word => Alignment::Word,
            ElemKind::Halfword => Alignment::Halfword,
            ElemKind::Byte => Alignment::Byte,
        }
    }
}

fn classify(directive: &str, line: u32) -> Result<(ElemKind, bool), Error> {
    match directive {
        ".word" => Ok((ElemKind::Word, false)),
        ".halfword" => Ok((ElemKind::Halfword, false)),
        ".byte" => Ok((ElemKind::Byte, false)),
        ".word_array" => Ok((ElemKind::Word, true)),
        ".halfword_array" => Ok((ElemKind::Halfword, true)),
        ".byte_array" => Ok((ElemKind::Byte, true)),
        other => Err(Error::UnknownDirective { line, directive: other.to_string() }),
    }
}

impl DataAlloc {
    /// Builds the resolved allocation for one directive line.
    ///
    /// `.word 1,2,3` keeps its (non-zero) values; `.word` with no
    /// arguments, or with only literal zeros, collapses to a
    /// `zero_data` reservation of one element's worth of space times the
    /// argument count. `*_array n` always reserves `n` zeroed elements
    /// and never stores values.
    pub fn from_directive(directive: &str, args: &[Arg], line: u32) -> Result<DataAlloc, Error> {
        let (elem, is_array) = classify(directive, line)?;

        if is_array {
            let count = match args {
                [Arg::Integer(n)] => *n,
                _ => return Err(Error::BadOperands { line, mnemonic: directive.to_string() }),
            };
            return Ok(DataAlloc {
                zero_data: true,
                memory_alloc: MemoryAlloc { nbytes: (count as u32) * elem.size(), alignment: elem.alignment() },
                values: Vec::new(),
            });
        }

        let integers: Vec<i64> = args
            .iter()
            .map(|a| match a {
                Arg::Integer(n) => Ok(*n),
                _ => Err(Error::BadOperands { line, mnemonic: directive.to_string() }),
            })
            .collect::<Result<_, _>>()?;

        let n_values = if integers.is_empty() { 1 } else { integers.len() };
        let all_zero = integers.iter().all(|&v| v == 0);

        if integers.is_empty() || all_zero {
            Ok(DataAlloc {
                zero_data: true,
                memory_alloc: MemoryAlloc {
                    nbytes: n_values as u32 * elem.size(),
                    alignment: elem.alignment(),
                },
                values: Vec::new(),
            })
        } else {
            Ok(DataAlloc {
                zero_data: false,
                memory_alloc: MemoryAlloc {
                    nbytes: n_values as u32 * elem.size(),
                    alignment: elem.alignment(),
                },
                values: integers.into_iter().map(|v| v as i32).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_word_directive_collapses_to_one_zero_word() {
        let alloc = DataAlloc::from_directive(".word", &[], 1).unwrap();
        assert!(alloc.zero_data);
        assert_eq!(alloc.memory_alloc.nbytes, 4);
        assert!(alloc.values.is_empty());
    }

    #[test]
    fn all_zero_values_collapse() {
        let args = vec![Arg::Integer(0), Arg::Integer(0)];
        let alloc = DataAlloc::from_directive(".word", &args, 1).unwrap();
        assert!(alloc.zero_data);
        assert_eq!(alloc.memory_alloc.nbytes, 8);
        assert!(alloc.values.is_empty());
    }

    #[test]
    fn mixed_values_are_kept() {
        let args = vec![Arg::Integer(1), Arg::Integer(0), Arg::Integer(3)];
        let alloc = DataAlloc::from_directive(".word", &args, 1).unwrap();
        assert!(!alloc.zero_data);
        assert_eq!(alloc.values, vec![1, 0, 3]);
        assert_eq!(alloc.memory_alloc.nbytes, 12);
    }

    #[test]
    fn array_variant_reserves_without_values() {
        let args = vec![Arg::Integer(10)];
        let alloc = DataAlloc::from_directive(".byte_array", &args, 1).unwrap();
        assert!(alloc.zero_data);
        assert_eq!(alloc.memory_alloc.nbytes, 10);
        assert!(alloc.values.is_empty());
    }
}
