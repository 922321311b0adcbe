//! Symbol table and relocation log.
//!
//! Symbol IDs are dense, assigned in insertion order starting at 1; ID 0
//! is a permanent sentinel for "undefined" and is never handed out by
//! `insert`.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Which allocation section a symbol's address is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Section {
    Text,
    Data,
    Rodata,
    Bss,
    Undefined,
}

/// What kind of thing a symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SymbolType {
    Function,
    Data,
    Undefined,
}

/// Visibility of a symbol outside this translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scope {
    Local,
    Global,
    External,
}

/// A dense, 1-based handle into a [`SymbolTable`]. `SymbolId::UNDEFINED`
/// (0) is the permanent sentinel for an unresolved reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const UNDEFINED: SymbolId = SymbolId(0);

    pub const fn is_undefined(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub section: Section,
    pub identifier: String,
    pub address: u32,
    pub sym_type: SymbolType,
    pub scope: Scope,
    pub size: u32,
}

/// How a code or data site referring to a symbol must be patched by the
/// linker/writer once the symbol's final address is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelocKind {
    None,
    SymrLongStore,
    SymrLongLoad,
    SecrLongStore,
    SecrLongLoad,
    ShortJump,
    LongJump,
    /// Recorded for bookkeeping only; the site needs no external patch
    /// (e.g. a local/global-symbol jump whose full address was resolved
    /// at assembly time).
    Dummy,
}

/// A reference to a symbol at a given code/data address, tagged with how
/// it must eventually be patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolRef {
    pub symbol_id: SymbolId,
    pub address: u32,
    pub reloc_kind: RelocKind,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("symbol {0:?} is already defined")]
    DuplicateDefinition(String),
    #[error("symbol {0:?} was never defined")]
    Unresolved(String),
}

/// Dense-ID symbol table plus an append-only relocation log.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    by_name: HashMap<String, SymbolId>,
    symbols: Vec<Symbol>,
    refs: Vec<SymbolRef>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            by_name: HashMap::new(),
            symbols: vec![Symbol {
                section: Section::Undefined,
                identifier: "undefined".to_string(),
                address: 0,
                sym_type: SymbolType::Undefined,
                scope: Scope::External,
                size: 0,
            }],
            refs: Vec::new(),
        }
    }

    /// Looks up an existing symbol id by name, without creating one.
    pub fn get_id(&self, identifier: &str) -> Option<SymbolId> {
        self.by_name.get(identifier).copied()
    }

    /// Inserts a brand-new symbol, failing if the name is already taken.
    pub fn insert(&mut self, symbol: Symbol) -> Result<SymbolId, SymbolError> {
        if self.by_name.contains_key(&symbol.identifier) {
            return Err(SymbolError::DuplicateDefinition(symbol.identifier));
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.by_name.insert(symbol.identifier.clone(), id);
        self.symbols.push(symbol);
        Ok(id)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn update_address(&mut self, id: SymbolId, address: u32, size: u32) {
        let symbol = self.get_mut(id);
        symbol.address = address;
        symbol.size = size;
    }

    /// Appends a relocation record. Never fails — the log is purely
    /// additive bookkeeping consumed by the binary writer downstream.
    pub fn insert_ref(&mut self, symbol_id: SymbolId, address: u32, reloc_kind: RelocKind) {
        self.refs.push(SymbolRef { symbol_id, address, reloc_kind });
    }

    pub fn refs(&self) -> &[SymbolRef] {
        &self.refs
    }

    /// Iterates defined symbols, skipping the index-0 sentinel.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().skip(1).map(|(i, s)| (SymbolId(i as u32), s))
    }

    pub fn len(&self) -> usize {
        self.symbols.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
