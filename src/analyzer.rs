//! Turns a flat statement stream into a [`CompilationUnit`]: anonymous
//! label renaming, section/symbol bookkeeping, worst-case sizing, final
//! compile-case selection, label-address refinement, and instruction
//! generation with relocation emission — in that order.

use std::collections::HashMap;

use log::{debug, trace};

use crate::ast::{Arg, ParsedStatement, StatementBody, DATA_DIRECTIVES, SECTION_DIRECTIVES, VISIBILITY_DIRECTIVES};
use crate::bits::{AlignedCounter, Alignment};
use crate::config::AssemblerOptions;
use crate::directive::DataAlloc;
use crate::error::Error;
use crate::statement::Statement;
use crate::symbol::{Scope, Section, Symbol, SymbolId, SymbolTable, SymbolType};
use crate::unit::CompilationUnit;

/// Stateless entry point: `analyze` owns no fields of its own, but groups
/// the multi-pass pipeline under one name for callers and for this
/// module's logging.
pub struct Analyzer;

struct TextItem {
    line: u32,
    label_symbol_id: Option<SymbolId>,
    statement: Statement,
    worst_size: u32,
    worst_alignment: Alignment,
}

struct DataItem {
    label_symbol_id: Option<SymbolId>,
    alloc: DataAlloc,
}

fn is_anonymous(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Rewrites anonymous (all-digit) label definitions to `{base}_{tag}` and
/// resolves `b_`/`f_`-prefixed references against the nearest previous or
/// next definition of that base. A reference with no matching definition
/// resolves to tag 0.
fn rename_anonymous_labels(statements: &mut [ParsedStatement]) {
    let mut last_tag: HashMap<String, u32> = HashMap::new();
    for statement in statements.iter_mut() {
        if let Some(name) = statement.label.clone() {
            if is_anonymous(&name) {
                let tag = last_tag.get(&name).map(|t| t + 1).unwrap_or(0);
                last_tag.insert(name.clone(), tag);
                statement.label = Some(format!("{name}_{tag}"));
            }
        }
        for arg in statement_args_mut(statement) {
            if let Arg::Label(text) = arg {
                if let Some(base) = text.strip_prefix("b_") {
                    let tag = last_tag.get(base).copied().unwrap_or(0);
                    *text = format!("{base}_{tag}");
                }
            }
        }
    }

    let mut next_tag: HashMap<String, u32> = HashMap::new();
    for statement in statements.iter_mut().rev() {
        if let Some(name) = &statement.label {
            if let Some((base, tag_str)) = name.rsplit_once('_') {
                if !base.is_empty() && base.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(tag) = tag_str.parse::<u32>() {
                        next_tag.insert(base.to_string(), tag);
                    }
                }
            }
        }
        for arg in statement_args_mut(statement) {
            if let Arg::Label(text) = arg {
                if let Some(base) = text.strip_prefix("f_") {
                    let tag = next_tag.get(base).copied().unwrap_or(0);
                    *text = format!("{base}_{tag}");
                }
            }
        }
    }
}

fn statement_args_mut(statement: &mut ParsedStatement) -> &mut [Arg] {
    match &mut statement.body {
        StatementBody::Instruction { args, .. } => args,
        StatementBody::Directive { args, .. } => args,
    }
}

fn section_from_directive(directive: &str) -> Section {
    match directive {
        ".text" => Section::Text,
        ".data" => Section::Data,
        ".rodata" => Section::Rodata,
        ".bss" => Section::Bss,
        _ => unreachable!("caller already checked SECTION_DIRECTIVES"),
    }
}

fn visibility_identifier(directive: &str, args: &[Arg], line: u32) -> Result<String, Error> {
    match args {
        [Arg::Label(name)] => Ok(name.clone()),
        _ => Err(Error::BadOperands { line, mnemonic: directive.to_string() }),
    }
}

/// The set of declared-global identifiers and the two extern lists,
/// collected from `.global`/`.externex`/`.externdata` before the sizing
/// pass runs, so every symbol's scope is known the moment it is defined.
struct Visibility {
    globals: std::collections::HashSet<String>,
    extern_functions: Vec<String>,
    extern_data: Vec<String>,
}

fn collect_visibility(statements: &[ParsedStatement]) -> Result<Visibility, Error> {
    let mut globals = std::collections::HashSet::new();
    let mut extern_functions = Vec::new();
    let mut extern_data = Vec::new();
    for statement in statements {
        let StatementBody::Directive { directive, args } = &statement.body else { continue };
        if !VISIBILITY_DIRECTIVES.contains(&directive.as_str()) {
            continue;
        }
        let identifier = visibility_identifier(directive, args, statement.line)?;
        match directive.as_str() {
            ".global" => {
                globals.insert(identifier);
            }
            ".externex" => extern_functions.push(identifier),
            ".externdata" => extern_data.push(identifier),
            _ => unreachable!(),
        }
    }
    Ok(Visibility { globals, extern_functions, extern_data })
}

fn scope_for(identifier: &str, visibility: &Visibility) -> Scope {
    if visibility.globals.contains(identifier) {
        Scope::Global
    } else {
        Scope::Local
    }
}

impl Analyzer {
    pub fn analyze(statements: &[ParsedStatement], options: &AssemblerOptions) -> Result<CompilationUnit, Error> {
        let mut statements = statements.to_vec();
        rename_anonymous_labels(&mut statements);
        debug!("resolved anonymous labels over {} statements", statements.len());

        let visibility = collect_visibility(&statements)?;

        let mut symbols = SymbolTable::new();
        let mut text_items = Vec::new();
        let mut data_items: HashMap<Section, Vec<DataItem>> = HashMap::new();
        data_items.insert(Section::Data, Vec::new());
        data_items.insert(Section::Rodata, Vec::new());
        data_items.insert(Section::Bss, Vec::new());

        let mut current_section = Section::Undefined;
        let mut text_counter = AlignedCounter::new();
        let mut section_counters: HashMap<Section, AlignedCounter> = HashMap::new();
        section_counters.insert(Section::Data, AlignedCounter::new());
        section_counters.insert(Section::Rodata, AlignedCounter::new());
        section_counters.insert(Section::Bss, AlignedCounter::new());

        trace!("pass 1: worst-case sizing");
        for statement in &statements {
            match &statement.body {
                StatementBody::Directive { directive, .. } if SECTION_DIRECTIVES.contains(&directive.as_str()) => {
                    current_section = section_from_directive(directive);
                }
                StatementBody::Directive { directive, .. } if VISIBILITY_DIRECTIVES.contains(&directive.as_str()) => {
                    // Already folded into `visibility` ahead of this walk.
                }
                StatementBody::Directive { directive, args } if DATA_DIRECTIVES.contains(&directive.as_str()) => {
                    if current_section == Section::Undefined || current_section == Section::Text {
                        return Err(Error::DirectiveOutsideDataSection { line: statement.line });
                    }
                    let alloc = DataAlloc::from_directive(directive, args, statement.line)?;
                    let counter = section_counters.get_mut(&current_section).unwrap();
                    let address = counter.advance(alloc.memory_alloc.nbytes, alloc.memory_alloc.alignment);
                    let label_symbol_id = match &statement.label {
                        Some(name) => Some(
                            symbols
                                .insert(Symbol {
                                    section: current_section,
                                    identifier: name.clone(),
                                    address,
                                    sym_type: SymbolType::Data,
                                    scope: scope_for(name, &visibility),
                                    size: alloc.memory_alloc.nbytes,
                                })
                                .map_err(|source| Error::Symbol { line: statement.line, source })?,
                        ),
                        None => None,
                    };
                    data_items.get_mut(&current_section).unwrap().push(DataItem { label_symbol_id, alloc });
                }
                StatementBody::Directive { directive, .. } => {
                    return Err(Error::UnknownDirective { line: statement.line, directive: directive.clone() });
                }
                StatementBody::Instruction { mnemonic, args } => {
                    if current_section != Section::Text {
                        return Err(Error::InstructionOutsideText { line: statement.line });
                    }
                    let parsed = Statement::parse(statement.line, mnemonic, args)?;
                    let (size, alignment) = parsed.worst_case_layout(statement.line)?;
                    let address = text_counter.advance(size, alignment);
                    let label_symbol_id = match &statement.label {
                        Some(name) => Some(
                            symbols
                                .insert(Symbol {
                                    section: Section::Text,
                                    identifier: name.clone(),
                                    address,
                                    sym_type: SymbolType::Function,
                                    scope: scope_for(name, &visibility),
                                    size,
                                })
                                .map_err(|source| Error::Symbol { line: statement.line, source })?,
                        ),
                        None => None,
                    };
                    text_items.push(TextItem {
                        line: statement.line,
                        label_symbol_id,
                        statement: parsed,
                        worst_size: size,
                        worst_alignment: alignment,
                    });
                }
            }
        }

        for name in &visibility.extern_functions {
            if symbols.get_id(name).is_none() {
                symbols
                    .insert(Symbol {
                        section: Section::Undefined,
                        identifier: name.clone(),
                        address: 0,
                        sym_type: SymbolType::Function,
                        scope: Scope::External,
                        size: 0,
                    })
                    .map_err(|source| Error::Symbol { line: 0, source })?;
            }
        }
        for name in &visibility.extern_data {
            if symbols.get_id(name).is_none() {
                symbols
                    .insert(Symbol {
                        section: Section::Undefined,
                        identifier: name.clone(),
                        address: 0,
                        sym_type: SymbolType::Data,
                        scope: Scope::External,
                        size: 0,
                    })
                    .map_err(|source| Error::Symbol { line: 0, source })?;
            }
        }

        trace!("pass 2: final compile-case selection against {} symbols", symbols.len());
        for item in &mut text_items {
            item.statement.resolve_labels(item.line, &symbols)?;
        }

        // The approximate pc used here replays pass 1's worst-case sizes,
        // not the final sizes being decided — final sizes only ever shrink
        // relative to worst-case (monotonic-shrink), so an approximate pc
        // built from worst-case sizes is always >= the true final pc, which
        // is what each statement's compile_case needs to decide correctly.
        let mut provisional = AlignedCounter::new();
        let mut final_layout = Vec::with_capacity(text_items.len());
        for item in &text_items {
            let pc = provisional.advance(item.worst_size, item.worst_alignment);
            final_layout.push(item.statement.compile_layout(pc, &symbols, options));
        }

        trace!("refining label addresses with final sizes");
        let mut refine_counter = AlignedCounter::new();
        for (item, &(size, alignment)) in text_items.iter().zip(&final_layout) {
            let address = refine_counter.advance(size, alignment);
            if let Some(id) = item.label_symbol_id {
                symbols.update_address(id, address, size);
            }
        }

        debug!("generating {} text statements", text_items.len());
        let mut gen_counter = AlignedCounter::new();
        let mut instructions = Vec::new();
        for (item, &(size, alignment)) in text_items.iter().zip(&final_layout) {
            let pc = gen_counter.advance(size, alignment);
            let emitted = item.statement.gen(pc, &symbols, options);
            if let Some((symbol_id, reloc_kind)) = item.statement.reloc(pc, &symbols, options) {
                symbols.insert_ref(symbol_id, pc, reloc_kind);
            }
            instructions.extend(emitted);
        }

        let data = data_items.remove(&Section::Data).unwrap_or_default().into_iter().map(|i| i.alloc).collect();
        let rodata = data_items.remove(&Section::Rodata).unwrap_or_default().into_iter().map(|i| i.alloc).collect();
        let bss = data_items.remove(&Section::Bss).unwrap_or_default().into_iter().map(|i| i.alloc).collect();

        Ok(CompilationUnit { symbol_table: symbols, data, rodata, bss, instructions })
    }
}
