mod util;

use util::{dir, instr, int, label, reg};
use vellum_asm::symbol::{RelocKind, Scope, SymbolType};
use vellum_asm::{Analyzer, AssemblerOptions, Error};

#[test]
fn minimal_program_assembles_with_correct_label_address() {
    let statements = vec![
        dir(1, None, ".text", &[]),
        instr(2, Some("start"), "add", &[reg("t0"), reg("t0"), reg("t1")]),
        instr(3, None, "jmp", &[reg("ra")]),
    ];
    let unit = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap();
    let start = unit.symbol_table.get_id("start").unwrap();
    assert_eq!(unit.symbol_table.get(start).address, 0);
    assert_eq!(unit.symbol_table.get(start).sym_type, SymbolType::Function);
}

#[test]
fn small_integer_set_picks_lower_fit_and_shrinks_to_one_instruction() {
    let statements = vec![
        dir(1, None, ".text", &[]),
        instr(2, None, "set", &[reg("t0"), int(5)]),
    ];
    let unit = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap();
    assert_eq!(unit.instructions.len(), 1);
}

#[test]
fn reg_arith_with_matching_dr_and_sr1_shrinks_to_halfword() {
    let statements = vec![
        dir(1, None, ".text", &[]),
        instr(2, None, "add", &[reg("t0"), reg("t0"), reg("t1")]),
    ];
    let unit = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap();
    assert_eq!(unit.instructions.len(), 1);
    assert_eq!(unit.instructions[0].encoded_len(), 2);
}

/// `.data\nx: .word 1,2,3\n.text\nstart: set t0, x`
#[test]
fn data_label_set_records_section_relative_relocation() {
    let statements = vec![
        dir(1, None, ".data", &[]),
        dir(2, Some("x"), ".word", &[int(1), int(2), int(3)]),
        dir(3, None, ".text", &[]),
        instr(4, Some("start"), "set", &[reg("t0"), label("x")]),
    ];
    let unit = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap();

    assert_eq!(unit.data.len(), 1);
    assert_eq!(unit.data[0].values, vec![1, 2, 3]);
    assert_eq!(unit.data[0].memory_alloc.nbytes, 12);

    let x = unit.symbol_table.get_id("x").unwrap();
    assert_eq!(unit.symbol_table.get(x).address, 0);
    assert_eq!(unit.symbol_table.get(x).sym_type, SymbolType::Data);

    // A full 32-bit address needs Sui + Addi.
    assert_eq!(unit.instructions.len(), 2);

    let refs = unit.symbol_table.refs();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].symbol_id, x);
    assert_eq!(refs[0].reloc_kind, RelocKind::SecrLongStore);
}

#[test]
fn external_jump_without_short_jumps_uses_full_jump_sequence() {
    let statements = vec![
        dir(1, None, ".externex", &[label("elsewhere")]),
        dir(2, None, ".text", &[]),
        instr(3, None, "jal", &[label("elsewhere")]),
    ];
    let unit = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap();
    let elsewhere = unit.symbol_table.get_id("elsewhere").unwrap();
    assert_eq!(unit.symbol_table.get(elsewhere).scope, Scope::External);
    // Apci + Jalr.
    assert_eq!(unit.instructions.len(), 2);
    let refs = unit.symbol_table.refs();
    assert_eq!(refs[0].reloc_kind, RelocKind::LongJump);
}

#[test]
fn external_jump_with_short_jumps_enabled_uses_one_instruction() {
    let statements = vec![
        dir(1, None, ".externex", &[label("elsewhere")]),
        dir(2, None, ".text", &[]),
        instr(3, None, "jmp", &[label("elsewhere")]),
    ];
    let options = AssemblerOptions { short_jumps: true };
    let unit = Analyzer::analyze(&statements, &options).unwrap();
    assert_eq!(unit.instructions.len(), 1);
    let refs = unit.symbol_table.refs();
    assert_eq!(refs[0].reloc_kind, RelocKind::ShortJump);
}

#[test]
fn anonymous_labels_resolve_across_a_loop() {
    // 1: add t0, t0, t1
    //    beq t0, t1, b_1      (back to the label above)
    // 1: sub t0, t0, t1
    //    beq t0, t1, f_1      (forward... but there is none after, resolves to tag 0)
    let statements = vec![
        dir(1, None, ".text", &[]),
        instr(2, Some("1"), "add", &[reg("t0"), reg("t0"), reg("t1")]),
        instr(3, None, "beq", &[reg("t0"), reg("t1"), label("b_1")]),
        instr(4, Some("1"), "sub", &[reg("t0"), reg("t0"), reg("t1")]),
        instr(5, None, "beq", &[reg("t0"), reg("t1"), label("f_1")]),
    ];
    let unit = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap();
    assert!(unit.symbol_table.get_id("1_0").is_some());
    assert!(unit.symbol_table.get_id("1_1").is_some());
}

#[test]
fn branch_to_external_symbol_is_a_hard_error() {
    let statements = vec![
        dir(1, None, ".externex", &[label("elsewhere")]),
        dir(2, None, ".text", &[]),
        instr(3, None, "beq", &[reg("t0"), reg("t1"), label("elsewhere")]),
    ];
    let err = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap_err();
    assert!(matches!(err, Error::BranchToExternal { .. }));
}

#[test]
fn jump_to_data_symbol_is_a_hard_error() {
    let statements = vec![
        dir(1, None, ".data", &[]),
        dir(2, Some("buf"), ".word", &[int(0)]),
        dir(3, None, ".text", &[]),
        instr(4, None, "jmp", &[label("buf")]),
    ];
    let err = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap_err();
    assert!(matches!(err, Error::JumpToDataSymbol { .. }));
}

#[test]
fn immediate_out_of_range_is_reported_with_its_line() {
    let statements = vec![
        dir(1, None, ".text", &[]),
        instr(7, None, "addi", &[reg("t0"), reg("t1"), int(1 << 20)]),
    ];
    let err = Analyzer::analyze(&statements, &AssemblerOptions::default()).unwrap_err();
    match err {
        Error::Statement { line, .. } => assert_eq!(line, 7),
        other => panic!("expected a statement error, got {other:?}"),
    }
}
