use proptest::prelude::*;

use vellum_asm::bits::{align_up, is_aligned, AlignedCounter, Alignment};
use vellum_asm::isa::{InstId, Instruction};
use vellum_asm::registers::Register;
use vellum_asm::symbol::{Scope, Section, Symbol, SymbolTable, SymbolType};

fn any_register() -> impl Strategy<Value = Register> {
    (0u8..32).prop_map(|n| Register::try_from(n).unwrap())
}

proptest! {
    /// Every reg-format instruction round-trips through encode/decode
    /// exactly, for any register triple.
    #[test]
    fn reg_format_round_trips(
        dr in any_register(), sr1 in any_register(), sr2 in any_register(),
    ) {
        for id in [InstId::Add, InstId::Sub, InstId::Mult, InstId::Nand, InstId::Xor, InstId::Grt] {
            let original = Instruction::reg(id, dr, sr1, sr2);
            let decoded = Instruction::decode(original.encode()).unwrap();
            prop_assert_eq!(decoded.dr, dr);
            prop_assert_eq!(decoded.sr1, sr1);
            prop_assert_eq!(decoded.sr2, sr2);
        }
    }

    /// Immediate-format instructions round-trip any in-range signed value.
    #[test]
    fn immediate_format_round_trips(dr in any_register(), sr1 in any_register(), imm in -8192i32..8192) {
        let original = Instruction::immediate(InstId::Addi, dr, sr1, imm);
        let decoded = Instruction::decode(original.encode()).unwrap();
        prop_assert_eq!(decoded.immediate, imm);
    }

    /// Branch instructions that aren't a store mnemonic halve-then-double
    /// their offset; an even offset always round-trips exactly.
    #[test]
    fn branch_round_trips_even_offsets(sr1 in any_register(), sr2 in any_register(), half in -4096i32..4096) {
        let offset = half * 2;
        let original = Instruction::branch(InstId::Beq, sr1, sr2, offset);
        let decoded = Instruction::decode(original.encode()).unwrap();
        prop_assert_eq!(decoded.immediate, offset);
    }

    /// `Sui`/`Apci` never round-trip through a plain `decode` (see
    /// DESIGN.md): decode always reconstructs `upper << 11`, not the
    /// original encode input. This pins that shift-not-invert behavior.
    #[test]
    fn sui_decode_is_a_shift_not_an_inverse(dr in any_register(), upper in 0i32..(1 << 21)) {
        let original = Instruction::set(InstId::Sui, dr, upper);
        let decoded = Instruction::decode(original.encode()).unwrap();
        prop_assert_eq!(decoded.immediate, upper << 11);
    }

    /// `AlignedCounter::advance` never returns a misaligned offset.
    #[test]
    fn aligned_counter_always_aligns(sizes in prop::collection::vec(0u32..64, 1..32)) {
        let mut counter = AlignedCounter::new();
        for (i, &size) in sizes.iter().enumerate() {
            let alignment = match i % 3 {
                0 => Alignment::Byte,
                1 => Alignment::Halfword,
                _ => Alignment::Word,
            };
            let start = counter.advance(size, alignment);
            prop_assert!(is_aligned(start, alignment));
            prop_assert_eq!(start, align_up(start, alignment));
        }
    }

    /// Symbol ids are dense and assigned in insertion order, starting at 1.
    #[test]
    fn symbol_ids_are_dense(names in prop::collection::hash_set("[a-z][a-z0-9]{0,8}", 1..20)) {
        let mut table = SymbolTable::new();
        let names: Vec<String> = names.into_iter().collect();
        for (i, name) in names.iter().enumerate() {
            let id = table.insert(Symbol {
                section: Section::Text,
                identifier: name.clone(),
                address: 0,
                sym_type: SymbolType::Function,
                scope: Scope::Local,
                size: 0,
            }).unwrap();
            prop_assert_eq!(id.0, (i + 1) as u32);
        }
        prop_assert_eq!(table.len(), names.len());
    }
}
