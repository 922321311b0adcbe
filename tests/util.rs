use vellum_asm::ast::{Arg, ParsedStatement};

pub fn instr(line: u32, label: Option<&str>, mnemonic: &str, args: &[Arg]) -> ParsedStatement {
    ParsedStatement::instruction(line, label, mnemonic, args.to_vec())
}

pub fn dir(line: u32, label: Option<&str>, directive: &str, args: &[Arg]) -> ParsedStatement {
    ParsedStatement::directive(line, label, directive, args.to_vec())
}

pub fn reg(name: &str) -> Arg {
    Arg::Register(name.to_string())
}

pub fn label(name: &str) -> Arg {
    Arg::Label(name.to_string())
}

pub fn int(value: i64) -> Arg {
    Arg::Integer(value)
}
