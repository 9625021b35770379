#![no_main]

use costflow::parser::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The parser must never panic on arbitrary input: it either returns an
    // AST or a ParseError with a valid byte offset.
    if let Ok(src) = std::str::from_utf8(data) {
        let _ = Parser::parse_expr_str(src);
        let _ = Parser::parse_stmts_str(src);
    }
});
