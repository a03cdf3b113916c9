//! The parser/printer dependency the rest of the pipeline treats as opaque: feed it
//! PHP source, get an AST; feed it an AST, get PHP source back out. Every other
//! crate in the workspace only ever touches `ast::Program` and `walker::MutWalker`.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod token;
pub mod walker;

pub use ast::{NodeId, Program};
pub use parser::{parse, ParseError, ParseResult};
pub use printer::print_program;

/// Parses `source`, returning an error if the parser produced any fatal diagnostic.
/// Recoverable diagnostics are discarded here; callers that need them should call
/// [`parser::parse`] directly and inspect `ParseResult::diagnostics`.
pub fn parse_or_fatal(source: &str) -> Result<Program, Vec<ParseError>> {
    let result = parse(source);
    let fatal: Vec<ParseError> = result.diagnostics.iter().filter(|d| d.fatal).cloned().collect();
    if fatal.is_empty() {
        Ok(result.program)
    } else {
        Err(fatal)
    }
}
