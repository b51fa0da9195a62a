//! Canonical re-printing of SEXP source text.

use super::CliError;
use crate::{
    lexer::Lexer,
    parser::Parser,
    printer::{to_text, to_text_pretty},
};

/// Parse the text and re-print every top-level form canonically.
///
/// Comments and incidental whitespace are dropped; structure is preserved
/// exactly (the printer/parser round-trip law).
pub fn execute_fmt(text: &str, pretty: bool) -> Result<String, CliError> {
    let forms = Parser::new(Lexer::new(text))?.parse_program()?;

    let rendered: Vec<String> = forms
        .iter()
        .map(|form| {
            if pretty {
                to_text_pretty(form)
            } else {
                to_text(form)
            }
        })
        .collect();

    Ok(rendered.join("\n"))
}
