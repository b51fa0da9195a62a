//! SEXP text output for parsed expressions.
//!
//! This module renders an [`Expr`] tree back into source text, in compact or
//! pretty-printed form. Printing is the inverse of parsing: for any tree
//! built by the parser, re-parsing the printed text yields a structurally
//! equal tree.
//!
//! # Features
//!
//! - **Compact output** via [`to_text()`] - a single canonical line
//! - **Pretty output** via [`to_text_pretty()`] - one argument per line for
//!   wide calls, with 2-space indentation
//! - **String escaping** - quotes, backslashes and control characters
//! - **Float fidelity** - float literals always carry a decimal point so
//!   they re-parse as floats
//!
//! # Examples
//!
//! ```
//! use sexp_lang::parser::parse_str;
//! use sexp_lang::printer::to_text;
//!
//! let expr = parse_str("( +   1  2 )").unwrap();
//! assert_eq!(to_text(&expr), "(+ 1 2)");
//! ```

use crate::ast::Expr;

/// Calls whose compact rendering stays at or under this width print on one
/// line even in pretty mode.
const PRETTY_WIDTH: usize = 48;

pub struct SexpPrinter {
    pretty: bool,
}

impl SexpPrinter {
    pub fn new(pretty: bool) -> Self {
        SexpPrinter { pretty }
    }

    pub fn print(&self, expr: &Expr) -> String {
        self.print_expr(expr, 0)
    }

    fn print_expr(&self, expr: &Expr, indent: usize) -> String {
        match expr {
            Expr::Integer(n) => n.to_string(),
            Expr::Float(n) => format_float(*n),
            Expr::Boolean(b) => b.to_string(),
            Expr::String(s) => format!("\"{}\"", escape_string(s)),
            Expr::VariableRef { name, .. } => format!("@{}", name),
            Expr::OperatorCall { name, args, .. } => self.print_call(name, args, indent),
        }
    }

    fn print_call(&self, name: &str, args: &[Expr], indent: usize) -> String {
        if args.is_empty() {
            return format!("({})", name);
        }

        let compact = format!(
            "({} {})",
            name,
            args.iter()
                .map(|a| self.compact(a))
                .collect::<Vec<_>>()
                .join(" ")
        );

        if !self.pretty || compact.len() <= PRETTY_WIDTH {
            return compact;
        }

        let mut result = format!("({}", name);
        for arg in args {
            result.push('\n');
            result.push_str(&self.indent(indent + 1));
            result.push_str(&self.print_expr(arg, indent + 1));
        }
        result.push(')');
        result
    }

    fn compact(&self, expr: &Expr) -> String {
        SexpPrinter::new(false).print_expr(expr, 0)
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }
}

/// Render a float so it re-parses as a float: whole-number values keep a
/// trailing `.0`.
fn format_float(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

fn escape_string(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '\n' => vec!['\\', 'n'],
            '\r' => vec!['\\', 'r'],
            '\t' => vec!['\\', 't'],
            c => vec![c],
        })
        .collect()
}

// Convenience functions

/// Render an expression as a single canonical line.
///
/// # Examples
///
/// ```
/// use sexp_lang::ast::Expr;
/// use sexp_lang::printer::to_text;
///
/// let expr = Expr::call("and", vec![Expr::Boolean(true), Expr::variable("armed")]);
/// assert_eq!(to_text(&expr), "(and true @armed)");
/// ```
pub fn to_text(expr: &Expr) -> String {
    SexpPrinter::new(false).print(expr)
}

/// Render an expression with wide calls broken across indented lines.
///
/// Calls whose compact form fits in a terminal-friendly width stay on one
/// line; anything wider prints one argument per line with 2-space
/// indentation per nesting level.
pub fn to_text_pretty(expr: &Expr) -> String {
    SexpPrinter::new(true).print(expr)
}

#[test]
fn test_float_keeps_decimal_point() {
    assert_eq!(to_text(&Expr::Float(2.0)), "2.0");
    assert_eq!(to_text(&Expr::Float(-0.5)), "-0.5");
}
