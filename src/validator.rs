//! Static analysis for SEXP source text.
//!
//! The validator is the edit-time counterpart to the evaluator: it never
//! raises, it accumulates every diagnostic it can find, and it returns a
//! [`ValidationReport`] a UI layer can render however it likes. A
//! syntactically invalid expression should be rejected here before it is
//! ever handed to the evaluator.
//!
//! Reports are cached by content hash, so re-validating unchanged text
//! during interactive editing costs one hash after the first pass.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::{
    ast::{Expr, TokenKind},
    lexer::Lexer,
    parser::Parser,
    printer::to_text,
    registry::FunctionRegistry,
    variables::VariableStore,
};

/// How deep the analysis goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationLevel {
    /// Syntax only: lexing, parsing, parenthesis balance.
    Basic,
    /// Basic plus operator existence, arity, and literal argument types.
    #[default]
    Standard,
    /// Standard plus variable existence, complexity scoring, and fix
    /// suggestions.
    Comprehensive,
}

/// A single diagnostic with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ValidationIssue {
    fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        ValidationIssue {
            message: message.into(),
            line,
            column,
        }
    }
}

/// A best-effort textual correction. Advisory only - never auto-applied.
#[derive(Debug, Clone, PartialEq)]
pub struct FixSuggestion {
    pub title: String,
    pub description: String,
    pub replacement: String,
}

/// Everything the validator found in one pass. Immutable once returned.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub suggestions: Vec<FixSuggestion>,
    /// Structural complexity score (node count plus weighted depth);
    /// populated at Comprehensive level.
    pub complexity: Option<usize>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Complexity above this draws a warning; deeply nested formulas are a
/// maintenance hazard in mission files.
const COMPLEXITY_WARN_THRESHOLD: usize = 200;

/// The static analyzer.
///
/// Registry and (optionally) variable store are injected; a validator built
/// for one editor tab or test shares nothing with any other.
pub struct Validator<'a> {
    registry: &'a FunctionRegistry,
    store: Option<&'a VariableStore>,
    cache: HashMap<(u64, ValidationLevel), ValidationReport>,
}

impl<'a> Validator<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Validator {
            registry,
            store: None,
            cache: HashMap::new(),
        }
    }

    /// Attach a variable store for Comprehensive-level existence checks.
    pub fn with_store(mut self, store: &'a VariableStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Validate source text at the given level. Never fails; all findings
    /// land in the report.
    pub fn validate(&mut self, text: &str, level: ValidationLevel) -> ValidationReport {
        let key = (content_hash(text), level);
        if let Some(cached) = self.cache.get(&key) {
            return cached.clone();
        }

        let report = self.run(text, level);
        self.cache.insert(key, report.clone());
        report
    }

    fn run(&self, text: &str, level: ValidationLevel) -> ValidationReport {
        let mut report = ValidationReport::default();
        let suggest = level == ValidationLevel::Comprehensive;

        let tokens = match Lexer::new(text).tokenize() {
            Ok(tokens) => tokens,
            Err(e) => {
                report
                    .errors
                    .push(ValidationIssue::new(e.message, e.line, e.column));
                return report;
            }
        };

        self.check_paren_balance(text, &tokens, &mut report, suggest);

        let forms = match Parser::new(Lexer::new(text)).and_then(|mut p| p.parse_program()) {
            Ok(forms) => forms,
            Err(e) => {
                // The balance scan already covers unmatched parens; avoid
                // reporting the same defect twice.
                let already_reported = e.message.to_lowercase().contains("parenthes")
                    && report
                        .errors
                        .iter()
                        .any(|issue| issue.message.to_lowercase().contains("parenthes"));
                if !already_reported {
                    report
                        .errors
                        .push(ValidationIssue::new(e.message, e.line, e.column));
                }
                return report;
            }
        };

        if level == ValidationLevel::Basic {
            return report;
        }

        for form in &forms {
            self.check_expr(form, form, &mut report, level, suggest);
        }

        if level == ValidationLevel::Comprehensive {
            let complexity = forms
                .iter()
                .map(|f| f.node_count() + 2 * f.depth())
                .sum::<usize>();
            if complexity > COMPLEXITY_WARN_THRESHOLD {
                report.warnings.push(ValidationIssue::new(
                    format!(
                        "Expression complexity {} exceeds {}; consider splitting the formula",
                        complexity, COMPLEXITY_WARN_THRESHOLD
                    ),
                    1,
                    1,
                ));
            }
            report.complexity = Some(complexity);
        }

        report
    }

    /// Token-level parenthesis balance scan. Runs even when parsing would
    /// stop at the first defect, so every unmatched paren is reported.
    fn check_paren_balance(
        &self,
        text: &str,
        tokens: &[crate::ast::Token],
        report: &mut ValidationReport,
        suggest: bool,
    ) {
        let mut open_stack: Vec<(usize, usize)> = Vec::new();

        for token in tokens {
            match token.kind {
                TokenKind::OpenParen => open_stack.push((token.line, token.column)),
                TokenKind::CloseParen => {
                    if open_stack.pop().is_none() {
                        report.errors.push(ValidationIssue::new(
                            "Unmatched closing parenthesis",
                            token.line,
                            token.column,
                        ));
                        if suggest
                            && let Some(fixed) = remove_char_at(text, token.line, token.column)
                        {
                            report.suggestions.push(FixSuggestion {
                                title: "Remove stray ')'".to_string(),
                                description: format!(
                                    "Delete the unmatched closing parenthesis at line {}, column {}",
                                    token.line, token.column
                                ),
                                replacement: fixed,
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        if !open_stack.is_empty() {
            for (line, column) in &open_stack {
                report.errors.push(ValidationIssue::new(
                    format!(
                        "Unmatched opening parenthesis (opened at line {}, column {})",
                        line, column
                    ),
                    *line,
                    *column,
                ));
            }
            if suggest {
                let missing = open_stack.len();
                report.suggestions.push(FixSuggestion {
                    title: format!(
                        "Append {} closing parenthes{}",
                        missing,
                        if missing == 1 { "is" } else { "es" }
                    ),
                    description: "Close the expression at the end of the text".to_string(),
                    replacement: format!("{}{}", text.trim_end(), ")".repeat(missing)),
                });
            }
        }
    }

    fn check_expr(
        &self,
        expr: &Expr,
        root: &Expr,
        report: &mut ValidationReport,
        level: ValidationLevel,
        suggest: bool,
    ) {
        match expr {
            Expr::OperatorCall {
                name,
                args,
                line,
                column,
            } => {
                match self.registry.lookup(name) {
                    None => {
                        report.errors.push(ValidationIssue::new(
                            format!("Unknown operator '{}'", name),
                            *line,
                            *column,
                        ));
                        if suggest {
                            self.suggest_operator(name, root, report);
                        }
                    }
                    Some(descriptor) => {
                        if !descriptor.accepts_arity(args.len()) {
                            report.errors.push(ValidationIssue::new(
                                format!(
                                    "Operator '{}' expects {} argument(s), got {}",
                                    descriptor.name,
                                    descriptor.arity_text(),
                                    args.len()
                                ),
                                *line,
                                *column,
                            ));
                        } else {
                            // Literal arguments can be type-checked without
                            // evaluating; variables coerce at runtime.
                            for (index, arg) in args.iter().enumerate() {
                                let expected = descriptor.arg_type_at(index);
                                let literal_type = match arg {
                                    Expr::Integer(_) | Expr::Float(_) => {
                                        Some(crate::value::ValueType::Number)
                                    }
                                    Expr::String(_) => Some(crate::value::ValueType::String),
                                    Expr::Boolean(_) => Some(crate::value::ValueType::Boolean),
                                    _ => None,
                                };
                                if let Some(actual) = literal_type
                                    && expected != crate::value::ValueType::Any
                                    && actual != expected
                                {
                                    report.warnings.push(ValidationIssue::new(
                                        format!(
                                            "Operator '{}' expects {} for argument {}, got a {} literal",
                                            descriptor.name,
                                            expected.name(),
                                            index + 1,
                                            actual.name()
                                        ),
                                        *line,
                                        *column,
                                    ));
                                }
                            }
                        }
                    }
                }
                for arg in args {
                    self.check_expr(arg, root, report, level, suggest);
                }
            }
            Expr::VariableRef { name, line, column } => {
                if level == ValidationLevel::Comprehensive
                    && let Some(store) = self.store
                    && !store.is_defined(name)
                {
                    // A warning, not an error: modify-variable creates
                    // variables at runtime.
                    report.warnings.push(ValidationIssue::new(
                        format!("Variable '@{}' is not defined in any scope", name),
                        *line,
                        *column,
                    ));
                }
            }
            _ => {}
        }
    }

    /// Propose the closest registered operator for an unknown name.
    fn suggest_operator(&self, name: &str, root: &Expr, report: &mut ValidationReport) {
        let Some(best) = self.registry.search(name, 1).into_iter().next() else {
            return;
        };
        let replacement_name = best.descriptor.name.clone();
        let mut fixed = root.clone();
        rename_operator(&mut fixed, name, &replacement_name);
        report.suggestions.push(FixSuggestion {
            title: format!("Replace '{}' with '{}'", name, replacement_name),
            description: format!(
                "'{}' is not a registered operator; '{}' is the closest match",
                name, replacement_name
            ),
            replacement: to_text(&fixed),
        });
    }
}

/// Rename every call to `from` within the tree (case-insensitive).
fn rename_operator(expr: &mut Expr, from: &str, to: &str) {
    if let Expr::OperatorCall { name, args, .. } = expr {
        if name.eq_ignore_ascii_case(from) {
            *name = to.to_string();
        }
        for arg in args {
            rename_operator(arg, from, to);
        }
    }
}

/// Delete the single character at a 1-based line/column position.
fn remove_char_at(text: &str, line: usize, column: usize) -> Option<String> {
    let (mut current_line, mut current_column) = (1usize, 1usize);
    for (idx, ch) in text.char_indices() {
        if current_line == line && current_column == column {
            let mut fixed = String::with_capacity(text.len());
            fixed.push_str(&text[..idx]);
            fixed.push_str(&text[idx + ch.len_utf8()..]);
            return Some(fixed);
        }
        if ch == '\n' {
            current_line += 1;
            current_column = 1;
        } else {
            current_column += 1;
        }
    }
    None
}

fn content_hash(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
