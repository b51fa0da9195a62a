//! Field extraction for FS2 mission and table text.
//!
//! WCS mission files are line-oriented: `$Key: value` fields, `#Section`
//! markers, and `;` comments. Formula fields (`$Formula:`, `$Condition:`
//! and friends) carry an S-expression payload that may span many lines;
//! the payload is delimited by balanced parentheses, not by line ends.
//!
//! This module turns raw mission text into [`MissionField`] records so the
//! SEXP pipeline (validator, parser, evaluator) can consume the payloads.
//! It reads text supplied by the caller; file I/O stays host-side.

use std::fmt;

/// One `$Key: value` field with the line it starts on (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct MissionField {
    /// Key without the `$` sigil or trailing colon, e.g. `Formula`.
    pub name: String,
    /// Raw value text; for formula fields, the balanced `(...)` block.
    pub value: String,
    pub line: usize,
}

/// Error produced for structurally broken mission text.
#[derive(Debug, Clone, PartialEq)]
pub struct Fs2Error {
    pub message: String,
    pub line: usize,
}

impl fmt::Display for Fs2Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mission text error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for Fs2Error {}

/// Strip a `;` comment, respecting string literals.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            ';' if !in_string => return &line[..idx],
            _ => {}
        }
    }
    line
}

/// Parse mission text into its `$Key: value` fields.
///
/// Section markers (`#...`), comments and blank lines are skipped. A value
/// beginning with `(` continues across lines until its parentheses
/// balance; an unterminated block is an error.
pub fn parse_fields(text: &str) -> Result<Vec<MissionField>, Fs2Error> {
    let lines: Vec<&str> = text.lines().collect();
    let mut fields = Vec::new();
    let mut index = 0;

    while index < lines.len() {
        let line_number = index + 1;
        let line = strip_comment(lines[index]).trim();
        index += 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(rest) = line.strip_prefix('$') else {
            continue;
        };
        let Some(colon) = rest.find(':') else {
            return Err(Fs2Error {
                message: format!("Field '${}' is missing its ':'", rest),
                line: line_number,
            });
        };

        let name = rest[..colon].trim().to_string();
        let mut value = rest[colon + 1..].trim().to_string();

        if value.starts_with('(') {
            let mut depth = paren_depth(&value);
            while depth > 0 {
                let Some(next) = lines.get(index) else {
                    return Err(Fs2Error {
                        message: format!(
                            "Unterminated formula in field '${}': {} parenthesis(es) still open",
                            name, depth
                        ),
                        line: line_number,
                    });
                };
                let next = strip_comment(next);
                value.push('\n');
                value.push_str(next.trim_end());
                depth += paren_depth(next);
                index += 1;
            }
        }

        fields.push(MissionField {
            name,
            value,
            line: line_number,
        });
    }

    Ok(fields)
}

/// Net parenthesis depth change of one line, ignoring parens inside string
/// literals.
fn paren_depth(line: &str) -> i32 {
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    for ch in line.chars() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Keys whose values are SEXP formulas.
const FORMULA_KEYS: [&str; 3] = ["Formula", "Condition", "Repeat"];

/// Extract only the fields carrying SEXP payloads, in file order.
pub fn extract_formulas(text: &str) -> Result<Vec<MissionField>, Fs2Error> {
    Ok(parse_fields(text)?
        .into_iter()
        .filter(|field| {
            FORMULA_KEYS
                .iter()
                .any(|key| field.name.eq_ignore_ascii_case(key))
                || field.value.starts_with('(')
        })
        .collect())
}

#[test]
fn test_multiline_formula() {
    let text = "$Formula: (and\n  (true)\n  (> 2 1)\n)\n$Name: Test";
    let fields = parse_fields(text).unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "Formula");
    assert!(fields[0].value.contains("(> 2 1)"));
    assert_eq!(fields[1].value, "Test");
}
