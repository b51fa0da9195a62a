//! Pull SEXP formulas out of mission text.

use super::CliError;
use crate::{
    builtins::standard_registry,
    fs2,
    validator::{ValidationLevel, ValidationReport, Validator},
};

/// One formula field found in mission text, with its validation report
/// when checking was requested.
#[derive(Debug)]
pub struct ExtractedFormula {
    pub name: String,
    pub line: usize,
    pub text: String,
    pub report: Option<ValidationReport>,
}

/// Extract `$Formula:`-style fields from mission text, optionally running
/// each payload through the validator at Standard level.
pub fn execute_extract(text: &str, check: bool) -> Result<Vec<ExtractedFormula>, CliError> {
    let fields = fs2::extract_formulas(text)?;

    let registry = standard_registry();
    let mut validator = Validator::new(&registry);

    Ok(fields
        .into_iter()
        .map(|field| {
            let report = check.then(|| validator.validate(&field.value, ValidationLevel::Standard));
            ExtractedFormula {
                name: field.name,
                line: field.line,
                text: field.value,
                report,
            }
        })
        .collect())
}
