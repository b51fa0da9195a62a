//! Validate and evaluate SEXP expressions from the command line.

use super::CliError;
use crate::{
    builtins::standard_registry,
    evaluator::Evaluator,
    parser::parse_str,
    validator::{ValidationLevel, ValidationReport, Validator},
    value::Value,
    variables::{Scope, VariableStore},
};

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// The SEXP expression to check
    pub expression: String,
    /// JSON variable records (the export format of the variable store)
    pub vars: Option<String>,
    /// Scope the variable records load into
    pub scope: Scope,
    /// Validation depth
    pub level: ValidationLevel,
    /// Only validate, don't evaluate
    pub validate_only: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            expression: String::new(),
            vars: None,
            scope: Scope::Local,
            level: ValidationLevel::Standard,
            validate_only: false,
        }
    }
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Validation passed; evaluation was not requested
    Valid(ValidationReport),
    /// Validation found errors; evaluation did not run
    Invalid(ValidationReport),
    /// Validation passed and the expression evaluated to a value
    Evaluated {
        value: serde_json::Value,
        report: ValidationReport,
    },
}

/// Validate an expression and, unless `validate_only` is set, evaluate it
/// against the builtin operators plus any supplied variable records.
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let registry = standard_registry();
    let mut store = VariableStore::new();

    if let Some(vars) = &options.vars {
        let records: serde_json::Value = serde_json::from_str(vars)?;
        store.import_scope(options.scope, &records)?;
    }

    let report = {
        let mut validator = Validator::new(&registry).with_store(&store);
        validator.validate(&options.expression, options.level)
    };

    if !report.is_valid() {
        return Ok(CheckResult::Invalid(report));
    }
    if options.validate_only {
        return Ok(CheckResult::Valid(report));
    }

    let expr = parse_str(&options.expression)?;
    let evaluator = Evaluator::new(&registry);
    let value = evaluator.evaluate(&expr, &mut store)?;

    Ok(CheckResult::Evaluated {
        value: result_to_json(&value),
        report,
    })
}

/// Render an evaluation result as a `{type, value}` JSON object.
fn result_to_json(value: &Value) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert(
        "type".to_string(),
        serde_json::Value::String(value.type_name().to_string()),
    );
    obj.insert(
        "value".to_string(),
        match value {
            Value::Integer(n) => serde_json::Value::Number((*n).into()),
            Value::Float(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
        },
    );
    serde_json::Value::Object(obj)
}
